use crate::ast::{ASTNode, Operator, UnaryOperator};
use crate::config::EvaluatorConfig;
use crate::error::{EvalError, EvalResult, SyntaxError};
use log::debug;
use pest::error::{InputLocation, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "./expression.pest"]
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses `input` under the default resource limits.
    pub fn parse_expression(input: &str) -> EvalResult<ASTNode> {
        Self::parse_with_limits(input, &EvaluatorConfig::default())
    }

    pub fn parse_with_limits(input: &str, config: &EvaluatorConfig) -> EvalResult<ASTNode> {
        debug!("Parsing expression: {}", input);
        check_limits(input, config)?;

        let expression = ExpressionParser::parse(Rule::expression, input)
            .map_err(syntax_error)?
            .next()
            .ok_or_else(|| SyntaxError::at(input, 0, "expected an expression"))?;

        let ast = Self::build_expr(next(&mut expression.into_inner(), "expression")?)?;
        // Long left-associative chains deepen the tree without nesting the text.
        let depth = ast.depth();
        if depth > config.max_depth {
            return Err(SyntaxError::at(
                input,
                0,
                format!("expression tree is {} levels deep, limit is {}", depth, config.max_depth),
            )
            .into());
        }
        debug!("Parsed AST: {:?}", ast);
        Ok(ast)
    }

    fn build_expr(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        Self::build_left_assoc(pair, Self::build_term)
    }

    fn build_term(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        Self::build_left_assoc(pair, Self::build_unary)
    }

    /// Folds `operand (op operand)*` into a left-leaning chain.
    fn build_left_assoc(
        pair: Pair<Rule>,
        build_operand: fn(Pair<Rule>) -> EvalResult<ASTNode>,
    ) -> EvalResult<ASTNode> {
        let mut pairs = pair.into_inner();
        let mut node = build_operand(next(&mut pairs, "operand")?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator = Operator::try_from(operator_pair.as_str())?;
            let right = build_operand(next(&mut pairs, "right operand")?)?;
            node = ASTNode::BinaryOperation {
                left: Box::new(node),
                operator,
                right: Box::new(right),
            };
        }

        Ok(node)
    }

    fn build_unary(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        let mut pairs = pair.into_inner();
        let first = next(&mut pairs, "operand")?;

        match first.as_rule() {
            Rule::negate => {
                let operand = Self::build_unary(next(&mut pairs, "negated operand")?)?;
                Ok(ASTNode::UnaryOperation {
                    operator: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            Rule::power => Self::build_power(first),
            _ => Err(unexpected(&first)),
        }
    }

    fn build_power(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        let mut pairs = pair.into_inner();
        let base = Self::build_primary(next(&mut pairs, "base")?)?;

        match pairs.next() {
            Some(operator_pair) => {
                let operator = Operator::try_from(operator_pair.as_str())?;
                let exponent = Self::build_power(next(&mut pairs, "exponent")?)?;
                Ok(ASTNode::BinaryOperation {
                    left: Box::new(base),
                    operator,
                    right: Box::new(exponent),
                })
            }
            None => Ok(base),
        }
    }

    fn build_primary(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        match pair.as_rule() {
            Rule::number => build_number(&pair),
            Rule::identifier => Ok(ASTNode::Identifier(pair.as_str().to_string())),
            Rule::call => Self::build_call(pair),
            Rule::expr => Self::build_expr(pair),
            _ => Err(unexpected(&pair)),
        }
    }

    fn build_call(pair: Pair<Rule>) -> EvalResult<ASTNode> {
        let mut inner = pair.into_inner();
        let name = next(&mut inner, "function name")?.as_str().to_string();
        let args = match inner.next() {
            Some(arguments) => arguments
                .into_inner()
                .map(Self::build_expr)
                .collect::<EvalResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(ASTNode::FunctionCall { name, args })
    }
}

fn build_number(pair: &Pair<Rule>) -> EvalResult<ASTNode> {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    let invalid = |message: String| SyntaxError {
        position: span.start(),
        line,
        column,
        message,
    };

    let value = span
        .as_str()
        .parse::<f64>()
        .map_err(|e| invalid(format!("invalid number {}: {}", span.as_str(), e)))?;
    if !value.is_finite() {
        return Err(invalid(format!("number out of range: {}", span.as_str())).into());
    }
    Ok(ASTNode::Number(value))
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> EvalResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| EvalError::UnsupportedNode(format!("missing {}", what)))
}

fn unexpected(pair: &Pair<Rule>) -> EvalError {
    EvalError::UnsupportedNode(format!("{:?} at {}", pair.as_rule(), pair.as_span().start()))
}

/// Rejects input that is too long or nests too deeply to parse safely.
fn check_limits(input: &str, config: &EvaluatorConfig) -> Result<(), SyntaxError> {
    if input.len() > config.max_expression_length {
        return Err(SyntaxError::at(
            input,
            config.max_expression_length,
            format!(
                "expression is {} bytes long, limit is {}",
                input.len(),
                config.max_expression_length
            ),
        ));
    }

    // Parentheses, unary '-' and '^' each open a level of grammar recursion.
    // Signs and powers stay counted until the enclosing parenthesis closes.
    let mut levels: Vec<usize> = vec![0];
    let mut nesting = 0usize;
    let mut previous = None;
    for (position, ch) in input.char_indices() {
        let opens = match ch {
            '(' => {
                levels.push(0);
                true
            }
            ')' => {
                if levels.len() > 1 {
                    let closed = levels.pop().unwrap_or(0);
                    nesting = nesting.saturating_sub(closed + 1);
                }
                false
            }
            '-' if matches!(previous, None | Some('(' | ',' | '+' | '-' | '*' | '/' | '^')) => {
                bump(&mut levels);
                true
            }
            '^' => {
                bump(&mut levels);
                true
            }
            _ => false,
        };
        if opens {
            nesting += 1;
            if nesting > config.max_depth {
                return Err(SyntaxError::at(
                    input,
                    position,
                    format!("expression nested deeper than {}", config.max_depth),
                ));
            }
        }
        if !ch.is_whitespace() {
            previous = Some(ch);
        }
    }

    Ok(())
}

fn bump(levels: &mut [usize]) {
    if let Some(count) = levels.last_mut() {
        *count += 1;
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of input",
        Rule::expression | Rule::expr | Rule::term | Rule::unary | Rule::power => "expression",
        Rule::call => "function call",
        Rule::arguments => "arguments",
        Rule::number => "number",
        Rule::identifier => "identifier",
        Rule::add => "'+'",
        Rule::subtract | Rule::negate => "'-'",
        Rule::multiply => "'*'",
        Rule::divide => "'/'",
        Rule::pow => "'^'",
        _ => return format!("{:?}", rule),
    }
    .to_string()
}

fn syntax_error(err: pest::error::Error<Rule>) -> SyntaxError {
    let err = err.renamed_rules(describe_rule);
    let position = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let (line, column) = match err.line_col {
        LineColLocation::Pos(line_col) => line_col,
        LineColLocation::Span(line_col, _) => line_col,
    };

    SyntaxError {
        position,
        line,
        column,
        message: err.variant.message().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn num(value: f64) -> ASTNode {
        ASTNode::Number(value)
    }

    fn ident(name: &str) -> ASTNode {
        ASTNode::Identifier(name.to_string())
    }

    fn bin(left: ASTNode, operator: Operator, right: ASTNode) -> ASTNode {
        ASTNode::BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    fn neg(operand: ASTNode) -> ASTNode {
        ASTNode::UnaryOperation {
            operator: UnaryOperator::Negate,
            operand: Box::new(operand),
        }
    }

    fn call(name: &str, args: Vec<ASTNode>) -> ASTNode {
        ASTNode::FunctionCall {
            name: name.to_string(),
            args,
        }
    }

    fn parse(input: &str) -> ASTNode {
        ExpressionParser::parse_expression(input).unwrap()
    }

    fn syntax(input: &str) -> SyntaxError {
        match ExpressionParser::parse_expression(input) {
            Err(EvalError::Syntax(err)) => err,
            other => panic!("expected a syntax error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_simple_binary_expression() {
        assert_eq!(
            parse("price + 100"),
            bin(ident("price"), Operator::Add, num(100.0))
        );
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("2 + 3 * 4"),
            bin(
                num(2.0),
                Operator::Add,
                bin(num(3.0), Operator::Multiply, num(4.0))
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            parse("10 - 4 - 3"),
            bin(
                bin(num(10.0), Operator::Subtract, num(4.0)),
                Operator::Subtract,
                num(3.0)
            )
        );
    }

    #[test]
    fn test_division_is_left_associative() {
        assert_eq!(
            parse("8 / 4 / 2"),
            bin(
                bin(num(8.0), Operator::Divide, num(4.0)),
                Operator::Divide,
                num(2.0)
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2 ^ 3 ^ 2"),
            bin(
                num(2.0),
                Operator::Power,
                bin(num(3.0), Operator::Power, num(2.0))
            )
        );
    }

    #[test]
    fn test_negation_applies_after_power() {
        assert_eq!(
            parse("-2 ^ 2"),
            neg(bin(num(2.0), Operator::Power, num(2.0)))
        );
    }

    #[test]
    fn test_negation_binds_tighter_than_multiplication() {
        assert_eq!(
            parse("-a * b"),
            bin(neg(ident("a")), Operator::Multiply, ident("b"))
        );
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(parse("--x"), neg(neg(ident("x"))));
        assert_eq!(
            parse("1 - -x"),
            bin(num(1.0), Operator::Subtract, neg(ident("x")))
        );
    }

    #[test]
    fn test_parenthesised_negative_exponent() {
        assert_eq!(
            parse("2 ^ (-1)"),
            bin(num(2.0), Operator::Power, neg(num(1.0)))
        );
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        assert_eq!(
            parse("(2 + 3) * 4"),
            bin(
                bin(num(2.0), Operator::Add, num(3.0)),
                Operator::Multiply,
                num(4.0)
            )
        );
        assert_eq!(parse("((x))"), ident("x"));
    }

    #[test]
    fn test_function_call() {
        assert_eq!(parse("sin(0)"), call("sin", vec![num(0.0)]));
    }

    #[test]
    fn test_function_call_no_args() {
        assert_eq!(parse("random()"), call("random", vec![]));
    }

    #[test]
    fn test_function_call_preserves_argument_order() {
        assert_eq!(
            parse("clamp(x + 1, lo, -hi)"),
            call(
                "clamp",
                vec![
                    bin(ident("x"), Operator::Add, num(1.0)),
                    ident("lo"),
                    neg(ident("hi")),
                ]
            )
        );
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(
            parse("sqrt(foo(2) ^ 2)"),
            call(
                "sqrt",
                vec![bin(
                    call("foo", vec![num(2.0)]),
                    Operator::Power,
                    num(2.0)
                )]
            )
        );
    }

    #[test]
    fn test_composite_expression() {
        assert_eq!(
            parse("a + 2 - sin(-0.3) * (b - c)"),
            bin(
                bin(ident("a"), Operator::Add, num(2.0)),
                Operator::Subtract,
                bin(
                    call("sin", vec![neg(num(0.3))]),
                    Operator::Multiply,
                    bin(ident("b"), Operator::Subtract, ident("c"))
                )
            )
        );
    }

    #[test_case("42" => 42.0 ; "integer")]
    #[test_case("3.25" => 3.25 ; "fraction")]
    #[test_case(".5" => 0.5 ; "leading dot")]
    #[test_case("1." => 1.0 ; "trailing dot")]
    #[test_case("1e3" => 1000.0 ; "exponent")]
    #[test_case("2.5E-1" => 0.25 ; "signed uppercase exponent")]
    fn test_number_literals(input: &str) -> f64 {
        match parse(input) {
            ASTNode::Number(value) => value,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(parse("_tmp1"), ident("_tmp1"));
        assert_eq!(parse("x2y"), ident("x2y"));
    }

    #[test]
    fn test_excess_whitespace() {
        assert_eq!(
            parse("  \t price   *\n  ( volume -  5 )  "),
            bin(
                ident("price"),
                Operator::Multiply,
                bin(ident("volume"), Operator::Subtract, num(5.0))
            )
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("   \t\n" ; "whitespace only")]
    #[test_case("(1 + 2" ; "unclosed parenthesis")]
    #[test_case("1 + 2)" ; "unopened parenthesis")]
    #[test_case("1 +" ; "missing right operand")]
    #[test_case("* 2" ; "missing left operand")]
    #[test_case("1 2" ; "missing operator")]
    #[test_case("2 ^ -1" ; "unary minus as exponent")]
    #[test_case("1 @ 2" ; "invalid character")]
    #[test_case("a % b" ; "unsupported operator")]
    #[test_case("2 ** 3" ; "double star")]
    #[test_case("f(1,)" ; "trailing comma")]
    #[test_case("f(,1)" ; "leading comma")]
    #[test_case("2 + (1, 2)" ; "tuple")]
    #[test_case("1a" ; "identifier starting with digit")]
    #[test_case("1.2.3" ; "two decimal points")]
    #[test_case("a.b" ; "property access")]
    #[test_case("+1" ; "unary plus")]
    fn test_invalid_syntax(input: &str) {
        syntax(input);
    }

    #[test]
    fn test_nan_and_inf_are_identifiers() {
        assert_eq!(parse("NaN"), ident("NaN"));
        assert_eq!(parse("inf"), ident("inf"));
    }

    #[test]
    fn test_out_of_range_literal() {
        let err = syntax("1 + 1e400");
        assert_eq!(err.position, 4);
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn test_error_position_of_invalid_character() {
        let err = syntax("1 + $");
        assert_eq!(err.position, 4);
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_error_position_on_second_line() {
        let err = syntax("1 +\n  2 )");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_error_message_uses_token_names() {
        let err = syntax("1 +");
        assert!(!err.message.contains("term"), "{}", err.message);
        assert!(err.message.contains("expression") || err.message.contains("number"));
    }

    #[test]
    fn test_expression_too_long() {
        let config = EvaluatorConfig::default().with_max_expression_length(8);
        let result = ExpressionParser::parse_with_limits("1 + 2 + 3 + 4", &config);
        assert!(matches!(result, Err(EvalError::Syntax(ref e)) if e.position == 8));
        assert!(ExpressionParser::parse_with_limits("1 + 2", &config).is_ok());
    }

    #[test]
    fn test_nesting_too_deep() {
        let config = EvaluatorConfig::default().with_max_depth(3);
        assert!(ExpressionParser::parse_with_limits("(((1)))", &config).is_ok());

        let result = ExpressionParser::parse_with_limits("((((1))))", &config);
        assert!(matches!(result, Err(EvalError::Syntax(ref e)) if e.position == 3));
    }

    #[test]
    fn test_adversarial_nesting_rejected_without_recursing() {
        let input = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
        let config = EvaluatorConfig::default().with_max_expression_length(10_000);
        assert!(matches!(
            ExpressionParser::parse_with_limits(&input, &config),
            Err(EvalError::Syntax(_))
        ));
    }

    #[test]
    fn test_long_operator_chains_rejected() {
        let config = EvaluatorConfig::default().with_max_expression_length(10_000);

        let negations = format!("{}1", "- ".repeat(3000));
        let result = ExpressionParser::parse_with_limits(&negations, &config);
        assert!(matches!(result, Err(EvalError::Syntax(ref e)) if e.message.contains("nested deeper")));

        let powers = format!("2{}", "^2".repeat(3000));
        let result = ExpressionParser::parse_with_limits(&powers, &config);
        assert!(matches!(result, Err(EvalError::Syntax(ref e)) if e.message.contains("nested deeper")));
    }

    #[test]
    fn test_nesting_budget_is_cumulative() {
        let input = format!(
            "{}1{}",
            format!("{}(", "-".repeat(120)).repeat(10),
            ")".repeat(10)
        );
        assert!(input.len() < EvaluatorConfig::default().max_expression_length);

        let err = syntax(&input);
        assert!(err.message.contains("nested deeper than 256"), "{}", err.message);
        assert_eq!(err.position, 256);
    }

    #[test]
    fn test_binary_minus_does_not_nest() {
        let config = EvaluatorConfig::default().with_max_depth(4);
        assert!(ExpressionParser::parse_with_limits("(a - b) - (c - d)", &config).is_ok());
        assert!(ExpressionParser::parse_with_limits("1 - -2", &config).is_ok());
        assert!(ExpressionParser::parse_with_limits("- - - - -1", &config).is_err());
    }

    #[test]
    fn test_closed_parentheses_release_budget() {
        let config = EvaluatorConfig::default().with_max_depth(3);
        assert!(ExpressionParser::parse_with_limits("(-(1)) + (-(2)) + (-(3))", &config).is_ok());
        assert!(ExpressionParser::parse_with_limits("(-(-(1)))", &config).is_err());
    }

    #[test]
    fn test_tree_depth_limit() {
        let input = vec!["1"; 300].join(" + ");
        let err = syntax(&input);
        assert!(err.message.contains("300 levels deep"), "{}", err.message);

        let config = EvaluatorConfig::default().with_max_depth(300);
        assert!(ExpressionParser::parse_with_limits(&input, &config).is_ok());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let input = "a + 2 - sin(-0.3) * (b - c) ^ 2 ^ x / foo(1, 2)";
        assert_eq!(parse(input), parse(input));
    }

    #[test]
    fn test_very_large_expression() {
        let input = (0..100)
            .map(|i| format!("price{}", i))
            .collect::<Vec<_>>()
            .join(" + ");

        let mut expected = ident("price0");
        for i in 1..100 {
            expected = bin(expected, Operator::Add, ident(&format!("price{}", i)));
        }

        assert_eq!(parse(&input), expected);
    }
}
