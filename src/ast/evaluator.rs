use crate::ast::{check_bindings, ASTNode, Operator, Parser, TreeGraph};
use crate::config::{EvaluatorConfig, NumericPolicy};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{EvalError, EvalResult, SyntaxError, ValidationError, Violation};
use crate::functions::{FunctionRegistry, Resolved, UserFunctions};
use crate::Variables;
use log::{debug, trace};
use rayon::prelude::*;
use std::sync::Arc;

/// Name tables visible to one evaluation.
struct Scope<'a> {
    variables: &'a Variables,
    registry: FunctionRegistry<'a>,
}

impl<'a> Scope<'a> {
    fn new(variables: &'a Variables, user_functions: &'a UserFunctions) -> Self {
        Self {
            variables,
            registry: FunctionRegistry::new(user_functions),
        }
    }
}

/// Parses, validates and evaluates expressions.
///
/// Holds only immutable configuration and a diagnostic sink, so a single
/// instance can be shared across threads. Function tables are supplied per
/// call and never retained.
pub struct Evaluator {
    config: EvaluatorConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_config(EvaluatorConfig::default())
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
        }
    }

    /// Replaces the sink that failures are reported to.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Parse an expression string into an AST.
    pub fn parse_expression(&self, expression: &str) -> EvalResult<ASTNode> {
        Parser::parse_with_limits(expression, &self.config)
            .inspect_err(|e| self.sink.record(expression, e))
    }

    /// Checks that `expression` parses and that every supplied name and
    /// function is usable. Names referenced by the expression are not
    /// required to be present.
    pub fn validate(
        &self,
        expression: &str,
        variables: &Variables,
        user_functions: &UserFunctions,
    ) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        match Parser::parse_with_limits(expression, &self.config) {
            Ok(_) => {}
            Err(EvalError::Syntax(err)) => violations.push(Violation::Syntax(err)),
            Err(other) => violations.push(Violation::Syntax(SyntaxError::at(
                expression,
                0,
                other.to_string(),
            ))),
        }
        violations.extend(check_bindings(variables, user_functions));

        if violations.is_empty() {
            return Ok(());
        }
        let err = ValidationError { violations };
        self.sink
            .record(expression, &EvalError::Validation(err.clone()));
        Err(err)
    }

    /// Evaluates a given expression string against variable bindings and user functions.
    ///
    /// # Returns
    ///
    /// * `Ok(f64)` if parsing, validation and evaluation succeed.
    /// * `Err(EvalError)` classifying the first failure.
    pub fn evaluate_expression(
        &self,
        expression: &str,
        variables: &Variables,
        user_functions: &UserFunctions,
    ) -> EvalResult<f64> {
        debug!("Evaluating expression: {}", expression);
        self.prepare(expression, variables, user_functions)
            .and_then(|ast| self.eval_node(&ast, &Scope::new(variables, user_functions)))
            .inspect_err(|e| self.sink.record(expression, e))
    }

    /// Evaluates an already parsed tree. Bindings are not validated; trees
    /// deeper than `max_depth` are rejected before evaluation.
    pub fn evaluate(
        &self,
        ast: &ASTNode,
        variables: &Variables,
        user_functions: &UserFunctions,
    ) -> EvalResult<f64> {
        let depth = ast.depth();
        let result = if depth > self.config.max_depth {
            Err(EvalError::TooDeep {
                depth,
                limit: self.config.max_depth,
            })
        } else {
            self.eval_node(ast, &Scope::new(variables, user_functions))
        };
        result.inspect_err(|e| self.sink.record(&ast.to_string(), e))
    }

    /// Evaluates one expression against many sets of bindings in parallel.
    ///
    /// The expression is parsed and the function table validated once; a
    /// failure there fails the whole batch. Each binding set then yields its
    /// own result, in input order.
    pub fn evaluate_batch(
        &self,
        expression: &str,
        contexts: &[Variables],
        user_functions: &UserFunctions,
    ) -> EvalResult<Vec<EvalResult<f64>>> {
        debug!(
            "Evaluating expression: {} against {} contexts",
            expression,
            contexts.len()
        );
        let ast = self
            .prepare(expression, &Variables::new(), user_functions)
            .inspect_err(|e| self.sink.record(expression, e))?;

        let no_functions = UserFunctions::new();
        Ok(contexts
            .par_iter()
            .map(|variables| {
                let violations = check_bindings(variables, &no_functions);
                let result = if violations.is_empty() {
                    self.eval_node(&ast, &Scope::new(variables, user_functions))
                } else {
                    Err(ValidationError { violations }.into())
                };
                result.inspect_err(|e| self.sink.record(expression, e))
            })
            .collect())
    }

    pub fn export_tree(&self, expression: &str) -> EvalResult<TreeGraph> {
        self.parse_expression(expression)
            .map(|ast| TreeGraph::from_ast(&ast))
    }

    fn prepare(
        &self,
        expression: &str,
        variables: &Variables,
        user_functions: &UserFunctions,
    ) -> EvalResult<ASTNode> {
        let ast = Parser::parse_with_limits(expression, &self.config)?;
        let violations = check_bindings(variables, user_functions);
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }
        Ok(ast)
    }

    fn eval_node(&self, node: &ASTNode, scope: &Scope) -> EvalResult<f64> {
        trace!("Evaluating node: {:?}", node.kind());
        match node {
            ASTNode::Number(value) => Ok(*value),

            ASTNode::Identifier(name) => scope
                .variables
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() }),

            ASTNode::UnaryOperation { operator, operand } => {
                let value = self.eval_node(operand, scope)?;
                Ok(operator.apply(value))
            }

            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => {
                let left_value = self.eval_node(left, scope)?;
                let right_value = self.eval_node(right, scope)?;
                if self.is_strict() && *operator == Operator::Divide && right_value == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                self.checked(
                    operator.symbol(),
                    &[left_value, right_value],
                    operator.apply(left_value, right_value),
                )
            }

            ASTNode::FunctionCall { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval_node(arg, scope))
                    .collect::<EvalResult<Vec<f64>>>()?;
                let result = call_function(name, &values, &scope.registry)?;
                self.checked(name, &values, result)
            }
        }
    }

    fn is_strict(&self) -> bool {
        self.config.numeric_policy == NumericPolicy::Strict
    }

    /// Under the strict policy, rejects NaN/inf produced from finite inputs.
    fn checked(&self, operation: &str, inputs: &[f64], result: f64) -> EvalResult<f64> {
        if self.is_strict() && !result.is_finite() && inputs.iter().all(|v| v.is_finite()) {
            return Err(EvalError::NonFinite {
                operation: operation.to_string(),
            });
        }
        Ok(result)
    }
}

fn call_function(name: &str, args: &[f64], registry: &FunctionRegistry) -> EvalResult<f64> {
    match registry.resolve(name) {
        Some(Resolved::Builtin(builtin)) => builtin.call(args),
        Some(Resolved::User(function)) => function.call(name, args),
        None => Err(EvalError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}
