use crate::error::EvalError;
use serde::Serialize;
use std::fmt;

mod evaluator;
mod export;
mod parser;
mod validator;

pub use evaluator::Evaluator;
pub use export::{GraphEdge, GraphNode, TreeGraph};
pub use parser::ExpressionParser as Parser;
pub use validator::{check_bindings, is_identifier};

#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Number(f64),
    Identifier(String),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOperation {
        left: Box<ASTNode>,
        operator: Operator,
        right: Box<ASTNode>,
    },
    FunctionCall {
        name: String,
        args: Vec<ASTNode>,
    },
}

/// Node category as seen by tree consumers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Number,
    Identifier,
    UnaryOperation,
    BinaryOperation,
    FunctionCall,
}

impl ASTNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            ASTNode::Number(_) => NodeKind::Number,
            ASTNode::Identifier(_) => NodeKind::Identifier,
            ASTNode::UnaryOperation { .. } => NodeKind::UnaryOperation,
            ASTNode::BinaryOperation { .. } => NodeKind::BinaryOperation,
            ASTNode::FunctionCall { .. } => NodeKind::FunctionCall,
        }
    }

    /// Display label: the literal value, the name, or the operator symbol.
    pub fn label(&self) -> String {
        match self {
            ASTNode::Number(value) => value.to_string(),
            ASTNode::Identifier(name) => name.clone(),
            ASTNode::UnaryOperation { operator, .. } => operator.symbol().to_string(),
            ASTNode::BinaryOperation { operator, .. } => operator.symbol().to_string(),
            ASTNode::FunctionCall { name, .. } => name.clone(),
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&ASTNode> {
        match self {
            ASTNode::Number(_) | ASTNode::Identifier(_) => Vec::new(),
            ASTNode::UnaryOperation { operand, .. } => vec![&**operand],
            ASTNode::BinaryOperation { left, right, .. } => vec![&**left, &**right],
            ASTNode::FunctionCall { args, .. } => args.iter().collect(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(ASTNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Fully parenthesised infix form that parses back to the same tree.
impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Number(value) => write!(f, "{}", value),
            ASTNode::Identifier(name) => f.write_str(name),
            ASTNode::UnaryOperation { operator, operand } => {
                write!(f, "({}{})", operator.symbol(), operand)
            }
            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            ASTNode::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
}

impl UnaryOperator {
    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -operand,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    /// IEEE-754 semantics: no operator ever fails on its own.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Power => left.powf(right),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<&str> for Operator {
    type Error = EvalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "^" => Ok(Operator::Power),
            _ => Err(EvalError::UnsupportedNode(format!(
                "unknown operator: {}",
                value
            ))),
        }
    }
}
