use crate::functions::Arity;
use thiserror::Error;

/// Malformed expression text.
///
/// `position` is the byte offset into the input where parsing stopped;
/// `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct SyntaxError {
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    /// Builds an error for a byte offset into `input`, deriving line and column.
    pub fn at(input: &str, position: usize, message: impl Into<String>) -> Self {
        let prefix = input.get(..position).unwrap_or(input);
        let line = prefix.matches('\n').count() + 1;
        let column = prefix
            .rfind('\n')
            .map_or(prefix.chars().count(), |idx| prefix[idx + 1..].chars().count())
            + 1;

        Self {
            position,
            line,
            column,
            message: message.into(),
        }
    }
}

/// A single problem found while validating caller-supplied input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error(transparent)]
    Syntax(SyntaxError),
    #[error("invalid variable name: {0:?}")]
    InvalidVariableName(String),
    #[error("invalid function name: {0:?}")]
    InvalidFunctionName(String),
    #[error("function {name} is not invocable: {reason}")]
    NotInvocable { name: String, reason: String },
}

/// Every violation found during validation, in report order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("function {name} expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: Arity,
        actual: usize,
    },

    #[error("function {name} is bound to a value and cannot be called")]
    NotCallable { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{operation} produced a non-finite result")]
    NonFinite { operation: String },

    #[error("expression tree is {depth} levels deep, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },

    /// A tree shape the evaluator has no rule for. Indicates a grammar/builder mismatch.
    #[error("unsupported node: {0}")]
    UnsupportedNode(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
