//! Evaluation of arithmetic expressions against caller-supplied variables
//! and functions.
//!
//! ```
//! use formulix_rs::{evaluate_expression, UserFunction, UserFunctions, Variables};
//!
//! let variables = Variables::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]);
//! assert_eq!(evaluate_expression("a + b", &variables, &UserFunctions::new()), Ok(3.0));
//!
//! let functions = UserFunctions::from([("foo".to_string(), UserFunction::unary(|x| x * 42.0))]);
//! assert_eq!(evaluate_expression("foo(2)", &Variables::new(), &functions), Ok(84.0));
//! ```
//!
//! Operators, loosest to tightest: `+ -`, `* /`, unary `-`, `^`. Binary
//! operators are left-associative except `^`, so `2 ^ 3 ^ 2` is `512` and
//! `-2 ^ 2` is `-4`. Built-in functions are `sin`, `cos`, `tan`, `sqrt` and
//! `log` (natural logarithm); they always win over user functions of the
//! same name.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod functions;

pub use ast::{ASTNode, Evaluator, TreeGraph};
pub use config::{EvaluatorConfig, NumericPolicy};
pub use diagnostics::{DiagnosticSink, LogSink};
pub use error::{EvalError, EvalResult, SyntaxError, ValidationError, Violation};
pub use formulix_macros::formulix_fn;
pub use functions::{Arity, UserFunction, UserFunctions};

use std::collections::HashMap;

/// Variable bindings for a single evaluation, keyed by name.
pub type Variables = HashMap<String, f64>;

pub fn evaluate_expression(
    expression: &str,
    variables: &Variables,
    user_functions: &UserFunctions,
) -> EvalResult<f64> {
    Evaluator::new().evaluate_expression(expression, variables, user_functions)
}

pub fn validate(
    expression: &str,
    variables: &Variables,
    user_functions: &UserFunctions,
) -> Result<(), ValidationError> {
    Evaluator::new().validate(expression, variables, user_functions)
}

pub fn export_tree(expression: &str) -> EvalResult<TreeGraph> {
    Evaluator::new().export_tree(expression)
}
