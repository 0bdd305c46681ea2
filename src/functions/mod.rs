mod builtins;

pub use builtins::{builtin, Builtin, BUILTINS};

use crate::error::{EvalError, EvalResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type NativeFunction = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Caller-supplied functions for a single evaluation, keyed by name.
pub type UserFunctions = HashMap<String, UserFunction>;

/// How many arguments a function accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Arity {
    Exact(usize),
    Between { min: usize, max: usize },
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between { min, max } => (min..=max).contains(&count),
            Arity::Variadic => true,
        }
    }

    /// Fails with `EvalError::Arity` when `name` is called with `actual` arguments.
    pub fn check(&self, name: &str, actual: usize) -> EvalResult<()> {
        if self.accepts(actual) {
            Ok(())
        } else {
            Err(EvalError::Arity {
                name: name.to_string(),
                expected: *self,
                actual,
            })
        }
    }

    /// Returns a reason when no argument count satisfies this arity.
    pub fn unsatisfiable(&self) -> Option<String> {
        match *self {
            Arity::Between { min, max } if min > max => Some(format!(
                "arity range {}..={} admits no argument count",
                min, max
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Between { min, max } => write!(f, "{} to {}", min, max),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// An entry in the caller's function table.
///
/// Function tables built from loosely typed sources can end up holding a
/// plain number under a function name; such entries are rejected by
/// validation and fail with `NotCallable` if reached during evaluation.
#[derive(Clone)]
pub enum UserFunction {
    Native { arity: Arity, func: NativeFunction },
    Value(f64),
}

impl UserFunction {
    pub fn native<F>(arity: Arity, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        UserFunction::Native {
            arity,
            func: Arc::new(func),
        }
    }

    /// Wraps a single-argument closure.
    pub fn unary<F>(func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::native(Arity::Exact(1), move |args| {
            args.first().copied().map_or(f64::NAN, &func)
        })
    }

    pub fn variadic<F>(func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::native(Arity::Variadic, func)
    }

    pub fn arity(&self) -> Option<Arity> {
        match self {
            UserFunction::Native { arity, .. } => Some(*arity),
            UserFunction::Value(_) => None,
        }
    }

    /// Invokes the entry as `name`, checking the argument count first.
    pub fn call(&self, name: &str, args: &[f64]) -> EvalResult<f64> {
        match self {
            UserFunction::Native { arity, func } => {
                arity.check(name, args.len())?;
                Ok(func(args))
            }
            UserFunction::Value(_) => Err(EvalError::NotCallable {
                name: name.to_string(),
            }),
        }
    }

    /// Why this entry cannot be invoked, if it cannot.
    pub fn invocation_problem(&self) -> Option<String> {
        match self {
            UserFunction::Native { arity, .. } => arity.unsatisfiable(),
            UserFunction::Value(value) => Some(format!("bound to the value {}", value)),
        }
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserFunction::Native { arity, .. } => f
                .debug_struct("Native")
                .field("arity", arity)
                .finish_non_exhaustive(),
            UserFunction::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<f64> for UserFunction {
    fn from(value: f64) -> Self {
        UserFunction::Value(value)
    }
}

/// A function resolved by name for one call site.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Builtin(&'static Builtin),
    User(&'a UserFunction),
}

/// Read-only view over the built-in table and one call's user functions.
///
/// Built-ins are consulted first, so user functions cannot shadow them.
#[derive(Debug, Clone, Copy)]
pub struct FunctionRegistry<'a> {
    user: &'a UserFunctions,
}

impl<'a> FunctionRegistry<'a> {
    pub fn new(user: &'a UserFunctions) -> Self {
        Self { user }
    }

    pub fn resolve(&self, name: &str) -> Option<Resolved<'a>> {
        builtin(name)
            .map(Resolved::Builtin)
            .or_else(|| self.user.get(name).map(Resolved::User))
    }
}
