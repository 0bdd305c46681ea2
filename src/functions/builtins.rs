use crate::error::EvalResult;
use crate::functions::Arity;
use std::fmt;

/// A fixed-arity numeric function available in every expression.
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub(crate) func: fn(&[f64]) -> f64,
}

impl Builtin {
    pub fn call(&self, args: &[f64]) -> EvalResult<f64> {
        self.arity.check(self.name, args.len())?;
        Ok((self.func)(args))
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

fn sin(args: &[f64]) -> f64 {
    args[0].sin()
}

fn cos(args: &[f64]) -> f64 {
    args[0].cos()
}

fn tan(args: &[f64]) -> f64 {
    args[0].tan()
}

fn sqrt(args: &[f64]) -> f64 {
    args[0].sqrt()
}

/// Natural logarithm.
fn log(args: &[f64]) -> f64 {
    args[0].ln()
}

pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "sin",
        arity: Arity::Exact(1),
        func: sin,
    },
    Builtin {
        name: "cos",
        arity: Arity::Exact(1),
        func: cos,
    },
    Builtin {
        name: "tan",
        arity: Arity::Exact(1),
        func: tan,
    },
    Builtin {
        name: "sqrt",
        arity: Arity::Exact(1),
        func: sqrt,
    },
    Builtin {
        name: "log",
        arity: Arity::Exact(1),
        func: log,
    },
];

pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}
