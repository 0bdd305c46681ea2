/// How the evaluator treats IEEE-754 special values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Division by zero yields ±inf or NaN and domain errors yield NaN.
    #[default]
    Ieee,
    /// `x / 0` fails with `DivisionByZero`; any operator or function that turns
    /// finite inputs into NaN or ±inf fails with `NonFinite`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Longest accepted expression text, in bytes.
    pub max_expression_length: usize,
    /// Nesting budget shared by parentheses, unary `-` and `^`, and the
    /// deepest accepted tree.
    pub max_depth: usize,
    pub numeric_policy: NumericPolicy,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_expression_length: 4096,
            max_depth: 256,
            numeric_policy: NumericPolicy::Ieee,
        }
    }
}

impl EvaluatorConfig {
    pub fn with_max_expression_length(mut self, max_expression_length: usize) -> Self {
        self.max_expression_length = max_expression_length;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_numeric_policy(mut self, numeric_policy: NumericPolicy) -> Self {
        self.numeric_policy = numeric_policy;
        self
    }
}
