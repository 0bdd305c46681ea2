use crate::error::EvalError;
use log::error;

/// Write-only destination for evaluation failures.
///
/// Called exactly once per failed public call, before the error is returned.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, expression: &str, error: &EvalError);
}

/// Default sink, forwards failures to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, expression: &str, error: &EvalError) {
        error!("Error evaluating expression '{}': {}", expression, error);
    }
}
