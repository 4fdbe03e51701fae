//! Failures a trace builder can hit while simulating
//!
//! None of these escape a builder. Each one is turned into an `error`
//! snapshot so the user can step to the exact point where the simulated
//! execution diverged.

use crate::eval::EvalError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    /// The evaluator rejected or could not compute an expression
    #[error("cannot evaluate '{expr}': {source}")]
    InvalidExpression {
        expr: String,
        #[source]
        source: EvalError,
    },

    /// The depth guard tripped
    #[error("maximum recursion depth {max_depth} exceeded (call at depth {depth})")]
    RecursionLimitExceeded { depth: usize, max_depth: usize },

    /// A recursive call finished its body without reaching a `return`
    #[error("{call} finished without returning a value")]
    NoReturnValue { call: String },

    /// No entry call was found for the recursive function
    #[error("no top-level call to {function} found")]
    MissingEntryPoint { function: String },
}

impl TraceError {
    pub fn invalid_expression(expr: &str, source: EvalError) -> Self {
        TraceError::InvalidExpression {
            expr: expr.to_string(),
            source,
        }
    }
}
