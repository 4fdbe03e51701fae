//! Trace builders
//!
//! A builder simulates a [`Program`] to completion in one synchronous pass and
//! returns an immutable [`ExecutionTrace`]. Builders never fail: problems met
//! during simulation end up as `error` snapshots inside the trace.
//!
//! - [`loop_builder::LoopTraceBuilder`]: counted loop over one array
//! - [`recursive::RecursiveTraceBuilder`]: one directly self-recursive function

pub mod errors;
pub mod loop_builder;
pub mod recursive;

pub use errors::TraceError;
pub use loop_builder::LoopTraceBuilder;
pub use recursive::{RecursiveTraceBuilder, BASE_CASE_LOOKAHEAD};

use crate::config::MAX_RECURSION_DEPTH;
use crate::program::Program;
use crate::snapshot::ExecutionTrace;

/// Shared builder contract
pub trait TraceBuilder {
    /// Run the simulation and return every snapshot it produced
    fn build(&self) -> ExecutionTrace;
}

/// Build the trace for whichever shape `program` is
pub fn build(program: &Program) -> ExecutionTrace {
    let trace = match program {
        Program::ArrayLoop(p) => LoopTraceBuilder::new(p).build(),
        Program::Recursive(p) => RecursiveTraceBuilder::new(p).build(),
    };

    tracing::info!(
        shape = program.shape_name(),
        snapshots = trace.len(),
        "trace built"
    );
    debug_assert!(
        trace.check_invariants(MAX_RECURSION_DEPTH).is_ok(),
        "builder produced a malformed trace"
    );
    trace
}
