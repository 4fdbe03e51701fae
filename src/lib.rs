//! # Introduction
//!
//! traceviz simulates a tiny program (an array-mutating counted loop, or a
//! single self-recursive function) to completion, records the full visible
//! state after every step, and lets the user move forward and backward
//! through those states in a terminal UI built with
//! [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! Source → Extractor → Program → Trace Builder → ExecutionTrace → Playback → TUI
//! ```
//!
//! 1. [`extract`] matches the selected source lines against the two supported
//!    shapes and produces a [`program::Program`].
//! 2. [`trace`] simulates the program once, eagerly, using the restricted
//!    evaluator in [`eval`] and the call-stack model in [`memory`]. The result
//!    is an immutable [`snapshot::ExecutionTrace`].
//! 3. [`playback`] is a cursor over the trace: step, seek, autoplay, reset.
//!    Stepping backward never re-executes anything.
//! 4. [`ui`] renders the current snapshot; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use traceviz::program::{ArrayLoopProgram, Operation, Program};
//!
//! let program = Program::ArrayLoop(
//!     ArrayLoopProgram::new("arr", vec![1, 2, 3]).with_operation(Operation::MultiplyBy2),
//! );
//! let trace = traceviz::trace::build(&program);
//! assert_eq!(trace.len(), 4);
//! assert_eq!(trace.final_array(), Some(&[2, 4, 6][..]));
//! ```

pub mod config;
pub mod eval;
pub mod extract;
pub mod logging;
pub mod memory;
pub mod playback;
pub mod program;
pub mod snapshot;
pub mod trace;
pub mod ui;
