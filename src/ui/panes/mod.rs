//! TUI pane rendering modules
//!
//! Every pane is a stateless render function over the current snapshot, so
//! stepping backward redraws an earlier state without any bookkeeping.
//!
//! # Pane Modules
//!
//! - [`source`]: selected source lines with the current line highlighted
//! - [`array`]: boxed array cells with a pointer under the current element
//! - [`stack`]: call stack with parameters and locals per frame
//! - [`thinking`]: narration of the current recursive step
//! - [`tree`]: recursion tree built from the trace prefix, plus a progress bar
//! - [`status`]: status bar with keybindings and playback state
//!
//! The loop view uses source + array; the recursive view uses source, stack,
//! thinking and tree. Both end with the status bar.

pub mod array;
pub mod source;
pub mod stack;
pub mod status;
pub mod thinking;
pub mod tree;

// Re-export render functions for convenience
pub use array::{render_array_pane, ArrayRenderData};
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use stack::{render_stack_pane, StackRenderData};
pub use status::{render_status_bar, StatusRenderData};
pub use thinking::render_thinking_pane;
pub use tree::render_tree_pane;
