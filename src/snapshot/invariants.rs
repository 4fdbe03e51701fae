//! Structural checks over a finished [`ExecutionTrace`]
//!
//! The builders are expected to produce traces that pass every check here.
//! Tests call [`ExecutionTrace::check_invariants`] directly; debug builds also
//! run it once after each build.

use super::{ExecutionTrace, LoopStepKind, RecursiveStepKind, Snapshot};

/// A trace that breaks one of the snapshot invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceInvariantError {
    #[error("snapshot at position {position} has index {found}")]
    IndexGap { position: usize, found: usize },

    #[error("snapshot at position {position} comes from a different builder than snapshot 0")]
    MixedKinds { position: usize },

    #[error("loop trace must start with exactly one init snapshot (position {position})")]
    MisplacedInit { position: usize },

    #[error("loop snapshot at position {position} has loop index {found:?}, expected {expected}")]
    LoopIndexOutOfOrder {
        position: usize,
        expected: usize,
        found: Option<usize>,
    },

    #[error("array length changed at position {position}: {found} != {expected}")]
    ArrayLengthChanged {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("frame in slot {slot} of position {position} has depth {depth}")]
    FrameDepthMismatch {
        position: usize,
        slot: usize,
        depth: usize,
    },

    #[error("call at position {position} reaches depth {depth}, limit is {max_depth}")]
    DepthLimitExceeded {
        position: usize,
        depth: usize,
        max_depth: usize,
    },

    #[error("return at position {position} has no matching call")]
    UnbalancedReturn { position: usize },

    #[error("recursive trace ends with '{kind}' instead of final or error")]
    UnterminatedTrace { kind: &'static str },
}

impl ExecutionTrace {
    /// Check the shared and per-builder invariants.
    ///
    /// `max_depth` is the recursion limit the trace was built with; it is
    /// ignored for loop traces.
    pub fn check_invariants(&self, max_depth: usize) -> Result<(), TraceInvariantError> {
        let Some(first) = self.snapshots.first() else {
            return Ok(());
        };

        for (position, snapshot) in self.iter().enumerate() {
            if snapshot.index() != position {
                return Err(TraceInvariantError::IndexGap {
                    position,
                    found: snapshot.index(),
                });
            }
            if std::mem::discriminant(snapshot) != std::mem::discriminant(first) {
                return Err(TraceInvariantError::MixedKinds { position });
            }
        }

        match first {
            Snapshot::Loop(_) => self.check_loop(),
            Snapshot::Recursive(_) => self.check_recursive(max_depth),
        }
    }

    fn check_loop(&self) -> Result<(), TraceInvariantError> {
        let mut expected_len = None;

        for (position, snapshot) in self.iter().enumerate() {
            let Some(step) = snapshot.as_loop() else {
                continue;
            };

            let is_init = step.kind == LoopStepKind::Init;
            if is_init != (position == 0) {
                return Err(TraceInvariantError::MisplacedInit { position });
            }

            let expected_index = if is_init { None } else { Some(position - 1) };
            if step.loop_index != expected_index {
                return Err(TraceInvariantError::LoopIndexOutOfOrder {
                    position,
                    expected: position.saturating_sub(1),
                    found: step.loop_index,
                });
            }

            let expected = *expected_len.get_or_insert(step.array.len());
            if step.array.len() != expected {
                return Err(TraceInvariantError::ArrayLengthChanged {
                    position,
                    expected,
                    found: step.array.len(),
                });
            }
        }

        // One iteration per element
        if let Some(len) = expected_len {
            if self.len() > len + 1 {
                return Err(TraceInvariantError::LoopIndexOutOfOrder {
                    position: len + 1,
                    expected: len,
                    found: Some(len),
                });
            }
        }

        Ok(())
    }

    fn check_recursive(&self, max_depth: usize) -> Result<(), TraceInvariantError> {
        let mut open_calls = 0usize;

        for (position, snapshot) in self.iter().enumerate() {
            let Some(step) = snapshot.as_recursive() else {
                continue;
            };

            for (slot, frame) in step.call_stack.iter().enumerate() {
                if frame.depth != slot {
                    return Err(TraceInvariantError::FrameDepthMismatch {
                        position,
                        slot,
                        depth: frame.depth,
                    });
                }
            }

            match step.kind {
                RecursiveStepKind::Call => {
                    if step.depth > max_depth {
                        return Err(TraceInvariantError::DepthLimitExceeded {
                            position,
                            depth: step.depth,
                            max_depth,
                        });
                    }
                    if step.call_stack.len() != step.depth + 1 {
                        return Err(TraceInvariantError::FrameDepthMismatch {
                            position,
                            slot: step.call_stack.len(),
                            depth: step.depth,
                        });
                    }
                    open_calls += 1;
                }
                RecursiveStepKind::Return => {
                    open_calls = open_calls
                        .checked_sub(1)
                        .ok_or(TraceInvariantError::UnbalancedReturn { position })?;
                    // The popped frame sits one slot above the remaining stack
                    if step.call_stack.len() != step.depth {
                        return Err(TraceInvariantError::FrameDepthMismatch {
                            position,
                            slot: step.call_stack.len(),
                            depth: step.depth,
                        });
                    }
                }
                _ => {}
            }
        }

        match self.last().and_then(Snapshot::as_recursive) {
            Some(last)
                if last.kind != RecursiveStepKind::Final
                    && last.kind != RecursiveStepKind::Error =>
            {
                Err(TraceInvariantError::UnterminatedTrace {
                    kind: last.kind.as_str(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::stack::StackFrame;
    use crate::snapshot::{LoopSnapshot, RecursiveSnapshot, TraceRecorder};

    fn iteration(loop_index: Option<usize>, array: Vec<i64>) -> Snapshot {
        Snapshot::Loop(LoopSnapshot {
            index: 0,
            kind: if loop_index.is_some() {
                LoopStepKind::Iteration
            } else {
                LoopStepKind::Init
            },
            array,
            loop_index,
            condition_result: loop_index.map(|_| true),
            line: None,
        })
    }

    #[test]
    fn test_well_formed_loop_trace_passes() {
        let mut recorder = TraceRecorder::new();
        recorder.push(iteration(None, vec![1, 2]));
        recorder.push(iteration(Some(0), vec![2, 2]));
        recorder.push(iteration(Some(1), vec![2, 4]));
        assert_eq!(recorder.finish().check_invariants(10), Ok(()));
    }

    #[test]
    fn test_loop_array_length_change_detected() {
        let mut recorder = TraceRecorder::new();
        recorder.push(iteration(None, vec![1, 2]));
        recorder.push(iteration(Some(0), vec![2]));
        assert!(matches!(
            recorder.finish().check_invariants(10),
            Err(TraceInvariantError::ArrayLengthChanged { position: 1, .. })
        ));
    }

    #[test]
    fn test_unbalanced_return_detected() {
        let mut recorder = TraceRecorder::new();
        recorder.push(Snapshot::Recursive(RecursiveSnapshot::new(
            RecursiveStepKind::Start,
            "start",
            0,
        )));
        recorder.push(Snapshot::Recursive(
            RecursiveSnapshot::new(RecursiveStepKind::Return, "ret", 0)
                .with_frame(Some(StackFrame::new(0, "f", 0))),
        ));
        assert_eq!(
            recorder.finish().check_invariants(10),
            Err(TraceInvariantError::UnbalancedReturn { position: 1 })
        );
    }

    #[test]
    fn test_mixed_kinds_detected() {
        let mut recorder = TraceRecorder::new();
        recorder.push(iteration(None, vec![1]));
        recorder.push(Snapshot::Recursive(RecursiveSnapshot::new(
            RecursiveStepKind::Final,
            "done",
            0,
        )));
        assert_eq!(
            recorder.finish().check_invariants(10),
            Err(TraceInvariantError::MixedKinds { position: 1 })
        );
    }
}
