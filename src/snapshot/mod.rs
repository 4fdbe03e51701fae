// Snapshots and the immutable execution trace

mod invariants;

pub use invariants::TraceInvariantError;

use crate::memory::stack::StackFrame;
use crate::program::LineNo;
use std::fmt;
use std::sync::Arc;

/// Loop snapshot kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStepKind {
    Init,
    Iteration,
}

impl LoopStepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStepKind::Init => "init",
            LoopStepKind::Iteration => "iteration",
        }
    }
}

/// State after one step of the array loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSnapshot {
    pub index: usize,
    pub kind: LoopStepKind,
    /// Whole array after this step
    pub array: Vec<i64>,
    /// `None` before the loop starts
    pub loop_index: Option<usize>,
    pub condition_result: Option<bool>,
    pub line: Option<LineNo>,
}

/// Recursive snapshot kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursiveStepKind {
    Start,
    Call,
    Thinking,
    Condition,
    BaseCase,
    RecursiveCase,
    PreRecursive,
    PostRecursive,
    SimpleReturn,
    Return,
    Final,
    Error,
}

impl RecursiveStepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecursiveStepKind::Start => "start",
            RecursiveStepKind::Call => "call",
            RecursiveStepKind::Thinking => "thinking",
            RecursiveStepKind::Condition => "condition",
            RecursiveStepKind::BaseCase => "base_case",
            RecursiveStepKind::RecursiveCase => "recursive_case",
            RecursiveStepKind::PreRecursive => "pre_recursive",
            RecursiveStepKind::PostRecursive => "post_recursive",
            RecursiveStepKind::SimpleReturn => "simple_return",
            RecursiveStepKind::Return => "return",
            RecursiveStepKind::Final => "final",
            RecursiveStepKind::Error => "error",
        }
    }
}

/// State at one point of the recursive simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveSnapshot {
    pub index: usize,
    pub kind: RecursiveStepKind,
    pub message: String,
    pub depth: usize,
    /// Frame the step belongs to. For `Return` this is the frame just popped.
    pub frame: Option<StackFrame>,
    /// Active frames, bottom first
    pub call_stack: Vec<StackFrame>,
    pub return_value: Option<i64>,
    pub line: Option<LineNo>,
}

impl RecursiveSnapshot {
    pub fn new(kind: RecursiveStepKind, message: impl Into<String>, depth: usize) -> Self {
        RecursiveSnapshot {
            index: 0,
            kind,
            message: message.into(),
            depth,
            frame: None,
            call_stack: Vec::new(),
            return_value: None,
            line: None,
        }
    }

    pub fn with_frame(mut self, frame: Option<StackFrame>) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_call_stack(mut self, call_stack: Vec<StackFrame>) -> Self {
        self.call_stack = call_stack;
        self
    }

    pub fn with_return_value(mut self, value: Option<i64>) -> Self {
        self.return_value = value;
        self
    }

    pub fn with_line(mut self, line: Option<LineNo>) -> Self {
        self.line = line;
        self
    }
}

/// One self-contained, independently renderable point of a trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Loop(LoopSnapshot),
    Recursive(RecursiveSnapshot),
}

impl Snapshot {
    pub fn index(&self) -> usize {
        match self {
            Snapshot::Loop(s) => s.index,
            Snapshot::Recursive(s) => s.index,
        }
    }

    fn set_index(&mut self, index: usize) {
        match self {
            Snapshot::Loop(s) => s.index = index,
            Snapshot::Recursive(s) => s.index = index,
        }
    }

    pub fn line(&self) -> Option<LineNo> {
        match self {
            Snapshot::Loop(s) => s.line,
            Snapshot::Recursive(s) => s.line,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Snapshot::Loop(s) => s.kind.as_str(),
            Snapshot::Recursive(s) => s.kind.as_str(),
        }
    }

    pub fn as_loop(&self) -> Option<&LoopSnapshot> {
        match self {
            Snapshot::Loop(s) => Some(s),
            Snapshot::Recursive(_) => None,
        }
    }

    pub fn as_recursive(&self) -> Option<&RecursiveSnapshot> {
        match self {
            Snapshot::Recursive(s) => Some(s),
            Snapshot::Loop(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Snapshot::Recursive(RecursiveSnapshot {
                kind: RecursiveStepKind::Error,
                ..
            })
        )
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Snapshot::Loop(s) => {
                write!(f, "#{} {}", s.index, s.kind.as_str())?;
                if let Some(i) = s.loop_index {
                    write!(f, " i={}", i)?;
                }
                write!(f, " {:?}", s.array)?;
                if let Some(result) = s.condition_result {
                    write!(f, " cond={}", result)?;
                }
                Ok(())
            }
            Snapshot::Recursive(s) => {
                write!(
                    f,
                    "#{} {:<14} depth={} {}",
                    s.index,
                    s.kind.as_str(),
                    s.depth,
                    s.message
                )?;
                if let Some(value) = s.return_value {
                    write!(f, " => {}", value)?;
                }
                Ok(())
            }
        }
    }
}

/// Which builder produced a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Loop,
    Recursive,
}

/// Immutable ordered snapshots from one build pass.
///
/// Cloning is cheap and every clone shares the same read-only storage.
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    snapshots: Arc<[Snapshot]>,
}

impl ExecutionTrace {
    /// A trace with no snapshots (the "initializing" state)
    pub fn empty() -> Self {
        ExecutionTrace {
            snapshots: Arc::from(Vec::<Snapshot>::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn kind(&self) -> Option<TraceKind> {
        self.snapshots.first().map(|s| match s {
            Snapshot::Loop(_) => TraceKind::Loop,
            Snapshot::Recursive(_) => TraceKind::Recursive,
        })
    }

    /// Result of a recursive trace that reached its `Final` snapshot
    pub fn final_value(&self) -> Option<i64> {
        match self.last()? {
            Snapshot::Recursive(s) if s.kind == RecursiveStepKind::Final => s.return_value,
            _ => None,
        }
    }

    /// Array after the last iteration of a loop trace
    pub fn final_array(&self) -> Option<&[i64]> {
        self.last()?.as_loop().map(|s| s.array.as_slice())
    }
}

impl PartialEq for ExecutionTrace {
    fn eq(&self, other: &Self) -> bool {
        self.snapshots[..] == other.snapshots[..]
    }
}

impl Eq for ExecutionTrace {}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

/// Append-only snapshot log used while a builder runs
#[derive(Debug, Default)]
pub struct TraceRecorder {
    snapshots: Vec<Snapshot>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        TraceRecorder {
            snapshots: Vec::new(),
        }
    }

    /// Append a snapshot, stamping it with its position
    pub fn push(&mut self, mut snapshot: Snapshot) {
        snapshot.set_index(self.snapshots.len());
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Freeze into an immutable trace
    pub fn finish(self) -> ExecutionTrace {
        ExecutionTrace {
            snapshots: Arc::from(self.snapshots),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loop_snapshot(array: Vec<i64>) -> Snapshot {
        Snapshot::Loop(LoopSnapshot {
            index: 42,
            kind: LoopStepKind::Init,
            array,
            loop_index: None,
            condition_result: None,
            line: None,
        })
    }

    #[test]
    fn test_recorder_stamps_gapless_indices() {
        let mut recorder = TraceRecorder::new();
        recorder.push(loop_snapshot(vec![1]));
        recorder.push(loop_snapshot(vec![2]));
        let trace = recorder.finish();

        let indices: Vec<usize> = trace.iter().map(Snapshot::index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(trace.kind(), Some(TraceKind::Loop));
    }

    #[test]
    fn test_clones_share_storage_and_compare_equal() {
        let mut recorder = TraceRecorder::new();
        recorder.push(loop_snapshot(vec![7, 8]));
        let trace = recorder.finish();
        let copy = trace.clone();

        assert_eq!(trace, copy);
        assert!(std::ptr::eq(trace.snapshots(), copy.snapshots()));
        assert_eq!(copy.final_array(), Some(&[7, 8][..]));
    }

    #[test]
    fn test_empty_trace() {
        let trace = ExecutionTrace::empty();
        assert!(trace.is_empty());
        assert_eq!(trace.kind(), None);
        assert_eq!(trace.final_value(), None);
    }
}
