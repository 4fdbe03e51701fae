//! Call stack for the recursive simulation
//!
//! - [`StackFrame`]: one activation of the simulated function
//! - [`CallStack`]: the live stack the builder pushes to and pops from
//!
//! The builder is the only owner of the live stack. Snapshots receive clones
//! via [`CallStack::to_vec`] and [`StackFrame::clone`], so later mutation of a
//! live frame never shows up in an already-recorded snapshot.

use super::Bindings;
use crate::eval::Env;

/// Activation record for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Sequential call number, 0 for the entry call
    pub id: usize,
    pub function_name: String,
    pub depth: usize,
    pub params: Bindings,
    pub locals: Bindings,
}

impl StackFrame {
    pub fn new(id: usize, function_name: impl Into<String>, depth: usize) -> Self {
        StackFrame {
            id,
            function_name: function_name.into(),
            depth,
            params: Bindings::new(),
            locals: Bindings::new(),
        }
    }

    /// Params first, then locals; a local shadows a param of the same name
    pub fn env(&self) -> Env {
        let mut env = Env::default();
        self.params.extend_env(&mut env);
        self.locals.extend_env(&mut env);
        env
    }

    /// `factorial(n=3)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.function_name, self.params.describe())
    }

    /// Parameter values only: `factorial(3)`
    pub fn call_text(&self) -> String {
        let args: Vec<String> = self.params.iter().map(|(_, v)| v.to_string()).collect();
        format!("{}({})", self.function_name, args.join(", "))
    }
}

/// The live call stack
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<StackFrame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    /// The frame of the call currently executing
    pub fn current(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Independent copy of every frame, bottom first
    pub fn to_vec(&self) -> Vec<StackFrame> {
        self.frames.clone()
    }
}
