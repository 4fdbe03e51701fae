//! Simulated call-stack memory for the recursive trace builder
//!
//! - [`Bindings`]: integer variables with insertion-order tracking
//! - [`stack`]: [`stack::StackFrame`] activation records and the [`stack::CallStack`]
//!
//! Frames are plain values. Cloning a frame (or the whole stack) yields an
//! independent copy, which is what snapshots store.

pub mod stack;

use crate::eval::Env;
use rustc_hash::FxHashMap;

/// Integer bindings that remember declaration order for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: FxHashMap<String, i64>,
    insertion_order: Vec<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind or rebind a name. Rebinding keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        let name = name.into();
        if !self.values.contains_key(&name) {
            self.insertion_order.push(name.clone());
        }
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.insertion_order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.as_str(), *v)))
    }

    /// Copy every binding into an evaluator environment
    pub fn extend_env(&self, env: &mut Env) {
        for (name, value) in self.iter() {
            env.insert(name.to_string(), value);
        }
    }

    /// `a=1, b=2`
    pub fn describe(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> FromIterator<(&'a str, i64)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (&'a str, i64)>>(iter: T) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.set(name, value);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_keeps_order() {
        let mut b = Bindings::new();
        b.set("n", 3);
        b.set("acc", 1);
        b.set("n", 2);

        let pairs: Vec<_> = b.iter().collect();
        assert_eq!(pairs, vec![("n", 2), ("acc", 1)]);
        assert_eq!(b.describe(), "n=2, acc=1");
    }
}
