// Trace builder for the array loop shape

use super::TraceBuilder;
use crate::eval::{self, Env};
use crate::program::ArrayLoopProgram;
use crate::snapshot::{ExecutionTrace, LoopSnapshot, LoopStepKind, Snapshot, TraceRecorder};

/// Simulates an [`ArrayLoopProgram`]: one `init` snapshot, then one
/// `iteration` snapshot per element, each holding the post-operation array.
pub struct LoopTraceBuilder<'a> {
    program: &'a ArrayLoopProgram,
}

impl<'a> LoopTraceBuilder<'a> {
    pub fn new(program: &'a ArrayLoopProgram) -> Self {
        LoopTraceBuilder { program }
    }

    /// Condition result for the current element. No condition means "always".
    fn condition_holds(&self, element_name: &str, value: i64) -> bool {
        let Some(condition) = &self.program.condition else {
            return true;
        };

        let mut env = Env::default();
        env.insert(element_name.to_string(), value);
        match eval::evaluate_comparison(condition, element_name, &env) {
            Ok(result) => result,
            Err(err) => {
                // Only reachable if the element name is not a valid identifier
                tracing::warn!(%err, element = element_name, "loop condition failed, treating as false");
                false
            }
        }
    }
}

impl TraceBuilder for LoopTraceBuilder<'_> {
    fn build(&self) -> ExecutionTrace {
        let program = self.program;
        let mut recorder = TraceRecorder::new();
        let mut array = program.initial_array.clone();

        recorder.push(Snapshot::Loop(LoopSnapshot {
            index: 0,
            kind: LoopStepKind::Init,
            array: array.clone(),
            loop_index: None,
            condition_result: None,
            line: program.init_line,
        }));

        let element_name = program.element_name();
        for i in 0..array.len() {
            let condition_result = self.condition_holds(&element_name, array[i]);

            if condition_result {
                if let Some(operation) = program.operation {
                    match operation.apply(array[i]) {
                        Some(updated) => array[i] = updated,
                        None => tracing::warn!(
                            index = i,
                            value = array[i],
                            operation = %operation.describe(&element_name),
                            "operation overflowed, element left unchanged"
                        ),
                    }
                }
            }

            recorder.push(Snapshot::Loop(LoopSnapshot {
                index: 0,
                kind: LoopStepKind::Iteration,
                array: array.clone(),
                loop_index: Some(i),
                condition_result: Some(condition_result),
                line: program.loop_line,
            }));
        }

        tracing::debug!(
            array = %program.array_variable,
            iterations = program.initial_array.len(),
            snapshots = recorder.len(),
            "built loop trace"
        );
        recorder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{CompareOp, Comparison, Operation};

    fn arrays(trace: &ExecutionTrace) -> Vec<Vec<i64>> {
        trace
            .iter()
            .filter_map(|s| s.as_loop().map(|l| l.array.clone()))
            .collect()
    }

    #[test]
    fn test_multiply_without_condition() {
        let program =
            ArrayLoopProgram::new("arr", vec![1, 2, 3]).with_operation(Operation::MultiplyBy2);
        let trace = LoopTraceBuilder::new(&program).build();

        assert_eq!(
            arrays(&trace),
            vec![vec![1, 2, 3], vec![2, 2, 3], vec![2, 4, 3], vec![2, 4, 6]]
        );
    }

    #[test]
    fn test_condition_gates_operation() {
        let program = ArrayLoopProgram::new("x", vec![5, 1, 9])
            .with_condition(Comparison::new(CompareOp::Gt, 3))
            .with_operation(Operation::AddConstant(1));
        let trace = LoopTraceBuilder::new(&program).build();

        assert_eq!(
            arrays(&trace),
            vec![vec![5, 1, 9], vec![6, 1, 9], vec![6, 1, 9], vec![6, 1, 10]]
        );
        let results: Vec<Option<bool>> = trace
            .iter()
            .filter_map(|s| s.as_loop().map(|l| l.condition_result))
            .collect();
        assert_eq!(results, vec![None, Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn test_empty_array_yields_only_init() {
        let program = ArrayLoopProgram::new("arr", vec![]).with_operation(Operation::MultiplyBy2);
        let trace = LoopTraceBuilder::new(&program).build();

        assert_eq!(trace.len(), 1);
        let init = trace.get(0).and_then(Snapshot::as_loop).unwrap();
        assert_eq!(init.kind, LoopStepKind::Init);
        assert_eq!(init.loop_index, None);
    }

    #[test]
    fn test_no_condition_no_operation_still_one_frame_per_index() {
        let program = ArrayLoopProgram::new("arr", vec![4, 4]);
        let trace = LoopTraceBuilder::new(&program).build();

        assert_eq!(trace.len(), 3);
        for snapshot in trace.iter().skip(1) {
            let step = snapshot.as_loop().unwrap();
            assert_eq!(step.array, vec![4, 4]);
            assert_eq!(step.condition_result, Some(true));
        }
    }

    #[test]
    fn test_overflow_leaves_element_unchanged() {
        let program =
            ArrayLoopProgram::new("arr", vec![i64::MAX, 1]).with_operation(Operation::MultiplyBy2);
        let trace = LoopTraceBuilder::new(&program).build();

        assert_eq!(trace.final_array(), Some(&[i64::MAX, 2][..]));
        assert_eq!(trace.check_invariants(0), Ok(()));
    }
}
