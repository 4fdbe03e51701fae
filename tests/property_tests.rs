// Property tests over generated programs and cursor moves

use proptest::prelude::*;
use std::time::Instant;

use traceviz::config::{PlaybackConfig, MAX_RECURSION_DEPTH, MAX_SPEED_MS, MIN_SPEED_MS};
use traceviz::playback::PlaybackController;
use traceviz::program::{
    ArrayLoopProgram, CompareOp, Comparison, MainCall, Operation, Program, RecursiveProgram,
    Statement,
};
use traceviz::snapshot::Snapshot;
use traceviz::trace;

fn compare_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Gt),
        Just(CompareOp::Lt),
        Just(CompareOp::Ge),
        Just(CompareOp::Le),
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
    ]
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::MultiplyBy2),
        (-50i64..50).prop_map(Operation::AddConstant),
    ]
}

fn loop_program() -> impl Strategy<Value = ArrayLoopProgram> {
    (
        prop::collection::vec(-1000i64..1000, 0..12),
        prop::option::of((compare_op(), -20i64..20)),
        prop::option::of(operation()),
    )
        .prop_map(|(values, condition, operation)| {
            let mut program = ArrayLoopProgram::new("arr", values);
            program.condition = condition.map(|(op, right)| Comparison::new(op, right));
            program.operation = operation;
            program
        })
}

/// `sum_to(n)`: `if n == 0: return 0`, then `return n + sum_to(n - 1)`
fn sum_to(start: i64) -> RecursiveProgram {
    RecursiveProgram {
        function_name: "sum_to".to_string(),
        parameters: vec!["n".to_string()],
        body: vec![
            Statement::Condition {
                expr: "n == 0".to_string(),
                line: 2,
            },
            Statement::Return {
                expr: "0".to_string(),
                line: 3,
            },
            Statement::Return {
                expr: "n + sum_to(n - 1)".to_string(),
                line: 4,
            },
        ],
        main_call: Some(MainCall::new([start.to_string()])),
        globals: Vec::new(),
        def_line: Some(1),
    }
}

/// Loop programs, or `sum_to` starting on either side of the depth limit
fn any_program() -> impl Strategy<Value = Program> {
    prop_oneof![
        loop_program().prop_map(Program::ArrayLoop),
        (0i64..(MAX_RECURSION_DEPTH as i64 + 5))
            .prop_map(|start| Program::Recursive(sum_to(start))),
    ]
}

/// Every element with the loop body applied once
fn direct_result(program: &ArrayLoopProgram) -> Vec<i64> {
    program
        .initial_array
        .iter()
        .map(|&v| {
            let holds = program.condition.map_or(true, |c| c.op.holds(v, c.right));
            match program.operation {
                Some(op) if holds => op.apply(v).unwrap_or(v),
                _ => v,
            }
        })
        .collect()
}

/// Every snapshot from the cursor to the end, stepping forward
fn walk(playback: &mut PlaybackController) -> Vec<Snapshot> {
    let mut seen: Vec<Snapshot> = playback
        .current_snapshot()
        .snapshot()
        .cloned()
        .into_iter()
        .collect();
    while playback.step_forward() {
        seen.extend(playback.current_snapshot().snapshot().cloned());
    }
    seen
}

proptest! {
    #[test]
    fn loop_trace_matches_direct_computation(program in loop_program()) {
        let trace = trace::build(&Program::ArrayLoop(program.clone()));
        prop_assert_eq!(trace.len(), program.initial_array.len() + 1);

        // Snapshot k holds the first k elements updated and the rest untouched
        let updated = direct_result(&program);
        for (k, snapshot) in trace.iter().enumerate() {
            let step = snapshot.as_loop().unwrap();
            let mut expected = updated[..k].to_vec();
            expected.extend_from_slice(&program.initial_array[k..]);
            prop_assert_eq!(&step.array, &expected, "snapshot {}", k);
            prop_assert_eq!(step.loop_index, k.checked_sub(1));
        }
        prop_assert_eq!(trace.check_invariants(MAX_RECURSION_DEPTH), Ok(()));
    }

    #[test]
    fn stepping_forward_then_back_is_identity(
        program in any_program(),
        start in 0usize..200,
        steps in 0usize..40,
    ) {
        let trace = trace::build(&program);
        let mut playback = PlaybackController::new(trace, PlaybackConfig::default());
        let start = start.min(playback.len() - 1);
        playback.seek(start).unwrap();
        let before = playback.current_snapshot().snapshot().cloned();

        let mut moved = 0;
        for _ in 0..steps {
            if playback.step_forward() {
                moved += 1;
            }
        }
        for _ in 0..moved {
            prop_assert!(playback.step_backward());
        }

        prop_assert_eq!(playback.cursor(), Some(start));
        prop_assert_eq!(playback.current_snapshot().snapshot().cloned(), before);
    }

    #[test]
    fn replay_after_reset_is_identical(program in any_program()) {
        let trace = trace::build(&program);
        let mut playback = PlaybackController::new(trace.clone(), PlaybackConfig::default());

        let first = walk(&mut playback);
        playback.reset();
        let second = walk(&mut playback);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.as_slice(), trace.snapshots());
    }

    #[test]
    fn speed_always_within_bounds(requests in prop::collection::vec(0u64..20_000, 1..10)) {
        let mut playback = PlaybackController::new(
            trace::build(&Program::ArrayLoop(ArrayLoopProgram::new("arr", vec![1]))),
            PlaybackConfig::default(),
        );
        let now = Instant::now();
        for request in requests {
            let speed = playback.set_speed(request, now);
            prop_assert!((MIN_SPEED_MS..=MAX_SPEED_MS).contains(&speed));
            prop_assert_eq!(speed, playback.speed_ms());
        }
    }

    #[test]
    fn recursion_depth_never_exceeds_limit(start in 0i64..25) {
        let trace = trace::build(&Program::Recursive(sum_to(start)));

        prop_assert_eq!(trace.check_invariants(MAX_RECURSION_DEPTH), Ok(()));
        if start as usize <= MAX_RECURSION_DEPTH {
            prop_assert_eq!(trace.final_value(), Some(start * (start + 1) / 2));
        } else {
            prop_assert!(trace.last().is_some_and(Snapshot::is_error));
        }
    }
}
