// Integration tests for array loop extraction and tracing

use traceviz::extract;
use traceviz::program::Program;
use traceviz::snapshot::{LoopStepKind, Snapshot, TraceKind};
use traceviz::trace;

fn loop_trace(source: &str) -> traceviz::snapshot::ExecutionTrace {
    let (_, program) = extract::extract_source(source, None).expect("Extraction failed");
    assert!(matches!(program, Program::ArrayLoop(_)));
    trace::build(&program)
}

#[test]
fn test_doubling_loop() {
    let source = r#"
arr = [1, 2, 3, 4]
for i in range(len(arr)):
    arr[i] = arr[i] * 2
"#;
    let trace = loop_trace(source);

    assert_eq!(trace.kind(), Some(TraceKind::Loop));
    assert_eq!(trace.len(), 5);
    assert_eq!(trace.final_array(), Some(&[2, 4, 6, 8][..]));

    let first = trace.get(0).and_then(Snapshot::as_loop).unwrap();
    assert_eq!(first.kind, LoopStepKind::Init);
    assert_eq!(first.array, vec![1, 2, 3, 4]);
    assert_eq!(first.loop_index, None);
    assert_eq!(first.line, Some(2));
}

#[test]
fn test_guarded_increment() {
    let source = r#"
nums = [5, 1, 8, 2]
for i in range(len(nums)):
    if nums[i] > 3:
        nums[i] += 10
"#;
    let trace = loop_trace(source);

    assert_eq!(trace.final_array(), Some(&[15, 1, 18, 2][..]));
    let results: Vec<Option<bool>> = trace
        .iter()
        .filter_map(Snapshot::as_loop)
        .map(|s| s.condition_result)
        .collect();
    assert_eq!(
        results,
        vec![None, Some(true), Some(false), Some(true), Some(false)]
    );
}

#[test]
fn test_each_iteration_changes_only_its_element() {
    let source = "data = [3, 3, 3]\nfor i in range(3):\n    data[i] -= 1\n";
    let trace = loop_trace(source);

    let arrays: Vec<Vec<i64>> = trace
        .iter()
        .filter_map(Snapshot::as_loop)
        .map(|s| s.array.clone())
        .collect();
    assert_eq!(
        arrays,
        vec![
            vec![3, 3, 3],
            vec![2, 3, 3],
            vec![2, 2, 3],
            vec![2, 2, 2]
        ]
    );
}

#[test]
fn test_loop_without_operation_keeps_array() {
    let source = "arr = [7, 8]\nfor i in range(len(arr)):\n    print(arr[i])\n";
    let trace = loop_trace(source);

    assert_eq!(trace.len(), 3);
    assert_eq!(trace.final_array(), Some(&[7, 8][..]));
}

#[test]
fn test_empty_array_has_only_init() {
    let trace = loop_trace("arr = []\nfor i in range(len(arr)):\n    arr[i] *= 2\n");

    assert_eq!(trace.len(), 1);
    assert_eq!(trace.check_invariants(10), Ok(()));
}

#[test]
fn test_overflow_leaves_element_unchanged() {
    let source = format!(
        "arr = [{}, 1]\nfor i in range(len(arr)):\n    arr[i] *= 2\n",
        i64::MAX
    );
    let trace = loop_trace(&source);

    assert_eq!(trace.final_array(), Some(&[i64::MAX, 2][..]));
}

#[test]
fn test_commented_loop() {
    let source = r#"
arr = [1, 2, 3]  # data
for i in range(len(arr)):
    arr[i] = arr[i] * 2  # double
"#;
    let trace = loop_trace(source);

    assert_eq!(trace.final_array(), Some(&[2, 4, 6][..]));
}
