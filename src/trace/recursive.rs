// Trace builder for the single self-recursive function shape

use super::errors::TraceError;
use super::TraceBuilder;
use crate::config::MAX_RECURSION_DEPTH;
use crate::eval::{self, Env};
use crate::extract::recursive::split_arguments;
use crate::memory::stack::{CallStack, StackFrame};
use crate::program::{LineNo, MainCall, RecursiveProgram, Statement};
use crate::snapshot::{
    ExecutionTrace, RecursiveSnapshot, RecursiveStepKind, Snapshot, TraceRecorder,
};

/// Base-case detection policy: the single statement after an `if` test is the
/// one it guards. When the test holds and that statement is a `return`, it is
/// the base-case return; when the test fails, the statement is skipped. This
/// matches bodies shaped like `if <cond>: return <expr>` and nothing more general.
pub const BASE_CASE_LOOKAHEAD: usize = 1;

/// Simulates a [`RecursiveProgram`] with full call/return bookkeeping.
pub struct RecursiveTraceBuilder<'a> {
    program: &'a RecursiveProgram,
    max_depth: usize,
}

impl<'a> RecursiveTraceBuilder<'a> {
    pub fn new(program: &'a RecursiveProgram) -> Self {
        RecursiveTraceBuilder {
            program,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }

    /// Override the depth guard. The CLI never does this; tests use it to keep traces short.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl TraceBuilder for RecursiveTraceBuilder<'_> {
    fn build(&self) -> ExecutionTrace {
        let mut simulation = Simulation {
            program: self.program,
            max_depth: self.max_depth,
            recorder: TraceRecorder::new(),
            stack: CallStack::new(),
            next_frame_id: 0,
        };
        simulation.run();
        tracing::debug!(
            function = %self.program.function_name,
            snapshots = simulation.recorder.len(),
            calls = simulation.next_frame_id,
            "built recursive trace"
        );
        simulation.recorder.finish()
    }
}

/// Result of executing one body statement
enum Flow {
    Next,
    /// Condition was false: skip the statement it guards
    SkipGuarded,
    Return(i64),
}

/// A call to the simulated function found inside an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallSite<'e> {
    /// Byte range of `name(...)` in the expression
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Text between the parentheses
    pub(crate) arg: &'e str,
}

/// Mutable state of one build pass. Owned exclusively by the builder.
struct Simulation<'a> {
    program: &'a RecursiveProgram,
    max_depth: usize,
    recorder: TraceRecorder,
    stack: CallStack,
    next_frame_id: usize,
}

impl Simulation<'_> {
    fn run(&mut self) {
        let program = self.program;
        let Some(main_call) = &program.main_call else {
            let err = TraceError::MissingEntryPoint {
                function: program.function_name.clone(),
            };
            tracing::warn!(%err, "recursive program has no entry call");
            self.record(RecursiveSnapshot::new(
                RecursiveStepKind::Error,
                format!("Error: {}", err),
                0,
            ));
            return;
        };

        self.record(
            RecursiveSnapshot::new(
                RecursiveStepKind::Start,
                format!(
                    "Starting execution of {}({})",
                    program.function_name,
                    main_call.args.join(", ")
                ),
                0,
            )
            .with_line(main_call.line),
        );

        match self.execute_function(main_call, 0, &program.global_env()) {
            Ok(result) => {
                let shown = result.map_or_else(|| "None".to_string(), |v| v.to_string());
                self.record(
                    RecursiveSnapshot::new(
                        RecursiveStepKind::Final,
                        format!("Final result: {}", shown),
                        0,
                    )
                    .with_return_value(result)
                    .with_line(main_call.line),
                );
            }
            // The guard already recorded its own error snapshot
            Err(err @ TraceError::RecursionLimitExceeded { .. }) => {
                tracing::info!(%err, "recursive simulation stopped by depth guard");
            }
            Err(err) => {
                tracing::info!(%err, "recursive simulation failed");
                let depth = self.stack.depth().saturating_sub(1);
                self.record(
                    RecursiveSnapshot::new(
                        RecursiveStepKind::Error,
                        format!("Error: {}", err),
                        depth,
                    )
                    .with_frame(self.stack.current().cloned())
                    .with_call_stack(self.stack.to_vec()),
                );
            }
        }
    }

    /// Simulate one call. `Ok(None)` means the body finished without returning.
    fn execute_function(
        &mut self,
        call: &MainCall,
        depth: usize,
        caller_env: &Env,
    ) -> Result<Option<i64>, TraceError> {
        if depth > self.max_depth {
            self.record(
                RecursiveSnapshot::new(
                    RecursiveStepKind::Error,
                    format!(
                        "Maximum recursion depth reached ({} levels)",
                        self.max_depth
                    ),
                    depth,
                )
                .with_call_stack(self.stack.to_vec())
                .with_line(call.line),
            );
            return Err(TraceError::RecursionLimitExceeded {
                depth,
                max_depth: self.max_depth,
            });
        }

        let frame = self.bind_frame(call, depth, caller_env)?;
        tracing::trace!(call = %frame.call_text(), depth, "push frame");
        let message = format!("Calling {}", frame.call_text());
        self.stack.push(frame);
        self.record_in_frame(RecursiveStepKind::Call, message, depth, self.program.def_line);

        let program = self.program;
        let body = &program.body;
        let mut return_value = None;
        let mut last_line = self.program.def_line;
        let mut pc = 0;

        while pc < body.len() {
            let statement = &body[pc];
            last_line = Some(statement.line());
            self.record_in_frame(
                RecursiveStepKind::Thinking,
                self.thinking(statement),
                depth,
                Some(statement.line()),
            );

            match self.execute_statement(pc, depth)? {
                Flow::Next => pc += 1,
                Flow::SkipGuarded => pc += 1 + BASE_CASE_LOOKAHEAD,
                Flow::Return(value) => {
                    return_value = Some(value);
                    break;
                }
            }
        }

        let popped = self.stack.pop();
        let shown = return_value.map_or_else(|| "None".to_string(), |v| v.to_string());
        let message = format!("Returning {} from {}", shown, self.program.function_name);
        self.record(
            RecursiveSnapshot::new(RecursiveStepKind::Return, message, depth)
                .with_frame(popped)
                .with_call_stack(self.stack.to_vec())
                .with_return_value(return_value)
                .with_line(last_line),
        );

        Ok(return_value)
    }

    /// New frame with parameters bound positionally from the evaluated arguments
    fn bind_frame(
        &mut self,
        call: &MainCall,
        depth: usize,
        caller_env: &Env,
    ) -> Result<StackFrame, TraceError> {
        let program = self.program;
        let mut frame = StackFrame::new(self.next_frame_id, &program.function_name, depth);
        self.next_frame_id += 1;

        if call.args.len() > program.parameters.len() {
            tracing::warn!(
                given = call.args.len(),
                expected = program.parameters.len(),
                "extra call arguments ignored"
            );
        }

        for (position, param) in program.parameters.iter().enumerate() {
            let value = match call.args.get(position) {
                Some(arg) => eval::evaluate(arg, caller_env)
                    .map_err(|source| TraceError::invalid_expression(arg, source))?,
                None => {
                    tracing::debug!(param = %param, "missing argument bound to 0");
                    0
                }
            };
            frame.params.set(param.as_str(), value);
        }

        Ok(frame)
    }

    fn execute_statement(&mut self, pc: usize, depth: usize) -> Result<Flow, TraceError> {
        let program = self.program;
        let body = &program.body;
        match &body[pc] {
            Statement::Condition { expr, line } => {
                let env = self.frame_env();
                let result = eval::evaluate_condition(expr, &env)
                    .map_err(|source| TraceError::invalid_expression(expr, source))?;
                self.record_in_frame(
                    RecursiveStepKind::Condition,
                    format!("Evaluating condition: {} = {}", expr, result),
                    depth,
                    Some(*line),
                );

                if !result {
                    self.record_in_frame(
                        RecursiveStepKind::RecursiveCase,
                        "Condition is false: recursive case, keep going",
                        depth,
                        Some(*line),
                    );
                    return Ok(Flow::SkipGuarded);
                }

                self.record_in_frame(
                    RecursiveStepKind::BaseCase,
                    "Condition is true: this is the base case",
                    depth,
                    Some(*line),
                );
                match body.get(pc + BASE_CASE_LOOKAHEAD) {
                    Some(Statement::Return { expr, line }) => {
                        self.execute_return(expr, *line, depth).map(Flow::Return)
                    }
                    // Nothing to return here; the walk continues with the next statement
                    _ => Ok(Flow::Next),
                }
            }
            Statement::Return { expr, line } => {
                self.execute_return(expr, *line, depth).map(Flow::Return)
            }
            Statement::Assign { name, expr, line } => {
                let value = match find_call(expr, &program.function_name) {
                    Some(site) => self.evaluate_recursive(expr, &site, *line, depth)?,
                    None => {
                        let env = self.frame_env();
                        eval::evaluate(expr, &env)
                            .map_err(|source| TraceError::invalid_expression(expr, source))?
                    }
                };
                if let Some(frame) = self.stack.current_mut() {
                    frame.locals.set(name.as_str(), value);
                }
                tracing::trace!(name = %name, value, "assign local");
                Ok(Flow::Next)
            }
        }
    }

    fn execute_return(&mut self, expr: &str, line: LineNo, depth: usize) -> Result<i64, TraceError> {
        if let Some(site) = find_call(expr, &self.program.function_name) {
            return self.evaluate_recursive(expr, &site, line, depth);
        }

        let env = self.frame_env();
        let value =
            eval::evaluate(expr, &env).map_err(|source| TraceError::invalid_expression(expr, source))?;
        self.record(
            RecursiveSnapshot::new(
                RecursiveStepKind::SimpleReturn,
                format!("Returning simple value: {}", value),
                depth,
            )
            .with_frame(self.stack.current().cloned())
            .with_call_stack(self.stack.to_vec())
            .with_return_value(Some(value))
            .with_line(Some(line)),
        );
        Ok(value)
    }

    /// Evaluate an expression holding one self-call: recurse, substitute the
    /// call text with its result, then evaluate what is left.
    fn evaluate_recursive(
        &mut self,
        expr: &str,
        site: &CallSite<'_>,
        line: LineNo,
        depth: usize,
    ) -> Result<i64, TraceError> {
        self.record_in_frame(
            RecursiveStepKind::PreRecursive,
            format!("About to make recursive call: {}", expr),
            depth,
            Some(line),
        );

        let caller_env = self.frame_env();
        let call = MainCall {
            args: split_arguments(site.arg),
            line: Some(line),
        };
        let result = self
            .execute_function(&call, depth + 1, &caller_env)?
            .ok_or_else(|| TraceError::NoReturnValue {
                call: expr[site.start..site.end].to_string(),
            })?;

        let literal = if result < 0 {
            format!("({})", result)
        } else {
            result.to_string()
        };
        let substituted = format!("{}{}{}", &expr[..site.start], literal, &expr[site.end..]);
        let value = eval::evaluate(&substituted, &caller_env)
            .map_err(|source| TraceError::invalid_expression(&substituted, source))?;

        self.record(
            RecursiveSnapshot::new(
                RecursiveStepKind::PostRecursive,
                format!(
                    "Recursive call completed, got {}: {} = {}",
                    result, substituted, value
                ),
                depth,
            )
            .with_frame(self.stack.current().cloned())
            .with_call_stack(self.stack.to_vec())
            .with_return_value(Some(value))
            .with_line(Some(line)),
        );
        Ok(value)
    }

    fn thinking(&self, statement: &Statement) -> String {
        match statement {
            Statement::Condition { .. } => "Checking whether the base case applies".to_string(),
            Statement::Return { expr, .. }
                if find_call(expr, &self.program.function_name).is_some() =>
            {
                "Need to solve a smaller subproblem first".to_string()
            }
            Statement::Return { .. } => "Found the answer, returning the result".to_string(),
            Statement::Assign { .. } => {
                let params = self
                    .stack
                    .current()
                    .map(|frame| frame.params.describe())
                    .unwrap_or_default();
                format!("Executing: {} (with {})", statement.source_text(), params)
            }
        }
    }

    fn frame_env(&self) -> Env {
        self.stack.current().map(StackFrame::env).unwrap_or_default()
    }

    /// Record a snapshot tied to the frame currently on top of the stack
    fn record_in_frame(
        &mut self,
        kind: RecursiveStepKind,
        message: impl Into<String>,
        depth: usize,
        line: Option<LineNo>,
    ) {
        let snapshot = RecursiveSnapshot::new(kind, message, depth)
            .with_frame(self.stack.current().cloned())
            .with_call_stack(self.stack.to_vec())
            .with_line(line);
        self.record(snapshot);
    }

    fn record(&mut self, snapshot: RecursiveSnapshot) {
        self.recorder.push(Snapshot::Recursive(snapshot));
    }
}

/// Find the first `name(...)` call in `expr`, matching parentheses
pub(crate) fn find_call<'e>(expr: &'e str, name: &str) -> Option<CallSite<'e>> {
    let bytes = expr.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut search_from = 0;

    while let Some(offset) = expr[search_from..].find(name) {
        let start = search_from + offset;
        let after_name = start + name.len();
        search_from = after_name;

        if start > 0 && is_ident(bytes[start - 1]) {
            continue;
        }
        let open = after_name + expr[after_name..].len() - expr[after_name..].trim_start().len();
        if bytes.get(open) != Some(&b'(') {
            continue;
        }

        let mut nesting = 0usize;
        for (i, ch) in expr[open..].char_indices() {
            match ch {
                '(' => nesting += 1,
                ')' => {
                    nesting -= 1;
                    if nesting == 0 {
                        let close = open + i;
                        return Some(CallSite {
                            start,
                            end: close + 1,
                            arg: expr[open + 1..close].trim(),
                        });
                    }
                }
                _ => {}
            }
        }
        // Unbalanced: leave it for the evaluator to reject
        return None;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factorial(base: &str, arg: &str) -> RecursiveProgram {
        RecursiveProgram {
            function_name: "factorial".to_string(),
            parameters: vec!["n".to_string()],
            body: vec![
                Statement::Condition {
                    expr: base.to_string(),
                    line: 2,
                },
                Statement::Return {
                    expr: "1".to_string(),
                    line: 3,
                },
                Statement::Return {
                    expr: "n * factorial(n - 1)".to_string(),
                    line: 4,
                },
            ],
            main_call: Some(MainCall::new([arg])),
            globals: Vec::new(),
            def_line: Some(1),
        }
    }

    fn kinds(trace: &ExecutionTrace, kind: RecursiveStepKind) -> Vec<&RecursiveSnapshot> {
        trace
            .iter()
            .filter_map(Snapshot::as_recursive)
            .filter(|s| s.kind == kind)
            .collect()
    }

    #[test]
    fn test_factorial_to_zero() {
        let program = factorial("n == 0", "3");
        let trace = RecursiveTraceBuilder::new(&program).build();

        let calls: Vec<usize> = kinds(&trace, RecursiveStepKind::Call)
            .iter()
            .map(|s| s.depth)
            .collect();
        assert_eq!(calls, vec![0, 1, 2, 3]);

        let returns: Vec<(usize, Option<i64>)> = kinds(&trace, RecursiveStepKind::Return)
            .iter()
            .map(|s| (s.depth, s.return_value))
            .collect();
        assert_eq!(
            returns,
            vec![(3, Some(1)), (2, Some(1)), (1, Some(2)), (0, Some(6))]
        );

        assert_eq!(trace.final_value(), Some(6));
        assert_eq!(trace.check_invariants(MAX_RECURSION_DEPTH), Ok(()));
    }

    #[test]
    fn test_base_case_sequence() {
        let program = factorial("n <= 1", "1");
        let trace = RecursiveTraceBuilder::new(&program).build();

        let sequence: Vec<&str> = trace.iter().map(Snapshot::kind_name).collect();
        assert_eq!(
            sequence,
            vec![
                "start",
                "call",
                "thinking",
                "condition",
                "base_case",
                "simple_return",
                "return",
                "final"
            ]
        );
    }

    #[test]
    fn test_false_condition_skips_guarded_return() {
        let program = factorial("n <= 1", "3");
        let trace = RecursiveTraceBuilder::new(&program).build();

        assert_eq!(kinds(&trace, RecursiveStepKind::Call).len(), 3);
        assert_eq!(kinds(&trace, RecursiveStepKind::RecursiveCase).len(), 2);
        assert_eq!(kinds(&trace, RecursiveStepKind::PostRecursive).len(), 2);
        assert_eq!(trace.final_value(), Some(6));
    }

    #[test]
    fn test_depth_guard_ends_trace_with_error() {
        // No reachable base case for a negative start
        let program = factorial("n == 0", "-1");
        let trace = RecursiveTraceBuilder::new(&program)
            .with_max_depth(4)
            .build();

        let deepest = kinds(&trace, RecursiveStepKind::Call)
            .iter()
            .map(|s| s.depth)
            .max();
        assert_eq!(deepest, Some(4));
        assert!(trace.last().is_some_and(Snapshot::is_error));
        assert!(kinds(&trace, RecursiveStepKind::Final).is_empty());
        assert_eq!(trace.check_invariants(4), Ok(()));
    }

    #[test]
    fn test_missing_main_call_is_single_error() {
        let mut program = factorial("n == 0", "3");
        program.main_call = None;
        let trace = RecursiveTraceBuilder::new(&program).build();

        assert_eq!(trace.len(), 1);
        let only = trace.get(0).and_then(Snapshot::as_recursive).unwrap();
        assert_eq!(only.kind, RecursiveStepKind::Error);
        assert!(only.message.contains("factorial"));
    }

    #[test]
    fn test_missing_arguments_bind_zero() {
        let mut program = factorial("n == 0", "3");
        program.main_call = Some(MainCall::new(Vec::<String>::new()));
        let trace = RecursiveTraceBuilder::new(&program).build();

        let first_call = kinds(&trace, RecursiveStepKind::Call)[0];
        assert_eq!(
            first_call.frame.as_ref().and_then(|f| f.params.get("n")),
            Some(0)
        );
        assert_eq!(trace.final_value(), Some(1));
    }

    #[test]
    fn test_locals_are_visible_to_later_statements() {
        let program = RecursiveProgram {
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
                Statement::Assign {
                    name: "rest".to_string(),
                    expr: "sum_to(n - 1)".to_string(),
                    line: 4,
                },
                Statement::Return {
                    expr: "n + rest".to_string(),
                    line: 5,
                },
            ],
            main_call: Some(MainCall::new(["3"])),
            globals: Vec::new(),
            def_line: Some(1),
        };
        let trace = RecursiveTraceBuilder::new(&program).build();

        assert_eq!(trace.final_value(), Some(6));
        let top_return = kinds(&trace, RecursiveStepKind::Return)
            .into_iter()
            .find(|s| s.depth == 0)
            .unwrap();
        assert_eq!(
            top_return.frame.as_ref().and_then(|f| f.locals.get("rest")),
            Some(3)
        );
    }

    #[test]
    fn test_entry_arguments_see_globals() {
        let mut program = factorial("n == 0", "start + 1");
        program.globals = vec![("start".to_string(), 2)];
        let trace = RecursiveTraceBuilder::new(&program).build();

        let first_call = kinds(&trace, RecursiveStepKind::Call)[0];
        assert_eq!(
            first_call.frame.as_ref().and_then(|f| f.params.get("n")),
            Some(3)
        );
        assert_eq!(trace.final_value(), Some(6));
    }

    #[test]
    fn test_evaluation_failure_becomes_error_snapshot() {
        let mut program = factorial("n == 0", "3");
        program.body[2] = Statement::Return {
            expr: "n * factorial(n - 1) % 7".to_string(),
            line: 4,
        };
        let trace = RecursiveTraceBuilder::new(&program).build();

        let last = trace.last().and_then(Snapshot::as_recursive).unwrap();
        assert_eq!(last.kind, RecursiveStepKind::Error);
        assert!(last.message.contains("cannot evaluate"));
        assert_eq!(trace.final_value(), None);
    }

    #[test]
    fn test_find_call() {
        let site = find_call("n * fact(n - 1)", "fact").unwrap();
        assert_eq!(site.arg, "n - 1");
        assert_eq!(&"n * fact(n - 1)"[site.start..site.end], "fact(n - 1)");
    }

    #[test]
    fn test_find_call_respects_word_boundaries_and_nesting() {
        assert_eq!(find_call("subfact(3)", "fact"), None);
        assert_eq!(find_call("fact + 1", "fact"), None);

        let site = find_call("1 + fact ((n - 1) / 2)", "fact").unwrap();
        assert_eq!(site.arg, "(n - 1) / 2");
    }

    #[test]
    fn test_find_call_unbalanced() {
        assert_eq!(find_call("fact(n - 1", "fact"), None);
    }
}
