// Program descriptors: the normalized input to the trace builders

use crate::eval::Env;
use std::fmt;

/// 1-based source line number, kept only for display
pub type LineNo = usize;

/// Comparison operators accepted in loop conditions and `if` tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::Ge => left >= right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Loop condition. The left operand is always the current loop element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub op: CompareOp,
    pub right: i64,
}

impl Comparison {
    pub fn new(op: CompareOp, right: i64) -> Self {
        Comparison { op, right }
    }
}

/// In-place update applied to the current element when the condition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    MultiplyBy2,
    AddConstant(i64),
}

impl Operation {
    /// Apply to one element. `None` on overflow.
    pub fn apply(self, value: i64) -> Option<i64> {
        match self {
            Operation::MultiplyBy2 => value.checked_mul(2),
            Operation::AddConstant(c) => value.checked_add(c),
        }
    }

    /// Short human-readable form, e.g. `x * 2` or `x + 3`
    pub fn describe(self, target: &str) -> String {
        match self {
            Operation::MultiplyBy2 => format!("{} * 2", target),
            Operation::AddConstant(c) if c < 0 => format!("{} - {}", target, c.unsigned_abs()),
            Operation::AddConstant(c) => format!("{} + {}", target, c),
        }
    }
}

/// A counted loop over one integer array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLoopProgram {
    pub array_variable: String,
    pub initial_array: Vec<i64>,
    pub condition: Option<Comparison>,
    pub operation: Option<Operation>,
    /// Line of the array assignment
    pub init_line: Option<LineNo>,
    /// Line of the `for` header
    pub loop_line: Option<LineNo>,
}

impl ArrayLoopProgram {
    pub fn new(array_variable: impl Into<String>, initial_array: Vec<i64>) -> Self {
        ArrayLoopProgram {
            array_variable: array_variable.into(),
            initial_array,
            condition: None,
            operation: None,
            init_line: None,
            loop_line: None,
        }
    }

    pub fn with_condition(mut self, condition: Comparison) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Name the current element is bound to while evaluating the condition (`arr[i]`)
    pub fn element_name(&self) -> String {
        format!("{}[i]", self.array_variable)
    }
}

/// One statement of the recursive function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `if <expr>:`
    Condition { expr: String, line: LineNo },
    /// `return <expr>`
    Return { expr: String, line: LineNo },
    /// `<name> = <expr>`
    Assign {
        name: String,
        expr: String,
        line: LineNo,
    },
}

impl Statement {
    pub fn line(&self) -> LineNo {
        match self {
            Statement::Condition { line, .. }
            | Statement::Return { line, .. }
            | Statement::Assign { line, .. } => *line,
        }
    }

    /// Source-like rendering used in trace messages
    pub fn source_text(&self) -> String {
        match self {
            Statement::Condition { expr, .. } => format!("if {}:", expr),
            Statement::Return { expr, .. } => format!("return {}", expr),
            Statement::Assign { name, expr, .. } => format!("{} = {}", name, expr),
        }
    }
}

/// The single top-level call that starts the simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainCall {
    pub args: Vec<String>,
    pub line: Option<LineNo>,
}

impl MainCall {
    pub fn new<S: Into<String>>(args: impl IntoIterator<Item = S>) -> Self {
        MainCall {
            args: args.into_iter().map(Into::into).collect(),
            line: None,
        }
    }
}

/// A single directly self-recursive function plus its entry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveProgram {
    pub function_name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
    pub main_call: Option<MainCall>,
    /// Top-level integer assignments made before the entry call, in order.
    /// The entry call's arguments may refer to them.
    pub globals: Vec<(String, i64)>,
    pub def_line: Option<LineNo>,
}

impl RecursiveProgram {
    /// Environment the entry call's arguments are evaluated in
    pub fn global_env(&self) -> Env {
        self.globals.iter().cloned().collect()
    }
}

/// Either of the two supported program shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    ArrayLoop(ArrayLoopProgram),
    Recursive(RecursiveProgram),
}

impl Program {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Program::ArrayLoop(_) => "array loop",
            Program::Recursive(_) => "recursive function",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_symbols_round_trip() {
        for op in [
            CompareOp::Gt,
            CompareOp::Lt,
            CompareOp::Ge,
            CompareOp::Le,
            CompareOp::Eq,
            CompareOp::Ne,
        ] {
            assert_eq!(CompareOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(CompareOp::from_symbol("=>"), None);
    }

    #[test]
    fn test_operation_overflow_is_none() {
        assert_eq!(Operation::MultiplyBy2.apply(21), Some(42));
        assert_eq!(Operation::MultiplyBy2.apply(i64::MAX), None);
        assert_eq!(Operation::AddConstant(-3).apply(1), Some(-2));
    }

    #[test]
    fn test_operation_describe() {
        assert_eq!(Operation::AddConstant(-4).describe("x"), "x - 4");
        assert_eq!(Operation::MultiplyBy2.describe("arr[i]"), "arr[i] * 2");
    }
}
