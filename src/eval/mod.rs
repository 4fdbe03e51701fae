//! Restricted expression evaluator
//!
//! Both trace builders compute operation results and condition results here.
//! The accepted language is deliberately tiny:
//!
//! - integer literals and identifiers bound in an [`Env`]
//! - element references such as `arr[i]`, looked up by their full text
//! - binary `+ - * /`, unary `-`, parentheses
//! - at most one comparison `> < >= <= == !=` (yields `1` or `0`)
//!
//! Anything else is an [`EvalError`]. Nothing is ever handed to a host
//! interpreter, so arbitrary program text cannot execute code.
//!
//! Division truncates toward zero. Overflow and division by zero are errors
//! rather than wrapping or panicking.

pub mod lexer;
pub mod parser;

use crate::program::Comparison;
use parser::{BinOp, Expr, Parser};
use rustc_hash::FxHashMap;

/// Variable bindings visible to an expression
pub type Env = FxHashMap<String, i64>;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character '{ch}' at column {column}")]
    UnexpectedChar { ch: char, column: usize },

    #[error("unexpected {found} at column {column}")]
    UnexpectedToken { found: String, column: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbound identifier '{name}'")]
    UnboundIdentifier { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {operation}")]
    Overflow { operation: String },
}

/// Parse without evaluating
pub fn parse(expr: &str) -> Result<Expr, EvalError> {
    Parser::new(expr)?.parse()
}

/// Evaluate an integer expression. A top-level comparison yields `1` or `0`.
pub fn evaluate(expr: &str, env: &Env) -> Result<i64, EvalError> {
    let tree = parse(expr)?;
    eval_expr(&tree, env)
}

/// Evaluate an `if` test; any non-zero result is true
pub fn evaluate_condition(expr: &str, env: &Env) -> Result<bool, EvalError> {
    evaluate(expr, env).map(|value| value != 0)
}

/// Evaluate a loop [`Comparison`] whose left operand is `subject`
pub fn evaluate_comparison(
    comparison: &Comparison,
    subject: &str,
    env: &Env,
) -> Result<bool, EvalError> {
    let left = evaluate(subject, env)?;
    Ok(comparison.op.holds(left, comparison.right))
}

pub fn eval_expr(expr: &Expr, env: &Env) -> Result<i64, EvalError> {
    match expr {
        Expr::Int(n) => Ok(*n),
        Expr::Var(name) => env
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnboundIdentifier { name: name.clone() }),
        Expr::Neg(operand) => {
            let value = eval_expr(operand, env)?;
            value.checked_neg().ok_or_else(|| EvalError::Overflow {
                operation: format!("-({})", value),
            })
        }
        Expr::Binary { op, left, right } => {
            let a = eval_expr(left, env)?;
            let b = eval_expr(right, env)?;
            apply_binary(*op, a, b)
        }
        Expr::Compare { op, left, right } => {
            let a = eval_expr(left, env)?;
            let b = eval_expr(right, env)?;
            Ok(i64::from(op.holds(a, b)))
        }
    }
}

fn apply_binary(op: BinOp, a: i64, b: i64) -> Result<i64, EvalError> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // Rust integer division already truncates toward zero
            a.checked_div(b)
        }
    };
    result.ok_or_else(|| EvalError::Overflow {
        operation: format!("{} {} {}", a, op.symbol(), b),
    })
}

/// Build an [`Env`] from `(name, value)` pairs
pub fn env_from<'a>(bindings: impl IntoIterator<Item = (&'a str, i64)>) -> Env {
    bindings
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::CompareOp;

    #[test]
    fn test_literal_arithmetic() {
        let env = Env::default();
        assert_eq!(evaluate("1 + 2 * 3", &env), Ok(7));
        assert_eq!(evaluate("(1 + 2) * 3", &env), Ok(9));
        assert_eq!(evaluate("10 - 4 - 3", &env), Ok(3));
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        let env = Env::default();
        assert_eq!(evaluate("7 / 2", &env), Ok(3));
        assert_eq!(evaluate("-7 / 2", &env), Ok(-3));
        assert_eq!(evaluate("7 / -2", &env), Ok(-3));
    }

    #[test]
    fn test_identifiers_are_substituted() {
        let env = env_from([("n", 5), ("acc", 2)]);
        assert_eq!(evaluate("n * acc", &env), Ok(10));
        assert_eq!(evaluate("n - 1", &env), Ok(4));
        assert_eq!(evaluate("-n", &env), Ok(-5));
    }

    #[test]
    fn test_unbound_identifier() {
        let env = env_from([("n", 5)]);
        assert_eq!(
            evaluate("m + 1", &env),
            Err(EvalError::UnboundIdentifier {
                name: "m".to_string()
            })
        );
    }

    #[test]
    fn test_conditions() {
        let env = env_from([("n", 1)]);
        assert_eq!(evaluate_condition("n <= 1", &env), Ok(true));
        assert_eq!(evaluate_condition("n == 0", &env), Ok(false));
        assert_eq!(evaluate_condition("n", &env), Ok(true));
        assert_eq!(evaluate("n != 0", &env), Ok(1));
    }

    #[test]
    fn test_comparison_against_element() {
        let env = env_from([("arr[i]", 5)]);
        let gt3 = Comparison::new(CompareOp::Gt, 3);
        assert_eq!(evaluate_comparison(&gt3, "arr[i]", &env), Ok(true));

        let env = env_from([("arr[i]", 1)]);
        assert_eq!(evaluate_comparison(&gt3, "arr[i]", &env), Ok(false));
    }

    #[test]
    fn test_arithmetic_failures() {
        let env = Env::default();
        assert_eq!(evaluate("1 / 0", &env), Err(EvalError::DivisionByZero));
        assert!(matches!(
            evaluate("9223372036854775807 + 1", &env),
            Err(EvalError::Overflow { .. })
        ));
    }

    #[test]
    fn test_rejects_anything_outside_the_grammar() {
        let env = env_from([("n", 4)]);
        for src in ["n % 2", "n ** 2", "n and 1", "print(n)", "n; 1", "'a'"] {
            assert!(evaluate(src, &env).is_err(), "accepted {:?}", src);
        }
    }
}
