// Array loop shape: `arr = [..]`, `for`, optional guard, optional update

use super::{is_identifier, ExtractError, SourceLine, SourceView};
use crate::program::{ArrayLoopProgram, CompareOp, Comparison, LineNo, Operation};

pub fn extract(view: &SourceView) -> Result<ArrayLoopProgram, ExtractError> {
    let mut program: Option<ArrayLoopProgram> = None;

    for line in view.lines() {
        let text = line.code();
        if text.is_empty() {
            continue;
        }

        let Some(current) = program.as_mut() else {
            if let Some((name, values)) = parse_array_assignment(line)? {
                let mut found = ArrayLoopProgram::new(name, values);
                found.init_line = Some(line.number);
                program = Some(found);
            }
            continue;
        };

        if is_for_loop(text) {
            if current.loop_line.is_none() {
                current.loop_line = Some(line.number);
            }
            continue;
        }

        let element = current.element_name();
        if let Some(rest) = text.strip_prefix("if ") {
            let (guard, inline) = match rest.split_once(':') {
                Some((guard, inline)) => (guard.trim(), inline.trim()),
                None => (rest.trim(), ""),
            };
            if !guard.contains(current.array_variable.as_str()) {
                tracing::debug!(line = line.number, "skipping unrelated if");
                continue;
            }
            current.condition = Some(parse_condition(guard, &element, line.number)?);
            if !inline.is_empty() {
                current.operation = Some(parse_operation(inline, &element, line.number)?);
            }
            continue;
        }

        if text.starts_with(element.as_str()) && text.contains('=') {
            current.operation = Some(parse_operation(text, &element, line.number)?);
            continue;
        }

        tracing::debug!(line = line.number, text, "ignoring line");
    }

    let program = program.ok_or(ExtractError::NoArrayAssignment)?;
    if program.loop_line.is_none() {
        return Err(ExtractError::MissingLoop);
    }
    Ok(program)
}

fn is_for_loop(text: &str) -> bool {
    text.starts_with("for ") && text.contains("range(")
}

/// `name = [1, 2, 3]`. `Ok(None)` when the line is not an array assignment.
fn parse_array_assignment(line: &SourceLine) -> Result<Option<(String, Vec<i64>)>, ExtractError> {
    let text = line.code();
    let Some((name, value)) = text.split_once('=') else {
        return Ok(None);
    };
    let name = name.trim();
    let value = value.trim();
    if !is_identifier(name) || !value.starts_with('[') {
        return Ok(None);
    }

    let invalid = || ExtractError::InvalidArrayLiteral {
        line: line.number,
        text: value.to_string(),
    };
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(invalid)?;

    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(Some((name.to_string(), Vec::new())));
    }
    // One trailing comma is allowed, empty items elsewhere are not
    let inner = inner.strip_suffix(',').unwrap_or(inner);

    let mut values = Vec::new();
    for item in inner.split(',').map(str::trim) {
        values.push(item.parse::<i64>().map_err(|_| invalid())?);
    }
    Ok(Some((name.to_string(), values)))
}

/// `arr[i] > 3`
fn parse_condition(guard: &str, element: &str, line: LineNo) -> Result<Comparison, ExtractError> {
    let unsupported = || ExtractError::UnsupportedCondition {
        line,
        text: guard.to_string(),
    };

    let rest = guard.strip_prefix(element).ok_or_else(unsupported)?.trim_start();
    let op_len = rest
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(rest.len());
    let op = CompareOp::from_symbol(&rest[..op_len]).ok_or_else(unsupported)?;
    let right = rest[op_len..]
        .trim()
        .parse::<i64>()
        .map_err(|_| unsupported())?;

    Ok(Comparison::new(op, right))
}

/// `arr[i] = arr[i] * 2`, `arr[i] *= 2`, `arr[i] += c`, `arr[i] = arr[i] - c`, ...
fn parse_operation(text: &str, element: &str, line: LineNo) -> Result<Operation, ExtractError> {
    let unsupported = || ExtractError::UnsupportedOperation {
        line,
        text: text.to_string(),
    };

    let rest = text.strip_prefix(element).ok_or_else(unsupported)?.trim_start();
    let (symbol, operand) = if let Some(operand) = rest.strip_prefix("*=") {
        ('*', operand)
    } else if let Some(operand) = rest.strip_prefix("+=") {
        ('+', operand)
    } else if let Some(operand) = rest.strip_prefix("-=") {
        ('-', operand)
    } else {
        let value = rest.strip_prefix('=').ok_or_else(unsupported)?.trim();
        let value = value
            .strip_prefix(element)
            .ok_or_else(unsupported)?
            .trim_start();
        let mut chars = value.chars();
        let symbol = chars.next().ok_or_else(unsupported)?;
        (symbol, chars.as_str())
    };

    let operand: i64 = operand.trim().parse().map_err(|_| unsupported())?;
    match symbol {
        '*' if operand == 2 => Ok(Operation::MultiplyBy2),
        '+' => Ok(Operation::AddConstant(operand)),
        '-' => operand
            .checked_neg()
            .map(Operation::AddConstant)
            .ok_or_else(unsupported),
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_text(source: &str) -> Result<ArrayLoopProgram, ExtractError> {
        extract(&SourceView::new(source))
    }

    #[test]
    fn test_full_shape() {
        let program = extract_text(
            "arr = [5, 1, 9]\nfor i in range(len(arr)):\n    if arr[i] > 3:\n        arr[i] = arr[i] + 1\n",
        )
        .unwrap();

        assert_eq!(program.array_variable, "arr");
        assert_eq!(program.initial_array, vec![5, 1, 9]);
        assert_eq!(program.condition, Some(Comparison::new(CompareOp::Gt, 3)));
        assert_eq!(program.operation, Some(Operation::AddConstant(1)));
        assert_eq!(program.init_line, Some(1));
        assert_eq!(program.loop_line, Some(2));
    }

    #[test]
    fn test_compound_assignment_forms() {
        let cases = [
            ("arr[i] *= 2", Operation::MultiplyBy2),
            ("arr[i] = arr[i] * 2", Operation::MultiplyBy2),
            ("arr[i] += 4", Operation::AddConstant(4)),
            ("arr[i] -= 4", Operation::AddConstant(-4)),
            ("arr[i] = arr[i] - 3", Operation::AddConstant(-3)),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_operation(text, "arr[i]", 1), Ok(expected), "{}", text);
        }
        assert!(parse_operation("arr[i] = arr[i] * 3", "arr[i]", 1).is_err());
        assert!(parse_operation("arr[i] = 0", "arr[i]", 1).is_err());
    }

    #[test]
    fn test_inline_guarded_update() {
        let program =
            extract_text("xs = [1, 2]\nfor i in range(2):\n    if xs[i] != 1: xs[i] *= 2\n").unwrap();
        assert_eq!(program.condition, Some(Comparison::new(CompareOp::Ne, 1)));
        assert_eq!(program.operation, Some(Operation::MultiplyBy2));
    }

    #[test]
    fn test_array_literals() {
        let program = extract_text("arr = []\nfor i in range(0):\n    pass\n").unwrap();
        assert!(program.initial_array.is_empty());

        let program = extract_text("arr = [-1, 2,]\nfor i in range(2):\n").unwrap();
        assert_eq!(program.initial_array, vec![-1, 2]);

        assert!(matches!(
            extract_text("arr = [1, two]\nfor i in range(2):\n"),
            Err(ExtractError::InvalidArrayLiteral { line: 1, .. })
        ));
        for malformed in ["arr = [,1]", "arr = [1,,2,]", "arr = [1,,]", "arr = [,]"] {
            let source = format!("{}\nfor i in range(2):\n", malformed);
            assert!(
                matches!(
                    extract_text(&source),
                    Err(ExtractError::InvalidArrayLiteral { line: 1, .. })
                ),
                "accepted {:?}",
                malformed
            );
        }
    }

    #[test]
    fn test_trailing_comments_are_ignored() {
        let program = extract_text(
            "arr = [1, 2, 3]  # data\nfor i in range(len(arr)):  # walk\n    # double it\n    arr[i] = arr[i] * 2  # in place\n",
        )
        .unwrap();
        assert_eq!(program.initial_array, vec![1, 2, 3]);
        assert_eq!(program.operation, Some(Operation::MultiplyBy2));
        assert_eq!(program.loop_line, Some(2));
    }

    #[test]
    fn test_missing_pieces() {
        assert_eq!(extract_text("x = 1\n"), Err(ExtractError::NoArrayAssignment));
        assert_eq!(
            extract_text("arr = [1]\narr[i] *= 2\n"),
            Err(ExtractError::MissingLoop)
        );
        assert!(matches!(
            extract_text("arr = [1]\nfor i in range(1):\n    if arr[i] > n:\n"),
            Err(ExtractError::UnsupportedCondition { line: 3, .. })
        ));
    }
}
