// Recursive shape: one `def` with an indented body plus a top-level call

use super::{is_identifier, ExtractError, SourceLine, SourceView};
use crate::eval::{self, Env};
use crate::program::{MainCall, RecursiveProgram, Statement};
use crate::trace::recursive::find_call;

pub fn is_function_def(text: &str) -> bool {
    text.starts_with("def ") && text.contains('(') && text.ends_with(':')
}

pub fn extract(view: &SourceView) -> Result<RecursiveProgram, ExtractError> {
    let lines = view.lines();
    let def_position = lines
        .iter()
        .position(|l| is_function_def(l.code()))
        .ok_or(ExtractError::UnrecognizedProgram)?;
    let def = &lines[def_position];
    let (function_name, parameters) = parse_signature(def)?;

    let body_lines: Vec<&SourceLine> = lines[def_position + 1..]
        .iter()
        .take_while(|l| l.is_blank() || l.indent() > def.indent())
        .filter(|l| !l.is_blank())
        .collect();

    let mut body = Vec::new();
    for line in &body_lines {
        parse_statement(line, &mut body);
    }

    let body_end = def_position + 1 + body_lines.len();
    let top_level = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i < def_position || *i >= body_end)
        .map(|(_, l)| l)
        .filter(|l| l.indent() == 0 && !l.is_blank());

    let mut main_call = None;
    let mut globals = Vec::new();
    for line in top_level {
        if let Some(call) = parse_main_call(line, &function_name) {
            main_call = Some(call);
            break;
        }
        if let Some(global) = parse_global(line, &globals) {
            tracing::debug!(line = line.number, name = %global.0, value = global.1, "top-level value");
            globals.push(global);
        }
    }

    if main_call.is_none() {
        tracing::warn!(function = %function_name, "no top-level call found");
    }

    Ok(RecursiveProgram {
        function_name,
        parameters,
        body,
        main_call,
        globals,
        def_line: Some(def.number),
    })
}

/// `n = 4` (or any expression over earlier globals) ahead of the entry call
fn parse_global(line: &SourceLine, globals: &[(String, i64)]) -> Option<(String, i64)> {
    let (name, expr) = line.code().split_once('=')?;
    let name = name.trim();
    if !is_identifier(name) || expr.starts_with('=') {
        return None;
    }
    let env: Env = globals.iter().cloned().collect();
    let value = eval::evaluate(expr.trim(), &env).ok()?;
    Some((name.to_string(), value))
}

/// `def name(a, b):`
fn parse_signature(line: &SourceLine) -> Result<(String, Vec<String>), ExtractError> {
    let text = line.code();
    let invalid = || ExtractError::InvalidFunctionDef {
        line: line.number,
        text: text.to_string(),
    };

    let rest = text.strip_prefix("def ").ok_or_else(invalid)?;
    let (name, rest) = rest.split_once('(').ok_or_else(invalid)?;
    let (params, _) = rest.split_once(')').ok_or_else(invalid)?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(invalid());
    }

    let mut parameters = Vec::new();
    for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        // Default values are not simulated; keep the name
        let param = param.split('=').next().unwrap_or(param).trim();
        if !is_identifier(param) {
            return Err(invalid());
        }
        parameters.push(param.to_string());
    }
    Ok((name.to_string(), parameters))
}

fn parse_statement(line: &SourceLine, body: &mut Vec<Statement>) {
    let text = line.code();
    let number = line.number;

    if let Some(rest) = text.strip_prefix("if ") {
        let Some((expr, inline)) = rest.split_once(':') else {
            tracing::debug!(line = number, "if without ':' skipped");
            return;
        };
        body.push(Statement::Condition {
            expr: expr.trim().to_string(),
            line: number,
        });
        let inline = inline.trim();
        if !inline.is_empty() {
            push_simple(inline, number, body);
        }
        return;
    }

    if text.starts_with("elif ") || text == "else:" {
        tracing::debug!(line = number, text, "skipped");
        return;
    }

    push_simple(text, number, body);
}

/// `return e` or `name = e`
fn push_simple(text: &str, line: usize, body: &mut Vec<Statement>) {
    if let Some(expr) = text.strip_prefix("return ") {
        body.push(Statement::Return {
            expr: expr.trim().to_string(),
            line,
        });
        return;
    }

    if let Some((name, expr)) = text.split_once('=') {
        let name = name.trim();
        if is_identifier(name) && !expr.starts_with('=') {
            body.push(Statement::Assign {
                name: name.to_string(),
                expr: expr.trim().to_string(),
                line,
            });
            return;
        }
    }

    tracing::debug!(line, text, "unsupported statement skipped");
}

/// `f(3)`, `result = f(3)` or `print(f(3))`
fn parse_main_call(line: &SourceLine, function_name: &str) -> Option<MainCall> {
    let site = find_call(line.code(), function_name)?;
    let args = split_arguments(site.arg);
    Some(MainCall {
        args,
        line: Some(line.number),
    })
}

/// Split on commas outside parentheses
pub(crate) fn split_arguments(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut nesting = 0usize;
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '(' => nesting += 1,
            ')' => nesting = nesting.saturating_sub(1),
            ',' if nesting == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}
