//! Source extractor: turns a few lines of Python-like text into a [`Program`]
//!
//! This is pattern matching, not parsing. Exactly two shapes are recognized:
//!
//! - an array loop: `arr = [..]`, a `for ... in range(..)` header, an optional
//!   `if arr[i] <op> <int>:` guard and an optional in-place update of `arr[i]`
//! - a single recursive function: `def f(..):` with an indented body, plus one
//!   top-level call of `f`
//!
//! A `def` line anywhere in the selected range picks the recursive shape.
//!
//! # Line numbers
//!
//! Lines keep their 1-based number from the original file even when only a
//! `--lines` range is selected, so highlighted lines match the user's editor.

pub mod array_loop;
pub mod recursive;

use crate::program::{LineNo, Program};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Spaces a tab expands to
const TAB_WIDTH: usize = 4;

/// Why the source could not be turned into a program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid line range '{text}' (expected START-END, e.g. 1-10)")]
    InvalidLineRange { text: String },

    #[error("line range {start}-{end} is outside the file ({total} lines)")]
    LineRangeOutOfBounds {
        start: LineNo,
        end: LineNo,
        total: usize,
    },

    #[error("no array assignment like `arr = [1, 2, 3]` found")]
    NoArrayAssignment,

    #[error("line {line}: invalid array literal '{text}'")]
    InvalidArrayLiteral { line: LineNo, text: String },

    #[error("no `for ... in range(...)` loop found")]
    MissingLoop,

    #[error("line {line}: unsupported condition '{text}'")]
    UnsupportedCondition { line: LineNo, text: String },

    #[error("line {line}: unsupported operation '{text}'")]
    UnsupportedOperation { line: LineNo, text: String },

    #[error("line {line}: invalid function definition '{text}'")]
    InvalidFunctionDef { line: LineNo, text: String },

    #[error("no array loop or recursive function found")]
    UnrecognizedProgram,
}

/// Reading a source file failed, or its contents were not recognized
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Inclusive 1-based line range, parsed from `A-B`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: LineNo,
    pub end: LineNo,
}

impl FromStr for LineRange {
    type Err = ExtractError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ExtractError::InvalidLineRange {
            text: text.to_string(),
        };

        let (start, end) = text.split_once('-').ok_or_else(invalid)?;
        let start: LineNo = start.trim().parse().map_err(|_| invalid())?;
        let end: LineNo = end.trim().parse().map_err(|_| invalid())?;
        if start == 0 || end < start {
            return Err(invalid());
        }
        Ok(LineRange { start, end })
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One line of the selected source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: LineNo,
    pub text: String,
}

impl SourceLine {
    /// The line without a trailing `# comment`, trimmed. A `#` inside a
    /// string literal does not start a comment.
    pub fn code(&self) -> &str {
        let mut quote: Option<char> = None;
        for (i, ch) in self.text.char_indices() {
            match (quote, ch) {
                (None, '#') => return self.text[..i].trim(),
                (None, '"' | '\'') => quote = Some(ch),
                (Some(open), _) if ch == open => quote = None,
                _ => {}
            }
        }
        self.text.trim()
    }

    /// Nothing but whitespace or a comment
    pub fn is_blank(&self) -> bool {
        self.code().is_empty()
    }

    /// Leading spaces (tabs were already expanded)
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start().len()
    }
}

/// The lines the extractor and the source pane work on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceView {
    lines: Vec<SourceLine>,
}

impl SourceView {
    /// Every line of `source`, numbered from 1
    pub fn new(source: &str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, text)| SourceLine {
                number: i + 1,
                text: text.replace('\t', &" ".repeat(TAB_WIDTH)),
            })
            .collect();
        SourceView { lines }
    }

    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Position of a 1-based line number within the view
    pub fn position_of(&self, number: LineNo) -> Option<usize> {
        self.lines.iter().position(|l| l.number == number)
    }
}

/// Keep only the lines in `range`. A range ending past the file is cut short.
pub fn apply_line_range(
    source: &str,
    range: Option<LineRange>,
) -> Result<SourceView, ExtractError> {
    let mut view = SourceView::new(source);
    let Some(range) = range else {
        return Ok(view);
    };

    let total = view.len();
    if range.start > total {
        return Err(ExtractError::LineRangeOutOfBounds {
            start: range.start,
            end: range.end,
            total,
        });
    }
    if range.end > total {
        tracing::warn!(%range, total, "line range ends past the file, truncating");
    }

    view.lines
        .retain(|line| line.number >= range.start && line.number <= range.end);
    Ok(view)
}

/// Recognize the program shape in `view`
pub fn extract(view: &SourceView) -> Result<Program, ExtractError> {
    if view.lines().iter().any(|l| recursive::is_function_def(l.code())) {
        let program = recursive::extract(view)?;
        tracing::debug!(
            function = %program.function_name,
            statements = program.body.len(),
            has_entry = program.main_call.is_some(),
            "extracted recursive function"
        );
        return Ok(Program::Recursive(program));
    }

    match array_loop::extract(view) {
        Ok(program) => {
            tracing::debug!(
                array = %program.array_variable,
                len = program.initial_array.len(),
                condition = program.condition.is_some(),
                operation = ?program.operation,
                "extracted array loop"
            );
            Ok(Program::ArrayLoop(program))
        }
        Err(ExtractError::NoArrayAssignment) => Err(ExtractError::UnrecognizedProgram),
        Err(err) => Err(err),
    }
}

/// Line-range selection and extraction in one step
pub fn extract_source(
    source: &str,
    range: Option<LineRange>,
) -> Result<(SourceView, Program), ExtractError> {
    let view = apply_line_range(source, range)?;
    let program = extract(&view)?;
    Ok((view, program))
}

/// Read `path` and extract the program from the selected lines
pub fn load_file(
    path: &Path,
    range: Option<LineRange>,
) -> Result<(SourceView, Program), LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = source.len(), "loaded source");
    Ok(extract_source(&source, range)?)
}

/// `name` is a plain identifier
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
