//! Source pane: the selected program lines with the current line highlighted
//!
//! Lines keep their original file numbers. Highlighting is a small
//! word-by-word pass over each line, enough for the handful of keywords the
//! two program shapes use.

use crate::extract::SourceView;
use crate::program::LineNo;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Keyword-level highlighting for one line of Python-like source
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            flush_word(&mut spans, &mut current_word, false);
            let rest: String = chars[i..].iter().collect();
            spans.push(Span::styled(rest, Style::default().fg(DEFAULT_THEME.muted)));
            break;
        }

        if c == '"' || c == '\'' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += 1;
            }
            end = (end + 1).min(chars.len());
            let literal: String = chars[i..end].iter().collect();
            spans.push(Span::styled(literal, Style::default().fg(DEFAULT_THEME.string)));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush_word(&mut spans, &mut current_word, c == '(');
            let style = match c {
                '(' | ')' | '[' | ']' | ':' => Style::default().fg(DEFAULT_THEME.accent),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_call: bool) {
    if word.is_empty() {
        return;
    }
    let style = get_keyword_style(word, is_call);
    spans.push(Span::styled(std::mem::take(word), style));
}

fn get_keyword_style(word: &str, is_call: bool) -> Style {
    match word {
        "def" | "return" | "if" | "elif" | "else" | "for" | "while" | "in" | "and" | "or"
        | "not" | "pass" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "True" | "False" | "None" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.chars().all(|c| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
}

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub view: &'a SourceView,
    pub current_line: Option<LineNo>,
    pub is_error: bool,
}

/// Render the source pane, keeping the current line in the middle where possible
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData,
    scroll_state: &mut SourceScrollState,
) {
    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));

    let lines = data.view.lines();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    if let Some(position) = data.current_line.and_then(|n| data.view.position_of(n)) {
        let max_scroll = lines.len().saturating_sub(visible_height);
        scroll_state.offset = position.saturating_sub(visible_height / 2).min(max_scroll);
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|source_line| {
            let is_current = Some(source_line.number) == data.current_line;
            let marker = if is_current { "▶" } else { " " };
            let line_num_str = format!("{}{:3} ", marker, source_line.number);

            let (num_style, background) = match (is_current, data.is_error) {
                (true, true) => (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Some(Style::default().bg(DEFAULT_THEME.error).fg(Color::White)),
                ),
                (true, false) => (
                    Style::default()
                        .fg(DEFAULT_THEME.pointer)
                        .add_modifier(Modifier::BOLD),
                    Some(Style::default().bg(DEFAULT_THEME.current_line)),
                ),
                _ => (Style::default().fg(DEFAULT_THEME.muted), None),
            };

            let mut content_line = highlight_source_code(&source_line.text);
            if let Some(background) = background {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(background);
                }
            }

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let line = highlight_source_code("    return n * fact(n - 1)  # recurse");
        let text: String = words(&line).concat();
        assert_eq!(text, "    return n * fact(n - 1)  # recurse");
    }

    #[test]
    fn test_highlight_styles() {
        let line = highlight_source_code("def fact(n):");
        let def = &line.spans[0];
        assert_eq!(def.content, "def");
        assert_eq!(def.style.fg, Some(DEFAULT_THEME.keyword));

        let name = line.spans.iter().find(|s| s.content == "fact").unwrap();
        assert_eq!(name.style.fg, Some(DEFAULT_THEME.function));
    }
}
