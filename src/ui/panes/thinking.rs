// Thinking pane: narrates the current recursive step

use crate::snapshot::{RecursiveSnapshot, RecursiveStepKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Short headline and color for a step kind
fn headline(kind: RecursiveStepKind) -> (&'static str, Color) {
    match kind {
        RecursiveStepKind::Start => ("Starting", DEFAULT_THEME.accent),
        RecursiveStepKind::Call => ("New call", DEFAULT_THEME.function),
        RecursiveStepKind::Thinking => ("Thinking", DEFAULT_THEME.fg),
        RecursiveStepKind::Condition => ("Evaluating condition", DEFAULT_THEME.accent),
        RecursiveStepKind::BaseCase => ("Base case reached", DEFAULT_THEME.success),
        RecursiveStepKind::RecursiveCase => ("Recursive case", DEFAULT_THEME.pointer),
        RecursiveStepKind::PreRecursive => ("Making recursive call", DEFAULT_THEME.pointer),
        RecursiveStepKind::PostRecursive => ("Combining result", DEFAULT_THEME.return_value),
        RecursiveStepKind::SimpleReturn => ("Direct result", DEFAULT_THEME.return_value),
        RecursiveStepKind::Return => ("Returning", DEFAULT_THEME.return_value),
        RecursiveStepKind::Final => ("Done", DEFAULT_THEME.success),
        RecursiveStepKind::Error => ("Error", DEFAULT_THEME.error),
    }
}

pub fn render_thinking_pane(frame: &mut Frame, area: Rect, snapshot: Option<&RecursiveSnapshot>) {
    let block = Block::default()
        .title(" Thinking ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));

    let Some(snapshot) = snapshot else {
        let waiting = Paragraph::new("(waiting...)")
            .style(Style::default().fg(DEFAULT_THEME.muted))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    };

    let label = Style::default().fg(DEFAULT_THEME.muted);
    let (title, color) = headline(snapshot.kind);
    let mut lines = vec![
        Line::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(snapshot.message.clone(), Style::default().fg(DEFAULT_THEME.fg)),
        Line::raw(""),
    ];

    if let Some(stack_frame) = &snapshot.frame {
        if !stack_frame.params.is_empty() {
            lines.push(Line::styled("Parameters:", label));
            for (name, value) in stack_frame.params.iter() {
                lines.push(Line::raw(format!("   {} = {}", name, value)));
            }
        }
        if !stack_frame.locals.is_empty() {
            lines.push(Line::styled("Locals:", label));
            for (name, value) in stack_frame.locals.iter() {
                lines.push(Line::raw(format!("   {} = {}", name, value)));
            }
        }
        lines.push(Line::raw(""));
    }

    lines.push(Line::from(vec![
        Span::styled("Step ", label),
        Span::raw((snapshot.index + 1).to_string()),
        Span::styled("  Depth ", label),
        Span::raw(snapshot.depth.to_string()),
    ]));
    if let Some(value) = snapshot.return_value {
        lines.push(Line::from(vec![
            Span::styled("Value ", label),
            Span::styled(
                value.to_string(),
                Style::default()
                    .fg(DEFAULT_THEME.return_value)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
