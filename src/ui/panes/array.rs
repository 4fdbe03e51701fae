//! Array pane: boxed cells, a pointer under the current element, and the
//! condition/operation outcome of the current iteration

use crate::program::ArrayLoopProgram;
use crate::snapshot::{LoopSnapshot, LoopStepKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Three text rows of one boxed array cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLayout {
    pub top: String,
    pub middle: String,
    pub bottom: String,
    /// Width in terminal columns, borders included
    pub width: usize,
}

/// Box every value: `┌──┐ │5 │ └──┘`, at least four columns wide, value centered
pub fn array_cells(array: &[i64]) -> Vec<CellLayout> {
    array
        .iter()
        .map(|value| {
            let text = value.to_string();
            let width = (text.chars().count() + 2).max(4);
            let inner = width - 2;
            let left = (inner - text.chars().count()) / 2;
            let right = inner - text.chars().count() - left;
            CellLayout {
                top: format!("┌{}┐", "─".repeat(inner)),
                middle: format!("│{}{}{}│", " ".repeat(left), text, " ".repeat(right)),
                bottom: format!("└{}┘", "─".repeat(inner)),
                width,
            }
        })
        .collect()
}

/// `↑` under the middle of cell `index`, and `i=index` just below it
pub fn pointer_lines(cells: &[CellLayout], index: usize) -> Option<(String, String)> {
    let cell = cells.get(index)?;
    let column: usize = cells[..index].iter().map(|c| c.width).sum::<usize>() + cell.width / 2;
    let arrow = format!("{}↑", " ".repeat(column));
    let label = format!("{}i={}", " ".repeat(column.saturating_sub(1)), index);
    Some((arrow, label))
}

/// Data needed to render the array pane
pub struct ArrayRenderData<'a> {
    pub program: &'a ArrayLoopProgram,
    pub snapshot: Option<&'a LoopSnapshot>,
}

pub fn render_array_pane(frame: &mut Frame, area: Rect, data: ArrayRenderData) {
    let program = data.program;
    let block = Block::default()
        .title(format!(" Array: {} ", program.array_variable))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));

    let Some(snapshot) = data.snapshot else {
        let waiting = Paragraph::new("(initializing...)")
            .style(Style::default().fg(DEFAULT_THEME.muted))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    };

    let mut lines = Vec::new();
    let cells = array_cells(&snapshot.array);

    if cells.is_empty() {
        lines.push(Line::styled(
            "Array is empty",
            Style::default().fg(DEFAULT_THEME.muted),
        ));
    } else {
        for row in 0..3 {
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let style = if Some(i) == snapshot.loop_index {
                        Style::default()
                            .fg(DEFAULT_THEME.pointer)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(DEFAULT_THEME.accent)
                    };
                    let text = match row {
                        0 => &cell.top,
                        1 => &cell.middle,
                        _ => &cell.bottom,
                    };
                    Span::styled(text.clone(), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }

        if let Some((arrow, label)) = snapshot
            .loop_index
            .and_then(|index| pointer_lines(&cells, index))
        {
            let pointer_style = Style::default().fg(DEFAULT_THEME.pointer);
            lines.push(Line::styled(arrow, pointer_style));
            lines.push(Line::styled(label, pointer_style));
        }
    }

    lines.push(Line::raw(""));
    lines.extend(describe_step(program, snapshot));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn describe_step<'a>(program: &ArrayLoopProgram, snapshot: &LoopSnapshot) -> Vec<Line<'a>> {
    let label = Style::default().fg(DEFAULT_THEME.muted);
    let element = program.element_name();

    if snapshot.kind == LoopStepKind::Init {
        return vec![Line::from(vec![
            Span::styled("Initial: ", label),
            Span::styled(
                format!("{:?}", program.initial_array),
                Style::default().fg(DEFAULT_THEME.fg),
            ),
        ])];
    }

    let condition_holds = snapshot.condition_result.unwrap_or(true);
    let (verdict, verdict_color) = if condition_holds {
        ("true", DEFAULT_THEME.success)
    } else {
        ("false", DEFAULT_THEME.error)
    };

    let condition_text = match &program.condition {
        Some(condition) => format!("{} {} {}", element, condition.op, condition.right),
        None => "(none)".to_string(),
    };
    let operation_text = match program.operation {
        Some(operation) if condition_holds => format!("{} (applied)", operation.describe(&element)),
        Some(operation) => format!("{} (skipped)", operation.describe(&element)),
        None => "(none)".to_string(),
    };

    vec![
        Line::from(vec![
            Span::styled("Condition: ", label),
            Span::styled(condition_text, Style::default().fg(DEFAULT_THEME.fg)),
            Span::styled(" → ", label),
            Span::styled(verdict, Style::default().fg(verdict_color)),
        ]),
        Line::from(vec![
            Span::styled("Operation: ", label),
            Span::styled(operation_text, Style::default().fg(DEFAULT_THEME.return_value)),
        ]),
    ]
}
