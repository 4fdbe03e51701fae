//! Call stack pane for the recursive view
//!
//! The deepest frame is drawn first with a marker; each frame shows its
//! parameters and any locals bound so far. On a `return` step the frame that
//! was just popped is shown underneath with its result.

use crate::memory::stack::StackFrame;
use crate::snapshot::{RecursiveSnapshot, RecursiveStepKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Frames drawn before collapsing the rest into "... and N more"
const MAX_FRAMES_SHOWN: usize = 8;

/// Data needed to render the stack pane
pub struct StackRenderData<'a> {
    pub snapshot: Option<&'a RecursiveSnapshot>,
}

pub fn render_stack_pane(frame: &mut Frame, area: Rect, data: StackRenderData) {
    let block = Block::default()
        .title(" Call Stack ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));

    let mut items = Vec::new();
    let frames = data.snapshot.map(|s| s.call_stack.as_slice()).unwrap_or(&[]);

    if frames.is_empty() {
        items.push(ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.muted)));
    }

    for (shown, stack_frame) in frames.iter().rev().take(MAX_FRAMES_SHOWN).enumerate() {
        let is_top = shown == 0;
        items.extend(frame_items(stack_frame, is_top));
    }
    if frames.len() > MAX_FRAMES_SHOWN {
        items.push(
            ListItem::new(format!("   ... and {} more", frames.len() - MAX_FRAMES_SHOWN))
                .style(Style::default().fg(DEFAULT_THEME.muted)),
        );
    }

    if let Some(snapshot) = data.snapshot {
        if snapshot.kind == RecursiveStepKind::Return {
            if let (Some(popped), Some(value)) = (&snapshot.frame, snapshot.return_value) {
                items.push(ListItem::new(Line::from(vec![
                    Span::styled("↩ ", Style::default().fg(DEFAULT_THEME.return_value)),
                    Span::styled(
                        popped.call_text(),
                        Style::default().fg(DEFAULT_THEME.muted),
                    ),
                    Span::styled(" = ", Style::default().fg(DEFAULT_THEME.muted)),
                    Span::styled(
                        value.to_string(),
                        Style::default()
                            .fg(DEFAULT_THEME.return_value)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])));
            }
        }
    }

    frame.render_widget(List::new(items).block(block), area);
}

fn frame_items(stack_frame: &StackFrame, is_top: bool) -> Vec<ListItem<'static>> {
    let indent = "  ".repeat(stack_frame.depth);
    let (marker, name_style) = if is_top {
        (
            "▸ ",
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(DEFAULT_THEME.muted))
    };

    let mut items = vec![ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(DEFAULT_THEME.pointer)),
        Span::raw(indent.clone()),
        Span::styled(stack_frame.signature(), name_style),
    ]))];

    for (name, value) in stack_frame.locals.iter() {
        items.push(ListItem::new(Line::from(vec![
            Span::raw(format!("  {}  ", indent)),
            Span::styled(name.to_string(), Style::default().fg(DEFAULT_THEME.fg)),
            Span::styled(" = ", Style::default().fg(DEFAULT_THEME.muted)),
            Span::styled(value.to_string(), Style::default().fg(DEFAULT_THEME.number)),
        ])));
    }
    items
}
