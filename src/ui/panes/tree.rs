//! Recursion tree pane with a progress bar
//!
//! The tree is rebuilt from the trace prefix up to the cursor on every frame.
//! It lists every call made so far: calls still on the stack are marked
//! active, finished ones show the value they returned.

use crate::snapshot::{ExecutionTrace, RecursiveStepKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use rustc_hash::FxHashMap;

/// Width of the progress bar, in cells
const PROGRESS_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub depth: usize,
    /// `factorial(3)`
    pub label: String,
    /// Set once the call has returned
    pub result: Option<i64>,
    pub returned: bool,
}

/// Calls seen in snapshots `0..=cursor`, in call order
pub fn call_tree(trace: &ExecutionTrace, cursor: usize) -> Vec<TreeNode> {
    let mut nodes: Vec<TreeNode> = Vec::new();
    let mut by_frame: FxHashMap<usize, usize> = FxHashMap::default();

    for snapshot in trace.iter().take(cursor.saturating_add(1)) {
        let Some(step) = snapshot.as_recursive() else {
            continue;
        };
        let Some(stack_frame) = &step.frame else {
            continue;
        };

        match step.kind {
            RecursiveStepKind::Call => {
                by_frame.insert(stack_frame.id, nodes.len());
                nodes.push(TreeNode {
                    depth: stack_frame.depth,
                    label: stack_frame.call_text(),
                    result: None,
                    returned: false,
                });
            }
            RecursiveStepKind::Return => {
                if let Some(node) = by_frame.get(&stack_frame.id).and_then(|&i| nodes.get_mut(i)) {
                    node.result = step.return_value;
                    node.returned = true;
                }
            }
            _ => {}
        }
    }
    nodes
}

/// `[██████░░░░] 7/20`
pub fn progress_bar(cursor: usize, len: usize, width: usize) -> String {
    if len == 0 {
        return format!("[{}] 0/0", "░".repeat(width));
    }
    let filled = (cursor * width / len.saturating_sub(1).max(1)).min(width);
    format!(
        "[{}{}] {}/{}",
        "█".repeat(filled),
        "░".repeat(width - filled),
        cursor + 1,
        len
    )
}

pub fn render_tree_pane(frame: &mut Frame, area: Rect, trace: &ExecutionTrace, cursor: Option<usize>) {
    let block = Block::default()
        .title(" Recursion Tree ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let nodes = cursor.map(|c| call_tree(trace, c)).unwrap_or_default();
    let active = nodes.iter().rposition(|n| !n.returned);

    let mut lines: Vec<Line> = Vec::new();
    if nodes.is_empty() {
        lines.push(Line::styled(
            "(no calls yet)",
            Style::default().fg(DEFAULT_THEME.muted),
        ));
    }
    for (i, node) in nodes.iter().enumerate() {
        let indent = "  ".repeat(node.depth);
        let connector = if node.depth > 0 { "└─ " } else { "" };
        let (marker, style) = if Some(i) == active {
            (
                "● ",
                Style::default()
                    .fg(DEFAULT_THEME.pointer)
                    .add_modifier(Modifier::BOLD),
            )
        } else if node.returned {
            ("✓ ", Style::default().fg(DEFAULT_THEME.muted))
        } else {
            ("○ ", Style::default().fg(DEFAULT_THEME.fg))
        };

        let mut spans = vec![
            Span::raw(format!("{}{}", indent, connector)),
            Span::styled(marker, style),
            Span::styled(node.label.clone(), style),
        ];
        if let Some(result) = node.result {
            spans.push(Span::styled(" → ", Style::default().fg(DEFAULT_THEME.muted)));
            spans.push(Span::styled(
                result.to_string(),
                Style::default().fg(DEFAULT_THEME.return_value),
            ));
        }
        lines.push(Line::from(spans));
    }

    // Keep the newest calls visible
    let visible = rows[0].height as usize;
    let skip = lines.len().saturating_sub(visible);
    let tree = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>());
    frame.render_widget(tree, rows[0]);

    let progress = progress_bar(cursor.unwrap_or(0), trace.len(), PROGRESS_WIDTH);
    let progress_line = Line::from(vec![
        Span::styled("Progress: ", Style::default().fg(DEFAULT_THEME.muted)),
        Span::styled(progress, Style::default().fg(DEFAULT_THEME.accent)),
    ]);
    frame.render_widget(Paragraph::new(progress_line), rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::stack::StackFrame;
    use crate::snapshot::{RecursiveSnapshot, Snapshot, TraceRecorder};

    fn step(kind: RecursiveStepKind, id: usize, depth: usize, value: Option<i64>) -> Snapshot {
        let mut frame = StackFrame::new(id, "f", depth);
        frame.params.set("n", 2 - depth as i64);
        Snapshot::Recursive(
            RecursiveSnapshot::new(kind, "", depth)
                .with_frame(Some(frame))
                .with_return_value(value),
        )
    }

    #[test]
    fn test_call_tree_tracks_returns() {
        let mut recorder = TraceRecorder::new();
        recorder.push(step(RecursiveStepKind::Call, 0, 0, None));
        recorder.push(step(RecursiveStepKind::Call, 1, 1, None));
        recorder.push(step(RecursiveStepKind::Return, 1, 1, Some(1)));
        recorder.push(step(RecursiveStepKind::Return, 0, 0, Some(2)));
        let trace = recorder.finish();

        let early = call_tree(&trace, 1);
        assert_eq!(early.len(), 2);
        assert!(early.iter().all(|n| !n.returned));

        let done = call_tree(&trace, 3);
        assert_eq!(done[0].label, "f(2)");
        assert_eq!(done[0].result, Some(2));
        assert_eq!(done[1].label, "f(1)");
        assert_eq!(done[1].result, Some(1));
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 5, 4), "[░░░░] 1/5");
        assert_eq!(progress_bar(2, 5, 4), "[██░░] 3/5");
        assert_eq!(progress_bar(4, 5, 4), "[████] 5/5");
        assert_eq!(progress_bar(0, 1, 4), "[░░░░] 1/1");
    }
}
