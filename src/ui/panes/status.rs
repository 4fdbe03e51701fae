//! Status bar rendering with keybindings and playback indicators

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub message: &'a str,
    /// `None` while the trace is empty
    pub current_step: Option<usize>,
    pub total_steps: usize,
    pub speed_ms: u64,
    pub is_playing: bool,
    pub is_error: bool,
}

/// Badge shown at the far right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackBadge {
    Playing,
    End,
    Start,
}

impl PlaybackBadge {
    pub fn for_state(current_step: Option<usize>, total_steps: usize, is_playing: bool) -> Option<Self> {
        let step = current_step?;
        if is_playing {
            Some(PlaybackBadge::Playing)
        } else if step + 1 >= total_steps {
            Some(PlaybackBadge::End)
        } else if step == 0 {
            Some(PlaybackBadge::Start)
        } else {
            None
        }
    }
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let step_text = match data.current_step {
        Some(step) => format!(" Step {}/{} ", step + 1, data.total_steps),
        None => " Initializing... ".to_string(),
    };
    let bar_style = Style::default().bg(DEFAULT_THEME.current_line);

    let left_spans = vec![
        Span::styled(
            step_text,
            Style::default()
                .bg(if data.is_error {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.accent
                })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", bar_style.fg(DEFAULT_THEME.muted)),
        Span::styled(
            format!(" {} ", data.message),
            bar_style.fg(if data.is_error {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
        ),
    ];
    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(bar_style)
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.muted).fg(Color::Black);
    let desc_style = bar_style.fg(DEFAULT_THEME.fg);
    let sep_style = bar_style.fg(DEFAULT_THEME.muted);

    let bindings = [
        (" ←/→ ", " step "),
        (" ⎵ ", " play "),
        (" ↑/↓ ", " speed "),
        (" r ", " reset "),
        (" l ", " reload "),
        (" q ", " quit "),
    ];
    let mut right_spans = vec![Span::styled(format!(" {}ms ", data.speed_ms), desc_style)];
    for (key, desc) in bindings {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(" ", desc_style));
        right_spans.push(Span::styled(key, key_style));
        right_spans.push(Span::styled(desc, desc_style));
    }

    let badge = PlaybackBadge::for_state(data.current_step, data.total_steps, data.is_playing);
    if let Some(badge) = badge {
        let (text, color) = match badge {
            PlaybackBadge::Playing => (" ▶ PLAYING ", DEFAULT_THEME.pointer),
            PlaybackBadge::End => (" END ", DEFAULT_THEME.error),
            PlaybackBadge::Start => (" START ", DEFAULT_THEME.success),
        };
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            text,
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(bar_style)
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_priority() {
        assert_eq!(PlaybackBadge::for_state(None, 0, false), None);
        assert_eq!(PlaybackBadge::for_state(Some(0), 5, false), Some(PlaybackBadge::Start));
        assert_eq!(PlaybackBadge::for_state(Some(4), 5, false), Some(PlaybackBadge::End));
        assert_eq!(PlaybackBadge::for_state(Some(2), 5, true), Some(PlaybackBadge::Playing));
        assert_eq!(PlaybackBadge::for_state(Some(2), 5, false), None);
        // A one-snapshot trace is already at its end
        assert_eq!(PlaybackBadge::for_state(Some(0), 1, false), Some(PlaybackBadge::End));
    }
}
