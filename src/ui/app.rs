//! Main TUI application state and logic

use super::panes::{self, SourceScrollState};
use crate::config::{PlaybackConfig, EVENT_POLL_INTERVAL};
use crate::extract::{self, LineRange, SourceView};
use crate::playback::PlaybackController;
use crate::program::Program;
use crate::snapshot::Snapshot;
use crate::trace;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Space presses closer together than this are treated as key repeat
const SPACE_DEBOUNCE: Duration = Duration::from_millis(200);

/// The main application state
pub struct App {
    /// File the program was read from (for reload)
    pub path: PathBuf,

    /// `--lines` selection, reapplied on reload
    pub range: Option<LineRange>,

    /// Selected source lines
    pub view: SourceView,

    pub program: Program,

    pub playback: PlaybackController,

    pub source_scroll: SourceScrollState,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Option<Instant>,
}

impl App {
    /// Build the trace for `program` and set up playback at the first snapshot
    pub fn new(
        path: PathBuf,
        range: Option<LineRange>,
        view: SourceView,
        program: Program,
        config: PlaybackConfig,
    ) -> Self {
        let playback = PlaybackController::new(trace::build(&program), config);
        App {
            path,
            range,
            view,
            program,
            playback,
            source_scroll: SourceScrollState::default(),
            should_quit: false,
            status_message: String::from("Ready! Press space to play"),
            last_space_press: None,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.playback.is_playing() {
                let moved = self.playback.tick(Instant::now());
                if !self.playback.is_playing() {
                    self.status_message = "Playback complete".to_string();
                } else if moved {
                    self.status_message = "Playing...".to_string();
                }
            }

            // Poll with a timeout so autoplay keeps ticking
            if event::poll(EVENT_POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn current(&self) -> Option<&Snapshot> {
        self.playback.current_snapshot().snapshot()
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        match self.program {
            Program::ArrayLoop(_) => self.render_loop_view(frame, main_chunks[0]),
            Program::Recursive(_) => self.render_recursive_view(frame, main_chunks[0]),
        }

        panes::render_status_bar(
            frame,
            main_chunks[1],
            panes::StatusRenderData {
                message: &self.status_message,
                current_step: self.playback.cursor(),
                total_steps: self.playback.len(),
                speed_ms: self.playback.speed_ms(),
                is_playing: self.playback.is_playing(),
                is_error: self.current().is_some_and(Snapshot::is_error),
            },
        );
    }

    /// Source (60%) | Array (40%)
    fn render_loop_view(&mut self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.render_source(frame, columns[0]);

        if let Program::ArrayLoop(program) = &self.program {
            let snapshot = self.current().and_then(Snapshot::as_loop);
            panes::render_array_pane(
                frame,
                columns[1],
                panes::ArrayRenderData { program, snapshot },
            );
        }
    }

    /// Source | Call Stack | Thinking on top, recursion tree below
    fn render_recursive_view(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(rows[0]);

        self.render_source(frame, columns[0]);

        let snapshot = self.current().and_then(Snapshot::as_recursive);
        panes::render_stack_pane(frame, columns[1], panes::StackRenderData { snapshot });
        panes::render_thinking_pane(frame, columns[2], snapshot);
        panes::render_tree_pane(
            frame,
            rows[1],
            self.playback.trace(),
            self.playback.cursor(),
        );
    }

    fn render_source(&mut self, frame: &mut Frame, area: Rect) {
        let current = self.playback.current_snapshot().snapshot();
        panes::render_source_pane(
            frame,
            area,
            panes::SourceRenderData {
                view: &self.view,
                current_line: current.and_then(Snapshot::line),
                is_error: current.is_some_and(Snapshot::is_error),
            },
            &mut self.source_scroll,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.playback.pause();
                let n = c.to_digit(10).unwrap_or(1);
                let mut stepped = 0;
                for _ in 0..n {
                    if !self.playback.step_forward() {
                        break;
                    }
                    stepped += 1;
                }
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Right => {
                self.playback.pause();
                self.status_message = if self.playback.step_forward() {
                    "Stepped forward".to_string()
                } else {
                    "Already at the end".to_string()
                };
            }
            KeyCode::Left => {
                self.playback.pause();
                self.status_message = if self.playback.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Already at the start".to_string()
                };
            }
            KeyCode::Up => {
                let speed = self.playback.faster(now);
                self.status_message = format!("Speed: {}ms per step", speed);
            }
            KeyCode::Down => {
                let speed = self.playback.slower(now);
                self.status_message = format!("Speed: {}ms per step", speed);
            }
            KeyCode::Char(' ') => {
                let repeated = self
                    .last_space_press
                    .is_some_and(|last| now.duration_since(last) < SPACE_DEBOUNCE);
                if !repeated {
                    self.last_space_press = Some(now);
                    self.playback.toggle(now);
                    self.status_message = if self.playback.is_playing() {
                        "Playing...".to_string()
                    } else if self.playback.is_at_end() {
                        "At the end; press r to reset".to_string()
                    } else {
                        "Paused".to_string()
                    };
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.playback.reset();
                self.status_message = "Reset to start".to_string();
            }
            KeyCode::Enter => {
                self.playback.jump_to_end();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.playback.reset();
                self.status_message = "Jumped to start".to_string();
            }
            KeyCode::Char('l') | KeyCode::Char('L') => self.reload(),
            _ => {}
        }
    }

    /// Re-read the file and rebuild the trace. On failure the current trace is kept.
    fn reload(&mut self) {
        match extract::load_file(&self.path, self.range) {
            Ok((view, program)) => {
                let trace = trace::build(&program);
                let len = trace.len();
                self.view = view;
                self.program = program;
                self.playback.load(trace);
                self.source_scroll = SourceScrollState::default();
                self.status_message = format!("Reloaded ({} steps)", len);
            }
            Err(err) => {
                tracing::warn!(%err, "reload failed");
                self.status_message = format!("Reload failed: {}", err);
            }
        }
    }
}
