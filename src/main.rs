// traceviz: step through a simulated array loop or recursive function

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use traceviz::config::{PlaybackConfig, DEFAULT_SPEED_MS};
use traceviz::extract::{self, LineRange};
use traceviz::logging::{self, LogTarget};
use traceviz::trace;
use traceviz::ui::App;

/// Visualize a small Python-style array loop or recursive function step by step.
#[derive(Parser)]
#[command(name = "traceviz", version, about)]
struct Cli {
    /// Source file to visualize.
    file: PathBuf,

    /// Line range to visualize, e.g. 1-10.
    #[arg(short, long)]
    lines: Option<LineRange>,

    /// Autoplay interval in milliseconds (clamped to 500-5000).
    #[arg(long, default_value_t = DEFAULT_SPEED_MS)]
    speed: u64,

    /// Print every snapshot instead of starting the TUI.
    #[arg(long)]
    dump: bool,

    /// Write logs to this file (the TUI otherwise discards them).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let target = match (&cli.log_file, cli.dump) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::Discard,
    };
    logging::init(cli.verbose, target)?;

    let (view, program) = match extract::load_file(&cli.file, cli.lines) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    tracing::info!(shape = program.shape_name(), lines = view.len(), "program extracted");

    if cli.dump {
        let trace = trace::build(&program);
        let mut stdout = io::stdout().lock();
        for snapshot in &trace {
            writeln!(stdout, "{}", snapshot)?;
        }
        if let Some(value) = trace.final_value() {
            writeln!(stdout, "result: {}", value)?;
        } else if let Some(array) = trace.final_array() {
            writeln!(stdout, "result: {:?}", array)?;
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let config = PlaybackConfig::with_initial_speed(cli.speed);
    let mut app = App::new(cli.file, cli.lines, view, program, config);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
