// Diagnostic logging setup

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// Dropped. Used while the TUI owns the terminal and no file was given.
    Discard,
}

/// `-v` count to a default level. `RUST_LOG` still overrides it.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(verbosity: u8, target: LogTarget<'_>) -> io::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogTarget::Discard => builder.with_writer(io::sink).try_init(),
    };

    installed.map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
}
