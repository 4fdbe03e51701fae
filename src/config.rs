// Constants and playback configuration

use std::time::Duration;

/// Deepest call the recursive builder will simulate.
/// Calls at depth `MAX_RECURSION_DEPTH + 1` trip the guard and end the trace with an error.
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Fastest autoplay interval
pub const MIN_SPEED_MS: u64 = 500;

/// Slowest autoplay interval
pub const MAX_SPEED_MS: u64 = 5000;

/// Autoplay interval used when no `--speed` is given
pub const DEFAULT_SPEED_MS: u64 = 1000;

/// Speed change per ↑/↓ key press
pub const SPEED_STEP_MS: u64 = 200;

/// How long the TUI waits for a key before re-checking the autoplay timer
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Autoplay settings handed to the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub min_speed_ms: u64,
    pub max_speed_ms: u64,
    pub initial_speed_ms: u64,
    pub speed_step_ms: u64,
}

impl PlaybackConfig {
    /// Config with a user-chosen initial speed (clamped later by the controller)
    pub fn with_initial_speed(speed_ms: u64) -> Self {
        PlaybackConfig {
            initial_speed_ms: speed_ms,
            ..Self::default()
        }
    }

    /// Clamp an interval to the configured bounds
    pub fn clamp_speed(&self, speed_ms: u64) -> u64 {
        speed_ms.clamp(self.min_speed_ms, self.max_speed_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            min_speed_ms: MIN_SPEED_MS,
            max_speed_ms: MAX_SPEED_MS,
            initial_speed_ms: DEFAULT_SPEED_MS,
            speed_step_ms: SPEED_STEP_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_speed_bounds() {
        let config = PlaybackConfig::default();
        assert_eq!(config.clamp_speed(50), MIN_SPEED_MS);
        assert_eq!(config.clamp_speed(999_999), MAX_SPEED_MS);
        assert_eq!(config.clamp_speed(1200), 1200);
    }
}
