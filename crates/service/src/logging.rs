//! Log subscriber setup.
//!
//! Verbosity runs from 0 (errors only) to 4 (trace); values above 4 are
//! treated as trace. `RUST_LOG`, when set, takes precedence.

use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Maps a verbosity level to the most detailed level that gets logged.
#[must_use]
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Builds the filter for `verbosity`, honouring `RUST_LOG`.
#[must_use]
pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbosity)).into())
        .from_env_lossy()
}

/// Installs a global `fmt` subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is kept.
pub fn init_logging(verbosity: u8) -> bool {
    let installed =
        tracing_subscriber::fmt().with_env_filter(env_filter(verbosity)).try_init().is_ok();
    if installed {
        tracing::debug!(level = %level_for(verbosity), "Logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, Level::ERROR)]
    #[case(1, Level::WARN)]
    #[case(2, Level::INFO)]
    #[case(3, Level::DEBUG)]
    #[case(4, Level::TRACE)]
    #[case(9, Level::TRACE)]
    fn test_level_for(#[case] verbosity: u8, #[case] expected: Level) {
        assert_eq!(level_for(verbosity), expected);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(2);
        assert!(!init_logging(2));
    }
}
