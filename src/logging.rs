//! Log subscriber setup
//!
//! The crate logs through `tracing`: issued SQL at debug level, staging at
//! trace level. Applications with their own subscriber can ignore this.

use tracing::Level;

/// Minimum level written by [`init_logging`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most detailed; staged operations and skipped keys
    Verbose,
    Debug,
    #[default]
    Info,
    Warning,
    /// Errors, including fatal ones
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Verbose => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_target(false)
        .try_init()
        .is_ok()
}
