//! A minimal, zero-dependency logging crate for the Ferroheap workspace.
//!
//! Provides thread-safe leveled logging with automatic module path capture
//! and colored output on stderr. The allocator is a library, so stdout is
//! left to the embedding program; every diagnostic this workspace emits
//! (the heap consistency checker in particular) goes through these macros.
//!
//! # Example
//!
//! ```
//! use ferrox_log::{error, warn, info, debug, Level};
//!
//! ferrox_log::set_level(Level::Debug);
//!
//! let bytes = 4096;
//! info!("seeded a chunk of {} bytes", bytes);
//! debug!("free list head moved");
//! warn!("arena refused an extension");
//! error!("header/footer mismatch");
//! ```
//!
//! The level can also come from the environment:
//!
//! ```
//! // Honors FERROX_LOG=error|warn|info|debug|trace, if set.
//! ferrox_log::init_from_env();
//! ```

use std::fmt::Arguments;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted by [`init_from_env`].
pub const LEVEL_ENV_VAR: &str = "FERROX_LOG";

/// Log levels ordered from most severe (Error) to least severe (Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Critical failures and invariant violations.
    Error = 0,
    /// Recoverable trouble, e.g. a refused arena extension.
    Warn = 1,
    /// High-level progress messages.
    Info = 2,
    /// Detailed diagnostic output.
    Debug = 3,
    /// Fine-grained tracing.
    Trace = 4,
}

impl Level {
    /// ANSI color escape for this level.
    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Upper-case tag printed in brackets.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Parses a level name, case-insensitively.
    ///
    /// ```
    /// use ferrox_log::Level;
    ///
    /// assert_eq!(Level::parse("warn"), Some(Level::Warn));
    /// assert_eq!(Level::parse("TRACE"), Some(Level::Trace));
    /// assert_eq!(Level::parse("loud"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Some(Level::Error),
            "WARN" => Some(Level::Warn),
            "INFO" => Some(Level::Info),
            "DEBUG" => Some(Level::Debug),
            "TRACE" => Some(Level::Trace),
            _ => None,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

/// The global logger. Holds nothing but the minimum level; filtering is a
/// single relaxed atomic load on the hot path.
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Sets the minimum level; messages below it are discarded.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Whether a message at `level` would currently be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, initializing it at `Level::Warn` on first use.
///
/// Warn is the library default: silent operation unless something is off.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Warn))
}

/// Sets the global minimum level.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the global level from a level name.
pub fn set_level_from_str(s: &str) -> Result<(), String> {
    match Level::parse(s) {
        Some(level) => {
            set_level(level);
            Ok(())
        }
        None => Err(format!("invalid log level: {s}")),
    }
}

/// Reads [`LEVEL_ENV_VAR`] and applies it if it names a valid level.
///
/// Unset or unparseable values leave the current level untouched, so this
/// is safe to call unconditionally from library consumers.
pub fn init_from_env() {
    if let Ok(value) = std::env::var(LEVEL_ENV_VAR)
        && let Some(level) = Level::parse(&value)
    {
        set_level(level);
    }
}

/// Formats and emits one record. Called by the macros after the level gate.
#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    const RESET: &str = "\x1b[0m";

    if !get_logger().enabled(level) {
        return;
    }

    let color = level.color_code();
    let tag = level.as_str();
    eprintln!("{color}[{tag}]{RESET} {target}: {args}");
}

/// The primary logging macro; captures the caller's module path.
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            if $crate::get_logger().enabled($level) {
                $crate::__log_with_target(
                    $level,
                    module_path!(),
                    format_args!($($arg)*)
                );
            }
        }
    };
}

/// Logs at the Error level.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at the Warn level.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at the Info level.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at the Debug level.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at the Trace level.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Debug < Level::Trace);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("error"), Some(Level::Error));
        assert_eq!(Level::parse("WARN"), Some(Level::Warn));
        assert_eq!(Level::parse("Info"), Some(Level::Info));
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse("trace"), Some(Level::Trace));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_logger_filtering() {
        let logger = Logger::new(Level::Info);

        assert!(logger.enabled(Level::Error));
        assert!(logger.enabled(Level::Warn));
        assert!(logger.enabled(Level::Info));
        assert!(!logger.enabled(Level::Debug));
        assert!(!logger.enabled(Level::Trace));

        logger.set_level(Level::Trace);
        assert!(logger.enabled(Level::Trace));
    }

    // Global-level assertions live in one test; the suite runs threaded and
    // concurrent set_level calls would interleave across tests otherwise.
    #[test]
    fn test_global_logger() {
        set_level_from_str("debug").unwrap();
        assert_eq!(get_logger().level(), Level::Debug);

        assert!(set_level_from_str("bogus").is_err());

        let logger1 = get_logger();
        let logger2 = get_logger();
        logger1.set_level(Level::Warn);
        assert_eq!(logger2.level(), Level::Warn);

        set_level(Level::Trace);
        error!("error {}", 1);
        warn!("warn {}", 2);
        info!("info {}", 3);
        debug!("debug {:?}", vec![4]);
        trace!("trace {}", 5);
    }
}
