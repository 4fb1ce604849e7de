//! Leveled stderr logging with macros.
//!
//! The minimum level is read once from the `VM_INTEROP_LOG` environment variable
//! (`debug`, `info`, `warn`, `error` or `off`; default `info`) and can be changed at
//! runtime with [`set_level`]. Logging is compiled out of unit tests.

use std::fmt::Display;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Environment variable holding the minimum log level.
pub const LOG_ENV: &str = "VM_INTEROP_LOG";

/// Log level for filtering messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Parses a level name, case-insensitively.
    pub fn parse(name: &str) -> Option<Level> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        f.pad(name)
    }
}

const FILTER_OFF: u8 = 0xFE;
const FILTER_UNSET: u8 = 0xFF;

static MIN_LEVEL: AtomicU8 = AtomicU8::new(FILTER_UNSET);

/// Sets the minimum level that gets written. `None` disables logging.
pub fn set_level(level: Option<Level>) {
    MIN_LEVEL.store(level.map_or(FILTER_OFF, |l| l as u8), Ordering::Relaxed);
}

/// Returns true if messages at `level` are currently written.
pub fn enabled(level: Level) -> bool {
    let mut min = MIN_LEVEL.load(Ordering::Relaxed);
    if min == FILTER_UNSET {
        min = filter_from_env(std::env::var(LOG_ENV).ok().as_deref());
        MIN_LEVEL.store(min, Ordering::Relaxed);
    }
    (level as u8) >= min
}

fn filter_from_env(value: Option<&str>) -> u8 {
    match value {
        None => Level::Info as u8,
        Some(v) if v.trim().eq_ignore_ascii_case("off") => FILTER_OFF,
        Some(v) => Level::parse(v).unwrap_or(Level::Info) as u8,
    }
}

/// Formats seconds since the epoch as a UTC wall-clock time of day.
fn time_of_day(secs: u64, millis: u32) -> String {
    let day_secs = secs % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        day_secs / 3600,
        (day_secs / 60) % 60,
        day_secs % 60,
        millis
    )
}

/// Internal logging function. Use the `debug!`, `info!`, `warn!` or `error!` macros.
#[doc(hidden)]
pub fn log(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();

    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    match level {
        Level::Debug => {
            spec.set_fg(Some(Color::Cyan));
        }
        Level::Info => {}
        Level::Warn => {
            spec.set_fg(Some(Color::Yellow)).set_bold(true);
        }
        Level::Error => {
            spec.set_fg(Some(Color::Red)).set_bold(true);
        }
    }
    let _ = stderr.set_color(&spec);
    let _ = write!(
        stderr,
        "{} [{:5}] ",
        time_of_day(now.as_secs(), now.subsec_millis()),
        level
    );
    let _ = writeln!(stderr, "{}", message);
    let _ = stderr.reset();
}

/// Logs a debug-level message.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Debug, &format!($($arg)*))
        }
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Info, &format!($($arg)*))
        }
    }};
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Warn, &format!($($arg)*))
        }
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Error, &format!($($arg)*))
        }
    }};
}
