//! Utilities module for logging, error types, and small helpers

pub mod error;
pub mod logging;

pub use error::{InferenceError, Result, ResultExt};
pub use logging::{init_logging, LogConfig, LogLevel};

/// Round a value to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a byte count in a human-readable way
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}
