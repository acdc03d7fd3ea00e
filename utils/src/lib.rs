//! Shared utilities for retrovote.

pub mod files;
pub mod logging;
pub mod stats;
pub mod time;

pub use files::{append_line, read_lines, FileError};
pub use logging::{init_logging, LogFormat};
pub use stats::StatsCounter;
pub use time::format_elapsed;
