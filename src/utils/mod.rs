//! Shared utilities

mod logger;
mod timer;

pub use logger::{init_logger, LogLevel};
#[cfg(test)]
pub use logger::capture_logs;
pub use timer::Timer;
