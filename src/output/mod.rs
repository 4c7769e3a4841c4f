//! Output formatting module
//!
//! Renders resource states for the terminal.

mod formatter;

pub use formatter::{OutputFormat, StateFormatter};
