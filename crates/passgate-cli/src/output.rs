//! Terminal output helpers.
//!
//! Command results go to stdout; progress and failure messages to stderr.

use std::fmt::Display;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// Print a success line.
pub fn success(msg: impl Display) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a failure line to stderr.
pub fn error(msg: impl Display) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dimmed progress line to stderr.
pub fn progress(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    println!("{:>10}: {}", label.dimmed(), value);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
