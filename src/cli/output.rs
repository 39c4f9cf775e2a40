//! Shared terminal output helpers.
//!
//! All user-facing text goes through these so the command modules stay
//! free of styling concerns. `console` handles NO_COLOR and non-tty
//! detection on its own.

use std::fmt::Display;

use console::style;

/// Success line with a checkmark.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Error line on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Warning line.
pub fn warn(msg: &str) {
    println!("{} {}", style("⚠").yellow(), msg);
}

/// Hint line, e.g. the command to run next.
pub fn hint(msg: &str) {
    println!("{} {}", style("→").cyan(), style(msg).cyan());
}

/// Bold section header.
pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Indented key-value pair.
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

/// Indented bullet item.
pub fn item(msg: impl Display) {
    println!("  • {msg}");
}

/// Indented dimmed line for secondary info.
pub fn dim(msg: &str) {
    println!("  {}", style(msg).dim());
}
