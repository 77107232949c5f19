//! Output formatting for CLI commands.
//!
//! Human-readable tables by default, JSON with `--json`.

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }

    pub fn is_json(&self) -> bool {
        *self == OutputMode::Json
    }
}

/// Print rows as a table, or as a JSON array
pub fn print_items<T: Tabled + Serialize>(items: &[T], mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Table => {
            if items.is_empty() {
                println!("(no results)");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(items)?),
    }
    Ok(())
}

/// Print a single item as pretty JSON regardless of mode
pub fn print_item<T: Serialize>(item: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}

pub fn print_kv(key: &str, value: impl std::fmt::Display) {
    println!("{key:>22}: {value}");
}

pub fn print_header(title: &str) {
    println!("\n\x1b[1m{title}\x1b[0m");
}

pub fn print_success(msg: &str) {
    println!("\x1b[32m{msg}\x1b[0m");
}

pub fn print_warn(msg: &str) {
    println!("\x1b[33m{msg}\x1b[0m");
}

pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m{msg}\x1b[0m");
}

/// Wrap `text` in the ANSI colour for the value's sign
pub fn toned(text: &str, value: f64) -> String {
    use crate::format::ValueTone;

    match ValueTone::of(value) {
        ValueTone::Positive => format!("\x1b[32m{text}\x1b[0m"),
        ValueTone::Negative => format!("\x1b[31m{text}\x1b[0m"),
        ValueTone::Neutral => text.to_string(),
    }
}
