use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use gopher_client::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    /// Listings go out as JSON when asked for, or when stdout is piped.
    pub fn detect(force_json: bool) -> Self {
        if force_json || !io::stdout().is_terminal() {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

fn type_indicator(raw_type: &str) -> &'static str {
    match raw_type {
        "1" => "[+]",
        "0" => "[T]",
        "7" => "[?]",
        "h" => "[H]",
        "g" | "I" | ":" => "[I]",
        "9" | "4" | "5" | "6" => "[B]",
        _ => "[.]",
    }
}

fn format_item(item: &Item) -> String {
    if item.is_info() {
        item.desc
            .lines()
            .map(|line| format!("      {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        format!(
            "{} {:<40} {}",
            type_indicator(&item.raw_type),
            item.desc,
            item.to_url()
        )
    }
}

pub fn print_items(items: &[Item], mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputMode::Text => {
            for item in items {
                println!("{}", format_item(item));
            }
        }
    }
    Ok(())
}

pub fn write_payload(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Renders a failure for stderr. JSON reports list every cause separately.
pub fn error_report(err: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let causes: Vec<String> = err.chain().map(ToString::to_string).collect();
            json!({ "error": err.to_string(), "causes": causes }).to_string()
        }
        OutputMode::Text => format!("error: {:#}", err),
    }
}
