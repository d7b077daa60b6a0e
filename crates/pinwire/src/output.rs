use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Tabular view of a command's result, used for every format except JSON.
pub struct Rows {
    header: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Rows {
    pub fn new(header: Vec<&'static str>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Print `value` as JSON, or `rows` in the other formats.
pub fn emit<T: Serialize>(value: &T, rows: &Rows, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(rows.header.clone());
            for row in &rows.rows {
                table.add_row(row.clone());
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows.rows {
                let line: Vec<String> = rows
                    .header
                    .iter()
                    .zip(row)
                    .map(|(key, value)| format!("{}={}", key.to_lowercase(), value))
                    .collect();
                println!("{}", line.join(" "));
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            for row in &rows.rows {
                let _ = writeln!(out, "{}", row.join("\t"));
            }
            let _ = out.flush();
        }
    }
}
