use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gemwire_record::Record;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Print a decoded record. JSON keeps field order.
pub fn print_record(record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "KIND", "VALUE"]);
            for (field, value) in record.iter() {
                table.add_row(vec![
                    field.name.clone(),
                    field.kind.name().to_string(),
                    value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}:", record.layout().name());
            for (field, value) in record.iter() {
                println!("  {:<28} {value}", field.name);
            }
        }
    }
}

/// One record per line, for streams.
pub fn print_record_line(record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table | OutputFormat::Pretty => {
            let line = record
                .iter()
                .map(|(field, value)| format!("{}={value}", field.name))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

/// Print labelled values. `value` holds the JSON form of the same data.
pub fn print_properties<T: Serialize>(
    title: &str,
    rows: &[(&str, String)],
    value: &T,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PROPERTY", "VALUE"]);
            for (name, value) in rows {
                table.add_row(vec![name.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{title}:");
            let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0) + 1;
            for (name, value) in rows {
                println!("  {:<width$} {value}", format!("{name}:"), width = width);
            }
        }
    }
}

pub fn print_status(message: &str, format: OutputFormat) {
    #[derive(Serialize)]
    struct Status<'a> {
        ok: bool,
        message: &'a str,
    }

    match format {
        OutputFormat::Json => print_json(&Status { ok: true, message }),
        OutputFormat::Table | OutputFormat::Pretty => println!("{message}"),
    }
}
