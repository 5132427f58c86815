use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gemwire_record::RecordLayout;
use serde::Serialize;

use crate::cmd::{DeviceArgs, LayoutCommand};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct LayoutSummary<'a> {
    name: &'a str,
    fields: usize,
    packed_size: usize,
}

pub fn run(command: LayoutCommand, args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args.load_layouts()?;
    match command {
        LayoutCommand::List => {
            let mut summaries = Vec::new();
            for name in registry.names() {
                let layout = registry
                    .get(name)
                    .map_err(|err| CliError::new(INTERNAL, err.to_string()))?;
                summaries.push((name.to_string(), layout.fields().len(), layout.packed_size()));
            }
            list(&summaries, format);
        }
        LayoutCommand::Show(show_args) => {
            let layout = registry
                .get(&show_args.name)
                .map_err(|err| CliError::new(USAGE, err.to_string()))?;
            show(&layout, format)?;
        }
    }
    Ok(SUCCESS)
}

fn list(summaries: &[(String, usize, usize)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<LayoutSummary<'_>> = summaries
                .iter()
                .map(|(name, fields, packed_size)| LayoutSummary {
                    name,
                    fields: *fields,
                    packed_size: *packed_size,
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LAYOUT", "FIELDS", "BYTES"]);
            for (name, fields, packed_size) in summaries {
                table.add_row(vec![name.clone(), fields.to_string(), packed_size.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, fields, packed_size) in summaries {
                println!("{name}: {fields} fields, {packed_size} bytes");
            }
        }
    }
}

fn show(layout: &RecordLayout, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let json = layout
                .to_json_pretty()
                .map_err(|err| CliError::new(INTERNAL, err.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "FIELD", "KIND", "DEFAULT"]);
            let mut offset = 0usize;
            for field in layout.fields() {
                table.add_row(vec![
                    offset.to_string(),
                    field.name.clone(),
                    field.kind.name().to_string(),
                    field.default_value().to_string(),
                ]);
                offset += field.kind.size();
            }
            println!("{table}");
        }
    }
    Ok(())
}
