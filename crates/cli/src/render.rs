//! Terminal rendering of tables and pages.

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table as TextTable};
use sheetmerge_core::{Page, Table};

/// Output format for previews.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output (default)
    #[default]
    Table,
    /// JSON array of row objects
    Json,
    /// CSV with a header row
    Csv,
}

/// Render a table in the given format.
pub fn render_table(table: &Table, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(pretty(table)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&table.to_json())?),
        OutputFormat::Csv => csv_text(table),
    }
}

/// Render one page plus a footer line in table mode.
pub fn render_page(page: Page, format: OutputFormat) -> Result<String> {
    let footer = format!(
        "Page {} of {} ({} rows)",
        page.number, page.total_pages, page.total_rows
    );
    let body = render_table(&page.into_table(), format)?;

    Ok(match format {
        OutputFormat::Table => format!("{body}\n{footer}"),
        OutputFormat::Json | OutputFormat::Csv => body,
    })
}

fn pretty(table: &Table) -> String {
    if table.columns().is_empty() {
        return "(no columns selected)".to_string();
    }

    let mut text = TextTable::new();
    text.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(table.columns().iter().map(String::as_str));

    for row in table.rows() {
        text.add_row(row.iter().map(ToString::to_string));
    }

    text.to_string()
}

fn csv_text(table: &Table) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(String::from_utf8(bytes)?)
}
