//! Rendering of grids and listings for the terminal

use anyhow::Result;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use insight_core::{ColumnInfo, OutputFormat, Row};
use insight_sqlite::{DatabaseFileInfo, GridColumns, project};

#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render rows through the visible grid columns
    pub fn rows(&self, rows: &[Row], columns: &GridColumns) -> Result<String> {
        let headers = columns.visible_headers();

        match self.format {
            OutputFormat::Json => {
                let visible: Vec<Row> = rows
                    .iter()
                    .map(|row| {
                        headers
                            .iter()
                            .map(|h| (*h, row.get(h).unwrap_or("")))
                            .collect()
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&visible)?)
            }
            OutputFormat::Table => {
                let mut table = new_table();
                table.set_header(headers.iter().copied());
                for row in rows {
                    table.add_row(project(row, columns));
                }
                Ok(format!("{}\n({} {})", table, rows.len(), plural(rows.len(), "row")))
            }
        }
    }

    /// Render a plain list of names under a single header
    pub fn names(&self, header: &str, names: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(names)?),
            OutputFormat::Table => {
                let mut table = new_table();
                table.set_header([header]);
                for name in names {
                    table.add_row([name.as_str()]);
                }
                Ok(table.to_string())
            }
        }
    }

    pub fn columns(&self, columns: &[ColumnInfo]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(columns)?),
            OutputFormat::Table => {
                let mut table = new_table();
                table.set_header(["#", "Name", "Type", "Nullable", "Default", "PK"]);
                for c in columns {
                    table.add_row([
                        c.ordinal.to_string(),
                        c.name.clone(),
                        c.data_type.clone(),
                        yes_no(c.nullable).to_string(),
                        c.default_value.clone().unwrap_or_default(),
                        yes_no(c.is_primary_key).to_string(),
                    ]);
                }
                Ok(table.to_string())
            }
        }
    }

    pub fn info(&self, info: &DatabaseFileInfo) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(info)?),
            OutputFormat::Table => {
                let mut table = new_table();
                table.set_header(["Property", "Value"]);
                table.add_row(["File size", &format!("{} bytes", info.file_size_bytes)]);
                table.add_row(["Pages", &info.page_count.to_string()]);
                table.add_row(["Page size", &info.page_size.to_string()]);
                table.add_row(["Encoding", &info.encoding]);
                table.add_row(["Journal mode", &info.journal_mode]);
                table.add_row(["Foreign keys", yes_no(info.foreign_keys_enabled)]);
                Ok(table.to_string())
            }
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
