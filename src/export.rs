use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::ast::ExportFormat;
use crate::database::{Database, Table};
use crate::error::Result;
use crate::storage::write_pretty;
use crate::value::Value;

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value) => escape_csv(&value.to_string()),
    }
}

fn push_line(out: &mut String, cells: impl IntoIterator<Item = String>) {
    out.push_str(&cells.into_iter().collect::<Vec<_>>().join(","));
    out.push('\n');
}

/// Renders every table as a `Table: <name>` section followed by a header,
/// the rows and a blank line. An empty database renders as an empty string.
pub fn to_csv(db: &Database) -> String {
    let mut out = String::new();
    for (name, table) in db.tables() {
        push_line(&mut out, [escape_csv(&format!("Table: {}", name))]);
        match table {
            Table::Schema(t) => {
                push_line(&mut out, t.column_names().into_iter().map(escape_csv));
                for row in t.rows() {
                    push_line(&mut out, row.iter().map(Some).map(cell));
                }
            }
            Table::Records(t) => {
                let mut header: Vec<&str> = Vec::new();
                for record in t.records() {
                    for (field, _) in record.fields() {
                        if !header.contains(&field) {
                            header.push(field);
                        }
                    }
                }
                push_line(&mut out, header.iter().map(|f| escape_csv(f)));
                for record in t.records() {
                    push_line(&mut out, header.iter().map(|f| cell(record.get(f))));
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Writes `db` to `<dir>/<file>.<ext>` and returns the path written.
pub fn export(db: &Database, dir: &Path, file: &str, format: ExportFormat) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", file, format.extension()));
    match format {
        ExportFormat::Csv => fs::write(&path, to_csv(db))?,
        ExportFormat::Json => write_pretty(File::create(&path)?, db)?,
    }
    Ok(path)
}
