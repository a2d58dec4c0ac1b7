use std::fmt;
use std::path::PathBuf;

use crate::ast::ExportFormat;
use crate::database::DatabaseKind;
use crate::query::Entry;
use crate::value::Value;

/// Successful result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Message(String),
    TableCreated { table: String, columns: Option<Vec<String>> },
    TableDropped(String),
    RecordsInserted { table: String, ids: Vec<i64> },
    RowInserted { table: String },
    Updated { table: String, count: usize },
    Deleted { table: String, count: usize },
    FieldCleared { table: String, field: String, count: usize },
    TableCleared { table: String, count: usize },
    /// A filter, update or delete that touched nothing. Not an error.
    NoMatch,
    EmptyTable(String),
    Rows { columns: Vec<String>, rows: Vec<Vec<Value>> },
    Documents(Vec<Entry>),
    Count { table: String, count: usize },
    /// `None` marks a document that could not be read.
    Databases(Vec<(String, Option<DatabaseKind>)>),
    Tables(Vec<String>),
    Exported { database: String, format: ExportFormat, path: PathBuf },
}

const RULE_WIDTH: usize = 50;

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Message(message) => f.write_str(message),
            Outcome::TableCreated { table, columns: None } => {
                write!(f, "Table '{}' created successfully.", table)
            }
            Outcome::TableCreated { table, columns: Some(columns) } => {
                write!(f, "Table '{}' created with columns [{}].", table, columns.join(", "))
            }
            Outcome::TableDropped(table) => write!(f, "Table '{}' has been excluded.", table),
            Outcome::RecordsInserted { table, ids } => {
                let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
                write!(f, "{} record(s) included into '{}' with IDs [{}].", ids.len(), table, ids.join(", "))
            }
            Outcome::RowInserted { table } => write!(f, "1 record inserted into '{}'.", table),
            Outcome::Updated { table, count } => write!(f, "{} record(s) updated in '{}'.", count, table),
            Outcome::Deleted { table, count } => write!(f, "Deleted {} record(s) from '{}'.", count, table),
            Outcome::FieldCleared { table, field, count } => {
                write!(f, "Cleared '{}' in {} record(s) of '{}'.", field, count, table)
            }
            Outcome::TableCleared { table, count } => {
                write!(f, "All records excluded from '{}' ({} removed).", table, count)
            }
            Outcome::NoMatch => f.write_str("No records matched the condition."),
            Outcome::EmptyTable(table) => write!(f, "Table '{}' is empty.", table),
            Outcome::Rows { columns, rows } => {
                writeln!(f, "{}", columns.join(" | "))?;
                write!(f, "{}", "-".repeat(RULE_WIDTH))?;
                for row in rows {
                    let cells: Vec<String> = row.iter().map(Value::to_string).collect();
                    write!(f, "\n{}", cells.join(" | "))?;
                }
                Ok(())
            }
            Outcome::Documents(entries) => {
                let json = serde_json::to_string_pretty(entries).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            Outcome::Count { table, count } => write!(f, "Table '{}' contains {} record(s).", table, count),
            Outcome::Databases(list) if list.is_empty() => f.write_str("No databases found."),
            Outcome::Databases(list) => {
                let names: Vec<String> = list
                    .iter()
                    .map(|(name, kind)| match kind {
                        Some(kind) => format!("{} ({})", name, kind),
                        None => format!("{} (corrupted)", name),
                    })
                    .collect();
                write!(f, "Databases: {}", names.join(", "))
            }
            Outcome::Tables(names) if names.is_empty() => f.write_str("No tables found."),
            Outcome::Tables(names) => write!(f, "Tables: {}", names.join(", ")),
            Outcome::Exported { database, format, path } => write!(
                f,
                "Database '{}' exported as {}. File saved at: {}",
                database,
                format.extension().to_uppercase(),
                path.display()
            ),
        }
    }
}
