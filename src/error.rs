use std::fmt;

use thiserror::Error;

use crate::value::DataType;

/// What kind of object a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Table,
    Column,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Database => write!(f, "Database"),
            ObjectKind::Table => write!(f, "Table"),
            ObjectKind::Column => write!(f, "Column"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid command.")]
    EmptyCommand,
    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),
    #[error("Syntax error. {0}")]
    Syntax(String),
    #[error("Syntax error in {clause} clause: {reason}")]
    ClauseSyntax { clause: &'static str, reason: String },
    #[error("Invalid column definition: '{0}'. Use 'column_name TYPE'.")]
    ColumnSyntax(String),
    #[error("{kind} '{name}' does not exist.")]
    NotFound { kind: ObjectKind, name: String },
    #[error("{kind} '{name}' already exists.")]
    AlreadyExists { kind: ObjectKind, name: String },
    #[error("Type mismatch for '{field}'. Expected {expected}, got '{literal}'.")]
    TypeMismatch {
        field: String,
        expected: DataType,
        literal: String,
    },
    #[error("Duplicate key '{0}' found within an object.")]
    DuplicateKey(String),
    #[error("Column mismatch. Expected {expected} values but got {actual}.")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("No database selected. Use 'USE database_name' first.")]
    NoDatabaseSelected,
    #[error("No database is currently in use.")]
    NoDatabaseOpen,
    #[error("Database '{0}' is not currently in use.")]
    WrongDatabase(String),
    #[error("Unsupported file format '{0}'. Use CSV or JSON.")]
    UnsupportedFormat(String),
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    pub fn table_not_found(name: &str) -> Self {
        DbError::NotFound { kind: ObjectKind::Table, name: name.to_string() }
    }

    pub fn column_not_found(name: &str) -> Self {
        DbError::NotFound { kind: ObjectKind::Column, name: name.to_string() }
    }

    pub fn database_not_found(name: &str) -> Self {
        DbError::NotFound { kind: ObjectKind::Database, name: name.to_string() }
    }
}
