use crate::value::{DataType, Record};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateDatabase(String),
    Use(String),
    Remove(String),
    Exit(String),
    ShowDatabases,
    ShowTables,
    CreateTable(CreateTableStatement),
    DropTable(String),
    Insert(InsertStatement),
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Count(String),
    Export(ExportStatement),
}

impl Command {
    /// Whether a successful run changes the open database's document.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::CreateTable(_)
                | Command::DropTable(_)
                | Command::Insert(_)
                | Command::Update(_)
                | Command::Delete(_)
        )
    }
}

/// `field = value` as written in a WHERE or SET clause; the value is the raw
/// literal with quotes stripped, coerced only at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table: String,
    /// `None` creates a schema-less table.
    pub columns: Option<Vec<ColumnDef>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertPayload {
    /// One or more object literals for a schema-less table.
    Records(Vec<Record>),
    /// One positional value list for a schema-bearing table.
    Row(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub payload: InsertPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub fields: Vec<String>,
    pub where_clause: Option<Condition>,
    pub order_by: Option<OrderByClause>,
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub assignment: Condition,
    pub where_clause: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    /// When set, matching entries keep their place and only this field is nulled.
    pub field: Option<String>,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportStatement {
    pub database: String,
    pub file: String,
    pub format: ExportFormat,
}
