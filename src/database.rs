use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::ColumnDef;
use crate::error::{DbError, ObjectKind, Result};
use crate::value::{DataType, Record, Value};

/// Free-form records with an auto-assigned `id`.
///
/// Serialized as a plain array of records. The identity counter and the field
/// type registry are derived state, rebuilt when the table is loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<Record>")]
pub struct RecordTable {
    records: Vec<Record>,
    last_id: i64,
    types: HashMap<String, DataType>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest id ever assigned in this table.
    pub fn last_id(&self) -> i64 {
        self.last_id
    }

    /// Type of the first non-null value ever written to `field`.
    pub fn field_type(&self, field: &str) -> Option<DataType> {
        self.types.get(field).copied()
    }

    /// Stores the record under the next id and returns that id.
    pub fn insert(&mut self, mut record: Record) -> i64 {
        self.last_id += 1;
        record.set("id", Value::Int(self.last_id));
        self.register(&record);
        self.records.push(record);
        self.last_id
    }

    pub(crate) fn note_type(&mut self, field: &str, value: &Value) {
        if let Some(data_type) = value.data_type() {
            self.types.entry(field.to_string()).or_insert(data_type);
        }
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    fn register(&mut self, record: &Record) {
        for (field, value) in record.fields() {
            self.note_type(field, value);
        }
    }
}

impl From<Vec<Record>> for RecordTable {
    fn from(records: Vec<Record>) -> Self {
        let mut table = RecordTable::new();
        for record in &records {
            table.register(record);
            if let Some(id) = record.id() {
                table.last_id = table.last_id.max(id);
            }
        }
        table.records = records;
        table
    }
}

impl Serialize for RecordTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

/// Document shape of a schema-bearing table.
#[derive(Deserialize)]
struct SchemaDocument {
    columns: Vec<String>,
    types: HashMap<String, DataType>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

/// Typed columns and positional rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SchemaDocument")]
pub struct SchemaTable {
    columns: Vec<ColumnDef>,
    data: Vec<Vec<Value>>,
}

impl TryFrom<SchemaDocument> for SchemaTable {
    type Error = String;

    fn try_from(doc: SchemaDocument) -> std::result::Result<Self, String> {
        let columns = doc
            .columns
            .into_iter()
            .map(|name| match doc.types.get(&name) {
                Some(&data_type) => Ok(ColumnDef { name, data_type }),
                None => Err(format!("column '{}' has no declared type", name)),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut data = doc.data;
        for row in &mut data {
            if row.len() != columns.len() {
                return Err(format!("row of {} values in a table of {} columns", row.len(), columns.len()));
            }
            for (column, value) in columns.iter().zip(row.iter_mut()) {
                if let Some(checked) = check_cell(column, value)? {
                    *value = checked;
                }
            }
        }
        Ok(SchemaTable { columns, data })
    }
}

/// Checks a loaded cell against its column type. Integers stored in a FLOAT
/// column come back widened.
fn check_cell(column: &ColumnDef, value: &Value) -> std::result::Result<Option<Value>, String> {
    match (column.data_type, value) {
        (_, Value::Null) => Ok(None),
        (DataType::Float, Value::Int(i)) => Ok(Some(Value::Float(*i as f64))),
        (expected, v) if v.data_type() == Some(expected) => Ok(None),
        (expected, v) => Err(format!("value {} in column '{}' is not {}", v, column.name, expected)),
    }
}

struct TypesInColumnOrder<'a>(&'a [ColumnDef]);

impl Serialize for TypesInColumnOrder<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for column in self.0 {
            map.serialize_entry(&column.name, &column.data_type)?;
        }
        map.end()
    }
}

impl Serialize for SchemaTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SchemaTable", 3)?;
        state.serialize_field("columns", &self.column_names())?;
        state.serialize_field("types", &TypesInColumnOrder(&self.columns))?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

impl SchemaTable {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        SchemaTable { columns, data: Vec::new() }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<(usize, DataType)> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| (i, self.columns[i].data_type))
            .ok_or_else(|| DbError::column_not_found(name))
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rows viewed as records keyed by column name, in column order.
    pub fn as_records(&self) -> Vec<Record> {
        self.data
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.name.as_str(), value.clone()))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DbError::ColumnCountMismatch { expected: self.columns.len(), actual: row.len() });
        }
        self.data.push(row);
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.data
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Table {
    Schema(SchemaTable),
    Records(RecordTable),
}

impl Table {
    pub fn len(&self) -> usize {
        match self {
            Table::Schema(t) => t.len(),
            Table::Records(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How the tables of a document are stored, as reported by SHOW DATABASES.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Empty,
    Schema,
    SchemaLess,
    Mixed,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DatabaseKind::Empty => "empty",
            DatabaseKind::Schema => "schema",
            DatabaseKind::SchemaLess => "schema-less",
            DatabaseKind::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

/// A named document: tables in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    tables: Vec<(String, Table)>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| DbError::table_not_found(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| DbError::table_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|(n, _)| n == name)
    }

    pub fn create_table(&mut self, name: &str, table: Table) -> Result<()> {
        if self.contains(name) {
            return Err(DbError::AlreadyExists { kind: ObjectKind::Table, name: name.to_string() });
        }
        self.tables.push((name.to_string(), table));
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let pos = self
            .tables
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| DbError::table_not_found(name))?;
        Ok(self.tables.remove(pos).1)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn kind(&self) -> DatabaseKind {
        let schema = self.tables.iter().filter(|(_, t)| matches!(t, Table::Schema(_))).count();
        match (schema, self.tables.len()) {
            (_, 0) => DatabaseKind::Empty,
            (s, n) if s == n => DatabaseKind::Schema,
            (0, _) => DatabaseKind::SchemaLess,
            _ => DatabaseKind::Mixed,
        }
    }
}

impl Serialize for Database {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (name, table) in &self.tables {
            map.serialize_entry(name, table)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Database {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DatabaseVisitor;

        impl<'de> Visitor<'de> for DatabaseVisitor {
            type Value = Database;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of table names to tables")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Database, A::Error> {
                let mut db = Database::new();
                while let Some((name, table)) = access.next_entry::<String, Table>()? {
                    if db.contains(&name) {
                        return Err(serde::de::Error::custom(format!("duplicate table '{}'", name)));
                    }
                    db.tables.push((name, table));
                }
                Ok(db)
            }
        }

        deserializer.deserialize_map(DatabaseVisitor)
    }
}
