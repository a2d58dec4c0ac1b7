//! SELECT: filter, group, order, project.
//!
//! The steps always run in that order, whichever clauses are present. Both
//! storage variants go through the same pipeline; schema-bearing rows are
//! viewed as records keyed by column name.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::ast::{OrderByClause, SelectStatement};
use crate::coerce::coerce;
use crate::database::Table;
use crate::error::Result;
use crate::outcome::Outcome;
use crate::value::{DataType, Record, Value};

/// One element of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Record(Record),
    /// Synthetic entry produced by GROUP BY.
    Group { key: Value, records: Vec<Record> },
}

impl Entry {
    /// Field lookup. A group only exposes its `group` key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Entry::Record(record) => record.get(field),
            Entry::Group { key, .. } if field == "group" => Some(key),
            Entry::Group { .. } => None,
        }
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Entry::Record(record) => record.serialize(serializer),
            Entry::Group { key, records } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("group", key)?;
                map.serialize_entry("records", records)?;
                map.end()
            }
        }
    }
}

/// Resolves the type used to coerce a literal compared against `field`.
/// Schema-bearing tables reject unknown columns.
fn field_type(table: &Table, field: &str) -> Result<Option<DataType>> {
    match table {
        Table::Schema(t) => t.column(field).map(|(_, ty)| Some(ty)),
        Table::Records(t) => Ok(t.field_type(field)),
    }
}

fn group_by(records: Vec<Record>, field: &str) -> Vec<Entry> {
    let mut groups: Vec<(Value, Vec<Record>)> = Vec::new();
    for record in records {
        let key = match record.get(field) {
            Some(key) if !key.is_null() => key.clone(),
            _ => continue,
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }
    groups
        .into_iter()
        .map(|(key, records)| Entry::Group { key, records })
        .collect()
}

fn order_by(entries: &mut [Entry], order: &OrderByClause) {
    let null = Value::Null;
    entries.sort_by(|a, b| {
        let a = a.get(&order.field).unwrap_or(&null);
        let b = b.get(&order.field).unwrap_or(&null);
        if order.descending {
            b.sort_cmp(a)
        } else {
            a.sort_cmp(b)
        }
    });
}

fn project(entry: &Entry, fields: &[String]) -> Entry {
    Entry::Record(
        fields
            .iter()
            .map(|field| (field.as_str(), entry.get(field).cloned().unwrap_or(Value::Null)))
            .collect(),
    )
}

/// Runs a SELECT against one table.
pub fn select(table: &Table, stmt: &SelectStatement) -> Result<Outcome> {
    let mut records = match table {
        Table::Schema(t) => t.as_records(),
        Table::Records(t) => t.records().to_vec(),
    };

    if let Some(cond) = &stmt.where_clause {
        let expected = coerce(&cond.field, &cond.value, field_type(table, &cond.field)?)?;
        records.retain(|record| record.get(&cond.field).is_some_and(|value| value.matches(&expected)));
    }

    let mut entries = match &stmt.group_by {
        Some(field) => {
            field_type(table, field)?;
            group_by(records, field)
        }
        None => records.into_iter().map(Entry::Record).collect(),
    };

    if let Some(order) = &stmt.order_by {
        field_type(table, &order.field)?;
        order_by(&mut entries, order);
    }

    if !stmt.fields.is_empty() {
        entries = entries.iter().map(|entry| project(entry, &stmt.fields)).collect();
    }

    if entries.is_empty() {
        return Ok(match (&stmt.where_clause, table.is_empty()) {
            (None, true) => Outcome::EmptyTable(stmt.table.clone()),
            _ => Outcome::NoMatch,
        });
    }

    match table {
        Table::Schema(t) if stmt.group_by.is_none() => {
            let columns = if stmt.fields.is_empty() {
                t.column_names().into_iter().map(String::from).collect()
            } else {
                stmt.fields.clone()
            };
            let rows = entries
                .iter()
                .map(|entry| {
                    columns
                        .iter()
                        .map(|c| entry.get(c).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect();
            Ok(Outcome::Rows { columns, rows })
        }
        _ => Ok(Outcome::Documents(entries)),
    }
}
