use tracing::debug;

use crate::ast::{
    Command, Condition, CreateTableStatement, DeleteStatement, InsertPayload, InsertStatement,
    UpdateStatement,
};
use crate::coerce::coerce;
use crate::database::{Database, RecordTable, SchemaTable, Table};
use crate::error::{DbError, Result};
use crate::outcome::Outcome;
use crate::query;
use crate::value::{Record, Value};

const ID_FIELD: &str = "id";

impl Database {
    /// Runs a table-level command against this database.
    ///
    /// Every command validates and coerces its input before touching a table,
    /// so an error leaves the database exactly as it was.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::CreateTable(stmt) => self.execute_create(stmt),
            Command::DropTable(name) => {
                self.drop_table(&name)?;
                Ok(Outcome::TableDropped(name))
            }
            Command::Insert(stmt) => self.execute_insert(stmt),
            Command::Select(stmt) => query::select(self.table(&stmt.table)?, &stmt),
            Command::Update(stmt) => self.execute_update(stmt),
            Command::Delete(stmt) => self.execute_delete(stmt),
            Command::Count(name) => Ok(Outcome::Count { count: self.table(&name)?.len(), table: name }),
            other => Err(DbError::Syntax(format!("{:?} is not a table command.", other))),
        }
    }

    fn execute_create(&mut self, stmt: CreateTableStatement) -> Result<Outcome> {
        let (table, columns) = match stmt.columns {
            None => (Table::Records(RecordTable::new()), None),
            Some(columns) => {
                let names = columns.iter().map(|c| c.name.clone()).collect();
                (Table::Schema(SchemaTable::new(columns)), Some(names))
            }
        };
        self.create_table(&stmt.table, table)?;
        debug!(table = %stmt.table, "table created");
        Ok(Outcome::TableCreated { table: stmt.table, columns })
    }

    fn execute_insert(&mut self, stmt: InsertStatement) -> Result<Outcome> {
        let table = self.table_mut(&stmt.table)?;
        match (table, stmt.payload) {
            (Table::Records(t), InsertPayload::Records(records)) => {
                let ids = records.into_iter().map(|record| t.insert(record)).collect();
                Ok(Outcome::RecordsInserted { table: stmt.table, ids })
            }
            (Table::Schema(t), InsertPayload::Row(literals)) => {
                if literals.len() != t.columns().len() {
                    return Err(DbError::ColumnCountMismatch {
                        expected: t.columns().len(),
                        actual: literals.len(),
                    });
                }
                let row = t
                    .columns()
                    .iter()
                    .zip(&literals)
                    .map(|(column, literal)| coerce(&column.name, literal, Some(column.data_type)))
                    .collect::<Result<Vec<Value>>>()?;
                t.push_row(row)?;
                Ok(Outcome::RowInserted { table: stmt.table })
            }
            (Table::Records(_), InsertPayload::Row(_)) => Err(DbError::Syntax(format!(
                "Table '{}' is schema-less. Use {{field: value, ...}} or [{{...}}, {{...}}].",
                stmt.table
            ))),
            (Table::Schema(_), InsertPayload::Records(_)) => Err(DbError::Syntax(format!(
                "Table '{}' has declared columns. Use (value1, value2, ...).",
                stmt.table
            ))),
        }
    }

    fn execute_update(&mut self, stmt: UpdateStatement) -> Result<Outcome> {
        let UpdateStatement { table: name, assignment, where_clause } = stmt;
        let count = match self.table_mut(&name)? {
            Table::Schema(t) => {
                let (wi, expected) = schema_condition(t, &where_clause)?;
                let (si, set_type) = t.column(&assignment.field)?;
                let value = coerce(&assignment.field, &assignment.value, Some(set_type))?;

                let mut count = 0;
                for row in t.rows_mut().iter_mut().filter(|row| row[wi].matches(&expected)) {
                    row[si] = value.clone();
                    count += 1;
                }
                count
            }
            Table::Records(t) => {
                if assignment.field == ID_FIELD {
                    return Err(DbError::Syntax("The 'id' field cannot be updated.".to_string()));
                }
                let expected = record_condition(t, &where_clause)?;
                let value = coerce(&assignment.field, &assignment.value, t.field_type(&assignment.field))?;

                let mut count = 0;
                for record in t.records_mut().iter_mut().filter(|r| matches_field(r, &where_clause.field, &expected)) {
                    record.set(&assignment.field, value.clone());
                    count += 1;
                }
                if count > 0 {
                    t.note_type(&assignment.field, &value);
                }
                count
            }
        };

        if count == 0 {
            return Ok(Outcome::NoMatch);
        }
        Ok(Outcome::Updated { table: name, count })
    }

    fn execute_delete(&mut self, stmt: DeleteStatement) -> Result<Outcome> {
        let DeleteStatement { table: name, field, where_clause } = stmt;
        let table = self.table_mut(&name)?;

        let cond = match (field, where_clause) {
            (None, None) => {
                let count = table.len();
                match table {
                    Table::Schema(t) => t.rows_mut().clear(),
                    Table::Records(t) => t.records_mut().clear(),
                }
                return Ok(Outcome::TableCleared { table: name, count });
            }
            (Some(_), None) => {
                return Err(DbError::Syntax(
                    "Clearing a field requires a WHERE clause.".to_string(),
                ))
            }
            (Some(field), Some(cond)) => {
                let count = clear_field(table, &field, &cond)?;
                if count == 0 {
                    return Ok(Outcome::NoMatch);
                }
                return Ok(Outcome::FieldCleared { table: name, field, count });
            }
            (None, Some(cond)) => cond,
        };

        let count = match table {
            Table::Schema(t) => {
                let (wi, expected) = schema_condition(t, &cond)?;
                let before = t.len();
                t.rows_mut().retain(|row| !row[wi].matches(&expected));
                before - t.len()
            }
            Table::Records(t) => {
                let expected = record_condition(t, &cond)?;
                let before = t.len();
                t.records_mut().retain(|r| !matches_field(r, &cond.field, &expected));
                before - t.len()
            }
        };

        if count == 0 {
            return Ok(Outcome::NoMatch);
        }
        Ok(Outcome::Deleted { table: name, count })
    }
}

fn schema_condition(table: &SchemaTable, cond: &Condition) -> Result<(usize, Value)> {
    let (index, data_type) = table.column(&cond.field)?;
    Ok((index, coerce(&cond.field, &cond.value, Some(data_type))?))
}

fn record_condition(table: &RecordTable, cond: &Condition) -> Result<Value> {
    coerce(&cond.field, &cond.value, table.field_type(&cond.field))
}

fn matches_field(record: &Record, field: &str, expected: &Value) -> bool {
    record.get(field).is_some_and(|value| value.matches(expected))
}

fn clear_field(table: &mut Table, field: &str, cond: &Condition) -> Result<usize> {
    match table {
        Table::Schema(t) => {
            let (wi, expected) = schema_condition(t, cond)?;
            let (fi, _) = t.column(field)?;
            let mut count = 0;
            for row in t.rows_mut().iter_mut().filter(|row| row[wi].matches(&expected)) {
                row[fi] = Value::Null;
                count += 1;
            }
            Ok(count)
        }
        Table::Records(t) => {
            if field == ID_FIELD {
                return Err(DbError::Syntax("The 'id' field cannot be cleared.".to_string()));
            }
            let expected = record_condition(t, cond)?;
            let matching = |r: &&mut Record| matches_field(r, &cond.field, &expected);
            let mut count = 0;
            for record in t.records_mut().iter_mut().filter(matching) {
                record.set(field, Value::Null);
                count += 1;
            }
            Ok(count)
        }
    }
}
