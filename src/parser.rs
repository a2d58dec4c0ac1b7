use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{
    ColumnDef, Command, CreateTableStatement, DeleteStatement, ExportFormat, ExportStatement,
    InsertPayload, InsertStatement, OrderByClause, SelectStatement, UpdateStatement,
};
use crate::clause::{join, split_condition, Anchor, Clauses};
use crate::error::{DbError, Result};
use crate::literal::parse_records;
use crate::tokenizer::{tokenize, Keyword, Token};
use crate::value::DataType;

lazy_static! {
    static ref MAKE_TABLE: Regex =
        Regex::new(r"^(?is)(?:make|create)\s+(\w+)\s*(?:\((.*)\))?\s*$").unwrap();
    static ref NAME: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must come from `tokenize(source)`.
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self { source, tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Command> {
        let verb = self.advance().ok_or(DbError::EmptyCommand)?;
        match verb.lowercase().as_str() {
            "create" if self.peek().is_some_and(|t| t.is(Keyword::Database)) => {
                self.advance();
                let name = self.expect_name("CREATE DATABASE name")?;
                self.expect_end("CREATE DATABASE name")?;
                Ok(Command::CreateDatabase(name))
            }
            "make" | "create" => self.parse_make(),
            "use" => self.parse_lifecycle("USE name").map(Command::Use),
            "remove" => self.parse_lifecycle("REMOVE name").map(Command::Remove),
            "exit" => self.parse_lifecycle("EXIT name").map(Command::Exit),
            "show" => self.parse_show(),
            "insert" | "include" => self.parse_insert(),
            "select" => self.parse_select(),
            "update" => self.parse_update(),
            "delete" | "exclude" => self.parse_delete(),
            "count" => {
                let table = self.expect_word("COUNT table")?;
                self.expect_end("COUNT table")?;
                Ok(Command::Count(table))
            }
            "export" => self.parse_export(),
            _ => Err(DbError::UnknownCommand(verb.value)),
        }
    }

    fn parse_lifecycle(&mut self, usage: &str) -> Result<String> {
        let name = self.expect_name(usage)?;
        self.expect_end(usage)?;
        Ok(name)
    }

    fn parse_show(&mut self) -> Result<Command> {
        let command = match self.advance() {
            Some(t) if t.is(Keyword::Databases) => Command::ShowDatabases,
            Some(t) if t.is(Keyword::Tables) => Command::ShowTables,
            _ => return Err(usage("SHOW DATABASES | SHOW TABLES")),
        };
        self.expect_end("SHOW DATABASES | SHOW TABLES")?;
        Ok(command)
    }

    fn parse_make(&mut self) -> Result<Command> {
        let line = self.line();
        let caps = MAKE_TABLE
            .captures(line)
            .ok_or_else(|| usage("MAKE table [(column TYPE, ...)]"))?;
        let table = caps[1].to_string();
        let columns = caps.get(2).map(|m| parse_columns(m.as_str())).transpose()?;
        self.current = self.tokens.len();
        Ok(Command::CreateTable(CreateTableStatement { table, columns }))
    }

    fn parse_insert(&mut self) -> Result<Command> {
        let token = self
            .advance()
            .ok_or_else(|| usage("INCLUDE table {field: value} | [{...}] | (value, ...)"))?;

        // The payload may be glued to the table name: `users(Alice, 30)`.
        let split = token
            .value
            .find(|c: char| matches!(c, '(' | '{' | '['))
            .unwrap_or(token.value.len());
        let table = token.value[..split].to_string();
        if table.is_empty() {
            return Err(usage("INCLUDE table {field: value} | [{...}] | (value, ...)"));
        }
        let source = self.source;
        let payload = source[token.offset + split..].trim();
        let payload = payload.strip_suffix(';').unwrap_or(payload).trim();
        self.current = self.tokens.len();

        let payload = match payload.chars().next() {
            Some('(') => InsertPayload::Row(parse_row(payload)?),
            Some('{') | Some('[') => InsertPayload::Records(parse_records(payload)?),
            _ => {
                return Err(DbError::Syntax(
                    "Expected {field: value, ...}, [{...}, {...}] or (value1, value2, ...).".to_string(),
                ))
            }
        };
        Ok(Command::Insert(InsertStatement { table, payload }))
    }

    fn parse_select(&mut self) -> Result<Command> {
        let table = self.expect_word("SELECT table [fields] [WHERE ...] [ORDER BY ...] [GROUP BY ...]")?;
        let source = self.source;
        let rest = self.remaining();
        let clauses = Clauses::resolve(rest, &[Anchor::Where, Anchor::OrderBy, Anchor::GroupBy]);

        let fields = join(clauses.head())
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();

        let where_clause = clauses
            .body(Anchor::Where)
            .map(|body| split_condition(source, body, Anchor::Where))
            .transpose()?;

        let order_by = clauses.body(Anchor::OrderBy).map(parse_order_by).transpose()?;

        let group_by = match clauses.body(Anchor::GroupBy) {
            None => None,
            Some([field]) => Some(field.value.clone()),
            Some(_) => {
                return Err(DbError::ClauseSyntax {
                    clause: Anchor::GroupBy.name(),
                    reason: "expected a single field".to_string(),
                })
            }
        };

        Ok(Command::Select(SelectStatement { table, fields, where_clause, order_by, group_by }))
    }

    fn parse_update(&mut self) -> Result<Command> {
        let table = self.expect_word("UPDATE table SET field = value WHERE field = value")?;
        let source = self.source;
        let rest = self.remaining();
        let clauses = Clauses::resolve(rest, &[Anchor::Set, Anchor::Where]);
        if !clauses.head().is_empty() {
            return Err(usage("UPDATE table SET field = value WHERE field = value"));
        }
        let assignment = split_condition(source, clauses.require(Anchor::Set)?, Anchor::Set)?;
        let where_clause = split_condition(source, clauses.require(Anchor::Where)?, Anchor::Where)?;
        Ok(Command::Update(UpdateStatement { table, assignment, where_clause }))
    }

    fn parse_delete(&mut self) -> Result<Command> {
        const USAGE: &str = "EXCLUDE table | EXCLUDE [field] FROM table [WHERE field = value]";
        let source = self.source;
        let rest = self.remaining();
        let clauses = Clauses::resolve(rest, &[Anchor::From, Anchor::Where]);

        let from = match clauses.body(Anchor::From) {
            Some(from) => from,
            None => {
                return match (clauses.head(), clauses.body(Anchor::Where)) {
                    ([table], None) => Ok(Command::DropTable(table.value.clone())),
                    _ => Err(usage(USAGE)),
                }
            }
        };

        let field = match clauses.head() {
            [] => None,
            [field] => Some(field.value.clone()),
            _ => return Err(usage(USAGE)),
        };
        let table = match from {
            [table] => table.value.clone(),
            _ => return Err(usage(USAGE)),
        };
        let where_clause = clauses
            .body(Anchor::Where)
            .map(|body| split_condition(source, body, Anchor::Where))
            .transpose()?;

        if field.is_some() && where_clause.is_none() {
            return Err(DbError::Syntax("Clearing a field requires a WHERE clause.".to_string()));
        }
        Ok(Command::Delete(DeleteStatement { table, field, where_clause }))
    }

    fn parse_export(&mut self) -> Result<Command> {
        const USAGE: &str = "EXPORT database AS file IN CSV|JSON";
        let database = self.expect_name(USAGE)?;
        self.expect_keyword(Keyword::As, USAGE)?;
        let file = self.expect_name(USAGE)?;
        self.expect_keyword(Keyword::In, USAGE)?;
        let format = self.expect_word(USAGE)?;
        self.expect_end(USAGE)?;

        let format = match format.to_ascii_lowercase().as_str() {
            "csv" => ExportFormat::Csv,
            "json" => ExportFormat::Json,
            _ => return Err(DbError::UnsupportedFormat(format)),
        };
        Ok(Command::Export(ExportStatement { database, file, format }))
    }

    /// The whole command line without its terminator.
    fn line(&self) -> &'a str {
        let line = self.source.trim();
        line.strip_suffix(';').unwrap_or(line)
    }

    fn remaining(&mut self) -> &[Token] {
        let start = self.current;
        self.current = self.tokens.len();
        &self.tokens[start..]
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn expect_keyword(&mut self, keyword: Keyword, form: &str) -> Result<()> {
        match self.advance() {
            Some(t) if t.is(keyword) => Ok(()),
            _ => Err(usage(form)),
        }
    }

    fn expect_word(&mut self, form: &str) -> Result<String> {
        self.advance().map(|t| t.value).ok_or_else(|| usage(form))
    }

    /// A database or file name: letters, digits, `_` and `-` only.
    fn expect_name(&mut self, form: &str) -> Result<String> {
        let name = self.expect_word(form)?;
        if !NAME.is_match(&name) {
            return Err(DbError::Syntax(format!(
                "Invalid name '{}'. Use letters, digits, '_' or '-'.",
                name
            )));
        }
        Ok(name)
    }

    fn expect_end(&self, form: &str) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(usage(form)),
        }
    }
}

fn usage(form: &str) -> DbError {
    DbError::Syntax(format!("Use '{}'.", form))
}

fn parse_columns(list: &str) -> Result<Vec<ColumnDef>> {
    if list.trim().is_empty() {
        return Err(DbError::ColumnSyntax(list.to_string()));
    }
    let mut columns: Vec<ColumnDef> = Vec::new();
    for entry in list.split(',') {
        let parts: Vec<&str> = entry.split_whitespace().collect();
        let column = match parts.as_slice() {
            [name, ty] => DataType::parse(ty).map(|data_type| ColumnDef { name: name.to_string(), data_type }),
            _ => None,
        };
        match column {
            Some(column) if !columns.iter().any(|c| c.name == column.name) => columns.push(column),
            _ => return Err(DbError::ColumnSyntax(entry.trim().to_string())),
        }
    }
    Ok(columns)
}

/// Splits `(a, 'b, c', d)` on commas that are not inside quotes.
fn parse_row(payload: &str) -> Result<Vec<String>> {
    let inner = payload
        .strip_prefix('(')
        .and_then(|p| p.strip_suffix(')'))
        .ok_or_else(|| DbError::Syntax("Expected (value1, value2, ...).".to_string()))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match (c, quote) {
            ('\'' | '"', None) => {
                quote = Some(c);
                current.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(c);
            }
            (',', None) => values.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(DbError::Syntax("Unterminated quoted value.".to_string()));
    }
    values.push(current.trim().to_string());
    Ok(values)
}

fn parse_order_by(body: &[Token]) -> Result<OrderByClause> {
    let (field, descending) = match body {
        [field] => (field, false),
        [field, dir] if dir.is(Keyword::Asc) => (field, false),
        [field, dir] if dir.is(Keyword::Desc) => (field, true),
        _ => {
            return Err(DbError::ClauseSyntax {
                clause: Anchor::OrderBy.name(),
                reason: "expected 'field [ASC|DESC]'".to_string(),
            })
        }
    };
    Ok(OrderByClause { field: field.value.clone(), descending })
}

/// Tokenizes and parses one command line.
pub fn parse_command(input: &str) -> Result<Command> {
    let tokens = tokenize(input)?;
    Parser::new(input, tokens).parse()
}
