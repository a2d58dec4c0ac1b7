pub mod ast;
pub mod auth;
pub mod clause;
pub mod coerce;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod export;
pub mod integration;
pub mod literal;
pub mod outcome;
pub mod parser;
pub mod query;
pub mod session;
pub mod storage;
pub mod tokenizer;
pub mod value;

pub use ast::*;
pub use config::Config;
pub use database::{Database, DatabaseKind, RecordTable, SchemaTable, Table};
pub use error::{DbError, ObjectKind, Result};
pub use integration::process_query;
pub use outcome::Outcome;
pub use parser::{parse_command, Parser};
pub use session::Session;
pub use storage::{DocumentStore, JsonFileStore};
pub use value::{DataType, Record, Value};
