//! Database lifecycle and command dispatch.

use tracing::{debug, info, warn};

use crate::ast::{Command, ExportStatement};
use crate::config::{Config, LEGACY_DATABASE};
use crate::database::Database;
use crate::error::{DbError, ObjectKind, Result};
use crate::export;
use crate::outcome::Outcome;
use crate::storage::{DocumentStore, JsonFileStore};

/// One console session: at most one open database, persisted through `S`.
pub struct Session<S: DocumentStore = JsonFileStore> {
    config: Config,
    store: S,
    open: Option<(String, Database)>,
}

impl Session<JsonFileStore> {
    /// Session over `<data_dir>/<name>.json` documents.
    pub fn open(config: Config) -> Result<Self> {
        let store = JsonFileStore::new(&config.data_dir)?;
        Self::with_store(config, store)
    }
}

impl<S: DocumentStore> Session<S> {
    pub fn with_store(config: Config, store: S) -> Result<Self> {
        let mut session = Session { config, store, open: None };
        if session.config.legacy {
            if !session.store.exists(LEGACY_DATABASE) {
                session.store.save(LEGACY_DATABASE, &Database::new())?;
            }
            session.use_database(LEGACY_DATABASE)?;
        }
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the open database.
    pub fn current(&self) -> Option<&str> {
        self.open.as_ref().map(|(name, _)| name.as_str())
    }

    /// Working copy of the open database.
    pub fn database(&self) -> Option<&Database> {
        self.open.as_ref().map(|(_, db)| db)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::CreateDatabase(name) => self.create_database(&name),
            Command::Use(name) => self.use_database(&name),
            Command::Remove(name) => self.remove_database(&name),
            Command::Exit(name) => self.exit_database(&name),
            Command::ShowDatabases => self.show_databases(),
            Command::ShowTables => {
                let db = self.database().ok_or(DbError::NoDatabaseSelected)?;
                Ok(Outcome::Tables(db.table_names().into_iter().map(String::from).collect()))
            }
            Command::Export(stmt) => self.export(stmt),
            command => self.execute_on_table(command),
        }
    }

    fn execute_on_table(&mut self, command: Command) -> Result<Outcome> {
        let (name, db) = self.open.as_mut().ok_or(DbError::NoDatabaseSelected)?;
        if !command.is_mutation() {
            return db.execute(command);
        }

        // Mutate a copy so a failed write leaves memory and disk in agreement.
        let mut working = db.clone();
        let outcome = working.execute(command)?;
        self.store.save(name, &working)?;
        *db = working;
        Ok(outcome)
    }

    fn create_database(&mut self, name: &str) -> Result<Outcome> {
        if self.store.exists(name) {
            return Err(DbError::AlreadyExists { kind: ObjectKind::Database, name: name.to_string() });
        }
        self.store.save(name, &Database::new())?;
        info!(database = name, "database created");
        Ok(Outcome::Message(format!("Database '{}' created successfully.", name)))
    }

    fn use_database(&mut self, name: &str) -> Result<Outcome> {
        if !self.store.exists(name) {
            return Err(DbError::database_not_found(name));
        }
        let db = self.store.load(name)?;
        if let Some(previous) = self.current() {
            debug!(database = previous, "database released");
        }
        self.open = Some((name.to_string(), db));
        info!(database = name, "database opened");
        Ok(Outcome::Message(format!("Using database '{}'.", name)))
    }

    fn remove_database(&mut self, name: &str) -> Result<Outcome> {
        if !self.store.exists(name) {
            return Err(DbError::database_not_found(name));
        }
        self.store.remove(name)?;
        if self.current() == Some(name) {
            self.open = None;
        }
        info!(database = name, "database removed");
        Ok(Outcome::Message(format!("Database '{}' removed successfully.", name)))
    }

    fn exit_database(&mut self, name: &str) -> Result<Outcome> {
        match &self.open {
            None => return Err(DbError::NoDatabaseOpen),
            Some((open, _)) if open != name => return Err(DbError::WrongDatabase(name.to_string())),
            Some((open, db)) => self.store.save(open, db)?,
        }
        self.open = None;
        info!(database = name, "database closed");
        Ok(Outcome::Message(format!("Exited database '{}'.", name)))
    }

    fn show_databases(&self) -> Result<Outcome> {
        let mut listing = Vec::new();
        for name in self.store.list()? {
            if name == LEGACY_DATABASE {
                continue;
            }
            let kind = match self.store.load(&name) {
                Ok(db) => Some(db.kind()),
                Err(e) => {
                    warn!(database = %name, error = %e, "unreadable document");
                    None
                }
            };
            listing.push((name, kind));
        }
        Ok(Outcome::Databases(listing))
    }

    fn export(&self, stmt: ExportStatement) -> Result<Outcome> {
        let loaded;
        let db = match &self.open {
            Some((open, db)) if *open == stmt.database => db,
            _ => {
                loaded = self.store.load(&stmt.database)?;
                &loaded
            }
        };
        let path = export::export(db, &self.config.export_dir, &stmt.file, stmt.format)?;
        info!(database = %stmt.database, path = %path.display(), "database exported");
        Ok(Outcome::Exported { database: stmt.database, format: stmt.format, path })
    }
}
