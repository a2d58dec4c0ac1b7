use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::database::Database;
use crate::error::{DbError, Result};

const EXTENSION: &str = "json";

/// Whole-document persistence, one document per database name.
pub trait DocumentStore {
    fn exists(&self, name: &str) -> bool;
    fn load(&self, name: &str) -> Result<Database>;
    fn save(&self, name: &str, db: &Database) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;
    /// Names of all stored documents, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Stores each database as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, EXTENSION))
    }
}

/// Writes `value` as JSON indented by four spaces.
pub fn write_pretty<W: Write, T: Serialize>(writer: W, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    writer.flush()?;
    Ok(())
}

impl DocumentStore for JsonFileStore {
    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn load(&self, name: &str) -> Result<Database> {
        let path = self.path(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(DbError::database_not_found(name)),
            Err(e) => return Err(e.into()),
        };
        let db = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), "document loaded");
        Ok(db)
    }

    fn save(&self, name: &str, db: &Database) -> Result<()> {
        let path = self.path(name);
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        write_pretty(file, db)?;
        debug!(path = %path.display(), tables = db.table_names().len(), "document written");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DbError::database_not_found(name)),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{RecordTable, Table};
    use crate::literal::parse_records;
    use tempfile::TempDir;

    fn sample() -> Database {
        let mut table = RecordTable::new();
        for record in parse_records("[{name: Alice, score: 9.0}, {name: Bob, score: 7}]").unwrap() {
            table.insert(record);
        }
        let mut db = Database::new();
        db.create_table("people", Table::Records(table)).unwrap();
        db
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let db = sample();
        store.save("shop", &db).unwrap();
        assert!(store.exists("shop"));
        assert_eq!(store.load("shop").unwrap(), db);
    }

    #[test]
    fn test_document_is_indented_with_four_spaces() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        store.save("shop", &sample()).unwrap();
        let text = fs::read_to_string(dir.path().join("shop.json")).unwrap();
        assert!(text.starts_with("{\n    \"people\": [\n        {"));
        assert!(text.contains("\"score\": 9.0"));
    }

    #[test]
    fn test_missing_documents() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("nope"), Err(DbError::NotFound { .. })));
        assert!(matches!(store.remove("nope"), Err(DbError::NotFound { .. })));
    }

    #[test]
    fn test_list_only_reports_documents() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        store.save("b", &Database::new()).unwrap();
        store.save("a", &Database::new()).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);

        store.remove("a").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_corrupted_document_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        assert!(matches!(store.load("bad"), Err(DbError::Document(_))));
    }
}
