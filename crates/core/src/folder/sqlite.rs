//! SQLite-backed folder store.
//!
//! The rule lives in two plain columns and ignore patterns in a child table;
//! both are validated into their typed form whenever a row is read.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{FolderError, FolderStore, IgnoreList, MonitoredFolder};
use crate::rule::{Rule, RuleCriteria};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS folders (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        source_path TEXT NOT NULL,
        destination_path TEXT NOT NULL,
        rule_criteria TEXT NOT NULL,
        rule_value TEXT NOT NULL,
        monitoring INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS folder_ignore_patterns (
        folder_id TEXT NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        pattern TEXT NOT NULL,
        PRIMARY KEY (folder_id, position)
    );
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, name, source_path, destination_path, rule_criteria, rule_value, monitoring FROM folders";

/// SQLite-backed folder store.
pub struct SqliteFolderStore {
    conn: Mutex<Connection>,
}

/// Row as stored, before validation.
struct FolderRow {
    id: String,
    name: String,
    source_path: String,
    destination_path: String,
    rule_criteria: String,
    rule_value: String,
    monitoring: bool,
}

impl SqliteFolderStore {
    /// Open (or create) the folder tables in the database file at `path`.
    pub fn new(path: &Path) -> Result<Self, FolderError> {
        let conn = Connection::open(path).map_err(|e| FolderError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, FolderError> {
        let conn =
            Connection::open_in_memory().map_err(|e| FolderError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, FolderError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| FolderError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| FolderError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<FolderRow> {
        Ok(FolderRow {
            id: row.get(0)?,
            name: row.get(1)?,
            source_path: row.get(2)?,
            destination_path: row.get(3)?,
            rule_criteria: row.get(4)?,
            rule_value: row.get(5)?,
            monitoring: row.get(6)?,
        })
    }

    fn load_ignore(conn: &Connection, folder_id: &str) -> Result<IgnoreList, FolderError> {
        let mut stmt = conn
            .prepare(
                "SELECT pattern FROM folder_ignore_patterns WHERE folder_id = ? ORDER BY position",
            )
            .map_err(|e| FolderError::Database(e.to_string()))?;

        let patterns = stmt
            .query_map(params![folder_id], |row| row.get::<_, String>(0))
            .map_err(|e| FolderError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FolderError::Database(e.to_string()))?;

        Ok(IgnoreList::new(patterns))
    }

    fn hydrate(conn: &Connection, row: FolderRow) -> Result<MonitoredFolder, FolderError> {
        let criteria =
            RuleCriteria::parse(&row.rule_criteria).ok_or_else(|| FolderError::Corrupt {
                id: row.id.clone(),
                reason: format!("unknown rule criteria {}", row.rule_criteria),
            })?;
        let rule = Rule::parse(criteria, &row.rule_value).map_err(|e| FolderError::Corrupt {
            id: row.id.clone(),
            reason: e.to_string(),
        })?;
        let ignore = Self::load_ignore(conn, &row.id)?;

        Ok(MonitoredFolder {
            id: row.id,
            name: row.name,
            source: PathBuf::from(row.source_path),
            destination: PathBuf::from(row.destination_path),
            rule,
            ignore,
            monitoring: row.monitoring,
        })
    }
}

impl FolderStore for SqliteFolderStore {
    fn insert(&self, folder: &MonitoredFolder) -> Result<(), FolderError> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| FolderError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO folders (id, name, source_path, destination_path, rule_criteria, rule_value, monitoring, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                folder.id,
                folder.name,
                folder.source.to_string_lossy().to_string(),
                folder.destination.to_string_lossy().to_string(),
                folder.rule.criteria().as_str(),
                folder.rule.value(),
                folder.monitoring,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| FolderError::Database(e.to_string()))?;

        for (position, pattern) in folder.ignore.patterns().iter().enumerate() {
            tx.execute(
                "INSERT INTO folder_ignore_patterns (folder_id, position, pattern) VALUES (?, ?, ?)",
                params![folder.id, position as i64, pattern],
            )
            .map_err(|e| FolderError::Database(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| FolderError::Database(e.to_string()))
    }

    fn get(&self, id: &str) -> Result<Option<MonitoredFolder>, FolderError> {
        let conn = self.conn();

        let row = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_raw,
            )
            .optional()
            .map_err(|e| FolderError::Database(e.to_string()))?;

        row.map(|row| Self::hydrate(&conn, row)).transpose()
    }

    fn list(&self) -> Result<Vec<MonitoredFolder>, FolderError> {
        let conn = self.conn();

        let mut stmt = conn
            .prepare(&format!("{} ORDER BY rowid", SELECT_COLUMNS))
            .map_err(|e| FolderError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_raw)
            .map_err(|e| FolderError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FolderError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| Self::hydrate(&conn, row))
            .collect()
    }

    fn set_monitoring(&self, id: &str, monitoring: bool) -> Result<(), FolderError> {
        let conn = self.conn();

        let changed = conn
            .execute(
                "UPDATE folders SET monitoring = ? WHERE id = ?",
                params![monitoring, id],
            )
            .map_err(|e| FolderError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(FolderError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<MonitoredFolder, FolderError> {
        let folder = self
            .get(id)?
            .ok_or_else(|| FolderError::NotFound(id.to_string()))?;

        let conn = self.conn();
        conn.execute("DELETE FROM folders WHERE id = ?", params![id])
            .map_err(|e| FolderError::Database(e.to_string()))?;

        Ok(folder)
    }
}
