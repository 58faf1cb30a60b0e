use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    ActionFilter, ActionRecord, ActionStatus, ActionType, HistoryLedger, LedgerError, NewAction,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS action_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        folder_id TEXT,
        action_type TEXT NOT NULL,
        source_path TEXT NOT NULL,
        destination_path TEXT NOT NULL,
        status TEXT NOT NULL,
        details TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_action_history_timestamp ON action_history(timestamp);
    CREATE INDEX IF NOT EXISTS idx_action_history_folder_id ON action_history(folder_id);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp, folder_id, action_type, source_path, destination_path, status, details FROM action_history";

/// SQLite-backed history ledger
pub struct SqliteHistoryLedger {
    conn: Mutex<Connection>,
}

impl SqliteHistoryLedger {
    /// Open (or create) the ledger in the database file at `path`.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// In-memory ledger (useful for testing)
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_where_clause(filter: &ActionFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref folder_id) = filter.folder_id {
            conditions.push("folder_id = ?");
            params.push(Box::new(folder_id.clone()));
        }

        if let Some(action_type) = filter.action_type {
            conditions.push("action_type = ?");
            params.push(Box::new(action_type.as_str()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawRecord> {
        Ok(RawRecord {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            folder_id: row.get(2)?,
            action_type: row.get(3)?,
            source_path: row.get(4)?,
            destination_path: row.get(5)?,
            status: row.get(6)?,
            details: row.get(7)?,
        })
    }
}

/// Row as stored, before validation.
struct RawRecord {
    id: i64,
    timestamp: String,
    folder_id: Option<String>,
    action_type: String,
    source_path: String,
    destination_path: String,
    status: String,
    details: String,
}

impl RawRecord {
    fn into_record(self) -> Result<ActionRecord, LedgerError> {
        let id = self.id;
        let corrupt = |reason: String| LedgerError::Corrupt { id, reason };

        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| corrupt(format!("invalid timestamp: {}", e)))?
            .with_timezone(&Utc);
        let action_type = ActionType::parse(&self.action_type)
            .ok_or_else(|| corrupt(format!("unknown action type {}", self.action_type)))?;
        let status = ActionStatus::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status {}", self.status)))?;

        Ok(ActionRecord {
            id,
            folder_id: self.folder_id,
            action_type,
            source_path: PathBuf::from(self.source_path),
            destination_path: PathBuf::from(self.destination_path),
            status,
            details: self.details,
            timestamp,
        })
    }
}

impl HistoryLedger for SqliteHistoryLedger {
    fn append(&self, action: &NewAction) -> Result<ActionRecord, LedgerError> {
        let conn = self.conn();
        let status = ActionStatus::Completed;

        conn.execute(
            "INSERT INTO action_history (timestamp, folder_id, action_type, source_path, destination_path, status, details) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                action.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                action.folder_id,
                action.action_type.as_str(),
                action.source_path.to_string_lossy().to_string(),
                action.destination_path.to_string_lossy().to_string(),
                status.as_str(),
                action.details,
            ],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(ActionRecord {
            id: conn.last_insert_rowid(),
            folder_id: action.folder_id.clone(),
            action_type: action.action_type,
            source_path: action.source_path.clone(),
            destination_path: action.destination_path.clone(),
            status,
            details: action.details.clone(),
            timestamp: action.timestamp,
        })
    }

    fn query(&self, filter: &ActionFilter) -> Result<Vec<ActionRecord>, LedgerError> {
        let conn = self.conn();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "{} {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit.max(0)));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_raw)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| LedgerError::Database(e.to_string()))?;
            records.push(raw.into_record()?);
        }
        Ok(records)
    }

    fn get(&self, id: i64) -> Result<Option<ActionRecord>, LedgerError> {
        let conn = self.conn();

        let raw = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_raw,
            )
            .optional()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        raw.map(RawRecord::into_record).transpose()
    }

    fn mark_reverted(&self, id: i64) -> Result<bool, LedgerError> {
        let conn = self.conn();

        let changed = conn
            .execute(
                "UPDATE action_history SET status = ? WHERE id = ? AND status = ?",
                params![
                    ActionStatus::Reverted.as_str(),
                    id,
                    ActionStatus::Completed.as_str()
                ],
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(changed == 1)
    }
}
