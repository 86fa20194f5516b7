//! SQLite handle behind the durable mirror tables (chats, contacts, groups,
//! sessions). Opening always brings the schema up to date.

use std::path::Path;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// `wamirror.db` in the platform data directory.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "wamirror", "wamirror").ok_or(StoreError::NoDataDir)?;
        let db_path = dirs.data_dir().join("wamirror.db");
        tracing::info!(path = %db_path.display(), "Opening mirror database");
        Self::open_at(&db_path)
    }

    /// Missing parent directories are created.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // The write-behind worker is the only writer; readers never block it.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_version(db: &Database) -> u32 {
        db.conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_open_creates_parent_dirs_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mirror.db");

        let db = Database::open_at(&path).unwrap();
        assert!(path.exists());
        let mode: String = db
            .conn()
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(schema_version(&db), migrations::CURRENT_VERSION);
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.db");

        drop(Database::open_at(&path).unwrap());
        let db = Database::open_at(&path).unwrap();
        assert_eq!(schema_version(&db), migrations::CURRENT_VERSION);
    }
}
