//! Opaque session blobs (authentication state) keyed by a sanitized name.
//!
//! Key material itself is owned by the auth layer; this table only stores
//! whatever JSON it hands over.

use rusqlite::params;
use serde_json::Value;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Make a blob name safe to use as a key (`/` → `__`, `:` → `-`).
pub fn sanitize_session_name(name: &str) -> String {
    name.replace('/', "__").replace(':', "-")
}

impl Database {
    pub fn write_session(&self, name: &str, data: &Value) -> Result<()> {
        let name = sanitize_session_name(name);
        self.conn().execute(
            "INSERT INTO sessions (name, data) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET data = excluded.data",
            params![name, serde_json::to_string(data)?],
        )?;
        Ok(())
    }

    /// Read a blob back. A missing name is `Ok(None)`, not an error.
    pub fn read_session(&self, name: &str) -> Result<Option<Value>> {
        let name = sanitize_session_name(name);
        let data = self.conn().query_row(
            "SELECT data FROM sessions WHERE name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        );

        match data {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn remove_session(&self, name: &str) -> Result<bool> {
        let name = sanitize_session_name(name);
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }
}
