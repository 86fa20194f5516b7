//! CRUD operations for conversation summaries.
//!
//! Each summary is stored as an opaque JSON blob keyed by its JID.

use rusqlite::params;

use wamirror_shared::ConversationSummary;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert or replace summaries in one transaction.
    pub fn upsert_chats(&self, chats: &[ConversationSummary]) -> Result<()> {
        if chats.is_empty() {
            return Ok(());
        }

        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chats (id, data) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            )?;
            for chat in chats {
                let data = serde_json::to_string(chat)?;
                stmt.execute(params![chat.id, data])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch a single summary by JID.
    pub fn get_chat(&self, id: &str) -> Result<ConversationSummary> {
        let data: String = self
            .conn()
            .query_row("SELECT data FROM chats WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// List every stored summary.
    pub fn list_chats(&self) -> Result<Vec<ConversationSummary>> {
        let mut stmt = self.conn().prepare("SELECT data FROM chats ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(serde_json::from_str(&row?)?);
        }
        Ok(chats)
    }

    /// Delete a summary by JID.  Returns `true` if a row was deleted.
    pub fn delete_chat(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM chats WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn clear_chats(&self) -> Result<()> {
        self.conn().execute("DELETE FROM chats", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: &str, ts: u64) -> ConversationSummary {
        ConversationSummary {
            id: id.into(),
            conversation_timestamp: Some(ts),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_replaces_blob() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_chats(&[chat("1@s.whatsapp.net", 10)]).unwrap();

        let mut updated = chat("1@s.whatsapp.net", 20);
        updated.unread_count = Some(4);
        db.upsert_chats(&[updated.clone()]).unwrap();

        assert_eq!(db.get_chat("1@s.whatsapp.net").unwrap(), updated);
        assert_eq!(db.list_chats().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_chat_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_chat("nope"), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_delete_and_clear() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_chats(&[chat("a@s.whatsapp.net", 1), chat("b@s.whatsapp.net", 2)])
            .unwrap();

        assert!(db.delete_chat("a@s.whatsapp.net").unwrap());
        assert!(!db.delete_chat("a@s.whatsapp.net").unwrap());

        db.clear_chats().unwrap();
        assert!(db.list_chats().unwrap().is_empty());
    }
}
