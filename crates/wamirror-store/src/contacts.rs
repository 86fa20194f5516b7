//! CRUD operations for [`Contact`] records.

use rusqlite::params;

use wamirror_shared::Contact;

use crate::database::Database;
use crate::error::{Result, StoreError};

const CONTACT_COLUMNS: &str =
    "id, lid, phone_number, name, notify, verified_name, img_url, status";

impl Database {
    /// Insert or replace contacts in one transaction.
    pub fn upsert_contacts(&self, contacts: &[Contact]) -> Result<()> {
        if contacts.is_empty() {
            return Ok(());
        }

        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO contacts (id, lid, phone_number, name, notify, verified_name, img_url, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     lid = excluded.lid,
                     phone_number = excluded.phone_number,
                     name = excluded.name,
                     notify = excluded.notify,
                     verified_name = excluded.verified_name,
                     img_url = excluded.img_url,
                     status = excluded.status",
            )?;
            for contact in contacts {
                stmt.execute(params![
                    contact.id,
                    contact.lid,
                    contact.phone_number,
                    contact.name,
                    contact.notify,
                    contact.verified_name,
                    contact.img_url,
                    contact.status,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_contact(&self, id: &str) -> Result<Contact> {
        self.conn()
            .query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
                params![id],
                row_to_contact,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_contact)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn delete_contact(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn clear_contacts(&self) -> Result<()> {
        self.conn().execute("DELETE FROM contacts", [])?;
        Ok(())
    }
}

fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        lid: row.get(1)?,
        phone_number: row.get(2)?,
        name: row.get(3)?,
        notify: row.get(4)?,
        verified_name: row.get(5)?,
        img_url: row.get(6)?,
        status: row.get(7)?,
    })
}
