//! CRUD operations for [`GroupMetadata`] snapshots.
//!
//! Scalar fields map to columns; the roster is an ordered JSON array.

use rusqlite::params;

use wamirror_shared::GroupMetadata;

use crate::database::Database;
use crate::error::{Result, StoreError};

const GROUP_COLUMNS: &str = "id, subject, subject_owner, subject_time, owner, creation, \
     descr, desc_owner, desc_id, desc_time, linked_parent, restrict_info, announce, \
     member_add_mode, join_approval_mode, is_community, is_community_announce, size, \
     participants, ephemeral_duration, invite_code, addressing_mode, author, expired_at";

impl Database {
    /// Insert or replace snapshots in one transaction.
    pub fn upsert_groups(&self, groups: &[GroupMetadata]) -> Result<()> {
        if groups.is_empty() {
            return Ok(());
        }

        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO group_metadata ({GROUP_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
            ))?;
            for group in groups {
                let participants = serde_json::to_string(&group.participants)?;
                // Non-finite values cannot be bound as REAL.
                let desc_time = group.desc_time.filter(|t| t.is_finite());
                stmt.execute(params![
                    group.id,
                    group.subject,
                    group.subject_owner,
                    group.subject_time,
                    group.owner,
                    group.creation,
                    group.desc,
                    group.desc_owner,
                    group.desc_id,
                    desc_time,
                    group.linked_parent,
                    group.restrict,
                    group.announce,
                    group.member_add_mode,
                    group.join_approval_mode,
                    group.is_community,
                    group.is_community_announce,
                    group.size,
                    participants,
                    group.ephemeral_duration,
                    group.invite_code,
                    group.addressing_mode,
                    group.author,
                    group.expired_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_group(&self, id: &str) -> Result<GroupMetadata> {
        self.conn()
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM group_metadata WHERE id = ?1"),
                params![id],
                row_to_group,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn list_groups(&self) -> Result<Vec<GroupMetadata>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {GROUP_COLUMNS} FROM group_metadata ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_group)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn delete_group(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM group_metadata WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn clear_groups(&self) -> Result<()> {
        self.conn().execute("DELETE FROM group_metadata", [])?;
        Ok(())
    }
}

fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupMetadata> {
    let participants_json: String = row.get(18)?;
    let participants = serde_json::from_str(&participants_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(18, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(GroupMetadata {
        id: row.get(0)?,
        subject: row.get(1)?,
        subject_owner: row.get(2)?,
        subject_time: row.get(3)?,
        owner: row.get(4)?,
        creation: row.get(5)?,
        desc: row.get(6)?,
        desc_owner: row.get(7)?,
        desc_id: row.get(8)?,
        desc_time: row.get(9)?,
        linked_parent: row.get(10)?,
        restrict: row.get(11)?,
        announce: row.get(12)?,
        member_add_mode: row.get(13)?,
        join_approval_mode: row.get(14)?,
        is_community: row.get(15)?,
        is_community_announce: row.get(16)?,
        size: row.get(17)?,
        participants,
        ephemeral_duration: row.get(19)?,
        invite_code: row.get(20)?,
        addressing_mode: row.get(21)?,
        author: row.get(22)?,
        expired_at: row.get(23)?,
    })
}
