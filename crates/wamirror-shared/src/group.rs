//! Group metadata snapshots, their partial updates and roster changes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Administrative rank of a group participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdminRank {
    Admin,
    Superadmin,
}

impl AdminRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRank::Admin => "admin",
            AdminRank::Superadmin => "superadmin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(AdminRank::Admin),
            "superadmin" => Some(AdminRank::Superadmin),
            _ => None,
        }
    }
}

/// One entry of a group roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupParticipant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// `None` for regular members.
    #[serde(default)]
    pub admin: Option<AdminRank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_super_admin: Option<bool>,
}

impl GroupParticipant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn set_rank(&mut self, rank: Option<AdminRank>) {
        self.admin = rank;
        self.is_admin = Some(rank.is_some());
        self.is_super_admin = Some(rank == Some(AdminRank::Superadmin));
    }
}

/// Roster change carried by a group-participants event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Full metadata of a group as last seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_id: Option<String>,
    /// Description edit time; payloads may carry a non-finite number here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_add_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_approval_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_community: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_community_announce: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addressing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Epoch seconds after which the snapshot must be refreshed remotely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<i64>,
}

impl GroupMetadata {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Replace a non-finite `desc_time` with `None`.
    pub fn normalize_desc_time(&mut self) {
        self.desc_time = self.desc_time.filter(|t| t.is_finite());
    }

    /// Whether the snapshot must be refetched at `now_ms` (epoch millis).
    pub fn is_stale(&self, now_ms: i64) -> bool {
        match self.expired_at {
            Some(expired_at) => expired_at.saturating_mul(1000) < now_ms,
            None => true,
        }
    }

    /// Overwrite every field present in `patch`.
    pub fn apply(&mut self, patch: &GroupPatch) {
        if let Some(subject) = &patch.subject {
            self.subject = subject.clone();
        }
        set_if_some(&mut self.subject_owner, &patch.subject_owner);
        set_if_some(&mut self.subject_time, &patch.subject_time);
        set_if_some(&mut self.owner, &patch.owner);
        set_if_some(&mut self.creation, &patch.creation);
        set_if_some(&mut self.desc, &patch.desc);
        set_if_some(&mut self.desc_owner, &patch.desc_owner);
        set_if_some(&mut self.desc_id, &patch.desc_id);
        set_if_some(&mut self.desc_time, &patch.desc_time);
        set_if_some(&mut self.linked_parent, &patch.linked_parent);
        set_if_some(&mut self.restrict, &patch.restrict);
        set_if_some(&mut self.announce, &patch.announce);
        set_if_some(&mut self.member_add_mode, &patch.member_add_mode);
        set_if_some(&mut self.join_approval_mode, &patch.join_approval_mode);
        set_if_some(&mut self.is_community, &patch.is_community);
        set_if_some(&mut self.is_community_announce, &patch.is_community_announce);
        set_if_some(&mut self.size, &patch.size);
        if let Some(participants) = &patch.participants {
            self.participants = participants.clone();
        }
        set_if_some(&mut self.ephemeral_duration, &patch.ephemeral_duration);
        set_if_some(&mut self.invite_code, &patch.invite_code);
        set_if_some(&mut self.addressing_mode, &patch.addressing_mode);
        set_if_some(&mut self.author, &patch.author);
        set_if_some(&mut self.expired_at, &patch.expired_at);
    }

    /// Apply a roster change and return how many participants it touched.
    pub fn apply_participants(
        &mut self,
        action: ParticipantAction,
        participants: &[GroupParticipant],
    ) -> usize {
        match action {
            ParticipantAction::Add => {
                let base = self.size.unwrap_or(self.participants.len() as u32);
                let mut added = 0u32;
                for incoming in participants {
                    if self.participants.iter().any(|p| p.id == incoming.id) {
                        continue;
                    }
                    let mut member = incoming.clone();
                    member.set_rank(None);
                    self.participants.push(member);
                    added += 1;
                }
                self.size = Some(base.saturating_add(added));
                added as usize
            }
            ParticipantAction::Promote | ParticipantAction::Demote => {
                let rank = (action == ParticipantAction::Promote).then_some(AdminRank::Admin);
                let mut touched = 0;
                for member in self
                    .participants
                    .iter_mut()
                    .filter(|p| participants.iter().any(|i| i.id == p.id))
                {
                    member.set_rank(rank);
                    touched += 1;
                }
                touched
            }
            ParticipantAction::Remove => {
                let base = self.size.unwrap_or(self.participants.len() as u32);
                let before = self.participants.len();
                self.participants
                    .retain(|p| !participants.iter().any(|i| i.id == p.id));
                let removed = before - self.participants.len();
                self.size = Some(base.saturating_sub(removed as u32));
                removed
            }
        }
    }
}

fn set_if_some<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if incoming.is_some() {
        *slot = incoming.clone();
    }
}

/// Partial update of a [`GroupMetadata`]; `id` selects the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_add_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_approval_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_community: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_community_announce: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<GroupParticipant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addressing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<i64>,
}

impl GroupPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl From<GroupMetadata> for GroupPatch {
    fn from(meta: GroupMetadata) -> Self {
        Self {
            id: meta.id,
            subject: Some(meta.subject),
            subject_owner: meta.subject_owner,
            subject_time: meta.subject_time,
            owner: meta.owner,
            creation: meta.creation,
            desc: meta.desc,
            desc_owner: meta.desc_owner,
            desc_id: meta.desc_id,
            desc_time: meta.desc_time,
            linked_parent: meta.linked_parent,
            restrict: meta.restrict,
            announce: meta.announce,
            member_add_mode: meta.member_add_mode,
            join_approval_mode: meta.join_approval_mode,
            is_community: meta.is_community,
            is_community_announce: meta.is_community_announce,
            size: meta.size,
            participants: Some(meta.participants),
            ephemeral_duration: meta.ephemeral_duration,
            invite_code: meta.invite_code,
            addressing_mode: meta.addressing_mode,
            author: meta.author,
            expired_at: meta.expired_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<GroupParticipant> {
        ids.iter().map(|id| GroupParticipant::new(*id)).collect()
    }

    fn group_with(ids: &[&str]) -> GroupMetadata {
        let mut meta = GroupMetadata::new("g1@g.us", "Team");
        meta.participants = roster(ids);
        meta.size = Some(ids.len() as u32);
        meta
    }

    #[test]
    fn test_add_skips_existing_and_clears_rank() {
        let mut meta = group_with(&["a", "b"]);
        let mut incoming = roster(&["b", "c"]);
        incoming[1].admin = Some(AdminRank::Superadmin);

        let added = meta.apply_participants(ParticipantAction::Add, &incoming);

        assert_eq!(added, 1);
        assert_eq!(meta.participants.len(), 3);
        assert_eq!(meta.size, Some(3));
        assert_eq!(meta.participants[2].admin, None);
        assert_eq!(meta.participants[2].is_admin, Some(false));
    }

    #[test]
    fn test_add_saturates_reported_size() {
        let mut meta = group_with(&["a"]);
        meta.size = Some(u32::MAX);

        let added = meta.apply_participants(ParticipantAction::Add, &roster(&["b", "c"]));

        assert_eq!(added, 2);
        assert_eq!(meta.participants.len(), 3);
        assert_eq!(meta.size, Some(u32::MAX));
    }

    #[test]
    fn test_remove_everyone_leaves_zero() {
        let mut meta = group_with(&["a", "b", "c"]);
        let removed = meta.apply_participants(ParticipantAction::Remove, &roster(&["a", "b", "c"]));
        assert_eq!(removed, 3);
        assert!(meta.participants.is_empty());
        assert_eq!(meta.size, Some(0));
    }

    #[test]
    fn test_promote_then_demote() {
        let mut meta = group_with(&["a", "b"]);
        meta.apply_participants(ParticipantAction::Promote, &roster(&["b", "zz"]));
        assert_eq!(meta.participants[1].admin, Some(AdminRank::Admin));
        assert_eq!(meta.participants[1].is_admin, Some(true));
        assert_eq!(meta.participants[0].admin, None);

        meta.apply_participants(ParticipantAction::Demote, &roster(&["b"]));
        assert_eq!(meta.participants[1].admin, None);
        assert_eq!(meta.participants[1].is_admin, Some(false));
    }

    #[test]
    fn test_normalize_desc_time() {
        let mut meta = GroupMetadata::new("g1@g.us", "Team");
        meta.desc_time = Some(f64::NAN);
        meta.normalize_desc_time();
        assert_eq!(meta.desc_time, None);

        meta.desc_time = Some(1_700_000_000.0);
        meta.normalize_desc_time();
        assert_eq!(meta.desc_time, Some(1_700_000_000.0));
    }

    #[test]
    fn test_staleness() {
        let mut meta = GroupMetadata::new("g1@g.us", "Team");
        assert!(meta.is_stale(0));
        meta.expired_at = Some(1_000);
        assert!(!meta.is_stale(999_999));
        assert!(meta.is_stale(1_000_001));
    }

    #[test]
    fn test_patch_merges_present_fields() {
        let mut meta = group_with(&["a"]);
        meta.desc = Some("old".into());
        let mut patch = GroupPatch::new("g1@g.us");
        patch.ephemeral_duration = Some(604_800);
        meta.apply(&patch);

        assert_eq!(meta.desc.as_deref(), Some("old"));
        assert_eq!(meta.subject, "Team");
        assert_eq!(meta.ephemeral_duration, Some(604_800));
        assert_eq!(meta.participants.len(), 1);
    }
}
