//! In-memory group metadata snapshots and the remote lookup they are
//! refreshed from.

use std::collections::HashMap;

use async_trait::async_trait;

use wamirror_shared::{GroupMetadata, GroupParticipant, GroupPatch, ParticipantAction};

/// Remote authority for group metadata, typically a query over the live
/// messaging connection.
#[async_trait]
pub trait GroupMetadataSource: Send + Sync {
    async fn group_metadata(&self, jid: &str) -> anyhow::Result<GroupMetadata>;
}

#[derive(Default)]
pub struct GroupMetadataCache {
    groups: HashMap<String, GroupMetadata>,
}

impl GroupMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&GroupMetadata> {
        self.groups.get(id)
    }

    /// Every snapshot, sorted by id.
    pub fn all(&self) -> Vec<GroupMetadata> {
        let mut groups: Vec<_> = self.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Replace the snapshot stored under its id.
    pub fn upsert(&mut self, mut snapshot: GroupMetadata) {
        snapshot.normalize_desc_time();
        self.groups.insert(snapshot.id.clone(), snapshot);
    }

    /// Merge `patch` into a cached group. Unknown groups are ignored.
    pub fn merge(&mut self, patch: &GroupPatch) -> Option<GroupMetadata> {
        let group = self.groups.get_mut(&patch.id)?;
        group.apply(patch);
        group.normalize_desc_time();
        Some(group.clone())
    }

    /// Merge a full snapshot over the cached one, or cache it as is.
    pub fn merge_or_insert(&mut self, snapshot: GroupMetadata) -> GroupMetadata {
        let patch = GroupPatch::from(snapshot.clone());
        let group = self
            .groups
            .entry(snapshot.id.clone())
            .and_modify(|group| group.apply(&patch))
            .or_insert(snapshot);
        group.normalize_desc_time();
        group.clone()
    }

    /// Apply a roster diff to a cached group.
    pub fn apply_participants(
        &mut self,
        id: &str,
        action: ParticipantAction,
        participants: &[GroupParticipant],
    ) -> Option<GroupMetadata> {
        let group = self.groups.get_mut(id)?;
        group.apply_participants(action, participants);
        Some(group.clone())
    }

    /// Whether `id` must be fetched remotely at `now_ms`.
    pub fn needs_refresh(&self, id: &str, force: bool, now_ms: i64) -> bool {
        force || self.groups.get(id).map_or(true, |g| g.is_stale(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamirror_shared::AdminRank;

    fn group_with(members: &[&str]) -> GroupMetadata {
        GroupMetadata {
            participants: members.iter().map(|m| GroupParticipant::new(*m)).collect(),
            size: Some(members.len() as u32),
            ..GroupMetadata::new("g1@g.us", "Team")
        }
    }

    #[test]
    fn test_merge_only_cached() {
        let mut cache = GroupMetadataCache::new();
        let mut patch = GroupPatch::new("g1@g.us");
        patch.subject = Some("Renamed".into());
        assert!(cache.merge(&patch).is_none());
        assert!(cache.is_empty());

        cache.upsert(group_with(&["1@s.whatsapp.net"]));
        patch.desc_time = Some(f64::NAN);
        let merged = cache.merge(&patch).unwrap();
        assert_eq!(merged.subject, "Renamed");
        assert_eq!(merged.desc_time, None);
    }

    #[test]
    fn test_merge_or_insert() {
        let mut cache = GroupMetadataCache::new();
        let created = cache.merge_or_insert(group_with(&["1@s.whatsapp.net"]));
        assert_eq!(created.participants.len(), 1);

        let mut update = GroupMetadata::new("g1@g.us", "Team v2");
        update.announce = Some(true);
        let merged = cache.merge_or_insert(update);
        assert_eq!(merged.subject, "Team v2");
        assert_eq!(merged.announce, Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_roster_diff_on_cached_group() {
        let mut cache = GroupMetadataCache::new();
        let joiner = [GroupParticipant::new("3@s.whatsapp.net")];
        assert!(cache
            .apply_participants("g1@g.us", ParticipantAction::Add, &joiner)
            .is_none());

        cache.upsert(group_with(&["1@s.whatsapp.net", "2@s.whatsapp.net"]));
        let added = cache
            .apply_participants("g1@g.us", ParticipantAction::Add, &joiner)
            .unwrap();
        assert_eq!(added.size, Some(3));

        let promoted = cache
            .apply_participants("g1@g.us", ParticipantAction::Promote, &joiner)
            .unwrap();
        let member = promoted.participants.iter().find(|p| p.id == "3@s.whatsapp.net").unwrap();
        assert_eq!(member.admin, Some(AdminRank::Admin));
    }

    #[test]
    fn test_needs_refresh() {
        let mut cache = GroupMetadataCache::new();
        assert!(cache.needs_refresh("g1@g.us", false, 0));

        let mut group = group_with(&[]);
        group.expired_at = Some(1_000);
        cache.upsert(group);
        assert!(!cache.needs_refresh("g1@g.us", false, 999_000));
        assert!(cache.needs_refresh("g1@g.us", true, 999_000));
        assert!(cache.needs_refresh("g1@g.us", false, 1_000_001));
    }
}
