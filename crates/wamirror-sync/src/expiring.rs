//! Keyed collection whose entries lapse after a period without writes.
//!
//! Expiry is checked lazily on every access and eagerly by
//! [`ExpiringMap::purge_expired`], which the store runs on an interval.
//! Iteration follows first-insertion order.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

struct Slot<T> {
    value: T,
    expires_at: Instant,
    seq: u64,
}

impl<T> Slot<T> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub struct ExpiringMap<T> {
    entries: HashMap<String, Slot<T>>,
    ttl: Duration,
    id_of: fn(&T) -> String,
    next_seq: u64,
}

impl<T: Clone> ExpiringMap<T> {
    /// `id_of` derives the key of every inserted item.
    pub fn new(ttl: Duration, id_of: fn(&T) -> String) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            id_of,
            next_seq: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `id`. An expired entry is dropped on the spot.
    fn live_slot(&mut self, id: &str) -> Option<&mut Slot<T>> {
        let now = Instant::now();
        if self.entries.get(id).is_some_and(|slot| !slot.is_live(now)) {
            self.entries.remove(id);
            return None;
        }
        self.entries.get_mut(id)
    }

    pub fn get(&mut self, id: &str) -> Option<T> {
        self.live_slot(id).map(|slot| slot.value.clone())
    }

    /// In-place access that leaves the expiry untouched.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.live_slot(id).map(|slot| &mut slot.value)
    }

    pub fn contains(&mut self, id: &str) -> bool {
        self.live_slot(id).is_some()
    }

    /// Insert or replace, resetting the expiry. A replaced entry keeps its
    /// position in iteration order.
    pub fn upsert(&mut self, item: T) {
        let id = (self.id_of)(&item);
        let expires_at = Instant::now() + self.ttl;
        let existing = self.live_slot(&id).map(|slot| slot.seq);
        let seq = existing.unwrap_or_else(|| {
            self.next_seq += 1;
            self.next_seq
        });
        self.entries.insert(
            id,
            Slot {
                value: item,
                expires_at,
                seq,
            },
        );
    }

    /// Replace an existing entry without extending its lifetime.
    /// Returns `false` when the id is absent.
    pub fn update(&mut self, item: T) -> bool {
        let id = (self.id_of)(&item);
        match self.live_slot(&id) {
            Some(slot) => {
                slot.value = item;
                true
            }
            None => false,
        }
    }

    /// Mutate an existing entry and reset its expiry.
    /// Returns `false` when the id is absent.
    pub fn update_assign(&mut self, id: &str, assign: impl FnOnce(&mut T)) -> bool {
        let expires_at = Instant::now() + self.ttl;
        match self.live_slot(id) {
            Some(slot) => {
                assign(&mut slot.value);
                slot.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove(id)
            .is_some_and(|slot| slot.is_live(now))
    }

    /// Keep only the live entries matching `keep`.
    pub fn filter(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let now = Instant::now();
        self.entries
            .retain(|_, slot| slot.is_live(now) && keep(&slot.value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Live values in first-insertion order.
    pub fn values(&self) -> Vec<T> {
        let now = Instant::now();
        let mut live: Vec<&Slot<T>> = self
            .entries
            .values()
            .filter(|slot| slot.is_live(now))
            .collect();
        live.sort_by_key(|slot| slot.seq);
        live.into_iter().map(|slot| slot.value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.values().filter(|slot| slot.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.is_live(now));
        before - self.entries.len()
    }
}
