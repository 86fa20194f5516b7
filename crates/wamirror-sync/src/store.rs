//! The synchronized store: in-memory indices, their durable seed, and the
//! read API served from memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use wamirror_shared::{
    Contact, ConversationSummary, GroupMetadata, MessageKey, MessageRecord, Persistence,
    PresenceData, StoreEvent, UserReceipt,
};
use wamirror_store::Database;

use crate::chats::ConversationIndex;
use crate::config::SyncConfig;
use crate::contacts::ContactBook;
use crate::error::{Result, SyncError};
use crate::groups::{GroupMetadataCache, GroupMetadataSource};
use crate::messages::MessageHistory;
use crate::writer::WriteBehind;

pub(crate) type Presences = HashMap<String, HashMap<String, PresenceData>>;

/// Lock an index, recovering from poisoning: the indices hold plain data
/// that stays consistent between statements.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ChatStore {
    pub(crate) chats: Mutex<ConversationIndex>,
    pub(crate) contacts: Mutex<ContactBook>,
    pub(crate) groups: Mutex<GroupMetadataCache>,
    pub(crate) messages: Arc<Mutex<MessageHistory>>,
    pub(crate) presences: Mutex<Presences>,
    pub(crate) writer: WriteBehind,
    config: SyncConfig,
    sweeper: Option<JoinHandle<()>>,
}

struct Seed {
    chats: Vec<ConversationSummary>,
    contacts: Vec<Contact>,
    groups: Vec<GroupMetadata>,
}

impl Seed {
    fn load(backend: &dyn Persistence) -> Result<Self> {
        Ok(Self {
            chats: backend.load_chats()?,
            contacts: backend.load_contacts()?,
            groups: backend.load_groups()?,
        })
    }
}

impl ChatStore {
    /// Seed the indices from `backend`, then hand it to the write-behind
    /// worker and start the expiry sweep.
    pub async fn open(backend: Box<dyn Persistence>, config: SyncConfig) -> Result<Self> {
        let (backend, seed) = tokio::task::spawn_blocking(move || {
            let seed = Seed::load(backend.as_ref());
            (backend, seed)
        })
        .await?;
        let seed = seed?;

        // Every persisted conversation was already accepted by the index once.
        let mut chats = ConversationIndex::new();
        for chat in seed.chats {
            chats.insert(chat);
        }

        let mut contacts = ContactBook::new();
        contacts.seed(seed.contacts);

        let mut groups = GroupMetadataCache::new();
        for group in seed.groups {
            groups.upsert(group);
        }

        info!(
            chats = chats.len(),
            contacts = contacts.len(),
            groups = groups.len(),
            "Store seeded from durable state"
        );

        let messages = Arc::new(Mutex::new(MessageHistory::new(config.message_ttl)));
        let sweeper = if config.sweep_interval.is_zero() {
            None
        } else {
            Some(spawn_sweeper(Arc::clone(&messages), config.sweep_interval))
        };

        Ok(Self {
            chats: Mutex::new(chats),
            contacts: Mutex::new(contacts),
            groups: Mutex::new(groups),
            messages,
            presences: Mutex::new(HashMap::new()),
            writer: WriteBehind::spawn(backend),
            config,
            sweeper,
        })
    }

    /// Open the SQLite database named by `config` (or the default location).
    pub async fn open_sqlite(config: SyncConfig) -> Result<Self> {
        let path = config.database_path.clone();
        let db = tokio::task::spawn_blocking(move || match path {
            Some(path) => Database::open_at(&path),
            None => Database::new(),
        })
        .await??;
        Self::open(Box::new(db), config).await
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Apply every event received on `events`, in order, until the sender
    /// side is dropped.
    pub fn bind(self: &Arc<Self>, mut events: mpsc::Receiver<StoreEvent>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            info!("Event stream bound");
            while let Some(event) = events.recv().await {
                store.apply(event);
            }
            info!("Event stream closed");
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn load_message(&self, jid: &str, id: &str) -> Option<MessageRecord> {
        lock(&self.messages).get(jid, id)
    }

    /// Receipts of a cached message.
    pub fn fetch_receipts(&self, key: &MessageKey) -> Option<Vec<UserReceipt>> {
        let jid = key.remote_jid.as_deref()?;
        let message = lock(&self.messages).get(jid, key.id.as_deref()?)?;
        Some(message.user_receipt)
    }

    /// Cached messages of a conversation in arrival order.
    pub fn messages(&self, jid: &str) -> Vec<MessageRecord> {
        lock(&self.messages).list(jid)
    }

    pub fn message_count(&self, jid: &str) -> usize {
        lock(&self.messages).count(jid)
    }

    pub fn chat(&self, id: &str) -> Option<ConversationSummary> {
        lock(&self.chats).get(id).cloned()
    }

    pub fn chats(&self) -> Vec<ConversationSummary> {
        lock(&self.chats).all()
    }

    pub fn contact(&self, id: &str) -> Option<Contact> {
        lock(&self.contacts).get(id).cloned()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        lock(&self.contacts).all()
    }

    pub fn group(&self, id: &str) -> Option<GroupMetadata> {
        lock(&self.groups).get(id).cloned()
    }

    pub fn groups(&self) -> Vec<GroupMetadata> {
        lock(&self.groups).all()
    }

    pub fn presence(&self, jid: &str) -> Option<HashMap<String, PresenceData>> {
        lock(&self.presences).get(jid).cloned()
    }

    /// Cached group metadata, refreshed from `source` when missing, stale or
    /// `force`d. On a failed refresh the error carries the cached snapshot.
    pub async fn fetch_group_metadata(
        &self,
        jid: &str,
        force: bool,
        source: &dyn GroupMetadataSource,
    ) -> Result<GroupMetadata> {
        let now_ms = Utc::now().timestamp_millis();
        let cached = {
            let groups = lock(&self.groups);
            if !groups.needs_refresh(jid, force, now_ms) {
                if let Some(group) = groups.get(jid) {
                    return Ok(group.clone());
                }
            }
            groups.get(jid).cloned()
        };

        debug!(jid, force, "Refreshing group metadata");
        let mut fresh = match source.group_metadata(jid).await {
            Ok(group) => group,
            Err(e) => {
                warn!(jid, error = %e, "Group metadata refresh failed");
                return Err(SyncError::GroupFetch {
                    jid: jid.to_string(),
                    cached: cached.map(Box::new),
                    source: e,
                });
            }
        };

        fresh.id = jid.to_string();
        let freshness = i64::try_from(self.config.group_freshness.as_secs()).unwrap_or(i64::MAX);
        fresh.expired_at = Some(Utc::now().timestamp().saturating_add(freshness));
        fresh.normalize_desc_time();

        lock(&self.groups).upsert(fresh.clone());
        self.writer.upsert_groups(vec![fresh.clone()]);
        Ok(fresh)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Wait until every durable write queued so far has been applied.
    pub async fn flush(&self) -> Result<()> {
        self.writer.flush().await
    }

    /// Stop the sweep, drain pending writes and release the backend.
    pub async fn close(&self) -> Result<()> {
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
        self.writer.shutdown().await?;
        info!("Store closed");
        Ok(())
    }
}

impl Drop for ChatStore {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

fn spawn_sweeper(
    messages: Arc<Mutex<MessageHistory>>,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let evicted = lock(&messages).purge_expired();
            if evicted > 0 {
                debug!(evicted, "Expired messages swept");
            }
        }
    })
}
