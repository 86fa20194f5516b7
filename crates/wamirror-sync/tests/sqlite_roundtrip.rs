//! End-to-end checks of the store against the SQLite backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use wamirror_shared::{
    ChatPatch, Contact, ConversationSummary, GroupMetadata, GroupParticipant, MessageKey,
    MessageRecord, ParticipantAction, StoreEvent, UpsertKind,
};
use wamirror_sync::{ChatStore, GroupMetadataSource, SyncConfig, SyncError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_in(dir: &TempDir) -> SyncConfig {
    SyncConfig {
        database_path: Some(dir.path().join("mirror.db")),
        ..SyncConfig::default()
    }
}

struct FakeServer {
    calls: AtomicUsize,
    online: bool,
}

#[async_trait]
impl GroupMetadataSource for FakeServer {
    async fn group_metadata(&self, jid: &str) -> anyhow::Result<GroupMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(self.online, "connection closed");
        let mut group = GroupMetadata::new(jid, "Book club");
        group.participants = vec![GroupParticipant::new("1@s.whatsapp.net")];
        group.size = Some(1);
        Ok(group)
    }
}

#[tokio::test]
async fn test_state_survives_restart() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
        let mut chat = ConversationSummary::new("123@s.whatsapp.net");
        chat.conversation_timestamp = Some(1000);
        chat.unread_count = Some(3);
        store.apply(StoreEvent::ChatsUpsert(vec![chat]));

        let mut delta = ChatPatch::new("123@s.whatsapp.net");
        delta.unread_count = Some(2);
        store.apply(StoreEvent::ChatsUpdate(vec![delta]));

        let mut contact = Contact::new("123@s.whatsapp.net");
        contact.notify = Some("Ana".into());
        store.apply(StoreEvent::ContactsUpsert(vec![contact]));

        let mut group = GroupMetadata::new("g1@g.us", "Team");
        group.participants = vec![GroupParticipant::new("1@s.whatsapp.net")];
        store.apply(StoreEvent::GroupsUpsert(vec![group]));
        store.apply(StoreEvent::GroupParticipantsUpdate {
            id: "g1@g.us".into(),
            participants: vec![GroupParticipant::new("2@s.whatsapp.net")],
            action: ParticipantAction::Add,
        });

        store.apply(StoreEvent::MessagesUpsert {
            messages: vec![MessageRecord {
                key: MessageKey::new("123@s.whatsapp.net", "m1", false),
                message_timestamp: Some(1001),
                ..Default::default()
            }],
            kind: UpsertKind::Append,
        });

        store.close().await.unwrap();
    }

    let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
    let chat = store.chat("123@s.whatsapp.net").unwrap();
    assert_eq!(chat.unread_count, Some(5));
    assert_eq!(chat.conversation_timestamp, Some(1000));
    assert_eq!(
        store.contact("123@s.whatsapp.net").unwrap().notify.as_deref(),
        Some("Ana")
    );
    let group = store.group("g1@g.us").unwrap();
    assert_eq!(group.participants.len(), 2);
    assert_eq!(group.size, Some(2));

    // Messages are volatile.
    assert_eq!(store.load_message("123@s.whatsapp.net", "m1"), None);
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_undated_chat_survives_restart() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
        store.apply(StoreEvent::ChatsUpsert(vec![ConversationSummary::new(
            "a@s.whatsapp.net",
        )]));
        assert!(store.chat("a@s.whatsapp.net").is_some());
        store.close().await.unwrap();
    }

    let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
    let chat = store.chat("a@s.whatsapp.net").unwrap();
    assert_eq!(chat.conversation_timestamp, None);
    assert_eq!(store.chats().len(), 1);
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_bound_stream_and_chat_delete() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ChatStore::open_sqlite(config_in(&dir)).await.unwrap());

    let (tx, rx) = mpsc::channel(16);
    let task = store.bind(rx);

    tx.send(StoreEvent::MessagesUpsert {
        messages: vec![MessageRecord {
            key: MessageKey::new("123@s.whatsapp.net", "m1", false),
            message_timestamp: Some(1000),
            ..Default::default()
        }],
        kind: UpsertKind::Notify,
    })
    .await
    .unwrap();
    tx.send(StoreEvent::ChatsDelete(vec!["123@s.whatsapp.net".into()]))
        .await
        .unwrap();
    drop(tx);
    task.await.unwrap();

    assert!(store.chat("123@s.whatsapp.net").is_none());
    assert_eq!(store.message_count("123@s.whatsapp.net"), 1);
    store.close().await.unwrap();

    let reopened = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
    assert!(reopened.chats().is_empty());
}

#[tokio::test]
async fn test_group_metadata_refresh_is_persisted() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let server = FakeServer {
        calls: AtomicUsize::new(0),
        online: true,
    };

    {
        let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
        let group = store
            .fetch_group_metadata("g7@g.us", false, &server)
            .await
            .unwrap();
        assert_eq!(group.subject, "Book club");
        store.close().await.unwrap();
    }

    // Still fresh after a restart: served without a remote call.
    let store = ChatStore::open_sqlite(config_in(&dir)).await.unwrap();
    let offline = FakeServer {
        calls: AtomicUsize::new(0),
        online: false,
    };
    let cached = store
        .fetch_group_metadata("g7@g.us", false, &offline)
        .await
        .unwrap();
    assert_eq!(cached.subject, "Book club");
    assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
    assert_eq!(server.calls.load(Ordering::SeqCst), 1);

    let err = store
        .fetch_group_metadata("g7@g.us", true, &offline)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::GroupFetch { .. }));
    assert_eq!(err.cached_group().unwrap().subject, "Book club");
}
