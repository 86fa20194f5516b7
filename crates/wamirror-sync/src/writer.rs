//! Write-behind worker that owns the durable backend.
//!
//! The event path only enqueues [`PersistCommand`]s on an unbounded channel;
//! a blocking task applies them in order. A failed write is logged and the
//! worker moves on, so durable state may lag memory but never blocks it.

use std::sync::Mutex;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use wamirror_shared::{Contact, ConversationSummary, GroupMetadata, PersistResult, Persistence};

use crate::error::{Result, SyncError};

/// Commands accepted by the write-behind worker.
#[derive(Debug)]
pub enum PersistCommand {
    UpsertChats(Vec<ConversationSummary>),
    DeleteChat(String),
    ClearChats,
    UpsertContacts(Vec<Contact>),
    UpsertGroups(Vec<GroupMetadata>),
    /// Acknowledged once every earlier command has been applied.
    Flush(oneshot::Sender<()>),
    /// Stop after acknowledging; later commands are rejected.
    Shutdown(oneshot::Sender<()>),
}

impl PersistCommand {
    fn name(&self) -> &'static str {
        match self {
            PersistCommand::UpsertChats(_) => "upsert_chats",
            PersistCommand::DeleteChat(_) => "delete_chat",
            PersistCommand::ClearChats => "clear_chats",
            PersistCommand::UpsertContacts(_) => "upsert_contacts",
            PersistCommand::UpsertGroups(_) => "upsert_groups",
            PersistCommand::Flush(_) => "flush",
            PersistCommand::Shutdown(_) => "shutdown",
        }
    }
}

pub struct WriteBehind {
    tx: mpsc::UnboundedSender<PersistCommand>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WriteBehind {
    /// Move `backend` onto a blocking worker. Must be called inside a tokio
    /// runtime.
    pub fn spawn(backend: Box<dyn Persistence>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || run(backend, rx));
        Self {
            tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Enqueue a command without waiting for it.
    pub fn send(&self, cmd: PersistCommand) {
        if let Err(e) = self.tx.send(cmd) {
            warn!(command = e.0.name(), "Write-behind worker stopped, dropping write");
        }
    }

    pub fn upsert_chats(&self, chats: Vec<ConversationSummary>) {
        if !chats.is_empty() {
            self.send(PersistCommand::UpsertChats(chats));
        }
    }

    pub fn delete_chat(&self, id: impl Into<String>) {
        self.send(PersistCommand::DeleteChat(id.into()));
    }

    pub fn clear_chats(&self) {
        self.send(PersistCommand::ClearChats);
    }

    pub fn upsert_contacts(&self, contacts: Vec<Contact>) {
        if !contacts.is_empty() {
            self.send(PersistCommand::UpsertContacts(contacts));
        }
    }

    pub fn upsert_groups(&self, groups: Vec<GroupMetadata>) {
        if !groups.is_empty() {
            self.send(PersistCommand::UpsertGroups(groups));
        }
    }

    /// Wait until every command queued so far has been applied (or failed).
    pub async fn flush(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(PersistCommand::Flush(reply))
            .map_err(|_| SyncError::WriterStopped)?;
        done.await.map_err(|_| SyncError::WriterStopped)
    }

    /// Drain the queue and stop the worker, releasing the backend.
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let (reply, done) = oneshot::channel();
        if self.tx.send(PersistCommand::Shutdown(reply)).is_ok() {
            let _ = done.await;
        }
        handle.await?;
        Ok(())
    }
}

fn run(backend: Box<dyn Persistence>, mut rx: mpsc::UnboundedReceiver<PersistCommand>) {
    debug!("Write-behind worker started");
    while let Some(cmd) = rx.blocking_recv() {
        let name = cmd.name();
        match cmd {
            PersistCommand::Flush(reply) => {
                let _ = reply.send(());
            }
            PersistCommand::Shutdown(reply) => {
                rx.close();
                let _ = reply.send(());
                break;
            }
            other => {
                if let Err(e) = apply(backend.as_ref(), other) {
                    warn!(command = name, error = %e, "Durable write failed");
                }
            }
        }
    }
    info!("Write-behind worker stopped");
}

fn apply(backend: &dyn Persistence, cmd: PersistCommand) -> PersistResult<()> {
    match cmd {
        PersistCommand::UpsertChats(chats) => backend.upsert_chats(&chats),
        PersistCommand::DeleteChat(id) => backend.delete_chat(&id).map(|_| ()),
        PersistCommand::ClearChats => backend.clear_chats(),
        PersistCommand::UpsertContacts(contacts) => backend.upsert_contacts(&contacts),
        PersistCommand::UpsertGroups(groups) => backend.upsert_groups(&groups),
        PersistCommand::Flush(_) | PersistCommand::Shutdown(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let backend = MemoryBackend::default();
        let writer = WriteBehind::spawn(Box::new(backend.clone()));

        writer.upsert_chats(vec![ConversationSummary::new("a@s.whatsapp.net")]);
        writer.upsert_chats(vec![ConversationSummary::new("b@s.whatsapp.net")]);
        writer.delete_chat("a@s.whatsapp.net");
        writer.flush().await.unwrap();

        let ids: Vec<_> = backend.chats().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b@s.whatsapp.net"]);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_stop_worker() {
        let backend = MemoryBackend::default();
        let writer = WriteBehind::spawn(Box::new(backend.clone()));

        backend.fail_writes(true);
        writer.upsert_contacts(vec![Contact::new("1@s.whatsapp.net")]);
        writer.flush().await.unwrap();
        backend.fail_writes(false);
        writer.upsert_contacts(vec![Contact::new("2@s.whatsapp.net")]);
        writer.flush().await.unwrap();

        let ids: Vec<_> = backend.contacts().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["2@s.whatsapp.net"]);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_later_flush() {
        let writer = WriteBehind::spawn(Box::new(MemoryBackend::default()));
        writer.shutdown().await.unwrap();
        writer.shutdown().await.unwrap();

        assert!(matches!(writer.flush().await, Err(SyncError::WriterStopped)));
    }
}
