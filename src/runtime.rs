//! Runtime for processing chat events
//!
//! Events for one chat are handled strictly in order by a per-chat worker
//! task; different chats proceed concurrently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ChatRuntime, RuntimeError};
pub use traits::*;

use crate::state_machine::Notification;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ChatRuntime<DatabaseStorage, crate::telegram::DeliveryQueue>;

/// Workers with nothing to do for this long shut down
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

const WORKER_QUEUE_DEPTH: usize = 32;

/// How the user interacted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Free-text message
    Text,
    /// Pressed inline control
    Button,
}

/// Transport-neutral inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Transport identifier of the update, for log correlation
    pub update_id: i64,
    pub chat_id: i64,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub kind: EventKind,
    pub payload: String,
    /// Set for button presses that expect an acknowledgement
    pub callback_id: Option<String>,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Handled { notifications: Vec<Notification> },
    Ignored,
}

/// Manager for per-chat workers
pub struct RuntimeManager<S, N>
where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    runtime: Arc<ChatRuntime<S, N>>,
    workers: Arc<RwLock<HashMap<i64, mpsc::Sender<InboundEvent>>>>,
    idle_timeout: Duration,
}

impl<S, N> RuntimeManager<S, N>
where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    pub fn new(runtime: Arc<ChatRuntime<S, N>>, idle_timeout: Duration) -> Self {
        Self {
            runtime,
            workers: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Number of chats with a live worker
    pub async fn active_workers(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Get or create the worker queue for a chat
    async fn get_or_create(&self, chat_id: i64) -> mpsc::Sender<InboundEvent> {
        {
            let workers = self.workers.read().await;
            if let Some(tx) = workers.get(&chat_id) {
                if !tx.is_closed() {
                    return tx.clone();
                }
            }
        }

        let mut workers = self.workers.write().await;
        if let Some(tx) = workers.get(&chat_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        workers.insert(chat_id, tx.clone());
        drop(workers);

        let runtime = Arc::clone(&self.runtime);
        let registry = Arc::clone(&self.workers);
        let idle_timeout = self.idle_timeout;
        tokio::spawn(async move {
            run_worker(chat_id, rx, runtime, registry, idle_timeout).await;
        });

        tracing::debug!(chat_id, "Started chat worker");
        tx
    }
}

async fn run_worker<S, N>(
    chat_id: i64,
    mut rx: mpsc::Receiver<InboundEvent>,
    runtime: Arc<ChatRuntime<S, N>>,
    registry: Arc<RwLock<HashMap<i64, mpsc::Sender<InboundEvent>>>>,
    idle_timeout: Duration,
) where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => {
                runtime.handle(event).await;
            }
            Ok(None) => break,
            Err(_) => {
                // Deregister under the write lock so no new sender can be
                // handed out, then drain anything that raced in
                let mut workers = registry.write().await;
                if rx.is_empty() {
                    workers.remove(&chat_id);
                    rx.close();
                    break;
                }
            }
        }
    }

    while let Ok(event) = rx.try_recv() {
        runtime.handle(event).await;
    }
    tracing::debug!(chat_id, "Chat worker stopped");
}

#[async_trait]
impl<S, N> EventDispatcher for RuntimeManager<S, N>
where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    async fn dispatch(&self, event: InboundEvent) -> Result<(), String> {
        let mut event = event;
        // A worker may shut down between lookup and send; one respawn covers it
        for _ in 0..2 {
            let tx = self.get_or_create(event.chat_id).await;
            match tx.send(event).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => event = returned,
            }
        }
        Err(format!("No worker available for chat {}", event.chat_id))
    }
}
