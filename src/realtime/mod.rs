//! Viewer channel registry and broadcast fan-out.
//!
//! One registered channel per connected WebSocket viewer. Each channel is an
//! unbounded mpsc sender; the connection's writer loop drains the receiver
//! onto the socket. Sends never block, so the registry lock is held only for
//! registration (including the snapshot fetch, which keeps connect atomic
//! with respect to broadcasts), deregistration, and the enqueue pass of a
//! broadcast — never across network I/O. A channel whose receiver is gone
//! fails its send and is deregistered on the spot without disturbing delivery
//! to the rest.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::board::error::BoardError;
use crate::board::model::BoardMessage;

pub type ChannelId = u64;

#[derive(Default)]
pub struct ChannelRegistry {
    next_id: AtomicU64,
    channels: Mutex<HashMap<ChannelId, mpsc::UnboundedSender<String>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new viewer channel, seeded with a freshly fetched snapshot.
    ///
    /// `fetch_snapshot` runs while the registry lock is held, which makes the
    /// read-and-register pair atomic with respect to `broadcast`: a mutation
    /// either commits before the fetch (so the snapshot contains it) or its
    /// broadcast queues after registration (so the channel receives the
    /// delta). Either way a late joiner observes the snapshot strictly before
    /// any delta it was not already reflecting.
    pub async fn connect<F, Fut>(
        &self,
        fetch_snapshot: F,
    ) -> Result<(ChannelId, mpsc::UnboundedReceiver<String>), BoardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BoardMessage, BoardError>>,
    {
        let mut channels = self.channels.lock().await;
        let snapshot = fetch_snapshot().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(snapshot.to_json());
        channels.insert(id, tx);
        debug!(channel = id, viewers = channels.len(), "viewer connected");
        Ok((id, rx))
    }

    /// Deregister a channel. Idempotent — unknown ids are a no-op.
    pub async fn disconnect(&self, id: ChannelId) {
        let mut channels = self.channels.lock().await;
        if channels.remove(&id).is_some() {
            debug!(channel = id, viewers = channels.len(), "viewer disconnected");
        }
    }

    /// Deliver `message` to every registered channel.
    ///
    /// Delivery is independent per channel: a failed send (receiver dropped)
    /// deregisters that channel as a side effect and never interrupts
    /// delivery to the others.
    pub async fn broadcast(&self, message: &BoardMessage) {
        let json = message.to_json();
        let mut channels = self.channels.lock().await;
        channels.retain(|id, tx| {
            let alive = tx.send(json.clone()).is_ok();
            if !alive {
                debug!(channel = *id, "dead channel reaped during broadcast");
            }
            alive
        });
    }

    /// Number of currently registered channels.
    pub async fn connected(&self) -> usize {
        self.channels.lock().await.len()
    }
}
