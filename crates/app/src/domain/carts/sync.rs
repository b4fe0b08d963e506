//! Cross-context cart sync.
//!
//! Stores sharing one cart record connect to the same named channel. After
//! every committed change a store publishes a [`CartSyncMessage`]; the other
//! stores react by re-reading the record. Delivery is best-effort and in
//! process only.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};
use uuid::Uuid;

/// Messages buffered per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Notification that the shared cart record changed.
///
/// Serialises as `{"type": "CART_UPDATED", "timestamp": <ms>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartSyncMessage {
    CartUpdated { timestamp: i64 },
    CartCleared { timestamp: i64 },
}

impl CartSyncMessage {
    #[must_use]
    pub fn updated(at: Timestamp) -> Self {
        Self::CartUpdated {
            timestamp: at.as_millisecond(),
        }
    }

    #[must_use]
    pub fn cleared(at: Timestamp) -> Self {
        Self::CartCleared {
            timestamp: at.as_millisecond(),
        }
    }

    /// Milliseconds since the Unix epoch at which the change was published.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::CartUpdated { timestamp } | Self::CartCleared { timestamp } => *timestamp,
        }
    }
}

#[derive(Debug, Clone)]
struct Envelope {
    origin: Uuid,
    message: CartSyncMessage,
}

/// A named in-process topic shared by every store of one cart.
#[derive(Debug, Clone)]
pub struct CartSyncChannel {
    name: Arc<str>,
    sender: broadcast::Sender<Envelope>,
}

impl CartSyncChannel {
    /// Channel name used by the storefront.
    pub const DEFAULT_NAME: &'static str = "cart-sync";

    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            name: name.into(),
            sender,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Join the channel as a new participant.
    #[must_use]
    pub fn connect(&self) -> SyncEndpoint {
        SyncEndpoint {
            origin: Uuid::now_v7(),
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
        }
    }
}

impl Default for CartSyncChannel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

/// One participant's handle on a [`CartSyncChannel`].
#[derive(Debug, Clone)]
pub struct SyncEndpoint {
    origin: Uuid,
    name: Arc<str>,
    sender: broadcast::Sender<Envelope>,
}

impl SyncEndpoint {
    /// Identifier stamped on everything this endpoint publishes.
    #[must_use]
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Broadcast to every other participant.
    ///
    /// Never fails: a channel without listeners drops the message.
    pub fn publish(&self, message: CartSyncMessage) {
        let envelope = Envelope {
            origin: self.origin,
            message,
        };

        if self.sender.send(envelope).is_err() {
            trace!(channel = %self.name, ?message, "no sync listeners");
        }
    }

    /// Receive messages published by other participants.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            origin: self.origin,
            receiver: Some(self.sender.subscribe()),
        }
    }
}

/// Stream of messages from other participants.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    origin: Uuid,
    receiver: Option<broadcast::Receiver<Envelope>>,
}

impl Subscription {
    /// Wait for the next message from another participant.
    ///
    /// Returns `None` once unsubscribed or when the channel has closed. If the
    /// subscriber fell behind, the missed messages are skipped.
    pub async fn recv(&mut self) -> Option<CartSyncMessage> {
        let origin = self.origin;
        let receiver = self.receiver.as_mut()?;

        loop {
            match receiver.recv().await {
                Ok(envelope) if envelope.origin == origin => {}
                Ok(envelope) => return Some(envelope.message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cart sync subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving. Further calls to [`Subscription::recv`] return `None`.
    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }
}
