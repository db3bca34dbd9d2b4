// crates/snapqueue-sync/src/notify.rs
// ============================================================================
// Module: Snapqueue Sync Notifier
// Description: Publish/subscribe channel from the worker to foreground listeners.
// Purpose: Broadcast pass-complete notifications to every connected foreground.
// Dependencies: tokio, snapqueue-core
// ============================================================================

//! ## Overview
//! Notifications are cues to re-read state, not deltas. A listener that falls
//! behind skips the missed envelopes and receives the next one; publishing
//! with no listeners is not an error.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::error::TryRecvError;

use snapqueue_core::ProtocolEnvelope;
use snapqueue_core::SyncMessage;

/// Default number of buffered notifications per listener.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 64;

/// Broadcast publisher of protocol envelopes.
#[derive(Debug, Clone)]
pub struct SyncNotifier {
    /// Broadcast sender.
    sender: broadcast::Sender<ProtocolEnvelope>,
}

impl SyncNotifier {
    /// Creates a notifier buffering up to `capacity` envelopes per listener.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
        }
    }

    /// Publishes a message to every listener; returns the number reached.
    pub fn publish(&self, message: SyncMessage) -> usize {
        self.sender.send(message.envelope()).unwrap_or(0)
    }

    /// Subscribes a new listener.
    #[must_use]
    pub fn subscribe(&self) -> SyncSubscription {
        SyncSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for SyncNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_CAPACITY)
    }
}

/// Listener handle for worker notifications.
#[derive(Debug)]
pub struct SyncSubscription {
    /// Broadcast receiver.
    receiver: broadcast::Receiver<ProtocolEnvelope>,
}

impl SyncSubscription {
    /// Waits for the next envelope; returns `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<ProtocolEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next buffered envelope without waiting.
    pub fn try_recv(&mut self) -> Option<ProtocolEnvelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits until a pass-complete notification arrives.
    pub async fn wait_for_sync_complete(&mut self) -> Option<ProtocolEnvelope> {
        while let Some(envelope) = self.recv().await {
            if envelope.message == SyncMessage::SyncComplete {
                return Some(envelope);
            }
        }
        None
    }
}
