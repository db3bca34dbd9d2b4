// crates/snapqueue-sync/src/coordinator.rs
// ============================================================================
// Module: Snapqueue Sync Coordinator
// Description: Trigger management for the background sync worker.
// Purpose: Start passes on manual, periodic, and lifecycle triggers.
// Dependencies: tokio, snapqueue-core, thiserror
// ============================================================================

//! ## Overview
//! The coordinator owns the worker and every trigger that can start a pass:
//! - Manual: foreground envelopes arrive on a message channel; each
//!   `SYNC_NOW` spawns a pass, so overlapping requests produce overlapping
//!   passes.
//! - Periodic: an owned, stoppable timer task started with
//!   [`SyncCoordinator::start_periodic`]. Ticks while offline are skipped.
//! - Lifecycle: [`SyncCoordinator::activate`] runs a pass so records queued
//!   before the worker existed are drained.
//!
//! [`SyncCoordinator::request_pass`] runs a pass inline for deterministic tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use snapqueue_core::ProtocolEnvelope;
use snapqueue_core::ProtocolError;
use snapqueue_core::SyncMessage;
use snapqueue_core::runtime::protocol;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::connectivity::ConnectivityMonitor;
use crate::events::SyncEvent;
use crate::notify::SyncSubscription;
use crate::worker::PassReport;
use crate::worker::SyncError;
use crate::worker::SyncTrigger;
use crate::worker::SyncWorker;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned when posting messages to the coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Coordinator is gone.
    #[error("sync coordinator closed")]
    Closed,
    /// Raw message could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Sending side of the foreground-to-worker message channel.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    /// Message sender.
    sender: mpsc::UnboundedSender<ProtocolEnvelope>,
}

impl CoordinatorHandle {
    /// Posts a message at the current protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Closed`] when the coordinator is gone.
    pub fn post(&self, message: SyncMessage) -> Result<(), CoordinatorError> {
        self.sender.send(message.envelope()).map_err(|_| CoordinatorError::Closed)
    }

    /// Decodes and posts a JSON wire message.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when decoding fails or the coordinator is gone.
    pub fn post_raw(&self, raw: &str) -> Result<(), CoordinatorError> {
        let envelope = protocol::decode(raw)?;
        self.sender.send(envelope).map_err(|_| CoordinatorError::Closed)
    }
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Running background task with its stop signal.
struct TaskSlot<T> {
    /// Stop signal.
    stop: oneshot::Sender<()>,
    /// Task handle.
    task: JoinHandle<T>,
}

/// Message receiver shared between listener runs.
type MessageReceiver = mpsc::UnboundedReceiver<ProtocolEnvelope>;

/// Background sync coordinator.
pub struct SyncCoordinator {
    /// Shared worker.
    worker: Arc<SyncWorker>,
    /// Connectivity flag consulted by the periodic trigger.
    connectivity: ConnectivityMonitor,
    /// Message sender cloned into handles.
    sender: mpsc::UnboundedSender<ProtocolEnvelope>,
    /// Message receiver while no listener runs.
    receiver: Mutex<Option<MessageReceiver>>,
    /// Running message listener.
    listener: Mutex<Option<TaskSlot<MessageReceiver>>>,
    /// Running periodic trigger.
    periodic: Mutex<Option<TaskSlot<()>>>,
}

impl SyncCoordinator {
    /// Creates a coordinator around a worker.
    #[must_use]
    pub fn new(worker: SyncWorker, connectivity: ConnectivityMonitor) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            worker: Arc::new(worker),
            connectivity,
            sender,
            receiver: Mutex::new(Some(receiver)),
            listener: Mutex::new(None),
            periodic: Mutex::new(None),
        }
    }

    /// Returns a handle for posting foreground messages.
    #[must_use]
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            sender: self.sender.clone(),
        }
    }

    /// Subscribes to pass-complete notifications.
    #[must_use]
    pub fn subscribe(&self) -> SyncSubscription {
        self.worker.notifier().subscribe()
    }

    /// Returns the shared connectivity monitor.
    #[must_use]
    pub const fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Runs a pass inline and returns its report.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the pass is aborted.
    pub async fn request_pass(&self, trigger: SyncTrigger) -> Result<PassReport, SyncError> {
        self.worker.run_pass(trigger).await
    }

    /// Starts the message listener and runs the lifecycle pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the lifecycle pass is aborted; the listener
    /// keeps running so later triggers can retry.
    pub async fn activate(&self) -> Result<PassReport, SyncError> {
        self.start_listener();
        self.worker.run_pass(SyncTrigger::Lifecycle).await
    }

    /// Returns true while the message listener runs.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        lock(&self.listener).is_some()
    }

    /// Starts the periodic trigger; returns false when it is already running.
    pub fn start_periodic(&self) -> bool {
        let mut slot = lock(&self.periodic);
        if slot.is_some() {
            return false;
        }
        let worker = Arc::clone(&self.worker);
        let connectivity = self.connectivity.clone();
        let period = worker.policy().periodic_interval.max(Duration::from_millis(1));
        let (stop, mut stop_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if connectivity.is_online() {
                            let _ = worker.run_pass(SyncTrigger::Periodic).await;
                        } else {
                            worker.events().record(&SyncEvent::periodic_skipped_offline());
                        }
                    }
                }
            }
        });
        *slot = Some(TaskSlot {
            stop,
            task,
        });
        true
    }

    /// Stops the periodic trigger; returns false when it was not running.
    ///
    /// A pass already started by the timer finishes before this returns.
    pub async fn stop_periodic(&self) -> bool {
        let Some(slot) = lock(&self.periodic).take() else {
            return false;
        };
        let _ = slot.stop.send(());
        let _ = slot.task.await;
        true
    }

    /// Returns true while the periodic trigger runs.
    #[must_use]
    pub fn is_periodic_running(&self) -> bool {
        lock(&self.periodic).is_some()
    }

    /// Stops every trigger and waits for passes they started.
    pub async fn shutdown(&self) {
        self.stop_periodic().await;
        let Some(slot) = lock(&self.listener).take() else {
            return;
        };
        let _ = slot.stop.send(());
        if let Ok(receiver) = slot.task.await {
            *lock(&self.receiver) = Some(receiver);
        }
    }

    /// Starts the message listener if it is not running.
    fn start_listener(&self) {
        let mut slot = lock(&self.listener);
        if slot.is_some() {
            return;
        }
        let Some(receiver) = lock(&self.receiver).take() else {
            return;
        };
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(listen(Arc::clone(&self.worker), receiver, stop_rx));
        *slot = Some(TaskSlot {
            stop,
            task,
        });
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serves foreground messages until stopped; returns the receiver for reuse.
async fn listen(
    worker: Arc<SyncWorker>,
    mut receiver: MessageReceiver,
    mut stop: oneshot::Receiver<()>,
) -> MessageReceiver {
    let mut passes = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut stop => break,
            message = receiver.recv() => match message {
                Some(envelope) if envelope.message == SyncMessage::SyncNow => {
                    let worker = Arc::clone(&worker);
                    passes.spawn(async move {
                        let _ = worker.run_pass(SyncTrigger::Manual).await;
                    });
                }
                Some(envelope) => {
                    worker.events().record(&SyncEvent::message_rejected(&format!(
                        "unexpected message from foreground: {}",
                        envelope.message.tag()
                    )));
                }
                None => break,
            },
            Some(_) = passes.join_next(), if !passes.is_empty() => {}
        }
    }
    while passes.join_next().await.is_some() {}
    receiver
}

/// Locks a mutex, recovering the data from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
