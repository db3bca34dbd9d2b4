// crates/snapqueue-sync/src/connectivity.rs
// ============================================================================
// Module: Snapqueue Connectivity Monitor
// Description: Shared online/offline flag.
// Purpose: Let the capture flow and periodic trigger observe connectivity.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! The monitor is fed by whatever platform signal reports connectivity. It is
//! advisory: a pass started while "online" can still hit transport failures,
//! which leave records queued.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared connectivity flag.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    /// Current state publisher.
    sender: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns true when the device is believed to be online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Updates the connectivity state; returns true when it changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_online_reports_changes_only() {
        let monitor = ConnectivityMonitor::new(false);
        let shared = monitor.clone();
        assert!(!monitor.is_online());
        assert!(monitor.set_online(true));
        assert!(!monitor.set_online(true));
        assert!(shared.is_online());
        assert!(shared.set_online(false));
        assert!(!monitor.is_online());
    }
}
