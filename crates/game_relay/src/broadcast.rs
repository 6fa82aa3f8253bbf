//! Fan-out of relay messages to registered connections.
//!
//! Every call works on a registry snapshot taken when the call starts. A
//! connection that closes mid fan-out may still get the frame queued (its
//! writer discards it) or miss it; delivery is best effort either way.

use crate::connection::{ConnectionRegistry, RegistryEntry};
use crate::types::ConnectionId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a single fan-out call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose queue accepted the frame
    pub delivered: usize,
    /// Recipients that could not take the frame
    pub failed: usize,
}

/// Sends serialized messages to the current membership of a registry.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Sends `message` to every registered connection except `sender`.
    pub fn broadcast_to_others(&self, sender: ConnectionId, message: &str) -> BroadcastReport {
        self.broadcast_to(|entry| entry.connection.id() != sender, message, "others")
    }

    /// Sends `message` to every registered connection.
    pub fn broadcast_to_all(&self, message: &str) -> BroadcastReport {
        self.broadcast_to(|_| true, message, "all")
    }

    fn broadcast_to(
        &self,
        filter: impl Fn(&RegistryEntry) -> bool,
        message: &str,
        label: &str,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for entry in self.registry.snapshot() {
            if !filter(&entry) {
                continue;
            }
            match entry.connection.send_text(message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        conn_id = entry.connection.id(),
                        player_id = %entry.player_id,
                        label,
                        error = %e,
                        "failed to deliver frame to recipient"
                    );
                }
            }
        }

        debug!(
            label,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast frame"
        );
        report
    }
}
