//! State-number bookkeeping for one replica.
//!
//! Each side numbers its own states and records what it has sent, what the
//! peer acknowledged and which peer state it holds.

use super::message::TemplateUpdate;
use crate::core::TransportVersion;

/// State numbers seen by one endpoint.
///
/// - `local`: number of the current local state
/// - `sent`: highest local number published to the peer
/// - `acked`: highest local number the peer confirmed
/// - `peer`: highest peer number received
#[derive(Debug, Clone, Default)]
pub struct UpdateTracker {
    local: u64,
    sent: u64,
    acked: u64,
    peer: u64,
    // `peer` has not been echoed back in an outgoing update yet
    peer_unconfirmed: bool,
}

impl UpdateTracker {
    /// Fresh tracker at state number 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current local state number.
    pub fn local_version(&self) -> u64 {
        self.local
    }

    /// Highest local number published.
    pub fn sent_version(&self) -> u64 {
        self.sent
    }

    /// Highest local number the peer confirmed.
    pub fn acked_version(&self) -> u64 {
        self.acked
    }

    /// Highest peer number received.
    pub fn peer_version(&self) -> u64 {
        self.peer
    }

    /// Local changes not yet published.
    pub fn has_pending_updates(&self) -> bool {
        self.local > self.sent
    }

    /// Peer state received but not yet confirmed back.
    pub fn needs_ack(&self) -> bool {
        self.peer_unconfirmed
    }

    /// Both directions confirmed.
    pub fn is_synchronized(&self) -> bool {
        self.acked == self.local && !self.needs_ack()
    }

    /// Advance the local state number.
    pub fn bump_version(&mut self) -> u64 {
        self.local += 1;
        self.local
    }

    /// Record publication of `version`.
    pub fn record_sent(&mut self, version: u64) {
        self.sent = self.sent.max(version);
        self.peer_unconfirmed = false;
    }

    /// Fold the peer's acknowledgment into the tracker.
    ///
    /// Returns `true` if the acknowledged number advanced.
    pub fn record_ack(&mut self, acked: u64) -> bool {
        if acked > self.acked {
            self.acked = acked;
            true
        } else {
            false
        }
    }

    /// Record that peer state `version` is now held locally.
    ///
    /// Returns `false` for stale or repeated numbers.
    pub fn record_peer(&mut self, version: u64) -> bool {
        if version > self.peer {
            self.peer = version;
            self.peer_unconfirmed = true;
            true
        } else {
            false
        }
    }

    /// Acknowledgment of the latest peer state.
    pub fn ack(&mut self, version: TransportVersion) -> TemplateUpdate {
        self.peer_unconfirmed = false;
        TemplateUpdate::ack(self.local, self.peer, version)
    }

    /// Back to state number 0 on both sides.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
