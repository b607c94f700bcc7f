//! Replica of a diffable value shared with one peer.
//!
//! A replica publishes its local changes as diffs against the last state the
//! peer confirmed, falling back to a full value when the peer holds nothing
//! usable. Incoming diffs are only applied on top of the exact peer state
//! they were computed against.
//!
//! At most one update is in flight. Local changes made meanwhile are held
//! back until the peer acknowledges it, then published as one diff against
//! the acknowledged state. An update lost in transit is recovered with
//! [`TemplateReplica::resync`].

use super::message::{MessageError, TemplateUpdate, UpdateKind};
use super::tracker::UpdateTracker;
use crate::core::{ApplyError, DecodeError, Diffable, TransportVersion};
use crate::template::Template;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors from processing updates.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Framing error.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Payload could not be decoded.
    #[error("payload decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Diff could not be applied.
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),
}

/// Outcome of [`TemplateReplica::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// Local copy replaced or patched.
    Updated,
    /// Acknowledgment only.
    AckOnly,
    /// Already held this peer state.
    Duplicate,
}

/// One side of a replicated value.
///
/// Generic over any [`Diffable`]; templates are the default.
#[derive(Debug)]
pub struct TemplateReplica<S: Diffable = Template> {
    tracker: UpdateTracker,
    state: S,
    /// Local state the peer confirmed, with its number. `None` forces a full update.
    acked_snapshot: Option<(u64, S)>,
    /// Last published state awaiting acknowledgment.
    in_flight: Option<(u64, S)>,
    /// Dialect the peer speaks.
    peer_transport: TransportVersion,
}

impl<S: Diffable> TemplateReplica<S> {
    /// Replica whose peer already holds `initial` as state 0.
    pub fn new(initial: S, peer_transport: TransportVersion) -> Self {
        Self {
            tracker: UpdateTracker::new(),
            acked_snapshot: Some((0, initial.clone())),
            state: initial,
            in_flight: None,
            peer_transport,
        }
    }

    /// Replica whose peer holds nothing; the first update is a full value.
    pub fn unsynced(initial: S, peer_transport: TransportVersion) -> Self {
        let mut replica = Self::new(initial, peer_transport);
        replica.acked_snapshot = None;
        replica.tracker.bump_version();
        replica
    }

    /// Current local value.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// State-number bookkeeping.
    pub fn tracker(&self) -> &UpdateTracker {
        &self.tracker
    }

    /// Dialect used for outgoing payloads.
    pub fn peer_transport(&self) -> TransportVersion {
        self.peer_transport
    }

    /// Replace the local value; returns the new local state number.
    pub fn update(&mut self, state: S) -> u64 {
        self.state = state;
        self.tracker.bump_version()
    }

    /// Forget what the peer holds so the next update is a full value.
    ///
    /// Used after the peer rejected a diff or changed dialect.
    pub fn resync(&mut self, peer_transport: TransportVersion) {
        self.peer_transport = peer_transport;
        self.acked_snapshot = None;
        self.in_flight = None;
        self.tracker.bump_version();
    }

    /// True if [`TemplateReplica::next_update`] would return an update.
    pub fn has_pending(&self) -> bool {
        (self.in_flight.is_none() && self.tracker.has_pending_updates()) || self.tracker.needs_ack()
    }

    /// Next update to send, if any.
    ///
    /// Returns only acknowledgments while a published update is unacknowledged.
    pub fn next_update(&mut self) -> Option<TemplateUpdate> {
        if self.in_flight.is_some() || !self.tracker.has_pending_updates() {
            return self
                .tracker
                .needs_ack()
                .then(|| self.tracker.ack(self.peer_transport));
        }

        let local = self.tracker.local_version();
        let peer = self.tracker.peer_version();
        let version = self.peer_transport;
        let update = match &self.acked_snapshot {
            Some((base_num, base)) => {
                let diff = self.state.diff_from(base);
                let payload = if S::is_diff_empty(&diff) {
                    Vec::new()
                } else {
                    S::encode_diff(&diff, version)
                };
                debug!(type_id = S::TYPE_ID, local, base = base_num, %version, "publishing diff");
                TemplateUpdate::diff(local, peer, *base_num, version, payload)
            }
            None => {
                debug!(type_id = S::TYPE_ID, local, %version, "publishing full value");
                TemplateUpdate::full(local, peer, version, self.state.encode_full(version))
            }
        };

        self.tracker.record_sent(local);
        self.in_flight = Some((local, self.state.clone()));
        Some(update)
    }

    /// Apply an incoming update.
    pub fn process(&mut self, update: &TemplateUpdate) -> Result<ProcessResult, SyncError> {
        self.absorb_ack(update.acked_state_num);

        if update.kind == UpdateKind::Ack {
            return Ok(ProcessResult::AckOnly);
        }
        if update.sender_state_num <= self.tracker.peer_version() {
            trace!(sender = update.sender_state_num, "duplicate update ignored");
            return Ok(ProcessResult::Duplicate);
        }

        match update.kind {
            UpdateKind::Full => {
                self.state = S::decode_full(&update.payload, update.version)?;
            }
            UpdateKind::Diff => {
                let held = self.tracker.peer_version();
                if update.base_state_num != held {
                    return Err(ApplyError::VersionMismatch {
                        expected: held,
                        actual: update.base_state_num,
                    }
                    .into());
                }
                if !update.payload.is_empty() {
                    let diff = S::decode_diff(&update.payload, update.version)?;
                    self.state = self.state.apply_diff(&diff)?;
                }
            }
            UpdateKind::Ack => {}
        }

        self.tracker.record_peer(update.sender_state_num);
        debug!(type_id = S::TYPE_ID, peer = update.sender_state_num, kind = ?update.kind, "applied update");
        Ok(ProcessResult::Updated)
    }

    /// Decode and apply an incoming frame.
    pub fn process_bytes(&mut self, data: &[u8]) -> Result<ProcessResult, SyncError> {
        let update = TemplateUpdate::decode(data)?;
        self.process(&update)
    }

    fn absorb_ack(&mut self, acked: u64) {
        if !self.tracker.record_ack(acked) {
            return;
        }
        if let Some((num, _)) = &self.in_flight {
            if *num <= acked {
                self.acked_snapshot = self.in_flight.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResettableValue;
    use crate::core::constants::{CURRENT, LIFECYCLE_ENABLED_FLAG};
    use crate::metadata::{DataStreamOptionsTemplate, Settings};

    fn settings(replicas: i64) -> Template {
        Template::builder()
            .settings(Some(Settings::builder().put("index.number_of_replicas", replicas).build()))
            .build()
            .unwrap()
    }

    fn exchange(from: &mut TemplateReplica, to: &mut TemplateReplica) -> ProcessResult {
        let update = from.next_update().unwrap();
        to.process_bytes(&update.encode()).unwrap()
    }

    #[test]
    fn test_diff_publication() {
        let mut leader = TemplateReplica::new(settings(0), CURRENT);
        let mut follower = TemplateReplica::new(settings(0), CURRENT);
        assert!(leader.next_update().is_none());

        leader.update(settings(1));
        let update = leader.next_update().unwrap();
        assert_eq!(update.kind, UpdateKind::Diff);
        assert_eq!(update.base_state_num, 0);

        assert_eq!(follower.process(&update).unwrap(), ProcessResult::Updated);
        assert_eq!(follower.state(), &settings(1));
        assert_eq!(follower.process(&update).unwrap(), ProcessResult::Duplicate);

        assert_eq!(exchange(&mut follower, &mut leader), ProcessResult::AckOnly);
        assert_eq!(leader.tracker().acked_version(), 1);
        assert!(leader.tracker().is_synchronized());

        leader.update(settings(2));
        let update = leader.next_update().unwrap();
        assert_eq!(update.base_state_num, 1);
        follower.process(&update).unwrap();
        assert_eq!(follower.state(), &settings(2));
    }

    #[test]
    fn test_unsynced_peer_gets_full_value() {
        let mut leader = TemplateReplica::unsynced(settings(3), CURRENT);
        let mut follower = TemplateReplica::new(Template::with_basics(None, None, None), CURRENT);

        let update = leader.next_update().unwrap();
        assert_eq!(update.kind, UpdateKind::Full);
        follower.process(&update).unwrap();
        assert_eq!(follower.state(), &settings(3));
    }

    #[test]
    fn test_changes_wait_for_ack() {
        let mut leader = TemplateReplica::new(settings(0), CURRENT);
        let mut follower = TemplateReplica::new(settings(0), CURRENT);

        leader.update(settings(1));
        let first = leader.next_update().unwrap();
        leader.update(settings(2));
        assert!(!leader.has_pending());
        assert!(leader.next_update().is_none());

        follower.process(&first).unwrap();
        assert_eq!(exchange(&mut follower, &mut leader), ProcessResult::AckOnly);

        assert!(leader.has_pending());
        let second = leader.next_update().unwrap();
        assert_eq!(second.kind, UpdateKind::Diff);
        assert_eq!(second.base_state_num, 1);
        follower.process(&second).unwrap();
        assert_eq!(follower.state(), &settings(2));
    }

    #[test]
    fn test_diff_on_wrong_base_rejected() {
        let mut follower = TemplateReplica::new(settings(0), CURRENT);
        let stray = TemplateUpdate::diff(5, 0, 3, CURRENT, Vec::new());

        let err = follower.process(&stray).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Apply(ApplyError::VersionMismatch { expected: 0, actual: 3 })
        ));
        assert_eq!(follower.tracker().peer_version(), 0);
    }

    #[test]
    fn test_resync_resends_full_value() {
        let mut leader = TemplateReplica::new(settings(0), CURRENT);
        let mut follower = TemplateReplica::new(settings(0), CURRENT);

        leader.update(settings(1));
        let _lost = leader.next_update().unwrap();
        leader.update(settings(2));
        assert!(leader.next_update().is_none());

        leader.resync(CURRENT);
        let full = leader.next_update().unwrap();
        assert_eq!(full.kind, UpdateKind::Full);
        follower.process(&full).unwrap();
        assert_eq!(follower.state(), &settings(2));
    }

    #[test]
    fn test_old_peer_keeps_unknown_fields() {
        let base = settings(0);
        let mut leader = TemplateReplica::new(base.clone(), LIFECYCLE_ENABLED_FLAG);
        let mut follower = TemplateReplica::new(base.clone(), CURRENT);

        let changed = Template::builder_from(Some(&base))
            .resettable_data_stream_options(ResettableValue::Defined(
                DataStreamOptionsTemplate::failure_store_enabled(true),
            ))
            .build()
            .unwrap();
        leader.update(changed);

        exchange(&mut leader, &mut follower);
        assert!(follower.state().resettable_data_stream_options().is_undefined());
    }

    #[test]
    fn test_empty_diff_still_advances() {
        let mut leader = TemplateReplica::new(settings(0), CURRENT);
        let mut follower = TemplateReplica::new(settings(0), CURRENT);

        leader.update(settings(0));
        let update = leader.next_update().unwrap();
        assert!(update.payload.is_empty());
        assert_eq!(follower.process(&update).unwrap(), ProcessResult::Updated);
        assert_eq!(follower.tracker().peer_version(), 1);
    }
}
