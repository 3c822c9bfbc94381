//! Keeping exposed selector toggles mutually exclusive
//!
//! Two paths update the registry:
//!
//! - [`SelectorSyncPolicy::reconcile`] comes from a fresh query or a pushed
//!   update and is authoritative. It pushes the state of every selector to
//!   the sink.
//! - [`SelectorSyncPolicy::apply_command_result`] is the cheap path after a
//!   local command. It only touches the two selectors involved and is
//!   dropped entirely when a reconcile happened after the command started.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::registry::{SelectorEntry, SelectorRegistry};
use crate::resolver::SelectorIdentity;

/// Receives selector state changes, typically the host's toggle entities
///
/// Called while the policy holds its lock, so implementations must not call
/// back into the policy.
pub trait SelectorSink: Send + Sync {
    fn selector_changed(&self, entry: &SelectorEntry, active: bool);
}

/// Sink that drops every change
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SelectorSink for NullSink {
    fn selector_changed(&self, _entry: &SelectorEntry, _active: bool) {}
}

/// Proof of when a command started, see [`SelectorSyncPolicy::begin_command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CommandTicket {
    epoch: u64,
}

struct SyncState {
    registry: SelectorRegistry,
    epoch: u64,
}

pub struct SelectorSyncPolicy {
    state: Mutex<SyncState>,
    sink: Arc<dyn SelectorSink>,
}

impl std::fmt::Debug for SelectorSyncPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SelectorSyncPolicy")
            .field("registry", &state.registry)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

impl SelectorSyncPolicy {
    pub fn new(registry: SelectorRegistry, sink: Arc<dyn SelectorSink>) -> Self {
        Self {
            state: Mutex::new(SyncState { registry, epoch: 0 }),
            sink,
        }
    }

    /// Make `identity` the only active selector and publish every selector
    ///
    /// An identity with no registered selector leaves all of them inactive.
    pub fn reconcile(&self, identity: &SelectorIdentity) {
        let mut state = self.state.lock();
        state.epoch += 1;
        let previous = state.registry.set_active(identity);
        if previous != *identity {
            debug!(from = %previous, to = %identity, "Selector reconciled");
        } else {
            trace!(selector = %identity, "Selector unchanged");
        }

        for entry in state.registry.entries() {
            self.sink
                .selector_changed(entry, state.registry.is_active(&entry.identity));
        }
    }

    /// Device went to standby
    pub fn power_off(&self) {
        self.reconcile(&SelectorIdentity::None);
    }

    /// Record that a command is about to be sent
    pub fn begin_command(&self) -> CommandTicket {
        CommandTicket { epoch: self.state.lock().epoch }
    }

    /// Apply the outcome of a command without re-querying the device
    ///
    /// On success `previous` goes inactive and `new` active. A failed
    /// command, or one overtaken by a reconcile since `ticket` was taken,
    /// leaves the registry untouched. Returns whether anything was applied.
    pub fn apply_command_result(
        &self,
        ticket: CommandTicket,
        previous: &SelectorIdentity,
        new: &SelectorIdentity,
        success: bool,
    ) -> bool {
        if !success {
            debug!(selector = %new, "Command failed, selectors left for the next reconcile");
            return false;
        }

        let mut state = self.state.lock();
        if state.epoch != ticket.epoch {
            debug!(selector = %new, "Command result superseded by a reconcile");
            return false;
        }

        let replaced = state.registry.set_active(new);
        let mut switched_off = vec![previous];
        if replaced != *previous {
            switched_off.push(&replaced);
        }
        for identity in switched_off.into_iter().filter(|identity| *identity != new) {
            if let Some(entry) = state.registry.get(identity) {
                self.sink.selector_changed(entry, false);
            }
        }
        if let Some(entry) = state.registry.get(new) {
            self.sink.selector_changed(entry, true);
        }
        debug!(from = %previous, to = %new, "Selector switched by command");
        true
    }

    pub fn active(&self) -> SelectorIdentity {
        self.state.lock().registry.active_identity()
    }

    pub fn is_active(&self, identity: &SelectorIdentity) -> bool {
        self.state.lock().registry.is_active(identity)
    }

    pub fn entries(&self) -> Vec<SelectorEntry> {
        self.state.lock().registry.entries().to_vec()
    }

    pub fn contains(&self, identity: &SelectorIdentity) -> bool {
        self.state.lock().registry.contains(identity)
    }
}
