//! Boundary to the relay state machines
//!
//! The machines themselves run elsewhere; this module fixes what the bridge
//! needs from them and provides the listener registry they notify through.

use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::chain_map::ChainMaps;
use crate::session::GatewaySession;

/// Events the bridge sends into a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineEvent {
    /// Submit the mint for the active deposit
    Claim {
        #[serde(rename = "_msgSender")]
        msg_sender: String,
    },
    /// Give up on the session
    Expired,
    /// Re-check the session after a restore
    Restore,
}

/// State observed after a transition
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSnapshot {
    /// Top-level machine state, `None` before the first transition
    pub state: Option<String>,
    /// State of the active deposit's machine, if one exists
    pub deposit_state: Option<String>,
    pub session: GatewaySession,
}

pub type Listener = Arc<dyn Fn(&MachineSnapshot) + Send + Sync>;

/// A running relay state machine for one session
pub trait GatewayMachine: Send + Sync {
    fn state_value(&self) -> Option<String>;

    fn active_deposit_state(&self) -> Option<String>;

    fn session(&self) -> GatewaySession;

    fn send(&self, event: MachineEvent);

    /// Register for transition notifications, delivered in emission order
    fn subscribe(&self, listener: Listener) -> Subscription;

    fn stop(&self);

    fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            state: self.state_value(),
            deposit_state: self.active_deposit_state(),
            session: self.session(),
        }
    }
}

/// Creates machines for sessions
pub trait MachineFactory: Send + Sync {
    fn create(&self, session: GatewaySession, chain_maps: ChainMaps) -> Arc<dyn GatewayMachine>;
}

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Registry of transition listeners for machine implementations
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<ListenerSet>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Listener) -> Subscription {
        let mut set = match self.inner.lock() {
            Ok(set) => set,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = set.next_id;
        set.next_id += 1;
        set.entries.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Notify every listener in registration order
    pub fn emit(&self, snapshot: &MachineSnapshot) {
        // Listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<Listener> = match self.inner.lock() {
            Ok(set) => set.entries.iter().map(|(_, l)| l.clone()).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .entries
                .iter()
                .map(|(_, l)| l.clone())
                .collect(),
        };
        for listener in listeners {
            listener(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|set| set.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a registered listener; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerSet>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut set) = registry.lock() {
                set.entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
