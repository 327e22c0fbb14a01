//! One visible transaction row: its machine and its persistence listener
//!
//! Mounting a record restores a session, starts a machine on it and mirrors
//! every transition into the store (exactly one write per transition).
//! Unmounting releases the listener and stops the machine.

use std::sync::Arc;

use cafe_core::{Direction, ProtocolError};

use crate::chain_map::ChainMaps;
use crate::machine::{GatewayMachine, MachineEvent, MachineFactory, MachineSnapshot, Subscription};
use crate::mapper::{to_record, to_session};
use crate::record::TransactionRecord;
use crate::status::{self, AwaitingLabel};
use crate::store::TransactionStore;

pub struct TxProcessor {
    id: String,
    direction: Direction,
    machine: Arc<dyn GatewayMachine>,
    subscription: Option<Subscription>,
}

impl TxProcessor {
    pub fn mount(
        record: &TransactionRecord,
        factory: &dyn MachineFactory,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        let session = to_session(record);
        let direction = session.direction;
        let machine = factory.create(session, ChainMaps::for_direction(direction));

        let id = record.id.clone();
        let listener_id = id.clone();
        let subscription = machine.subscribe(Arc::new(move |snapshot: &MachineSnapshot| {
            persist_transition(store.as_ref(), &listener_id, snapshot);
        }));

        tracing::debug!(%id, %direction, "Mounted transaction");
        Self {
            id,
            direction,
            machine,
            subscription: Some(subscription),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn awaiting(&self) -> AwaitingLabel {
        status::resolve(&self.machine.snapshot())
    }

    /// The record as the row currently shows it
    pub fn view(&self) -> TransactionRecord {
        let snapshot = self.machine.snapshot();
        to_record(&snapshot.session, status::resolve(&snapshot), false)
    }

    /// Ask the active deposit's machine to submit the mint
    pub fn claim(&self, msg_sender: impl Into<String>) -> Result<(), ProtocolError> {
        if self.direction != Direction::Mint {
            return Err(ProtocolError::ActionNotAllowed {
                reason: "only mints can be claimed".into(),
            });
        }
        if self.machine.active_deposit_state().is_none() {
            return Err(ProtocolError::MissingData {
                field: "active deposit",
            });
        }
        self.machine.send(MachineEvent::Claim {
            msg_sender: msg_sender.into(),
        });
        Ok(())
    }

    pub fn expire(&self) {
        self.machine.send(MachineEvent::Expired);
    }

    /// Release the listener and stop the machine
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            self.machine.stop();
            tracing::debug!(id = %self.id, "Unmounted transaction");
        }
    }
}

impl Drop for TxProcessor {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn persist_transition(store: &dyn TransactionStore, id: &str, snapshot: &MachineSnapshot) {
    let mut record = to_record(&snapshot.session, status::resolve(snapshot), false);
    if let Some(stored) = store.get(id) {
        record.carry_record_fields(&stored);
    }
    if let Err(e) = store.update(record) {
        tracing::warn!(%id, error = %e, "Failed to persist transition");
    }
}
