//! Background destination transaction watcher
//!
//! Polls the mint chain for mints whose `mintThenSwap` has been submitted,
//! marking them complete once confirmed or errored when the transaction
//! reverts or disappears.

use std::time::Duration;

use cafe_api::AppState;
use cafe_core::Direction;
use renbridge::{AwaitingLabel, TransactionRecord};
use tokio::task::JoinHandle;

/// How a watched destination transaction resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKind {
    Confirmed,
    Reverted,
    Dropped,
}

pub struct DestWatcher {
    state: AppState,
    interval: Duration,
}

impl DestWatcher {
    pub fn new(state: AppState) -> Self {
        let interval = Duration::from_secs(state.config().watcher.poll_interval_secs.max(1));
        Self { state, interval }
    }

    /// Mints waiting on their destination transaction
    fn pending(&self) -> Vec<TransactionRecord> {
        self.state
            .store()
            .list(self.state.network())
            .into_iter()
            .filter(|tx| {
                tx.direction == Direction::Mint
                    && tx.awaiting == AwaitingLabel::EthSettle
                    && tx.has_dest_tx()
                    && !tx.error
            })
            .collect()
    }

    /// Check every pending mint once, returning the ids that resolved
    pub async fn poll(&self) -> Vec<(String, ResolvedKind)> {
        let mut resolved = Vec::new();

        for tx in self.pending() {
            let updated = match self.state.lifecycle().check_minting_tx(&tx).await {
                Ok(Some(updated)) => updated,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(id = %tx.id, "Destination check failed: {}", e);
                    continue;
                }
            };

            let kind = if updated.awaiting.is_complete() {
                ResolvedKind::Confirmed
            } else if updated.dest_tx_hash.is_none() {
                ResolvedKind::Reverted
            } else {
                ResolvedKind::Dropped
            };
            tracing::info!(
                id = %updated.id,
                tx_hash = tx.dest_tx_hash.as_deref().unwrap_or_default(),
                ?kind,
                "Destination transaction resolved"
            );
            resolved.push((updated.id, kind));
        }

        resolved
    }

    /// Run the poll loop until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!(interval_secs = self.interval.as_secs(), "DestWatcher started");
            loop {
                tokio::time::sleep(self.interval).await;
                self.poll().await;
            }
        })
    }
}
