//! Transaction lifecycle actions
//!
//! The user-triggered steps of a conversion that happen outside the relay
//! machines: creating records, finalizing a signed mint (behind the
//! exchange-rate guard), submitting a burn and following the destination
//! transaction until it confirms or reverts.

use std::sync::Arc;

use cafe_core::{DestAsset, Direction, TxHash};
use curve::PoolQuoter;

use crate::chain_map::{mint_then_swap, swap_then_burn, ChainMapError};
use crate::eth::{ContractSubmitter, EthChain, SubmitError};
use crate::fee::FeeStore;
use crate::guard::{check_completion, GuardError, GuardOutcome, RevertPrompt};
use crate::mapper::to_session;
use crate::record::TransactionRecord;
use crate::status::AwaitingLabel;
use crate::store::{StoreError, TransactionStore};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    ChainMap(#[from] ChainMapError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("RPC error: {0}")]
    Rpc(#[from] cafe_core::RpcError),

    #[error("Transaction {id} is a {actual}, expected a {expected}")]
    WrongDirection {
        id: String,
        expected: Direction,
        actual: Direction,
    },

    #[error("Transaction {id} not found")]
    NotFound { id: String },

    #[error("Transaction {id} has not failed, nothing to retry")]
    NotRetryable { id: String },
}

impl LifecycleError {
    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::Duplicate { .. }) => "duplicate",
            Self::Store(StoreError::NotFound { .. }) | Self::NotFound { .. } => "not_found",
            Self::Store(StoreError::Poisoned) => "internal_error",
            Self::Guard(GuardError::MissingRelayResponse) => "not_signed",
            Self::Guard(GuardError::MissingExchangeRate) => "exchange_rate_unavailable",
            Self::Guard(_) => "guard_failed",
            Self::ChainMap(_) => "invalid_params",
            Self::Submit(_) => "submission_failed",
            Self::Rpc(_) => "rpc_error",
            Self::WrongDirection { .. } => "wrong_direction",
            Self::NotRetryable { .. } => "not_retryable",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Store(StoreError::Duplicate { .. })
            | Self::Guard(GuardError::MissingRelayResponse)
            | Self::NotRetryable { .. } => 409,
            Self::Store(StoreError::NotFound { .. }) | Self::NotFound { .. } => 404,
            Self::WrongDirection { .. } => 400,
            Self::ChainMap(_) | Self::Guard(GuardError::Calc(_)) => 422,
            Self::Guard(GuardError::MissingExchangeRate) => 503,
            Self::Submit(_) | Self::Rpc(_) => 502,
            Self::Store(StoreError::Poisoned) | Self::Guard(GuardError::Store(_)) => 500,
        }
    }
}

/// Result of finalizing a mint
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Mint submitted; the record now awaits Ethereum confirmations
    Submitted {
        record: TransactionRecord,
        hash: TxHash,
    },
    /// The exchange-rate guard stopped the mint
    Halted {
        record: TransactionRecord,
        prompt: RevertPrompt,
    },
}

pub struct TransactionLifecycle {
    store: Arc<dyn TransactionStore>,
    fees: Arc<FeeStore>,
    pool: Arc<dyn PoolQuoter>,
    chain: Arc<dyn EthChain>,
    submitter: Arc<dyn ContractSubmitter>,
}

impl TransactionLifecycle {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        fees: Arc<FeeStore>,
        pool: Arc<dyn PoolQuoter>,
        chain: Arc<dyn EthChain>,
        submitter: Arc<dyn ContractSubmitter>,
    ) -> Self {
        Self {
            store,
            fees,
            pool,
            chain,
            submitter,
        }
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    /// Persist a new mint; the relay machine takes it from here
    pub fn init_convert_to_ethereum(&self, record: TransactionRecord) -> Result<(), LifecycleError> {
        expect_direction(&record, Direction::Mint)?;
        tracing::info!(id = %record.id, amount = record.amount, "New mint");
        self.store.add(record)?;
        Ok(())
    }

    /// Check the rate and submit `mintThenSwap` for a signed deposit.
    ///
    /// `prompt` fires when the guard halts. A submission failure marks the
    /// record errored (it can be retried) and is returned as an error.
    pub async fn complete_convert_to_ethereum(
        &self,
        record: &TransactionRecord,
        approve_swapped_asset: Option<DestAsset>,
        prompt: impl FnOnce(RevertPrompt) + Send,
    ) -> Result<CompletionOutcome, LifecycleError> {
        expect_direction(record, Direction::Mint)?;
        let fees = self.fees.fees().await.ok();

        let outcome = check_completion(
            record,
            approve_swapped_asset,
            fees.as_ref(),
            self.pool.as_ref(),
            self.store.as_ref(),
            prompt,
        )
        .await?;

        let (tx, new_min) = match outcome {
            GuardOutcome::Halted { record, prompt } => {
                return Ok(CompletionOutcome::Halted { record, prompt });
            }
            GuardOutcome::Proceed {
                record,
                new_min_exchange_rate,
                ..
            } => (record, new_min_exchange_rate),
        };

        match self.submit_mint(&tx, new_min).await {
            Ok(hash) => {
                let record = self.store.update(TransactionRecord {
                    dest_tx_hash: Some(hash.to_string()),
                    awaiting: AwaitingLabel::EthSettle,
                    error: false,
                    ..tx
                })?;
                Ok(CompletionOutcome::Submitted { record, hash })
            }
            Err(e) => {
                tracing::error!(id = %tx.id, error = %e, error_hint = "error submitting mint", "Mint submission failed");
                self.store.update(TransactionRecord { error: true, ..tx })?;
                Err(e)
            }
        }
    }

    async fn submit_mint(&self, tx: &TransactionRecord, new_min: f64) -> Result<TxHash, LifecycleError> {
        let response = tx
            .ren_response
            .as_ref()
            .ok_or(GuardError::MissingRelayResponse)?;
        let signature = tx
            .ren_signature
            .as_deref()
            .ok_or(ChainMapError::MissingField {
                field: "renSignature",
            })?;

        let call = mint_then_swap(&to_session(tx), Some(new_min))?.with_mint_proof(
            response.amount,
            &response.nhash,
            signature,
        );
        let data = call.encode()?;
        Ok(self
            .submitter
            .submit(&tx.local_web3_address, &call.send_to, data)
            .await?)
    }

    /// Submit `swapThenBurn`, adding the record first if it is new.
    ///
    /// An existing burn is only resubmitted when its stored copy is errored;
    /// the error flag is cleared first.
    pub async fn init_convert_from_ethereum(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, LifecycleError> {
        expect_direction(&record, Direction::Burn)?;

        let record = match self.store.get(&record.id) {
            None => {
                self.store.add(record.clone())?;
                record
            }
            Some(stored) if stored.error => self.store.update(TransactionRecord {
                error: false,
                ..stored
            })?,
            Some(stored) => return Err(LifecycleError::NotRetryable { id: stored.id }),
        };

        let submitted = async {
            let call = swap_then_burn(&to_session(&record))?;
            let data = call.encode()?;
            Ok::<_, LifecycleError>(
                self.submitter
                    .submit(&record.local_web3_address, &call.send_to, data)
                    .await?,
            )
        }
        .await;

        match submitted {
            Ok(hash) => {
                tracing::info!(id = %record.id, %hash, "Burn submitted");
                Ok(self.store.update(TransactionRecord {
                    awaiting: AwaitingLabel::EthSettle,
                    source_tx_hash: Some(hash.to_string()),
                    error: false,
                    ..record
                })?)
            }
            Err(e) => {
                tracing::error!(id = %record.id, error = %e, error_hint = "error submitting burn", "Burn submission failed");
                self.store.update(TransactionRecord {
                    error: true,
                    ..record
                })?;
                Err(e)
            }
        }
    }

    /// Follow a mint's destination transaction.
    ///
    /// Returns the updated record when something changed, `None` when there
    /// is nothing to check or the transaction has no confirmations yet.
    pub async fn check_minting_tx(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<TransactionRecord>, LifecycleError> {
        let Some(hash) = record.dest_tx_hash.as_deref().filter(|h| !h.is_empty()) else {
            return Ok(None);
        };
        let hash = TxHash::new(hash);

        let Some(details) = self.chain.get_transaction(&hash).await? else {
            tracing::warn!(id = %record.id, %hash, "Destination transaction unknown");
            return Ok(Some(self.store.update(TransactionRecord {
                error: true,
                ..record.clone()
            })?));
        };

        let confs = self.chain.confirmations(&details).await?;
        if confs == 0 {
            return Ok(None);
        }

        let Some(receipt) = self.chain.get_transaction_receipt(&hash).await? else {
            return Ok(None);
        };

        let updated = if receipt.reverted() {
            tracing::error!(id = %record.id, %hash, error_hint = "transaction reverted", "Destination transaction reverted");
            TransactionRecord {
                error: true,
                dest_tx_hash: None,
                ..record.clone()
            }
        } else {
            tracing::info!(id = %record.id, %hash, confs, "Destination transaction confirmed");
            TransactionRecord {
                dest_tx_confs: confs,
                awaiting: AwaitingLabel::Complete,
                error: false,
                ..record.clone()
            }
        };
        Ok(Some(self.store.update(updated)?))
    }

    /// Record the destination hash of a mint submitted elsewhere
    pub fn record_dest_tx(&self, id: &str, hash: TxHash) -> Result<TransactionRecord, LifecycleError> {
        let record = self.get(id)?;
        Ok(self.store.update(TransactionRecord {
            dest_tx_hash: Some(hash.to_string()),
            awaiting: AwaitingLabel::EthSettle,
            error: false,
            ..record
        })?)
    }

    /// Clear the error flag so the user can try again
    pub fn retry(&self, id: &str) -> Result<TransactionRecord, LifecycleError> {
        let record = self.get(id)?;
        if !record.error {
            return Err(LifecycleError::NotRetryable { id: record.id });
        }
        Ok(self.store.update(TransactionRecord {
            error: false,
            ..record
        })?)
    }

    fn get(&self, id: &str) -> Result<TransactionRecord, LifecycleError> {
        self.store.get(id).ok_or_else(|| LifecycleError::NotFound { id: id.to_string() })
    }
}

fn expect_direction(record: &TransactionRecord, expected: Direction) -> Result<(), LifecycleError> {
    let actual = Direction::from_source_asset(&record.source_asset);
    if actual != expected {
        return Err(LifecycleError::WrongDirection {
            id: record.id.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}
