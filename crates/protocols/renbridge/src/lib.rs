//! RenVM BTC <-> WBTC Bridge Lifecycle
//!
//! Lock BTC on Bitcoin, let the relay network mint renBTC on Ethereum and
//! swap it to WBTC through the Curve pool in one adapter call (`mintThenSwap`),
//! or go the other way with `swapThenBurn` and a release on Bitcoin.
//!
//! The relay state machines themselves are external. This crate supplies
//! what they consume and what is derived from them: the session mapping,
//! awaiting labels, fee and exchange-rate quotes, adapter call parameters and
//! the exchange-rate guard applied before a mint is finalized.

pub mod calculator;
pub mod chain_map;
pub mod constants;
pub mod eth;
pub mod fee;
pub mod guard;
pub mod lifecycle;
pub mod machine;
pub mod mapper;
pub mod processor;
pub mod record;
pub mod session;
pub mod status;
pub mod store;
pub mod validate;

pub use calculator::{final_deposit_exchange_rate, quote, CalcError, ConversionTotal, FeeQuote};
pub use chain_map::{
    mint_then_swap, swap_then_burn, ChainHandle, ChainMapError, ChainMaps, ChainTarget, ContractCall,
    ContractParam, ParamType,
};
pub use constants::{target_confs, SettlementChain};
pub use eth::{ContractSubmitter, EthChain, EthSubmitter, SubmitError};
pub use fee::{FeeError, FeeStore, LightnodeFeeSource, RelayFeeSource, RelayFees};
pub use guard::{check_completion, GuardError, GuardOutcome, RevertPrompt};
pub use lifecycle::{CompletionOutcome, LifecycleError, TransactionLifecycle};
pub use machine::{
    GatewayMachine, Listener, Listeners, MachineEvent, MachineFactory, MachineSnapshot, Subscription,
};
pub use mapper::{to_record, to_session};
pub use processor::TxProcessor;
pub use record::{RelayResponse, RelayUtxo, TransactionRecord, TxParams};
pub use session::{CustomParams, GatewayDeposit, GatewaySession};
pub use status::{resolve, resolve_burn, resolve_mint, AwaitingLabel};
pub use store::{sort_newest_first, MemoryStore, StoreError, TransactionStore};
pub use validate::validate_target_address;
