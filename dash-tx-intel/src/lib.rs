//! Dash transaction intelligence.
//!
//! Read-only analysis over the transactions a Dash wallet already holds:
//!
//! - [`category`]: the semantic category shown for each transaction
//! - [`filters`]: predicates that recognize specific payments
//! - [`coin_selection`]: strategies for choosing outputs to spend
//! - [`risk`]: finality of time-locked transactions while the wallet syncs
//! - [`wrapper`]: grouping of multi-step workflows into single entries
//!
//! Consensus types come from [`dashcore`]. Nothing here performs I/O.
//! Transactions and their confidence are owned by the wallet; this crate
//! reads snapshots of them.
//!
//! # Example
//!
//! ```
//! use dash_tx_intel::{CoinSelector, IntelConfig, WalletScripts, wrap_transactions};
//!
//! let config = IntelConfig::testnet();
//! config.validate().unwrap();
//!
//! let wrapped = wrap_transactions(&[], &config.wrapper_factories(), &WalletScripts::new()).unwrap();
//! assert!(wrapped.is_empty());
//!
//! let selection = CoinSelector::ZeroConf.select(1_000, &[]);
//! assert_eq!(selection.total_value, 0);
//! ```

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub mod category;
pub mod coin_selection;
pub mod coinjoin;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod filters;
pub mod risk;
pub mod transaction;
pub mod utxo;
pub mod wrapper;

pub use dashcore::{Address, Network};

pub use category::{Category, classify, classify_tag};
pub use coin_selection::{CoinSelector, FeeRate, SelectionResult};
pub use config::IntelConfig;
pub use error::{Error, Result};
pub use event_bus::{EventBus, EventReceiver};
pub use filters::TxFilter;
pub use risk::{
    ChainTip, LiveRiskAnalyzer, NetworkObservation, NetworkSnapshot, NetworkTimeTracker,
    OfflineRiskAnalyzer, RiskAnalyzer, RiskVerdict,
};
pub use transaction::{
    TransactionType, TxIn, TxOut, Txid, WalletOutputs, WalletScripts, WalletTransaction,
};
pub use utxo::Utxo;
pub use wrapper::{TxWrapper, WrappedTransactions, WrapperFactory, wrap_transactions};
