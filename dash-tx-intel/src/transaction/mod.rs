//! Wallet-side view of a transaction.
//!
//! The consensus transaction is the registry [`dashcore::Transaction`]; the
//! wallet adds what it learned around it: the outputs its inputs spend (once
//! downloaded), its net value, the time it was seen and its [`Confidence`].
//! Only the confidence changes after a transaction was observed, and the
//! wallet hands this crate a fresh snapshot when it does.

mod confidence;

pub use confidence::{Confidence, ConfidenceSource, ConfidenceType};
pub use dashcore::blockdata::transaction::TransactionType;
pub use dashcore::{OutPoint, ScriptBuf, Transaction, TxIn, TxOut, Txid};

use std::collections::HashSet;

use dashcore::{Address, Network};

/// Sequence number that disables lock time for an input.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// When set in an input's sequence, the input carries no relative lock.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// Lock times below this value are block heights, above it UNIX timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Absolute lock carried by a time-locked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTime {
    /// Not valid before this block height.
    Height(u32),
    /// Not valid before this UNIX time.
    Time(u32),
}

/// Whether `output` locks its value to `address`.
pub fn pays_to(output: &TxOut, address: &Address) -> bool {
    output.script_pubkey == address.script_pubkey()
}

/// Destination of `output`, when its script is a standard template.
pub fn output_address(output: &TxOut, network: Network) -> Option<Address> {
    Address::from_script(&output.script_pubkey, network).ok()
}

/// Which outputs belong to the wallet.
///
/// Ownership can be discovered after a transaction was first seen, so values
/// derived from it are recomputed on every call.
pub trait WalletOutputs {
    fn is_mine(&self, output: &TxOut) -> bool;
}

impl<F> WalletOutputs for F
where
    F: Fn(&TxOut) -> bool,
{
    fn is_mine(&self, output: &TxOut) -> bool {
        self(output)
    }
}

/// A fixed set of scripts the wallet watches.
#[derive(Debug, Clone, Default)]
pub struct WalletScripts {
    scripts: HashSet<ScriptBuf>,
}

impl WalletScripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, script: ScriptBuf) {
        self.scripts.insert(script);
    }

    pub fn insert_address(&mut self, address: &Address) {
        self.scripts.insert(address.script_pubkey());
    }
}

impl FromIterator<Address> for WalletScripts {
    fn from_iter<T: IntoIterator<Item = Address>>(iter: T) -> Self {
        let mut scripts = Self::new();
        for address in iter {
            scripts.insert_address(&address);
        }
        scripts
    }
}

impl WalletOutputs for WalletScripts {
    fn is_mine(&self, output: &TxOut) -> bool {
        self.scripts.contains(&output.script_pubkey)
    }
}

/// A transaction touching the wallet, as observed by the wallet layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalletTransaction {
    /// The transaction
    pub transaction: Transaction,
    /// Transaction ID, hashed once on construction
    pub txid: Txid,
    /// Output spent by each input, by input index, once downloaded
    connected_outputs: Vec<Option<TxOut>>,
    /// Net value to the wallet in duffs, as computed by the wallet
    pub value: i64,
    /// UNIX seconds the wallet associates with the transaction
    pub timestamp: u64,
    pub confidence: Confidence,
}

impl WalletTransaction {
    /// Wrap a transaction seen at `timestamp`, with no input resolved yet.
    pub fn new(transaction: Transaction, timestamp: u64) -> Self {
        let txid = transaction.txid();
        let connected_outputs = vec![None; transaction.input.len()];
        Self {
            transaction,
            txid,
            connected_outputs,
            value: 0,
            timestamp,
            confidence: Confidence::pending(),
        }
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Record the output spent by input `index`. Returns `false` when there
    /// is no such input.
    pub fn connect_input(&mut self, index: usize, output: TxOut) -> bool {
        match self.connected_outputs.get_mut(index) {
            Some(slot) => {
                *slot = Some(output);
                true
            }
            None => false,
        }
    }

    /// Resolve every input spending an output of `parent`; returns how many
    /// were connected.
    pub fn connect_to(&mut self, parent: &WalletTransaction) -> usize {
        let mut connected = 0;
        for (input, slot) in self.transaction.input.iter().zip(self.connected_outputs.iter_mut()) {
            if input.previous_output.txid != parent.txid {
                continue;
            }
            if let Some(output) = parent.outputs().get(input.previous_output.vout as usize) {
                *slot = Some(output.clone());
                connected += 1;
            }
        }
        connected
    }

    pub fn inputs(&self) -> &[TxIn] {
        &self.transaction.input
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.transaction.output
    }

    /// The output spent by input `index`, if the wallet has it.
    pub fn connected_output(&self, index: usize) -> Option<&TxOut> {
        self.connected_outputs.get(index).and_then(Option::as_ref)
    }

    /// Source outputs of the resolved inputs, in input order.
    pub fn connected_outputs(&self) -> impl Iterator<Item = &TxOut> {
        self.connected_outputs.iter().flatten()
    }

    /// Whether every input has its source output.
    pub fn is_fully_connected(&self) -> bool {
        self.connected_outputs.iter().all(Option::is_some)
    }

    pub fn is_coinbase(&self) -> bool {
        self.transaction.is_coin_base()
            || matches!(self.transaction.tx_type(), TransactionType::Coinbase)
    }

    /// The type tag used for classification.
    pub fn protocol_type(&self) -> TransactionType {
        if self.is_coinbase() {
            TransactionType::Coinbase
        } else {
            self.transaction.tx_type()
        }
    }

    /// A non-zero lock time with at least one input leaving it enabled.
    pub fn is_time_locked(&self) -> bool {
        self.transaction.lock_time != 0
            && self.inputs().iter().any(|input| input.sequence != SEQUENCE_FINAL)
    }

    /// Whether any input uses a BIP68 relative lock.
    pub fn has_relative_lock_time(&self) -> bool {
        self.transaction.version >= 2
            && self.inputs().iter().any(|input| input.sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG == 0)
    }

    /// The absolute lock, if the transaction is time locked.
    pub fn lock_time_kind(&self) -> Option<LockTime> {
        let lock_time = self.transaction.lock_time;
        if !self.is_time_locked() {
            None
        } else if lock_time < LOCKTIME_THRESHOLD {
            Some(LockTime::Height(lock_time))
        } else {
            Some(LockTime::Time(lock_time))
        }
    }

    /// Consensus finality of the absolute lock for a block at `height` and
    /// `block_time`.
    pub fn is_final(&self, height: u32, block_time: u64) -> bool {
        match self.lock_time_kind() {
            None => true,
            Some(LockTime::Height(lock)) => lock < height,
            Some(LockTime::Time(lock)) => u64::from(lock) < block_time,
        }
    }

    /// Sum of all outputs.
    pub fn output_value(&self) -> u64 {
        self.outputs().iter().map(|o| o.value).sum()
    }

    /// Fee paid, known only when every input is resolved.
    pub fn fee(&self) -> Option<u64> {
        let mut input_value = 0u64;
        for source in &self.connected_outputs {
            input_value += source.as_ref()?.value;
        }
        input_value.checked_sub(self.output_value())
    }

    /// Value of this transaction to a wallet owning `outputs`.
    pub fn value_for(&self, outputs: &impl WalletOutputs) -> i64 {
        let received: u64 =
            self.outputs().iter().filter(|o| outputs.is_mine(o)).map(|o| o.value).sum();
        let sent: u64 =
            self.connected_outputs().filter(|o| outputs.is_mine(o)).map(|o| o.value).sum();
        received as i64 - sent as i64
    }

    /// Every input spends a wallet output and every output pays the wallet.
    pub fn is_entirely_internal(&self, outputs: &impl WalletOutputs) -> bool {
        !self.connected_outputs.is_empty()
            && self.connected_outputs.iter().all(|o| o.as_ref().is_some_and(|o| outputs.is_mine(o)))
            && self.outputs().iter().all(|o| outputs.is_mine(o))
    }

    /// Address of the first input whose resolved source output is a standard
    /// template.
    pub fn first_input_address(&self, network: Network) -> Option<Address> {
        self.connected_outputs().find_map(|o| output_address(o, network))
    }
}
