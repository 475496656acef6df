//! Spendable output candidates handed to coin selection.
//!
//! The caller decides which outputs are eligible (for example excluding
//! outputs already reserved by another spend); this type only carries what the
//! selectors need to rank and filter them.

use core::cmp::Ordering;

use dashcore::{Address, Network};

use crate::transaction::{OutPoint, TxOut, output_address};

/// Unspent Transaction Output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Utxo {
    /// The outpoint (txid + vout)
    pub outpoint: OutPoint,
    /// The transaction output
    pub txout: TxOut,
    /// Confirmation depth of the creating transaction, zero while pending
    pub confirmations: u32,
    /// Whether the creating transaction has an InstantLock
    pub is_instantlocked: bool,
    /// Whether this UTXO is locked (not available for spending)
    pub is_locked: bool,
    /// Completed CoinJoin rounds, `None` for outputs that never went through mixing
    pub coinjoin_rounds: Option<u32>,
}

impl Utxo {
    /// Create a new, unconfirmed UTXO
    pub fn new(outpoint: OutPoint, txout: TxOut) -> Self {
        Self {
            outpoint,
            txout,
            confirmations: 0,
            is_instantlocked: false,
            is_locked: false,
            coinjoin_rounds: None,
        }
    }

    /// Get the value of this UTXO in duffs
    pub fn value(&self) -> u64 {
        self.txout.value
    }

    /// Destination of the output, when its script is a recognized template
    pub fn address(&self, network: Network) -> Option<Address> {
        output_address(&self.txout, network)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }

    /// Lock this UTXO to prevent it from being selected
    pub fn lock(&mut self) {
        self.is_locked = true;
    }

    /// Unlock this UTXO to allow it to be selected
    pub fn unlock(&mut self) {
        self.is_locked = false;
    }
}

impl Ord for Utxo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.outpoint.cmp(&other.outpoint)
    }
}

impl PartialOrd for Utxo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sum of candidate values.
pub fn total_value<'a>(utxos: impl IntoIterator<Item = &'a Utxo>) -> u64 {
    utxos.into_iter().map(Utxo::value).sum()
}
