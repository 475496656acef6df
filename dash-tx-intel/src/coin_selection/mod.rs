//! Coin selection strategies for building spends.
//!
//! Selectors never mutate the candidates and never fail: when the candidates
//! cannot cover the target, the result holds whatever was gathered and the
//! caller compares `total_value` with what it needed.

pub mod fee;

use core::cmp::Reverse;

use dashcore::Address;
use tracing::{debug, trace};

use crate::coinjoin;
use crate::transaction::pays_to;
use crate::utxo::{Utxo, total_value};

pub use fee::FeeRate;

/// Result of UTXO selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    /// Selected UTXOs
    pub selected: Vec<Utxo>,
    /// Value available to the spend
    pub total_value: u64,
}

impl SelectionResult {
    fn from_selected(selected: Vec<Utxo>) -> Self {
        let total_value = total_value(&selected);
        Self {
            selected,
            total_value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// UTXO selection strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CoinSelector {
    /// Spend whatever is spendable now, unconfirmed outputs included.
    ///
    /// Prefers deeper outputs, then larger ones, and stops once the target is
    /// covered.
    #[default]
    ZeroConf,
    /// A fixed set chosen by the caller; the target is ignored.
    Exact(Vec<Utxo>),
    /// Only outputs paying this address.
    ByAddress(Address),
    /// Sweep every candidate, reporting the spendable value after fees.
    MaxMinusFee(FeeRate),
    /// Only denominated outputs that completed `rounds` mixing rounds.
    CoinJoin {
        rounds: u32,
    },
    /// Sweep the mixed outputs, reporting the spendable value after fees.
    CoinJoinMaxMinusFee {
        fee_rate: FeeRate,
        rounds: u32,
    },
}

impl CoinSelector {
    /// Select candidates toward `target` duffs.
    pub fn select(&self, target: u64, candidates: &[Utxo]) -> SelectionResult {
        let result = match self {
            CoinSelector::ZeroConf => accumulate(target, candidates.iter()),
            CoinSelector::Exact(utxos) => SelectionResult::from_selected(utxos.clone()),
            CoinSelector::ByAddress(address) => {
                let owned = candidates.iter().filter(|utxo| pays_to(&utxo.txout, address));
                accumulate(target, owned)
            }
            CoinSelector::MaxMinusFee(fee_rate) => max_minus_fee(*fee_rate, candidates.iter()),
            CoinSelector::CoinJoin {
                rounds,
            } => accumulate(target, candidates.iter().filter(|utxo| coinjoin::is_mixed(utxo, *rounds))),
            CoinSelector::CoinJoinMaxMinusFee {
                fee_rate,
                rounds,
            } => {
                let mixed = CoinSelector::CoinJoin {
                    rounds: *rounds,
                }
                .select(target, candidates);
                trace!(
                    "Mixed selection gathered {} outputs worth {} duffs",
                    mixed.selected.len(),
                    mixed.total_value
                );
                max_minus_fee(*fee_rate, mixed.selected.iter())
            }
        };

        if result.total_value < target && !matches!(self, CoinSelector::Exact(_)) {
            debug!(
                "Selection covers {} of {} duffs with {} outputs",
                result.total_value,
                target,
                result.selected.len()
            );
        }
        result
    }
}

/// Zero-conf accumulation over the unlocked candidates.
fn accumulate<'a>(target: u64, candidates: impl Iterator<Item = &'a Utxo>) -> SelectionResult {
    let mut available: Vec<&Utxo> = candidates.filter(|utxo| !utxo.is_locked).collect();
    available.sort_by_key(|utxo| (Reverse(utxo.confirmations), Reverse(utxo.value()), utxo.outpoint));

    let mut selected = Vec::new();
    let mut total = 0u64;
    for utxo in available {
        if total >= target {
            break;
        }
        total += utxo.value();
        selected.push(utxo.clone());
    }

    SelectionResult {
        selected,
        total_value: total,
    }
}

/// Every unlocked candidate, valued at its sum minus the fee of sweeping it
/// into one output.
fn max_minus_fee<'a>(fee_rate: FeeRate, candidates: impl Iterator<Item = &'a Utxo>) -> SelectionResult {
    let selected: Vec<Utxo> = candidates.filter(|utxo| !utxo.is_locked).cloned().collect();
    let size = fee::estimate_max_spend_size(selected.len());
    let fee = fee_rate.calculate_fee(size);
    let total_value = total_value(&selected).saturating_sub(fee);
    trace!("Sweeping {} outputs, {} bytes, fee {}", selected.len(), size, fee);
    SelectionResult {
        selected,
        total_value,
    }
}
