//! Daily grouping of CoinJoin mixing activity.

use crate::coinjoin::{CoinJoinTransactionType, classify_transaction};
use crate::transaction::{WalletOutputs, WalletTransaction};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// UTC day index of a UNIX timestamp.
pub fn day_of(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Whether `tx` is CoinJoin activity of the wallet owning `outputs`.
///
/// Mixing rounds carry other participants' funds. Every other CoinJoin shape
/// only moves the wallet's own funds, so it must be entirely internal.
pub fn is_wallet_coinjoin(tx: &WalletTransaction, outputs: &impl WalletOutputs) -> bool {
    match classify_transaction(tx) {
        CoinJoinTransactionType::None => false,
        CoinJoinTransactionType::Mixing => true,
        CoinJoinTransactionType::MakeCollateralInputs
        | CoinJoinTransactionType::CreateDenomination
        | CoinJoinTransactionType::CombineDust => tx.is_entirely_internal(outputs),
    }
}

/// CoinJoin transactions of one UTC day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinJoinTxSet<'a> {
    day: u64,
    members: Vec<&'a WalletTransaction>,
}

impl<'a> CoinJoinTxSet<'a> {
    pub fn new(day: u64) -> Self {
        Self {
            day,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> String {
        format!("coinjoin:{}", self.day)
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn transactions(&self) -> &[&'a WalletTransaction] {
        &self.members
    }

    pub fn try_include(&mut self, tx: &'a WalletTransaction, outputs: &impl WalletOutputs) -> bool {
        if self.members.iter().any(|member| member.txid == tx.txid) {
            return true;
        }
        if day_of(tx.timestamp) != self.day || !is_wallet_coinjoin(tx, outputs) {
            return false;
        }
        self.members.push(tx);
        true
    }
}

/// One set per day that has CoinJoin activity, in day order.
pub(crate) fn sets_for<'a>(
    all: &[&'a WalletTransaction],
    outputs: &impl WalletOutputs,
) -> Vec<CoinJoinTxSet<'a>> {
    let mut days: Vec<u64> = all
        .iter()
        .filter(|tx| is_wallet_coinjoin(tx, outputs))
        .map(|tx| day_of(tx.timestamp))
        .collect();
    days.sort_unstable();
    days.dedup();
    days.into_iter().map(CoinJoinTxSet::new).collect()
}
