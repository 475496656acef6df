//! Grouping of related transactions into workflow wrappers.
//!
//! A wrapper collects the transactions of one multi-step process (a CrowdNode
//! sign-up, a day of CoinJoin mixing) so the wallet can show them as a single
//! entry. Wrappers hold references into the caller's transaction snapshot and
//! are rebuilt from scratch by [`wrap_transactions`] after every rescan.

pub mod coinjoin;
pub mod crowdnode;

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet};

use dashcore::Network;
use tracing::{debug, error};

pub use self::coinjoin::CoinJoinTxSet;
pub use self::crowdnode::{CrowdNodeSignUpTxSet, SignUpStep};
use crate::error::{Error, Result};
use crate::transaction::{Txid, WalletOutputs, WalletTransaction};

/// A workflow instance and the transactions it accepted.
#[derive(Debug, Clone)]
pub enum TxWrapper<'a> {
    CrowdNodeSignUp(CrowdNodeSignUpTxSet<'a>),
    CoinJoinMixing(CoinJoinTxSet<'a>),
}

impl<'a> TxWrapper<'a> {
    /// Stable identity, derived from what started the workflow.
    pub fn id(&self) -> String {
        match self {
            TxWrapper::CrowdNodeSignUp(set) => set.id(),
            TxWrapper::CoinJoinMixing(set) => set.id(),
        }
    }

    /// Members in the order they were accepted.
    pub fn transactions(&self) -> &[&'a WalletTransaction] {
        match self {
            TxWrapper::CrowdNodeSignUp(set) => set.transactions(),
            TxWrapper::CoinJoinMixing(set) => set.transactions(),
        }
    }

    pub fn contains(&self, txid: &Txid) -> bool {
        self.transactions().iter().any(|tx| tx.txid == *txid)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions().is_empty()
    }

    /// Timestamp of the earliest member.
    pub fn grouped_date(&self) -> Option<u64> {
        self.transactions().iter().map(|tx| tx.timestamp).min()
    }

    /// Net value of all members to a wallet owning `outputs`.
    ///
    /// Computed on every call since ownership can change after wrapping.
    pub fn value(&self, outputs: &impl WalletOutputs) -> i64 {
        self.transactions().iter().map(|tx| tx.value_for(outputs)).sum()
    }

    /// Offer `tx` to the workflow; returns whether it now belongs to it.
    pub fn try_include(&mut self, tx: &'a WalletTransaction, outputs: &impl WalletOutputs) -> bool {
        match self {
            TxWrapper::CrowdNodeSignUp(set) => set.try_include(tx),
            TxWrapper::CoinJoinMixing(set) => set.try_include(tx, outputs),
        }
    }
}

/// Creates the wrappers of one workflow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperFactory {
    /// One wrapper per CrowdNode sign-up request.
    CrowdNodeSignUp {
        network: Network,
    },
    /// One wrapper per UTC day with CoinJoin activity.
    CoinJoin,
}

impl WrapperFactory {
    /// Scan `all` for transactions that start a workflow of this type.
    pub fn create_wrappers<'a>(
        &self,
        all: &[&'a WalletTransaction],
        outputs: &impl WalletOutputs,
    ) -> Vec<TxWrapper<'a>> {
        match self {
            WrapperFactory::CrowdNodeSignUp {
                network,
            } => all
                .iter()
                .filter_map(|tx| CrowdNodeSignUpTxSet::from_seed(*network, tx))
                .map(TxWrapper::CrowdNodeSignUp)
                .collect(),
            WrapperFactory::CoinJoin => {
                coinjoin::sets_for(all, outputs).into_iter().map(TxWrapper::CoinJoinMixing).collect()
            }
        }
    }
}

/// Result of [`wrap_transactions`].
#[derive(Debug, Clone, Default)]
pub struct WrappedTransactions<'a> {
    /// Non-empty wrappers, in factory order.
    pub wrappers: Vec<TxWrapper<'a>>,
    /// Transactions no wrapper accepted, in processing order.
    pub ungrouped: Vec<&'a WalletTransaction>,
}

impl<'a> WrappedTransactions<'a> {
    /// The wrapper holding `txid`, if any.
    pub fn wrapper_of(&self, txid: &Txid) -> Option<&TxWrapper<'a>> {
        self.wrappers.iter().find(|wrapper| wrapper.contains(txid))
    }

    pub fn len(&self) -> usize {
        self.wrappers.len() + self.ungrouped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty() && self.ungrouped.is_empty()
    }
}

/// Group `all` into workflow wrappers for a wallet owning `outputs`.
///
/// Transactions are offered parents first, to wrappers in factory order; the
/// first wrapper that accepts keeps the transaction. The result depends only
/// on the set of transactions and on ownership, not on their order in `all`.
pub fn wrap_transactions<'a>(
    all: &'a [WalletTransaction],
    factories: &[WrapperFactory],
    outputs: &impl WalletOutputs,
) -> Result<WrappedTransactions<'a>> {
    let ordered = processing_order(all);

    let mut wrappers: Vec<TxWrapper<'a>> =
        factories.iter().flat_map(|factory| factory.create_wrappers(&ordered, outputs)).collect();
    debug!("Wrapping {} transactions with {} candidate wrappers", ordered.len(), wrappers.len());

    let mut ungrouped = Vec::new();
    for tx in ordered {
        if !wrappers.iter_mut().any(|wrapper| wrapper.try_include(tx, outputs)) {
            ungrouped.push(tx);
        }
    }

    wrappers.retain(|wrapper| !wrapper.is_empty());
    check_single_home(&wrappers)?;

    Ok(WrappedTransactions {
        wrappers,
        ungrouped,
    })
}

/// Every transaction may belong to one wrapper at most.
fn check_single_home(wrappers: &[TxWrapper<'_>]) -> Result<()> {
    let mut homes: HashMap<Txid, String> = HashMap::new();
    for wrapper in wrappers {
        for tx in wrapper.transactions() {
            if let Some(first) = homes.insert(tx.txid, wrapper.id()) {
                error!("Transaction {} wrapped by both {} and {}", tx.txid, first, wrapper.id());
                return Err(Error::InvariantViolation {
                    txid: tx.txid,
                    first,
                    second: wrapper.id(),
                });
            }
        }
    }
    Ok(())
}

/// Deduplicate by txid and order parents before children.
///
/// Transactions with no parent in the set come first, by timestamp then txid;
/// descendants follow once all their parents were placed, ranked the same way.
fn processing_order(all: &[WalletTransaction]) -> Vec<&WalletTransaction> {
    let mut by_txid: HashMap<Txid, &WalletTransaction> = HashMap::with_capacity(all.len());
    for tx in all {
        match by_txid.entry(tx.txid) {
            Entry::Occupied(_) => debug!("Ignoring repeated transaction {}", tx.txid),
            Entry::Vacant(entry) => {
                entry.insert(tx);
            }
        }
    }

    let mut pending_parents: HashMap<Txid, usize> = HashMap::with_capacity(by_txid.len());
    let mut children: HashMap<Txid, Vec<Txid>> = HashMap::new();
    for (txid, tx) in &by_txid {
        let parents: HashSet<Txid> = tx
            .inputs()
            .iter()
            .map(|input| input.previous_output.txid)
            .filter(|parent| parent != txid && by_txid.contains_key(parent))
            .collect();
        pending_parents.insert(*txid, parents.len());
        for parent in parents {
            children.entry(parent).or_default().push(*txid);
        }
    }

    let has_parent: HashSet<Txid> =
        pending_parents.iter().filter(|(_, count)| **count > 0).map(|(txid, _)| *txid).collect();
    let key = |txid: &Txid| Reverse((has_parent.contains(txid), by_txid[txid].timestamp, *txid));
    let mut ready: BinaryHeap<Reverse<(bool, u64, Txid)>> = pending_parents
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(txid, _)| key(txid))
        .collect();

    let mut ordered = Vec::with_capacity(by_txid.len());
    while let Some(Reverse((_, _, txid))) = ready.pop() {
        ordered.push(by_txid[&txid]);
        for child in children.get(&txid).into_iter().flatten() {
            if let Some(count) = pending_parents.get_mut(child) {
                *count -= 1;
                if *count == 0 {
                    ready.push(key(child));
                }
            }
        }
    }

    if ordered.len() < by_txid.len() {
        let placed: HashSet<Txid> = ordered.iter().map(|tx| tx.txid).collect();
        let mut rest: Vec<&WalletTransaction> =
            by_txid.values().copied().filter(|tx| !placed.contains(&tx.txid)).collect();
        rest.sort_by_key(|tx| (tx.timestamp, tx.txid));
        debug!("{} transactions spend each other in a cycle", rest.len());
        ordered.extend(rest);
    }
    ordered
}
