//! Predicates over a single transaction.
//!
//! Filters are used directly to spot individual transactions and as the
//! building blocks of workflow matching. A positive match may record a
//! correlated address (the counterpart of a payment); a negative match never
//! clears a previously recorded one.

use dashcore::Address;

use crate::transaction::{TxOut, Txid, WalletTransaction, output_address, pays_to};

/// Outgoing payment of an exact amount funded from a given address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinsFromAddressTxFilter {
    from_address: Address,
    amount: u64,
    include_fee: bool,
    to_address: Option<Address>,
}

impl CoinsFromAddressTxFilter {
    pub fn new(from_address: Address, amount: u64) -> Self {
        Self {
            from_address,
            amount,
            include_fee: false,
            to_address: None,
        }
    }

    /// Also require that the funds drawn from the address covered exactly the
    /// amount plus the transaction fee.
    pub fn with_fee(mut self) -> Self {
        self.include_fee = true;
        self
    }

    /// Destination of the matched output, after a positive match.
    pub fn to_address(&self) -> Option<&Address> {
        self.to_address.as_ref()
    }

    pub fn matches(&mut self, tx: &WalletTransaction) -> bool {
        let from_outputs: Vec<&TxOut> =
            tx.connected_outputs().filter(|output| pays_to(output, &self.from_address)).collect();
        if from_outputs.is_empty() {
            return false;
        }

        if self.include_fee {
            let Some(fee) = tx.fee() else {
                return false;
            };
            let drawn: u64 = from_outputs.iter().map(|o| o.value).sum();
            if drawn.checked_sub(fee) != Some(self.amount) {
                return false;
            }
        }

        match tx.outputs().iter().find(|output| output.value == self.amount) {
            Some(output) => {
                self.to_address = output_address(output, *self.from_address.network());
                true
            }
            None => false,
        }
    }
}

/// Incoming payment of an exact amount to a given address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinsToAddressTxFilter {
    to_address: Address,
    amount: u64,
    from_address: Option<Address>,
}

impl CoinsToAddressTxFilter {
    pub fn new(to_address: Address, amount: u64) -> Self {
        Self {
            to_address,
            amount,
            from_address: None,
        }
    }

    /// Source of the first input carrying the same amount, after a positive match.
    pub fn from_address(&self) -> Option<&Address> {
        self.from_address.as_ref()
    }

    pub fn matches(&mut self, tx: &WalletTransaction) -> bool {
        let pays = tx
            .outputs()
            .iter()
            .any(|output| output.value == self.amount && pays_to(output, &self.to_address));
        if !pays {
            return false;
        }

        self.from_address = tx
            .connected_outputs()
            .find(|source| source.value == self.amount)
            .and_then(|source| output_address(source, *self.to_address.network()));
        true
    }
}

/// A specific transaction that reached an InstantSend lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedTransaction {
    txid: Txid,
}

impl LockedTransaction {
    pub fn new(txid: Txid) -> Self {
        Self {
            txid,
        }
    }

    pub fn matches(&self, tx: &WalletTransaction) -> bool {
        let confidence = tx.confidence;
        tx.txid == self.txid && confidence.instant_locked
    }
}

/// Transactions whose timestamp falls within `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxWithinTimePeriod {
    from: u64,
    to: u64,
}

impl TxWithinTimePeriod {
    pub fn new(from: u64, to: u64) -> Self {
        Self {
            from,
            to,
        }
    }

    pub fn matches(&self, tx: &WalletTransaction) -> bool {
        (self.from..=self.to).contains(&tx.timestamp)
    }
}

/// Closed set of transaction filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFilter {
    CoinsFromAddress(CoinsFromAddressTxFilter),
    CoinsToAddress(CoinsToAddressTxFilter),
    Locked(LockedTransaction),
    WithinTimePeriod(TxWithinTimePeriod),
    /// Matches when any child matches; the first matching child's counterpart
    /// is recorded.
    AnyOf {
        filters: Vec<TxFilter>,
        counterpart: Option<Address>,
    },
}

impl TxFilter {
    pub fn any_of(filters: Vec<TxFilter>) -> Self {
        TxFilter::AnyOf {
            filters,
            counterpart: None,
        }
    }

    pub fn matches(&mut self, tx: &WalletTransaction) -> bool {
        match self {
            TxFilter::CoinsFromAddress(filter) => filter.matches(tx),
            TxFilter::CoinsToAddress(filter) => filter.matches(tx),
            TxFilter::Locked(filter) => filter.matches(tx),
            TxFilter::WithinTimePeriod(filter) => filter.matches(tx),
            TxFilter::AnyOf {
                filters,
                counterpart,
            } => {
                for filter in filters.iter_mut() {
                    if filter.matches(tx) {
                        *counterpart = filter.counterpart().cloned();
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Address correlated with the last positive match, if the filter records one.
    pub fn counterpart(&self) -> Option<&Address> {
        match self {
            TxFilter::CoinsFromAddress(filter) => filter.to_address(),
            TxFilter::CoinsToAddress(filter) => filter.from_address(),
            TxFilter::Locked(_) | TxFilter::WithinTimePeriod(_) => None,
            TxFilter::AnyOf {
                counterpart,
                ..
            } => counterpart.as_ref(),
        }
    }
}

impl From<CoinsFromAddressTxFilter> for TxFilter {
    fn from(filter: CoinsFromAddressTxFilter) -> Self {
        TxFilter::CoinsFromAddress(filter)
    }
}

impl From<CoinsToAddressTxFilter> for TxFilter {
    fn from(filter: CoinsToAddressTxFilter) -> Self {
        TxFilter::CoinsToAddress(filter)
    }
}

impl From<LockedTransaction> for TxFilter {
    fn from(filter: LockedTransaction) -> Self {
        TxFilter::Locked(filter)
    }
}
