//! CoinJoin amounts and transaction shapes.
//!
//! Used by the mixing-aware coin selectors and by the CoinJoin wrapper to
//! recognize mixing activity from a transaction's outputs alone.

use crate::transaction::WalletTransaction;
use crate::utxo::Utxo;

/// Standard CoinJoin denominations, largest first.
pub const COINJOIN_DENOMINATIONS: [u64; 5] = [
    1_000_010_000, // 10.00010000 DASH
    100_001_000,   //  1.00001000 DASH
    10_000_100,    //  0.10000100 DASH
    1_000_010,     //  0.01000010 DASH
    100_001,       //  0.00100001 DASH
];

/// Smallest collateral output.
pub const MIN_COLLATERAL_AMOUNT: u64 = 1_000;

/// Largest collateral output.
pub const MAX_COLLATERAL_AMOUNT: u64 = 100_000;

/// Specific CoinJoin transaction shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoinJoinTransactionType {
    /// Not a CoinJoin transaction
    None,
    /// Mixing round: denominated inputs to the same number of denominated outputs
    Mixing,
    /// Creates collateral inputs for future rounds
    MakeCollateralInputs,
    /// Splits funds into denominations
    CreateDenomination,
    /// Merges several small outputs into one
    CombineDust,
}

pub fn is_denominated_amount(amount: u64) -> bool {
    COINJOIN_DENOMINATIONS.contains(&amount)
}

/// Check if an amount is a valid collateral amount
pub fn is_collateral_amount(amount: u64) -> bool {
    (MIN_COLLATERAL_AMOUNT..=MAX_COLLATERAL_AMOUNT).contains(&amount)
}

/// Less than 0.0001 DASH.
pub fn is_small_amount(amount: u64) -> bool {
    amount < 10_000
}

/// Whether a candidate finished at least `rounds` mixing rounds on a
/// denominated amount.
pub fn is_mixed(utxo: &Utxo, rounds: u32) -> bool {
    is_denominated_amount(utxo.value()) && utxo.coinjoin_rounds.is_some_and(|done| done >= rounds)
}

/// Classify the CoinJoin shape of `tx`.
pub fn classify_transaction(tx: &WalletTransaction) -> CoinJoinTransactionType {
    if is_mixing(tx) {
        return CoinJoinTransactionType::Mixing;
    }

    let make_collateral = match tx.outputs() {
        [first, second] => {
            let (amount0, amount1) = (first.value, second.value);
            (is_collateral_amount(amount0) && amount1 > amount0)
                || (is_collateral_amount(amount1) && amount0 > amount1)
                || (amount0 == amount1 && is_collateral_amount(amount0))
        }
        [only] => {
            if !is_collateral_amount(only.value) && tx.inputs().len() > 1 && is_small_amount(only.value) {
                return CoinJoinTransactionType::CombineDust;
            }
            is_collateral_amount(only.value)
        }
        _ => false,
    };

    if make_collateral {
        CoinJoinTransactionType::MakeCollateralInputs
    } else if has_denomination_outputs(tx) {
        CoinJoinTransactionType::CreateDenomination
    } else {
        CoinJoinTransactionType::None
    }
}

/// Check if a transaction appears to be a CoinJoin transaction
pub fn is_coinjoin_transaction(tx: &WalletTransaction) -> bool {
    classify_transaction(tx) != CoinJoinTransactionType::None
}

fn is_mixing(tx: &WalletTransaction) -> bool {
    !tx.outputs().is_empty()
        && tx.inputs().len() == tx.outputs().len()
        && tx.outputs().iter().all(|output| is_denominated_amount(output.value))
        && tx.fee().is_none_or(|fee| fee == 0)
}

fn has_denomination_outputs(tx: &WalletTransaction) -> bool {
    let denominated = tx.outputs().iter().filter(|output| is_denominated_amount(output.value)).count();
    denominated > 0 && denominated * 2 >= tx.outputs().len()
}
