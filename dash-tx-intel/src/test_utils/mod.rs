//! Builders shared by unit and integration tests.

mod transaction;
mod utxo;

pub use transaction::{TestTransaction, p2pkh};
