use dashcore::Address;
use dashcore::hashes::Hash;

use crate::transaction::{OutPoint, TxOut, Txid};
use crate::Utxo;

impl Utxo {
    /// A confirmed UTXO paying `value` to `address`, identified by `id`.
    pub fn new_test(id: u8, value: u64, address: &Address) -> Self {
        let outpoint = OutPoint::new(Txid::from_byte_array([id; 32]), 0);
        let txout = TxOut {
            value,
            script_pubkey: address.script_pubkey(),
        };
        let mut utxo = Utxo::new(outpoint, txout);
        utxo.confirmations = 1;
        utxo
    }

    /// A confirmed UTXO that completed `rounds` CoinJoin rounds.
    pub fn new_test_mixed(id: u8, value: u64, address: &Address, rounds: u32) -> Self {
        let mut utxo = Self::new_test(id, value, address);
        utxo.coinjoin_rounds = Some(rounds);
        utxo
    }

    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = confirmations;
        self
    }
}
