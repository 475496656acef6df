use dashcore::address::Payload;
use dashcore::hashes::Hash;
use dashcore::{Address, Network, PubkeyHash, Witness};

use crate::transaction::{
    Confidence, OutPoint, SEQUENCE_FINAL, ScriptBuf, Transaction, TxIn, TxOut, Txid,
    WalletTransaction,
};

/// Testnet P2PKH address whose hash is `id` repeated.
pub fn p2pkh(id: u8) -> Address {
    Address::new(Network::Testnet, Payload::PubkeyHash(PubkeyHash::from_byte_array([id; 20])))
}

/// Builder for transactions used across the test suite.
///
/// Inputs created by [`TestTransaction::spending`] reference synthetic funding
/// transactions that are never part of a test set. A transaction built
/// without inputs gets one unresolved input carrying `id`, so builders with
/// different ids never hash to the same txid.
#[derive(Debug, Clone)]
pub struct TestTransaction {
    id: u8,
    tx: Transaction,
    connected: Vec<Option<TxOut>>,
    value: i64,
    timestamp: u64,
    confidence: Confidence,
}

impl TestTransaction {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            tx: Transaction {
                version: 1,
                lock_time: 0,
                input: Vec::new(),
                output: Vec::new(),
                special_transaction_payload: None,
            },
            connected: Vec::new(),
            value: 0,
            timestamp: 1_700_000_000 + u64::from(id),
            confidence: Confidence::pending(),
        }
    }

    fn funding_outpoint(&self) -> OutPoint {
        let mut bytes = [self.id; 32];
        bytes[0] = 0xff;
        bytes[1] = self.tx.input.len() as u8;
        OutPoint::new(Txid::from_byte_array(bytes), 0)
    }

    fn push_input(mut self, previous_output: OutPoint, source: Option<TxOut>) -> Self {
        self.tx.input.push(TxIn {
            previous_output,
            script_sig: ScriptBuf::new(),
            sequence: SEQUENCE_FINAL,
            witness: Witness::default(),
        });
        self.connected.push(source);
        self
    }

    /// Add an input spending `value` previously paid to `address`.
    pub fn spending(self, address: Address, value: u64) -> Self {
        let previous_output = self.funding_outpoint();
        let source = TxOut {
            value,
            script_pubkey: address.script_pubkey(),
        };
        self.push_input(previous_output, Some(source))
    }

    /// Add an input spending output `vout` of `parent`.
    pub fn spends(self, parent: &WalletTransaction, vout: u32) -> Self {
        let source = parent.outputs().get(vout as usize).cloned();
        self.push_input(OutPoint::new(parent.txid, vout), source)
    }

    /// Add an input whose source output has not been downloaded.
    pub fn unresolved_input(self) -> Self {
        let previous_output = self.funding_outpoint();
        self.push_input(previous_output, None)
    }

    pub fn coinbase_input(self) -> Self {
        self.push_input(OutPoint::null(), None)
    }

    pub fn output(self, address: Address, value: u64) -> Self {
        self.output_script(address.script_pubkey(), value)
    }

    pub fn output_script(mut self, script_pubkey: ScriptBuf, value: u64) -> Self {
        self.tx.output.push(TxOut {
            value,
            script_pubkey,
        });
        self
    }

    /// Set the sequence of input `index`, padding with unresolved inputs.
    pub fn input_sequence(mut self, index: usize, sequence: u32) -> Self {
        while self.tx.input.len() <= index {
            self = self.unresolved_input();
        }
        self.tx.input[index].sequence = sequence;
        self
    }

    pub fn version(mut self, version: u16) -> Self {
        self.tx.version = version;
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.tx.lock_time = lock_time;
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn build(mut self) -> WalletTransaction {
        if self.tx.input.is_empty() {
            self = self.unresolved_input();
        }
        let mut built = WalletTransaction::new(self.tx, self.timestamp)
            .with_value(self.value)
            .with_confidence(self.confidence);
        for (index, source) in self.connected.into_iter().enumerate() {
            if let Some(source) = source {
                built.connect_input(index, source);
            }
        }
        built
    }
}
