//! Fee rates and the size estimate used when sweeping candidates.

use dashcore::consensus::encode::VarInt;

/// Typical size of a signed P2PKH input: outpoint, signature script and
/// sequence.
pub const P2PKH_INPUT_SIZE: usize = 148;

/// Extra byte per input for a signature whose DER encoding runs one byte
/// longer than typical.
pub const SIGNATURE_ENCODING_ALLOWANCE: usize = 1;

/// Size of a P2PKH output.
pub const P2PKH_OUTPUT_SIZE: usize = 34;

/// Version, type and lock time.
const BASE_SIZE: usize = 8;

/// Fee rate in duffs per kilobyte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeeRate {
    sat_per_kb: u64,
}

impl Default for FeeRate {
    fn default() -> Self {
        Self::normal()
    }
}

impl FeeRate {
    pub fn new(sat_per_kb: u64) -> Self {
        Self {
            sat_per_kb,
        }
    }

    /// Create from duffs per byte (1 duff = 1 satoshi in Dash)
    pub fn from_duffs_per_byte(duffs_per_byte: u64) -> Self {
        Self {
            sat_per_kb: duffs_per_byte * 1000,
        }
    }

    pub fn as_sat_per_kb(&self) -> u64 {
        self.sat_per_kb
    }

    /// Fee for `size_bytes`, truncated to whole duffs.
    pub fn calculate_fee(&self, size_bytes: usize) -> u64 {
        self.sat_per_kb.saturating_mul(size_bytes as u64) / 1000
    }

    /// Economy fee rate (0.5 duff/byte)
    pub fn economy() -> Self {
        Self {
            sat_per_kb: 500,
        }
    }

    /// Normal fee rate (1 duff/byte)
    pub fn normal() -> Self {
        Self {
            sat_per_kb: 1000,
        }
    }

    /// Priority fee rate (2 duff/byte)
    pub fn priority() -> Self {
        Self {
            sat_per_kb: 2000,
        }
    }
}

/// Size of a transaction spending `num_inputs` P2PKH inputs into a single
/// P2PKH output.
pub fn estimate_max_spend_size(num_inputs: usize) -> usize {
    BASE_SIZE
        + VarInt(num_inputs as u64).len()
        + num_inputs * (P2PKH_INPUT_SIZE + SIGNATURE_ENCODING_ALLOWANCE)
        + VarInt(1).len()
        + P2PKH_OUTPUT_SIZE
}
