//! Confidence snapshots.
//!
//! The wallet and network layers mutate a transaction's confidence
//! concurrently. This crate only ever sees a copy taken at one instant, so
//! every analysis reads a consistent view.

/// How far the transaction has progressed towards a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfidenceType {
    /// Nothing is known about the transaction yet.
    #[default]
    Unknown,
    /// Seen on the network but not in a block.
    Pending,
    /// Included in the best chain.
    Building {
        /// Number of blocks on top of, and including, the containing block.
        depth: u32,
    },
    /// Double spent or otherwise conflicted.
    Dead,
}

/// Where the wallet first learned about the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfidenceSource {
    #[default]
    Unknown,
    /// Relayed by a peer.
    Network,
    /// Created by this wallet.
    SelfOrigin,
}

/// Point-in-time copy of a transaction's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Confidence {
    pub confidence_type: ConfidenceType,
    /// Locked by an InstantSend quorum.
    pub instant_locked: bool,
    /// Number of peers that announced the transaction.
    pub broadcast_peers: u32,
    pub source: ConfidenceSource,
}

impl Confidence {
    pub fn pending() -> Self {
        Self {
            confidence_type: ConfidenceType::Pending,
            ..Self::default()
        }
    }

    pub fn building(depth: u32) -> Self {
        Self {
            confidence_type: ConfidenceType::Building {
                depth,
            },
            ..Self::default()
        }
    }

    pub fn with_instant_lock(mut self) -> Self {
        self.instant_locked = true;
        self
    }

    pub fn with_broadcast_peers(mut self, peers: u32) -> Self {
        self.broadcast_peers = peers;
        self
    }

    pub fn with_source(mut self, source: ConfidenceSource) -> Self {
        self.source = source;
        self
    }

    pub fn is_building(&self) -> bool {
        matches!(self.confidence_type, ConfidenceType::Building { .. })
    }

    pub fn is_pending(&self) -> bool {
        self.confidence_type == ConfidenceType::Pending
    }

    /// Confirmation depth, zero unless building.
    pub fn depth(&self) -> u32 {
        match self.confidence_type {
            ConfidenceType::Building {
                depth,
            } => depth,
            _ => 0,
        }
    }
}
