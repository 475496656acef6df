//! Network events consumed by the time tracker.

/// Observations emitted by the wallet's network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkObservation {
    /// A peer completed its handshake.
    PeerConnected {
        /// Time the peer advertised in its version message, UNIX seconds.
        peer_time: i64,
        /// Local clock when the version message arrived, UNIX seconds.
        local_time: i64,
        /// Most common chain height among connected peers.
        common_height: u32,
    },

    /// New blocks were downloaded.
    BlocksDownloaded {
        /// Most common chain height among connected peers.
        common_height: u32,
    },
}

impl NetworkObservation {
    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            NetworkObservation::PeerConnected {
                peer_time,
                local_time,
                common_height,
            } => {
                format!(
                    "PeerConnected(offset={}, common_height={})",
                    peer_time - local_time,
                    common_height
                )
            }
            NetworkObservation::BlocksDownloaded {
                common_height,
            } => {
                format!("BlocksDownloaded(common_height={})", common_height)
            }
        }
    }
}
