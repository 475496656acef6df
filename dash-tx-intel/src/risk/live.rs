use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChainTip, NetworkObservation, NetworkSnapshot, RiskAnalyzer, RiskVerdict, analyze_with_estimate};
use crate::error::{Error, Result};
use crate::event_bus::EventReceiver;
use crate::transaction::WalletTransaction;

/// Number of peer clock offsets kept for the median.
pub const DEFAULT_TIME_OFFSET_WINDOW: usize = 24;

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Analyzer backed by the latest snapshot of a [`NetworkTimeTracker`].
#[derive(Debug, Clone)]
pub struct LiveRiskAnalyzer {
    snapshot: watch::Receiver<NetworkSnapshot>,
}

impl LiveRiskAnalyzer {
    pub fn new(snapshot: watch::Receiver<NetworkSnapshot>) -> Self {
        Self {
            snapshot,
        }
    }

    /// Copy of the current network estimate.
    pub fn snapshot(&self) -> NetworkSnapshot {
        *self.snapshot.borrow()
    }

    /// Analyze with an explicit local clock reading.
    pub fn analyze_at(
        &self,
        tx: &WalletTransaction,
        dependencies: &[WalletTransaction],
        wallet_tip: ChainTip,
        local_time: u64,
    ) -> RiskVerdict {
        let snapshot = self.snapshot();
        let estimate = snapshot.estimate(local_time, wallet_tip);
        analyze_with_estimate(tx, dependencies, wallet_tip, Some(estimate))
    }
}

impl RiskAnalyzer for LiveRiskAnalyzer {
    fn analyze(
        &self,
        tx: &WalletTransaction,
        dependencies: &[WalletTransaction],
        wallet_tip: ChainTip,
    ) -> RiskVerdict {
        self.analyze_at(tx, dependencies, wallet_tip, unix_now())
    }
}

/// Single owner of the peer clock offsets and the observed chain height.
///
/// Every update publishes a fresh [`NetworkSnapshot`] to all
/// [`LiveRiskAnalyzer`]s created from this tracker.
#[derive(Debug)]
pub struct NetworkTimeTracker {
    offsets: VecDeque<i64>,
    window: usize,
    common_height: Option<u32>,
    publisher: watch::Sender<NetworkSnapshot>,
}

impl Default for NetworkTimeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_OFFSET_WINDOW)
    }
}

impl NetworkTimeTracker {
    /// Create a tracker keeping the most recent `window` offsets.
    pub fn new(window: usize) -> Self {
        let (publisher, _) = watch::channel(NetworkSnapshot::default());
        Self {
            offsets: VecDeque::with_capacity(window),
            window: window.max(1),
            common_height: None,
            publisher,
        }
    }

    /// A new analyzer following this tracker's snapshots.
    pub fn analyzer(&self) -> LiveRiskAnalyzer {
        LiveRiskAnalyzer::new(self.publisher.subscribe())
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            common_height: self.common_height,
            time_offset: self.median_offset(),
        }
    }

    /// Median of the offset window; zero while empty.
    ///
    /// For an even number of samples the two middle values are averaged,
    /// truncating toward zero.
    pub fn median_offset(&self) -> i64 {
        let mut sorted: Vec<i64> = self.offsets.iter().copied().collect();
        sorted.sort_unstable();
        let n = sorted.len();
        if n == 0 {
            0
        } else if n % 2 == 0 {
            (sorted[n / 2] + sorted[(n - 1) / 2]) / 2
        } else {
            sorted[n / 2]
        }
    }

    pub fn common_height(&self) -> Option<u32> {
        self.common_height
    }

    /// Record a connected peer's clock and the peers' common height.
    pub fn record_peer(&mut self, peer_time: i64, local_time: i64, common_height: u32) {
        let offset = peer_time - local_time;
        if self.offsets.len() == self.window {
            self.offsets.pop_front();
        }
        self.offsets.push_back(offset);
        info!(
            "risk analysis: net time diff {}; peer time diff {} {} {}",
            self.median_offset(),
            offset,
            peer_time,
            local_time
        );
        self.update_height(common_height);
    }

    /// Record the common height after a block download.
    pub fn record_blocks(&mut self, common_height: u32) {
        self.update_height(common_height);
    }

    pub fn handle(&mut self, observation: NetworkObservation) {
        match observation {
            NetworkObservation::PeerConnected {
                peer_time,
                local_time,
                common_height,
            } => self.record_peer(peer_time, local_time, common_height),
            NetworkObservation::BlocksDownloaded {
                common_height,
            } => self.record_blocks(common_height),
        }
    }

    // A height of zero means no peer reported one.
    fn update_height(&mut self, common_height: u32) {
        if common_height > 0 {
            self.common_height = Some(self.common_height.map_or(common_height, |h| h.max(common_height)));
        }
        self.publisher.send_replace(self.snapshot());
    }

    /// Consume observations until the bus closes.
    ///
    /// A lagging receiver loses the skipped samples and keeps going.
    pub async fn run(mut self, mut events: EventReceiver<NetworkObservation>) -> Result<()> {
        loop {
            match events.recv().await {
                Ok(observation) => {
                    debug!("Risk tracker received {}", observation.description());
                    self.handle(observation);
                }
                Err(Error::EventBusLagged(skipped)) => {
                    warn!("Risk tracker missed {} network observations", skipped);
                }
                Err(Error::EventBusClosed) => {
                    debug!("Network observation bus closed, stopping risk tracker");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Spawn [`NetworkTimeTracker::run`] on the current tokio runtime.
    pub fn spawn(self, events: EventReceiver<NetworkObservation>) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(events))
    }
}
