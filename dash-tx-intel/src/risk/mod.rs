//! Locktime risk analysis.
//!
//! A transaction carrying an absolute lock time looks non-final to a wallet
//! that is still catching up with the chain, even when the rest of the
//! network already accepts it. The analyzers here run the wallet's own
//! finality check first and, only for absolute locks, retry it against an
//! estimate of where the network is.
//!
//! Two estimates exist:
//! - [`OfflineRiskAnalyzer`] uses a fixed height and time chosen before any
//!   peer connected.
//! - [`LiveRiskAnalyzer`] reads the latest [`NetworkSnapshot`] published by a
//!   [`NetworkTimeTracker`].
//!
//! Relative locks are never overridden.

mod live;
mod observation;
mod offline;

pub use live::{DEFAULT_TIME_OFFSET_WINDOW, LiveRiskAnalyzer, NetworkTimeTracker};
pub use observation::NetworkObservation;
pub use offline::OfflineRiskAnalyzer;

use tracing::trace;

use crate::transaction::{ConfidenceSource, WalletTransaction};

/// Outcome of a risk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskVerdict {
    Final,
    NonFinal,
}

impl RiskVerdict {
    pub fn is_final(&self) -> bool {
        matches!(self, RiskVerdict::Final)
    }
}

/// The last block the wallet itself has processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainTip {
    pub height: u32,
    /// Block time in UNIX seconds.
    pub time: u64,
}

impl ChainTip {
    pub fn new(height: u32, time: u64) -> Self {
        Self {
            height,
            time,
        }
    }
}

/// Latest network estimate published by the [`NetworkTimeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkSnapshot {
    /// Highest "most common chain height" reported so far, `None` before any
    /// peer reported one.
    pub common_height: Option<u32>,
    /// Median of peer clock minus local clock, in seconds.
    pub time_offset: i64,
}

impl NetworkSnapshot {
    /// Estimated network tip given the local clock.
    ///
    /// Until a peer reports a height the wallet's own height stands in, so
    /// only time locks can be overridden by the adjusted clock.
    pub fn estimate(&self, local_time: u64, wallet_tip: ChainTip) -> ChainTip {
        let height = self.common_height.unwrap_or(wallet_tip.height);
        let time = (local_time as i64).saturating_add(self.time_offset).max(0) as u64;
        ChainTip::new(height, time)
    }
}

/// Decides whether a transaction is safe to show as final.
pub trait RiskAnalyzer {
    /// `dependencies` are the unconfirmed transactions `tx` spends from;
    /// `wallet_tip` is the wallet's own chain view.
    fn analyze(
        &self,
        tx: &WalletTransaction,
        dependencies: &[WalletTransaction],
        wallet_tip: ChainTip,
    ) -> RiskVerdict;
}

/// Whether `tx` and every dependency would be final in the block after `tip`.
fn is_final_after(tx: &WalletTransaction, dependencies: &[WalletTransaction], tip: ChainTip) -> bool {
    let height = tip.height.saturating_add(1);
    tx.is_final(height, tip.time) && dependencies.iter().all(|dep| dep.is_final(height, tip.time))
}

/// Rule-based finality check using only the wallet's own chain view.
pub fn analyze_is_final(
    tx: &WalletTransaction,
    dependencies: &[WalletTransaction],
    wallet_tip: ChainTip,
) -> RiskVerdict {
    let confidence = tx.confidence;
    if confidence.source == ConfidenceSource::SelfOrigin || confidence.is_building() {
        return RiskVerdict::Final;
    }
    if is_final_after(tx, dependencies, wallet_tip) {
        RiskVerdict::Final
    } else {
        RiskVerdict::NonFinal
    }
}

/// Baseline check, then the network override for absolute locks.
///
/// Without an estimate the baseline verdict stands.
pub(crate) fn analyze_with_estimate(
    tx: &WalletTransaction,
    dependencies: &[WalletTransaction],
    wallet_tip: ChainTip,
    estimate: Option<ChainTip>,
) -> RiskVerdict {
    let confidence = tx.confidence;
    let baseline = analyze_is_final(tx, dependencies, wallet_tip);
    if baseline.is_final() {
        return baseline;
    }
    if tx.has_relative_lock_time() || !tx.is_time_locked() {
        return baseline;
    }
    let Some(estimate) = estimate else {
        trace!("No network estimate for {}, keeping baseline verdict", tx.txid);
        return baseline;
    };

    if is_final_after(tx, dependencies, estimate) {
        trace!(
            "{} final against network height {} and time {}",
            tx.txid,
            estimate.height,
            estimate.time
        );
        RiskVerdict::Final
    } else if confidence.broadcast_peers > 1 {
        trace!("{} announced by {} peers", tx.txid, confidence.broadcast_peers);
        RiskVerdict::Final
    } else {
        RiskVerdict::NonFinal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTransaction;
    use crate::transaction::Confidence;

    fn height_locked(id: u8, lock: u32) -> WalletTransaction {
        TestTransaction::new(id).version(2).lock_time(lock).input_sequence(0, 0xffff_fffe).build()
    }

    #[test]
    fn test_baseline_accepts_own_and_mined_transactions() {
        let tip = ChainTip::new(100, 0);
        let tx = height_locked(1, 5_000);
        assert_eq!(analyze_is_final(&tx, &[], tip), RiskVerdict::NonFinal);

        let mut own = tx.clone();
        own.confidence = Confidence::pending().with_source(ConfidenceSource::SelfOrigin);
        assert_eq!(analyze_is_final(&own, &[], tip), RiskVerdict::Final);

        let mut mined = tx;
        mined.confidence = Confidence::building(1);
        assert_eq!(analyze_is_final(&mined, &[], tip), RiskVerdict::Final);
    }

    #[test]
    fn test_baseline_uses_next_block_height() {
        let tx = height_locked(1, 100);
        assert_eq!(analyze_is_final(&tx, &[], ChainTip::new(99, 0)), RiskVerdict::NonFinal);
        assert_eq!(analyze_is_final(&tx, &[], ChainTip::new(100, 0)), RiskVerdict::Final);
    }

    #[test]
    fn test_dependencies_must_be_final() {
        let tx = height_locked(1, 100);
        let dep = height_locked(2, 200);
        let tip = ChainTip::new(150, 0);
        assert_eq!(analyze_is_final(&tx, &[], tip), RiskVerdict::Final);
        assert_eq!(analyze_is_final(&tx, &[dep.clone()], tip), RiskVerdict::NonFinal);

        let estimate = Some(ChainTip::new(150, 0));
        assert_eq!(
            analyze_with_estimate(&tx, &[dep.clone()], ChainTip::new(0, 0), estimate),
            RiskVerdict::NonFinal
        );
        let estimate = Some(ChainTip::new(250, 0));
        assert_eq!(
            analyze_with_estimate(&tx, &[dep], ChainTip::new(0, 0), estimate),
            RiskVerdict::Final
        );
    }

    #[test]
    fn test_relative_lock_is_never_overridden() {
        let tx = TestTransaction::new(1)
            .version(2)
            .lock_time(100)
            .input_sequence(0, 10)
            .confidence(Confidence::pending().with_broadcast_peers(8))
            .build();
        assert!(tx.has_relative_lock_time());

        let estimate = Some(ChainTip::new(u32::MAX - 1, u64::MAX));
        assert_eq!(
            analyze_with_estimate(&tx, &[], ChainTip::new(0, 0), estimate),
            RiskVerdict::NonFinal
        );
    }

    #[test]
    fn test_broadcast_peers_secondary_path() {
        let wallet_tip = ChainTip::new(10, 0);
        let estimate = Some(ChainTip::new(20, 0));

        let one_peer = TestTransaction::new(1)
            .version(2)
            .lock_time(1_000)
            .input_sequence(0, 0xffff_fffe)
            .confidence(Confidence::pending().with_broadcast_peers(1))
            .build();
        assert_eq!(analyze_with_estimate(&one_peer, &[], wallet_tip, estimate), RiskVerdict::NonFinal);

        let mut two_peers = one_peer;
        two_peers.confidence = Confidence::pending().with_broadcast_peers(2);
        assert_eq!(analyze_with_estimate(&two_peers, &[], wallet_tip, estimate), RiskVerdict::Final);
    }

    #[test]
    fn test_no_estimate_keeps_baseline() {
        let tx = height_locked(1, 1_000);
        assert_eq!(
            analyze_with_estimate(&tx, &[], ChainTip::new(10, 0), None),
            RiskVerdict::NonFinal
        );
    }

    #[test]
    fn test_time_lock_override() {
        let tx = TestTransaction::new(1)
            .version(2)
            .lock_time(1_700_000_000)
            .input_sequence(0, 0xffff_fffe)
            .build();
        let wallet_tip = ChainTip::new(10, 1_600_000_000);
        assert_eq!(analyze_is_final(&tx, &[], wallet_tip), RiskVerdict::NonFinal);
        assert_eq!(
            analyze_with_estimate(&tx, &[], wallet_tip, Some(ChainTip::new(10, 1_700_000_001))),
            RiskVerdict::Final
        );
    }

    #[test]
    fn test_verdict_is_monotonic_in_snapshot() {
        let txs = [
            height_locked(1, 500),
            TestTransaction::new(2)
                .version(2)
                .lock_time(1_700_000_000)
                .input_sequence(0, 0xffff_fffe)
                .build(),
        ];
        let wallet_tip = ChainTip::new(0, 0);

        for tx in &txs {
            let mut seen_final = false;
            for step in 0..40u32 {
                let estimate = ChainTip::new(step * 20, 1_699_999_900 + u64::from(step) * 10);
                let verdict = analyze_with_estimate(tx, &[], wallet_tip, Some(estimate));
                if seen_final {
                    assert_eq!(verdict, RiskVerdict::Final);
                }
                seen_final |= verdict.is_final();
            }
            assert!(seen_final);
        }
    }

    #[test]
    fn test_snapshot_estimate() {
        let snapshot = NetworkSnapshot {
            common_height: Some(1_000),
            time_offset: -30,
        };
        let wallet_tip = ChainTip::new(5, 0);
        assert_eq!(snapshot.estimate(1_000_000, wallet_tip), ChainTip::new(1_000, 999_970));
        assert_eq!(
            NetworkSnapshot::default().estimate(1_000_000, wallet_tip),
            ChainTip::new(5, 1_000_000)
        );
    }
}
