use tracing::debug;

use super::{ChainTip, RiskAnalyzer, RiskVerdict, analyze_with_estimate};
use crate::transaction::WalletTransaction;

/// Analyzer for use before any peer has connected.
///
/// The network estimate is fixed at construction, typically the highest
/// chain tip the wallet persisted in a previous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineRiskAnalyzer {
    max_chain_height: u32,
    max_current_time: u64,
}

impl OfflineRiskAnalyzer {
    pub fn new(max_chain_height: u32, max_current_time: u64) -> Self {
        debug!(
            "Offline risk analysis with height {} and time {}",
            max_chain_height, max_current_time
        );
        Self {
            max_chain_height,
            max_current_time,
        }
    }

    pub fn estimate(&self) -> ChainTip {
        ChainTip::new(self.max_chain_height, self.max_current_time)
    }
}

impl RiskAnalyzer for OfflineRiskAnalyzer {
    fn analyze(
        &self,
        tx: &WalletTransaction,
        dependencies: &[WalletTransaction],
        wallet_tip: ChainTip,
    ) -> RiskVerdict {
        analyze_with_estimate(tx, dependencies, wallet_tip, Some(self.estimate()))
    }
}
