//! Configuration for the transaction intelligence layer.

use dashcore::Network;

use crate::coin_selection::{CoinSelector, FeeRate};
use crate::error::{Error, Result};
use crate::event_bus::{DEFAULT_EVENT_LIMIT, EventBus};
use crate::risk::{DEFAULT_TIME_OFFSET_WINDOW, NetworkObservation, NetworkTimeTracker};
use crate::wrapper::WrapperFactory;

/// Rounds a CoinJoin output needs before it counts as mixed.
pub const DEFAULT_COINJOIN_ROUNDS: u32 = 4;

/// Largest accepted offset window, matching the peer limit of Dash Core's
/// network time tracking.
pub const MAX_TIME_OFFSET_WINDOW: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntelConfig {
    /// Network the wallet runs on.
    pub network: Network,

    /// Fee rate for sweeping selections.
    pub fee_rate: FeeRate,

    /// Mixing rounds required by the CoinJoin selectors.
    pub coinjoin_rounds: u32,

    /// Number of peer clock offsets kept by the time tracker.
    pub time_offset_window: usize,

    /// Buffered network observations before slow receivers lag.
    pub event_bus_capacity: usize,

    /// Group CrowdNode sign-ups into a wrapper.
    pub wrap_crowdnode: bool,

    /// Group CoinJoin activity into daily wrappers.
    pub wrap_coinjoin: bool,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            network: Network::Dash,
            fee_rate: FeeRate::normal(),
            coinjoin_rounds: DEFAULT_COINJOIN_ROUNDS,
            time_offset_window: DEFAULT_TIME_OFFSET_WINDOW,
            event_bus_capacity: DEFAULT_EVENT_LIMIT,
            wrap_crowdnode: true,
            wrap_coinjoin: true,
        }
    }
}

impl IntelConfig {
    /// Create a new configuration for the given network.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Network::Dash)
    }

    pub fn testnet() -> Self {
        Self::new(Network::Testnet)
    }

    pub fn with_fee_rate(mut self, fee_rate: FeeRate) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    pub fn with_coinjoin_rounds(mut self, rounds: u32) -> Self {
        self.coinjoin_rounds = rounds;
        self
    }

    pub fn with_time_offset_window(mut self, window: usize) -> Self {
        self.time_offset_window = window;
        self
    }

    pub fn with_event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = capacity;
        self
    }

    pub fn with_crowdnode_wrapping(mut self, enabled: bool) -> Self {
        self.wrap_crowdnode = enabled;
        self
    }

    pub fn with_coinjoin_wrapping(mut self, enabled: bool) -> Self {
        self.wrap_coinjoin = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.time_offset_window == 0 {
            return Err(Error::Config("time_offset_window must be > 0".to_string()));
        }
        if self.time_offset_window > MAX_TIME_OFFSET_WINDOW {
            return Err(Error::Config(format!(
                "time_offset_window must be <= {}",
                MAX_TIME_OFFSET_WINDOW
            )));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be > 0".to_string()));
        }
        if self.fee_rate.as_sat_per_kb() == 0 {
            return Err(Error::Config("fee_rate must be > 0".to_string()));
        }
        Ok(())
    }

    /// Factories for the enabled workflows, in priority order.
    pub fn wrapper_factories(&self) -> Vec<WrapperFactory> {
        let mut factories = Vec::new();
        if self.wrap_crowdnode {
            factories.push(WrapperFactory::CrowdNodeSignUp {
                network: self.network,
            });
        }
        if self.wrap_coinjoin {
            factories.push(WrapperFactory::CoinJoin);
        }
        factories
    }

    /// Selector sweeping every spendable output.
    pub fn max_minus_fee_selector(&self) -> CoinSelector {
        CoinSelector::MaxMinusFee(self.fee_rate)
    }

    /// Selector sweeping the fully mixed outputs.
    pub fn coinjoin_max_minus_fee_selector(&self) -> CoinSelector {
        CoinSelector::CoinJoinMaxMinusFee {
            fee_rate: self.fee_rate,
            rounds: self.coinjoin_rounds,
        }
    }

    /// Event bus for network observations, with room for at least one event.
    pub fn event_bus(&self) -> EventBus<NetworkObservation> {
        EventBus::new(self.event_bus_capacity.max(1))
    }

    pub fn time_tracker(&self) -> NetworkTimeTracker {
        NetworkTimeTracker::new(self.time_offset_window)
    }
}
