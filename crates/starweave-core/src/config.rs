//! Simulation configuration.
//!
//! Every tunable lives here with the reference values as defaults. Partial
//! JSON is accepted: missing keys fall back to `Default`.

use serde::{Deserialize, Serialize};
use starweave_logic::progression::{Cost, Resources};

/// Galaxy generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalaxyConfig {
    pub system_count: u32,
    pub enemy_count: u32,
    /// Radius of the disc systems are scattered over.
    pub radius: f64,
    /// Extra nearest-neighbour routes per system on top of the spanning tree.
    pub extra_links: usize,
    /// Fraction of systems that carry static metal demand.
    pub demand_share: f64,
    /// Fixed seed for reproducible galaxies; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            system_count: 40,
            enemy_count: 3,
            radius: 1000.0,
            extra_links: 1,
            demand_share: 0.6,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Reference tick cadence for hosts driving the loop.
    pub tick_interval_ms: u64,
    /// Production multiplier while energy usage exceeds capacity.
    pub overload_penalty: f64,
    /// Ship travel time per route hop before tech bonuses.
    pub per_hop_time_ms: u64,
    pub scan_time_per_hop_ms: u64,
    pub scan_cost_per_hop: f64,
    pub route_build_cost: Cost,
    /// Credits per unit of metals exported, before dynamic pricing.
    pub trade_base_rate: f64,
    /// Price floor paid by a fully supplied market.
    pub min_price_multiplier: f64,
    /// Per-link trade bandwidth; `None` is unbounded.
    pub route_bandwidth: Option<f64>,
    /// Quiet period after the last meaningful change before saving.
    pub save_debounce_ms: u64,
    /// Interval of the unconditional flush that captures resource counters.
    pub periodic_save_ms: u64,
    pub save_key: String,
    pub starting_resources: Resources,
    pub galaxy: GalaxyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            overload_penalty: 0.5,
            per_hop_time_ms: 8_000,
            scan_time_per_hop_ms: 5_000,
            scan_cost_per_hop: 25.0,
            route_build_cost: Cost::new(100.0, 50.0),
            trade_base_rate: 0.5,
            min_price_multiplier: 0.2,
            route_bandwidth: None,
            save_debounce_ms: 500,
            periodic_save_ms: 10_000,
            save_key: "starweave-save".to_string(),
            starting_resources: Resources::new(500.0, 200.0),
            galaxy: GalaxyConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Same config with a fixed galaxy seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.galaxy.seed = Some(seed);
        self
    }
}
