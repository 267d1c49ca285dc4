//! Energy balance and production rates, recomputed every tick.

use std::collections::BTreeMap;

use starweave_logic::galaxy::{GalaxyData, SystemId};
use starweave_logic::progression::{output, BuildingKind, Resources, TechBonuses};
use starweave_logic::trade::TradeReport;

use crate::config::SimConfig;
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyReport {
    pub capacity: f64,
    pub usage: f64,
    pub overloaded: bool,
}

impl EnergyReport {
    pub fn surplus(&self) -> f64 {
        self.capacity - self.usage
    }
}

/// Capacity comes from colonies and power plants; usage from every
/// building level and every docked ship.
pub fn compute_energy(state: &GameState, bonuses: &TechBonuses) -> EnergyReport {
    let mut capacity = 0.0;
    let mut usage = 0.0;
    for system in state.galaxy.player_systems() {
        capacity += output::COLONY_BASE_CAPACITY
            + system.building_level(BuildingKind::PowerPlant) as f64
                * output::POWER_PLANT_CAPACITY_PER_LEVEL;
        for (kind, building) in &system.buildings {
            usage += building.level as f64 * kind.spec().energy_use;
        }
    }
    for ship in state.ships.iter().filter(|s| s.is_docked()) {
        usage += ship.class.spec().energy_use;
    }
    let capacity = capacity * bonuses.energy_capacity;
    EnergyReport {
        capacity,
        usage,
        overloaded: usage > capacity,
    }
}

/// Production multiplier for the current energy state.
pub fn efficiency(energy: &EnergyReport, config: &SimConfig) -> f64 {
    if energy.overloaded {
        config.overload_penalty
    } else {
        1.0
    }
}

/// Metals each player system puts on the market this tick.
pub fn metal_supply(
    galaxy: &GalaxyData,
    bonuses: &TechBonuses,
    efficiency: f64,
) -> BTreeMap<SystemId, f64> {
    galaxy
        .player_systems()
        .map(|s| {
            let mines = s.building_level(BuildingKind::Mine) as f64;
            (
                s.id,
                mines * output::MINE_METALS_PER_LEVEL * bonuses.mining_output * efficiency,
            )
        })
        .collect()
}

/// Per-second rates applied to the stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductionRates {
    pub credits_per_sec: f64,
    pub metals_per_sec: f64,
    /// Trade component of `credits_per_sec`, after the trade bonus.
    pub trade_income: f64,
    pub efficiency: f64,
}

/// Credits come from the home administration, habitats and exports; metals
/// are whatever the mines produced that was not shipped out.
pub fn compute_production(
    state: &GameState,
    trade: &TradeReport,
    supply: &BTreeMap<SystemId, f64>,
    bonuses: &TechBonuses,
    efficiency: f64,
    config: &SimConfig,
) -> ProductionRates {
    let home_is_player = state
        .home_system_id
        .and_then(|id| state.galaxy.system(id))
        .map_or(false, |s| s.is_player());

    let mut base_credits = if home_is_player {
        output::HOME_BASE_CREDITS
    } else {
        0.0
    };
    for system in state.galaxy.player_systems() {
        base_credits +=
            system.building_level(BuildingKind::Habitat) as f64 * output::HABITAT_CREDITS_PER_LEVEL;
    }

    let trade_income =
        trade.income(config.trade_base_rate, config.min_price_multiplier) * bonuses.trade_income;
    let metals_per_sec: f64 = supply
        .iter()
        .map(|(id, produced)| {
            if trade.flows.producer_sent.contains_key(id) {
                trade.unexported(*id)
            } else {
                *produced
            }
        })
        .sum();

    ProductionRates {
        credits_per_sec: base_credits * bonuses.credit_output * efficiency + trade_income,
        metals_per_sec,
        trade_income,
        efficiency,
    }
}

/// Apply `rates` over `delta_secs`.
pub fn integrate(resources: &mut Resources, rates: &ProductionRates, delta_secs: f64) {
    if !(delta_secs > 0.0) {
        return;
    }
    resources.credits += rates.credits_per_sec * delta_secs;
    resources.metals += rates.metals_per_sec * delta_secs;
}
