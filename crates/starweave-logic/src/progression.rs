//! Progression tables: buildings, technologies and ship classes.
//!
//! Pure data plus the curves that scale it: costs and build times grow
//! geometrically with level, tech bonuses stack additively within a
//! category, and shipyards shave build time multiplicatively.

use serde::{Deserialize, Serialize};

// ============================================================================
// RESOURCES
// ============================================================================

/// The player's stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub credits: f64,
    pub metals: f64,
}

impl Resources {
    pub fn new(credits: f64, metals: f64) -> Self {
        Self { credits, metals }
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.credits >= cost.credits && self.metals >= cost.metals
    }

    /// Deduct `cost` if affordable. Leaves the balance untouched otherwise.
    pub fn try_spend(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.credits -= cost.credits;
        self.metals -= cost.metals;
        true
    }
}

/// A price in both resources. Values are whole units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cost {
    pub credits: f64,
    pub metals: f64,
}

impl Cost {
    pub const fn new(credits: f64, metals: f64) -> Self {
        Self { credits, metals }
    }

    pub const fn credits(credits: f64) -> Self {
        Self {
            credits,
            metals: 0.0,
        }
    }
}

// ============================================================================
// PRODUCTION CONSTANTS
// ============================================================================

pub mod output {
    /// Metals per second per mine level.
    pub const MINE_METALS_PER_LEVEL: f64 = 2.0;
    /// Credits per second per habitat level.
    pub const HABITAT_CREDITS_PER_LEVEL: f64 = 1.0;
    /// Credits per second from the home system's administration.
    pub const HOME_BASE_CREDITS: f64 = 2.0;
    /// Energy capacity per power plant level.
    pub const POWER_PLANT_CAPACITY_PER_LEVEL: f64 = 10.0;
    /// Energy capacity every colony provides on its own.
    pub const COLONY_BASE_CAPACITY: f64 = 5.0;
}

// ============================================================================
// BUILDINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Mine,
    PowerPlant,
    Habitat,
    Shipyard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingSpec {
    pub name: &'static str,
    pub base_cost: Cost,
    pub cost_factor: f64,
    pub base_build_time_ms: u64,
    pub build_time_factor: f64,
    /// Energy drawn per level.
    pub energy_use: f64,
    pub max_level: u32,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 4] = [
        BuildingKind::Mine,
        BuildingKind::PowerPlant,
        BuildingKind::Habitat,
        BuildingKind::Shipyard,
    ];

    pub fn spec(&self) -> BuildingSpec {
        match self {
            Self::Mine => BuildingSpec {
                name: "Metal Mine",
                base_cost: Cost::new(60.0, 20.0),
                cost_factor: 1.5,
                base_build_time_ms: 10_000,
                build_time_factor: 1.3,
                energy_use: 2.0,
                max_level: 10,
            },
            Self::PowerPlant => BuildingSpec {
                name: "Power Plant",
                base_cost: Cost::new(80.0, 40.0),
                cost_factor: 1.6,
                base_build_time_ms: 12_000,
                build_time_factor: 1.3,
                energy_use: 0.0,
                max_level: 10,
            },
            Self::Habitat => BuildingSpec {
                name: "Habitat",
                base_cost: Cost::new(100.0, 30.0),
                cost_factor: 1.5,
                base_build_time_ms: 15_000,
                build_time_factor: 1.35,
                energy_use: 1.0,
                max_level: 10,
            },
            Self::Shipyard => BuildingSpec {
                name: "Shipyard",
                base_cost: Cost::new(150.0, 80.0),
                cost_factor: 1.8,
                base_build_time_ms: 20_000,
                build_time_factor: 1.4,
                energy_use: 3.0,
                max_level: 5,
            },
        }
    }

    /// Stable string key, matching the serialized form.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Mine => "mine",
            Self::PowerPlant => "power_plant",
            Self::Habitat => "habitat",
            Self::Shipyard => "shipyard",
        }
    }
}

/// Cost of building `kind` from `level` to `level + 1`.
pub fn building_cost(kind: BuildingKind, level: u32) -> Cost {
    let spec = kind.spec();
    let factor = spec.cost_factor.powi(level as i32);
    Cost {
        credits: (spec.base_cost.credits * factor).floor(),
        metals: (spec.base_cost.metals * factor).floor(),
    }
}

/// Build time for taking `kind` from `level` to `level + 1`.
pub fn building_time_ms(kind: BuildingKind, level: u32) -> u64 {
    let spec = kind.spec();
    (spec.base_build_time_ms as f64 * spec.build_time_factor.powi(level as i32)).round() as u64
}

// ============================================================================
// SHIPS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
    ColonyShip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipSpec {
    pub name: &'static str,
    pub cost: Cost,
    pub base_build_time_ms: u64,
    /// Energy drawn while docked.
    pub energy_use: f64,
}

impl ShipClass {
    pub const ALL: [ShipClass; 1] = [ShipClass::ColonyShip];

    pub fn spec(&self) -> ShipSpec {
        match self {
            Self::ColonyShip => ShipSpec {
                name: "Colony Ship",
                cost: Cost::new(120.0, 60.0),
                base_build_time_ms: 20_000,
                energy_use: 1.0,
            },
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::ColonyShip => "colony_ship",
        }
    }
}

/// Each shipyard level shaves 10% off the remaining build time.
pub fn ship_build_time_ms(class: ShipClass, shipyard_level: u32) -> u64 {
    let base = class.spec().base_build_time_ms as f64;
    (base * 0.9_f64.powi(shipyard_level as i32)).round() as u64
}

// ============================================================================
// TECHNOLOGY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechId {
    AdvancedMining,
    DeepCoreMining,
    FusionPower,
    Administration,
    TradeProtocols,
    FtlDrives,
    LongRangeScanners,
    ColonyPrefabs,
}

/// Which modifier a tech feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusCategory {
    MiningOutput,
    CreditOutput,
    EnergyCapacity,
    TradeIncome,
    TravelSpeed,
    ScanSpeed,
    /// New colonies start with level-1 buildings. Boolean, not additive.
    ColonyBonus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechEffect {
    pub category: BonusCategory,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub cost: Cost,
    pub research_time_ms: u64,
    pub prerequisites: &'static [TechId],
    pub effect: TechEffect,
}

impl TechId {
    pub const ALL: [TechId; 8] = [
        TechId::AdvancedMining,
        TechId::DeepCoreMining,
        TechId::FusionPower,
        TechId::Administration,
        TechId::TradeProtocols,
        TechId::FtlDrives,
        TechId::LongRangeScanners,
        TechId::ColonyPrefabs,
    ];

    pub fn spec(&self) -> TechSpec {
        use BonusCategory::*;
        match self {
            Self::AdvancedMining => TechSpec {
                name: "Advanced Mining",
                description: "Improved extraction rigs. +25% mine output.",
                cost: Cost::credits(200.0),
                research_time_ms: 30_000,
                prerequisites: &[],
                effect: TechEffect {
                    category: MiningOutput,
                    size: 0.25,
                },
            },
            Self::DeepCoreMining => TechSpec {
                name: "Deep Core Mining",
                description: "Tap planetary mantles. Another +25% mine output.",
                cost: Cost::credits(450.0),
                research_time_ms: 60_000,
                prerequisites: &[TechId::AdvancedMining],
                effect: TechEffect {
                    category: MiningOutput,
                    size: 0.25,
                },
            },
            Self::FusionPower => TechSpec {
                name: "Fusion Power",
                description: "Compact reactors. +25% energy capacity.",
                cost: Cost::credits(250.0),
                research_time_ms: 40_000,
                prerequisites: &[],
                effect: TechEffect {
                    category: EnergyCapacity,
                    size: 0.25,
                },
            },
            Self::Administration => TechSpec {
                name: "Colonial Administration",
                description: "Streamlined bureaucracy. +25% credit output.",
                cost: Cost::credits(150.0),
                research_time_ms: 25_000,
                prerequisites: &[],
                effect: TechEffect {
                    category: CreditOutput,
                    size: 0.25,
                },
            },
            Self::TradeProtocols => TechSpec {
                name: "Trade Protocols",
                description: "Standardised contracts. +20% trade income.",
                cost: Cost::credits(300.0),
                research_time_ms: 45_000,
                prerequisites: &[TechId::Administration],
                effect: TechEffect {
                    category: TradeIncome,
                    size: 0.2,
                },
            },
            Self::FtlDrives => TechSpec {
                name: "FTL Drives",
                description: "Faster hyperlane transit. +50% travel speed.",
                cost: Cost::credits(400.0),
                research_time_ms: 60_000,
                prerequisites: &[TechId::FusionPower],
                effect: TechEffect {
                    category: TravelSpeed,
                    size: 0.5,
                },
            },
            Self::LongRangeScanners => TechSpec {
                name: "Long Range Scanners",
                description: "Deep-space arrays. +50% scan speed.",
                cost: Cost::credits(350.0),
                research_time_ms: 50_000,
                prerequisites: &[TechId::FusionPower],
                effect: TechEffect {
                    category: ScanSpeed,
                    size: 0.5,
                },
            },
            Self::ColonyPrefabs => TechSpec {
                name: "Colony Prefabs",
                description: "New colonies arrive with starter infrastructure.",
                cost: Cost::credits(600.0),
                research_time_ms: 90_000,
                prerequisites: &[TechId::DeepCoreMining, TechId::TradeProtocols],
                effect: TechEffect {
                    category: ColonyBonus,
                    size: 1.0,
                },
            },
        }
    }

    pub fn prerequisites_met<'a>(&self, researched: impl IntoIterator<Item = &'a TechId>) -> bool {
        let done: Vec<&TechId> = researched.into_iter().collect();
        self.spec()
            .prerequisites
            .iter()
            .all(|p| done.contains(&p))
    }
}

/// Aggregated multipliers from every researched tech.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechBonuses {
    pub mining_output: f64,
    pub credit_output: f64,
    pub energy_capacity: f64,
    pub trade_income: f64,
    pub travel_speed: f64,
    pub scan_speed: f64,
    pub colony_bonus: bool,
}

impl Default for TechBonuses {
    fn default() -> Self {
        Self {
            mining_output: 1.0,
            credit_output: 1.0,
            energy_capacity: 1.0,
            trade_income: 1.0,
            travel_speed: 1.0,
            scan_speed: 1.0,
            colony_bonus: false,
        }
    }
}

impl TechBonuses {
    /// `1 + Σ sizes` per category; colony bonus is an OR.
    pub fn from_researched<'a>(researched: impl IntoIterator<Item = &'a TechId>) -> Self {
        let mut bonuses = Self::default();
        for tech in researched {
            let effect = tech.spec().effect;
            match effect.category {
                BonusCategory::MiningOutput => bonuses.mining_output += effect.size,
                BonusCategory::CreditOutput => bonuses.credit_output += effect.size,
                BonusCategory::EnergyCapacity => bonuses.energy_capacity += effect.size,
                BonusCategory::TradeIncome => bonuses.trade_income += effect.size,
                BonusCategory::TravelSpeed => bonuses.travel_speed += effect.size,
                BonusCategory::ScanSpeed => bonuses.scan_speed += effect.size,
                BonusCategory::ColonyBonus => bonuses.colony_bonus = true,
            }
        }
        bonuses
    }

    /// Building level granted to freshly colonized systems.
    pub fn colony_start_level(&self) -> u32 {
        if self.colony_bonus {
            1
        } else {
            0
        }
    }
}
