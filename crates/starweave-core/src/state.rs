//! Authoritative game state. Everything here is persisted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use starweave_logic::galaxy::{GalaxyData, RouteId, SystemId};
use starweave_logic::progression::{Resources, ShipClass, TechBonuses, TechId};

/// Milliseconds of wall-clock time.
pub type Timestamp = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipId(pub u32);

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipStatus {
    Docked,
    Transit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ship {
    pub id: ShipId,
    pub class: ShipClass,
    /// Origin system; fixed once launched.
    pub system_id: SystemId,
    pub status: ShipStatus,
    #[serde(default)]
    pub destination_id: Option<SystemId>,
    /// Hops to travel, excluding the origin.
    #[serde(default)]
    pub route: Option<Vec<SystemId>>,
    #[serde(default)]
    pub current_segment: Option<usize>,
    #[serde(default)]
    pub segment_progress: Option<f64>,
    #[serde(default)]
    pub launch_time: Option<Timestamp>,
    /// Total flight time, fixed at launch.
    #[serde(default)]
    pub travel_time: Option<u64>,
}

impl Ship {
    pub fn docked(id: ShipId, class: ShipClass, system_id: SystemId) -> Self {
        Self {
            id,
            class,
            system_id,
            status: ShipStatus::Docked,
            destination_id: None,
            route: None,
            current_segment: None,
            segment_progress: None,
            launch_time: None,
            travel_time: None,
        }
    }

    pub fn is_docked(&self) -> bool {
        self.status == ShipStatus::Docked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentResearch {
    pub id: TechId,
    pub start_time: Timestamp,
    pub duration: u64,
    /// Derived each tick for presentation.
    pub remaining_time: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TechState {
    pub researched: BTreeSet<TechId>,
    pub current: Option<CurrentResearch>,
}

impl TechState {
    pub fn bonuses(&self) -> TechBonuses {
        TechBonuses::from_researched(&self.researched)
    }

    pub fn is_researched(&self, id: TechId) -> bool {
        self.researched.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub system_id: SystemId,
    pub start_time: Timestamp,
    pub duration: u64,
}

/// Camera state owned by the presentation layer, persisted for convenience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    #[serde(default)]
    pub selected_system: Option<SystemId>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            selected_system: None,
        }
    }
}

/// Why a state must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Player systems exist but no home is recorded.
    MissingHome,
    /// The recorded home is not in the galaxy.
    UnknownHome(SystemId),
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corruption::MissingHome => write!(f, "player systems exist without a home system"),
            Corruption::UnknownHome(id) => write!(f, "home system {} does not exist", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    pub galaxy: GalaxyData,
    pub home_system_id: Option<SystemId>,
    pub resources: Resources,
    pub ships: Vec<Ship>,
    pub built_routes: BTreeSet<RouteId>,
    pub tech: TechState,
    pub scanning_system: Option<ScanState>,
    pub view_state: ViewState,
    pub next_ship_id: u32,
}

impl GameState {
    /// Ownership/home consistency. Empty galaxies are trivially consistent.
    pub fn check_consistency(&self) -> Result<(), Corruption> {
        if !self.galaxy.has_player_systems() {
            return Ok(());
        }
        match self.home_system_id {
            None => Err(Corruption::MissingHome),
            Some(home) if !self.galaxy.contains(home) => Err(Corruption::UnknownHome(home)),
            Some(_) => Ok(()),
        }
    }

    pub fn allocate_ship_id(&mut self) -> ShipId {
        let floor = self.ships.iter().map(|s| s.id.0 + 1).max().unwrap_or(0);
        let id = self.next_ship_id.max(floor);
        self.next_ship_id = id + 1;
        ShipId(id)
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    pub fn docked_ship_count(&self) -> usize {
        self.ships.iter().filter(|s| s.is_docked()).count()
    }
}
