//! Galaxy data model: star systems, routes, markets and construction queues.
//!
//! `GalaxyData` is the single owned aggregate of the simulation. Everything
//! here is plain serde data; behaviour that needs wall-clock time lives in
//! `starweave-core`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::progression::{BuildingKind, ShipClass};

/// Stable system identifier, assigned once at galaxy generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub u32);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical route identifier: `"<min>-<max>"` over the two endpoint ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub String);

impl RouteId {
    /// Build the canonical id for an undirected edge between `a` and `b`.
    pub fn canonical(a: SystemId, b: SystemId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        RouteId(format!("{}-{}", lo.0, hi.0))
    }

    /// Parse a `"<a>-<b>"` id back into its endpoints, in written order.
    pub fn endpoints(&self) -> Option<(SystemId, SystemId)> {
        let (a, b) = self.0.split_once('-')?;
        Some((SystemId(a.parse().ok()?), SystemId(b.parse().ok()?)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteId {
    fn from(s: &str) -> Self {
        RouteId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    #[default]
    Unclaimed,
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Stellar classification (presentation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    #[default]
    G,
    K,
    M,
}

impl SpectralClass {
    pub const ALL: [SpectralClass; 7] = [
        SpectralClass::O,
        SpectralClass::B,
        SpectralClass::A,
        SpectralClass::F,
        SpectralClass::G,
        SpectralClass::K,
        SpectralClass::M,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetKind {
    Rocky,
    Ocean,
    Desert,
    Ice,
    GasGiant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    pub kind: PlanetKind,
    pub orbit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingState {
    pub level: u32,
}

/// Supply/demand figures for a single commodity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Commodity {
    pub supply: f64,
    pub demand: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Market {
    pub metals: Commodity,
}

impl Market {
    pub fn with_metal_demand(demand: f64) -> Self {
        Self {
            metals: Commodity {
                supply: 0.0,
                demand,
            },
        }
    }
}

/// What a queue item produces on completion. Flattened into its
/// `QueueItem` as `"type"` and `"target"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum QueueTarget {
    Building(BuildingKind),
    Ship(ShipClass),
}

/// One entry of a per-system construction queue.
///
/// Only the head of a queue carries a `start_time`; every other item waits
/// with `None` until it is promoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    #[serde(flatten)]
    pub target: QueueTarget,
    pub start_time: Option<u64>,
    pub duration: u64,
}

impl QueueItem {
    pub fn new(target: QueueTarget, duration: u64) -> Self {
        Self {
            target,
            start_time: None,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub id: SystemId,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub spectral_class: SpectralClass,
    #[serde(default = "default_size")]
    pub size: f32,
    pub owner: Owner,
    #[serde(default)]
    pub buildings: BTreeMap<BuildingKind, BuildingState>,
    #[serde(default)]
    pub construction_queue: Vec<QueueItem>,
    pub market: Market,
    #[serde(default)]
    pub planets: Vec<Planet>,
}

fn default_size() -> f32 {
    1.0
}

impl System {
    pub fn new(id: SystemId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            spectral_class: SpectralClass::default(),
            size: default_size(),
            owner: Owner::Unclaimed,
            buildings: BTreeMap::new(),
            construction_queue: Vec::new(),
            market: Market::default(),
            planets: Vec::new(),
        }
    }

    pub fn is_player(&self) -> bool {
        self.owner == Owner::Player
    }

    pub fn building_level(&self, kind: BuildingKind) -> u32 {
        self.buildings.get(&kind).map(|b| b.level).unwrap_or(0)
    }

    /// Number of not-yet-completed upgrades of `kind` waiting in the queue.
    pub fn queued_upgrades(&self, kind: BuildingKind) -> u32 {
        self.construction_queue
            .iter()
            .filter(|item| item.target == QueueTarget::Building(kind))
            .count() as u32
    }

    /// Hand the system to the player with every building at `level`.
    pub fn colonize(&mut self, level: u32) {
        self.owner = Owner::Player;
        for kind in BuildingKind::ALL {
            self.buildings.insert(kind, BuildingState { level });
        }
    }
}

/// Undirected edge between two systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub source: SystemId,
    pub target: SystemId,
}

impl Route {
    pub fn new(a: SystemId, b: SystemId) -> Self {
        Self {
            id: RouteId::canonical(a, b),
            source: a,
            target: b,
        }
    }

    /// The endpoint opposite `id`, if `id` is an endpoint at all.
    pub fn other(&self, id: SystemId) -> Option<SystemId> {
        if self.source == id {
            Some(self.target)
        } else if self.target == id {
            Some(self.source)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GalaxyData {
    pub systems: Vec<System>,
    pub routes: Vec<Route>,
}

impl GalaxyData {
    pub fn system(&self, id: SystemId) -> Option<&System> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut System> {
        self.systems.iter_mut().find(|s| s.id == id)
    }

    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.system(id).is_some()
    }

    pub fn player_systems(&self) -> impl Iterator<Item = &System> {
        self.systems.iter().filter(|s| s.is_player())
    }

    pub fn has_player_systems(&self) -> bool {
        self.systems.iter().any(System::is_player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_route_id_orders_endpoints() {
        assert_eq!(RouteId::canonical(SystemId(7), SystemId(3)).as_str(), "3-7");
        assert_eq!(
            RouteId::canonical(SystemId(3), SystemId(7)),
            RouteId::canonical(SystemId(7), SystemId(3))
        );
    }

    #[test]
    fn test_canonical_is_numeric_not_lexical() {
        assert_eq!(RouteId::canonical(SystemId(10), SystemId(9)).as_str(), "9-10");
    }

    #[test]
    fn test_route_endpoints_parse() {
        assert_eq!(
            RouteId::from("12-4").endpoints(),
            Some((SystemId(12), SystemId(4)))
        );
        assert_eq!(RouteId::from("route-4").endpoints(), None);
    }

    #[test]
    fn test_queue_item_json_is_flat() {
        let mut item = QueueItem::new(QueueTarget::Building(BuildingKind::Mine), 10);
        item.start_time = Some(5);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "building", "target": "mine", "startTime": 5, "duration": 10})
        );

        let ship: QueueItem = serde_json::from_str(
            r#"{"type": "ship", "target": "colony_ship", "startTime": null, "duration": 7}"#,
        )
        .unwrap();
        assert_eq!(ship.target, QueueTarget::Ship(ShipClass::ColonyShip));
        assert_eq!(ship.start_time, None);
        assert_eq!(serde_json::from_value::<QueueItem>(json).unwrap(), item);
    }

    #[test]
    fn test_colonize_sets_every_building() {
        let mut system = System::new(SystemId(1), "Vega", Position::new(0.0, 0.0));
        system.colonize(1);
        assert!(system.is_player());
        for kind in BuildingKind::ALL {
            assert_eq!(system.building_level(kind), 1);
        }
    }
}
