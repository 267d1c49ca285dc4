//! Save/Load functionality for persisting simulation state
//!
//! The whole game is one camelCase JSON document stored under a single key.
//! Loading parses, migrates older schemas, then validates ownership before
//! the state is adopted. Saving refuses states that would fail that same
//! validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use starweave_logic::galaxy::{GalaxyData, RouteId, SystemId};
use starweave_logic::progression::Resources;

use crate::migration::{
    migrate_markets, migrate_route_ids, needs_market_migration, needs_route_migration,
    CURRENT_VERSION,
};
use crate::scheduler::normalize_queue;
use crate::state::{Corruption, GameState, ScanState, Ship, TechState, Timestamp, ViewState};
use crate::store::{KeyValueStore, StoreError};

/// Saves written before the version field existed.
fn legacy_version() -> u32 {
    1
}

/// Serializable snapshot of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub galaxy_data: GalaxyData,
    pub home_system_id: Option<SystemId>,
    pub resources: Resources,
    #[serde(default)]
    pub ships: Vec<Ship>,
    #[serde(default)]
    pub built_routes: Vec<RouteId>,
    #[serde(default)]
    pub tech: TechState,
    #[serde(default)]
    pub scanning_system: Option<ScanState>,
    #[serde(default)]
    pub view_state: ViewState,
    #[serde(default)]
    pub last_saved: Option<Timestamp>,
    #[serde(default)]
    pub next_ship_id: u32,
}

impl SaveData {
    pub fn capture(state: &GameState, now: Timestamp) -> Self {
        Self {
            version: CURRENT_VERSION,
            galaxy_data: state.galaxy.clone(),
            home_system_id: state.home_system_id,
            resources: state.resources,
            ships: state.ships.clone(),
            built_routes: state.built_routes.iter().cloned().collect(),
            tech: state.tech.clone(),
            scanning_system: state.scanning_system,
            view_state: state.view_state,
            last_saved: Some(now),
            next_ship_id: state.next_ship_id,
        }
    }

    fn into_state(self) -> GameState {
        GameState {
            galaxy: self.galaxy_data,
            home_system_id: self.home_system_id,
            resources: self.resources,
            ships: self.ships,
            built_routes: self.built_routes.into_iter().collect(),
            tech: self.tech,
            scanning_system: self.scanning_system,
            view_state: self.view_state,
            next_ship_id: self.next_ship_id,
        }
    }
}

/// A validated state ready to adopt.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGame {
    pub state: GameState,
    pub last_saved: Option<Timestamp>,
    /// Schema version found in storage, before migration.
    pub version: u32,
    /// Whether any migration or repair changed the stored data.
    pub migrated: bool,
}

#[derive(Debug)]
pub enum PersistenceError {
    /// The stored text is not a readable snapshot.
    Parse(serde_json::Error),
    Encode(serde_json::Error),
    Store(StoreError),
    /// The snapshot parsed but its ownership data cannot be trusted.
    Corrupt(Corruption),
    UnsupportedVersion { found: u32, supported: u32 },
}

impl PersistenceError {
    /// Whether the stored blob should be replaced with a fresh game.
    pub fn is_unrecoverable_save(&self) -> bool {
        matches!(
            self,
            PersistenceError::Parse(_)
                | PersistenceError::Corrupt(_)
                | PersistenceError::UnsupportedVersion { .. }
        )
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Parse(e)
    }
}

impl From<StoreError> for PersistenceError {
    fn from(e: StoreError) -> Self {
        PersistenceError::Store(e)
    }
}

impl From<Corruption> for PersistenceError {
    fn from(e: Corruption) -> Self {
        PersistenceError::Corrupt(e)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Parse(e) => write!(f, "Unreadable save: {}", e),
            PersistenceError::Encode(e) => write!(f, "Serialization error: {}", e),
            PersistenceError::Store(e) => write!(f, "Storage error: {}", e),
            PersistenceError::Corrupt(c) => write!(f, "Corrupted save: {}", c),
            PersistenceError::UnsupportedVersion { found, supported } => write!(
                f,
                "Save version {} is newer than supported version {}",
                found, supported
            ),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Serialize `state`, refusing inconsistent ownership.
pub fn encode(state: &GameState, now: Timestamp) -> Result<String, PersistenceError> {
    state.check_consistency()?;
    serde_json::to_string(&SaveData::capture(state, now)).map_err(PersistenceError::Encode)
}

/// Parse, migrate and validate a stored snapshot.
pub fn decode(text: &str) -> Result<LoadedGame, PersistenceError> {
    let mut value: Value = serde_json::from_str(text)?;

    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .map_or(legacy_version(), |v| v.min(u32::MAX as u64) as u32);
    if version > CURRENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let mut migrated = false;
    if needs_market_migration(&value) {
        let touched = migrate_markets(&mut value);
        log::info!("Backfilled markets for {} systems", touched);
        migrated = true;
    }

    let data: SaveData = serde_json::from_value(value)?;
    let last_saved = data.last_saved;
    let mut state = data.into_state();

    if needs_route_migration(&state.galaxy, &state.built_routes) {
        state.built_routes = migrate_route_ids(&mut state.galaxy, &state.built_routes);
        log::info!("Migrated route ids to canonical form");
        migrated = true;
    }

    migrated |= repair(&mut state);
    state.check_consistency()?;

    if version < CURRENT_VERSION {
        log::info!("Migrating save from v{} to v{}", version, CURRENT_VERSION);
        migrated = true;
    }

    Ok(LoadedGame {
        state,
        last_saved,
        version,
        migrated,
    })
}

/// Drop references the rest of the state cannot resolve.
fn repair(state: &mut GameState) -> bool {
    let mut changed = false;
    for system in state.galaxy.systems.iter_mut() {
        changed |= normalize_queue(system);
    }

    let known: BTreeSet<SystemId> = state.galaxy.systems.iter().map(|s| s.id).collect();
    let before = state.ships.len();
    state.ships.retain(|ship| {
        let ok = known.contains(&ship.system_id)
            && ship.destination_id.map_or(true, |d| known.contains(&d));
        if !ok {
            log::warn!("Dropping ship {} referencing unknown systems", ship.id);
        }
        ok
    });
    changed |= state.ships.len() != before;

    if let Some(scan) = state.scanning_system {
        if !known.contains(&scan.system_id) {
            log::warn!("Dropping scan of unknown system {}", scan.system_id);
            state.scanning_system = None;
            changed = true;
        }
    }
    changed
}

pub fn save_state<S: KeyValueStore>(
    store: &mut S,
    key: &str,
    state: &GameState,
    now: Timestamp,
) -> Result<(), PersistenceError> {
    let text = encode(state, now)?;
    store.set(key, &text)?;
    log::debug!("Saved game ({} bytes)", text.len());
    Ok(())
}

/// `Ok(None)` when nothing is stored under `key`.
pub fn load_state<S: KeyValueStore>(
    store: &S,
    key: &str,
) -> Result<Option<LoadedGame>, PersistenceError> {
    match store.get(key)? {
        Some(text) => decode(&text).map(Some),
        None => Ok(None),
    }
}
