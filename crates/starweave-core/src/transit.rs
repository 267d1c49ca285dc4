//! Ships in flight between systems.
//!
//! A launched ship carries its hop list, launch time and total flight time;
//! its position is recomputed each tick from elapsed time. Speed bonuses
//! researched mid-flight apply to the next launch.

use starweave_logic::galaxy::SystemId;
use starweave_logic::progression::TechBonuses;

use crate::config::SimConfig;
use crate::state::{GameState, Ship, ShipId, ShipStatus, Timestamp};

/// A ship that reached its destination this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub ship: ShipId,
    pub destination: SystemId,
    /// False when the destination was already ours.
    pub colonized: bool,
}

/// Total travel time over `hops` route segments.
pub fn travel_time_ms(hops: usize, config: &SimConfig, bonuses: &TechBonuses) -> u64 {
    let speed = if bonuses.travel_speed > 0.0 {
        bonuses.travel_speed
    } else {
        1.0
    };
    (hops as f64 * config.per_hop_time_ms as f64 / speed).round() as u64
}

/// Put a docked ship on `route`, which excludes the origin.
pub fn begin_transit(
    ship: &mut Ship,
    destination: SystemId,
    route: Vec<SystemId>,
    travel_time: u64,
    now: Timestamp,
) {
    ship.status = ShipStatus::Transit;
    ship.destination_id = Some(destination);
    ship.route = Some(route);
    ship.current_segment = Some(0);
    ship.segment_progress = Some(0.0);
    ship.launch_time = Some(now);
    ship.travel_time = Some(travel_time);
}

/// `(segment, progress within segment)` for a route fraction below 1.
fn segment_position(progress: f64, hops: usize) -> (usize, f64) {
    let scaled = progress * hops as f64;
    let segment = (scaled.floor() as usize).min(hops.saturating_sub(1));
    (segment, (scaled - segment as f64).clamp(0.0, 1.0))
}

/// Move every ship in transit; arrived ships colonize and are removed.
pub fn advance_ships(
    state: &mut GameState,
    config: &SimConfig,
    bonuses: &TechBonuses,
    now: Timestamp,
) -> Vec<Arrival> {
    let mut landed = Vec::new();
    for ship in state.ships.iter_mut() {
        if ship.status != ShipStatus::Transit {
            continue;
        }
        let hops = ship.route.as_ref().map_or(0, Vec::len);
        // Saves from before flight times were stored fall back to current speed.
        let total = ship
            .travel_time
            .unwrap_or_else(|| travel_time_ms(hops, config, bonuses));
        let elapsed = now.saturating_sub(ship.launch_time.unwrap_or(now));
        let progress = if total == 0 {
            1.0
        } else {
            elapsed as f64 / total as f64
        };

        if progress >= 1.0 {
            let destination = ship
                .destination_id
                .or_else(|| ship.route.as_ref().and_then(|r| r.last().copied()))
                .unwrap_or(ship.system_id);
            landed.push((ship.id, destination));
        } else {
            let (segment, within) = segment_position(progress, hops);
            ship.current_segment = Some(segment);
            ship.segment_progress = Some(within);
        }
    }

    let level = bonuses.colony_start_level();
    let mut arrivals = Vec::with_capacity(landed.len());
    for (ship_id, destination) in landed {
        state.ships.retain(|s| s.id != ship_id);
        let colonized = match state.galaxy.system_mut(destination) {
            Some(system) if !system.is_player() => {
                system.colonize(level);
                true
            }
            _ => false,
        };
        arrivals.push(Arrival {
            ship: ship_id,
            destination,
            colonized,
        });
    }
    arrivals
}

#[cfg(test)]
mod tests {
    use super::*;
    use starweave_logic::galaxy::{GalaxyData, Owner, Position, Route, System};
    use starweave_logic::progression::{BuildingKind, ShipClass, TechId};

    fn state_with_ship() -> GameState {
        let systems = (0..4)
            .map(|i| System::new(SystemId(i), format!("S{}", i), Position::default()))
            .collect();
        let routes = (1..4).map(|i| Route::new(SystemId(i - 1), SystemId(i))).collect();
        let mut state = GameState {
            galaxy: GalaxyData { systems, routes },
            home_system_id: Some(SystemId(0)),
            ..Default::default()
        };
        state.galaxy.system_mut(SystemId(0)).unwrap().colonize(1);
        let mut ship = Ship::docked(ShipId(0), ShipClass::ColonyShip, SystemId(0));
        let route = vec![SystemId(1), SystemId(2), SystemId(3)];
        let total = travel_time_ms(route.len(), &SimConfig::default(), &TechBonuses::default());
        begin_transit(&mut ship, SystemId(3), route, total, 1000);
        state.ships.push(ship);
        state
    }

    #[test]
    fn test_travel_time_scales_with_bonus() {
        let config = SimConfig::default();
        assert_eq!(travel_time_ms(3, &config, &TechBonuses::default()), 24_000);
        let ftl = TechBonuses::from_researched([TechId::FtlDrives].iter());
        assert_eq!(travel_time_ms(3, &config, &ftl), 16_000);
    }

    #[test]
    fn test_segment_progress() {
        let mut state = state_with_ship();
        let config = SimConfig::default();
        // Halfway through 24s: segment 1, half done.
        let arrivals = advance_ships(&mut state, &config, &TechBonuses::default(), 13_000);
        assert!(arrivals.is_empty());
        let ship = &state.ships[0];
        assert_eq!(ship.current_segment, Some(1));
        assert!((ship.segment_progress.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_arrival_colonizes_and_removes_ship() {
        let mut state = state_with_ship();
        let config = SimConfig::default();
        let arrivals = advance_ships(&mut state, &config, &TechBonuses::default(), 25_000);
        assert_eq!(
            arrivals,
            vec![Arrival {
                ship: ShipId(0),
                destination: SystemId(3),
                colonized: true
            }]
        );
        assert!(state.ships.is_empty());
        let dest = state.galaxy.system(SystemId(3)).unwrap();
        assert_eq!(dest.owner, Owner::Player);
        assert_eq!(dest.building_level(BuildingKind::Mine), 0);
    }

    #[test]
    fn test_arrival_with_colony_bonus() {
        let mut state = state_with_ship();
        let bonuses = TechBonuses::from_researched([TechId::ColonyPrefabs].iter());
        advance_ships(&mut state, &SimConfig::default(), &bonuses, 100_000);
        let dest = state.galaxy.system(SystemId(3)).unwrap();
        assert_eq!(dest.building_level(BuildingKind::Mine), 1);
    }

    #[test]
    fn test_speed_bonus_mid_flight_keeps_position() {
        let mut state = state_with_ship();
        let config = SimConfig::default();
        let ftl = TechBonuses::from_researched([TechId::FtlDrives].iter());
        // Launched at the base 24s; FTL finishing later does not move it.
        advance_ships(&mut state, &config, &ftl, 13_000);
        let ship = &state.ships[0];
        assert_eq!(ship.current_segment, Some(1));
        assert!((ship.segment_progress.unwrap() - 0.5).abs() < 1e-9);
        assert!(advance_ships(&mut state, &config, &ftl, 24_000).is_empty());
        assert_eq!(advance_ships(&mut state, &config, &ftl, 25_000).len(), 1);
    }

    #[test]
    fn test_legacy_ship_without_travel_time() {
        let mut state = state_with_ship();
        state.ships[0].travel_time = None;
        let ftl = TechBonuses::from_researched([TechId::FtlDrives].iter());
        // Falls back to the current 16s route time.
        assert_eq!(advance_ships(&mut state, &SimConfig::default(), &ftl, 17_000).len(), 1);
    }

    #[test]
    fn test_docked_ships_stay_put() {
        let mut state = state_with_ship();
        state.ships[0] = Ship::docked(ShipId(0), ShipClass::ColonyShip, SystemId(0));
        let arrivals = advance_ships(&mut state, &SimConfig::default(), &TechBonuses::default(), 1_000_000);
        assert!(arrivals.is_empty());
        assert_eq!(state.ships.len(), 1);
    }
}
