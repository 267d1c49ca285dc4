//! Save-schema migrations.
//!
//! Each migration has a `needs_*` check and is idempotent: running it on
//! already-migrated data changes nothing. Market backfill works on raw JSON
//! because a missing market cannot be told apart from a default one after
//! typed parsing.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{json, Value};
use starweave_logic::galaxy::{GalaxyData, RouteId};

/// Snapshot schema version written by this build.
pub const CURRENT_VERSION: u32 = 2;

/// Deterministic backfill demand for a system that predates markets:
/// 10 to 40 in steps of 5.
pub fn default_demand(system_id: u64) -> f64 {
    10.0 + 5.0 * (system_id % 7) as f64
}

fn systems(value: &Value) -> impl Iterator<Item = &Value> {
    value
        .get("galaxyData")
        .and_then(|g| g.get("systems"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn lacks_market(system: &Value) -> bool {
    !matches!(system.get("market"), Some(Value::Object(_)))
}

pub fn needs_market_migration(value: &Value) -> bool {
    systems(value).any(lacks_market)
}

/// Give every system without a market one. Player systems get no demand.
/// Returns how many systems were touched.
pub fn migrate_markets(value: &mut Value) -> usize {
    let Some(systems) = value
        .get_mut("galaxyData")
        .and_then(|g| g.get_mut("systems"))
        .and_then(Value::as_array_mut)
    else {
        return 0;
    };

    let mut touched = 0;
    for system in systems.iter_mut().filter(|s| lacks_market(s)) {
        let Some(fields) = system.as_object_mut() else {
            continue;
        };
        let is_player = fields.get("owner").and_then(Value::as_str) == Some("player");
        let id = fields.get("id").and_then(Value::as_u64).unwrap_or(0);
        let demand = if is_player { 0.0 } else { default_demand(id) };
        fields.insert(
            "market".to_string(),
            json!({ "metals": { "supply": 0.0, "demand": demand } }),
        );
        touched += 1;
    }
    touched
}

/// Whether any route id is non-canonical or any built id points nowhere.
pub fn needs_route_migration(galaxy: &GalaxyData, built: &BTreeSet<RouteId>) -> bool {
    galaxy
        .routes
        .iter()
        .any(|r| r.id != RouteId::canonical(r.source, r.target))
        || built.iter().any(|id| galaxy.route(id).is_none())
}

/// Rewrite route ids to `min-max` form and remap the built set onto them.
///
/// Built ids are resolved through the old-to-new rename first, then as-is,
/// then by parsing `a-b` in either order. Ids that resolve to no route are
/// dropped.
pub fn migrate_route_ids(galaxy: &mut GalaxyData, built: &BTreeSet<RouteId>) -> BTreeSet<RouteId> {
    let mut renamed: HashMap<RouteId, RouteId> = HashMap::new();
    for route in galaxy.routes.iter_mut() {
        let canonical = RouteId::canonical(route.source, route.target);
        if route.id != canonical {
            renamed.insert(route.id.clone(), canonical.clone());
            route.id = canonical;
        }
    }

    let mut seen = HashSet::new();
    galaxy.routes.retain(|r| seen.insert(r.id.clone()));

    let mut migrated = BTreeSet::new();
    for id in built {
        let resolved = renamed
            .get(id)
            .cloned()
            .or_else(|| galaxy.route(id).map(|r| r.id.clone()))
            .or_else(|| {
                let (a, b) = id.endpoints()?;
                let canonical = RouteId::canonical(a, b);
                galaxy.route(&canonical).map(|r| r.id.clone())
            });
        match resolved {
            Some(new_id) => {
                migrated.insert(new_id);
            }
            None => log::warn!("Dropping built route {} with no matching route", id),
        }
    }
    migrated
}

#[cfg(test)]
mod tests {
    use super::*;
    use starweave_logic::galaxy::{Market, Position, Route, System, SystemId};

    fn legacy_galaxy() -> GalaxyData {
        let systems = (0..4)
            .map(|i| System::new(SystemId(i), format!("S{}", i), Position::default()))
            .collect();
        // Written before ids were canonical: endpoints in generation order.
        let routes = vec![
            Route {
                id: RouteId::from("3-1"),
                source: SystemId(3),
                target: SystemId(1),
            },
            Route::new(SystemId(0), SystemId(1)),
            Route {
                id: RouteId::from("r7"),
                source: SystemId(2),
                target: SystemId(3),
            },
        ];
        GalaxyData { systems, routes }
    }

    #[test]
    fn test_default_demand_range() {
        for id in 0..50 {
            let d = default_demand(id);
            assert!((10.0..=40.0).contains(&d));
            assert_eq!(d % 5.0, 0.0);
            assert_eq!(d, default_demand(id));
        }
    }

    #[test]
    fn test_market_backfill() {
        let mut value = json!({
            "galaxyData": {
                "systems": [
                    { "id": 0, "owner": "player" },
                    { "id": 4, "owner": "unclaimed" },
                    { "id": 5, "owner": "unclaimed", "market": { "metals": { "supply": 0.0, "demand": 15.0 } } }
                ],
                "routes": []
            }
        });
        assert!(needs_market_migration(&value));
        assert_eq!(migrate_markets(&mut value), 2);
        assert!(!needs_market_migration(&value));
        assert_eq!(migrate_markets(&mut value), 0);

        let systems = value["galaxyData"]["systems"].as_array().unwrap();
        assert_eq!(systems[0]["market"]["metals"]["demand"], 0.0);
        assert_eq!(systems[1]["market"]["metals"]["demand"], default_demand(4));
        assert_eq!(systems[2]["market"]["metals"]["demand"], 15.0);

        let market: Market = serde_json::from_value(systems[1]["market"].clone()).unwrap();
        assert_eq!(market.metals.supply, 0.0);
    }

    #[test]
    fn test_route_ids_canonicalized() {
        let mut galaxy = legacy_galaxy();
        let built: BTreeSet<RouteId> = ["3-1", "r7", "0-1", "9-9"]
            .into_iter()
            .map(RouteId::from)
            .collect();
        assert!(needs_route_migration(&galaxy, &built));

        let migrated = migrate_route_ids(&mut galaxy, &built);
        let ids: Vec<&str> = galaxy.routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1-3", "0-1", "2-3"]);
        let expected: BTreeSet<RouteId> =
            ["0-1", "1-3", "2-3"].into_iter().map(RouteId::from).collect();
        assert_eq!(migrated, expected);
        assert!(!needs_route_migration(&galaxy, &migrated));
    }

    #[test]
    fn test_route_migration_idempotent() {
        let mut galaxy = legacy_galaxy();
        let built: BTreeSet<RouteId> = ["3-1", "r7"].into_iter().map(RouteId::from).collect();
        let once = migrate_route_ids(&mut galaxy, &built);
        let galaxy_once = galaxy.clone();
        let twice = migrate_route_ids(&mut galaxy, &once);
        assert_eq!(once, twice);
        assert_eq!(galaxy, galaxy_once);
    }

    #[test]
    fn test_built_id_in_reverse_order_resolves() {
        let mut galaxy = legacy_galaxy();
        let built: BTreeSet<RouteId> = ["1-0"].into_iter().map(RouteId::from).collect();
        let migrated = migrate_route_ids(&mut galaxy, &built);
        assert!(migrated.contains(&RouteId::from("0-1")));
    }
}
