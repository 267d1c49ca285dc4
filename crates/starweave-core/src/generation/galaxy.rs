//! Galaxy generation - scatters systems over a disc and wires them into a
//! connected hyperlane graph

use std::collections::{HashSet, VecDeque};
use std::f64::consts::TAU;

use rand::Rng;
use starweave_logic::galaxy::{
    GalaxyData, Market, Owner, Planet, PlanetKind, Position, Route, RouteId, SpectralClass,
    System, SystemId,
};
use starweave_logic::progression::BuildingKind;
use starweave_logic::topology::{hop_distances, Adjacency};

use super::names::{generate_star_name, planet_name};
use crate::config::GalaxyConfig;

/// Placement attempts per system before accepting a crowded spot.
const PLACEMENT_ATTEMPTS: usize = 30;

/// Relative frequency of each spectral class, hottest first.
const SPECTRAL_WEIGHTS: [u32; 7] = [1, 2, 4, 8, 12, 18, 25];

const PLANET_KINDS: [PlanetKind; 5] = [
    PlanetKind::Rocky,
    PlanetKind::Ocean,
    PlanetKind::Desert,
    PlanetKind::Ice,
    PlanetKind::GasGiant,
];

/// Build a new galaxy. Returns it with the id of the player's home system.
pub fn generate_galaxy(config: &GalaxyConfig, rng: &mut impl Rng) -> (GalaxyData, SystemId) {
    let count = config.system_count.max(1) as usize;
    let positions = scatter_positions(count, config.radius, rng);

    let mut used_names = HashSet::new();
    let mut systems: Vec<System> = positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let id = SystemId(i as u32);
            let name = unique_name(&mut used_names, id, rng);
            let mut system = System::new(id, name, position);
            system.spectral_class = pick_spectral_class(rng);
            system.size = rng.gen_range(0.6..1.6);
            system.planets = generate_planets(&system.name, rng);
            system
        })
        .collect();

    let routes = connect_systems(&systems, config.extra_links);

    let home_idx = rng.gen_range(0..count);
    let home_id = systems[home_idx].id;

    let demand_share = if config.demand_share.is_finite() {
        config.demand_share.clamp(0.0, 1.0)
    } else {
        0.0
    };
    for system in systems.iter_mut() {
        if system.id != home_id && rng.gen_bool(demand_share) {
            system.market = Market::with_metal_demand(5.0 * rng.gen_range(2..=8) as f64);
        }
    }

    let home = &mut systems[home_idx];
    home.colonize(0);
    for kind in [BuildingKind::Mine, BuildingKind::PowerPlant, BuildingKind::Habitat] {
        home.buildings.entry(kind).or_default().level = 1;
    }

    let mut galaxy = GalaxyData { systems, routes };
    place_enemies(&mut galaxy, home_id, config.enemy_count as usize);

    log::info!(
        "Generated galaxy: {} systems, {} routes, home {}",
        galaxy.systems.len(),
        galaxy.routes.len(),
        home_id
    );
    (galaxy, home_id)
}

/// Uniform points in a disc, keeping a minimum spacing where possible.
fn scatter_positions(count: usize, radius: f64, rng: &mut impl Rng) -> Vec<Position> {
    let radius = if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        1.0
    };
    let spacing = radius / (count as f64).sqrt() * 0.5;
    let mut positions: Vec<Position> = Vec::with_capacity(count);

    for _ in 0..count {
        let mut candidate = random_in_disc(radius, rng);
        for _ in 0..PLACEMENT_ATTEMPTS {
            if positions.iter().all(|p| p.distance(&candidate) >= spacing) {
                break;
            }
            candidate = random_in_disc(radius, rng);
        }
        positions.push(candidate);
    }
    positions
}

fn random_in_disc(radius: f64, rng: &mut impl Rng) -> Position {
    let r = radius * rng.gen::<f64>().sqrt();
    let theta = rng.gen_range(0.0..TAU);
    Position::new(r * theta.cos(), r * theta.sin())
}

fn unique_name(used: &mut HashSet<String>, id: SystemId, rng: &mut impl Rng) -> String {
    for _ in 0..10 {
        let name = generate_star_name(rng);
        if used.insert(name.clone()) {
            return name;
        }
    }
    let name = format!("{}-{}", generate_star_name(rng), id);
    used.insert(name.clone());
    name
}

fn pick_spectral_class(rng: &mut impl Rng) -> SpectralClass {
    let total: u32 = SPECTRAL_WEIGHTS.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (class, weight) in SpectralClass::ALL.iter().zip(SPECTRAL_WEIGHTS) {
        if roll < weight {
            return *class;
        }
        roll -= weight;
    }
    SpectralClass::M
}

fn generate_planets(star: &str, rng: &mut impl Rng) -> Vec<Planet> {
    let count = rng.gen_range(0..=5);
    let mut orbit = 0.0_f32;
    (0..count)
        .map(|i| {
            orbit += rng.gen_range(0.3..1.2);
            Planet {
                name: planet_name(star, i),
                kind: PLANET_KINDS[rng.gen_range(0..PLANET_KINDS.len())],
                orbit,
            }
        })
        .collect()
}

/// Minimum spanning tree (Prim) plus `extra_links` nearest neighbours per
/// system. The tree guarantees connectivity.
fn connect_systems(systems: &[System], extra_links: usize) -> Vec<Route> {
    let n = systems.len();
    let mut routes = Vec::new();
    let mut seen: HashSet<RouteId> = HashSet::new();
    let mut add = |a: SystemId, b: SystemId, routes: &mut Vec<Route>| {
        let route = Route::new(a, b);
        if a != b && seen.insert(route.id.clone()) {
            routes.push(route);
        }
    };

    let dist = |a: usize, b: usize| systems[a].position.distance(&systems[b].position);

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    best[0] = 0.0;
    for _ in 0..n {
        let next = (0..n)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]));
        let Some(u) = next else { break };
        in_tree[u] = true;
        if let Some(p) = parent[u] {
            add(systems[p].id, systems[u].id, &mut routes);
        }
        for v in 0..n {
            if !in_tree[v] && dist(u, v) < best[v] {
                best[v] = dist(u, v);
                parent[v] = Some(u);
            }
        }
    }

    for i in 0..n {
        let mut others: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        others.sort_by(|&a, &b| dist(i, a).total_cmp(&dist(i, b)));
        for &j in others.iter().take(extra_links) {
            add(systems[i].id, systems[j].id, &mut routes);
        }
    }

    routes
}

/// Hand the systems farthest from home (by hops) to the enemy.
fn place_enemies(galaxy: &mut GalaxyData, home: SystemId, count: usize) {
    if count == 0 {
        return;
    }
    let adjacency = Adjacency::from_routes(&galaxy.routes);
    let dist = hop_distances(&adjacency, [home], u32::MAX);

    let mut candidates: Vec<(u32, SystemId)> = galaxy
        .systems
        .iter()
        .filter(|s| s.id != home)
        .map(|s| (dist.get(&s.id).copied().unwrap_or(u32::MAX), s.id))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    for (_, id) in candidates.into_iter().take(count) {
        if let Some(system) = galaxy.system_mut(id) {
            system.owner = Owner::Enemy;
        }
    }
}

/// Every system reachable from `start`.
pub fn reachable_from(galaxy: &GalaxyData, start: SystemId) -> HashSet<SystemId> {
    let adjacency = Adjacency::from_routes(&galaxy.routes);
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for &next in adjacency.neighbors(current) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
