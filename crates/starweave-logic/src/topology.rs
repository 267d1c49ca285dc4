//! Fog-of-war visibility and pathfinding over the route graph.
//!
//! Both are plain BFS over an undirected adjacency list built from the
//! galaxy's routes. Neighbour lists keep route insertion order, which makes
//! every search deterministic for a given galaxy.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::galaxy::{GalaxyData, Route, SystemId};

/// Systems within this many hops of player territory are visible.
pub const VISIBILITY_RADIUS: u32 = 2;
/// Hop radius explored to find frontier tethers.
pub const TETHER_RADIUS: u32 = 3;

/// Undirected adjacency list.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    adj: HashMap<SystemId, Vec<SystemId>>,
}

impl Adjacency {
    pub fn from_routes(routes: &[Route]) -> Self {
        let mut adj: HashMap<SystemId, Vec<SystemId>> = HashMap::new();
        for route in routes {
            adj.entry(route.source).or_default().push(route.target);
            adj.entry(route.target).or_default().push(route.source);
        }
        Self { adj }
    }

    pub fn neighbors(&self, id: SystemId) -> &[SystemId] {
        self.adj.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Shortest hop path from `start` to `end`, excluding `start`.
    pub fn find_path(&self, start: SystemId, end: SystemId) -> Option<Vec<SystemId>> {
        if start == end {
            return Some(vec![]);
        }

        let mut parent: HashMap<SystemId, SystemId> = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for &next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == end {
                    let mut path = vec![end];
                    let mut cursor = end;
                    while let Some(&prev) = parent.get(&cursor) {
                        if prev == start {
                            break;
                        }
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }
}

/// Multi-source BFS: hop distance from the nearest source, up to `max_depth`.
pub fn hop_distances(
    adjacency: &Adjacency,
    sources: impl IntoIterator<Item = SystemId>,
    max_depth: u32,
) -> HashMap<SystemId, u32> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    for source in sources {
        if dist.insert(source, 0).is_none() {
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        let d = dist[&current];
        if d >= max_depth {
            continue;
        }
        for &next in adjacency.neighbors(current) {
            if !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }

    dist
}

/// Presentation-only hint edge pointing at unexplored territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetherRoute {
    pub id: String,
    pub source: SystemId,
    pub target: SystemId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    pub visible_ids: BTreeSet<SystemId>,
    pub tether_routes: Vec<TetherRoute>,
}

impl Visibility {
    pub fn is_visible(&self, id: SystemId) -> bool {
        self.visible_ids.contains(&id)
    }
}

/// Compute fog of war from every player-owned system.
///
/// Empty when there is no home system or the galaxy is empty. The home only
/// gates the result; an unowned home is not a source.
pub fn calculate_visible_systems(galaxy: &GalaxyData, home: Option<SystemId>) -> Visibility {
    let Some(home) = home else {
        return Visibility::default();
    };
    if galaxy.systems.is_empty() || !galaxy.contains(home) {
        return Visibility::default();
    }

    let adjacency = Adjacency::from_routes(&galaxy.routes);
    let sources = galaxy.player_systems().map(|s| s.id);
    let dist = hop_distances(&adjacency, sources, TETHER_RADIUS);

    let visible_ids = dist
        .iter()
        .filter(|(_, d)| **d <= VISIBILITY_RADIUS)
        .map(|(&id, _)| id)
        .collect();

    let mut seen = HashSet::new();
    let mut tether_routes = Vec::new();
    for system in &galaxy.systems {
        if dist.get(&system.id) != Some(&VISIBILITY_RADIUS) {
            continue;
        }
        for &next in adjacency.neighbors(system.id) {
            if dist.get(&next) == Some(&TETHER_RADIUS) && seen.insert((system.id, next)) {
                tether_routes.push(TetherRoute {
                    id: format!("tether-{}-{}", system.id, next),
                    source: system.id,
                    target: next,
                });
            }
        }
    }

    Visibility {
        visible_ids,
        tether_routes,
    }
}

/// Shortest hop path between two systems, excluding `start`.
///
/// `None` when the systems are disconnected or unknown.
pub fn find_path(galaxy: &GalaxyData, start: SystemId, end: SystemId) -> Option<Vec<SystemId>> {
    if !galaxy.contains(start) || !galaxy.contains(end) {
        return None;
    }
    Adjacency::from_routes(&galaxy.routes).find_path(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{Owner, Position, System};

    fn chain(n: u32) -> GalaxyData {
        let systems = (0..n)
            .map(|i| System::new(SystemId(i), format!("S{}", i), Position::new(i as f64, 0.0)))
            .collect();
        let routes = (1..n)
            .map(|i| Route::new(SystemId(i - 1), SystemId(i)))
            .collect();
        GalaxyData { systems, routes }
    }

    fn own(galaxy: &mut GalaxyData, id: u32) {
        galaxy.system_mut(SystemId(id)).unwrap().owner = Owner::Player;
    }

    #[test]
    fn test_two_territories_leave_middle_dark() {
        let mut galaxy = chain(7);
        own(&mut galaxy, 0);
        own(&mut galaxy, 6);
        let vis = calculate_visible_systems(&galaxy, Some(SystemId(0)));

        for id in [0, 1, 2, 4, 5, 6] {
            assert!(vis.is_visible(SystemId(id)), "system {} should be visible", id);
        }
        assert!(!vis.is_visible(SystemId(3)));
        assert!(!vis.tether_routes.is_empty());
        assert!(vis
            .tether_routes
            .iter()
            .all(|t| t.target == SystemId(3)));
        assert!(vis.tether_routes.iter().any(|t| t.id == "tether-2-3"));
        assert!(vis.tether_routes.iter().any(|t| t.id == "tether-4-3"));
    }

    #[test]
    fn test_unowned_home_is_not_a_source() {
        let mut galaxy = chain(5);
        own(&mut galaxy, 4);
        let vis = calculate_visible_systems(&galaxy, Some(SystemId(0)));
        let expected: BTreeSet<SystemId> = [2, 3, 4].into_iter().map(SystemId).collect();
        assert_eq!(vis.visible_ids, expected);
        assert_eq!(vis.tether_routes.len(), 1);
        assert_eq!(vis.tether_routes[0].id, "tether-2-1");
    }

    #[test]
    fn test_no_home_is_empty() {
        let mut galaxy = chain(3);
        own(&mut galaxy, 0);
        let vis = calculate_visible_systems(&galaxy, None);
        assert!(vis.visible_ids.is_empty());
        assert!(vis.tether_routes.is_empty());
    }

    #[test]
    fn test_empty_galaxy_is_empty() {
        let vis = calculate_visible_systems(&GalaxyData::default(), Some(SystemId(0)));
        assert!(vis.visible_ids.is_empty());
    }

    #[test]
    fn test_isolated_home_sees_itself() {
        let mut galaxy = chain(1);
        own(&mut galaxy, 0);
        let vis = calculate_visible_systems(&galaxy, Some(SystemId(0)));
        assert_eq!(vis.visible_ids.len(), 1);
        assert!(vis.tether_routes.is_empty());
    }

    #[test]
    fn test_find_path_excludes_start() {
        let galaxy = chain(4);
        let path = find_path(&galaxy, SystemId(0), SystemId(3)).unwrap();
        assert_eq!(path, vec![SystemId(1), SystemId(2), SystemId(3)]);
        let path = find_path(&galaxy, SystemId(3), SystemId(1)).unwrap();
        assert_eq!(path, vec![SystemId(2), SystemId(1)]);
    }

    #[test]
    fn test_find_path_same_and_adjacent() {
        let galaxy = chain(3);
        assert_eq!(find_path(&galaxy, SystemId(1), SystemId(1)), Some(vec![]));
        assert_eq!(
            find_path(&galaxy, SystemId(1), SystemId(2)),
            Some(vec![SystemId(2)])
        );
    }

    #[test]
    fn test_find_path_disconnected() {
        let mut galaxy = chain(3);
        galaxy
            .systems
            .push(System::new(SystemId(9), "Lonely", Position::default()));
        assert_eq!(find_path(&galaxy, SystemId(0), SystemId(9)), None);
        assert_eq!(find_path(&galaxy, SystemId(0), SystemId(42)), None);
    }

    #[test]
    fn test_find_path_prefers_shortcut() {
        let mut galaxy = chain(5);
        galaxy.routes.push(Route::new(SystemId(0), SystemId(4)));
        let path = find_path(&galaxy, SystemId(0), SystemId(4)).unwrap();
        assert_eq!(path, vec![SystemId(4)]);
    }

    #[test]
    fn test_hop_distances_respects_depth() {
        let galaxy = chain(6);
        let adj = Adjacency::from_routes(&galaxy.routes);
        let dist = hop_distances(&adj, [SystemId(0)], 2);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist[&SystemId(2)], 2);
    }
}
