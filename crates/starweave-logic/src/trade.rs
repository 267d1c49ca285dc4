//! Metals trade over built routes.
//!
//! Producers are player systems with positive building-derived supply;
//! consumers are any system with static market demand. Each built route
//! yields up to two directed links (one per direction where the tail
//! supplies and the head demands). The allocator does the rest.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::allocator::{
    price_multiplier, satisfy_demands, DemandNode, FlowNetwork, FlowResult, Link, Producer,
    EPSILON,
};
use crate::galaxy::{GalaxyData, RouteId, SystemId};

pub struct TradeInputs<'a> {
    pub galaxy: &'a GalaxyData,
    pub built_routes: &'a BTreeSet<RouteId>,
    /// Derived metal supply per system (already scaled by bonuses/penalties).
    pub supply: &'a BTreeMap<SystemId, f64>,
    /// Per-link bandwidth; `None` means unbounded.
    pub bandwidth: Option<f64>,
}

/// Per-system trade participation for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Satisfaction {
    Supply { used: f64, total: f64, ratio: f64 },
    Demand { satisfied: f64, total: f64, ratio: f64 },
}

impl Satisfaction {
    pub fn ratio(&self) -> f64 {
        match self {
            Satisfaction::Supply { ratio, .. } | Satisfaction::Demand { ratio, .. } => *ratio,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeReport {
    pub flows: FlowResult<SystemId>,
    /// Absent for systems that neither produce nor consume this tick.
    pub satisfaction: BTreeMap<SystemId, Satisfaction>,
    /// Total flow along each built route, both directions combined.
    pub route_throughput: BTreeMap<RouteId, f64>,
}

impl TradeReport {
    /// Credits earned this tick per second of flow.
    pub fn income(&self, base_rate: f64, min_multiplier: f64) -> f64 {
        self.flows.income(base_rate, min_multiplier)
    }

    /// Dynamic price multiplier of every consumer.
    pub fn price_multipliers(&self, min_multiplier: f64) -> BTreeMap<SystemId, f64> {
        self.flows
            .consumer_demand
            .keys()
            .map(|id| {
                (
                    *id,
                    price_multiplier(self.flows.satisfaction_ratio(id), min_multiplier),
                )
            })
            .collect()
    }

    /// Supply a producer did not export.
    pub fn unexported(&self, id: SystemId) -> f64 {
        self.flows.unused_supply.get(&id).copied().unwrap_or(0.0)
    }
}

fn ratio(part: f64, total: f64) -> f64 {
    if total <= EPSILON {
        0.0
    } else {
        (part / total).clamp(0.0, 1.0)
    }
}

/// Build the metals flow network and solve it.
pub fn compute_trade(inputs: &TradeInputs<'_>) -> TradeReport {
    let galaxy = inputs.galaxy;
    let supply_of = |id: SystemId| -> f64 {
        match galaxy.system(id) {
            Some(s) if s.is_player() => inputs.supply.get(&id).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    };
    let demand_of = |id: SystemId| -> f64 {
        galaxy
            .system(id)
            .map(|s| s.market.metals.demand)
            .unwrap_or(0.0)
    };

    let mut network = FlowNetwork::default();
    for system in &galaxy.systems {
        let supply = supply_of(system.id);
        if supply > 0.0 {
            network.producers.push(Producer {
                id: system.id,
                supply,
            });
        }
        let demand = system.market.metals.demand;
        if demand > 0.0 {
            network.consumers.push(DemandNode {
                id: system.id,
                demand,
            });
        }
    }

    let bandwidth = inputs.bandwidth.unwrap_or(f64::INFINITY);
    for route in &galaxy.routes {
        if !inputs.built_routes.contains(&route.id) {
            continue;
        }
        for (from, to) in [(route.source, route.target), (route.target, route.source)] {
            if supply_of(from) > 0.0 && demand_of(to) > 0.0 {
                network.links.push(Link {
                    from,
                    to,
                    bandwidth,
                });
            }
        }
    }

    let flows = satisfy_demands(&network);

    let mut satisfaction = BTreeMap::new();
    for consumer in &network.consumers {
        let received = flows.received(&consumer.id);
        satisfaction.insert(
            consumer.id,
            Satisfaction::Demand {
                satisfied: received,
                total: consumer.demand,
                ratio: ratio(received, consumer.demand),
            },
        );
    }
    // A system that both produces and consumes reports its supply side.
    for producer in &network.producers {
        let used = flows.sent(&producer.id);
        satisfaction.insert(
            producer.id,
            Satisfaction::Supply {
                used,
                total: producer.supply,
                ratio: ratio(used, producer.supply),
            },
        );
    }

    let mut route_throughput = BTreeMap::new();
    for ((from, to), amount) in &flows.flows {
        *route_throughput
            .entry(RouteId::canonical(*from, *to))
            .or_insert(0.0) += amount;
    }

    TradeReport {
        flows,
        satisfaction,
        route_throughput,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{Market, Owner, Position, Route, System};

    fn system(id: u32, owner: Owner, demand: f64) -> System {
        let mut s = System::new(SystemId(id), format!("S{}", id), Position::default());
        s.owner = owner;
        s.market = Market::with_metal_demand(demand);
        s
    }

    fn galaxy() -> GalaxyData {
        // 1 (player, producer) -- 2 (unclaimed, demand 30) -- 3 (enemy, demand 50)
        //  \-- 4 (unclaimed, no demand)
        GalaxyData {
            systems: vec![
                system(1, Owner::Player, 0.0),
                system(2, Owner::Unclaimed, 30.0),
                system(3, Owner::Enemy, 50.0),
                system(4, Owner::Unclaimed, 0.0),
            ],
            routes: vec![
                Route::new(SystemId(1), SystemId(2)),
                Route::new(SystemId(2), SystemId(3)),
                Route::new(SystemId(1), SystemId(4)),
            ],
        }
    }

    fn built(ids: &[&str]) -> BTreeSet<RouteId> {
        ids.iter().map(|s| RouteId::from(*s)).collect()
    }

    #[test]
    fn test_unbuilt_routes_carry_nothing() {
        let galaxy = galaxy();
        let supply = BTreeMap::from([(SystemId(1), 100.0)]);
        let routes = built(&[]);
        let report = compute_trade(&TradeInputs {
            galaxy: &galaxy,
            built_routes: &routes,
            supply: &supply,
            bandwidth: None,
        });
        assert_eq!(report.flows.total_sent(), 0.0);
        assert!(report.route_throughput.is_empty());
        assert!(matches!(
            report.satisfaction[&SystemId(1)],
            Satisfaction::Supply { used, .. } if used == 0.0
        ));
    }

    #[test]
    fn test_flow_only_along_direct_built_routes() {
        let galaxy = galaxy();
        let supply = BTreeMap::from([(SystemId(1), 100.0)]);
        let routes = built(&["1-2", "2-3"]);
        let report = compute_trade(&TradeInputs {
            galaxy: &galaxy,
            built_routes: &routes,
            supply: &supply,
            bandwidth: None,
        });
        // System 3 is two hops away and gets nothing.
        assert!((report.flows.received(&SystemId(2)) - 30.0).abs() < 1e-9);
        assert_eq!(report.flows.received(&SystemId(3)), 0.0);
        assert!((report.route_throughput[&RouteId::from("1-2")] - 30.0).abs() < 1e-9);
        assert!(!report.route_throughput.contains_key(&RouteId::from("2-3")));
        assert!((report.unexported(SystemId(1)) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_participants_have_no_record() {
        let galaxy = galaxy();
        let supply = BTreeMap::from([(SystemId(1), 100.0)]);
        let routes = built(&["1-2"]);
        let report = compute_trade(&TradeInputs {
            galaxy: &galaxy,
            built_routes: &routes,
            supply: &supply,
            bandwidth: None,
        });
        assert!(!report.satisfaction.contains_key(&SystemId(4)));
        // Consumers without links still get a (zero) demand record.
        assert!(matches!(
            report.satisfaction[&SystemId(3)],
            Satisfaction::Demand { satisfied, ratio, .. } if satisfied == 0.0 && ratio == 0.0
        ));
        assert_eq!(report.satisfaction[&SystemId(3)].ratio(), 0.0);
    }

    #[test]
    fn test_non_player_supply_ignored() {
        let galaxy = galaxy();
        let supply = BTreeMap::from([(SystemId(3), 100.0)]);
        let routes = built(&["2-3"]);
        let report = compute_trade(&TradeInputs {
            galaxy: &galaxy,
            built_routes: &routes,
            supply: &supply,
            bandwidth: None,
        });
        assert_eq!(report.flows.total_sent(), 0.0);
        assert!(report.flows.producer_sent.is_empty());
    }

    #[test]
    fn test_bandwidth_limits_route() {
        let galaxy = galaxy();
        let supply = BTreeMap::from([(SystemId(1), 100.0)]);
        let routes = built(&["1-2"]);
        let report = compute_trade(&TradeInputs {
            galaxy: &galaxy,
            built_routes: &routes,
            supply: &supply,
            bandwidth: Some(10.0),
        });
        assert!((report.flows.received(&SystemId(2)) - 10.0).abs() < 1e-9);
        let price = report.price_multipliers(0.2)[&SystemId(2)];
        assert!(price > 0.2 && price < 1.0);
    }
}
