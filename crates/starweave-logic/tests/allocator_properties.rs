//! Property tests for the fair-share allocator and the flow solver.
//!
//! Exercises the bounds every allocation must respect regardless of input:
//! nothing invented, nothing over cap, max-min fairness among consumers that
//! were not saturated.

use proptest::prelude::*;
use starweave_logic::allocator::{
    allocate, satisfy_demands, Consumer, DemandNode, FlowNetwork, Link, Producer,
};

const TOLERANCE: f64 = 1e-6;

fn caps() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..500.0, 0..12)
}

proptest! {
    #[test]
    fn allocations_respect_supply_and_caps(supply in 0.0f64..5000.0, caps in caps()) {
        let consumers: Vec<Consumer<usize>> =
            caps.iter().enumerate().map(|(i, &c)| Consumer::new(i, c)).collect();
        let result = allocate(supply, &consumers);

        let total: f64 = result.allocations.values().sum();
        prop_assert!(total <= supply + TOLERANCE);
        prop_assert!((result.used + result.unused - supply).abs() < TOLERANCE);
        for (i, &cap) in caps.iter().enumerate() {
            prop_assert!(result.get(&i) <= cap + TOLERANCE);
            prop_assert!(result.get(&i) >= 0.0);
        }
    }

    #[test]
    fn surplus_supply_fills_every_cap(caps in caps(), extra in 0.0f64..1000.0) {
        let sum: f64 = caps.iter().sum();
        let supply = sum + extra;
        let consumers: Vec<Consumer<usize>> =
            caps.iter().enumerate().map(|(i, &c)| Consumer::new(i, c)).collect();
        let result = allocate(supply, &consumers);

        for (i, &cap) in caps.iter().enumerate() {
            prop_assert!((result.get(&i) - cap).abs() < TOLERANCE);
        }
        prop_assert!((result.unused - (supply - sum)).abs() < TOLERANCE);
    }

    #[test]
    fn unsaturated_consumers_share_equally(supply in 0.0f64..5000.0, caps in caps()) {
        let sum: f64 = caps.iter().sum();
        prop_assume!(sum > supply);
        let consumers: Vec<Consumer<usize>> =
            caps.iter().enumerate().map(|(i, &c)| Consumer::new(i, c)).collect();
        let result = allocate(supply, &consumers);

        let open: Vec<f64> = caps
            .iter()
            .enumerate()
            .filter(|(i, cap)| result.get(i) < **cap - TOLERANCE)
            .map(|(i, _)| result.get(&i))
            .collect();
        if let Some(first) = open.first() {
            for amount in &open {
                prop_assert!((amount - first).abs() < 1e-4);
            }
            // Nobody saturated received more than the shared level.
            for (i, &cap) in caps.iter().enumerate() {
                if result.get(&i) >= cap - TOLERANCE {
                    prop_assert!(cap <= first + 1e-4);
                }
            }
        }
    }

    #[test]
    fn flows_never_exceed_supply_or_demand(
        supplies in prop::collection::vec(0.0f64..300.0, 1..5),
        demands in prop::collection::vec(0.0f64..300.0, 1..5),
        bandwidth in prop::option::of(1.0f64..200.0),
    ) {
        let producers: Vec<Producer<u32>> = supplies
            .iter()
            .enumerate()
            .map(|(i, &s)| Producer { id: i as u32, supply: s })
            .collect();
        let consumers: Vec<DemandNode<u32>> = demands
            .iter()
            .enumerate()
            .map(|(i, &d)| DemandNode { id: 100 + i as u32, demand: d })
            .collect();
        let mut links = Vec::new();
        for p in &producers {
            for c in &consumers {
                links.push(Link { from: p.id, to: c.id, bandwidth: bandwidth.unwrap_or(f64::INFINITY) });
            }
        }
        let result = satisfy_demands(&FlowNetwork { producers, consumers: consumers.clone(), links });

        let total_supply: f64 = supplies.iter().sum();
        prop_assert!(result.total_sent() <= total_supply + TOLERANCE);
        for c in &consumers {
            prop_assert!(result.received(&c.id) <= c.demand + TOLERANCE);
        }
        let total_flow: f64 = result.flows.values().sum();
        prop_assert!((total_flow - result.total_sent()).abs() < 1e-4);
    }
}
