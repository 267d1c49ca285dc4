//! Fair-share supply/demand allocation.
//!
//! [`allocate`] splits one producer's supply across capacity-limited
//! consumers by water-filling: every round the remaining supply is divided
//! equally among consumers that still have room, consumers whose share
//! would overflow their cap are saturated and dropped, and the freed supply
//! is redistributed in the next round. The result is max-min fair.
//!
//! [`satisfy_demands`] runs the allocator once per producer over a
//! producer → consumer link network. Producers are processed in input
//! order and each sees demand already reduced by earlier producers.
//!
//! Nothing in this module knows about the game; ids are any `Ord + Clone`.

use std::collections::BTreeMap;

/// Supply or capacity at or below this is treated as exhausted.
pub const EPSILON: f64 = 1e-9;

/// A recipient with a maximum amount it can accept.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumer<K> {
    pub id: K,
    pub cap: f64,
}

impl<K> Consumer<K> {
    pub fn new(id: K, cap: f64) -> Self {
        Self { id, cap }
    }
}

/// Outcome of a single [`allocate`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<K: Ord> {
    pub allocations: BTreeMap<K, f64>,
    pub used: f64,
    pub unused: f64,
}

impl<K: Ord> Allocation<K> {
    pub fn get(&self, id: &K) -> f64 {
        self.allocations.get(id).copied().unwrap_or(0.0)
    }
}

fn clamp_supply(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn clamp_cap(value: f64) -> f64 {
    // +inf is a legal "unbounded" cap; NaN and negatives are not.
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value
    }
}

/// Water-fill `supply` across `consumers`.
///
/// Negative or non-finite supply is treated as zero, as are negative or NaN
/// caps. Consumers sharing an id have their allocations summed.
pub fn allocate<K: Ord + Clone>(supply: f64, consumers: &[Consumer<K>]) -> Allocation<K> {
    let supply = clamp_supply(supply);
    let mut given = vec![0.0_f64; consumers.len()];
    let mut room: Vec<f64> = consumers.iter().map(|c| clamp_cap(c.cap)).collect();
    let mut active: Vec<usize> = (0..consumers.len()).filter(|&i| room[i] > EPSILON).collect();
    let mut remaining = supply;

    while remaining > EPSILON && !active.is_empty() {
        let share = remaining / active.len() as f64;
        let mut still_open = Vec::with_capacity(active.len());

        for &i in &active {
            if room[i] <= share {
                given[i] += room[i];
                remaining -= room[i];
                room[i] = 0.0;
            } else {
                still_open.push(i);
            }
        }

        if still_open.len() == active.len() {
            // Nobody saturated: the equal split is final.
            for &i in &still_open {
                given[i] += share;
                room[i] -= share;
            }
            remaining = 0.0;
            break;
        }
        active = still_open;
    }

    let remaining = remaining.max(0.0);
    let mut allocations = BTreeMap::new();
    for (consumer, amount) in consumers.iter().zip(given) {
        *allocations.entry(consumer.id.clone()).or_insert(0.0) += amount;
    }

    Allocation {
        allocations,
        used: supply - remaining,
        unused: remaining,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Producer<K> {
    pub id: K,
    pub supply: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemandNode<K> {
    pub id: K,
    pub demand: f64,
}

/// Directed producer → consumer edge. `bandwidth` may be `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link<K> {
    pub from: K,
    pub to: K,
    pub bandwidth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowNetwork<K> {
    pub producers: Vec<Producer<K>>,
    pub consumers: Vec<DemandNode<K>>,
    pub links: Vec<Link<K>>,
}

impl<K> Default for FlowNetwork<K> {
    fn default() -> Self {
        Self {
            producers: Vec::new(),
            consumers: Vec::new(),
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowResult<K: Ord> {
    /// Amount moved along each (producer, consumer) pair.
    pub flows: BTreeMap<(K, K), f64>,
    pub producer_sent: BTreeMap<K, f64>,
    pub consumer_received: BTreeMap<K, f64>,
    pub consumer_demand: BTreeMap<K, f64>,
    pub unmet_demand: BTreeMap<K, f64>,
    pub unused_supply: BTreeMap<K, f64>,
}

impl<K: Ord> Default for FlowResult<K> {
    fn default() -> Self {
        Self {
            flows: BTreeMap::new(),
            producer_sent: BTreeMap::new(),
            consumer_received: BTreeMap::new(),
            consumer_demand: BTreeMap::new(),
            unmet_demand: BTreeMap::new(),
            unused_supply: BTreeMap::new(),
        }
    }
}

impl<K: Ord> FlowResult<K> {
    pub fn total_sent(&self) -> f64 {
        self.producer_sent.values().sum()
    }

    pub fn received(&self, id: &K) -> f64 {
        self.consumer_received.get(id).copied().unwrap_or(0.0)
    }

    pub fn sent(&self, id: &K) -> f64 {
        self.producer_sent.get(id).copied().unwrap_or(0.0)
    }

    /// Delivered ÷ requested for a consumer, clamped to `[0, 1]`.
    pub fn satisfaction_ratio(&self, id: &K) -> f64 {
        let demand = self.consumer_demand.get(id).copied().unwrap_or(0.0);
        satisfaction_ratio(self.received(id), demand)
    }

    /// Credit income over every flow edge, priced at the receiving
    /// consumer's dynamic multiplier.
    pub fn income(&self, base_rate: f64, min_multiplier: f64) -> f64 {
        self.flows
            .iter()
            .map(|((_, consumer), amount)| {
                let mult = price_multiplier(self.satisfaction_ratio(consumer), min_multiplier);
                flow_income(*amount, base_rate, mult)
            })
            .sum()
    }
}

/// Distribute every producer's supply across its linked consumers.
///
/// Producers with no supply or no usable links are skipped. Links to ids
/// absent from `consumers` are ignored. Parallel links between the same
/// pair pool their bandwidth.
pub fn satisfy_demands<K: Ord + Clone>(network: &FlowNetwork<K>) -> FlowResult<K> {
    let mut result = FlowResult::default();

    let mut remaining: BTreeMap<K, f64> = BTreeMap::new();
    for consumer in &network.consumers {
        let demand = clamp_supply(consumer.demand);
        *remaining.entry(consumer.id.clone()).or_insert(0.0) += demand;
        *result
            .consumer_demand
            .entry(consumer.id.clone())
            .or_insert(0.0) += demand;
        result
            .consumer_received
            .entry(consumer.id.clone())
            .or_insert(0.0);
    }

    for producer in &network.producers {
        let supply = clamp_supply(producer.supply);
        result.producer_sent.entry(producer.id.clone()).or_insert(0.0);
        let unused = result
            .unused_supply
            .entry(producer.id.clone())
            .or_insert(0.0);
        if supply <= EPSILON {
            continue;
        }

        let mut bandwidth: BTreeMap<K, f64> = BTreeMap::new();
        for link in network.links.iter().filter(|l| l.from == producer.id) {
            if remaining.contains_key(&link.to) {
                *bandwidth.entry(link.to.clone()).or_insert(0.0) += clamp_cap(link.bandwidth);
            }
        }
        if bandwidth.is_empty() {
            *unused += supply;
            continue;
        }

        let consumers: Vec<Consumer<K>> = bandwidth
            .into_iter()
            .map(|(id, bw)| {
                let left = remaining.get(&id).copied().unwrap_or(0.0);
                Consumer::new(id, bw.min(left))
            })
            .collect();
        let allocation = allocate(supply, &consumers);
        *unused += allocation.unused;

        for (consumer, amount) in allocation.allocations {
            if amount <= 0.0 {
                continue;
            }
            if let Some(left) = remaining.get_mut(&consumer) {
                *left = (*left - amount).max(0.0);
            }
            *result
                .consumer_received
                .entry(consumer.clone())
                .or_insert(0.0) += amount;
            *result
                .flows
                .entry((producer.id.clone(), consumer))
                .or_insert(0.0) += amount;
        }
        *result
            .producer_sent
            .entry(producer.id.clone())
            .or_insert(0.0) += allocation.used;
    }

    result.unmet_demand = remaining;
    result
}

/// Delivered ÷ requested, clamped to `[0, 1]`. Zero demand counts as fully
/// satisfied.
pub fn satisfaction_ratio(received: f64, demand: f64) -> f64 {
    if demand <= EPSILON {
        return 1.0;
    }
    (received / demand).clamp(0.0, 1.0)
}

/// Unit price multiplier for a consumer: full rate when starved, the floor
/// rate when fully supplied.
pub fn price_multiplier(satisfaction: f64, min_multiplier: f64) -> f64 {
    let ratio = satisfaction.clamp(0.0, 1.0);
    1.0 - (1.0 - min_multiplier) * ratio
}

pub fn flow_income(amount: f64, base_rate: f64, multiplier: f64) -> f64 {
    amount * base_rate * multiplier
}
