//! Construction queues and the research slot.
//!
//! Each player system has a FIFO queue; only the head is timed. When the
//! head's `elapsed >= duration` its effect is applied, it is dequeued, and
//! the next item is stamped with the completion tick's `now`. Research is
//! one global slot timed the same way. Progress is always derived from
//! `start_time`/`duration`, never accumulated.

use starweave_logic::galaxy::{QueueItem, QueueTarget, System};
use starweave_logic::progression::{
    building_cost, building_time_ms, ship_build_time_ms, BuildingKind, Cost, Resources, TechId,
};

use crate::actions::Rejection;
use crate::state::{CurrentResearch, TechState, Timestamp};

/// Fraction of `duration` elapsed since `start`, clamped to `[0, 1]`.
pub fn progress(start: Timestamp, duration: u64, now: Timestamp) -> f64 {
    if duration == 0 {
        return 1.0;
    }
    (now.saturating_sub(start) as f64 / duration as f64).clamp(0.0, 1.0)
}

/// Validate an order for `system` and price it.
///
/// Buildings are priced at the level the order will produce, counting
/// upgrades already waiting in the queue.
pub fn plan_construction(system: &System, target: QueueTarget) -> Result<(Cost, u64), Rejection> {
    if !system.is_player() {
        return Err(Rejection::NotPlayerOwned(system.id));
    }
    match target {
        QueueTarget::Building(kind) => {
            let level = system.building_level(kind) + system.queued_upgrades(kind);
            if level >= kind.spec().max_level {
                return Err(Rejection::MaxLevel(kind));
            }
            Ok((building_cost(kind, level), building_time_ms(kind, level)))
        }
        QueueTarget::Ship(class) => {
            let shipyard = system.building_level(BuildingKind::Shipyard);
            if shipyard == 0 {
                return Err(Rejection::NoShipyard(system.id));
            }
            Ok((class.spec().cost, ship_build_time_ms(class, shipyard)))
        }
    }
}

/// Append an item; an empty queue starts it immediately.
pub fn enqueue(system: &mut System, target: QueueTarget, duration: u64, now: Timestamp) {
    let mut item = QueueItem::new(target, duration);
    if system.construction_queue.is_empty() {
        item.start_time = Some(now);
    }
    system.construction_queue.push(item);
}

/// Complete every finished head item. Building effects are applied here;
/// the caller turns completed ship targets into ships.
pub fn advance_queue(system: &mut System, now: Timestamp) -> Vec<QueueTarget> {
    let mut completed = Vec::new();
    while let Some(head) = system.construction_queue.first_mut() {
        let start = *head.start_time.get_or_insert(now);
        if now.saturating_sub(start) < head.duration {
            break;
        }
        let item = system.construction_queue.remove(0);
        if let QueueTarget::Building(kind) = item.target {
            system.buildings.entry(kind).or_default().level += 1;
        }
        completed.push(item.target);
        if let Some(next) = system.construction_queue.first_mut() {
            next.start_time = Some(now);
        }
    }
    completed
}

/// Restore queue invariants on loaded data: only player systems queue, and
/// only the head carries a start time. Returns whether anything changed.
pub fn normalize_queue(system: &mut System) -> bool {
    if !system.is_player() {
        let had_items = !system.construction_queue.is_empty();
        system.construction_queue.clear();
        return had_items;
    }
    let mut changed = false;
    for item in system.construction_queue.iter_mut().skip(1) {
        if item.start_time.take().is_some() {
            changed = true;
        }
    }
    changed
}

/// Head progress of a system's queue.
pub fn construction_progress(system: &System, now: Timestamp) -> Option<f64> {
    let head = system.construction_queue.first()?;
    Some(progress(head.start_time?, head.duration, now))
}

/// Start researching `id`, paying its credit cost up front.
pub fn begin_research(
    tech: &mut TechState,
    resources: &mut Resources,
    id: TechId,
    now: Timestamp,
) -> Result<(), Rejection> {
    if let Some(current) = &tech.current {
        return Err(Rejection::ResearchBusy(current.id));
    }
    if tech.is_researched(id) {
        return Err(Rejection::AlreadyResearched(id));
    }
    if !id.prerequisites_met(&tech.researched) {
        return Err(Rejection::PrerequisitesUnmet(id));
    }
    let spec = id.spec();
    if !resources.try_spend(&spec.cost) {
        return Err(Rejection::InsufficientResources);
    }
    tech.current = Some(CurrentResearch {
        id,
        start_time: now,
        duration: spec.research_time_ms,
        remaining_time: spec.research_time_ms,
    });
    Ok(())
}

/// Refresh remaining time and complete finished research.
pub fn advance_research(tech: &mut TechState, now: Timestamp) -> Option<TechId> {
    let current = tech.current.as_mut()?;
    let elapsed = now.saturating_sub(current.start_time);
    current.remaining_time = current.duration.saturating_sub(elapsed);
    if elapsed < current.duration {
        return None;
    }
    let id = current.id;
    tech.current = None;
    tech.researched.insert(id);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starweave_logic::galaxy::{Owner, Position, SystemId};
    use starweave_logic::progression::ShipClass;

    fn player_system() -> System {
        let mut s = System::new(SystemId(1), "Home", Position::default());
        s.owner = Owner::Player;
        s
    }

    #[test]
    fn test_first_item_starts_immediately() {
        let mut system = player_system();
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 50);
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Habitat), 2000, 60);
        assert_eq!(system.construction_queue[0].start_time, Some(50));
        assert_eq!(system.construction_queue[1].start_time, None);
    }

    #[test]
    fn test_completion_promotes_next() {
        let mut system = player_system();
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 0);
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Habitat), 2000, 0);

        assert!(advance_queue(&mut system, 999).is_empty());
        let done = advance_queue(&mut system, 1000);
        assert_eq!(done, vec![QueueTarget::Building(BuildingKind::Mine)]);
        assert_eq!(system.building_level(BuildingKind::Mine), 1);
        assert_eq!(system.construction_queue.len(), 1);
        assert_eq!(system.construction_queue[0].start_time, Some(1000));
    }

    #[test]
    fn test_no_catch_up_beyond_one_step() {
        let mut system = player_system();
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 0);
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 0);
        // Long pause: only the head completes, the next restarts at `now`.
        let done = advance_queue(&mut system, 10_000);
        assert_eq!(done.len(), 1);
        assert_eq!(system.construction_queue[0].start_time, Some(10_000));
    }

    #[test]
    fn test_plan_prices_queued_levels() {
        let mut system = player_system();
        let (first, _) = plan_construction(&system, QueueTarget::Building(BuildingKind::Mine)).unwrap();
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1, 0);
        let (second, _) = plan_construction(&system, QueueTarget::Building(BuildingKind::Mine)).unwrap();
        assert_eq!(first, building_cost(BuildingKind::Mine, 0));
        assert_eq!(second, building_cost(BuildingKind::Mine, 1));
    }

    #[test]
    fn test_plan_rejections() {
        let mut system = player_system();
        assert_eq!(
            plan_construction(&system, QueueTarget::Ship(ShipClass::ColonyShip)),
            Err(Rejection::NoShipyard(SystemId(1)))
        );
        system.buildings.entry(BuildingKind::Shipyard).or_default().level = 5;
        assert_eq!(
            plan_construction(&system, QueueTarget::Building(BuildingKind::Shipyard)),
            Err(Rejection::MaxLevel(BuildingKind::Shipyard))
        );
        assert!(plan_construction(&system, QueueTarget::Ship(ShipClass::ColonyShip)).is_ok());

        system.owner = Owner::Unclaimed;
        assert_eq!(
            plan_construction(&system, QueueTarget::Building(BuildingKind::Mine)),
            Err(Rejection::NotPlayerOwned(SystemId(1)))
        );
    }

    #[test]
    fn test_normalize_queue() {
        let mut system = player_system();
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 0);
        enqueue(&mut system, QueueTarget::Building(BuildingKind::Mine), 1000, 0);
        system.construction_queue[1].start_time = Some(5);
        assert!(normalize_queue(&mut system));
        assert_eq!(system.construction_queue[1].start_time, None);
        assert!(!normalize_queue(&mut system));

        system.owner = Owner::Enemy;
        assert!(normalize_queue(&mut system));
        assert!(system.construction_queue.is_empty());
    }

    #[test]
    fn test_research_lifecycle() {
        let mut tech = TechState::default();
        let mut resources = Resources::new(1000.0, 0.0);

        begin_research(&mut tech, &mut resources, TechId::AdvancedMining, 0).unwrap();
        assert_eq!(resources.credits, 800.0);
        assert_eq!(
            begin_research(&mut tech, &mut resources, TechId::FusionPower, 0),
            Err(Rejection::ResearchBusy(TechId::AdvancedMining))
        );

        assert_eq!(advance_research(&mut tech, 10_000), None);
        assert_eq!(tech.current.unwrap().remaining_time, 20_000);
        assert_eq!(advance_research(&mut tech, 30_000), Some(TechId::AdvancedMining));
        assert!(tech.current.is_none());
        assert!(tech.is_researched(TechId::AdvancedMining));

        assert_eq!(
            begin_research(&mut tech, &mut resources, TechId::AdvancedMining, 0),
            Err(Rejection::AlreadyResearched(TechId::AdvancedMining))
        );
    }

    #[test]
    fn test_research_checks_before_paying() {
        let mut tech = TechState::default();
        let mut resources = Resources::new(1000.0, 0.0);
        assert_eq!(
            begin_research(&mut tech, &mut resources, TechId::DeepCoreMining, 0),
            Err(Rejection::PrerequisitesUnmet(TechId::DeepCoreMining))
        );
        let mut poor = Resources::new(10.0, 0.0);
        assert_eq!(
            begin_research(&mut tech, &mut poor, TechId::AdvancedMining, 0),
            Err(Rejection::InsufficientResources)
        );
        assert_eq!(resources.credits, 1000.0);
        assert_eq!(poor.credits, 10.0);
    }
}
