//! Player actions.
//!
//! Every action validates completely before mutating anything. The `try_*`
//! forms say why an action was refused; the plain forms return `bool` for
//! the presentation layer and log the reason at debug level.

use std::fmt;

use starweave_logic::galaxy::{Owner, QueueTarget, RouteId, SystemId};
use starweave_logic::progression::{BuildingKind, Cost, TechId};
use starweave_logic::topology::find_path;

use crate::engine::Simulation;
use crate::scheduler::{begin_research, enqueue, plan_construction};
use crate::state::{ScanState, ShipId, Timestamp, ViewState};
use crate::store::KeyValueStore;
use crate::transit::{begin_transit, travel_time_ms};

/// Why an action was refused. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownSystem(SystemId),
    NotPlayerOwned(SystemId),
    NoShipyard(SystemId),
    MaxLevel(BuildingKind),
    InsufficientResources,
    ResearchBusy(TechId),
    AlreadyResearched(TechId),
    PrerequisitesUnmet(TechId),
    ScanInProgress(SystemId),
    NotVisible(SystemId),
    AlreadyOwned(SystemId),
    EnemyTerritory(SystemId),
    NoHome,
    Unreachable(SystemId),
    UnknownRoute(RouteId),
    RouteAlreadyBuilt(RouteId),
    /// Both endpoints must be player systems.
    RouteNotConnected(RouteId),
    UnknownShip(ShipId),
    ShipNotDocked(ShipId),
    SameSystem(SystemId),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownSystem(id) => write!(f, "system {} does not exist", id),
            Rejection::NotPlayerOwned(id) => write!(f, "system {} is not ours", id),
            Rejection::NoShipyard(id) => write!(f, "system {} has no shipyard", id),
            Rejection::MaxLevel(kind) => write!(f, "{} is at max level", kind.spec().name),
            Rejection::InsufficientResources => write!(f, "insufficient resources"),
            Rejection::ResearchBusy(tech) => write!(f, "already researching {:?}", tech),
            Rejection::AlreadyResearched(tech) => write!(f, "{:?} already researched", tech),
            Rejection::PrerequisitesUnmet(tech) => write!(f, "{:?} prerequisites unmet", tech),
            Rejection::ScanInProgress(id) => write!(f, "already scanning system {}", id),
            Rejection::NotVisible(id) => write!(f, "system {} is not visible", id),
            Rejection::AlreadyOwned(id) => write!(f, "system {} is already ours", id),
            Rejection::EnemyTerritory(id) => write!(f, "system {} is enemy territory", id),
            Rejection::NoHome => write!(f, "no home system"),
            Rejection::Unreachable(id) => write!(f, "no route to system {}", id),
            Rejection::UnknownRoute(id) => write!(f, "route {} does not exist", id),
            Rejection::RouteAlreadyBuilt(id) => write!(f, "route {} is already built", id),
            Rejection::RouteNotConnected(id) => {
                write!(f, "route {} does not join two of our systems", id)
            }
            Rejection::UnknownShip(id) => write!(f, "ship {} does not exist", id),
            Rejection::ShipNotDocked(id) => write!(f, "ship {} is not docked", id),
            Rejection::SameSystem(id) => write!(f, "ship is already at system {}", id),
        }
    }
}

impl std::error::Error for Rejection {}

impl<S: KeyValueStore> Simulation<S> {
    fn settle(&mut self, action: &str, result: Result<(), Rejection>, now: Timestamp) -> bool {
        match result {
            Ok(()) => {
                self.mark_changed(now);
                self.refresh_derived();
                true
            }
            Err(reason) => {
                log::debug!("{} rejected: {}", action, reason);
                false
            }
        }
    }

    /// Queue a building upgrade or ship at `system`, paying up front.
    pub fn start_construction(&mut self, system: SystemId, target: QueueTarget, now: Timestamp) -> bool {
        let result = self.try_start_construction(system, target, now);
        self.settle("construction", result, now)
    }

    pub fn try_start_construction(
        &mut self,
        system: SystemId,
        target: QueueTarget,
        now: Timestamp,
    ) -> Result<(), Rejection> {
        let entry = self
            .state
            .galaxy
            .system(system)
            .ok_or(Rejection::UnknownSystem(system))?;
        let (cost, duration) = plan_construction(entry, target)?;
        if !self.state.resources.try_spend(&cost) {
            return Err(Rejection::InsufficientResources);
        }
        if let Some(entry) = self.state.galaxy.system_mut(system) {
            enqueue(entry, target, duration, now);
        }
        Ok(())
    }

    pub fn start_research(&mut self, tech: TechId, now: Timestamp) -> bool {
        let result = self.try_start_research(tech, now);
        self.settle("research", result, now)
    }

    pub fn try_start_research(&mut self, tech: TechId, now: Timestamp) -> Result<(), Rejection> {
        begin_research(&mut self.state.tech, &mut self.state.resources, tech, now)
    }

    /// Survey a visible neutral system. Completion claims it.
    pub fn scan_system(&mut self, system: SystemId, now: Timestamp) -> bool {
        let result = self.try_scan_system(system, now);
        self.settle("scan", result, now)
    }

    pub fn try_scan_system(&mut self, system: SystemId, now: Timestamp) -> Result<(), Rejection> {
        if let Some(scan) = &self.state.scanning_system {
            return Err(Rejection::ScanInProgress(scan.system_id));
        }
        let target = self
            .state
            .galaxy
            .system(system)
            .ok_or(Rejection::UnknownSystem(system))?;
        if !self.visibility.is_visible(system) {
            return Err(Rejection::NotVisible(system));
        }
        match target.owner {
            Owner::Player => return Err(Rejection::AlreadyOwned(system)),
            Owner::Enemy => return Err(Rejection::EnemyTerritory(system)),
            Owner::Unclaimed => {}
        }
        let home = self.state.home_system_id.ok_or(Rejection::NoHome)?;
        let hops = find_path(&self.state.galaxy, home, system)
            .ok_or(Rejection::Unreachable(system))?
            .len();

        let cost = Cost::credits(hops as f64 * self.config.scan_cost_per_hop);
        if !self.state.resources.try_spend(&cost) {
            return Err(Rejection::InsufficientResources);
        }
        let scan_speed = self.state.tech.bonuses().scan_speed.max(f64::EPSILON);
        let duration =
            (hops as f64 * self.config.scan_time_per_hop_ms as f64 / scan_speed).round() as u64;
        self.state.scanning_system = Some(ScanState {
            system_id: system,
            start_time: now,
            duration,
        });
        Ok(())
    }

    /// Abandon the current scan. The cost is not refunded.
    pub fn cancel_scan(&mut self, now: Timestamp) -> bool {
        if self.state.scanning_system.take().is_none() {
            return false;
        }
        self.mark_changed(now);
        true
    }

    /// Open a trade route between two player systems.
    pub fn build_route(&mut self, route: &RouteId, now: Timestamp) -> bool {
        let result = self.try_build_route(route, now);
        self.settle("route", result, now)
    }

    pub fn try_build_route(&mut self, route: &RouteId, _now: Timestamp) -> Result<(), Rejection> {
        let galaxy = &self.state.galaxy;
        let found = galaxy
            .route(route)
            .or_else(|| {
                let (a, b) = route.endpoints()?;
                galaxy.route(&RouteId::canonical(a, b))
            })
            .ok_or_else(|| Rejection::UnknownRoute(route.clone()))?;
        let id = found.id.clone();
        if self.state.built_routes.contains(&id) {
            return Err(Rejection::RouteAlreadyBuilt(id));
        }
        let owned = |sys: SystemId| galaxy.system(sys).map_or(false, |s| s.is_player());
        if !owned(found.source) || !owned(found.target) {
            return Err(Rejection::RouteNotConnected(id));
        }
        let cost = self.config.route_build_cost;
        if !self.state.resources.try_spend(&cost) {
            return Err(Rejection::InsufficientResources);
        }
        self.state.built_routes.insert(id);
        Ok(())
    }

    /// Send a docked colony ship to an unclaimed system.
    pub fn launch_ship(&mut self, ship: ShipId, destination: SystemId, now: Timestamp) -> bool {
        let result = self.try_launch_ship(ship, destination, now);
        self.settle("launch", result, now)
    }

    pub fn try_launch_ship(
        &mut self,
        ship: ShipId,
        destination: SystemId,
        now: Timestamp,
    ) -> Result<(), Rejection> {
        let entry = self.state.ship(ship).ok_or(Rejection::UnknownShip(ship))?;
        if !entry.is_docked() {
            return Err(Rejection::ShipNotDocked(ship));
        }
        let origin = entry.system_id;
        if origin == destination {
            return Err(Rejection::SameSystem(destination));
        }
        let target = self
            .state
            .galaxy
            .system(destination)
            .ok_or(Rejection::UnknownSystem(destination))?;
        match target.owner {
            Owner::Player => return Err(Rejection::AlreadyOwned(destination)),
            Owner::Enemy => return Err(Rejection::EnemyTerritory(destination)),
            Owner::Unclaimed => {}
        }
        let route = find_path(&self.state.galaxy, origin, destination)
            .ok_or(Rejection::Unreachable(destination))?;
        let travel_time = travel_time_ms(route.len(), &self.config, &self.state.tech.bonuses());

        if let Some(entry) = self.state.ships.iter_mut().find(|s| s.id == ship) {
            begin_transit(entry, destination, route, travel_time, now);
        }
        Ok(())
    }

    /// Record the camera position so it survives reloads.
    pub fn set_view_state(&mut self, view: ViewState, now: Timestamp) {
        if self.state.view_state != view {
            self.state.view_state = view;
            self.mark_changed(now);
        }
    }
}
