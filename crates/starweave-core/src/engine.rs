//! Simulation engine - main entry point for running the game
//!
//! `Simulation` owns the authoritative `GameState` and everything derived
//! from it. The host calls `tick(now)` on a fixed cadence and the action
//! methods between ticks; nothing here reads the clock itself.

use rand::rngs::StdRng;
use rand::SeedableRng;
use starweave_logic::galaxy::{QueueTarget, SystemId};
use starweave_logic::progression::{ShipClass, TechId};
use starweave_logic::topology::{calculate_visible_systems, Visibility};
use starweave_logic::trade::{compute_trade, TradeInputs, TradeReport};

use crate::config::SimConfig;
use crate::economy::{
    compute_energy, compute_production, efficiency, integrate, metal_supply, EnergyReport,
    ProductionRates,
};
use crate::generation::generate_galaxy;
use crate::notices::{ColonizedBy, Notice};
use crate::persistence::{self, PersistenceError};
use crate::scheduler::{self, advance_queue, advance_research};
use crate::state::{GameState, Ship, Timestamp};
use crate::store::{KeyValueStore, MemoryStore};
use crate::timers::{TimerKind, Timers};
use crate::transit::{advance_ships, Arrival};

/// What `load_state` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored game was adopted.
    Loaded { migrated: bool },
    /// Nothing was stored; a new game was started.
    Fresh,
    /// The stored game was unreadable; a new game replaced it.
    Discarded,
    /// The stored game failed validation; a new game replaced it.
    Corrupted,
}

/// Everything that completed during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub delta_ms: u64,
    pub constructions: Vec<(SystemId, QueueTarget)>,
    pub arrivals: Vec<Arrival>,
    pub scan_completed: Option<SystemId>,
    pub research_completed: Option<TechId>,
    pub saved: bool,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.constructions.is_empty()
            && self.arrivals.is_empty()
            && self.scan_completed.is_none()
            && self.research_completed.is_none()
    }
}

/// Main simulation engine
pub struct Simulation<S: KeyValueStore = MemoryStore> {
    pub(crate) config: SimConfig,
    pub(crate) store: S,
    pub(crate) state: GameState,
    rng: StdRng,
    timers: Timers,
    pub(crate) notices: Vec<Notice>,
    running: bool,
    last_tick: Option<Timestamp>,
    last_saved: Option<Timestamp>,

    // Derived, recomputed after every tick and accepted action
    energy: EnergyReport,
    production: ProductionRates,
    trade: TradeReport,
    pub(crate) visibility: Visibility,
}

impl<S: KeyValueStore> Simulation<S> {
    /// Create a simulation with an empty galaxy. Call `new_game` or
    /// `load_state` before `start`.
    pub fn new(config: SimConfig, store: S) -> Self {
        let rng = match config.galaxy.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            store,
            state: GameState::default(),
            rng,
            timers: Timers::new(),
            notices: Vec::new(),
            running: false,
            last_tick: None,
            last_saved: None,
            energy: EnergyReport::default(),
            production: ProductionRates::default(),
            trade: TradeReport::default(),
            visibility: Visibility::default(),
        }
    }

    /// Adopt an existing state without touching storage.
    pub fn from_state(config: SimConfig, store: S, state: GameState) -> Self {
        let mut sim = Self::new(config, store);
        sim.state = state;
        sim.refresh_derived();
        sim
    }

    /// Generate a fresh galaxy and persist it right away.
    pub fn new_game(&mut self, now: Timestamp) {
        let (galaxy, home) = generate_galaxy(&self.config.galaxy, &mut self.rng);
        self.state = GameState {
            galaxy,
            home_system_id: Some(home),
            resources: self.config.starting_resources,
            ..Default::default()
        };
        self.timers.cancel(TimerKind::DebouncedSave);
        self.refresh_derived();
        log::info!("New game started at home system {}", home);
        self.flush_save(now);
    }

    /// Load the stored game, falling back to a new one when there is none
    /// or it cannot be trusted.
    pub fn load_state(&mut self, now: Timestamp) -> LoadOutcome {
        match persistence::load_state(&self.store, &self.config.save_key) {
            Ok(Some(loaded)) => {
                log::info!(
                    "Loaded save v{} with {} systems",
                    loaded.version,
                    loaded.state.galaxy.systems.len()
                );
                self.state = loaded.state;
                self.last_saved = loaded.last_saved;
                self.timers.cancel(TimerKind::DebouncedSave);
                self.refresh_derived();
                if loaded.migrated {
                    self.mark_changed(now);
                }
                LoadOutcome::Loaded {
                    migrated: loaded.migrated,
                }
            }
            Ok(None) => {
                self.new_game(now);
                LoadOutcome::Fresh
            }
            Err(PersistenceError::Corrupt(corruption)) => {
                log::warn!("Stored game is corrupted ({}); starting over", corruption);
                self.notices.push(Notice::SaveCorrupted {
                    reason: corruption.to_string(),
                });
                self.new_game(now);
                LoadOutcome::Corrupted
            }
            Err(PersistenceError::Store(e)) => {
                log::warn!("Could not read stored game: {}", e);
                self.notices.push(Notice::StorageFailure {
                    message: e.to_string(),
                });
                self.new_game(now);
                LoadOutcome::Fresh
            }
            Err(e) => {
                log::warn!("Discarding stored game: {}", e);
                self.notices.push(Notice::SaveDiscarded {
                    reason: e.to_string(),
                });
                self.new_game(now);
                LoadOutcome::Discarded
            }
        }
    }

    /// Begin ticking. The first tick measures its delta from `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.running = true;
        self.last_tick = Some(now);
        self.timers
            .reschedule(TimerKind::PeriodicSave, now + self.config.periodic_save_ms);
        log::info!("Simulation started");
    }

    /// Stop ticking. Pending debounced saves stay queued for the next
    /// `start`; call `flush_save` to persist immediately.
    pub fn stop(&mut self) {
        self.running = false;
        self.timers.cancel(TimerKind::PeriodicSave);
        log::info!("Simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the game to `now`. No-op while stopped.
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();
        if !self.running {
            return report;
        }
        let delta_ms = now.saturating_sub(self.last_tick.unwrap_or(now));
        self.last_tick = Some(now);
        report.delta_ms = delta_ms;

        // 1-2. Energy, then production and trade
        self.recompute_economy();

        // 3. Resources
        integrate(
            &mut self.state.resources,
            &self.production,
            delta_ms as f64 / 1000.0,
        );

        // 4. Construction queues
        let colony_level = self.state.tech.bonuses().colony_start_level();
        for system in self.state.galaxy.systems.iter_mut() {
            for target in advance_queue(system, now) {
                report.constructions.push((system.id, target));
            }
        }
        for &(system, target) in &report.constructions {
            if let QueueTarget::Ship(class) = target {
                self.spawn_ship(class, system);
            }
            log::info!("Construction complete at {}: {:?}", system, target);
            self.notices.push(Notice::ConstructionComplete { system, target });
        }

        // 5. Ships in transit
        let bonuses = self.state.tech.bonuses();
        report.arrivals = advance_ships(&mut self.state, &self.config, &bonuses, now);
        for arrival in &report.arrivals {
            if arrival.colonized {
                log::info!("Ship {} colonized system {}", arrival.ship, arrival.destination);
                self.notices.push(Notice::SystemColonized {
                    system: arrival.destination,
                    by: ColonizedBy::Ship,
                });
            }
        }

        // 6. Scan
        if let Some(scan) = self.state.scanning_system {
            if now.saturating_sub(scan.start_time) >= scan.duration {
                self.state.scanning_system = None;
                if let Some(system) = self.state.galaxy.system_mut(scan.system_id) {
                    if !system.is_player() {
                        system.colonize(colony_level);
                        self.notices.push(Notice::SystemColonized {
                            system: scan.system_id,
                            by: ColonizedBy::Scan,
                        });
                    }
                }
                log::info!("Scan of system {} complete", scan.system_id);
                report.scan_completed = Some(scan.system_id);
            }
        }

        // 7. Research
        if let Some(tech) = advance_research(&mut self.state.tech, now) {
            log::info!("Research complete: {:?}", tech);
            self.notices.push(Notice::ResearchComplete { tech });
            report.research_completed = Some(tech);
        }

        if !report.is_quiet() {
            self.mark_changed(now);
            self.refresh_derived();
        }

        for timer in self.timers.pop_due(now) {
            match timer {
                TimerKind::DebouncedSave => report.saved |= self.flush_save(now),
                TimerKind::PeriodicSave => {
                    report.saved |= self.flush_save(now);
                    self.timers
                        .reschedule(TimerKind::PeriodicSave, now + self.config.periodic_save_ms);
                }
            }
        }

        report
    }

    /// Persist now. Returns whether the write succeeded.
    ///
    /// A state that fails ownership validation is never written; the game
    /// is regenerated instead. Storage failures are reported as notices and
    /// the simulation carries on in memory.
    pub fn flush_save(&mut self, now: Timestamp) -> bool {
        self.timers.cancel(TimerKind::DebouncedSave);
        match persistence::save_state(&mut self.store, &self.config.save_key, &self.state, now) {
            Ok(()) => {
                self.last_saved = Some(now);
                true
            }
            Err(PersistenceError::Corrupt(corruption)) => {
                log::warn!("Refusing to save corrupted state ({}); regenerating", corruption);
                self.notices.push(Notice::SaveCorrupted {
                    reason: corruption.to_string(),
                });
                self.new_game(now);
                false
            }
            Err(e) => {
                log::warn!("Save failed: {}", e);
                self.notices.push(Notice::StorageFailure {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// Schedule a debounced save after a meaningful change.
    pub(crate) fn mark_changed(&mut self, now: Timestamp) {
        self.timers
            .reschedule(TimerKind::DebouncedSave, now + self.config.save_debounce_ms);
    }

    pub fn save_pending(&self) -> bool {
        self.timers.is_pending(TimerKind::DebouncedSave)
    }

    fn spawn_ship(&mut self, class: ShipClass, system: SystemId) {
        let id = self.state.allocate_ship_id();
        self.state.ships.push(Ship::docked(id, class, system));
    }

    fn recompute_economy(&mut self) {
        let bonuses = self.state.tech.bonuses();
        self.energy = compute_energy(&self.state, &bonuses);
        let efficiency = efficiency(&self.energy, &self.config);
        let supply = metal_supply(&self.state.galaxy, &bonuses, efficiency);
        self.trade = compute_trade(&TradeInputs {
            galaxy: &self.state.galaxy,
            built_routes: &self.state.built_routes,
            supply: &supply,
            bandwidth: self.config.route_bandwidth,
        });
        self.production = compute_production(
            &self.state,
            &self.trade,
            &supply,
            &bonuses,
            efficiency,
            &self.config,
        );
    }

    /// Recompute every derived view of the state.
    pub(crate) fn refresh_derived(&mut self) {
        self.recompute_economy();
        self.visibility = calculate_visible_systems(&self.state.galaxy, self.state.home_system_id);
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn energy(&self) -> &EnergyReport {
        &self.energy
    }

    pub fn production(&self) -> &ProductionRates {
        &self.production
    }

    pub fn trade(&self) -> &TradeReport {
        &self.trade
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn last_saved(&self) -> Option<Timestamp> {
        self.last_saved
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Head-of-queue progress for a system, `0..=1`.
    pub fn construction_progress(&self, system: SystemId, now: Timestamp) -> Option<f64> {
        scheduler::construction_progress(self.state.galaxy.system(system)?, now)
    }

    pub fn research_progress(&self, now: Timestamp) -> Option<f64> {
        let current = self.state.tech.current.as_ref()?;
        Some(scheduler::progress(current.start_time, current.duration, now))
    }

    pub fn scan_progress(&self, now: Timestamp) -> Option<f64> {
        let scan = self.state.scanning_system.as_ref()?;
        Some(scheduler::progress(scan.start_time, scan.duration, now))
    }
}
