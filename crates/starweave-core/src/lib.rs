//! Starweave Core - 4X Colonization Simulation Engine
//!
//! Owns the authoritative game state and evolves it tick by tick: resource
//! accrual, construction and research queues, fog of war, metals trade,
//! ship transit, and persistence with corruption recovery. Presentation is
//! an external collaborator that reads snapshots and calls the action API.
//!
//! # Architecture
//!
//! - [`engine::Simulation`] is the single owner of [`state::GameState`].
//!   Time is passed in as millisecond timestamps; the host drives `tick`.
//! - Derived values (energy, production, trade, visibility) are recomputed
//!   after each tick or accepted action and exposed through getters.
//! - Pure rules live in `starweave-logic`; this crate orchestrates them.
//!
//! # Example
//!
//! ```rust,no_run
//! use starweave_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default(), MemoryStore::new());
//! sim.load_state(0);
//! sim.start(0);
//!
//! let mut now = 0;
//! loop {
//!     now += sim.config().tick_interval_ms;
//!     sim.tick(now);
//! }
//! ```

pub mod actions;
pub mod config;
pub mod economy;
pub mod engine;
pub mod generation;
pub mod migration;
pub mod notices;
pub mod persistence;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod timers;
pub mod transit;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::actions::Rejection;
    pub use crate::config::{GalaxyConfig, SimConfig};
    pub use crate::engine::{LoadOutcome, Simulation, TickReport};
    pub use crate::notices::Notice;
    pub use crate::state::{GameState, ShipId, Timestamp, ViewState};
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore};
    pub use starweave_logic::galaxy::{QueueTarget, RouteId, SystemId};
    pub use starweave_logic::progression::{BuildingKind, ShipClass, TechId};
}
