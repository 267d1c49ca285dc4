//! Pure simulation logic for Starweave.
//!
//! Everything in this crate is independent of wall-clock time, storage or
//! any runtime. Functions take plain data and return results, which keeps
//! them unit-testable and lets the engine crate stay a thin orchestrator.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`allocator`] | Fair-share (water-filling) supply/demand solver |
//! | [`galaxy`] | Systems, routes, markets, construction queue items |
//! | [`progression`] | Building/ship/tech tables, cost and time curves |
//! | [`topology`] | Fog-of-war BFS, tethers, shortest paths |
//! | [`trade`] | Metals flow network over built routes |

pub mod allocator;
pub mod galaxy;
pub mod progression;
pub mod topology;
pub mod trade;
