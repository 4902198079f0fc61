//! Skirmish Search - tactical move search for unit combat
//!
//! Bounded alpha-beta search over simultaneous moves, where every unit's
//! attacks and movements are gated by cooldown and travel-time timestamps.
//! Built to pick a tactical decision for one side within a wall-clock budget.

pub mod core;
pub mod error;
pub mod playout;
pub mod scenario;
pub mod search;
pub mod tournament;

pub use error::{Result, SkirmishError};
