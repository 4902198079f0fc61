//! Core combat types: combatants, their arena and static unit profiles

pub mod arena;
pub mod catalog;
pub mod combatant;
pub mod types;

pub use arena::CombatantArena;
pub use catalog::{UnitTypeCatalog, UnitTypeProfile};
pub use combatant::{Combatant, UnitObservation, Weapon};
pub use types::{ActionKind, Allegiance, Polarity, Position, UnitId, UnitTag, TIME_EPSILON};
