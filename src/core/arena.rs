//! Index-addressed combatant storage
//!
//! Every search node owns one arena. Sides refer to combatants by
//! [`UnitId`], never by reference, so cloning a node is a flat copy and no
//! branch can hold a pointer into another branch's data.

use crate::core::{Allegiance, Combatant, UnitId};
use crate::{Result, SkirmishError};
use serde::{Deserialize, Serialize};

/// Dense storage for all combatants of one search node
///
/// IDs are assigned contiguously by [`push`](CombatantArena::push) and stay
/// valid for the whole search: dead combatants are kept (and skipped by
/// generation), never removed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatantArena {
    combatants: Vec<Combatant>,
}

impl CombatantArena {
    pub fn new() -> Self {
        CombatantArena {
            combatants: Vec::new(),
        }
    }

    /// ID the next pushed combatant will receive
    pub fn next_id(&self) -> UnitId {
        UnitId::new(self.combatants.len() as u32)
    }

    /// Store a combatant, overwriting its `id` with the assigned index
    pub fn push(&mut self, mut combatant: Combatant) -> UnitId {
        let id = self.next_id();
        combatant.id = id;
        self.combatants.push(combatant);
        id
    }

    /// Get a combatant by ID
    pub fn get(&self, id: UnitId) -> Result<&Combatant> {
        self.combatants
            .get(id.index())
            .ok_or(SkirmishError::UnitNotFound(id.as_u32()))
    }

    /// Get a mutable reference to a combatant
    pub fn get_mut(&mut self, id: UnitId) -> Result<&mut Combatant> {
        self.combatants
            .get_mut(id.index())
            .ok_or(SkirmishError::UnitNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: UnitId) -> bool {
        id.index() < self.combatants.len()
    }

    /// Iterate over all combatants, dead ones included, in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    /// Live combatants of one allegiance, in ID order
    pub fn living(&self, allegiance: Allegiance) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .iter()
            .filter(move |c| c.allegiance == allegiance && c.is_alive())
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}
