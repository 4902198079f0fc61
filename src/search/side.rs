//! One side of a search node

use crate::core::{Allegiance, Combatant, CombatantArena, Polarity, UnitId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ordered roster of combatant indices tagged with a search polarity
///
/// The roster order is the generation order for actors, so it must stay
/// fixed for the whole search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub allegiance: Allegiance,
    pub polarity: Polarity,
    roster: SmallVec<[UnitId; 8]>,
}

impl Side {
    pub fn new(allegiance: Allegiance, polarity: Polarity) -> Self {
        Side {
            allegiance,
            polarity,
            roster: SmallVec::new(),
        }
    }

    pub fn push(&mut self, id: UnitId) {
        self.roster.push(id);
    }

    pub fn roster(&self) -> &[UnitId] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Living members in roster order
    pub fn living<'a>(
        &'a self,
        arena: &'a CombatantArena,
    ) -> impl Iterator<Item = &'a Combatant> + 'a {
        self.roster
            .iter()
            .filter_map(move |id| arena.get(*id).ok())
            .filter(|c| c.is_alive())
    }

    pub fn has_living(&self, arena: &CombatantArena) -> bool {
        self.living(arena).next().is_some()
    }

    /// Does any living member have an elapsed eligibility timestamp?
    pub fn can_act(&self, arena: &CombatantArena, time: f64) -> bool {
        self.living(arena).any(|c| c.is_ready_at(time))
    }
}
