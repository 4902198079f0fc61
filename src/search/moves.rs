//! A side's joint choice for one ply

use crate::core::{Allegiance, CombatantArena, UnitId};
use crate::search::{Action, Order, UnitOrder};
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The actions chosen for every ready combatant of one side during one ply
///
/// Actions are kept in roster order of their actors. A Move with no actions
/// is a pass: the side had no ready combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub mover: Allegiance,
    actions: SmallVec<[Action; 4]>,
}

impl Move {
    pub fn new(mover: Allegiance) -> Self {
        Move {
            mover,
            actions: SmallVec::new(),
        }
    }

    /// A pass for `mover`
    pub fn empty(mover: Allegiance) -> Self {
        Self::new(mover)
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The action assigned to `actor`, if it has one in this Move
    pub fn action_for(&self, actor: UnitId) -> Option<&Action> {
        self.actions.iter().find(|a| a.actor() == actor)
    }

    /// Translate into concrete orders addressed by live unit tags
    pub fn orders(&self, arena: &CombatantArena) -> Result<Vec<UnitOrder>> {
        self.actions
            .iter()
            .map(|action| {
                let unit_tag = arena.get(action.actor())?.tag;
                let order = match *action {
                    Action::Attack { target, .. } => Order::Attack {
                        target_tag: arena.get(target)?.tag,
                    },
                    Action::Move { destination, .. } => Order::MoveTo {
                        x: destination.x,
                        y: destination.y,
                    },
                    Action::Hold { .. } => Order::Hold,
                };
                Ok(UnitOrder { unit_tag, order })
            })
            .collect()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{action}")?;
        }
        write!(f, "]")
    }
}
