//! Atomic actions and the outbound orders they translate to

use crate::core::{ActionKind, Position, UnitId, UnitTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One atomic intent of a single combatant
///
/// Every action records the simulated time it was issued at, which is the
/// time eligibility is checked against when it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    /// Fire the actor's best weapon at `target`; damage lands immediately
    Attack {
        actor: UnitId,
        target: UnitId,
        issued_at: f64,
    },

    /// Travel straight to `destination`, arriving at `completes_at`
    Move {
        actor: UnitId,
        destination: Position,
        distance: f64,
        issued_at: f64,
        completes_at: f64,
    },

    /// Do nothing this ply
    Hold { actor: UnitId, issued_at: f64 },
}

impl Action {
    pub fn actor(&self) -> UnitId {
        match *self {
            Action::Attack { actor, .. }
            | Action::Move { actor, .. }
            | Action::Hold { actor, .. } => actor,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Attack { .. } => ActionKind::Attack,
            Action::Move { .. } => ActionKind::Move,
            Action::Hold { .. } => ActionKind::Hold,
        }
    }

    pub fn issued_at(&self) -> f64 {
        match *self {
            Action::Attack { issued_at, .. }
            | Action::Move { issued_at, .. }
            | Action::Hold { issued_at, .. } => issued_at,
        }
    }

    /// Simulated time at which the action has fully taken effect
    pub fn completes_at(&self) -> f64 {
        match *self {
            Action::Move { completes_at, .. } => completes_at,
            Action::Attack { issued_at, .. } | Action::Hold { issued_at, .. } => issued_at,
        }
    }

    pub fn target(&self) -> Option<UnitId> {
        match *self {
            Action::Attack { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Attack { actor, target, .. } => write!(f, "{actor} attack {target}"),
            Action::Move {
                actor, destination, ..
            } => write!(f, "{actor} move {destination}"),
            Action::Hold { actor, .. } => write!(f, "{actor} hold"),
        }
    }
}

/// A concrete in-game order for one live unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitOrder {
    pub unit_tag: UnitTag,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    Attack { target_tag: UnitTag },
    MoveTo { x: f64, y: f64 },
    Hold,
}

impl fmt::Display for UnitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            Order::Attack { target_tag } => {
                write!(f, "unit {} attack {}", self.unit_tag, target_tag)
            }
            Order::MoveTo { x, y } => write!(f, "unit {} move to ({x:.2}, {y:.2})", self.unit_tag),
            Order::Hold => write!(f, "unit {} hold", self.unit_tag),
        }
    }
}
