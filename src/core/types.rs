//! Strongly-typed wrappers for combat concepts
//!
//! This module provides newtypes to prevent type confusion and make the code
//! more self-documenting. Arena indices, external unit tags and the two kinds
//! of "side" labels (domain allegiance vs search polarity) are distinct types
//! that cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing simulated timestamps
///
/// Eligibility times are sums of cooldowns and travel times, so a unit that
/// becomes ready "exactly" at a ply boundary must not miss it to rounding.
pub const TIME_EPSILON: f64 = 1e-9;

/// Index of a combatant inside a [`CombatantArena`](crate::core::CombatantArena)
///
/// IDs are dense and stable for the duration of one search invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        UnitId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a unit in the live game, used to address outbound orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTag(pub u64);

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the (obstacle-free) battlefield plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point reached by travelling `distance` from here straight towards `target`
    ///
    /// Returns `self` unchanged when both points coincide, since there is no
    /// direction to travel in.
    pub fn towards(&self, target: &Position, distance: f64) -> Position {
        let length = self.distance_to(target);
        if length <= f64::EPSILON {
            return *self;
        }
        let scale = distance / length;
        Position {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Domain identity of a combatant: whose unit it is
///
/// The friendly side is always the side the search decides for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Allegiance {
    Friendly,
    Hostile,
}

impl Allegiance {
    pub fn opponent(self) -> Allegiance {
        match self {
            Allegiance::Friendly => Allegiance::Hostile,
            Allegiance::Hostile => Allegiance::Friendly,
        }
    }
}

impl fmt::Display for Allegiance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allegiance::Friendly => write!(f, "friendly"),
            Allegiance::Hostile => write!(f, "hostile"),
        }
    }
}

/// Search role of a side for the duration of one search call
///
/// Polarity only says which way a side pushes the scalar score. It carries no
/// meaning about who owns the units; see [`Allegiance`] for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Max,
    Min,
}

impl Polarity {
    pub fn is_maximizing(self) -> bool {
        matches!(self, Polarity::Max)
    }

    /// Worst possible score for a side with this polarity
    pub fn worst_score(self) -> f64 {
        match self {
            Polarity::Max => f64::NEG_INFINITY,
            Polarity::Min => f64::INFINITY,
        }
    }

    /// Strict improvement test: does `candidate` beat `incumbent` for this side?
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Polarity::Max => candidate > incumbent,
            Polarity::Min => candidate < incumbent,
        }
    }
}

/// Kind of an atomic action, recorded on a combatant as its last action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Move,
    Hold,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Attack => write!(f, "attack"),
            ActionKind::Move => write!(f, "move"),
            ActionKind::Hold => write!(f, "hold"),
        }
    }
}
