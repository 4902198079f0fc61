//! Target-ordering policies used during move generation
//!
//! A policy only decides the order in which opposing combatants are
//! enumerated for an actor. It never affects legality or scoring, but since
//! alpha-beta keeps the first of equally scored moves, it does decide ties
//! and the amount of pruning.

use crate::core::Combatant;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Injectable ordering of candidate targets for one actor
///
/// Implementations are applied with a stable sort, so returning
/// [`Ordering::Equal`] keeps roster order.
pub trait TargetOrdering: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compare two candidate targets `a` and `b` from `actor`'s point of view
    fn compare(&self, actor: &Combatant, a: &Combatant, b: &Combatant) -> Ordering;

    /// Sort `targets` in place
    fn sort(&self, actor: &Combatant, targets: &mut [&Combatant]) {
        targets.sort_by(|a, b| self.compare(actor, a, b));
    }
}

/// Keep the opponent roster order
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterOrder;

impl TargetOrdering for RosterOrder {
    fn name(&self) -> &'static str {
        "roster"
    }

    fn compare(&self, _actor: &Combatant, _a: &Combatant, _b: &Combatant) -> Ordering {
        Ordering::Equal
    }
}

/// Nearest targets first
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestFirst;

impl TargetOrdering for ClosestFirst {
    fn name(&self) -> &'static str {
        "closest"
    }

    fn compare(&self, actor: &Combatant, a: &Combatant, b: &Combatant) -> Ordering {
        actor.distance_to(a).total_cmp(&actor.distance_to(b))
    }
}

/// Lowest remaining health plus shield first
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakestFirst;

impl TargetOrdering for WeakestFirst {
    fn name(&self) -> &'static str {
        "weakest"
    }

    fn compare(&self, _actor: &Combatant, a: &Combatant, b: &Combatant) -> Ordering {
        a.effective_health().total_cmp(&b.effective_health())
    }
}

/// Highest threat per remaining hit point first (damage per time / health)
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestPriorityFirst;

impl HighestPriorityFirst {
    pub fn priority(target: &Combatant) -> f64 {
        let health = target.effective_health();
        if health > 0.0 {
            target.dps() / health
        } else {
            0.0
        }
    }
}

impl TargetOrdering for HighestPriorityFirst {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn compare(&self, _actor: &Combatant, a: &Combatant, b: &Combatant) -> Ordering {
        Self::priority(b).total_cmp(&Self::priority(a))
    }
}

/// Lexicographic chain: later policies only break ties of earlier ones
pub struct ChainedOrdering {
    links: Vec<Arc<dyn TargetOrdering>>,
}

impl ChainedOrdering {
    pub fn new(links: Vec<Arc<dyn TargetOrdering>>) -> Self {
        ChainedOrdering { links }
    }
}

impl TargetOrdering for ChainedOrdering {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn compare(&self, actor: &Combatant, a: &Combatant, b: &Combatant) -> Ordering {
        self.links
            .iter()
            .map(|link| link.compare(actor, a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Serializable name of a built-in ordering policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOrder {
    #[default]
    Roster,
    Closest,
    Weakest,
    Priority,
}

impl TargetOrder {
    pub fn policy(self) -> Arc<dyn TargetOrdering> {
        match self {
            TargetOrder::Roster => Arc::new(RosterOrder),
            TargetOrder::Closest => Arc::new(ClosestFirst),
            TargetOrder::Weakest => Arc::new(WeakestFirst),
            TargetOrder::Priority => Arc::new(HighestPriorityFirst),
        }
    }

    /// Build one policy from a list of orders applied lexicographically
    ///
    /// Roster order is always the final tie-breaker, so an empty list is
    /// plain roster order.
    pub fn chain(orders: &[TargetOrder]) -> Arc<dyn TargetOrdering> {
        match orders {
            [] => Arc::new(RosterOrder),
            [single] => single.policy(),
            many => Arc::new(ChainedOrdering::new(many.iter().map(|o| o.policy()).collect())),
        }
    }
}

impl std::str::FromStr for TargetOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roster" => Ok(TargetOrder::Roster),
            "closest" => Ok(TargetOrder::Closest),
            "weakest" => Ok(TargetOrder::Weakest),
            "priority" => Ok(TargetOrder::Priority),
            _ => Err(format!(
                "invalid target order '{s}' (expected: roster, closest, weakest, priority)"
            )),
        }
    }
}

/// The legacy three-flag tie-break surface
///
/// Combined flags resolve to a lexicographic chain: highest priority, then
/// weakest, then closest, then roster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TieBreakFlags {
    #[serde(default)]
    pub closest_first: bool,
    #[serde(default)]
    pub weakest_first: bool,
    #[serde(default)]
    pub highest_priority_first: bool,
}

impl TieBreakFlags {
    pub fn to_orders(self) -> Vec<TargetOrder> {
        let mut orders = Vec::new();
        if self.highest_priority_first {
            orders.push(TargetOrder::Priority);
        }
        if self.weakest_first {
            orders.push(TargetOrder::Weakest);
        }
        if self.closest_first {
            orders.push(TargetOrder::Closest);
        }
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Allegiance, Position, UnitId};

    fn unit(id: u32, x: f64, health: f64, damage: f64) -> Combatant {
        Combatant::new(UnitId::new(id), Allegiance::Hostile, Position::new(x, 0.0), health)
            .with_weapon(damage, 1.0, 1.0)
    }

    fn sorted_ids(policy: &dyn TargetOrdering, targets: &[Combatant]) -> Vec<u32> {
        let actor =
            Combatant::new(UnitId::new(99), Allegiance::Friendly, Position::default(), 10.0);
        let mut refs: Vec<&Combatant> = targets.iter().collect();
        policy.sort(&actor, &mut refs);
        refs.iter().map(|c| c.id.as_u32()).collect()
    }

    #[test]
    fn test_single_policies() {
        let targets = [unit(0, 9.0, 10.0, 1.0), unit(1, 3.0, 40.0, 8.0), unit(2, 5.0, 5.0, 1.0)];

        assert_eq!(sorted_ids(&RosterOrder, &targets), vec![0, 1, 2]);
        assert_eq!(sorted_ids(&ClosestFirst, &targets), vec![1, 2, 0]);
        assert_eq!(sorted_ids(&WeakestFirst, &targets), vec![2, 0, 1]);
        // 1/10 = 0.1, 8/40 = 0.2, 1/5 = 0.2: ties keep roster order
        assert_eq!(sorted_ids(&HighestPriorityFirst, &targets), vec![1, 2, 0]);
    }

    #[test]
    fn test_flag_chain_order() {
        let flags = TieBreakFlags {
            closest_first: true,
            weakest_first: true,
            highest_priority_first: false,
        };
        assert_eq!(flags.to_orders(), vec![TargetOrder::Weakest, TargetOrder::Closest]);

        // Equal health: closest breaks the tie
        let targets = [unit(0, 9.0, 10.0, 1.0), unit(1, 3.0, 10.0, 1.0), unit(2, 5.0, 4.0, 1.0)];
        let policy = TargetOrder::chain(&flags.to_orders());
        assert_eq!(sorted_ids(policy.as_ref(), &targets), vec![2, 1, 0]);
    }

    #[test]
    fn test_parse_target_order() {
        assert_eq!("Closest".parse::<TargetOrder>().unwrap(), TargetOrder::Closest);
        assert!("nearest".parse::<TargetOrder>().is_err());
        assert_eq!(TargetOrder::chain(&[]).name(), "roster");
    }
}
