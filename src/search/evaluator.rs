//! Value functions scoring a search state
//!
//! Every evaluator is pure: it reads the state and returns a score signed
//! from the given perspective, higher being better for that side.

use crate::core::{Allegiance, Combatant};
use crate::search::SearchState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Injectable heuristic value function
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, state: &SearchState, perspective: Allegiance) -> f64;
}

fn damage_taken_by(state: &SearchState, allegiance: Allegiance) -> f64 {
    state
        .arena()
        .iter()
        .filter(|c| c.allegiance == allegiance)
        .map(Combatant::damage_taken)
        .fold(0.0, |total, damage| total + damage)
}

/// Damage the opposing side has taken so far
///
/// One-sided: losses on the perspective's own side do not lower the score.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageInflicted;

impl Evaluator for DamageInflicted {
    fn name(&self) -> &'static str {
        "damage-inflicted"
    }

    fn evaluate(&self, state: &SearchState, perspective: Allegiance) -> f64 {
        damage_taken_by(state, perspective.opponent())
    }
}

/// Damage inflicted minus damage taken, antisymmetric between perspectives
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageDifference;

impl Evaluator for DamageDifference {
    fn name(&self) -> &'static str {
        "damage-difference"
    }

    fn evaluate(&self, state: &SearchState, perspective: Allegiance) -> f64 {
        damage_taken_by(state, perspective.opponent()) - damage_taken_by(state, perspective)
    }
}

/// Lifetime damage: sum of sqrt(health + shield) * dps, own minus enemy
#[derive(Debug, Clone, Copy, Default)]
pub struct LifetimeDamage;

impl LifetimeDamage {
    fn side_value(state: &SearchState, allegiance: Allegiance) -> f64 {
        state
            .arena()
            .living(allegiance)
            .map(|c| c.effective_health().sqrt() * c.dps())
            .fold(0.0, |total, value| total + value)
    }
}

impl Evaluator for LifetimeDamage {
    fn name(&self) -> &'static str {
        "lifetime-damage"
    }

    fn evaluate(&self, state: &SearchState, perspective: Allegiance) -> f64 {
        Self::side_value(state, perspective) - Self::side_value(state, perspective.opponent())
    }
}

/// Serializable name of a built-in value function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueFunction {
    #[default]
    DamageInflicted,
    DamageDifference,
    LifetimeDamage,
}

impl ValueFunction {
    pub fn evaluator(self) -> Arc<dyn Evaluator> {
        match self {
            ValueFunction::DamageInflicted => Arc::new(DamageInflicted),
            ValueFunction::DamageDifference => Arc::new(DamageDifference),
            ValueFunction::LifetimeDamage => Arc::new(LifetimeDamage),
        }
    }
}

impl std::str::FromStr for ValueFunction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "damage-inflicted" | "inflicted" => Ok(ValueFunction::DamageInflicted),
            "damage-difference" | "difference" => Ok(ValueFunction::DamageDifference),
            "lifetime-damage" | "ltd" => Ok(ValueFunction::LifetimeDamage),
            _ => Err(format!(
                "invalid value function '{s}' (expected: inflicted, difference, ltd)"
            )),
        }
    }
}
