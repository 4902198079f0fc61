//! Scenario files and seeded random scenarios
//!
//! A scenario is the JSON form of one decision cycle's input: both rosters as
//! observed, an optional unit-type catalog and an optional search
//! configuration. Fixture files may also record what the search is expected
//! to decide.

use crate::core::{ActionKind, Position, UnitObservation, UnitTypeCatalog, Weapon};
use crate::search::{SearchConfig, SearchState};
use crate::{Result, SkirmishError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected search result recorded in a fixture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// Kind of the first friendly unit's action in the chosen Move
    #[serde(default)]
    pub root_action: Option<ActionKind>,

    /// Exact score of the chosen Move
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Simulated time of the observation
    #[serde(default)]
    pub time: f64,

    pub friendly: Vec<UnitObservation>,

    pub hostile: Vec<UnitObservation>,

    #[serde(default)]
    pub config: SearchConfig,

    #[serde(default)]
    pub catalog: UnitTypeCatalog,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,
}

impl Scenario {
    /// Load and check a scenario file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text).map_err(|e| match e {
            SkirmishError::InvalidScenario(msg) => {
                SkirmishError::InvalidScenario(format!("{}: {msg}", path.as_ref().display()))
            }
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.check()?;
        Ok(scenario)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject observations no combatant can be built from
    fn check(&self) -> Result<()> {
        for obs in self.friendly.iter().chain(&self.hostile) {
            let numbers = [obs.health, obs.shield, obs.position.x, obs.position.y];
            if numbers.iter().any(|n| !n.is_finite()) || obs.health < 0.0 {
                return Err(SkirmishError::InvalidScenario(format!(
                    "unit {} has invalid health or position",
                    obs.tag
                )));
            }
            if obs.weapons.iter().any(|w| w.range < 0.0 || w.cooldown < 0.0 || w.damage < 0.0) {
                return Err(SkirmishError::InvalidScenario(format!(
                    "unit {} has a weapon with negative stats",
                    obs.tag
                )));
            }
        }
        Ok(())
    }

    /// Root search state for this scenario
    pub fn root_state(&self) -> Result<SearchState> {
        Ok(
            SearchState::from_observations(&self.friendly, &self.hostile, &self.catalog, self.time)?
                .with_time_step(self.config.time_step),
        )
    }
}

fn random_unit(rng: &mut ChaCha12Rng, tag: u64, x_range: (f64, f64)) -> UnitObservation {
    let health = rng.gen_range(20.0..80.0_f64).round();
    let weapon = Weapon {
        damage: rng.gen_range(4.0..20.0_f64).round(),
        attacks_per_volley: if rng.gen_bool(0.2) { 2 } else { 1 },
        range: rng.gen_range(1.0..6.0_f64).round(),
        cooldown: (rng.gen_range(0.5..2.0_f64) * 4.0).round() / 4.0,
    };
    let position = Position::new(
        rng.gen_range(x_range.0..x_range.1).round(),
        rng.gen_range(-5.0..5.0_f64).round(),
    );
    let mut observation =
        UnitObservation::new(tag, position, health, weapon, rng.gen_range(1.0..4.0_f64).round());
    if rng.gen_bool(0.25) {
        let shield = rng.gen_range(5.0..30.0_f64).round();
        observation.shield = shield;
        observation.max_shield = Some(shield);
    }
    observation
}

/// A reproducible random engagement with `per_side` units on each side
///
/// Friendly units start on the left (x in 0..4), hostile units on the right
/// (x in 10..14). All stats are rounded so scenarios print readably.
pub fn random_scenario(seed: u64, per_side: usize) -> Scenario {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let friendly = (0..per_side)
        .map(|i| random_unit(&mut rng, 1000 + i as u64, (0.0, 4.0)))
        .collect();
    let hostile = (0..per_side)
        .map(|i| random_unit(&mut rng, 2000 + i as u64, (10.0, 14.0)))
        .collect();

    Scenario {
        name: Some(format!("random-{seed}")),
        time: 0.0,
        friendly,
        hostile,
        config: SearchConfig::default(),
        catalog: UnitTypeCatalog::new(),
        expect: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Allegiance;

    #[test]
    fn test_random_scenario_is_reproducible() {
        let a = random_scenario(42, 3);
        let b = random_scenario(42, 3);
        assert_eq!(a.friendly, b.friendly);
        assert_eq!(a.hostile, b.hostile);
        assert_ne!(random_scenario(43, 3).friendly, a.friendly);

        let state = a.root_state().unwrap();
        assert_eq!(state.side(Allegiance::Friendly).len(), 3);
        assert_eq!(state.side(Allegiance::Hostile).len(), 3);
    }

    #[test]
    fn test_minimal_json() {
        let scenario = Scenario::from_json(
            r#"{
                "friendly": [{"tag": 1, "position": {"x": 0, "y": 0}, "health": 40,
                              "weapons": [{"damage": 10, "range": 5, "cooldown": 1}], "speed": 2}],
                "hostile": [{"tag": 2, "unit_type": "brute", "position": {"x": 4, "y": 0},
                             "health": 30}],
                "catalog": {"brute": {"max_health": 50, "speed": 3,
                                      "weapons": [{"damage": 20, "range": 1, "cooldown": 1.5}]}},
                "config": {"max_depth": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.config.max_depth, 3);
        let state = scenario.root_state().unwrap();
        let brute = state.living(Allegiance::Hostile).next().unwrap();
        assert_eq!(brute.max_health, 50.0);
        assert_eq!(brute.damage, 20.0);
    }

    #[test]
    fn test_rejects_negative_health() {
        let err = Scenario::from_json(
            r#"{"friendly": [{"tag": 1, "position": {"x": 0, "y": 0}, "health": -1}],
                "hostile": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SkirmishError::InvalidScenario(_)));
    }

    #[test]
    fn test_unknown_unit_type() {
        let scenario = Scenario::from_json(
            r#"{"friendly": [{"tag": 1, "unit_type": "ghost", "position": {"x": 0, "y": 0},
                              "health": 10}],
                "hostile": []}"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.root_state(),
            Err(SkirmishError::UnknownUnitType(_))
        ));
    }
}
