//! Derived-stat lookup by unit type
//!
//! Observations of live units usually carry only the volatile fields (health,
//! position, cooldowns). The static profile of a unit type is looked up here.

use crate::core::Weapon;
use crate::{Result, SkirmishError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Static combat profile of one unit type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeProfile {
    pub max_health: f64,

    #[serde(default)]
    pub max_shield: f64,

    pub speed: f64,

    #[serde(default)]
    pub weapons: Vec<Weapon>,
}

/// Unit type name -> profile
///
/// Uses FxHashMap since lookups happen once per unit per decision cycle and
/// the keys are short names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeCatalog {
    profiles: FxHashMap<String, UnitTypeProfile>,
}

impl UnitTypeCatalog {
    pub fn new() -> Self {
        UnitTypeCatalog {
            profiles: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, unit_type: impl Into<String>, profile: UnitTypeProfile) {
        self.profiles.insert(unit_type.into(), profile);
    }

    /// Look up a unit type's profile
    pub fn get(&self, unit_type: &str) -> Result<&UnitTypeProfile> {
        self.profiles
            .get(unit_type)
            .ok_or_else(|| SkirmishError::UnknownUnitType(unit_type.to_string()))
    }

    /// Profile of `unit_type`, if catalogued
    pub fn lookup(&self, unit_type: &str) -> Option<&UnitTypeProfile> {
        self.profiles.get(unit_type)
    }

    pub fn contains(&self, unit_type: &str) -> bool {
        self.profiles.contains_key(unit_type)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "stalker": {
                "max_health": 80.0,
                "max_shield": 80.0,
                "speed": 4.13,
                "weapons": [{ "damage": 13.0, "range": 6.0, "cooldown": 1.34 }]
            }
        }"#;
        let catalog: UnitTypeCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 1);

        let stalker = catalog.get("stalker").unwrap();
        assert_eq!(stalker.max_shield, 80.0);
        assert_eq!(stalker.weapons[0].attacks_per_volley, 1);
        assert!(matches!(
            catalog.get("zealot"),
            Err(SkirmishError::UnknownUnitType(name)) if name == "zealot"
        ));
    }
}
