//! Combatant snapshots and their construction from live observations

use crate::core::{ActionKind, Allegiance, Position, UnitId, UnitTag, UnitTypeCatalog, TIME_EPSILON};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One weapon of a unit's loadout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Damage of a single attack
    pub damage: f64,

    /// Attacks fired per volley (e.g. twin-linked weapons fire 2)
    #[serde(default = "default_attacks_per_volley")]
    pub attacks_per_volley: u32,

    /// Maximum distance at which the weapon can hit
    pub range: f64,

    /// Time between volleys
    pub cooldown: f64,
}

fn default_attacks_per_volley() -> u32 {
    1
}

impl Weapon {
    pub fn new(damage: f64, range: f64, cooldown: f64) -> Self {
        Weapon {
            damage,
            attacks_per_volley: 1,
            range,
            cooldown,
        }
    }

    /// Total damage of one volley
    pub fn volley_damage(&self) -> f64 {
        self.attacks_per_volley as f64 * self.damage
    }
}

/// Snapshot of one live unit as reported by the game-observation layer
///
/// Optional stats are filled in from the [`UnitTypeCatalog`] entry for
/// `unit_type` when the observation does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitObservation {
    pub tag: u64,

    #[serde(default)]
    pub unit_type: Option<String>,

    pub position: Position,

    pub health: f64,

    #[serde(default)]
    pub max_health: Option<f64>,

    #[serde(default)]
    pub shield: f64,

    #[serde(default)]
    pub max_shield: Option<f64>,

    #[serde(default)]
    pub weapons: Vec<Weapon>,

    #[serde(default)]
    pub speed: Option<f64>,

    /// Time until the unit's weapon is ready again
    #[serde(default)]
    pub weapon_cooldown: f64,

    /// Time until an in-flight movement order completes
    #[serde(default)]
    pub busy_for: f64,
}

impl UnitObservation {
    /// Minimal observation carrying all stats inline (no catalog lookup needed)
    pub fn new(tag: u64, position: Position, health: f64, weapon: Weapon, speed: f64) -> Self {
        UnitObservation {
            tag,
            unit_type: None,
            position,
            health,
            max_health: Some(health),
            shield: 0.0,
            max_shield: None,
            weapons: vec![weapon],
            speed: Some(speed),
            weapon_cooldown: 0.0,
            busy_for: 0.0,
        }
    }

    /// Does the observation carry every stat a catalog entry would supply?
    pub fn has_inline_stats(&self) -> bool {
        !self.weapons.is_empty() && self.max_health.is_some() && self.speed.is_some()
    }
}

/// One unit's combat-relevant state at a point in simulated time
///
/// Combatants are plain `Copy` values: every search node owns its own copies,
/// so applying an action in one branch can never leak into a sibling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Arena index of this combatant
    pub id: UnitId,

    /// Tag of the live unit this snapshot was taken from
    pub tag: UnitTag,

    pub allegiance: Allegiance,

    pub health: f64,
    pub max_health: f64,
    pub shield: f64,
    pub max_shield: f64,

    /// Best single-weapon volley damage
    pub damage: f64,

    /// Longest weapon range
    pub range: f64,

    /// Longest weapon cooldown
    pub cooldown: f64,

    pub speed: f64,

    pub position: Position,

    /// Earliest time at which the unit may attack again
    pub attack_eligible_at: f64,

    /// Earliest time at which the unit may start a new move
    pub move_eligible_at: f64,

    /// Kind of the most recently applied action, if any
    pub last_action: Option<ActionKind>,
}

impl Combatant {
    /// Create a combatant with no weapon, no shield and zero speed
    ///
    /// Use the `with_*` methods to fill in the rest of the profile.
    pub fn new(id: UnitId, allegiance: Allegiance, position: Position, health: f64) -> Self {
        let health = health.max(0.0);
        Combatant {
            id,
            tag: UnitTag(id.as_u32() as u64),
            allegiance,
            health,
            max_health: health,
            shield: 0.0,
            max_shield: 0.0,
            damage: 0.0,
            range: 0.0,
            cooldown: 0.0,
            speed: 0.0,
            position,
            attack_eligible_at: 0.0,
            move_eligible_at: 0.0,
            last_action: None,
        }
    }

    pub fn with_tag(mut self, tag: UnitTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_weapon(mut self, damage: f64, range: f64, cooldown: f64) -> Self {
        self.damage = damage;
        self.range = range;
        self.cooldown = cooldown;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_shield(mut self, shield: f64) -> Self {
        self.shield = shield.max(0.0);
        self.max_shield = self.shield;
        self
    }

    /// Build a combatant from a live observation taken at simulated time `now`
    ///
    /// The weapon profile takes the best weapon's stats rather than a blend:
    /// damage is the largest volley, range and cooldown the largest of the
    /// loadout. A unit without weapons never attacks.
    pub fn from_observation(
        id: UnitId,
        allegiance: Allegiance,
        observation: &UnitObservation,
        catalog: &UnitTypeCatalog,
        now: f64,
    ) -> Result<Self> {
        // An uncatalogued type is fine as long as the observation is complete
        let profile = match &observation.unit_type {
            Some(unit_type) if observation.has_inline_stats() => catalog.lookup(unit_type),
            Some(unit_type) => Some(catalog.get(unit_type)?),
            None => None,
        };

        let weapons: &[Weapon] = if !observation.weapons.is_empty() {
            &observation.weapons
        } else {
            profile.map(|p| p.weapons.as_slice()).unwrap_or(&[])
        };

        let damage = weapons.iter().map(Weapon::volley_damage).fold(0.0, f64::max);
        let range = weapons.iter().map(|w| w.range).fold(0.0, f64::max);
        let cooldown = weapons.iter().map(|w| w.cooldown).fold(0.0, f64::max);

        let health = observation.health.max(0.0);
        let max_health = observation
            .max_health
            .or(profile.map(|p| p.max_health))
            .unwrap_or(health)
            .max(health);
        let shield = observation.shield.max(0.0);
        let max_shield = observation
            .max_shield
            .or(profile.map(|p| p.max_shield))
            .unwrap_or(shield)
            .max(shield);
        let speed = observation
            .speed
            .or(profile.map(|p| p.speed))
            .unwrap_or(0.0)
            .max(0.0);

        Ok(Combatant {
            id,
            tag: UnitTag(observation.tag),
            allegiance,
            health,
            max_health,
            shield,
            max_shield,
            damage,
            range,
            cooldown,
            speed,
            position: observation.position,
            attack_eligible_at: now + observation.weapon_cooldown.max(0.0),
            move_eligible_at: now + observation.busy_for.max(0.0),
            last_action: None,
        })
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Can this combatant fire at all (has a weapon)?
    pub fn is_armed(&self) -> bool {
        self.damage > 0.0
    }

    pub fn can_attack_at(&self, time: f64) -> bool {
        self.is_alive() && self.is_armed() && self.attack_eligible_at <= time + TIME_EPSILON
    }

    pub fn can_move_at(&self, time: f64) -> bool {
        self.is_alive() && self.move_eligible_at <= time + TIME_EPSILON
    }

    /// Ready combatants receive at least a Hold during move generation
    pub fn is_ready_at(&self, time: f64) -> bool {
        self.can_attack_at(time) || self.can_move_at(time)
    }

    pub fn distance_to(&self, other: &Combatant) -> f64 {
        self.position.distance_to(&other.position)
    }

    pub fn in_range_of(&self, target: &Combatant) -> bool {
        self.distance_to(target) <= self.range + TIME_EPSILON
    }

    /// Damage per unit of simulated time
    pub fn dps(&self) -> f64 {
        if self.cooldown > 0.0 {
            self.damage / self.cooldown
        } else {
            self.damage
        }
    }

    /// Remaining hit points including shield
    pub fn effective_health(&self) -> f64 {
        self.health + self.shield
    }

    /// Hit points lost relative to full health and shield
    pub fn damage_taken(&self) -> f64 {
        (self.max_health - self.health) + (self.max_shield - self.shield)
    }

    /// Apply incoming damage: shield absorbs first, health is clamped at zero
    pub fn take_damage(&mut self, amount: f64) {
        let absorbed = amount.min(self.shield).max(0.0);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitTypeProfile;
    use crate::search::SearchState;
    use crate::SkirmishError;

    fn build(obs: &UnitObservation, catalog: &UnitTypeCatalog) -> Result<Combatant> {
        Combatant::from_observation(UnitId::new(3), Allegiance::Hostile, obs, catalog, 0.0)
    }

    fn observation() -> UnitObservation {
        UnitObservation {
            tag: 77,
            unit_type: None,
            position: Position::new(1.0, 2.0),
            health: 30.0,
            max_health: Some(45.0),
            shield: 0.0,
            max_shield: None,
            weapons: vec![
                Weapon {
                    damage: 5.0,
                    attacks_per_volley: 2,
                    range: 4.0,
                    cooldown: 0.8,
                },
                Weapon::new(8.0, 6.0, 1.5),
            ],
            speed: Some(2.25),
            weapon_cooldown: 0.5,
            busy_for: 0.0,
        }
    }

    #[test]
    fn test_best_weapon_stats() {
        let catalog = UnitTypeCatalog::new();
        let c = Combatant::from_observation(
            UnitId::new(0),
            Allegiance::Friendly,
            &observation(),
            &catalog,
            10.0,
        )
        .unwrap();

        // 2 x 5 beats 1 x 8
        assert_eq!(c.damage, 10.0);
        assert_eq!(c.range, 6.0);
        assert_eq!(c.cooldown, 1.5);
        assert_eq!(c.max_health, 45.0);
        assert_eq!(c.tag, UnitTag(77));
        assert_eq!(c.attack_eligible_at, 10.5);
        assert_eq!(c.move_eligible_at, 10.0);
        assert!(!c.can_attack_at(10.0));
        assert!(c.can_move_at(10.0));
    }

    #[test]
    fn test_catalog_fills_missing_stats() {
        let mut catalog = UnitTypeCatalog::new();
        catalog.insert(
            "marine",
            UnitTypeProfile {
                max_health: 45.0,
                max_shield: 0.0,
                speed: 3.15,
                weapons: vec![Weapon::new(6.0, 5.0, 0.61)],
            },
        );

        let mut obs = observation();
        obs.unit_type = Some("marine".to_string());
        obs.weapons.clear();
        obs.max_health = None;
        obs.speed = None;

        let c = build(&obs, &catalog).unwrap();
        assert_eq!(c.damage, 6.0);
        assert_eq!(c.speed, 3.15);
        assert_eq!(c.max_health, 45.0);

        obs.unit_type = Some("zergling".to_string());
        let err = build(&obs, &catalog);
        assert!(matches!(err, Err(SkirmishError::UnknownUnitType(name)) if name == "zergling"));
    }

    #[test]
    fn test_uncatalogued_type_with_inline_stats() {
        let catalog = UnitTypeCatalog::new();
        let weapon = Weapon::new(9.0, 4.0, 1.0);
        let mut obs = UnitObservation::new(5, Position::new(2.0, 0.0), 40.0, weapon, 2.5);
        obs.unit_type = Some("ghost".to_string());
        assert!(obs.has_inline_stats());

        let c = build(&obs, &catalog).unwrap();
        assert_eq!(c.damage, 9.0);
        assert_eq!(c.speed, 2.5);
        assert_eq!(c.max_health, 40.0);

        // The same type is still rejected once a stat has to come from the catalog
        obs.speed = None;
        assert!(!obs.has_inline_stats());
        let err = build(&obs, &catalog);
        assert!(matches!(err, Err(SkirmishError::UnknownUnitType(name)) if name == "ghost"));

        // A whole root state builds around the uncatalogued unit
        obs.speed = Some(2.5);
        let enemy =
            UnitObservation::new(6, Position::new(9.0, 0.0), 30.0, Weapon::new(5.0, 1.0, 1.0), 3.0);
        let state = SearchState::from_observations(&[obs], &[enemy], &catalog, 0.0).unwrap();
        assert_eq!(state.side(Allegiance::Friendly).len(), 1);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut c = Combatant::new(UnitId::new(0), Allegiance::Hostile, Position::default(), 20.0)
            .with_shield(10.0);
        c.take_damage(15.0);
        assert_eq!(c.shield, 0.0);
        assert_eq!(c.health, 15.0);
        assert_eq!(c.damage_taken(), 15.0);

        c.take_damage(100.0);
        assert_eq!(c.health, 0.0);
        assert!(c.is_dead());
        assert!(!c.is_ready_at(0.0));
    }

    #[test]
    fn test_unarmed_never_attacks() {
        let c = Combatant::new(UnitId::new(0), Allegiance::Friendly, Position::default(), 10.0);
        assert!(!c.can_attack_at(100.0));
        assert!(c.can_move_at(0.0));
    }
}
