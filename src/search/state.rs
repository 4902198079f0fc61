//! Search node: combatant arena, both sides and the simulated clock
//!
//! A `SearchState` is never shared between branches. Transitions either
//! mutate a node the caller owns ([`SearchState::apply`]) or produce a fresh
//! child ([`SearchState::commit`]).

use crate::core::{
    Allegiance, Combatant, CombatantArena, Polarity, UnitId, UnitObservation, UnitTypeCatalog,
};
use crate::search::{Action, Move, Side, TargetOrdering};
use crate::{Result, SkirmishError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Simulated time advanced by one committing transition unless configured
pub const DEFAULT_TIME_STEP: f64 = 1.0;

/// One node of the search tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    arena: CombatantArena,
    friendly: Side,
    hostile: Side,
    time: f64,
    time_step: f64,
}

impl SearchState {
    /// Create an empty state at simulated time `now`
    pub fn new(now: f64) -> Self {
        SearchState {
            arena: CombatantArena::new(),
            friendly: Side::new(Allegiance::Friendly, Polarity::Max),
            hostile: Side::new(Allegiance::Hostile, Polarity::Min),
            time: now,
            time_step: DEFAULT_TIME_STEP,
        }
    }

    /// Build the root state of a decision cycle from live observations
    pub fn from_observations(
        friendly: &[UnitObservation],
        hostile: &[UnitObservation],
        catalog: &UnitTypeCatalog,
        now: f64,
    ) -> Result<Self> {
        let mut state = SearchState::new(now);
        for (allegiance, observations) in [
            (Allegiance::Friendly, friendly),
            (Allegiance::Hostile, hostile),
        ] {
            for observation in observations {
                let id = state.arena.next_id();
                let combatant =
                    Combatant::from_observation(id, allegiance, observation, catalog, now)?;
                state.add_combatant(combatant);
            }
        }
        Ok(state)
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    /// Add a combatant to the arena and to the roster of its allegiance
    pub fn add_combatant(&mut self, combatant: Combatant) -> UnitId {
        let allegiance = combatant.allegiance;
        let id = self.arena.push(combatant);
        self.side_mut(allegiance).push(id);
        id
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn arena(&self) -> &CombatantArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut CombatantArena {
        &mut self.arena
    }

    pub fn combatant(&self, id: UnitId) -> Result<&Combatant> {
        self.arena.get(id)
    }

    pub fn side(&self, allegiance: Allegiance) -> &Side {
        match allegiance {
            Allegiance::Friendly => &self.friendly,
            Allegiance::Hostile => &self.hostile,
        }
    }

    fn side_mut(&mut self, allegiance: Allegiance) -> &mut Side {
        match allegiance {
            Allegiance::Friendly => &mut self.friendly,
            Allegiance::Hostile => &mut self.hostile,
        }
    }

    /// Living combatants of one side, in roster order
    pub fn living(&self, allegiance: Allegiance) -> impl Iterator<Item = &Combatant> {
        self.side(allegiance).living(&self.arena)
    }

    /// Does `allegiance` have a combatant ready to act now?
    pub fn can_act(&self, allegiance: Allegiance) -> bool {
        self.side(allegiance).can_act(&self.arena, self.time)
    }

    pub fn both_can_act(&self) -> bool {
        self.can_act(Allegiance::Friendly) && self.can_act(Allegiance::Hostile)
    }

    /// A node is terminal once either side has no living combatant
    pub fn is_terminal(&self) -> bool {
        !self.friendly.has_living(&self.arena) || !self.hostile.has_living(&self.arena)
    }

    /// Which side chooses at this node
    ///
    /// The root (`last_mover == None`) always belongs to the friendly side. A
    /// node holding a pending Move is answered by the other side. Otherwise
    /// the side that can act moves; when both or neither can, the side that
    /// did not move last takes the turn (with nobody ready that is a pass).
    pub fn player_to_move(&self, last_mover: Option<Allegiance>, has_pending: bool) -> Allegiance {
        let Some(last) = last_mover else {
            return Allegiance::Friendly;
        };
        if has_pending {
            return last.opponent();
        }
        match (self.can_act(Allegiance::Friendly), self.can_act(Allegiance::Hostile)) {
            (true, false) => Allegiance::Friendly,
            (false, true) => Allegiance::Hostile,
            _ => last.opponent(),
        }
    }

    /// Candidate actions of one ready combatant at the current time
    ///
    /// Attacks on in-range targets come first, then one approach Move per
    /// out-of-range target, then Hold. Targets are enumerated in `ordering`.
    pub fn unit_actions(
        &self,
        actor: &Combatant,
        ordering: &dyn TargetOrdering,
    ) -> SmallVec<[Action; 8]> {
        let now = self.time;
        let mut actions = SmallVec::new();
        if !actor.is_ready_at(now) {
            return actions;
        }

        let mut targets: SmallVec<[&Combatant; 8]> =
            self.living(actor.allegiance.opponent()).collect();
        ordering.sort(actor, &mut targets);

        if actor.can_attack_at(now) {
            for target in targets.iter().filter(|t| actor.in_range_of(t)) {
                actions.push(Action::Attack {
                    actor: actor.id,
                    target: target.id,
                    issued_at: now,
                });
            }
        }

        if actor.can_move_at(now) && actor.speed > 0.0 {
            for target in targets.iter().filter(|t| !actor.in_range_of(t)) {
                let distance = actor.distance_to(target) - actor.range;
                actions.push(Action::Move {
                    actor: actor.id,
                    destination: actor.position.towards(&target.position, distance),
                    distance,
                    issued_at: now,
                    completes_at: now + distance / actor.speed,
                });
            }
        }

        actions.push(Action::Hold {
            actor: actor.id,
            issued_at: now,
        });
        actions
    }

    /// Enumerate the candidate Moves of `mover` in deterministic order
    ///
    /// The result is the Cartesian product of the ready combatants' action
    /// lists in roster order, the first combatant varying slowest. With no
    /// ready combatant it is a single empty Move.
    ///
    /// When the product exceeds `max_moves`, the action lists are shortened
    /// until it fits, dropping the lowest-ranked non-Hold actions first. Hold
    /// is never dropped, so every combatant can still hold and the all-Hold
    /// Move is always a candidate.
    pub fn generate_moves(
        &self,
        mover: Allegiance,
        ordering: &dyn TargetOrdering,
        max_moves: usize,
    ) -> Vec<Move> {
        let mut options: SmallVec<[SmallVec<[Action; 8]>; 8]> = self
            .living(mover)
            .map(|actor| self.unit_actions(actor, ordering))
            .filter(|actions| !actions.is_empty())
            .collect();
        fit_to_budget(&mut options, max_moves);

        let mut moves = Vec::new();
        let mut cursor: SmallVec<[usize; 8]> = SmallVec::from_elem(0, options.len());
        loop {
            let mut candidate = Move::new(mover);
            for (actions, &i) in options.iter().zip(cursor.iter()) {
                candidate.push(actions[i]);
            }
            moves.push(candidate);
            if moves.len() >= max_moves {
                return moves;
            }

            // Odometer step: the last combatant varies fastest
            let mut slot = options.len();
            loop {
                if slot == 0 {
                    return moves;
                }
                slot -= 1;
                cursor[slot] += 1;
                if cursor[slot] < options[slot].len() {
                    break;
                }
                cursor[slot] = 0;
            }
        }
    }

    /// Check that an action is legal against this state
    pub fn validate(&self, action: &Action) -> Result<()> {
        let actor = self.arena.get(action.actor())?;
        if actor.is_dead() {
            return Err(SkirmishError::InvariantViolation(format!(
                "dead combatant {} cannot {}",
                actor.id,
                action.kind()
            )));
        }

        let at = action.issued_at();
        let eligible = match action {
            Action::Attack { .. } => actor.can_attack_at(at),
            Action::Move { .. } => actor.can_move_at(at),
            Action::Hold { .. } => actor.is_ready_at(at),
        };
        if !eligible {
            return Err(SkirmishError::InvariantViolation(format!(
                "combatant {} is not eligible to {} at t={:.3} (attack at {:.3}, move at {:.3})",
                actor.id,
                action.kind(),
                at,
                actor.attack_eligible_at,
                actor.move_eligible_at
            )));
        }

        if let Action::Attack { target, .. } = action {
            let target = self.arena.get(*target)?;
            if target.allegiance == actor.allegiance {
                return Err(SkirmishError::InvariantViolation(format!(
                    "combatant {} attacks its own side ({})",
                    actor.id, target.id
                )));
            }
        }
        Ok(())
    }

    /// Apply an action's effects without checking eligibility
    fn resolve(&mut self, action: &Action) -> Result<()> {
        match *action {
            Action::Attack {
                actor,
                target,
                issued_at,
            } => {
                let (damage, cooldown) = {
                    let attacker = self.arena.get(actor)?;
                    (attacker.damage, attacker.cooldown)
                };
                self.arena.get_mut(target)?.take_damage(damage);
                let attacker = self.arena.get_mut(actor)?;
                attacker.attack_eligible_at = issued_at + cooldown;
                attacker.last_action = Some(action.kind());
            }
            Action::Move {
                actor,
                destination,
                completes_at,
                ..
            } => {
                let mover = self.arena.get_mut(actor)?;
                mover.position = destination;
                mover.move_eligible_at = completes_at;
                mover.last_action = Some(action.kind());
            }
            Action::Hold { actor, .. } => {
                self.arena.get_mut(actor)?.last_action = Some(action.kind());
            }
        }
        Ok(())
    }

    /// Apply one action in place
    ///
    /// Returns [`SkirmishError::InvariantViolation`] if the actor is dead or
    /// not eligible at the action's issue time.
    pub fn apply(&mut self, action: &Action) -> Result<()> {
        self.validate(action)?;
        self.resolve(action)
    }

    /// Apply every action of a Move in place, in order
    pub fn apply_move(&mut self, m: &Move) -> Result<()> {
        for action in m.actions() {
            self.apply(action)?;
        }
        Ok(())
    }

    /// Fresh copy of this node one time step later
    pub fn child(&self) -> SearchState {
        let mut child = self.clone();
        child.time += self.time_step;
        child
    }

    /// Commit a ply: a child with the pending Move applied, then `m`
    ///
    /// Both Moves were generated against this state, so every action is
    /// validated here before any of them takes effect. A combatant killed by
    /// an earlier action of the same commit still resolves its own action.
    pub fn commit(&self, pending: Option<&Move>, m: &Move) -> Result<SearchState> {
        let actions: SmallVec<[&Action; 8]> = pending
            .into_iter()
            .flat_map(|p| p.actions())
            .chain(m.actions())
            .collect();
        for action in &actions {
            self.validate(action)?;
        }

        let mut child = self.child();
        for action in actions {
            child.resolve(action)?;
        }
        Ok(child)
    }

    /// The same position seen from the hostile side
    ///
    /// Allegiances are swapped on every combatant and the rosters trade
    /// places, so the former hostile side becomes the maximizing root side.
    pub fn flipped(&self) -> SearchState {
        let mut arena = self.arena.clone();
        for combatant in arena.iter_mut() {
            combatant.allegiance = combatant.allegiance.opponent();
        }

        let mut friendly = Side::new(Allegiance::Friendly, Polarity::Max);
        for id in self.hostile.roster() {
            friendly.push(*id);
        }
        let mut hostile = Side::new(Allegiance::Hostile, Polarity::Min);
        for id in self.friendly.roster() {
            hostile.push(*id);
        }

        SearchState {
            arena,
            friendly,
            hostile,
            time: self.time,
            time_step: self.time_step,
        }
    }
}

/// Shorten per-combatant action lists until their product fits in `max_moves`
///
/// Each step drops the lowest-ranked non-Hold action of the longest list,
/// preferring later combatants on ties, so earlier combatants keep the most
/// options. Every list ends in Hold and keeps it.
fn fit_to_budget(options: &mut [SmallVec<[Action; 8]>], max_moves: usize) {
    let product = |options: &[SmallVec<[Action; 8]>]| {
        options
            .iter()
            .fold(1usize, |acc, actions| acc.saturating_mul(actions.len()))
    };

    while product(options) > max_moves {
        let longest = options
            .iter()
            .enumerate()
            .filter(|(_, actions)| actions.len() > 1)
            .max_by_key(|(i, actions)| (actions.len(), *i))
            .map(|(i, _)| i);
        let Some(i) = longest else {
            return;
        };
        let last_option = options[i].len() - 2;
        options[i].remove(last_option);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionKind, Position};
    use crate::search::RosterOrder;

    fn fighter(allegiance: Allegiance, x: f64, range: f64) -> Combatant {
        Combatant::new(UnitId::new(0), allegiance, Position::new(x, 0.0), 30.0)
            .with_weapon(10.0, range, 1.0)
            .with_speed(2.0)
    }

    #[test]
    fn test_unit_actions_order() {
        let mut state = SearchState::new(0.0);
        let me = state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        let near = state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));
        let far = state.add_combatant(fighter(Allegiance::Hostile, 9.0, 1.0));

        let actor = *state.combatant(me).unwrap();
        let actions = state.unit_actions(&actor, &RosterOrder);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].target(), Some(near));
        match actions[1] {
            Action::Move {
                destination,
                distance,
                completes_at,
                ..
            } => {
                assert!((distance - 4.0).abs() < 1e-12);
                assert!((destination.x - 4.0).abs() < 1e-12);
                assert!((completes_at - 2.0).abs() < 1e-12);
            }
            other => panic!("expected approach move, got {other:?}"),
        }
        assert_eq!(actions[2].kind(), ActionKind::Hold);
        assert!(actions.iter().all(|a| a.target() != Some(far)));
    }

    #[test]
    fn test_cartesian_product_first_unit_slowest() {
        let mut state = SearchState::new(0.0);
        state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        state.add_combatant(fighter(Allegiance::Friendly, 1.0, 5.0));
        state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));

        // Each friendly unit: attack, hold
        let moves = state.generate_moves(Allegiance::Friendly, &RosterOrder, 256);
        let kinds: Vec<(ActionKind, ActionKind)> = moves
            .iter()
            .map(|m| (m.actions()[0].kind(), m.actions()[1].kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ActionKind::Attack, ActionKind::Attack),
                (ActionKind::Attack, ActionKind::Hold),
                (ActionKind::Hold, ActionKind::Attack),
                (ActionKind::Hold, ActionKind::Hold),
            ]
        );

        // Over the cap the second unit gives up its attack, not its Hold
        let capped = state.generate_moves(Allegiance::Friendly, &RosterOrder, 3);
        let kinds: Vec<(ActionKind, ActionKind)> = capped
            .iter()
            .map(|m| (m.actions()[0].kind(), m.actions()[1].kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ActionKind::Attack, ActionKind::Hold),
                (ActionKind::Hold, ActionKind::Hold),
            ]
        );
    }

    #[test]
    fn test_move_cap_keeps_every_hold() {
        let mut state = SearchState::new(0.0);
        let friendly: Vec<UnitId> = (0..4)
            .map(|_| state.add_combatant(fighter(Allegiance::Friendly, 0.0, 1.0)))
            .collect();
        for y in [-6.0, -2.0, 2.0, 6.0] {
            let mut far = fighter(Allegiance::Hostile, 20.0, 1.0);
            far.position.y = y;
            state.add_combatant(far);
        }

        // Four approach Moves plus Hold per unit: 625 combinations
        let actor = *state.combatant(friendly[0]).unwrap();
        assert_eq!(state.unit_actions(&actor, &RosterOrder).len(), 5);

        let moves = state.generate_moves(Allegiance::Friendly, &RosterOrder, 256);
        assert_eq!(moves.len(), 256);

        for id in &friendly {
            let holds = moves
                .iter()
                .filter(|m| m.action_for(*id).map(Action::kind) == Some(ActionKind::Hold))
                .count();
            assert!(holds > 0, "unit {id} never holds");
        }
        assert!(moves
            .iter()
            .any(|m| m.actions().iter().all(|a| a.kind() == ActionKind::Hold)));

        // Every unit keeps its three best-ranked approaches
        let first_unit: Vec<Action> = moves
            .iter()
            .filter_map(|m| m.action_for(friendly[0]).copied())
            .fold(Vec::new(), |mut seen, a| {
                if !seen.contains(&a) {
                    seen.push(a);
                }
                seen
            });
        assert_eq!(first_unit.len(), 4);
        assert_eq!(first_unit[3].kind(), ActionKind::Hold);
    }

    #[test]
    fn test_no_ready_unit_passes() {
        let mut state = SearchState::new(0.0);
        let mut busy = fighter(Allegiance::Friendly, 0.0, 5.0);
        busy.attack_eligible_at = 1.5;
        busy.move_eligible_at = 1.5;
        state.add_combatant(busy);
        state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));

        let moves = state.generate_moves(Allegiance::Friendly, &RosterOrder, 256);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_empty());
        assert!(!state.can_act(Allegiance::Friendly));
    }

    #[test]
    fn test_never_attacks_dead_target() {
        let mut state = SearchState::new(0.0);
        state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        let dead = state.add_combatant(fighter(Allegiance::Hostile, 1.0, 1.0));
        state.add_combatant(fighter(Allegiance::Hostile, 2.0, 1.0));
        state.arena_mut().get_mut(dead).unwrap().take_damage(100.0);

        for m in state.generate_moves(Allegiance::Friendly, &RosterOrder, 256) {
            assert!(m.actions().iter().all(|a| a.target() != Some(dead)));
        }
    }

    #[test]
    fn test_apply_sets_eligibility() {
        let mut state = SearchState::new(2.0);
        let me = state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        let them = state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));

        let hit = Action::Attack {
            actor: me,
            target: them,
            issued_at: 2.0,
        };
        state.apply(&hit).unwrap();
        assert_eq!(state.combatant(them).unwrap().health, 20.0);
        assert_eq!(state.combatant(me).unwrap().attack_eligible_at, 3.0);
        assert_eq!(state.combatant(me).unwrap().last_action, Some(ActionKind::Attack));

        // Still cooling down
        let err = state.apply(&hit).unwrap_err();
        assert!(matches!(err, SkirmishError::InvariantViolation(_)));
    }

    #[test]
    fn test_dead_actor_is_rejected() {
        let mut state = SearchState::new(0.0);
        let me = state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));
        state.arena_mut().get_mut(me).unwrap().take_damage(100.0);

        let hold = Action::Hold {
            actor: me,
            issued_at: 0.0,
        };
        assert!(matches!(
            state.apply(&hold),
            Err(SkirmishError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_simultaneous_commit_resolves_both() {
        let mut state = SearchState::new(0.0);
        let mut glass = fighter(Allegiance::Friendly, 0.0, 5.0);
        glass.health = 5.0;
        let me = state.add_combatant(glass);
        let them = state.add_combatant(fighter(Allegiance::Hostile, 1.0, 2.0));

        let mut hostile = Move::new(Allegiance::Hostile);
        hostile.push(Action::Attack {
            actor: them,
            target: me,
            issued_at: 0.0,
        });
        let mut friendly = Move::new(Allegiance::Friendly);
        friendly.push(Action::Attack {
            actor: me,
            target: them,
            issued_at: 0.0,
        });

        let child = state.commit(Some(&hostile), &friendly).unwrap();
        assert_eq!(child.time(), 1.0);
        assert!(child.combatant(me).unwrap().is_dead());
        assert_eq!(child.combatant(them).unwrap().health, 20.0);
        assert!(child.is_terminal());

        // Parent untouched
        assert_eq!(state.combatant(them).unwrap().health, 30.0);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn test_player_to_move() {
        let mut state = SearchState::new(0.0);
        state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        let them = state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));

        assert_eq!(state.player_to_move(None, false), Allegiance::Friendly);
        assert_eq!(
            state.player_to_move(Some(Allegiance::Friendly), true),
            Allegiance::Hostile
        );
        assert_eq!(
            state.player_to_move(Some(Allegiance::Hostile), false),
            Allegiance::Friendly
        );

        let busy = state.arena_mut().get_mut(them).unwrap();
        busy.attack_eligible_at = 5.0;
        busy.move_eligible_at = 5.0;
        assert_eq!(
            state.player_to_move(Some(Allegiance::Friendly), false),
            Allegiance::Friendly
        );
    }

    #[test]
    fn test_flipped_swaps_sides() {
        let mut state = SearchState::new(0.0);
        let me = state.add_combatant(fighter(Allegiance::Friendly, 0.0, 5.0));
        let them = state.add_combatant(fighter(Allegiance::Hostile, 3.0, 1.0));

        let flipped = state.flipped();
        assert_eq!(flipped.side(Allegiance::Friendly).roster(), &[them]);
        assert_eq!(flipped.side(Allegiance::Hostile).roster(), &[me]);
        assert_eq!(flipped.combatant(them).unwrap().allegiance, Allegiance::Friendly);
        assert_eq!(flipped.side(Allegiance::Friendly).polarity, Polarity::Max);
        assert_eq!(flipped.flipped(), state);
    }
}
