//! Forward simulation of a whole engagement
//!
//! A playout repeatedly asks one [`CombatPolicy`] per side for a Move on the
//! current state, commits both Moves simultaneously and advances the clock,
//! until a side is eliminated or the time limit passes. It is the harness the
//! search engine is exercised with outside of a live game.

use crate::core::Allegiance;
use crate::search::{
    Action, ClosestFirst, Move, SearchConfig, SearchEngine, SearchLogger, SearchState,
    VerbosityLevel,
};
use crate::{Result, SkirmishError};
use serde::{Deserialize, Serialize};

/// Decision maker for one side of a playout
///
/// Implement this trait to plug scripted behaviour or a search engine into a
/// playout. The playout calls [`choose_move`](CombatPolicy::choose_move) once
/// per decision cycle with the shared state.
pub trait CombatPolicy {
    /// Side this policy chooses for
    fn allegiance(&self) -> Allegiance;

    fn name(&self) -> &str;

    /// Choose this side's Move for the current cycle
    ///
    /// The returned Move must carry [`allegiance`](CombatPolicy::allegiance)
    /// as its mover and only give orders to ready combatants of that side.
    fn choose_move(&mut self, state: &SearchState) -> Result<Move>;

    /// Called when the engagement ends (for cleanup/logging)
    fn on_engagement_end(&mut self, _state: &SearchState, _won: bool) {}
}

/// Chooses by running a [`SearchEngine`] from this side's point of view
pub struct SearchPolicy {
    allegiance: Allegiance,
    engine: SearchEngine,
    decisions: u32,
    partial_decisions: u32,
}

impl SearchPolicy {
    pub fn new(allegiance: Allegiance, config: SearchConfig) -> Result<Self> {
        let engine = SearchEngine::new(config)?
            .with_logger(SearchLogger::with_verbosity(VerbosityLevel::Silent));
        Ok(Self::with_engine(allegiance, engine))
    }

    pub fn with_engine(allegiance: Allegiance, engine: SearchEngine) -> Self {
        SearchPolicy {
            allegiance,
            engine,
            decisions: 0,
            partial_decisions: 0,
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Decisions made so far, and how many of them hit the deadline
    pub fn decision_counts(&self) -> (u32, u32) {
        (self.decisions, self.partial_decisions)
    }
}

impl CombatPolicy for SearchPolicy {
    fn allegiance(&self) -> Allegiance {
        self.allegiance
    }

    fn name(&self) -> &str {
        "search"
    }

    fn choose_move(&mut self, state: &SearchState) -> Result<Move> {
        // The engine always decides for the friendly side; a hostile policy
        // searches the flipped position. Arena indices survive the flip.
        let outcome = match self.allegiance {
            Allegiance::Friendly => self.engine.search(state)?,
            Allegiance::Hostile => self.engine.search(&state.flipped())?,
        };
        self.decisions += 1;
        if outcome.partial {
            self.partial_decisions += 1;
        }
        let mut chosen = outcome.best_move;
        chosen.mover = self.allegiance;
        Ok(chosen)
    }
}

/// Scripted: attack the nearest target in range, else advance on the
/// nearest target, else hold
#[derive(Debug, Clone, Copy)]
pub struct AttackClosest {
    allegiance: Allegiance,
}

impl AttackClosest {
    pub fn new(allegiance: Allegiance) -> Self {
        AttackClosest { allegiance }
    }
}

impl CombatPolicy for AttackClosest {
    fn allegiance(&self) -> Allegiance {
        self.allegiance
    }

    fn name(&self) -> &str {
        "attack-closest"
    }

    fn choose_move(&mut self, state: &SearchState) -> Result<Move> {
        let mut chosen = Move::new(self.allegiance);
        for actor in state.living(self.allegiance) {
            let actions = state.unit_actions(actor, &ClosestFirst);
            let Some(first) = actions.first() else {
                continue;
            };
            // Waiting out a cooldown beats walking past a target in range
            let target_in_range = state
                .living(self.allegiance.opponent())
                .any(|t| actor.in_range_of(t));
            let action = match first {
                Action::Move { .. } if target_in_range => Action::Hold {
                    actor: actor.id,
                    issued_at: state.time(),
                },
                other => *other,
            };
            chosen.push(action);
        }
        Ok(chosen)
    }
}

/// Scripted: every ready combatant holds
#[derive(Debug, Clone, Copy)]
pub struct HoldPosition {
    allegiance: Allegiance,
}

impl HoldPosition {
    pub fn new(allegiance: Allegiance) -> Self {
        HoldPosition { allegiance }
    }
}

impl CombatPolicy for HoldPosition {
    fn allegiance(&self) -> Allegiance {
        self.allegiance
    }

    fn name(&self) -> &str {
        "hold"
    }

    fn choose_move(&mut self, state: &SearchState) -> Result<Move> {
        let now = state.time();
        let mut chosen = Move::new(self.allegiance);
        for actor in state.living(self.allegiance).filter(|c| c.is_ready_at(now)) {
            chosen.push(Action::Hold {
                actor: actor.id,
                issued_at: now,
            });
        }
        Ok(chosen)
    }
}

/// Limits of a playout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoutConfig {
    /// Simulated time after which the engagement is called a draw
    pub max_time: f64,

    /// Simulated time between decision cycles
    pub time_step: f64,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        PlayoutConfig {
            max_time: 60.0,
            time_step: 1.0,
        }
    }
}

/// Reason the engagement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayoutEndReason {
    /// At least one side has no living combatant
    Elimination,
    /// The time limit passed with both sides standing
    TimeLimit,
}

/// Result of playing an engagement to completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoutResult {
    /// Winner of the engagement (None if both sides fell or time ran out)
    pub winner: Option<Allegiance>,
    pub end_reason: PlayoutEndReason,
    pub cycles: u32,
    pub end_time: f64,
    /// Remaining health plus shield of the friendly side
    pub friendly_health: f64,
    /// Remaining health plus shield of the hostile side
    pub hostile_health: f64,
}

/// Drives an engagement forward cycle by cycle
pub struct Playout {
    state: SearchState,
    config: PlayoutConfig,
    cycles: u32,
    logger: SearchLogger,
}

impl Playout {
    pub fn new(state: SearchState) -> Self {
        Self::with_config(state, PlayoutConfig::default())
    }

    pub fn with_config(state: SearchState, config: PlayoutConfig) -> Self {
        Playout {
            state: state.with_time_step(config.time_step),
            config,
            cycles: 0,
            logger: SearchLogger::with_verbosity(VerbosityLevel::Silent),
        }
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.logger.set_verbosity(verbosity);
        self
    }

    pub fn logger_mut(&mut self) -> &mut SearchLogger {
        &mut self.logger
    }

    pub fn logger(&self) -> &SearchLogger {
        &self.logger
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    fn check_policies(friendly: &dyn CombatPolicy, hostile: &dyn CombatPolicy) -> Result<()> {
        if friendly.allegiance() != Allegiance::Friendly
            || hostile.allegiance() != Allegiance::Hostile
        {
            return Err(SkirmishError::InvalidConfig(format!(
                "policies must be (friendly, hostile), got ({}, {})",
                friendly.allegiance(),
                hostile.allegiance()
            )));
        }
        Ok(())
    }

    /// Play one decision cycle
    pub fn step(
        &mut self,
        friendly: &mut dyn CombatPolicy,
        hostile: &mut dyn CombatPolicy,
    ) -> Result<()> {
        Self::check_policies(friendly, hostile)?;
        let friendly_move = friendly.choose_move(&self.state)?;
        let hostile_move = hostile.choose_move(&self.state)?;

        self.logger.verbose(&format!(
            "t={:.2} {} {} | {} {}",
            self.state.time(),
            friendly.name(),
            friendly_move,
            hostile.name(),
            hostile_move
        ));

        self.state = self.state.commit(Some(&hostile_move), &friendly_move)?;
        self.cycles += 1;
        Ok(())
    }

    /// Play until elimination or the time limit
    pub fn run(
        &mut self,
        friendly: &mut dyn CombatPolicy,
        hostile: &mut dyn CombatPolicy,
    ) -> Result<PlayoutResult> {
        Self::check_policies(friendly, hostile)?;
        let end_time = self.state.time() + self.config.max_time;

        while !self.state.is_terminal() && self.state.time() < end_time {
            self.step(friendly, hostile)?;
        }

        let result = self.result();
        friendly.on_engagement_end(&self.state, result.winner == Some(Allegiance::Friendly));
        hostile.on_engagement_end(&self.state, result.winner == Some(Allegiance::Hostile));

        self.logger.minimal(&format!(
            "engagement over after {} cycles at t={:.2}: {} (friendly {:.1} hp, hostile {:.1} hp)",
            result.cycles,
            result.end_time,
            match result.winner {
                Some(side) => format!("{side} wins"),
                None => "draw".to_string(),
            },
            result.friendly_health,
            result.hostile_health
        ));
        Ok(result)
    }

    /// Result as of the current state
    pub fn result(&self) -> PlayoutResult {
        let health = |allegiance| {
            self.state
                .living(allegiance)
                .map(|c| c.effective_health())
                .sum::<f64>()
        };
        let friendly_alive = self.state.side(Allegiance::Friendly).has_living(self.state.arena());
        let hostile_alive = self.state.side(Allegiance::Hostile).has_living(self.state.arena());

        let (winner, end_reason) = match (friendly_alive, hostile_alive) {
            (true, false) => (Some(Allegiance::Friendly), PlayoutEndReason::Elimination),
            (false, true) => (Some(Allegiance::Hostile), PlayoutEndReason::Elimination),
            (false, false) => (None, PlayoutEndReason::Elimination),
            (true, true) => (None, PlayoutEndReason::TimeLimit),
        };

        PlayoutResult {
            winner,
            end_reason,
            cycles: self.cycles,
            end_time: self.state.time(),
            friendly_health: health(Allegiance::Friendly),
            hostile_health: health(Allegiance::Hostile),
        }
    }
}
