//! Tournament mode for running many playouts in parallel and collecting statistics
//!
//! Each game is a seeded random scenario played out by one policy per side.
//! Games are executed concurrently using rayon.

use crate::core::Allegiance;
use crate::playout::{
    AttackClosest, CombatPolicy, HoldPosition, Playout, PlayoutConfig, PlayoutResult,
    SearchPolicy,
};
use crate::scenario::random_scenario;
use crate::search::SearchConfig;
use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Policy type for tournament games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    Search,
    AttackClosest,
    Hold,
}

impl PolicyKind {
    pub fn build(
        self,
        allegiance: Allegiance,
        search: &SearchConfig,
    ) -> Result<Box<dyn CombatPolicy>> {
        Ok(match self {
            PolicyKind::Search => Box::new(SearchPolicy::new(allegiance, search.clone())?),
            PolicyKind::AttackClosest => Box::new(AttackClosest::new(allegiance)),
            PolicyKind::Hold => Box::new(HoldPosition::new(allegiance)),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub games: usize,
    /// Game `i` plays the random scenario seeded with `seed + i`
    pub seed: u64,
    pub units_per_side: usize,
    pub friendly: PolicyKind,
    pub hostile: PolicyKind,
    pub search: SearchConfig,
    pub playout: PlayoutConfig,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            games: 100,
            seed: 42,
            units_per_side: 2,
            friendly: PolicyKind::Search,
            hostile: PolicyKind::AttackClosest,
            search: SearchConfig::default().with_depth(3).with_time_budget_ms(20),
            playout: PlayoutConfig::default(),
        }
    }
}

/// Statistics collected during a tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub games: usize,
    pub friendly_wins: usize,
    pub hostile_wins: usize,
    pub draws: usize,
    pub total_cycles: u64,
    pub elapsed: Duration,
}

impl TournamentSummary {
    fn record(&mut self, result: &PlayoutResult) {
        self.games += 1;
        self.total_cycles += result.cycles as u64;
        match result.winner {
            Some(Allegiance::Friendly) => self.friendly_wins += 1,
            Some(Allegiance::Hostile) => self.hostile_wins += 1,
            None => self.draws += 1,
        }
    }

    pub fn friendly_win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.friendly_wins as f64 / self.games as f64
        }
    }
}

/// Play one seeded game
pub fn play_game(config: &TournamentConfig, seed: u64) -> Result<PlayoutResult> {
    let scenario = random_scenario(seed, config.units_per_side);
    let mut friendly = config.friendly.build(Allegiance::Friendly, &config.search)?;
    let mut hostile = config.hostile.build(Allegiance::Hostile, &config.search)?;

    let mut playout = Playout::with_config(scenario.root_state()?, config.playout);
    playout.run(friendly.as_mut(), hostile.as_mut())
}

/// Run all games in parallel and aggregate the results
pub fn run_tournament(config: &TournamentConfig) -> Result<TournamentSummary> {
    let start = Instant::now();

    let results = (0..config.games)
        .into_par_iter()
        .map(|game_idx| play_game(config, config.seed.wrapping_add(game_idx as u64)))
        .collect::<Result<Vec<_>>>()?;

    let mut summary = TournamentSummary::default();
    for result in &results {
        summary.record(result);
    }
    summary.elapsed = start.elapsed();
    Ok(summary)
}
