//! Bounded alpha-beta search over simultaneous moves
//!
//! The engine searches one decision for the friendly side. Both sides choose
//! during the same simulated instant, which a sequential game tree can only
//! approximate: when both sides can act, the first mover's candidate is held
//! as *pending* while the other side picks its response at the same time,
//! and only then are both Moves committed together into a child one time
//! step later. The responder therefore sees the first mover's choice, so the
//! returned score is the value of that approximation, not of the true
//! simultaneous game.

use crate::core::Allegiance;
use crate::search::{
    parallel, Evaluator, Move, SearchConfig, SearchLogger, SearchState, TargetOrder,
    TargetOrdering, UnitOrder, VerbosityLevel,
};
use crate::{Result, SkirmishError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A score with the Move that produced it and the principal leaf state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchValue {
    pub score: f64,
    pub best_move: Option<Move>,
    pub state: Option<SearchState>,
}

impl SearchValue {
    fn unset(score: f64) -> Self {
        SearchValue {
            score,
            best_move: None,
            state: None,
        }
    }
}

/// Counters collected during one search call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes entered, over all iterations
    pub nodes_searched: u64,

    /// Nodes scored by the evaluator, over all iterations
    pub leaves_evaluated: u64,

    /// Deepest iteration that finished before the deadline
    pub depth_completed: u32,

    pub timed_out: bool,

    pub elapsed: Duration,

    /// Score of every root Move in generation order, from the iteration the
    /// result was taken from (cut-off siblings report their bound)
    pub root_scores: Vec<f64>,
}

impl SearchStats {
    pub(crate) fn absorb(&mut self, other: &SearchStats) {
        self.nodes_searched += other.nodes_searched;
        self.leaves_evaluated += other.leaves_evaluated;
        self.timed_out |= other.timed_out;
    }
}

/// Result of one [`SearchEngine::search`] call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Recommended Move for the friendly side
    pub best_move: Move,

    /// Score of `best_move`, signed from the friendly perspective
    pub score: f64,

    /// Set when the deadline cut the search short
    pub partial: bool,

    pub stats: SearchStats,

    /// Leaf state at the end of the principal variation
    pub principal_state: Option<SearchState>,

    orders: Vec<UnitOrder>,
}

impl SearchOutcome {
    /// `best_move` as concrete orders addressed by live unit tags
    pub fn orders(&self) -> &[UnitOrder] {
        &self.orders
    }
}

/// Read-only inputs shared by every node of one search call
#[derive(Clone, Copy)]
pub(crate) struct SearchContext<'e> {
    pub evaluator: &'e dyn Evaluator,
    pub ordering: &'e dyn TargetOrdering,
    pub max_moves: usize,
    pub deadline: Instant,
}

/// Recursive alpha-beta driver for one iteration
///
/// A searcher never logs, so independent searchers can run on worker threads.
pub(crate) struct Searcher<'e> {
    ctx: SearchContext<'e>,
    stats: SearchStats,
}

impl<'e> Searcher<'e> {
    pub fn new(ctx: SearchContext<'e>) -> Self {
        Searcher {
            ctx,
            stats: SearchStats::default(),
        }
    }

    pub fn into_stats(self) -> SearchStats {
        self.stats
    }

    /// Score a node without expanding it
    ///
    /// A pending Move still waiting for its response is committed alone, as
    /// if the responding side had held.
    fn leaf(&mut self, state: SearchState, pending: Option<&Move>) -> Result<SearchValue> {
        self.stats.leaves_evaluated += 1;
        let state = match pending {
            Some(m) => state.commit(None, m)?,
            None => state,
        };
        let score = self.ctx.evaluator.evaluate(&state, Allegiance::Friendly);
        Ok(SearchValue {
            score,
            best_move: None,
            state: Some(state),
        })
    }

    /// Search `state` to `depth` plies
    ///
    /// `last_mover` is `None` only at the root. `pending` is the opponent's
    /// uncommitted Move from the same instant, if any.
    pub fn alpha_beta(
        &mut self,
        state: SearchState,
        depth: u32,
        last_mover: Option<Allegiance>,
        pending: Option<&Move>,
        mut alpha: f64,
        mut beta: f64,
    ) -> Result<SearchValue> {
        self.stats.nodes_searched += 1;
        if !self.stats.timed_out && Instant::now() >= self.ctx.deadline {
            self.stats.timed_out = true;
        }
        if self.stats.timed_out || depth == 0 || state.is_terminal() {
            return self.leaf(state, pending);
        }

        let to_move = state.player_to_move(last_mover, pending.is_some());
        let polarity = state.side(to_move).polarity;
        let simultaneous = pending.is_none() && state.can_act(to_move.opponent());
        let candidates = state.generate_moves(to_move, self.ctx.ordering, self.ctx.max_moves);

        let mut best = SearchValue::unset(polarity.worst_score());
        for candidate in candidates {
            let value = self.expand(&state, &candidate, depth, pending, simultaneous, alpha, beta)?;
            if last_mover.is_none() {
                self.stats.root_scores.push(value.score);
            }

            if best.best_move.is_none() || polarity.improves(value.score, best.score) {
                best = SearchValue {
                    score: value.score,
                    best_move: Some(candidate),
                    state: value.state,
                };
            }

            if polarity.is_maximizing() {
                if best.score > alpha {
                    alpha = best.score;
                }
            } else if best.score < beta {
                beta = best.score;
            }

            if self.stats.timed_out || alpha >= beta {
                break;
            }
        }
        Ok(best)
    }

    /// Search the subtree below one candidate Move of the side to move
    #[allow(clippy::too_many_arguments)]
    pub fn expand(
        &mut self,
        state: &SearchState,
        candidate: &Move,
        depth: u32,
        pending: Option<&Move>,
        simultaneous: bool,
        alpha: f64,
        beta: f64,
    ) -> Result<SearchValue> {
        if simultaneous {
            // Same instant: the other side answers before anything commits
            self.alpha_beta(
                state.clone(),
                depth - 1,
                Some(candidate.mover),
                Some(candidate),
                alpha,
                beta,
            )
        } else {
            let child = state.commit(pending, candidate)?;
            self.alpha_beta(child, depth - 1, Some(candidate.mover), None, alpha, beta)
        }
    }
}

/// Entry point consumed by the orchestration layer
///
/// Built once from a [`SearchConfig`] and invoked once per decision cycle.
pub struct SearchEngine {
    config: SearchConfig,
    evaluator: Arc<dyn Evaluator>,
    ordering: Arc<dyn TargetOrdering>,
    logger: SearchLogger,
}

impl SearchEngine {
    /// Validate `config` and build the engine with its built-in policies
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let evaluator = config.value_function.evaluator();
        let ordering = TargetOrder::chain(&config.resolved_target_order());
        Ok(SearchEngine {
            config,
            evaluator,
            ordering,
            logger: SearchLogger::with_verbosity(VerbosityLevel::Minimal),
        })
    }

    /// Replace the value function with a custom one
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replace the target-ordering policy with a custom one
    pub fn with_ordering(mut self, ordering: Arc<dyn TargetOrdering>) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_logger(mut self, logger: SearchLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn ordering(&self) -> &dyn TargetOrdering {
        self.ordering.as_ref()
    }

    pub fn logger(&self) -> &SearchLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut SearchLogger {
        &mut self.logger
    }

    /// Pick the friendly side's Move for `root`
    ///
    /// The root state is not modified. A deadline cutoff is not an error: the
    /// outcome is marked `partial` and still carries an actionable Move.
    pub fn search(&self, root: &SearchState) -> Result<SearchOutcome> {
        let start = Instant::now();
        let ctx = SearchContext {
            evaluator: self.evaluator.as_ref(),
            ordering: self.ordering.as_ref(),
            max_moves: self.config.max_moves_per_node,
            deadline: start + self.config.time_budget(),
        };
        let root = root.clone().with_time_step(self.config.time_step);
        let max_depth = self.config.depth_limit();
        let first_depth = if self.config.iterative_deepening {
            1
        } else {
            max_depth
        };

        self.logger.verbose(&format!(
            "search at t={:.2}: depth {}, budget {}ms, eval {}, order {}, step {}",
            root.time(),
            max_depth,
            self.config.time_budget_ms,
            self.evaluator.name(),
            self.ordering.name(),
            self.config.time_step
        ));

        let mut stats = SearchStats::default();
        let mut completed: Option<(SearchValue, Vec<f64>)> = None;
        let mut interrupted: Option<(SearchValue, Vec<f64>)> = None;

        for depth in first_depth..=max_depth {
            let (value, iteration) = if self.config.parallel_root {
                parallel::search_root(ctx, &root, depth)?
            } else {
                let mut searcher = Searcher::new(ctx);
                let value = searcher.alpha_beta(
                    root.clone(),
                    depth,
                    None,
                    None,
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                )?;
                (value, searcher.into_stats())
            };
            stats.absorb(&iteration);

            if iteration.timed_out {
                interrupted = Some((value, iteration.root_scores));
                break;
            }

            stats.depth_completed = depth;
            #[cfg(feature = "verbose-logging")]
            self.log_iteration(&root, depth, &value, &iteration);
            completed = Some((value, iteration.root_scores));

            if root.is_terminal() {
                break;
            }
        }
        stats.elapsed = start.elapsed();

        let (value, root_scores) = match (completed, interrupted) {
            (Some(done), _) => done,
            (None, Some(cut)) => cut,
            (None, None) => {
                return Err(SkirmishError::InvariantViolation(
                    "search finished without running an iteration".to_string(),
                ))
            }
        };
        stats.root_scores = root_scores;

        let best_move = match value.best_move {
            Some(m) => m,
            // Cut off before any root Move was scored, or nothing to search
            None => root
                .generate_moves(Allegiance::Friendly, self.ordering.as_ref(), 1)
                .into_iter()
                .next()
                .unwrap_or_else(|| Move::empty(Allegiance::Friendly)),
        };
        let orders = best_move.orders(root.arena())?;

        if stats.timed_out {
            self.logger.categorized(
                VerbosityLevel::Normal,
                "deadline",
                &format!(
                    "deadline hit after {:.1}ms; using depth {} result",
                    stats.elapsed.as_secs_f64() * 1000.0,
                    stats.depth_completed
                ),
            );
        }
        self.logger.categorized(
            VerbosityLevel::Normal,
            "search_choice",
            &format!(
                "chose {} (score {:.2}, depth {}, {} nodes)",
                best_move, value.score, stats.depth_completed, stats.nodes_searched
            ),
        );

        Ok(SearchOutcome {
            best_move,
            score: value.score,
            partial: stats.timed_out,
            stats,
            principal_state: value.state,
            orders,
        })
    }

    #[cfg(feature = "verbose-logging")]
    fn log_iteration(
        &self,
        root: &SearchState,
        depth: u32,
        value: &SearchValue,
        stats: &SearchStats,
    ) {
        if self.logger.verbosity() < VerbosityLevel::Verbose && !self.logger.is_capturing() {
            return;
        }
        let best = value
            .best_move
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        self.logger.verbose(&format!(
            "depth {depth}: best {best} score {:.2} ({} nodes, {} leaves)",
            value.score, stats.nodes_searched, stats.leaves_evaluated
        ));

        let moves = root.generate_moves(
            Allegiance::Friendly,
            self.ordering.as_ref(),
            self.config.max_moves_per_node,
        );
        for (i, (m, score)) in moves.iter().zip(&stats.root_scores).enumerate() {
            self.logger.verbose(&format!("  root move {i}: {m} -> {score:.2}"));
        }
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("evaluator", &self.evaluator.name())
            .field("ordering", &self.ordering.name())
            .field("logger", &self.logger)
            .finish()
    }
}
