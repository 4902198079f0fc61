//! Search configuration

use crate::search::{TargetOrder, TieBreakFlags, ValueFunction, DEFAULT_TIME_STEP};
use crate::{Result, SkirmishError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable parameters of one [`SearchEngine`](crate::search::SearchEngine)
///
/// Every field has a default, so a scenario file only needs to name the
/// fields it changes. Values are checked by [`SearchConfig::validate`] when
/// the engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of plies to search (at least 1)
    pub max_depth: i32,

    /// Wall-clock budget per search call in milliseconds
    pub time_budget_ms: i64,

    /// Target-ordering chain; empty means roster order
    pub target_order: Vec<TargetOrder>,

    /// Legacy tie-break flags; when present they replace `target_order`
    pub tie_break: Option<TieBreakFlags>,

    pub value_function: ValueFunction,

    /// Simulated time advanced per committed ply
    pub time_step: f64,

    /// Cap on candidate Moves generated per node
    pub max_moves_per_node: usize,

    /// Search depths 1..=max_depth in turn instead of max_depth once
    pub iterative_deepening: bool,

    /// Fan root Moves out over the rayon thread pool
    pub parallel_root: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 6,
            time_budget_ms: 100,
            target_order: Vec::new(),
            tie_break: None,
            value_function: ValueFunction::default(),
            time_step: DEFAULT_TIME_STEP,
            max_moves_per_node: 256,
            iterative_deepening: true,
            parallel_root: false,
        }
    }
}

impl SearchConfig {
    pub fn with_depth(mut self, max_depth: i32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_time_budget_ms(mut self, time_budget_ms: i64) -> Self {
        self.time_budget_ms = time_budget_ms;
        self
    }

    pub fn with_value_function(mut self, value_function: ValueFunction) -> Self {
        self.value_function = value_function;
        self
    }

    pub fn with_target_order(mut self, target_order: Vec<TargetOrder>) -> Self {
        self.target_order = target_order;
        self.tie_break = None;
        self
    }

    pub fn with_iterative_deepening(mut self, enabled: bool) -> Self {
        self.iterative_deepening = enabled;
        self
    }

    pub fn with_parallel_root(mut self, enabled: bool) -> Self {
        self.parallel_root = enabled;
        self
    }

    /// Reject configurations no search can run with
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 {
            return Err(SkirmishError::InvalidConfig(format!(
                "max_depth must be at least 1, got {}",
                self.max_depth
            )));
        }
        if self.time_budget_ms <= 0 {
            return Err(SkirmishError::InvalidConfig(format!(
                "time_budget_ms must be positive, got {}",
                self.time_budget_ms
            )));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SkirmishError::InvalidConfig(format!(
                "time_step must be a positive number, got {}",
                self.time_step
            )));
        }
        if self.max_moves_per_node == 0 {
            return Err(SkirmishError::InvalidConfig(
                "max_moves_per_node must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective target-ordering chain
    pub fn resolved_target_order(&self) -> Vec<TargetOrder> {
        match self.tie_break {
            Some(flags) => flags.to_orders(),
            None => self.target_order.clone(),
        }
    }

    pub fn depth_limit(&self) -> u32 {
        self.max_depth.max(1) as u32
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms.max(0) as u64)
    }
}
