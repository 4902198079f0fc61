//! Game-tree search over simultaneous, duration-gated combat moves

pub mod action;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod logger;
pub mod moves;
pub mod ordering;
pub mod parallel;
pub mod side;
pub mod state;
pub mod state_hash;


pub use action::{Action, Order, UnitOrder};
pub use config::SearchConfig;
pub use engine::{SearchEngine, SearchOutcome, SearchStats, SearchValue};
pub use evaluator::{DamageDifference, DamageInflicted, Evaluator, LifetimeDamage, ValueFunction};
pub use logger::{LogEntry, OutputMode, SearchLogger, VerbosityLevel};
pub use moves::Move;
pub use ordering::{
    ChainedOrdering, ClosestFirst, HighestPriorityFirst, RosterOrder, TargetOrder, TargetOrdering,
    TieBreakFlags, WeakestFirst,
};
pub use side::Side;
pub use state::{SearchState, DEFAULT_TIME_STEP};
pub use state_hash::compute_state_hash;
