//! Root-parallel search
//!
//! Root Moves are fanned out over the rayon thread pool. Workers share one
//! alpha bound so that subtrees searched later can prune against the best
//! root score found so far.

use crate::core::Allegiance;
use crate::search::engine::{SearchContext, SearchStats, SearchValue, Searcher};
use crate::search::SearchState;
use crate::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free running maximum of an `f64`
///
/// Floats are stored under a bit mapping that preserves their order as
/// unsigned integers, so `fetch_max` on the raw bits is a float maximum.
pub struct SharedBound(AtomicU64);

impl SharedBound {
    pub fn new(value: f64) -> Self {
        SharedBound(AtomicU64::new(Self::encode(value)))
    }

    fn encode(value: f64) -> u64 {
        let bits = value.to_bits();
        if bits >> 63 == 1 {
            !bits
        } else {
            bits | (1 << 63)
        }
    }

    fn decode(raw: u64) -> f64 {
        if raw >> 63 == 1 {
            f64::from_bits(raw & !(1 << 63))
        } else {
            f64::from_bits(!raw)
        }
    }

    pub fn load(&self) -> f64 {
        Self::decode(self.0.load(Ordering::Acquire))
    }

    /// Raise the bound to `value` if it is larger
    pub fn raise(&self, value: f64) {
        self.0.fetch_max(Self::encode(value), Ordering::AcqRel);
    }
}

struct RootResult {
    index: usize,
    value: SearchValue,
    /// Alpha the subtree was searched with
    alpha: f64,
    stats: SearchStats,
}

/// One iteration of the root search, spread over worker threads
///
/// A root result is exact only if it strictly beats the alpha it was searched
/// with; otherwise it is an upper bound and cannot be chosen over an exact
/// one. Among exact results the earliest generated Move wins ties, though
/// which results end up exact depends on thread timing.
pub(crate) fn search_root(
    ctx: SearchContext<'_>,
    root: &SearchState,
    depth: u32,
) -> Result<(SearchValue, SearchStats)> {
    let mut stats = SearchStats {
        nodes_searched: 1,
        ..SearchStats::default()
    };
    if root.is_terminal() {
        let mut searcher = Searcher::new(ctx);
        let value = searcher.alpha_beta(
            root.clone(),
            0,
            None,
            None,
            f64::NEG_INFINITY,
            f64::INFINITY,
        )?;
        return Ok((value, searcher.into_stats()));
    }

    let simultaneous = root.can_act(Allegiance::Hostile);
    let candidates = root.generate_moves(Allegiance::Friendly, ctx.ordering, ctx.max_moves);
    let shared_alpha = SharedBound::new(f64::NEG_INFINITY);

    let results: Vec<RootResult> = candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| -> Result<RootResult> {
            let alpha = shared_alpha.load();
            let mut searcher = Searcher::new(ctx);
            let value = searcher.expand(
                root,
                candidate,
                depth,
                None,
                simultaneous,
                alpha,
                f64::INFINITY,
            )?;
            if value.score > alpha {
                shared_alpha.raise(value.score);
            }
            Ok(RootResult {
                index,
                value,
                alpha,
                stats: searcher.into_stats(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut best: Option<&RootResult> = None;
    for result in &results {
        stats.absorb(&result.stats);
        stats.root_scores.push(result.value.score);

        let exact = result.value.score > result.alpha;
        let better = match best {
            None => true,
            Some(incumbent) => result.value.score > incumbent.value.score,
        };
        if exact && better {
            best = Some(result);
        }
    }

    let value = match best.or(results.first()) {
        Some(result) => SearchValue {
            score: result.value.score,
            best_move: candidates.get(result.index).cloned(),
            state: result.value.state.clone(),
        },
        None => SearchValue {
            score: f64::NEG_INFINITY,
            best_move: None,
            state: None,
        },
    };
    Ok((value, stats))
}
