//! Fuzzy (near-duplicate) grouping via pairwise similarity.
//!
//! Among units that did not fall into any exact group, every pair of
//! normalized keys is scored with a normalized Levenshtein ratio in [0, 1].
//! A pair whose ratio × 100 meets the configured threshold is a match edge;
//! single-linkage clustering over those edges (the transitive closure of
//! "connected by at least one qualifying edge") forms the similar groups.
//!
//! Single-linkage can chain dissimilar units together through intermediate
//! near-matches. That chaining is a documented characteristic of the
//! design, not a bug; it is preserved rather than tightened.
//!
//! The all-pairs comparison is combinatorial, so it is bounded two ways:
//! a hard ceiling on candidate count and a wall-clock deadline. Exceeding
//! either skips the granularity's fuzzy stage with a recorded reason,
//! rather than hanging. Pair scoring runs on rayon; edges are collected
//! first and clustered deterministically afterwards, so parallelism never
//! changes the observable output.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::RunConfig;

use super::segment::TextUnit;
use super::EngineError;

/// Why a granularity's fuzzy stage was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzySkip {
    /// Candidate count exceeded the configured ceiling.
    Ceiling {
        /// Number of comparison candidates
        candidates: usize,
        /// Configured ceiling
        ceiling: usize,
    },
    /// The wall-clock budget ran out mid-comparison.
    Deadline {
        /// Configured budget in seconds
        budget_secs: u64,
    },
}

impl std::fmt::Display for FuzzySkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuzzySkip::Ceiling { candidates, ceiling } => {
                write!(f, "{candidates} candidates exceed ceiling of {ceiling}")
            }
            FuzzySkip::Deadline { budget_secs } => {
                write!(f, "exceeded {budget_secs}s time budget")
            }
        }
    }
}

/// A similar-unit cluster.
#[derive(Debug, Clone)]
pub struct FuzzyGroup {
    /// Indices into the granularity's unit slice, in unit order
    pub units: Vec<usize>,
    /// Best edge score incident to each unit, parallel to `units`
    pub scores: Vec<u8>,
    /// Lexicographically earliest normalized key among members
    pub representative: String,
}

/// Statistics from the fuzzy stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyStats {
    /// Comparison candidates after exclusions
    pub candidates: usize,
    /// Pair comparisons performed
    pub comparisons: usize,
    /// Qualifying edges found
    pub edges: usize,
    /// Clusters with 2+ members
    pub groups: usize,
}

/// Outcome of the fuzzy stage for one granularity.
#[derive(Debug)]
pub struct FuzzyOutcome {
    /// Similar groups ordered by first occurrence
    pub groups: Vec<FuzzyGroup>,
    /// Set when the stage was skipped; `groups` is empty in that case
    pub skipped: Option<FuzzySkip>,
    /// Stage counters
    pub stats: FuzzyStats,
}

impl FuzzyOutcome {
    fn skipped(candidates: usize, skip: FuzzySkip) -> Self {
        Self {
            groups: Vec::new(),
            skipped: Some(skip),
            stats: FuzzyStats {
                candidates,
                ..Default::default()
            },
        }
    }
}

/// Group non-identical units whose similarity meets the threshold.
///
/// # Arguments
///
/// * `units` - All units of one granularity, in document order
/// * `exact_matched` - Coverage mask from the exact stage; covered units are
///   excluded so nothing is double-reported
/// * `config` - Threshold and resource bounds
/// * `shutdown` - Optional flag for graceful interruption
///
/// # Errors
///
/// Returns [`EngineError::Interrupted`] if the shutdown flag was raised
/// during comparison.
pub fn group_fuzzy(
    units: &[TextUnit],
    exact_matched: &[bool],
    config: &RunConfig,
    shutdown: Option<&Arc<AtomicBool>>,
) -> Result<FuzzyOutcome, EngineError> {
    debug_assert_eq!(units.len(), exact_matched.len());

    // Exact-covered units are out (no double-reporting); very short keys
    // score spuriously high ratios and are out as well
    let candidates: Vec<usize> = (0..units.len())
        .filter(|&i| !exact_matched[i] && units[i].key.chars().count() >= config.fuzzy_min_chars)
        .collect();

    if candidates.len() < 2 {
        return Ok(FuzzyOutcome {
            groups: Vec::new(),
            skipped: None,
            stats: FuzzyStats {
                candidates: candidates.len(),
                ..Default::default()
            },
        });
    }

    if candidates.len() > config.max_fuzzy_units {
        return Ok(FuzzyOutcome::skipped(
            candidates.len(),
            FuzzySkip::Ceiling {
                candidates: candidates.len(),
                ceiling: config.max_fuzzy_units,
            },
        ));
    }

    let threshold = config.fuzz_threshold;
    let deadline = Instant::now() + config.fuzzy_timeout;
    let timed_out = AtomicBool::new(false);
    let interrupted = AtomicBool::new(false);
    let comparisons = AtomicUsize::new(0);

    // All-pairs scoring, one row per candidate. Edges are gathered and
    // clustered after the parallel section so the output does not depend
    // on scheduling.
    let edges: Vec<(usize, usize, u8)> = candidates
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, &unit_i)| {
            if timed_out.load(Ordering::Relaxed) || interrupted.load(Ordering::Relaxed) {
                return Vec::new().into_iter();
            }
            if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
                interrupted.store(true, Ordering::Relaxed);
                return Vec::new().into_iter();
            }
            if Instant::now() > deadline {
                timed_out.store(true, Ordering::Relaxed);
                return Vec::new().into_iter();
            }

            let key_i = units[unit_i].key.as_str();
            let mut row = Vec::new();
            for (j, &unit_j) in candidates.iter().enumerate().skip(i + 1) {
                let ratio = strsim::normalized_levenshtein(key_i, units[unit_j].key.as_str());
                let score = (ratio * 100.0).floor() as u8;
                if score >= threshold {
                    row.push((i, j, score));
                }
            }
            comparisons.fetch_add(candidates.len() - i - 1, Ordering::Relaxed);
            row.into_iter()
        })
        .collect();

    if interrupted.load(Ordering::Relaxed) {
        return Err(EngineError::Interrupted);
    }

    if timed_out.load(Ordering::Relaxed) {
        log::warn!(
            "Fuzzy stage for {} deadline exceeded after {} comparisons",
            units[candidates[0]].granularity,
            comparisons.load(Ordering::Relaxed)
        );
        return Ok(FuzzyOutcome::skipped(
            candidates.len(),
            FuzzySkip::Deadline {
                budget_secs: config.fuzzy_timeout.as_secs(),
            },
        ));
    }

    // Single-linkage: connected components over the qualifying edges
    let mut dsu = DisjointSet::new(candidates.len());
    let mut best_score = vec![0u8; candidates.len()];
    for &(i, j, score) in &edges {
        dsu.union(i, j);
        best_score[i] = best_score[i].max(score);
        best_score[j] = best_score[j].max(score);
    }

    let mut components: std::collections::HashMap<usize, Vec<usize>> =
        std::collections::HashMap::new();
    for i in 0..candidates.len() {
        components.entry(dsu.find(i)).or_default().push(i);
    }

    let mut groups: Vec<FuzzyGroup> = components
        .into_values()
        .filter(|members| members.len() >= 2)
        .map(|members| {
            // Members are ascending already; candidates was built in order
            let representative = members
                .iter()
                .map(|&m| units[candidates[m]].key.as_str())
                .min()
                .unwrap_or_default()
                .to_string();
            FuzzyGroup {
                units: members.iter().map(|&m| candidates[m]).collect(),
                scores: members.iter().map(|&m| best_score[m]).collect(),
                representative,
            }
        })
        .collect();

    groups.sort_by_key(|g| g.units[0]);

    let stats = FuzzyStats {
        candidates: candidates.len(),
        comparisons: comparisons.load(Ordering::Relaxed),
        edges: edges.len(),
        groups: groups.len(),
    };

    Ok(FuzzyOutcome {
        groups,
        skipped: None,
        stats,
    })
}

/// Disjoint-set union with path compression.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller root wins, keeping component ids deterministic
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
