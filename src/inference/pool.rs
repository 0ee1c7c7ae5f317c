//! # Candidate Pool Selection
//!
//! Builds the ordered list of model candidates tried for a single request.
//!
//! ## Policies:
//! - **priority**: the configured order, untouched (highest-capability first)
//! - **shuffle**: a uniform random permutation, spreading quota usage across
//!   backend models when called at high volume
//!
//! A pool is built fresh for every request and dropped when it completes,
//! so no ordering carries over between calls.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the configured candidates are ordered for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    Priority,
    #[default]
    Shuffle,
}

impl PoolMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolMode::Priority => "priority",
            PoolMode::Shuffle => "shuffle",
        }
    }
}

impl std::str::FromStr for PoolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "priority" => Ok(PoolMode::Priority),
            "shuffle" => Ok(PoolMode::Shuffle),
            other => Err(format!("Unknown pool mode: {}", other)),
        }
    }
}

/// Ordered model candidates for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    candidates: Vec<String>,
}

impl CandidatePool {
    /// Select a pool using the thread-local RNG.
    pub fn select(candidates: &[String], mode: PoolMode) -> Self {
        Self::select_with_rng(candidates, mode, &mut rand::thread_rng())
    }

    /// Select a pool with an explicit RNG (seeded in tests).
    pub fn select_with_rng<R: Rng + ?Sized>(
        candidates: &[String],
        mode: PoolMode,
        rng: &mut R,
    ) -> Self {
        let mut candidates = candidates.to_vec();
        if mode == PoolMode::Shuffle {
            fisher_yates(&mut candidates, rng);
        }
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.candidates
    }
}

impl From<Vec<String>> for CandidatePool {
    fn from(candidates: Vec<String>) -> Self {
        Self { candidates }
    }
}

impl fmt::Display for CandidatePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidates.join(", "))
    }
}

/// In-place Fisher–Yates: walk from the last index down to 1 and swap each
/// slot with a uniformly chosen index in `[0, i]`.
fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn models() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn test_priority_keeps_configured_order() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pool = CandidatePool::select_with_rng(&models(), PoolMode::Priority, &mut rng);
            assert_eq!(pool.as_slice(), models().as_slice());
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let pool = CandidatePool::select(&models(), PoolMode::Shuffle);
        let mut sorted = pool.as_slice().to_vec();
        sorted.sort();
        assert_eq!(sorted, models());
    }

    #[test]
    fn test_shuffle_covers_all_permutations_evenly() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 60_000;
        let mut counts: HashMap<Vec<String>, usize> = HashMap::new();

        for _ in 0..trials {
            let pool = CandidatePool::select_with_rng(&models(), PoolMode::Shuffle, &mut rng);
            *counts.entry(pool.as_slice().to_vec()).or_default() += 1;
        }

        // 3! orderings, each expected ~10_000 times
        assert_eq!(counts.len(), 6);
        let expected = trials as f64 / 6.0;
        for count in counts.values() {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "permutation frequency skewed: {}", count);
        }
    }

    #[test]
    fn test_single_and_empty_pools() {
        let single = CandidatePool::select(&["only".to_string()], PoolMode::Shuffle);
        assert_eq!(single.len(), 1);

        let empty = CandidatePool::select(&[], PoolMode::Shuffle);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_pool_mode_parsing() {
        assert_eq!("Priority".parse::<PoolMode>(), Ok(PoolMode::Priority));
        assert_eq!("shuffle".parse::<PoolMode>(), Ok(PoolMode::Shuffle));
        assert!("random".parse::<PoolMode>().is_err());
    }
}
