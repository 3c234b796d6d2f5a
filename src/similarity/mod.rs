// 📏 Similarity Metrics - Swappable string comparison
// Three independent algorithms behind two small traits:
// - Coefficient (bigram overlap) and Substring (longest common substring) score in [0.0, 1.0]
// - Edit distance (bounded Damerau–Levenshtein) counts edits up to a threshold
//
// Every metric folds case internally; callers never pre-fold.

pub mod coefficient;
pub mod edit_distance;
pub mod substring;

pub use coefficient::CoefficientMetric;
pub use edit_distance::EditDistanceMetric;
pub use substring::SubstringMetric;

/// Score-based metric: higher means more similar
pub trait SimilarityMetric: Send + Sync {
    fn score(&self, s1: &str, s2: &str) -> f64;

    /// Algorithm name for logging
    fn name(&self) -> &'static str;
}

/// Distance-based metric with a hard upper bound
pub trait DistanceMetric: Send + Sync {
    /// Exact distance when it is <= `threshold`, `None` when it would exceed it
    fn distance(&self, s1: &str, s2: &str, threshold: usize) -> Option<usize>;

    fn name(&self) -> &'static str;
}

/// Lowercase and split into chars (all metrics compare per character)
pub(crate) fn folded_chars(s: &str) -> Vec<char> {
    s.to_lowercase().chars().collect()
}

// ============================================================================
// TESTS
// ============================================================================
