// Substring metric - longest common substring ratio
//
// "Hadyard Hill" vs "Hadyard Hill, Barr" → "hadyard hill" (12) / min(12, 18) = 1.0

use super::{folded_chars, SimilarityMetric};

#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMetric;

impl SimilarityMetric for SubstringMetric {
    fn score(&self, s1: &str, s2: &str) -> f64 {
        let a = folded_chars(s1);
        let b = folded_chars(s2);

        let shortest = a.len().min(b.len());
        if shortest == 0 {
            return 0.0;
        }

        let (_, length) = longest_common_run(&a, &b);
        length as f64 / shortest as f64
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// First longest common substring (case-folded)
pub fn longest_common_substring(s1: &str, s2: &str) -> String {
    let a = folded_chars(s1);
    let b = folded_chars(s2);

    let (end, length) = longest_common_run(&a, &b);
    a[end - length..end].iter().collect()
}

/// Returns (end index in `a`, length) of the first maximal common run.
///
/// Row-major scan over the running-length table; a later run only wins when
/// strictly longer.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize) {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            current[j] = if a[i - 1] == b[j - 1] {
                previous[j - 1] + 1
            } else {
                0
            };

            if current[j] > best_len {
                best_len = current[j];
                best_end = i;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_end, best_len)
}

// ============================================================================
// TESTS
// ============================================================================
