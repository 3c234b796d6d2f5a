// Coefficient metric - bigram (Dice) overlap per word
//
// "Cathkin Braes" → CA AT TH HK KI IN | BR RA AE ES
// Score = 2 × shared bigrams / total bigrams

use super::SimilarityMetric;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientMetric;

impl SimilarityMetric for CoefficientMetric {
    fn score(&self, s1: &str, s2: &str) -> f64 {
        let pairs1 = word_bigrams(s1);
        let mut pairs2 = word_bigrams(s2);

        let total = pairs1.len() + pairs2.len();
        if total == 0 {
            return 0.0;
        }

        // Each bigram of s2 may be matched once ("GG" must not match "GGGG" three times)
        let mut intersection = 0;
        for pair in &pairs1 {
            if let Some(pos) = pairs2.iter().position(|p| p == pair) {
                pairs2.swap_remove(pos);
                intersection += 1;
            }
        }

        (2 * intersection) as f64 / total as f64
    }

    fn name(&self) -> &'static str {
        "coefficient"
    }
}

/// Overlapping character pairs of every whitespace-separated word
///
/// Words shorter than two characters contribute nothing.
pub fn word_bigrams(s: &str) -> Vec<(char, char)> {
    s.to_lowercase()
        .split_whitespace()
        .flat_map(|word| {
            let chars: Vec<char> = word.chars().collect();
            chars.windows(2).map(|w| (w[0], w[1])).collect::<Vec<_>>()
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
