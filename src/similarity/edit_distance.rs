// Edit-distance metric - bounded Damerau–Levenshtein (optimal string alignment)
//
// Insertions, deletions, substitutions and adjacent transpositions cost 1.
// Three rolling rows keep memory at O(min(m, n)); the computation stops as soon
// as a whole row is already over the threshold.
//
// Example:
// - "Cathekin Brase" → "Cathkin Braes" = 2 (delete "e", swap "se")

use super::{folded_chars, DistanceMetric};

#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceMetric;

impl EditDistanceMetric {
    /// Full distance with no threshold
    pub fn distance_unbounded(&self, s1: &str, s2: &str) -> usize {
        bounded_distance(&folded_chars(s1), &folded_chars(s2), usize::MAX).unwrap_or(usize::MAX)
    }
}

impl DistanceMetric for EditDistanceMetric {
    fn distance(&self, s1: &str, s2: &str, threshold: usize) -> Option<usize> {
        bounded_distance(&folded_chars(s1), &folded_chars(s2), threshold)
    }

    fn name(&self) -> &'static str {
        "edit_distance"
    }
}

fn bounded_distance(a: &[char], b: &[char], threshold: usize) -> Option<usize> {
    // Shorter string runs along the row so the rows stay small
    let (source, target) = if a.len() > b.len() { (b, a) } else { (a, b) };
    let n = source.len();
    let m = target.len();

    if m - n > threshold {
        return None;
    }
    if n == 0 {
        return Some(m);
    }

    let mut two_back = vec![0usize; n + 1];
    let mut previous: Vec<usize> = (0..=n).collect();
    let mut current = vec![0usize; n + 1];

    for i in 1..=m {
        current[0] = i;
        let mut row_min = i;

        for j in 1..=n {
            let cost = usize::from(target[i - 1] != source[j - 1]);

            let mut value = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);

            if i > 1
                && j > 1
                && target[i - 1] == source[j - 2]
                && target[i - 2] == source[j - 1]
            {
                value = value.min(two_back[j - 2] + 1);
            }

            current[j] = value;
            row_min = row_min.min(value);
        }

        // Row minimums never decrease, so nothing below can come back under
        if row_min > threshold {
            return None;
        }

        // two_back ← previous ← current; the stale row is reused as scratch
        std::mem::swap(&mut two_back, &mut previous);
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[n];
    (distance <= threshold).then_some(distance)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrelated_names() {
        assert_eq!(EditDistanceMetric.distance_unbounded("Achany Estate", "Aikengall"), 10);
        assert_eq!(EditDistanceMetric.distance("Achany Estate", "Aikengall", 10), Some(10));
    }

    #[test]
    fn test_transposition_costs_one() {
        assert_eq!(EditDistanceMetric.distance("braes", "brase", 5), Some(1));
        assert_eq!(EditDistanceMetric.distance("ab", "ba", 1), Some(1));
    }

    #[test]
    fn test_misspelled_name() {
        assert_eq!(EditDistanceMetric.distance("Cathekin Brase", "Cathkin Braes", 2), Some(2));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(EditDistanceMetric.distance("WHITELEE", "whitelee", 0), Some(0));
    }

    #[test]
    fn test_exceeds_threshold() {
        assert_eq!(EditDistanceMetric.distance("Achany Estate", "Aikengall", 9), None);
        assert_eq!(EditDistanceMetric.distance("Cathekin Brase", "Cathkin Braes", 1), None);
    }

    #[test]
    fn test_length_gap_short_circuits() {
        // 10 characters apart, threshold 2
        assert_eq!(EditDistanceMetric.distance("Ardrossan", "Ardrossan Extension", 2), None);
        assert_eq!(EditDistanceMetric.distance_unbounded("Ardrossan", "Ardrossan Extension"), 10);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(EditDistanceMetric.distance("", "", 0), Some(0));
        assert_eq!(EditDistanceMetric.distance("", "abc", 3), Some(3));
        assert_eq!(EditDistanceMetric.distance("abc", "", 2), None);
    }

    #[test]
    fn test_swap_is_transparent() {
        let m = EditDistanceMetric;
        assert_eq!(m.distance("Kilgallioch", "Kilgalioch", 2), m.distance("Kilgalioch", "Kilgallioch", 2));
        assert_eq!(m.distance("Kilgallioch", "Kilgalioch", 2), Some(1));
    }
}
