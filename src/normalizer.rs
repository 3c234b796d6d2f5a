// 🧹 Normalizer - Text cleanup before comparison
// Strips reserved (stop) words and whitespace. Pure, total, no side effects.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    /// Lowercased reserved words
    reserved_words: BTreeSet<String>,
}

impl Normalizer {
    /// Create a normalizer with the given stop-word vocabulary
    pub fn new<I, S>(reserved_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Normalizer {
            reserved_words: reserved_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Drop every reserved token, keep the rest in order
    ///
    /// Example: "Ardrossan Wind Farm Extension" → "Ardrossan"
    pub fn remove_reserved_words(&self, input: &str) -> String {
        input
            .split(' ')
            .filter(|token| !token.is_empty())
            .filter(|token| !self.is_reserved(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Remove all spaces: "Hadyard Hill" → "HadyardHill"
    pub fn remove_special_characters(&self, input: &str) -> String {
        input.split(' ').filter(|token| !token.is_empty()).collect()
    }

    pub fn is_reserved(&self, token: &str) -> bool {
        self.reserved_words.contains(&token.to_lowercase())
    }

    pub fn reserved_words(&self) -> impl Iterator<Item = &str> {
        self.reserved_words.iter().map(String::as_str)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RESERVED_WORDS;
    use proptest::prelude::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(DEFAULT_RESERVED_WORDS)
    }

    #[test]
    fn test_remove_reserved_words() {
        let n = normalizer();

        assert_eq!(n.remove_reserved_words("Ardrossan Extension"), "Ardrossan");
        assert_eq!(n.remove_reserved_words("Whitelee Wind Farm"), "Whitelee");
        assert_eq!(n.remove_reserved_words("Clyde Wind Farm Phase 2"), "Clyde 2");
    }

    #[test]
    fn test_remove_reserved_words_case_insensitive() {
        let n = normalizer();

        assert_eq!(n.remove_reserved_words("BLACK LAW WIND FARM"), "BLACK LAW");
        assert_eq!(n.remove_reserved_words("black law wind farm"), "black law");
    }

    #[test]
    fn test_remove_reserved_words_pass_through() {
        let n = normalizer();
        assert_eq!(n.remove_reserved_words("Cathkin Braes"), "Cathkin Braes");
    }

    #[test]
    fn test_remove_reserved_words_empty() {
        let n = normalizer();

        assert_eq!(n.remove_reserved_words(""), "");
        assert_eq!(n.remove_reserved_words("   "), "");
        assert_eq!(n.remove_reserved_words("Wind Farm"), "");
    }

    #[test]
    fn test_remove_reserved_words_collapses_spaces() {
        let n = normalizer();
        assert_eq!(n.remove_reserved_words("Hadyard  Hill  Wind"), "Hadyard Hill");
    }

    #[test]
    fn test_remove_special_characters() {
        let n = normalizer();

        assert_eq!(n.remove_special_characters("Hadyard Hill"), "HadyardHill");
        assert_eq!(n.remove_special_characters("  a  b c "), "abc");
        assert_eq!(n.remove_special_characters(""), "");
    }

    #[test]
    fn test_custom_vocabulary() {
        let n = Normalizer::new(["Moor"]);

        assert!(n.is_reserved("moor"));
        assert_eq!(n.remove_reserved_words("Crystal Rig Moor Wind"), "Crystal Rig Wind");
        assert_eq!(n.reserved_words().collect::<Vec<_>>(), vec!["moor"]);
    }

    proptest! {
        #[test]
        fn test_remove_reserved_words_idempotent(s in "[a-zA-Z ]{0,40}") {
            let n = normalizer();
            let once = n.remove_reserved_words(&s);
            prop_assert_eq!(n.remove_reserved_words(&once), once.clone());
        }

        #[test]
        fn test_remove_special_characters_has_no_spaces(s in "[a-zA-Z ]{0,40}") {
            let n = normalizer();
            prop_assert!(!n.remove_special_characters(&s).contains(' '));
        }
    }
}
