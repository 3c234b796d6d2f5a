// 🎯 Matcher - Identity resolution for imported names
// Decides whether a candidate name refers to an entity we already know.
//
// Cascade (ordered, first stage to accept wins):
// 1. Coefficient  - reserved words removed,            score > coefficient_limit
// 2. Substring    - reserved words and spaces removed,  score > percentage_limit
// 3. EditDistance - original names,                    distance <= edit_distance_limit
//
// Pool policy: entities are tried in pool order and the FIRST accepted entity
// wins, even if a better one sits further down ("Ardrossan Extension" resolves
// to "Ardrossan" when that comes first). resolve() never touches the pool; it
// reports the consumed index and the caller removes it.

use crate::config::{check_score_limit, MatchingConfig};
use crate::error::ConfigError;
use crate::normalizer::Normalizer;
use crate::similarity::{
    CoefficientMetric, DistanceMetric, EditDistanceMetric, SimilarityMetric, SubstringMetric,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Returned by `match_and_remove` when no entity matched
pub const NO_MATCH: i64 = -1;

// ============================================================================
// KNOWN ENTITY
// ============================================================================

/// Anything the matcher can compare against: a stable id and a display name
pub trait KnownEntity {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

impl KnownEntity for (i64, String) {
    fn id(&self) -> i64 {
        self.0
    }

    fn name(&self) -> &str {
        &self.1
    }
}

impl<T: KnownEntity + ?Sized> KnownEntity for &T {
    fn id(&self) -> i64 {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ============================================================================
// STAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStage {
    Coefficient,
    Substring,
    EditDistance,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Coefficient => "coefficient",
            MatchStage::Substring => "substring",
            MatchStage::EditDistance => "edit_distance",
        }
    }
}

/// How both names are prepared before a stage compares them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    ReservedWordsRemoved,
    /// Reserved words removed, then all spaces removed
    Compacted,
    Original,
}

/// Metric plus the rule that turns its output into accept/reject
pub enum Criterion {
    ScoreAbove {
        metric: Box<dyn SimilarityMetric>,
        limit: f64,
    },
    DistanceAtMost {
        metric: Box<dyn DistanceMetric>,
        limit: usize,
    },
}

pub struct Stage {
    kind: MatchStage,
    preparation: Preparation,
    criterion: Criterion,
}

impl Stage {
    pub fn new(kind: MatchStage, preparation: Preparation, criterion: Criterion) -> Self {
        Stage {
            kind,
            preparation,
            criterion,
        }
    }

    pub fn kind(&self) -> MatchStage {
        self.kind
    }

    pub fn preparation(&self) -> Preparation {
        self.preparation
    }

    /// Run this stage alone on two raw names
    pub fn accepts(&self, normalizer: &Normalizer, candidate: &str, known: &str) -> bool {
        let left = prepare(normalizer, self.preparation, candidate);
        let right = prepare(normalizer, self.preparation, known);

        match &self.criterion {
            Criterion::ScoreAbove { metric, limit } => {
                let score = metric.score(&left, &right);
                debug!(stage = self.kind.as_str(), metric = metric.name(), %left, %right, score, limit);
                score > *limit
            }
            Criterion::DistanceAtMost { metric, limit } => {
                let distance = metric.distance(&left, &right, *limit);
                debug!(stage = self.kind.as_str(), metric = metric.name(), %left, %right, ?distance, limit);
                distance.is_some_and(|d| d <= *limit)
            }
        }
    }
}

fn prepare(normalizer: &Normalizer, preparation: Preparation, name: &str) -> String {
    match preparation {
        Preparation::ReservedWordsRemoved => normalizer.remove_reserved_words(name),
        Preparation::Compacted => {
            normalizer.remove_special_characters(&normalizer.remove_reserved_words(name))
        }
        Preparation::Original => name.to_string(),
    }
}

// ============================================================================
// MATCH DECISION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchDecision {
    /// Pool entry `consumed_index` (id `entity_id`) matched at `stage`
    Matched {
        entity_id: i64,
        consumed_index: usize,
        stage: MatchStage,
    },
    NoMatch,
}

impl MatchDecision {
    /// Matched id, or NO_MATCH (-1)
    pub fn entity_id(&self) -> i64 {
        match self {
            MatchDecision::Matched { entity_id, .. } => *entity_id,
            MatchDecision::NoMatch => NO_MATCH,
        }
    }

    pub fn consumed_index(&self) -> Option<usize> {
        match self {
            MatchDecision::Matched { consumed_index, .. } => Some(*consumed_index),
            MatchDecision::NoMatch => None,
        }
    }

    pub fn stage(&self) -> Option<MatchStage> {
        match self {
            MatchDecision::Matched { stage, .. } => Some(*stage),
            MatchDecision::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchDecision::Matched { .. })
    }

    /// Remove the consumed entry from the pool this decision was made against
    pub fn consume<E>(&self, pool: &mut Vec<E>) -> Option<E> {
        match self.consumed_index() {
            Some(index) if index < pool.len() => Some(pool.remove(index)),
            _ => None,
        }
    }
}

// ============================================================================
// MATCHER
// ============================================================================

pub struct Matcher {
    normalizer: Normalizer,
    stages: Vec<Stage>,
}

impl Matcher {
    /// Build the standard three-stage cascade from config
    pub fn from_config(config: &MatchingConfig) -> Result<Self, ConfigError> {
        MatcherBuilder::new()
            .normalizer(Normalizer::new(&config.reserved_words))
            .coefficient_metric(Box::new(CoefficientMetric))
            .substring_metric(Box::new(SubstringMetric))
            .edit_distance_metric(Box::new(EditDistanceMetric))
            .coefficient_limit(config.coefficient_limit)
            .percentage_limit(config.percentage_limit)
            .edit_distance_limit(config.edit_distance_limit)
            .build()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// First stage that accepts the pair, if any
    pub fn match_strings(&self, candidate: &str, known: &str) -> Option<MatchStage> {
        self.stages
            .iter()
            .find(|stage| stage.accepts(&self.normalizer, candidate, known))
            .map(Stage::kind)
    }

    /// Find the first pool entry matching `candidate`. Does not modify the pool.
    pub fn resolve<E: KnownEntity>(&self, candidate: &str, pool: &[E]) -> MatchDecision {
        for (index, entity) in pool.iter().enumerate() {
            if let Some(stage) = self.match_strings(candidate, entity.name()) {
                debug!(
                    candidate,
                    matched = entity.name(),
                    entity_id = entity.id(),
                    stage = stage.as_str(),
                    "candidate resolved"
                );
                return MatchDecision::Matched {
                    entity_id: entity.id(),
                    consumed_index: index,
                    stage,
                };
            }
        }

        debug!(candidate, pool_size = pool.len(), "no match in pool");
        MatchDecision::NoMatch
    }

    /// Resolve and remove the matched entity from the pool.
    ///
    /// Returns the entity id, or NO_MATCH (-1) leaving the pool untouched.
    pub fn match_and_remove<E: KnownEntity>(&self, candidate: &str, pool: &mut Vec<E>) -> i64 {
        let decision = self.resolve(candidate, pool);
        decision.consume(pool);
        decision.entity_id()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Assembles a Matcher; every collaborator must be supplied
#[derive(Default)]
pub struct MatcherBuilder {
    normalizer: Option<Normalizer>,
    coefficient_metric: Option<Box<dyn SimilarityMetric>>,
    substring_metric: Option<Box<dyn SimilarityMetric>>,
    edit_distance_metric: Option<Box<dyn DistanceMetric>>,
    coefficient_limit: Option<f64>,
    percentage_limit: Option<f64>,
    edit_distance_limit: Option<usize>,
}

impl MatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn coefficient_metric(mut self, metric: Box<dyn SimilarityMetric>) -> Self {
        self.coefficient_metric = Some(metric);
        self
    }

    pub fn substring_metric(mut self, metric: Box<dyn SimilarityMetric>) -> Self {
        self.substring_metric = Some(metric);
        self
    }

    pub fn edit_distance_metric(mut self, metric: Box<dyn DistanceMetric>) -> Self {
        self.edit_distance_metric = Some(metric);
        self
    }

    pub fn coefficient_limit(mut self, limit: f64) -> Self {
        self.coefficient_limit = Some(limit);
        self
    }

    pub fn percentage_limit(mut self, limit: f64) -> Self {
        self.percentage_limit = Some(limit);
        self
    }

    pub fn edit_distance_limit(mut self, limit: usize) -> Self {
        self.edit_distance_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Matcher, ConfigError> {
        let normalizer = self
            .normalizer
            .ok_or(ConfigError::MissingCollaborator("normalizer"))?;
        let coefficient_metric = self
            .coefficient_metric
            .ok_or(ConfigError::MissingCollaborator("coefficient metric"))?;
        let substring_metric = self
            .substring_metric
            .ok_or(ConfigError::MissingCollaborator("substring metric"))?;
        let edit_distance_metric = self
            .edit_distance_metric
            .ok_or(ConfigError::MissingCollaborator("edit distance metric"))?;
        let coefficient_limit = self
            .coefficient_limit
            .ok_or(ConfigError::MissingCollaborator("coefficient limit"))?;
        let percentage_limit = self
            .percentage_limit
            .ok_or(ConfigError::MissingCollaborator("percentage limit"))?;
        let edit_distance_limit = self
            .edit_distance_limit
            .ok_or(ConfigError::MissingCollaborator("edit distance limit"))?;

        check_score_limit("coefficient_limit", coefficient_limit)?;
        check_score_limit("percentage_limit", percentage_limit)?;

        let stages = vec![
            Stage::new(
                MatchStage::Coefficient,
                Preparation::ReservedWordsRemoved,
                Criterion::ScoreAbove {
                    metric: coefficient_metric,
                    limit: coefficient_limit,
                },
            ),
            Stage::new(
                MatchStage::Substring,
                Preparation::Compacted,
                Criterion::ScoreAbove {
                    metric: substring_metric,
                    limit: percentage_limit,
                },
            ),
            Stage::new(
                MatchStage::EditDistance,
                Preparation::Original,
                Criterion::DistanceAtMost {
                    metric: edit_distance_metric,
                    limit: edit_distance_limit,
                },
            ),
        ];

        Ok(Matcher { normalizer, stages })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> Matcher {
        Matcher::from_config(&MatchingConfig::default()).unwrap()
    }

    fn pool(entries: &[(i64, &str)]) -> Vec<(i64, String)> {
        entries.iter().map(|(id, name)| (*id, name.to_string())).collect()
    }

    #[test]
    fn test_misspelling_matches_via_edit_distance() {
        let matcher = matcher();
        let mut pool = pool(&[(4, "Cathkin Braes")]);

        assert_eq!(matcher.match_strings("Cathekin Brase", "Cathkin Braes"), Some(MatchStage::EditDistance));
        assert_eq!(matcher.match_and_remove("Cathekin Brase", &mut pool), 4);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_multiple_matching_first_entry_wins() {
        // Known limitation: "Extension" is stripped, so entity 1 wins over the exact name
        let matcher = matcher();
        let mut pool = pool(&[(1, "Ardrossan"), (2, "Ardrossan Extension")]);

        let id = matcher.match_and_remove("Ardrossan Extension", &mut pool);

        assert_eq!(id, 1);
        assert_eq!(pool, vec![(2, "Ardrossan Extension".to_string())]);
    }

    #[test]
    fn test_first_wins_follows_pool_order() {
        let matcher = matcher();
        let mut pool = pool(&[(7, "Whitelee Wind Farm"), (3, "Whitelee")]);

        let decision = matcher.resolve("Whitelee", &pool);
        assert_eq!(
            decision,
            MatchDecision::Matched {
                entity_id: 7,
                consumed_index: 0,
                stage: MatchStage::Coefficient,
            }
        );

        assert_eq!(matcher.match_and_remove("Whitelee", &mut pool), 7);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].0, 3);
    }

    #[test]
    fn test_earlier_entity_wins_at_a_later_stage() {
        // Entity 2 is an exact coefficient match, but entity 1 is tried first
        let matcher = matcher();
        let pool = pool(&[(1, "Cathkin Braes"), (2, "Cathekin Brase")]);

        assert_eq!(
            matcher.resolve("Cathekin Brase", &pool),
            MatchDecision::Matched {
                entity_id: 1,
                consumed_index: 0,
                stage: MatchStage::EditDistance,
            }
        );
    }

    #[test]
    fn test_substring_stage() {
        let matcher = matcher();

        assert_eq!(
            matcher.match_strings("Hadyard Hill", "Hadyard Hill, Barr"),
            Some(MatchStage::Substring)
        );
    }

    #[test]
    fn test_coefficient_stage_ignores_reserved_words() {
        let matcher = matcher();

        assert_eq!(
            matcher.match_strings("Black Law Wind Farm", "BLACK LAW"),
            Some(MatchStage::Coefficient)
        );
    }

    #[test]
    fn test_no_match_leaves_pool_unchanged() {
        let matcher = matcher();
        let mut pool = pool(&[(1, "Achany Estate"), (2, "Whitelee")]);
        let before = pool.clone();

        assert_eq!(matcher.resolve("Aikengall", &pool), MatchDecision::NoMatch);
        assert_eq!(matcher.match_and_remove("Aikengall", &mut pool), NO_MATCH);
        assert_eq!(pool, before);
    }

    #[test]
    fn test_matched_entity_cannot_match_twice() {
        let matcher = matcher();
        let mut pool = pool(&[(4, "Cathkin Braes")]);

        assert_eq!(matcher.match_and_remove("Cathkin Braes", &mut pool), 4);
        assert_eq!(matcher.match_and_remove("Cathkin Braes", &mut pool), NO_MATCH);
    }

    #[test]
    fn test_empty_pool() {
        let matcher = matcher();
        let mut pool: Vec<(i64, String)> = Vec::new();

        assert_eq!(matcher.match_and_remove("Whitelee", &mut pool), NO_MATCH);
    }

    #[test]
    fn test_resolve_is_pure() {
        let matcher = matcher();
        let pool = pool(&[(4, "Cathkin Braes")]);

        let decision = matcher.resolve("Cathkin Braes", &pool);

        assert_eq!(decision.entity_id(), 4);
        assert_eq!(decision.consumed_index(), Some(0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_resolve_over_references() {
        let matcher = matcher();
        let owned = pool(&[(1, "Crystal Rig"), (2, "Clyde")]);
        let borrowed: Vec<&(i64, String)> = owned.iter().collect();

        assert_eq!(matcher.resolve("Clyde Wind Farm", &borrowed).entity_id(), 2);
    }

    #[test]
    fn test_reserved_only_names_fall_through_to_edit_distance() {
        // Both strip to "", so only the raw edit distance can decide
        let matcher = matcher();

        assert_eq!(matcher.match_strings("Wind Farm", "Wind Farms"), Some(MatchStage::EditDistance));
        assert_eq!(matcher.match_strings("Wind Farm", "Community Wind Farm"), None);
    }

    #[test]
    fn test_stages_in_order() {
        let matcher = matcher();
        let kinds: Vec<MatchStage> = matcher.stages().iter().map(Stage::kind).collect();

        assert_eq!(kinds, vec![MatchStage::Coefficient, MatchStage::Substring, MatchStage::EditDistance]);
        assert_eq!(matcher.stages()[1].preparation(), Preparation::Compacted);
    }

    #[test]
    fn test_builder_rejects_missing_collaborator() {
        let result = MatcherBuilder::new()
            .normalizer(Normalizer::default())
            .coefficient_metric(Box::new(CoefficientMetric))
            .edit_distance_metric(Box::new(EditDistanceMetric))
            .coefficient_limit(0.9)
            .percentage_limit(0.9)
            .edit_distance_limit(2)
            .build();

        assert!(matches!(result, Err(ConfigError::MissingCollaborator("substring metric"))));
    }

    #[test]
    fn test_builder_rejects_missing_threshold() {
        let result = MatcherBuilder::new()
            .normalizer(Normalizer::default())
            .coefficient_metric(Box::new(CoefficientMetric))
            .substring_metric(Box::new(SubstringMetric))
            .edit_distance_metric(Box::new(EditDistanceMetric))
            .coefficient_limit(0.9)
            .percentage_limit(0.9)
            .build();

        assert!(matches!(result, Err(ConfigError::MissingCollaborator("edit distance limit"))));
    }

    #[test]
    fn test_builder_rejects_invalid_limit() {
        let config = MatchingConfig {
            coefficient_limit: f64::NAN,
            ..MatchingConfig::default()
        };

        assert!(matches!(
            Matcher::from_config(&config),
            Err(ConfigError::InvalidThreshold { name: "coefficient_limit", .. })
        ));
    }

    struct AlwaysSame;

    impl SimilarityMetric for AlwaysSame {
        fn score(&self, _s1: &str, _s2: &str) -> f64 {
            1.0
        }

        fn name(&self) -> &'static str {
            "always_same"
        }
    }

    #[test]
    fn test_metrics_are_swappable() {
        let matcher = MatcherBuilder::new()
            .normalizer(Normalizer::default())
            .coefficient_metric(Box::new(AlwaysSame))
            .substring_metric(Box::new(SubstringMetric))
            .edit_distance_metric(Box::new(EditDistanceMetric))
            .coefficient_limit(0.9)
            .percentage_limit(0.9)
            .edit_distance_limit(2)
            .build()
            .unwrap();

        assert_eq!(matcher.match_strings("Achany", "Aikengall"), Some(MatchStage::Coefficient));
    }

    #[test]
    fn test_decision_consume_out_of_range_is_noop() {
        let decision = MatchDecision::Matched {
            entity_id: 9,
            consumed_index: 5,
            stage: MatchStage::Coefficient,
        };
        let mut pool = pool(&[(1, "Whitelee")]);

        assert_eq!(decision.consume(&mut pool), None);
        assert_eq!(pool.len(), 1);
    }
}
