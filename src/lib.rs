// Wind Farm Aggregator - Core Library
// Identity resolution for imported wind-farm names, plus the store and import
// pipeline built around it. Used by the CLI and by tests.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod import;
pub mod matcher;
pub mod normalizer;
pub mod similarity;
pub mod sources;

// Re-export commonly used types
pub use config::{MatchingConfig, DEFAULT_RESERVED_WORDS};
pub use db::{
    Event,
    open_database, setup_database, insert_wind_farm, update_wind_farm, rename_wind_farm,
    delete_wind_farm, get_wind_farm, get_all_wind_farms, count_wind_farms,
    record_source_link, latest_fingerprint, insert_event, get_events_for_entity,
};
pub use entities::{WindFarm, WindFarmPayload, WindFarmStatus};
pub use error::ConfigError;
pub use import::{ImportOutcome, ImportPipeline, ImportReport};
pub use matcher::{
    Criterion, KnownEntity, MatchDecision, MatchStage, Matcher, MatcherBuilder, Preparation,
    Stage, NO_MATCH,
};
pub use normalizer::Normalizer;
pub use similarity::{
    CoefficientMetric, DistanceMetric, EditDistanceMetric, SimilarityMetric, SubstringMetric,
};
pub use sources::{
    ImportRecord, ImportSource, SourceType,
    CsvListingSource, JsonListingSource,
    detect_source, get_source,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
