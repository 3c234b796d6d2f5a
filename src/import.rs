// 🔄 Import Pipeline - Drain one source into the canonical store
//
// 1. Snapshot existing wind farms (name-ordered) as the match pool
// 2. For each record: resolve against the pool, then remove the matched entry
//    so no other record in this run can claim the same wind farm
// 3. Matched → merge payload (skip if the source sent the same record before)
//    No match → create a new wind farm
// All writes happen in one SQLite transaction.

use crate::db::{
    get_all_wind_farms, insert_wind_farm, latest_fingerprint, record_source_link,
    update_wind_farm,
};
use crate::entities::WindFarm;
use crate::matcher::{MatchStage, Matcher};
use crate::sources::ImportRecord;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Created {
        name: String,
        entity_id: i64,
    },
    Updated {
        name: String,
        entity_id: i64,
        matched_name: String,
        stage: MatchStage,
    },
    Unchanged {
        name: String,
        entity_id: i64,
        stage: MatchStage,
    },
    Skipped {
        line_number: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub source: String,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,

    /// Matches per cascade stage ("coefficient" → 12, ...)
    pub matches_by_stage: BTreeMap<String, usize>,

    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    fn new(source: &str) -> Self {
        ImportReport {
            source: source.to_string(),
            ..ImportReport::default()
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }

    fn record(&mut self, outcome: ImportOutcome) {
        match &outcome {
            ImportOutcome::Created { .. } => self.created += 1,
            ImportOutcome::Updated { stage, .. } => {
                self.updated += 1;
                *self.matches_by_stage.entry(stage.as_str().to_string()).or_insert(0) += 1;
            }
            ImportOutcome::Unchanged { stage, .. } => {
                self.unchanged += 1;
                *self.matches_by_stage.entry(stage.as_str().to_string()).or_insert(0) += 1;
            }
            ImportOutcome::Skipped { .. } => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct ImportPipeline<'a> {
    matcher: &'a Matcher,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(matcher: &'a Matcher) -> Self {
        ImportPipeline { matcher }
    }

    /// Import records from one source (labelled `source`) into the store
    pub fn run(&self, conn: &mut Connection, source: &str, records: &[ImportRecord]) -> Result<ImportReport> {
        let tx = conn.transaction().context("Failed to start import transaction")?;

        let mut pool = get_all_wind_farms(&tx)?;
        let mut report = ImportReport::new(source);

        info!(source, records = records.len(), pool = pool.len(), "import started");

        for record in records {
            let name = record.name.trim();
            if name.is_empty() {
                warn!(source, line = record.line_number, "skipping record without a name");
                report.record(ImportOutcome::Skipped {
                    line_number: record.line_number,
                    reason: "empty name".to_string(),
                });
                continue;
            }

            let decision = self.matcher.resolve(name, &pool);
            let outcome = match (decision.stage(), decision.consume(&mut pool)) {
                (Some(stage), Some(mut farm)) => {
                    self.merge(&tx, source, record, &mut farm, stage)?
                }
                _ => self.create(&tx, source, record)?,
            };

            report.record(outcome);
        }

        tx.commit().context("Failed to commit import")?;

        info!(
            source,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "import finished"
        );

        Ok(report)
    }

    fn merge(
        &self,
        conn: &Connection,
        source: &str,
        record: &ImportRecord,
        farm: &mut WindFarm,
        stage: MatchStage,
    ) -> Result<ImportOutcome> {
        let fingerprint = record.fingerprint()?;

        if latest_fingerprint(conn, farm.id, source)?.as_deref() == Some(fingerprint.as_str()) {
            return Ok(ImportOutcome::Unchanged {
                name: record.name.clone(),
                entity_id: farm.id,
                stage,
            });
        }

        farm.apply_payload(&record.payload, source);
        update_wind_farm(conn, farm)?;
        record_source_link(conn, farm.id, source, &record.name, &fingerprint)?;

        info!(
            candidate = %record.name,
            matched = %farm.name,
            entity_id = farm.id,
            stage = stage.as_str(),
            "wind farm updated"
        );

        Ok(ImportOutcome::Updated {
            name: record.name.clone(),
            entity_id: farm.id,
            matched_name: farm.name.clone(),
            stage,
        })
    }

    fn create(&self, conn: &Connection, source: &str, record: &ImportRecord) -> Result<ImportOutcome> {
        let name = record.name.trim();
        let farm = WindFarm::from_payload(name, &record.payload, source);

        let entity_id = insert_wind_farm(conn, &farm)?;
        record_source_link(conn, entity_id, source, &record.name, &record.fingerprint()?)?;

        info!(name, entity_id, "wind farm created");

        Ok(ImportOutcome::Created {
            name: name.to_string(),
            entity_id,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
