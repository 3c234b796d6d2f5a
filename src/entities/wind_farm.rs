// 🌬️ Wind Farm Entity - Stable identity + mergeable attributes
//
// "Name is a VALUE (can be renamed), id is IDENTITY (never changes or gets reused)"
//
// Each import source only knows part of the picture (capacity from one listing,
// coordinates from another), so a matched record MERGES into the entity rather
// than replacing it.

use crate::matcher::KnownEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// WIND FARM STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindFarmStatus {
    Operational,
    UnderConstruction,
    Consented,
    InPlanning,
    Refused,
    Withdrawn,
    Unknown,
}

impl WindFarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindFarmStatus::Operational => "Operational",
            WindFarmStatus::UnderConstruction => "Under Construction",
            WindFarmStatus::Consented => "Consented",
            WindFarmStatus::InPlanning => "In Planning",
            WindFarmStatus::Refused => "Refused",
            WindFarmStatus::Withdrawn => "Withdrawn",
            WindFarmStatus::Unknown => "Unknown",
        }
    }

    /// Lenient parse of the free-text status sources publish
    ///
    /// Terminal outcomes are checked first: "Application Refused" is Refused,
    /// not InPlanning.
    ///
    /// Examples:
    /// - "Operational", "Generating" → Operational
    /// - "Application Submitted" → InPlanning
    /// - "Consent Refused", "Not Consented" → Refused
    pub fn parse(text: &str) -> Self {
        let lower = text.trim().to_lowercase();

        if lower.contains("refused")
            || lower.contains("rejected")
            || lower.contains("not consented")
        {
            WindFarmStatus::Refused
        } else if lower.contains("withdrawn") {
            WindFarmStatus::Withdrawn
        } else if lower.contains("operational") || lower.contains("generating") {
            WindFarmStatus::Operational
        } else if lower.contains("construction") {
            WindFarmStatus::UnderConstruction
        } else if lower.contains("consent") || lower.contains("approved") {
            WindFarmStatus::Consented
        } else if lower.contains("planning")
            || lower.contains("application")
            || lower.contains("submitted")
        {
            WindFarmStatus::InPlanning
        } else {
            WindFarmStatus::Unknown
        }
    }
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Attributes an import source supplies alongside a name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindFarmPayload {
    pub capacity_mw: Option<f64>,
    pub turbine_count: Option<u32>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Source-specific extras kept as-is in entity metadata
    #[serde(default)]
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// WIND FARM ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindFarm {
    /// Store-assigned identity; 0 until first saved
    pub id: i64,

    pub name: String,
    pub capacity_mw: Option<f64>,
    pub turbine_count: Option<u32>,
    pub status: WindFarmStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Import sources that contributed to this entity
    pub sources: Vec<String>,

    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WindFarm {
    /// Create an unsaved wind farm
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();

        WindFarm {
            id: 0,
            name: name.into(),
            capacity_mw: None,
            turbine_count: None,
            status: WindFarmStatus::Unknown,
            latitude: None,
            longitude: None,
            sources: Vec::new(),
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an unsaved wind farm from an imported name and payload
    pub fn from_payload(name: impl Into<String>, payload: &WindFarmPayload, source: &str) -> Self {
        let mut farm = WindFarm::new(name);
        farm.apply_payload(payload, source);
        farm
    }

    /// Merge payload values into this entity; returns true if anything changed.
    ///
    /// Present payload values win. Name and id are never touched here.
    pub fn apply_payload(&mut self, payload: &WindFarmPayload, source: &str) -> bool {
        let mut changed = false;

        changed |= merge_field(&mut self.capacity_mw, payload.capacity_mw);
        changed |= merge_field(&mut self.turbine_count, payload.turbine_count);
        changed |= merge_field(&mut self.latitude, payload.latitude);
        changed |= merge_field(&mut self.longitude, payload.longitude);

        if let Some(status_text) = payload.status.as_deref() {
            let status = WindFarmStatus::parse(status_text);
            if status != WindFarmStatus::Unknown && status != self.status {
                self.status = status;
                changed = true;
            }
        }

        if !payload.extra.is_empty() {
            if !self.metadata.is_object() {
                self.metadata = serde_json::json!({});
            }
            if let Some(metadata) = self.metadata.as_object_mut() {
                for (key, value) in &payload.extra {
                    if metadata.get(key) != Some(value) {
                        metadata.insert(key.clone(), value.clone());
                        changed = true;
                    }
                }
            }
        }

        if !source.is_empty() && !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
            changed = true;
        }

        if changed {
            self.updated_at = Utc::now();
        }

        changed
    }

    pub fn is_saved(&self) -> bool {
        self.id > 0
    }
}

impl KnownEntity for WindFarm {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn merge_field<T: PartialEq + Copy>(target: &mut Option<T>, incoming: Option<T>) -> bool {
    match incoming {
        Some(value) if *target != Some(value) => {
            *target = Some(value);
            true
        }
        _ => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================
