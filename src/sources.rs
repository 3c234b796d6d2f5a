// 📥 Import Sources - Tabular adapters producing (name, payload) records
// Scrapers for the original feeds live outside this crate; they export to one
// of the listing formats read here.

use crate::entities::WindFarmPayload;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    CsvListing,
    JsonListing,
}

impl SourceType {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceType::CsvListing => "CSV listing",
            SourceType::JsonListing => "JSON listing",
        }
    }

    /// Short code stored with source links
    pub fn code(&self) -> &str {
        match self {
            SourceType::CsvListing => "csv",
            SourceType::JsonListing => "json",
        }
    }

    /// Source label recorded on entities fed from this file ("csv:listing.csv")
    pub fn label(&self, file_path: &Path) -> String {
        format!("{}:{}", self.code(), file_label(file_path))
    }
}

/// One imported row: the candidate name plus everything else the source knew
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub name: String,
    pub payload: WindFarmPayload,

    // Provenance
    pub source_type: SourceType,
    pub source_file: String,
    pub line_number: usize,
}

impl ImportRecord {
    pub fn new(
        name: String,
        payload: WindFarmPayload,
        source_type: SourceType,
        source_file: String,
        line_number: usize,
    ) -> Self {
        ImportRecord {
            name,
            payload,
            source_type,
            source_file,
            line_number,
        }
    }

    /// SHA-256 over name and payload; equal fingerprints mean nothing new to merge
    pub fn fingerprint(&self) -> Result<String> {
        let payload_json = serde_json::to_string(&self.payload)
            .with_context(|| format!("Failed to serialize payload of {}", self.name))?;

        let mut hasher = Sha256::new();
        hasher.update(self.name.trim().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(payload_json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Flat row shape shared by both listing formats
#[derive(Debug, Clone, Deserialize)]
struct ListingRow {
    name: String,
    #[serde(default)]
    capacity_mw: Option<f64>,
    #[serde(default, alias = "turbine_count")]
    turbines: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl ListingRow {
    fn into_record(self, source_type: SourceType, source_file: &str, line_number: usize) -> ImportRecord {
        let payload = WindFarmPayload {
            capacity_mw: self.capacity_mw,
            turbine_count: self.turbines,
            status: self.status.filter(|s| !s.trim().is_empty()),
            latitude: self.latitude,
            longitude: self.longitude,
            extra: serde_json::Map::new(),
        };

        ImportRecord::new(
            self.name.trim().to_string(),
            payload,
            source_type,
            source_file.to_string(),
            line_number,
        )
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// ImportSource - one implementation per listing format
pub trait ImportSource: Send + Sync {
    /// Parse a file into import records, in file order
    fn parse(&self, file_path: &Path) -> Result<Vec<ImportRecord>>;

    fn source_type(&self) -> SourceType;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect source type from the file extension
///
/// # Examples:
/// ```
/// # use std::path::Path;
/// # use windfarm_aggregator::{detect_source, SourceType};
/// assert_eq!(detect_source(Path::new("renewables_uk.csv")).unwrap(), SourceType::CsvListing);
/// assert_eq!(detect_source(Path::new("kml_export.json")).unwrap(), SourceType::JsonListing);
/// ```
pub fn detect_source(file_path: &Path) -> Result<SourceType> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(SourceType::CsvListing),
        "json" => Ok(SourceType::JsonListing),
        _ => Err(anyhow::anyhow!(
            "Could not detect source type from file: {}",
            file_path.display()
        )),
    }
}

/// Get the source adapter for a source type
pub fn get_source(source_type: SourceType) -> Box<dyn ImportSource> {
    match source_type {
        SourceType::CsvListing => Box::new(CsvListingSource::new()),
        SourceType::JsonListing => Box::new(JsonListingSource::new()),
    }
}

fn file_label(file_path: &Path) -> String {
    file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

// ============================================================================
// CSV LISTING
// ============================================================================

/// Header: name,capacity_mw,turbines,status,latitude,longitude
pub struct CsvListingSource;

impl CsvListingSource {
    pub fn new() -> Self {
        CsvListingSource
    }
}

impl Default for CsvListingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSource for CsvListingSource {
    fn parse(&self, file_path: &Path) -> Result<Vec<ImportRecord>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let filename = file_label(file_path);
        let mut records = Vec::new();

        for (line_num, result) in reader.deserialize::<ListingRow>().enumerate() {
            let row = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, filename)
            })?;

            // +2 because: 1-indexed + header row
            records.push(row.into_record(SourceType::CsvListing, &filename, line_num + 2));
        }

        Ok(records)
    }

    fn source_type(&self) -> SourceType {
        SourceType::CsvListing
    }
}

// ============================================================================
// JSON LISTING
// ============================================================================

/// Array of objects with the same fields as the CSV listing
pub struct JsonListingSource;

impl JsonListingSource {
    pub fn new() -> Self {
        JsonListingSource
    }
}

impl Default for JsonListingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSource for JsonListingSource {
    fn parse(&self, file_path: &Path) -> Result<Vec<ImportRecord>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        let rows: Vec<ListingRow> = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse JSON listing {}", file_path.display()))?;

        let filename = file_label(file_path);

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_record(SourceType::JsonListing, &filename, index + 1))
            .collect())
    }

    fn source_type(&self) -> SourceType {
        SourceType::JsonListing
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_source_type_names() {
        assert_eq!(SourceType::CsvListing.name(), "CSV listing");
        assert_eq!(SourceType::JsonListing.code(), "json");
    }

    #[test]
    fn test_source_label() {
        assert_eq!(SourceType::CsvListing.label(Path::new("/data/listing.csv")), "csv:listing.csv");
        assert_eq!(SourceType::JsonListing.label(Path::new("feed.json")), "json:feed.json");
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source(Path::new("listing.CSV")).unwrap(), SourceType::CsvListing);
        assert_eq!(detect_source(Path::new("feed.json")).unwrap(), SourceType::JsonListing);
        assert!(detect_source(Path::new("windfarms.kml")).is_err());
        assert!(detect_source(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_get_source() {
        assert_eq!(get_source(SourceType::CsvListing).source_type(), SourceType::CsvListing);
        assert_eq!(get_source(SourceType::JsonListing).source_type(), SourceType::JsonListing);
    }

    #[test]
    fn test_csv_listing_parse() {
        let file = write_fixture(
            ".csv",
            "name,capacity_mw,turbines,status,latitude,longitude\n\
             Whitelee, 539, 215, Operational, 55.68, -4.27\n\
             Cathkin Braes,,,,,\n",
        );

        let records = CsvListingSource::new().parse(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Whitelee");
        assert_eq!(records[0].payload.capacity_mw, Some(539.0));
        assert_eq!(records[0].payload.turbine_count, Some(215));
        assert_eq!(records[0].payload.status.as_deref(), Some("Operational"));
        assert_eq!(records[0].line_number, 2);
        assert_eq!(records[1].name, "Cathkin Braes");
        assert_eq!(records[1].payload, WindFarmPayload::default());
        assert_eq!(records[1].source_type, SourceType::CsvListing);
    }

    #[test]
    fn test_csv_listing_bad_row() {
        let file = write_fixture(".csv", "name,capacity_mw\nWhitelee,lots\n");

        let result = CsvListingSource::new().parse(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_json_listing_parse() {
        let file = write_fixture(
            ".json",
            r#"[
                {"name": "Hadyard Hill, Barr", "capacity_mw": 120.0, "turbine_count": 52},
                {"name": " Achany Estate ", "status": "Operational"}
            ]"#,
        );

        let records = JsonListingSource::new().parse(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload.turbine_count, Some(52));
        assert_eq!(records[1].name, "Achany Estate");
        assert_eq!(records[1].line_number, 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvListingSource::new().parse(Path::new("/nonexistent.csv")).is_err());
        assert!(JsonListingSource::new().parse(Path::new("/nonexistent.json")).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_payload() {
        let record = ImportRecord::new(
            "Whitelee".to_string(),
            WindFarmPayload::default(),
            SourceType::CsvListing,
            "a.csv".to_string(),
            2,
        );
        let mut changed = record.clone();
        changed.payload.capacity_mw = Some(539.0);

        let fingerprint = record.fingerprint().unwrap();

        assert_eq!(fingerprint, record.clone().fingerprint().unwrap());
        assert_ne!(fingerprint, changed.fingerprint().unwrap());
        assert_eq!(fingerprint.len(), 64);
    }
}
