use crate::entities::{WindFarm, WindFarmStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event for audit trail: every create, merge and rename is recorded
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (or create) the store at `path` and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Wind Farms Table
    // AUTOINCREMENT: ids of deleted rows are never handed out again
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS wind_farms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            capacity_mw REAL,
            turbine_count INTEGER,
            status TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            sources TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Source Links (which record of which source fed which entity)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS source_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            wind_farm_id INTEGER NOT NULL,
            source TEXT NOT NULL,
            source_name TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail / event sourcing)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wind_farms_name ON wind_farms(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_source_links_farm ON source_links(wind_farm_id, source)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WIND FARMS (CRUD)
// ============================================================================

const WIND_FARM_COLUMNS: &str = "id, name, capacity_mw, turbine_count, status, latitude, longitude,
     sources, metadata, created_at, updated_at";

/// Insert a new wind farm and return its freshly assigned id
pub fn insert_wind_farm(conn: &Connection, farm: &WindFarm) -> Result<i64> {
    let sources_json = serde_json::to_string(&farm.sources)?;
    let metadata_json = serde_json::to_string(&farm.metadata)?;

    conn.execute(
        "INSERT INTO wind_farms (
            name, capacity_mw, turbine_count, status, latitude, longitude,
            sources, metadata, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            farm.name,
            farm.capacity_mw,
            farm.turbine_count,
            farm.status.as_str(),
            farm.latitude,
            farm.longitude,
            sources_json,
            metadata_json,
            farm.created_at.to_rfc3339(),
            farm.updated_at.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to insert wind farm {}", farm.name))?;

    let id = conn.last_insert_rowid();

    let event = Event::new(
        "wind_farm_created",
        "wind_farm",
        &id.to_string(),
        serde_json::json!({ "name": farm.name, "sources": farm.sources }),
        "importer",
    );
    insert_event(conn, &event)?;

    Ok(id)
}

/// Save merged attribute values. The name column is left alone: renames go
/// through `rename_wind_farm`.
pub fn update_wind_farm(conn: &Connection, farm: &WindFarm) -> Result<()> {
    let sources_json = serde_json::to_string(&farm.sources)?;
    let metadata_json = serde_json::to_string(&farm.metadata)?;

    let updated = conn.execute(
        "UPDATE wind_farms
         SET capacity_mw = ?1,
             turbine_count = ?2,
             status = ?3,
             latitude = ?4,
             longitude = ?5,
             sources = ?6,
             metadata = ?7,
             updated_at = ?8
         WHERE id = ?9",
        params![
            farm.capacity_mw,
            farm.turbine_count,
            farm.status.as_str(),
            farm.latitude,
            farm.longitude,
            sources_json,
            metadata_json,
            farm.updated_at.to_rfc3339(),
            farm.id,
        ],
    )?;

    if updated == 0 {
        anyhow::bail!("Wind farm not found: {}", farm.id);
    }

    let event = Event::new(
        "wind_farm_updated",
        "wind_farm",
        &farm.id.to_string(),
        serde_json::json!({
            "capacity_mw": farm.capacity_mw,
            "turbine_count": farm.turbine_count,
            "status": farm.status.as_str(),
            "sources": farm.sources,
        }),
        "importer",
    );
    insert_event(conn, &event)?;

    Ok(())
}

/// Explicit rename: the only way an entity's name changes
pub fn rename_wind_farm(conn: &Connection, id: i64, new_name: &str) -> Result<()> {
    let current = get_wind_farm(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("Wind farm not found: {}", id))?;

    conn.execute(
        "UPDATE wind_farms SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![new_name, Utc::now().to_rfc3339(), id],
    )?;

    let event = Event::new(
        "wind_farm_renamed",
        "wind_farm",
        &id.to_string(),
        serde_json::json!({ "from": current.name, "to": new_name }),
        "operator",
    );
    insert_event(conn, &event)?;

    Ok(())
}

/// Delete a wind farm; returns false if it did not exist
pub fn delete_wind_farm(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM wind_farms WHERE id = ?1", params![id])?;

    if deleted > 0 {
        conn.execute("DELETE FROM source_links WHERE wind_farm_id = ?1", params![id])?;

        let event = Event::new(
            "wind_farm_deleted",
            "wind_farm",
            &id.to_string(),
            serde_json::json!({}),
            "operator",
        );
        insert_event(conn, &event)?;
    }

    Ok(deleted > 0)
}

pub fn get_wind_farm(conn: &Connection, id: i64) -> Result<Option<WindFarm>> {
    let sql = format!("SELECT {} FROM wind_farms WHERE id = ?1", WIND_FARM_COLUMNS);

    let farm = conn
        .query_row(&sql, params![id], row_to_wind_farm)
        .optional()?;

    Ok(farm)
}

/// All wind farms ordered by name: this order is the match pool order
pub fn get_all_wind_farms(conn: &Connection) -> Result<Vec<WindFarm>> {
    let sql = format!(
        "SELECT {} FROM wind_farms ORDER BY name COLLATE NOCASE, id",
        WIND_FARM_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let farms = stmt
        .query_map([], row_to_wind_farm)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(farms)
}

pub fn count_wind_farms(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM wind_farms", [], |row| row.get(0))?;

    Ok(count)
}

fn row_to_wind_farm(row: &Row) -> rusqlite::Result<WindFarm> {
    let status: String = row.get(4)?;
    let sources_json: String = row.get(7)?;
    let metadata_json: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    let sources: Vec<String> = serde_json::from_str(&sources_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
    let metadata = match metadata_json {
        Some(json_str) => serde_json::from_str(&json_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        None => serde_json::json!({}),
    };

    Ok(WindFarm {
        id: row.get(0)?,
        name: row.get(1)?,
        capacity_mw: row.get(2)?,
        turbine_count: row.get(3)?,
        status: WindFarmStatus::parse(&status),
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        sources,
        metadata,
        created_at: parse_timestamp(9, &created_at)?,
        updated_at: parse_timestamp(10, &updated_at)?,
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ============================================================================
// SOURCE LINKS
// ============================================================================

pub fn record_source_link(
    conn: &Connection,
    wind_farm_id: i64,
    source: &str,
    source_name: &str,
    fingerprint: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO source_links (wind_farm_id, source, source_name, fingerprint, imported_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![wind_farm_id, source, source_name, fingerprint, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

/// Fingerprint of the last record a source merged into this wind farm
pub fn latest_fingerprint(conn: &Connection, wind_farm_id: i64, source: &str) -> Result<Option<String>> {
    let fingerprint = conn
        .query_row(
            "SELECT fingerprint FROM source_links
             WHERE wind_farm_id = ?1 AND source = ?2
             ORDER BY id DESC
             LIMIT 1",
            params![wind_farm_id, source],
            |row| row.get(0),
        )
        .optional()?;

    Ok(fingerprint)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(1, &timestamp_str)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
