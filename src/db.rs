use crate::entities::income_source::insert_income_source;
use crate::entities::person::insert_person;
use crate::entities::{Income, IncomeSource, Person};
use crate::error::{Error, Result};
use crate::pagination::PageRequest;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Event for audit trail ("every change is an event")
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
        entity_id: i64,
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

/// Open (or create) a database file and bring the schema up
pub fn open_database(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;

    // WAL for crash recovery; the pragma answers with the resulting mode
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("Opened {} (journal_mode = {})", path.display(), mode);

    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;

    // ==========================================================================
    // Reference tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            surname TEXT,
            sex TEXT CHECK (sex IN ('FEMALE', 'MALE', 'OTHER')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS income_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Incomes (never cascade into reference rows)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS incomes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            income_value_in_cent INTEGER NOT NULL,
            person_id INTEGER NOT NULL REFERENCES persons(id),
            income_source_id INTEGER NOT NULL REFERENCES income_sources(id),
            creation_timestamp TEXT NOT NULL,
            update_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
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
    // The two identity indexes are what keeps reference rows unique
    // ==========================================================================
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_persons_identity
         ON persons(name, COALESCE(surname, ''), COALESCE(sex, ''))",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_income_sources_name ON income_sources(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incomes_person ON incomes(person_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// Incomes
// ============================================================================

const INCOME_SELECT: &str = "SELECT i.id, i.income_value_in_cent, i.creation_timestamp, i.update_timestamp,
        p.id, p.name, p.surname, p.sex,
        s.id, s.name, s.description
 FROM incomes i
 JOIN persons p ON p.id = i.person_id
 JOIN income_sources s ON s.id = i.income_source_id";

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn income_from_row(row: &Row<'_>) -> rusqlite::Result<Income> {
    let creation: String = row.get(2)?;
    let update: String = row.get(3)?;

    Ok(Income {
        id: Some(row.get(0)?),
        income_value_in_cent: row.get(1)?,
        creation_timestamp: Some(parse_timestamp(2, &creation)?),
        update_timestamp: Some(parse_timestamp(3, &update)?),
        person: Person {
            id: Some(row.get(4)?),
            name: row.get(5)?,
            surname: row.get(6)?,
            sex: row.get(7)?,
        },
        income_source: IncomeSource {
            id: Some(row.get(8)?),
            name: row.get(9)?,
            description: row.get(10)?,
        },
    })
}

pub fn find_income_by_id(conn: &Connection, id: i64) -> Result<Option<Income>> {
    let income = conn
        .query_row(
            &format!("{} WHERE i.id = ?1", INCOME_SELECT),
            [id],
            income_from_row,
        )
        .optional()?;

    Ok(income)
}

/// All incomes in id order, optionally restricted to one page
pub fn find_all_incomes(conn: &Connection, page: Option<PageRequest>) -> Result<Vec<Income>> {
    let incomes = match page {
        Some(page) => {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY i.id LIMIT ?1 OFFSET ?2",
                INCOME_SELECT
            ))?;
            let rows = stmt.query_map(params![page.limit(), page.offset()], income_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("{} ORDER BY i.id", INCOME_SELECT))?;
            let rows = stmt.query_map([], income_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(incomes)
}

pub fn count_incomes(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM incomes", [], |row| row.get(0))?;
    Ok(count)
}

/// Insert-or-update by id presence.
///
/// References without an id are inserted as-is (no matching); callers that
/// want deduplication resolve the ids first. Timestamps on `income` are
/// ignored: the store sets both on insert and only `update_timestamp` on
/// update. Updating an id that does not exist is `Error::NotFound`.
pub fn save_income(conn: &Connection, income: &Income) -> Result<Income> {
    let person_id = match income.person.id {
        Some(id) => id,
        None => insert_person(conn, &income.person)?.id.unwrap_or_default(),
    };
    let source_id = match income.income_source.id {
        Some(id) => id,
        None => insert_income_source(conn, &income.income_source)?.id.unwrap_or_default(),
    };

    let now = format_timestamp(Utc::now());

    let id = match income.id {
        None => {
            conn.execute(
                "INSERT INTO incomes (
                    income_value_in_cent, person_id, income_source_id,
                    creation_timestamp, update_timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?4)",
                params![income.income_value_in_cent, person_id, source_id, now],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let updated = conn.execute(
                "UPDATE incomes
                 SET income_value_in_cent = ?1,
                     person_id = ?2,
                     income_source_id = ?3,
                     update_timestamp = ?4
                 WHERE id = ?5",
                params![income.income_value_in_cent, person_id, source_id, now, id],
            )?;
            if updated == 0 {
                return Err(Error::NotFound(format!("income {}", id)));
            }
            id
        }
    };

    find_income_by_id(conn, id)?.ok_or_else(|| Error::NotFound(format!("income {}", id)))
}

/// Delete one income; returns the number of rows removed (0 or 1)
pub fn delete_income_by_id(conn: &Connection, id: i64) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM incomes WHERE id = ?1", [id])?;
    Ok(deleted)
}

// ============================================================================
// Events
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
            format_timestamp(event.timestamp),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: i64,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id.to_string()], |row| {
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
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(events)
}
