// IncomeSource Entity - where an income came from (salary, rent, ...)
//
// Identity is the trimmed name; description is descriptive only and is
// never part of the match.

use super::{push_optional_clause, MatchMode};
use crate::error::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

impl IncomeSource {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        IncomeSource {
            id: None,
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(IncomeSource {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

/// Find sources equal to `probe`; `description` only constrains when populated
/// and the mode asks for it
pub fn find_income_sources_by_example(
    conn: &Connection,
    probe: &IncomeSource,
    mode: MatchMode,
) -> Result<Vec<IncomeSource>> {
    let mut sql = String::from("SELECT id, name, description FROM income_sources WHERE name = ?1");
    let mut values = vec![probe.name.clone()];

    push_optional_clause(&mut sql, &mut values, "description", probe.description.as_deref(), mode);
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let sources = stmt
        .query_map(params_from_iter(values.iter()), IncomeSource::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(sources)
}

pub fn insert_income_source(conn: &Connection, source: &IncomeSource) -> Result<IncomeSource> {
    conn.execute(
        "INSERT INTO income_sources (name, description) VALUES (?1, ?2)",
        params![source.name, source.description],
    )?;

    let mut inserted = source.clone();
    inserted.id = Some(conn.last_insert_rowid());
    Ok(inserted)
}

pub fn find_income_source_by_id(conn: &Connection, id: i64) -> Result<Option<IncomeSource>> {
    let source = conn
        .query_row(
            "SELECT id, name, description FROM income_sources WHERE id = ?1",
            [id],
            IncomeSource::from_row,
        )
        .optional()?;

    Ok(source)
}

pub fn get_all_income_sources(conn: &Connection) -> Result<Vec<IncomeSource>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM income_sources ORDER BY id")?;
    let sources = stmt
        .query_map([], IncomeSource::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(sources)
}

pub fn count_income_sources(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM income_sources", [], |row| row.get(0))?;
    Ok(count)
}

pub fn exists_income_source_by_name(conn: &Connection, name: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM income_sources WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}
