// Person Entity - who received an income
//
// Identity: integer id assigned by the store on first insert.
// "Same person" = same name, surname and sex (absent only matches absent).
// The unique index idx_persons_identity enforces that at the store level.

use super::{push_optional_clause, MatchMode};
use crate::error::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// SEX
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "FEMALE",
            Sex::Male => "MALE",
            Sex::Other => "OTHER",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown sex: {0}")]
pub struct ParseSexError(pub String);

impl FromStr for Sex {
    type Err = ParseSexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FEMALE" | "F" => Ok(Sex::Female),
            "MALE" | "M" => Ok(Sex::Male),
            "OTHER" => Ok(Sex::Other),
            _ => Err(ParseSexError(s.to_string())),
        }
    }
}

impl ToSql for Sex {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Sex {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// PERSON ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Store-assigned identity (None until inserted)
    pub id: Option<i64>,

    /// Required, never blank
    pub name: String,

    pub surname: Option<String>,

    pub sex: Option<Sex>,
}

impl Person {
    pub fn new(name: &str, surname: Option<&str>, sex: Option<Sex>) -> Self {
        Person {
            id: None,
            name: name.to_string(),
            surname: surname.map(|s| s.to_string()),
            sex,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Person {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            surname: row.get(2)?,
            sex: row.get(3)?,
        })
    }
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

/// Find persons equal to `probe` on its fields (name always constrains)
pub fn find_persons_by_example(
    conn: &Connection,
    probe: &Person,
    mode: MatchMode,
) -> Result<Vec<Person>> {
    let mut sql = String::from("SELECT id, name, surname, sex FROM persons WHERE name = ?1");
    let mut values = vec![probe.name.clone()];

    push_optional_clause(&mut sql, &mut values, "surname", probe.surname.as_deref(), mode);
    push_optional_clause(&mut sql, &mut values, "sex", probe.sex.map(|s| s.as_str()), mode);
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let persons = stmt
        .query_map(params_from_iter(values.iter()), Person::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(persons)
}

/// Insert a new person row; fails with a constraint violation on a duplicate
pub fn insert_person(conn: &Connection, person: &Person) -> Result<Person> {
    conn.execute(
        "INSERT INTO persons (name, surname, sex) VALUES (?1, ?2, ?3)",
        params![person.name, person.surname, person.sex],
    )?;

    let mut inserted = person.clone();
    inserted.id = Some(conn.last_insert_rowid());
    Ok(inserted)
}

pub fn find_person_by_id(conn: &Connection, id: i64) -> Result<Option<Person>> {
    let person = conn
        .query_row(
            "SELECT id, name, surname, sex FROM persons WHERE id = ?1",
            [id],
            Person::from_row,
        )
        .optional()?;

    Ok(person)
}

pub fn get_all_persons(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare("SELECT id, name, surname, sex FROM persons ORDER BY id")?;
    let persons = stmt
        .query_map([], Person::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(persons)
}

pub fn count_persons(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
    Ok(count)
}

pub fn exists_person_by_name(conn: &Connection, name: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM persons WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn exists_person_by_name_and_surname(
    conn: &Connection,
    name: &str,
    surname: &str,
) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM persons WHERE name = ?1 AND surname = ?2)",
        [name, surname],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============================================================================
// TESTS
// ============================================================================
