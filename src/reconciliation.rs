// Reference reconciliation - reuse an existing Person / IncomeSource row
// instead of inserting a duplicate.
//
// Policy, for both reference kinds:
//   exactly one match -> reuse its id
//   no match          -> insert a new row
//   several matches   -> AmbiguousReference (the unique indexes make this
//                        unreachable unless the schema was altered)
//
// If the insert loses a race on the unique index, the match is run again
// and the winning row is reused (insert-or-fetch-on-conflict).
//
// Matching fields:
//   Person       name + surname + sex, absent only matches absent
//   IncomeSource name

use crate::entities::income_source::{find_income_sources_by_example, insert_income_source};
use crate::entities::person::{find_persons_by_example, insert_person};
use crate::entities::{IncomeSource, MatchMode, Person};
use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, warn};

// ============================================================================
// RECONCILIATION OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled<T> {
    /// An existing row was found and reused
    Reused(T),

    /// No row matched; a new one was inserted
    Inserted(T),
}

impl<T> Reconciled<T> {
    pub fn was_inserted(&self) -> bool {
        matches!(self, Reconciled::Inserted(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Reconciled::Reused(value) | Reconciled::Inserted(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Reconciled::Reused(value) | Reconciled::Inserted(value) => value,
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Match-then-insert with a single re-match when the insert hits the unique index
fn reconcile_with<T, F, I>(entity: &'static str, find: F, insert: I) -> Result<Reconciled<T>>
where
    F: Fn() -> Result<Vec<T>>,
    I: FnOnce() -> Result<T>,
{
    let mut matches = find()?;
    match matches.len() {
        0 => {}
        1 => return Ok(Reconciled::Reused(matches.remove(0))),
        n => return Err(Error::AmbiguousReference { entity, matches: n }),
    }

    match insert() {
        Ok(inserted) => Ok(Reconciled::Inserted(inserted)),
        Err(Error::Store(err)) if is_constraint_violation(&err) => {
            warn!("Concurrent insert of {} detected, re-matching", entity);
            let mut matches = find()?;
            match matches.len() {
                1 => Ok(Reconciled::Reused(matches.remove(0))),
                0 => Err(Error::Store(err)),
                n => Err(Error::AmbiguousReference { entity, matches: n }),
            }
        }
        Err(e) => Err(e),
    }
}

/// Resolve `person` to a stored row. Any id on the input is ignored.
pub fn reconcile_person(conn: &Connection, person: &Person) -> Result<Reconciled<Person>> {
    let probe = Person {
        id: None,
        ..person.clone()
    };

    let outcome = reconcile_with(
        "person",
        || find_persons_by_example(conn, &probe, MatchMode::IncludeAbsent),
        || insert_person(conn, &probe),
    )?;

    debug!("Person {:?} -> {:?}", probe.name, outcome);
    Ok(outcome)
}

/// Resolve `source` to a stored row by name. A reused row keeps its stored
/// description.
pub fn reconcile_income_source(
    conn: &Connection,
    source: &IncomeSource,
) -> Result<Reconciled<IncomeSource>> {
    let probe = IncomeSource {
        id: None,
        name: source.name.clone(),
        description: None,
    };

    let outcome = reconcile_with(
        "income source",
        || find_income_sources_by_example(conn, &probe, MatchMode::IgnoreAbsent),
        || {
            insert_income_source(
                conn,
                &IncomeSource {
                    id: None,
                    name: source.name.clone(),
                    description: source.description.clone(),
                },
            )
        },
    )?;

    debug!("IncomeSource {:?} -> {:?}", probe.name, outcome);
    Ok(outcome)
}

// ============================================================================
// TESTS
// ============================================================================
