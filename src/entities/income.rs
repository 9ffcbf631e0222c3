// Income Entity - one received amount, in minor currency units
//
// Owns its identity and timestamps (both assigned by the store).
// Does not own its Person / IncomeSource: deleting an income leaves them.

use super::{IncomeSource, Person};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: Option<i64>,

    /// Signed amount in cents; no currency conversion applies
    pub income_value_in_cent: i64,

    /// Set by the store on insert, kept on update
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Set by the store on every write
    pub update_timestamp: Option<DateTime<Utc>>,

    pub person: Person,
    pub income_source: IncomeSource,
}

impl Income {
    pub fn new(income_value_in_cent: i64, person: Person, income_source: IncomeSource) -> Self {
        Income {
            id: None,
            income_value_in_cent,
            creation_timestamp: None,
            update_timestamp: None,
            person,
            income_source,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
