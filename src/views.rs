//! Transfer objects exchanged with callers (JSON over HTTP, CLI output)
//!
//! Everything is optional on the way in so that a missing name surfaces as a
//! validation error instead of a deserialization failure.

use crate::entities::Sex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSourceView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Output only; ignored on input
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Output only; ignored on input
    #[serde(default)]
    pub update_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub income_value_in_cent: i64,

    #[serde(default, rename = "osoba", alias = "person")]
    pub person: PersonView,

    #[serde(default)]
    pub income_source: IncomeSourceView,
}

impl IncomeView {
    /// Convenience constructor for a not-yet-saved income
    pub fn new(income_value_in_cent: i64, person: PersonView, income_source: IncomeSourceView) -> Self {
        IncomeView {
            income_value_in_cent,
            person,
            income_source,
            ..Default::default()
        }
    }
}

impl PersonView {
    pub fn named(name: &str, surname: Option<&str>, sex: Option<Sex>) -> Self {
        PersonView {
            id: None,
            name: Some(name.to_string()),
            surname: surname.map(|s| s.to_string()),
            sex,
        }
    }
}

impl IncomeSourceView {
    pub fn named(name: &str) -> Self {
        IncomeSourceView {
            id: None,
            name: Some(name.to_string()),
            description: None,
        }
    }
}
