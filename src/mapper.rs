//! Entity <-> view mapping
//!
//! Entity to view never fails. View to entity validates first and trims
//! free text (blank becomes absent). Timestamps are not carried from a view
//! into an entity: the store owns them.

use crate::entities::{normalize_text, Income, IncomeSource, Person};
use crate::error::Error;
use crate::validation::{validate_income_view, ValidationError};
use crate::views::{IncomeSourceView, IncomeView, PersonView};

impl From<Person> for PersonView {
    fn from(person: Person) -> Self {
        PersonView {
            id: person.id,
            name: Some(person.name),
            surname: person.surname,
            sex: person.sex,
        }
    }
}

impl From<IncomeSource> for IncomeSourceView {
    fn from(source: IncomeSource) -> Self {
        IncomeSourceView {
            id: source.id,
            name: Some(source.name),
            description: source.description,
        }
    }
}

impl From<Income> for IncomeView {
    fn from(income: Income) -> Self {
        IncomeView {
            id: income.id,
            creation_timestamp: income.creation_timestamp,
            update_timestamp: income.update_timestamp,
            income_value_in_cent: income.income_value_in_cent,
            person: income.person.into(),
            income_source: income.income_source.into(),
        }
    }
}

impl TryFrom<PersonView> for Person {
    type Error = Error;

    fn try_from(view: PersonView) -> Result<Self, Self::Error> {
        let name = normalize_text(view.name).ok_or_else(|| {
            Error::Validation(vec![ValidationError::new("name", "Required field is empty", "Person")])
        })?;

        Ok(Person {
            id: view.id,
            name,
            surname: normalize_text(view.surname),
            sex: view.sex,
        })
    }
}

impl TryFrom<IncomeSourceView> for IncomeSource {
    type Error = Error;

    fn try_from(view: IncomeSourceView) -> Result<Self, Self::Error> {
        let name = normalize_text(view.name).ok_or_else(|| {
            Error::Validation(vec![ValidationError::new(
                "name",
                "Required field is empty",
                "IncomeSource",
            )])
        })?;

        Ok(IncomeSource {
            id: view.id,
            name,
            description: normalize_text(view.description),
        })
    }
}

impl TryFrom<IncomeView> for Income {
    type Error = Error;

    fn try_from(view: IncomeView) -> Result<Self, Self::Error> {
        validate_income_view(&view).map_err(Error::Validation)?;

        Ok(Income {
            id: view.id,
            income_value_in_cent: view.income_value_in_cent,
            creation_timestamp: None,
            update_timestamp: None,
            person: Person::try_from(view.person)?,
            income_source: IncomeSource::try_from(view.income_source)?,
        })
    }
}
