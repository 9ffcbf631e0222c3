// Entity Models
//
// Person and IncomeSource are reference entities: many incomes point at the
// same row, so rows are matched before a new one is inserted.
// Income owns its identity and references exactly one of each.

pub mod person;
pub mod income_source;
pub mod income;

pub use person::{Person, Sex, ParseSexError};
pub use income_source::IncomeSource;
pub use income::Income;

/// How absent template fields behave in an example-match query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Only populated template fields constrain the match
    IgnoreAbsent,

    /// Absent template fields only match absent (NULL) columns
    IncludeAbsent,
}

/// Trim a free-text value; blank strings count as absent
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Append a `column = ?` / `column IS NULL` clause for an optional field
pub(crate) fn push_optional_clause(
    sql: &mut String,
    values: &mut Vec<String>,
    column: &str,
    value: Option<&str>,
    mode: MatchMode,
) {
    match (value, mode) {
        (Some(v), _) => {
            values.push(v.to_string());
            sql.push_str(&format!(" AND {} = ?{}", column, values.len()));
        }
        (None, MatchMode::IncludeAbsent) => {
            sql.push_str(&format!(" AND {} IS NULL", column));
        }
        (None, MatchMode::IgnoreAbsent) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some("".to_string())), None);
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(
            normalize_text(Some("  Kowalska ".to_string())),
            Some("Kowalska".to_string())
        );
    }

    #[test]
    fn test_push_optional_clause_modes() {
        let mut sql = String::from("WHERE name = ?1");
        let mut values = vec!["Anna".to_string()];

        push_optional_clause(&mut sql, &mut values, "surname", Some("Kowalska"), MatchMode::IgnoreAbsent);
        push_optional_clause(&mut sql, &mut values, "sex", None, MatchMode::IgnoreAbsent);
        assert_eq!(sql, "WHERE name = ?1 AND surname = ?2");

        push_optional_clause(&mut sql, &mut values, "sex", None, MatchMode::IncludeAbsent);
        assert_eq!(sql, "WHERE name = ?1 AND surname = ?2 AND sex IS NULL");
        assert_eq!(values, vec!["Anna".to_string(), "Kowalska".to_string()]);
    }
}
