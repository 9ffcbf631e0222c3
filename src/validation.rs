// Shape checks run before anything touches the store

use crate::views::IncomeView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str, context: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            context: context.to_string(),
        }
    }

    fn required(field: &str, context: &str) -> Self {
        ValidationError::new(field, "Required field is empty", context)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// An income must name both its person and its source
pub fn validate_income_view(view: &IncomeView) -> ValidationResult {
    let mut errors = Vec::new();

    if is_blank(view.person.name.as_deref()) {
        errors.push(ValidationError::required("person.name", "Income"));
    }

    if is_blank(view.income_source.name.as_deref()) {
        errors.push(ValidationError::required("incomeSource.name", "Income"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
