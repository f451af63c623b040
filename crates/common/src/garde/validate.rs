use crate::domain::DomainError;
use garde::{Report, Validate};

/// Validate a struct and fold the garde report into a `DomainError::ValidationError`.
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(format_validation_errors(&report)))
}

/// One `field: message` entry per failing field, separated by `; `.
fn format_validation_errors(report: &Report) -> String {
    let mut out = String::new();
    for (path, error) in report.iter() {
        if !out.is_empty() {
            out.push_str("; ");
        }
        let field = path.to_string();
        if !field.is_empty() {
            out.push_str(&field);
            out.push_str(": ");
        }
        out.push_str(error.message());
    }
    out
}
