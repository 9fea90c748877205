//! Input validation helpers.

use validator::{Validate, ValidationErrors};

use stockdesk_core::error::AppError;

/// Validate `input`, mapping failures to a `Validation` error that names
/// every offending field.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input.validate().map_err(|errors| AppError::validation(describe(&errors)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reason = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{field} {reason}")
        })
        .collect();
    fields.sort();
    format!("Invalid input: {}", fields.join("; "))
}
