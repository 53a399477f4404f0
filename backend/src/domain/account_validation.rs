//! Field validation for registration and profile updates.
//!
//! Each function collects every problem it finds so callers can report them
//! together instead of one per round trip.

use serde::Serialize;
use serde_json::json;

use super::account::{AccountValidationError, EmailAddress};
use super::account_mapping::{AccountPatch, RegistrationRequest};
use super::error::Error;

/// Machine-readable reason attached to a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    Blank,
    InvalidEmail,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: FieldErrorCode,
    pub message: String,
}

impl FieldError {
    fn blank(field: &'static str) -> Self {
        Self {
            field,
            code: FieldErrorCode::Blank,
            message: format!("{field} must not be blank"),
        }
    }

    fn invalid_email(field: &'static str) -> Self {
        Self {
            field,
            code: FieldErrorCode::InvalidEmail,
            message: format!("{field} must be a valid email address"),
        }
    }
}

fn check_required(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::blank(field));
    }
}

fn check_email(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    match EmailAddress::new(value) {
        Ok(_) => {}
        Err(AccountValidationError::EmptyEmail) => errors.push(FieldError::blank(field)),
        Err(_) => errors.push(FieldError::invalid_email(field)),
    }
}

/// Validate a registration request. An empty list means the request is
/// acceptable.
pub fn validate_registration(request: &RegistrationRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_required(&mut errors, "first_name", &request.first_name);
    check_required(&mut errors, "last_name", &request.last_name);
    check_email(&mut errors, "email", &request.email);
    check_required(&mut errors, "password", &request.password);
    errors
}

/// Validate the present fields of a patch.
///
/// Emptiness of the patch as a whole is checked separately through
/// [`AccountPatch::is_empty`]. Present names replace the stored ones as
/// given, blank included, so only the email is checked. A present but empty
/// password is accepted and means "no change".
pub fn validate_patch(patch: &AccountPatch) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(email) = &patch.email {
        check_email(&mut errors, "email", email);
    }
    errors
}

/// Convert collected field errors into an invalid-request error.
///
/// The individual problems are listed under `details.fields`.
pub fn field_errors_to_error(errors: &[FieldError]) -> Error {
    let message = match errors {
        [single] => single.message.clone(),
        _ => "request validation failed".to_owned(),
    };
    Error::invalid_request(message).with_details(json!({ "fields": errors }))
}
