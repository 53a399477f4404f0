//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies are checked by the domain validators; the helpers here
//! cover what only HTTP can get wrong: missing query parameters, required
//! headers, and inputs an endpoint does not accept at all.

use actix_web::HttpRequest;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ContentDisposition};
use serde_json::json;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidHeader,
    UnexpectedInput,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidHeader => "invalid_header",
            ErrorCode::UnexpectedInput => "unexpected_input",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
    )
}

pub(crate) fn invalid_header_error(field: FieldName, reason: &str) -> Error {
    field_error(
        field,
        ErrorCode::InvalidHeader,
        format!("{} header {reason}", field.as_str()),
    )
}

/// Inputs rejected by endpoints that accept neither parameters nor a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnexpectedInput {
    QueryParameters,
    Payload,
    ContentType,
}

impl UnexpectedInput {
    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::QueryParameters => "query parameters are not allowed",
            Self::Payload => "payload is not allowed",
            Self::ContentType => "content type is not allowed",
        }
    }

    pub(crate) fn into_error(self) -> Error {
        Error::invalid_request(self.message()).with_details(json!({
            "code": ErrorCode::UnexpectedInput.as_str(),
        }))
    }
}

/// Detect query parameters, a body, or a content type other than `*/*`.
pub(crate) fn unexpected_input(req: &HttpRequest, body: &[u8]) -> Option<UnexpectedInput> {
    if !req.query_string().is_empty() {
        return Some(UnexpectedInput::QueryParameters);
    }
    let declared_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0);
    if declared_length > 0 || !body.is_empty() {
        return Some(UnexpectedInput::Payload);
    }
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .map(|value| value.to_str().unwrap_or_default().trim());
    match content_type {
        Some(value) if value != "*/*" => Some(UnexpectedInput::ContentType),
        _ => None,
    }
}

const CONTENT_TYPE_FIELD: FieldName = FieldName::new("Content-Type");
const CONTENT_DISPOSITION_FIELD: FieldName = FieldName::new("Content-Disposition");

/// Content type of an uploaded picture; must be an `image/*` type.
pub(crate) fn picture_content_type(req: &HttpRequest) -> Result<String, Error> {
    let value = req
        .headers()
        .get(CONTENT_TYPE)
        .ok_or_else(|| missing_field_error(CONTENT_TYPE_FIELD))?
        .to_str()
        .map_err(|_| invalid_header_error(CONTENT_TYPE_FIELD, "must be ASCII"))?
        .trim();
    if value.to_ascii_lowercase().starts_with("image/") {
        Ok(value.to_owned())
    } else {
        Err(invalid_header_error(CONTENT_TYPE_FIELD, "must name an image type"))
    }
}

/// Original file name from `Content-Disposition: attachment; filename="…"`.
pub(crate) fn picture_file_name(req: &HttpRequest) -> Result<String, Error> {
    let raw = req
        .headers()
        .get(CONTENT_DISPOSITION)
        .ok_or_else(|| missing_field_error(CONTENT_DISPOSITION_FIELD))?;
    let disposition = ContentDisposition::from_raw(raw)
        .map_err(|_| invalid_header_error(CONTENT_DISPOSITION_FIELD, "is malformed"))?;
    disposition
        .get_filename()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| invalid_header_error(CONTENT_DISPOSITION_FIELD, "must carry a filename"))
}
