//! Account domain: entities, validation, ports and the lifecycle service.
//!
//! Purpose: Define strongly typed account entities used by the HTTP and
//! persistence layers, and the service that enforces the account rules.
//! Adapters depend on this module; it depends on no adapter.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Account (alias to `account::Account`): persisted account record.
//! - AccountLifecycleService: implementation of the driving ports.

pub mod account;
pub mod account_mapping;
pub mod account_service;
pub mod account_validation;
pub mod auth;
pub mod error;
pub mod ports;
pub mod trace_id;
pub mod verification;

pub use self::account::{
    Account, AccountId, AccountParts, AccountValidationError, EmailAddress, PasswordDigest,
    ProfileImage, Timestamps, VerificationState,
};
pub use self::account_mapping::{
    AccountPatch, AccountProfile, ImageRef, PictureUpload, RegistrationRequest,
};
pub use self::account_service::{
    AccountLifecycleService, AccountServicePorts, DEFAULT_VERIFICATION_TOPIC, UNAVAILABLE_MESSAGE,
};
pub use self::account_validation::{
    FieldError, FieldErrorCode, field_errors_to_error, validate_patch, validate_registration,
};
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::verification::{
    EmptyTokenError, ProcessVerificationEnv, VERIFICATION_TTL_SECONDS_ENV, VerificationEnv,
    VerificationPolicy, VerificationToken,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use account_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("no such account"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
