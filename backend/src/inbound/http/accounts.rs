//! Account HTTP handlers.
//!
//! ```text
//! POST /v1/user {"first_name":"Jane","last_name":"Doe","email":"jane@example.com","password":"s3cret"}
//! GET  /v1/user/verify?token=<hex>
//! GET  /v1/user/self
//! PUT  /v1/user/self {"last_name":"Smith"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use zeroize::Zeroizing;

use crate::domain::{AccountPatch, AccountProfile, Error, RegistrationRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::error::invalid_payload;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

/// Body returned when a verification link succeeds.
pub const VERIFIED_MESSAGE: &str = "User verified successfully";
/// Body returned when a verification link is unknown or stale.
pub const VERIFICATION_FAILED_MESSAGE: &str = "Verification link expired or invalid";

/// JSON extractor configuration rejecting malformed bodies with the standard
/// error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| invalid_payload(err).into())
}

/// Query extractor configuration mirroring [`json_config`].
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| invalid_payload(err).into())
}

/// Registration payload for `POST /v1/user`.
///
/// Missing fields deserialize as empty strings so they are reported by field
/// validation alongside every other problem.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterAccountRequest {
    #[serde(default)]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[serde(default)]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[serde(default)]
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "s3cr3t", write_only)]
    pub password: String,
}

impl From<RegisterAccountRequest> for RegistrationRequest {
    fn from(value: RegisterAccountRequest) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            password: Zeroizing::new(value.password),
        }
    }
}

/// Partial update payload for `PUT /v1/user/self`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[schema(write_only)]
    pub password: Option<String>,
}

impl From<UpdateAccountRequest> for AccountPatch {
    fn from(value: UpdateAccountRequest) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            password: value.password.map(Zeroizing::new),
        }
    }
}

/// Outward account representation. Never carries the password digest or a
/// verification token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "d290f1ee-6c54-4b01-90e6-d701748f0851")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(example = "2016-08-29T09:12:33.001Z")]
    pub account_created: String,
    #[schema(example = "2016-08-29T09:12:33.001Z")]
    pub account_updated: String,
    #[serde(rename = "imageKey")]
    pub image_key: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

impl From<AccountProfile> for AccountResponse {
    fn from(value: AccountProfile) -> Self {
        Self {
            id: value.id.to_string(),
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email.into(),
            account_created: value.account_created.to_rfc3339(),
            account_updated: value.account_updated.to_rfc3339(),
            image_key: value.image_key,
            image_url: value.image_url,
        }
    }
}

/// Query string for `GET /v1/user/verify`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    /// Token delivered in the verification email.
    pub token: Option<String>,
}

/// Register a new, unverified account.
#[utoipa::path(
    post,
    path = "/v1/user",
    request_body = RegisterAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "registerUser",
    security([])
)]
#[post("/user")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterAccountRequest>,
) -> ApiResult<HttpResponse> {
    let profile = state.accounts.register(payload.into_inner().into()).await?;
    info!(account_id = %profile.id, "POST /v1/user completed");
    Ok(HttpResponse::Created().json(AccountResponse::from(profile)))
}

/// Redeem a verification token.
#[utoipa::path(
    get,
    path = "/v1/user/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Account verified", body = String),
        (status = 400, description = "Token unknown, expired or missing", body = String),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "verifyUser",
    security([])
)]
#[get("/user/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    query: web::Query<VerifyQuery>,
) -> ApiResult<HttpResponse> {
    let token = query
        .into_inner()
        .token
        .ok_or_else(|| missing_field_error(FieldName::new("token")))?;
    if state.accounts.verify(&token).await? {
        Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(VERIFIED_MESSAGE))
    } else {
        Ok(HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body(VERIFICATION_FAILED_MESSAGE))
    }
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/v1/user/self",
    responses(
        (status = 200, description = "Account profile", body = AccountResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Email not verified", body = Error),
        (status = 404, description = "Account not found", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "fetchUserDetails"
)]
#[get("/user/self")]
pub async fn current_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let email = session.require_account_email()?;
    let profile = state.profiles.get_profile(&email).await?;
    Ok(HttpResponse::Ok()
        .insert_header(no_store_header())
        .json(AccountResponse::from(profile)))
}

/// Apply a partial update to the caller's profile.
#[utoipa::path(
    put,
    path = "/v1/user/self",
    request_body = UpdateAccountRequest,
    responses(
        (status = 204, description = "Account updated"),
        (status = 400, description = "Empty, invalid or email-changing update", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Email not verified", body = Error),
        (status = 404, description = "Account not found", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateUserDetails"
)]
#[put("/user/self")]
pub async fn update_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateAccountRequest>,
) -> ApiResult<HttpResponse> {
    let email = session.require_account_email()?;
    state
        .accounts
        .update_profile(&email, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
