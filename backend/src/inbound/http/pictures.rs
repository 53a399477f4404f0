//! Profile picture HTTP handlers.
//!
//! ```text
//! POST   /v1/user/self/pic   (raw image body, Content-Type: image/*,
//!                             Content-Disposition: attachment; filename="me.jpg")
//! GET    /v1/user/self/pic
//! DELETE /v1/user/self/pic
//! ```
//!
//! Every response, success or failure, forbids caching. `GET` and `DELETE`
//! accept neither query parameters nor a body.

use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, ResponseError, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{Error, ImageRef, PictureUpload};
use crate::inbound::http::cache_control::{
    NO_STORE_MUST_REVALIDATE, no_store_header, pragma_no_cache_header,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, UnexpectedInput, missing_field_error, picture_content_type, picture_file_name,
    unexpected_input,
};

/// Largest accepted picture body in bytes.
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Payload configuration raising the body limit to [`MAX_PICTURE_BYTES`].
pub fn payload_config() -> web::PayloadConfig {
    web::PayloadConfig::new(MAX_PICTURE_BYTES)
}

/// Picture metadata returned to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub url: String,
    /// Owning account id, kept alongside `userId` for older clients.
    pub id: String,
    pub file_name: String,
    #[schema(example = "2024-06-01")]
    pub upload_date: String,
    pub user_id: String,
}

impl From<ImageRef> for ImageResponse {
    fn from(value: ImageRef) -> Self {
        let account_id = value.account_id.to_string();
        Self {
            url: value.url,
            id: account_id.clone(),
            file_name: value.file_name,
            upload_date: value.uploaded_at.format("%Y-%m-%d").to_string(),
            user_id: account_id,
        }
    }
}

fn uncached(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .insert_header(no_store_header())
        .insert_header(pragma_no_cache_header());
    builder
}

fn uncached_error(err: &Error) -> HttpResponse {
    let mut response = err.error_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(NO_STORE_MUST_REVALIDATE),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn respond(result: Result<HttpResponse, Error>) -> HttpResponse {
    result.unwrap_or_else(|err| uncached_error(&err))
}

fn reject_extras(req: &HttpRequest, body: &[u8]) -> Result<(), Error> {
    match unexpected_input(req, body) {
        Some(rejected) => {
            warn!(reason = rejected.message(), path = req.path(), "picture request rejected");
            Err(rejected.into_error())
        }
        None => Ok(()),
    }
}

async fn upload(
    req: &HttpRequest,
    state: &HttpState,
    session: &SessionContext,
    body: web::Bytes,
) -> Result<HttpResponse, Error> {
    let email = session.require_account_email()?;
    if !req.query_string().is_empty() {
        return Err(UnexpectedInput::QueryParameters.into_error());
    }
    let content_type = picture_content_type(req)?;
    let file_name = picture_file_name(req)?;
    if body.is_empty() {
        return Err(missing_field_error(FieldName::new("body")));
    }
    let image = state
        .accounts
        .upload_profile_picture(
            &email,
            PictureUpload {
                bytes: body.to_vec(),
                file_name,
                content_type,
            },
        )
        .await?;
    info!(account_id = %image.account_id, "POST /v1/user/self/pic completed");
    Ok(uncached(HttpResponse::Created()).json(ImageResponse::from(image)))
}

/// Upload the caller's profile picture.
#[utoipa::path(
    post,
    path = "/v1/user/self/pic",
    request_body(content = Vec<u8>, content_type = "image/*"),
    responses(
        (status = 201, description = "Picture stored", body = ImageResponse),
        (status = 400, description = "Missing file name, extension or image content type", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Email not verified", body = Error),
        (status = 409, description = "A picture already exists", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["pictures"],
    operation_id = "uploadProfilePic"
)]
#[post("/user/self/pic")]
pub async fn upload_picture(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Bytes,
) -> HttpResponse {
    respond(upload(&req, &state, &session, body).await)
}

/// Describe the caller's profile picture.
#[utoipa::path(
    get,
    path = "/v1/user/self/pic",
    responses(
        (status = 200, description = "Picture metadata", body = ImageResponse),
        (status = 400, description = "Query parameters, payload or content type present", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Email not verified", body = Error),
        (status = 404, description = "No account or no picture", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["pictures"],
    operation_id = "getProfilePic"
)]
#[get("/user/self/pic")]
pub async fn get_picture(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Bytes,
) -> HttpResponse {
    respond(
        async {
            let email = session.require_account_email()?;
            reject_extras(&req, &body)?;
            let image = state.profiles.get_profile_picture(&email).await?;
            Ok(uncached(HttpResponse::Ok()).json(ImageResponse::from(image)))
        }
        .await,
    )
}

/// Delete the caller's profile picture.
#[utoipa::path(
    delete,
    path = "/v1/user/self/pic",
    responses(
        (status = 204, description = "Picture deleted"),
        (status = 400, description = "Query parameters, payload or content type present", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Email not verified", body = Error),
        (status = 404, description = "No account or no picture", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["pictures"],
    operation_id = "deleteProfilePic"
)]
#[delete("/user/self/pic")]
pub async fn delete_picture(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Bytes,
) -> HttpResponse {
    respond(
        async {
            let email = session.require_account_email()?;
            reject_extras(&req, &body)?;
            state.accounts.delete_profile_picture(&email).await?;
            Ok(uncached(HttpResponse::NoContent()).finish())
        }
        .await,
    )
}

#[cfg(test)]
#[path = "pictures_tests.rs"]
mod tests;
