//! Public read access to stored profile pictures.
//!
//! ```text
//! GET /images/{key}
//! ```
//!
//! Picture URLs handed out by the local image store resolve here when its
//! public base URL points at this service. No session is required, matching
//! the public object URLs of a bucket.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use tracing::error;

use crate::domain::Error;
use crate::domain::ports::{ProfileImageStore, ProfileImageStoreError};
use crate::inbound::http::ApiResult;

/// Object store handle for the public image route.
#[derive(Clone)]
pub struct ImageState {
    store: Arc<dyn ProfileImageStore>,
}

impl ImageState {
    pub fn new(store: Arc<dyn ProfileImageStore>) -> Self {
        Self { store }
    }
}

fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn picture_missing() -> Error {
    Error::not_found("picture not found")
}

/// Serve the stored bytes of one picture.
#[utoipa::path(
    get,
    path = "/images/{key}",
    params(("key" = String, Path, description = "Object key, `<accountId>/profilePic.<ext>`")),
    responses(
        (status = 200, description = "Picture bytes", content_type = "image/*", body = Vec<u8>),
        (status = 404, description = "No picture under this key", body = Error),
        (status = 503, description = "Image store unavailable", body = Error)
    ),
    tags = ["pictures"],
    operation_id = "serveProfilePic",
    security([])
)]
#[get("/images/{key:.*}")]
pub async fn serve_image(
    state: web::Data<ImageState>,
    key: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = key.into_inner();
    match state.store.fetch(&key).await {
        Ok(Some(bytes)) => Ok(HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, content_type_for(&key)))
            .body(bytes)),
        Ok(None) | Err(ProfileImageStoreError::InvalidKey { .. }) => Err(picture_missing()),
        Err(err) => {
            error!(error = %err, kind = err.kind(), %key, "failed to read profile picture");
            Err(Error::service_unavailable("image store temporarily unavailable"))
        }
    }
}
