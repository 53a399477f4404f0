//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the request and response bodies they exchange, plus the session
//! cookie security scheme. Swagger UI serves it in debug builds.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::accounts::{AccountResponse, RegisterAccountRequest, UpdateAccountRequest};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::pictures::ImageResponse;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Account service API",
        description = "Registration, email verification, profile and profile picture management."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::verify,
        crate::inbound::http::accounts::current_account,
        crate::inbound::http::accounts::update_account,
        crate::inbound::http::auth::login,
        crate::inbound::http::pictures::upload_picture,
        crate::inbound::http::pictures::get_picture,
        crate::inbound::http::pictures::delete_picture,
        crate::inbound::http::images::serve_image,
        crate::inbound::http::health::healthz,
    ),
    components(schemas(
        AccountResponse,
        RegisterAccountRequest,
        UpdateAccountRequest,
        LoginRequest,
        ImageResponse,
        Error,
        ErrorCode
    )),
    tags(
        (name = "accounts", description = "Registration, verification and profile"),
        (name = "pictures", description = "Profile picture storage"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
