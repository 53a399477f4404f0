//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use crate::domain::{EmailAddress, Error};
use crate::inbound::http::session::SessionContext;

/// Path of the route installed by [`seed_session`].
pub const SEED_SESSION_PATH: &str = "/test/session/{email}";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler that stores the path email in the session without a password.
///
/// Mount it at [`SEED_SESSION_PATH`] so handler tests can act as a logged-in
/// caller without mocking the login port.
pub async fn seed_session(
    session: SessionContext,
    email: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let email = EmailAddress::new(email.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_account(&email)?;
    Ok(HttpResponse::Ok().finish())
}

/// Call the [`seed_session`] route and return the resulting session cookie.
pub async fn session_cookie_for(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    email: &str,
) -> Cookie<'static> {
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri(&format!("/test/session/{email}"))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "session seeding failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
