//! Cookie session access for account handlers.
//!
//! The session carries a single value: the email of the account that last
//! logged in. Logging in rotates the cookie; every authenticated route reads
//! the email back and resolves the account from the store.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{EmailAddress, Error};

pub(crate) const ACCOUNT_EMAIL_KEY: &str = "account_email";

/// Account-aware view over the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Rotate the session and record `email` as the logged-in account.
    pub fn persist_account(&self, email: &EmailAddress) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(ACCOUNT_EMAIL_KEY, email.as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Email stored by the last login. A value that no longer parses as an
    /// address is treated as absent.
    pub fn account_email(&self) -> Result<Option<EmailAddress>, Error> {
        let Some(raw) = self
            .0
            .get::<String>(ACCOUNT_EMAIL_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?
        else {
            return Ok(None);
        };
        EmailAddress::new(raw).map(Some).or_else(|error| {
            warn!(%error, "discarding malformed account email from session");
            Ok(None)
        })
    }

    /// Logged-in caller, or [`Error::unauthorized`].
    pub fn require_account_email(&self) -> Result<EmailAddress, Error> {
        self.account_email()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
