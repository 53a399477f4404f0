//! Driving port for login.
//!
//! Inbound adapters exchange credentials for the account email, which they
//! then keep in the session as the caller identity.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, LoginCredentials};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated email.
    ///
    /// Unknown emails and wrong passwords fail identically with
    /// `Unauthorized`. Unverified accounts may log in.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<EmailAddress, Error>;
}
