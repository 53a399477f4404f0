//! Driving port for account reads.

use async_trait::async_trait;

use crate::domain::{AccountProfile, EmailAddress, Error, ImageRef};

/// Domain use-case port for reading the caller's account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Return the caller's profile. Requires a verified account.
    async fn get_profile(&self, caller: &EmailAddress) -> Result<AccountProfile, Error>;

    /// Describe the caller's stored profile picture.
    async fn get_profile_picture(&self, caller: &EmailAddress) -> Result<ImageRef, Error>;
}
