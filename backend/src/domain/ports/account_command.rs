//! Driving port for account mutations.
//!
//! Inbound adapters resolve the caller's identity themselves and pass it in
//! explicitly; the port never reads ambient request state.

use async_trait::async_trait;

use crate::domain::{
    AccountPatch, AccountProfile, EmailAddress, Error, ImageRef, PictureUpload,
    RegistrationRequest,
};

/// Driving port for account lifecycle mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an unverified account and announce its verification token.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when fields fail validation.
    /// - `AlreadyExists` when the email is taken.
    /// - `ServiceUnavailable` when a dependency fails.
    async fn register(&self, request: RegistrationRequest) -> Result<AccountProfile, Error>;

    /// Redeem a verification token. Unknown or expired tokens yield `false`.
    async fn verify(&self, token: &str) -> Result<bool, Error>;

    /// Apply a partial update to the caller's profile.
    async fn update_profile(
        &self,
        caller: &EmailAddress,
        patch: AccountPatch,
    ) -> Result<AccountProfile, Error>;

    /// Store the caller's profile picture.
    async fn upload_profile_picture(
        &self,
        caller: &EmailAddress,
        upload: PictureUpload,
    ) -> Result<ImageRef, Error>;

    /// Remove the caller's profile picture.
    async fn delete_profile_picture(&self, caller: &EmailAddress) -> Result<(), Error>;
}
