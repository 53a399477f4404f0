//! Pure transforms between request/response shapes and [`Account`].
//!
//! Nothing here performs I/O or fails; validation happens before these
//! functions run.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::account::{
    Account, AccountId, AccountParts, EmailAddress, PasswordDigest, Timestamps, VerificationState,
};
use super::verification::VerificationToken;

/// Registration input as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Zeroizing<String>,
}

/// Partial profile update. `None` leaves the stored value unchanged.
///
/// An empty password string also means "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<Zeroizing<String>>,
}

impl AccountPatch {
    /// True when no field is present.
    ///
    /// # Examples
    /// ```
    /// use account_backend::domain::AccountPatch;
    ///
    /// assert!(AccountPatch::default().is_empty());
    /// let patch = AccountPatch { first_name: Some("Janet".into()), ..AccountPatch::default() };
    /// assert!(!patch.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }

    /// The new plaintext password, when one should be hashed.
    pub fn new_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .map(String::as_str)
            .filter(|password| !password.is_empty())
    }

    /// Copy the present name fields onto `account`.
    ///
    /// Email is never copied and the password is left to the caller, which
    /// owns hashing.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(first_name) = &self.first_name {
            account.set_first_name(first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            account.set_last_name(last_name.clone());
        }
    }
}

/// Outward account representation. Never carries the digest or token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub verified: bool,
    pub account_created: DateTime<Utc>,
    pub account_updated: DateTime<Utc>,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        let stamps = account.timestamps();
        Self {
            id: account.id(),
            first_name: account.first_name().to_owned(),
            last_name: account.last_name().to_owned(),
            email: account.email().clone(),
            verified: account.is_verified(),
            account_created: stamps.created_at(),
            account_updated: stamps.updated_at(),
            image_key: account.image().map(|image| image.key.clone()),
            image_url: account.image().map(|image| image.url.clone()),
        }
    }
}

/// Uploaded picture bytes with their client-supplied metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Description of a stored profile picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub account_id: AccountId,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Build a freshly registered, unverified account.
pub fn account_from_registration(
    request: &RegistrationRequest,
    email: EmailAddress,
    password_digest: PasswordDigest,
    token: VerificationToken,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Account {
    Account::from_parts(AccountParts {
        id: AccountId::random(),
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        email,
        password_digest,
        verification: VerificationState::Pending { token, expires_at },
        image: None,
        timestamps: Timestamps::created(now),
    })
}

/// Folder holding every object that belongs to `account_id`.
pub fn picture_prefix(account_id: AccountId) -> String {
    format!("{account_id}/")
}

/// Object key for a profile picture, `<accountId>/profilePic.<ext>`.
///
/// The extension is the segment after the first `.` in `file_name`, so
/// `me.photo.png` yields `photo`. Returns `None` when that segment is
/// missing or empty.
pub fn picture_key(account_id: AccountId, file_name: &str) -> Option<String> {
    file_name
        .split('.')
        .nth(1)
        .filter(|extension| !extension.is_empty())
        .map(|extension| format!("{}profilePic.{extension}", picture_prefix(account_id)))
}
