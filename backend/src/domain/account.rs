//! Account aggregate and its value types.
//!
//! The aggregate encodes its pairing rules in types: a pending verification
//! always carries both a token and an expiry, and a profile image always
//! carries both its object key and public URL.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::verification::VerificationToken;

/// Validation errors raised by account value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyEmail,
    InvalidEmail,
    InvalidId,
    EmptyDigest,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid email address"),
            Self::InvalidId => write!(f, "account id must be a valid UUID"),
            Self::EmptyDigest => write!(f, "password digest must not be empty"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Stable account identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an identifier from text.
    pub fn parse(raw: &str) -> Result<Self, AccountValidationError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| AccountValidationError::InvalidId)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[a-zA-Z0-9_!#$%&'*+/=?`{|}~^.-]+@[a-zA-Z0-9.-]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address used as the account's login identity.
///
/// Addresses are stored and compared exactly as supplied.
///
/// # Examples
/// ```
/// use account_backend::domain::EmailAddress;
///
/// assert!(EmailAddress::new("jane@example.com").is_ok());
/// assert!(EmailAddress::new("jane.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an address.
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&raw) {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(raw))
    }

    /// Borrow the address text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One-way password digest produced by a credential hasher.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a digest string.
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(AccountValidationError::EmptyDigest);
        }
        Ok(Self(raw))
    }

    /// Borrow the encoded digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Creation and modification instants embedded in persisted records.
///
/// ## Invariants
/// - `updated_at >= created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Timestamps for a record created at `now`.
    pub fn created(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild timestamps loaded from storage.
    ///
    /// An `updated_at` earlier than `created_at` is lifted to `created_at`.
    pub fn restore(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            updated_at: updated_at.max(created_at),
        }
    }

    /// Record a modification at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Progress of the email verification handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    /// A token was issued and has not been redeemed.
    Pending {
        token: VerificationToken,
        expires_at: DateTime<Utc>,
    },
    /// The account holder proved ownership of the email address.
    Verified,
}

impl VerificationState {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Reference to a stored profile picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    /// Object-store key, `<accountId>/profilePic.<ext>`.
    pub key: String,
    /// Publicly reachable URL of the object.
    pub url: String,
}

/// Persisted account record.
///
/// ## Invariants
/// - `id` and `timestamps.created_at` never change after creation.
/// - `email` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    first_name: String,
    last_name: String,
    email: EmailAddress,
    password_digest: PasswordDigest,
    verification: VerificationState,
    image: Option<ProfileImage>,
    timestamps: Timestamps,
}

/// Field bundle used to rebuild an [`Account`] from storage.
#[derive(Debug, Clone)]
pub struct AccountParts {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub password_digest: PasswordDigest,
    pub verification: VerificationState,
    pub image: Option<ProfileImage>,
    pub timestamps: Timestamps,
}

impl Account {
    /// Rebuild an account from its stored parts.
    pub fn from_parts(parts: AccountParts) -> Self {
        let AccountParts {
            id,
            first_name,
            last_name,
            email,
            password_digest,
            verification,
            image,
            timestamps,
        } = parts;
        Self {
            id,
            first_name,
            last_name,
            email,
            password_digest,
            verification,
            image,
            timestamps,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password_digest(&self) -> &PasswordDigest {
        &self.password_digest
    }

    pub fn verification(&self) -> &VerificationState {
        &self.verification
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_verified()
    }

    pub fn image(&self) -> Option<&ProfileImage> {
        self.image.as_ref()
    }

    pub fn timestamps(&self) -> Timestamps {
        self.timestamps
    }

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
    }

    pub fn set_password_digest(&mut self, digest: PasswordDigest) {
        self.password_digest = digest;
    }

    /// Complete verification, discarding the token and its expiry.
    pub fn mark_verified(&mut self) {
        self.verification = VerificationState::Verified;
    }

    pub fn attach_image(&mut self, image: ProfileImage) {
        self.image = Some(image);
    }

    /// Remove the image reference, returning the one that was attached.
    pub fn detach_image(&mut self) -> Option<ProfileImage> {
        self.image.take()
    }

    /// Record a modification at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
    }
}
