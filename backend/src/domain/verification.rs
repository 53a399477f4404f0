//! Email verification tokens and their expiry policy.
//!
//! Tokens are opaque random strings sent to the account holder. The policy
//! decides how long a token stays valid; the window is configurable through
//! the environment so operators can widen it without a rebuild.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

/// Environment variable holding the token lifetime in seconds.
pub const VERIFICATION_TTL_SECONDS_ENV: &str = "ACCOUNTS_VERIFICATION_TTL_SECONDS";

const TOKEN_BYTES: usize = 16;

/// Opaque verification token.
///
/// ## Invariants
/// - Never blank once trimmed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VerificationToken(String);

/// Error returned when a token string is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTokenError;

impl fmt::Display for EmptyTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verification token must not be empty")
    }
}

impl std::error::Error for EmptyTokenError {}

impl VerificationToken {
    /// Draw a new token from the operating system CSPRNG.
    ///
    /// The token carries 128 bits of entropy rendered as 32 lowercase hex
    /// characters.
    ///
    /// # Examples
    /// ```
    /// use account_backend::domain::VerificationToken;
    ///
    /// let token = VerificationToken::generate();
    /// assert_eq!(token.as_str().len(), 32);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a token received from a caller or loaded from storage.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyTokenError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyTokenError);
        }
        Ok(Self(raw))
    }

    /// Borrow the token text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationToken(..)")
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment abstraction for verification policy lookups.
///
/// Lets tests supply values without mutating the process environment.
pub trait VerificationEnv {
    /// Fetch a string value by name.
    fn string(&self, name: &str) -> Option<String>;
}

/// Environment access backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessVerificationEnv;

impl VerificationEnv for ProcessVerificationEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Token lifetime policy.
///
/// # Examples
/// ```
/// use account_backend::domain::VerificationPolicy;
/// use chrono::{TimeDelta, Utc};
///
/// let policy = VerificationPolicy::default();
/// let issued = Utc::now();
/// let expiry = policy.expiry_from(issued);
/// assert_eq!(expiry - issued, TimeDelta::minutes(4));
/// assert!(!policy.is_expired(expiry, expiry));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    ttl: Duration,
}

impl VerificationPolicy {
    const DEFAULT_TTL_SECONDS: u64 = 4 * 60;
    const MIN_TTL_SECONDS: u64 = 1;
    const MAX_TTL_SECONDS: u64 = 7 * 24 * 3600;

    /// Load the policy from the process environment.
    ///
    /// Reads `ACCOUNTS_VERIFICATION_TTL_SECONDS` (default 240). Values are
    /// clamped to one second .. seven days; unparsable values fall back to
    /// the default.
    pub fn from_env() -> Self {
        Self::from_env_with(&ProcessVerificationEnv)
    }

    /// Load the policy from a custom environment source.
    pub fn from_env_with(env: &impl VerificationEnv) -> Self {
        let seconds = env
            .string(VERIFICATION_TTL_SECONDS_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TTL_SECONDS)
            .clamp(Self::MIN_TTL_SECONDS, Self::MAX_TTL_SECONDS);
        Self {
            ttl: Duration::from_secs(seconds),
        }
    }

    /// Build a policy with an explicit lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expiry instant for a token issued at `issued_at`.
    pub fn expiry_from(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether a token expiring at `expires_at` is stale at `now`.
    ///
    /// A token is still valid at the exact expiry instant.
    pub fn is_expired(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > expires_at
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(Self::DEFAULT_TTL_SECONDS),
        }
    }
}
