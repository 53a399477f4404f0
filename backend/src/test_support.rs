//! In-memory adapters and clocks for tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration suites under `tests/`. Every adapter honours the same contract
//! as its production counterpart, including the repository's unique email
//! constraint.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CredentialHasher, CredentialHasherError,
    ProfileImageStore, ProfileImageStoreError, VerificationPublisher, VerificationPublisherError,
};
use crate::domain::{Account, AccountId, EmailAddress, PasswordDigest, VerificationState, VerificationToken};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock whose current instant is set explicitly.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0) = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Account repository backed by a map keyed on account id.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<AccountId, Account>>,
    failure: Mutex<Option<AccountRepositoryError>>,
}

impl InMemoryAccountRepository {
    /// Make every subsequent call fail with `error` until cleared.
    pub fn fail_with(&self, error: Option<AccountRepositoryError>) {
        *lock(&self.failure) = error;
    }

    /// Stored record for `email`, bypassing the port.
    pub fn stored(&self, email: &str) -> Option<Account> {
        lock(&self.accounts)
            .values()
            .find(|account| account.email().as_str() == email)
            .cloned()
    }

    /// Pending verification token for `email`, if one is outstanding.
    pub fn pending_token(&self, email: &str) -> Option<String> {
        self.stored(email)
            .and_then(|account| match account.verification() {
                VerificationState::Pending { token, .. } => Some(token.as_str().to_owned()),
                VerificationState::Verified => None,
            })
    }

    /// Insert a record directly, skipping uniqueness checks.
    pub fn insert(&self, account: Account) {
        lock(&self.accounts).insert(account.id(), account);
    }

    pub fn len(&self) -> usize {
        lock(&self.accounts).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self) -> Result<(), AccountRepositoryError> {
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        self.check_failure()?;
        Ok(self.stored(email.as_str()))
    }

    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        self.check_failure()?;
        Ok(lock(&self.accounts)
            .values()
            .find(|account| {
                matches!(
                    account.verification(),
                    VerificationState::Pending { token: stored, .. } if stored == token
                )
            })
            .cloned())
    }

    async fn save(&self, account: &Account) -> Result<Account, AccountRepositoryError> {
        self.check_failure()?;
        let mut accounts = lock(&self.accounts);
        let clash = accounts
            .values()
            .any(|other| other.id() != account.id() && other.email() == account.email());
        if clash {
            return Err(AccountRepositoryError::duplicate_email(account.email().as_str()));
        }
        accounts.insert(account.id(), account.clone());
        Ok(account.clone())
    }
}

/// Stored object with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store backed by an ordered map.
pub struct InMemoryProfileImageStore {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failure: Mutex<Option<ProfileImageStoreError>>,
}

impl InMemoryProfileImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(BTreeMap::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, error: Option<ProfileImageStoreError>) {
        *lock(&self.failure) = error;
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    fn check_failure(&self) -> Result<(), ProfileImageStoreError> {
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryProfileImageStore {
    fn default() -> Self {
        Self::new("https://images.test")
    }
}

#[async_trait]
impl ProfileImageStore for InMemoryProfileImageStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ProfileImageStoreError> {
        self.check_failure()?;
        lock(&self.objects).insert(
            key.to_owned(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(format!("{}/{key}", self.base_url))
    }

    async fn list_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, ProfileImageStoreError> {
        self.check_failure()?;
        Ok(lock(&self.objects)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProfileImageStoreError> {
        self.check_failure()?;
        Ok(lock(&self.objects)
            .get(key)
            .map(|object| object.bytes.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), ProfileImageStoreError> {
        self.check_failure()?;
        lock(&self.objects).remove(key);
        Ok(())
    }
}

/// Publisher that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingVerificationPublisher {
    messages: Mutex<Vec<(String, String)>>,
    failing: bool,
}

impl RecordingVerificationPublisher {
    /// A publisher whose every publish fails after recording the attempt.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// `(topic, payload)` pairs in publish order.
    pub fn messages(&self) -> Vec<(String, String)> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl VerificationPublisher for RecordingVerificationPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), VerificationPublisherError> {
        lock(&self.messages).push((topic.to_owned(), payload.to_owned()));
        if self.failing {
            return Err(VerificationPublisherError::transport("publisher offline"));
        }
        Ok(())
    }
}

/// Reversible "hasher" for fast tests. Never use outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCredentialHasher;

const PLAIN_PREFIX: &str = "plain$";

#[async_trait]
impl CredentialHasher for PlainCredentialHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialHasherError> {
        PasswordDigest::new(format!("{PLAIN_PREFIX}{plaintext}"))
            .map_err(|err| CredentialHasherError::hash(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, CredentialHasherError> {
        let stored = digest
            .as_str()
            .strip_prefix(PLAIN_PREFIX)
            .ok_or_else(|| CredentialHasherError::malformed_digest("missing plain prefix"))?;
        Ok(stored == plaintext)
    }
}
