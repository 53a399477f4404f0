//! Account lifecycle service.
//!
//! Implements the account driving ports on top of the driven ports: account
//! repository, profile image store, verification publisher, credential hasher
//! and metrics. Dependency failures never reach callers in detail; they are
//! logged and collapsed into a generic `ServiceUnavailable` error.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::account_mapping::{account_from_registration, picture_key, picture_prefix};
use crate::domain::account_validation::{
    field_errors_to_error, validate_patch, validate_registration,
};
use crate::domain::ports::{
    AccountCommand, AccountMetrics, AccountOperation, AccountQuery, AccountRepository,
    AccountRepositoryError, CredentialHasher, CredentialHasherError, LoginService,
    NoOpAccountMetrics, ProfileImageStore, ProfileImageStoreError, VerificationPublisher,
};
use crate::domain::{
    Account, AccountPatch, AccountProfile, EmailAddress, Error, ImageRef, LoginCredentials,
    PictureUpload, ProfileImage, RegistrationRequest, VerificationPolicy, VerificationState,
    VerificationToken,
};

/// Message returned for every collapsed dependency failure.
pub const UNAVAILABLE_MESSAGE: &str = "account service temporarily unavailable";

/// Topic used when none is configured.
pub const DEFAULT_VERIFICATION_TOPIC: &str = "user-verification";

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Driven ports consumed by [`AccountLifecycleService`].
pub struct AccountServicePorts<R, S, P, H> {
    pub accounts: Arc<R>,
    pub images: Arc<S>,
    pub publisher: Arc<P>,
    pub hasher: Arc<H>,
}

/// Account lifecycle service implementing the account driving ports.
pub struct AccountLifecycleService<R, S, P, H> {
    accounts: Arc<R>,
    images: Arc<S>,
    publisher: Arc<P>,
    hasher: Arc<H>,
    metrics: Arc<dyn AccountMetrics>,
    clock: Arc<dyn Clock>,
    policy: VerificationPolicy,
    topic: String,
}

impl<R, S, P, H> AccountLifecycleService<R, S, P, H> {
    /// Create a service with default policy, topic and no-op metrics.
    pub fn new(ports: AccountServicePorts<R, S, P, H>, clock: Arc<dyn Clock>) -> Self {
        let AccountServicePorts {
            accounts,
            images,
            publisher,
            hasher,
        } = ports;
        Self {
            accounts,
            images,
            publisher,
            hasher,
            metrics: Arc::new(NoOpAccountMetrics),
            clock,
            policy: VerificationPolicy::default(),
            topic: DEFAULT_VERIFICATION_TOPIC.to_owned(),
        }
    }

    /// Replace the metrics recorder.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn AccountMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the verification token policy.
    #[must_use]
    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Publish verification events to `topic`.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }
}

fn unavailable() -> Error {
    Error::service_unavailable(UNAVAILABLE_MESSAGE)
}

fn account_not_found() -> Error {
    Error::not_found("account not found")
}

fn email_change_rejected() -> Error {
    Error::invalid_request("email cannot be changed")
}

fn map_repository_error(err: AccountRepositoryError) -> Error {
    match err {
        AccountRepositoryError::DuplicateEmail { .. } => {
            Error::already_exists("an account with this email already exists")
        }
        other => {
            error!(error = %other, kind = other.kind(), "account repository failure");
            unavailable()
        }
    }
}

fn map_store_error(err: ProfileImageStoreError) -> Error {
    error!(error = %err, kind = err.kind(), "profile image store failure");
    unavailable()
}

fn map_hasher_error(err: CredentialHasherError) -> Error {
    error!(error = %err, kind = err.kind(), "credential hasher failure");
    unavailable()
}

fn ensure_verified(account: &Account) -> Result<(), Error> {
    if account.is_verified() {
        Ok(())
    } else {
        Err(Error::not_verified("account email has not been verified"))
    }
}

fn parse_email(raw: &str) -> Result<EmailAddress, Error> {
    EmailAddress::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

impl<R, S, P, H> AccountLifecycleService<R, S, P, H>
where
    R: AccountRepository,
    S: ProfileImageStore,
    P: VerificationPublisher,
    H: CredentialHasher,
{
    async fn measured<T, F>(&self, operation: AccountOperation, work: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        if let Err(err) = self.metrics.record_call(operation).await {
            debug!(error = %err, %operation, "failed to record call metric");
        }
        let started = Instant::now();
        let outcome = work.await;
        if let Err(err) = self.metrics.record_latency(operation, started.elapsed()).await {
            debug!(error = %err, %operation, "failed to record latency metric");
        }
        outcome
    }

    /// Run one repository call, recording its latency against `operation`.
    async fn store_call<T, F>(&self, operation: AccountOperation, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, AccountRepositoryError>>,
    {
        let started = Instant::now();
        let outcome = call.await;
        if let Err(err) = self
            .metrics
            .record_store_latency(operation, started.elapsed())
            .await
        {
            debug!(error = %err, %operation, "failed to record store latency metric");
        }
        outcome.map_err(map_repository_error)
    }

    async fn find_account(
        &self,
        operation: AccountOperation,
        email: &EmailAddress,
    ) -> Result<Option<Account>, Error> {
        self.store_call(operation, self.accounts.find_by_email(email))
            .await
    }

    async fn load_account(
        &self,
        operation: AccountOperation,
        email: &EmailAddress,
    ) -> Result<Account, Error> {
        self.find_account(operation, email)
            .await?
            .ok_or_else(account_not_found)
    }

    async fn load_verified(
        &self,
        operation: AccountOperation,
        email: &EmailAddress,
    ) -> Result<Account, Error> {
        let account = self.load_account(operation, email).await?;
        ensure_verified(&account)?;
        Ok(account)
    }

    async fn persist(
        &self,
        operation: AccountOperation,
        mut account: Account,
    ) -> Result<Account, Error> {
        account.touch(self.clock.utc());
        self.store_call(operation, self.accounts.save(&account))
            .await
    }

    async fn announce(&self, email: &EmailAddress, token: &VerificationToken) {
        let payload = json!({
            "receiverEmail": email.as_str(),
            "token": token.as_str(),
        })
        .to_string();
        match self.publisher.publish(&self.topic, &payload).await {
            Ok(()) => info!(topic = %self.topic, "verification event published"),
            Err(err) => error!(
                error = %err,
                kind = err.kind(),
                topic = %self.topic,
                "failed to publish verification event; registration kept"
            ),
        }
    }

    async fn register_account(&self, request: RegistrationRequest) -> Result<AccountProfile, Error> {
        let problems = validate_registration(&request);
        if !problems.is_empty() {
            warn!(count = problems.len(), "registration rejected by validation");
            return Err(field_errors_to_error(&problems));
        }
        let email = parse_email(&request.email)?;
        if self
            .find_account(AccountOperation::Register, &email)
            .await?
            .is_some()
        {
            warn!(%email, "registration for existing email");
            return Err(Error::already_exists("an account with this email already exists"));
        }

        let digest = self
            .hasher
            .hash(&request.password)
            .await
            .map_err(map_hasher_error)?;
        let now = self.clock.utc();
        let token = VerificationToken::generate();
        let account = account_from_registration(
            &request,
            email,
            digest,
            token.clone(),
            self.policy.expiry_from(now),
            now,
        );
        let saved = self
            .store_call(AccountOperation::Register, self.accounts.save(&account))
            .await?;

        self.announce(saved.email(), &token).await;
        info!(account_id = %saved.id(), "account registered");
        Ok(AccountProfile::from(&saved))
    }

    async fn verify_token(&self, raw: &str) -> Result<bool, Error> {
        let Ok(token) = VerificationToken::new(raw) else {
            return Ok(false);
        };
        let Some(mut account) = self
            .store_call(
                AccountOperation::Verify,
                self.accounts.find_by_verification_token(&token),
            )
            .await?
        else {
            info!("verification token not recognised");
            return Ok(false);
        };

        let now = self.clock.utc();
        match account.verification() {
            VerificationState::Pending { expires_at, .. }
                if self.policy.is_expired(*expires_at, now) =>
            {
                info!(account_id = %account.id(), %expires_at, "verification token expired");
                return Ok(false);
            }
            VerificationState::Pending { .. } => {}
            VerificationState::Verified => return Ok(false),
        }

        account.mark_verified();
        let saved = self.persist(AccountOperation::Verify, account).await?;
        info!(account_id = %saved.id(), "account verified");
        Ok(true)
    }

    async fn update_account(
        &self,
        caller: &EmailAddress,
        patch: AccountPatch,
    ) -> Result<AccountProfile, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request(
                "update must contain at least one field",
            ));
        }
        let problems = validate_patch(&patch);
        if !problems.is_empty() {
            return Err(field_errors_to_error(&problems));
        }

        // The account named by the patch email is checked before the caller's
        // own account is loaded.
        let target = patch.email.as_deref().map(parse_email).transpose()?;
        if let Some(target) = &target {
            match self.find_account(AccountOperation::UpdateProfile, target).await? {
                Some(existing) => ensure_verified(&existing)?,
                None => return Err(email_change_rejected()),
            }
        }

        let mut account = self
            .load_account(AccountOperation::UpdateProfile, caller)
            .await?;
        if target.as_ref().is_some_and(|email| email != account.email()) {
            warn!(account_id = %account.id(), "attempt to change account email");
            return Err(email_change_rejected());
        }
        ensure_verified(&account)?;

        patch.apply_to(&mut account);
        if let Some(password) = patch.new_password() {
            let digest = self
                .hasher
                .hash(password)
                .await
                .map_err(map_hasher_error)?;
            account.set_password_digest(digest);
        }

        let saved = self.persist(AccountOperation::UpdateProfile, account).await?;
        info!(account_id = %saved.id(), "account profile updated");
        Ok(AccountProfile::from(&saved))
    }

    async fn upload_picture(
        &self,
        caller: &EmailAddress,
        upload: PictureUpload,
    ) -> Result<ImageRef, Error> {
        let mut account = self
            .load_verified(AccountOperation::UploadPicture, caller)
            .await?;
        let account_id = account.id();
        let key = picture_key(account_id, &upload.file_name)
            .ok_or_else(|| Error::invalid_request("file name must include an extension"))?;

        let existing = self
            .images
            .list_prefix(&picture_prefix(account_id), 1)
            .await
            .map_err(map_store_error)?;
        if !existing.is_empty() {
            return Err(Error::already_exists(
                "profile picture already exists; delete it first",
            ));
        }

        let url = self
            .images
            .put(&key, upload.bytes, &upload.content_type)
            .await
            .map_err(map_store_error)?;
        account.attach_image(ProfileImage {
            key: key.clone(),
            url: url.clone(),
        });

        if let Err(err) = self.persist(AccountOperation::UploadPicture, account).await {
            if let Err(cleanup) = self.images.delete(&key).await {
                error!(error = %cleanup, %key, "failed to remove orphaned profile picture");
            }
            return Err(err);
        }

        info!(%account_id, %key, "profile picture uploaded");
        Ok(ImageRef {
            url,
            account_id,
            file_name: upload.file_name,
            uploaded_at: self.clock.utc(),
        })
    }

    async fn describe_picture(&self, caller: &EmailAddress) -> Result<ImageRef, Error> {
        let account = self
            .load_verified(AccountOperation::FetchPicture, caller)
            .await?;
        let image = account
            .image()
            .ok_or_else(|| Error::not_found("profile picture not found"))?;
        Ok(ImageRef {
            url: image.url.clone(),
            account_id: account.id(),
            file_name: image.key.clone(),
            uploaded_at: account.timestamps().updated_at(),
        })
    }

    async fn remove_picture(&self, caller: &EmailAddress) -> Result<(), Error> {
        let mut account = self
            .load_verified(AccountOperation::DeletePicture, caller)
            .await?;
        let key = account
            .image()
            .map(|image| image.key.clone())
            .ok_or_else(|| Error::not_found("profile picture not found"))?;

        self.images.delete(&key).await.map_err(map_store_error)?;
        account.detach_image();
        let saved = self.persist(AccountOperation::DeletePicture, account).await?;
        info!(account_id = %saved.id(), %key, "profile picture deleted");
        Ok(())
    }

    async fn check_credentials(&self, credentials: &LoginCredentials) -> Result<EmailAddress, Error> {
        let Some(account) = self
            .find_account(AccountOperation::Login, credentials.email())
            .await?
        else {
            warn!("login for unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = self
            .hasher
            .verify(credentials.password(), account.password_digest())
            .await
            .map_err(map_hasher_error)?;
        if !matches {
            warn!(account_id = %account.id(), "login with wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(account.email().clone())
    }
}

#[async_trait]
impl<R, S, P, H> AccountCommand for AccountLifecycleService<R, S, P, H>
where
    R: AccountRepository,
    S: ProfileImageStore,
    P: VerificationPublisher,
    H: CredentialHasher,
{
    async fn register(&self, request: RegistrationRequest) -> Result<AccountProfile, Error> {
        self.measured(AccountOperation::Register, self.register_account(request))
            .await
    }

    async fn verify(&self, token: &str) -> Result<bool, Error> {
        self.measured(AccountOperation::Verify, self.verify_token(token))
            .await
    }

    async fn update_profile(
        &self,
        caller: &EmailAddress,
        patch: AccountPatch,
    ) -> Result<AccountProfile, Error> {
        self.measured(
            AccountOperation::UpdateProfile,
            self.update_account(caller, patch),
        )
        .await
    }

    async fn upload_profile_picture(
        &self,
        caller: &EmailAddress,
        upload: PictureUpload,
    ) -> Result<ImageRef, Error> {
        self.measured(
            AccountOperation::UploadPicture,
            self.upload_picture(caller, upload),
        )
        .await
    }

    async fn delete_profile_picture(&self, caller: &EmailAddress) -> Result<(), Error> {
        self.measured(AccountOperation::DeletePicture, self.remove_picture(caller))
            .await
    }
}

#[async_trait]
impl<R, S, P, H> AccountQuery for AccountLifecycleService<R, S, P, H>
where
    R: AccountRepository,
    S: ProfileImageStore,
    P: VerificationPublisher,
    H: CredentialHasher,
{
    async fn get_profile(&self, caller: &EmailAddress) -> Result<AccountProfile, Error> {
        self.measured(AccountOperation::FetchProfile, async {
            let account = self
                .load_verified(AccountOperation::FetchProfile, caller)
                .await?;
            Ok(AccountProfile::from(&account))
        })
        .await
    }

    async fn get_profile_picture(&self, caller: &EmailAddress) -> Result<ImageRef, Error> {
        self.measured(AccountOperation::FetchPicture, self.describe_picture(caller))
            .await
    }
}

#[async_trait]
impl<R, S, P, H> LoginService for AccountLifecycleService<R, S, P, H>
where
    R: AccountRepository,
    S: ProfileImageStore,
    P: VerificationPublisher,
    H: CredentialHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<EmailAddress, Error> {
        self.measured(AccountOperation::Login, self.check_credentials(credentials))
            .await
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
