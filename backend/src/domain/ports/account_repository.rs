//! Port for account persistence.
//!
//! The store is the source of truth for email uniqueness: adapters must
//! enforce a unique constraint and report violations as
//! [`AccountRepositoryError::DuplicateEmail`] so the service can tell a lost
//! registration race apart from an outage.

use async_trait::async_trait;

use crate::domain::{Account, EmailAddress, VerificationToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "account repository query failed: {message}",
        /// Another account already uses this email address.
        DuplicateEmail { email: String } =>
            "an account with email {email} already exists",
    }
}

/// Port for account storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fetch the account registered under `email`, if any.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch the account holding the pending verification `token`, if any.
    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Insert or update `account` by id and return the stored record.
    ///
    /// The returned record carries the `updated_at` stamped by the store.
    async fn save(&self, account: &Account) -> Result<Account, AccountRepositoryError>;
}

/// Fixture implementation that stores nothing.
///
/// Lookups always miss and saves echo the input back.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountRepository;

#[async_trait]
impl AccountRepository for FixtureAccountRepository {
    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(None)
    }

    async fn find_by_verification_token(
        &self,
        _token: &VerificationToken,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(None)
    }

    async fn save(&self, account: &Account) -> Result<Account, AccountRepositoryError> {
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn fixture_lookups_miss() {
        let repo = FixtureAccountRepository;
        let email = EmailAddress::new("jane@example.com").expect("email");
        let token = VerificationToken::generate();

        assert!(repo.find_by_email(&email).await.expect("lookup").is_none());
        assert!(
            repo.find_by_verification_token(&token)
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[rstest]
    fn duplicate_email_error_names_address() {
        let error = AccountRepositoryError::duplicate_email("jane@example.com");
        assert!(error.to_string().contains("jane@example.com"));
        assert_eq!(error.kind(), "duplicate_email");
    }
}
