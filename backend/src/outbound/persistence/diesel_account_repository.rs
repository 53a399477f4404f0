//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! `save` is an upsert on `id`. The database stamps `updated_at` and the
//! unique index on `email` arbitrates concurrent registrations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{AccountRepository, AccountRepositoryError, StoreHealth};
use crate::domain::{
    Account, AccountId, AccountParts, EmailAddress, PasswordDigest, ProfileImage, Timestamps,
    VerificationState, VerificationToken,
};

use super::models::{AccountChangeset, AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

const EMAIL_UNIQUE_INDEX: &str = "accounts_email_key";

/// Diesel-backed implementation of the [`AccountRepository`] port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    AccountRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, email: &str) -> AccountRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info
                .constraint_name()
                .is_none_or(|name| name == EMAIL_UNIQUE_INDEX) =>
        {
            AccountRepositoryError::duplicate_email(email)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            AccountRepositoryError::connection("database connection error")
        }
        DieselError::QueryBuilderError(_) => AccountRepositoryError::query("database query error"),
        _ => AccountRepositoryError::query("database error"),
    }
}

fn corrupt_row(id: uuid::Uuid, reason: impl std::fmt::Display) -> AccountRepositoryError {
    warn!(account_id = %id, %reason, "stored account row is invalid");
    AccountRepositoryError::query(format!("stored account {id} is invalid: {reason}"))
}

fn row_to_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    let id = row.id;
    let email = EmailAddress::new(row.email).map_err(|err| corrupt_row(id, err))?;
    let password_digest =
        PasswordDigest::new(row.password_digest).map_err(|err| corrupt_row(id, err))?;
    let verification = if row.verified {
        VerificationState::Verified
    } else {
        match (row.verification_token, row.verification_expires_at) {
            (Some(token), Some(expires_at)) => VerificationState::Pending {
                token: VerificationToken::new(token).map_err(|err| corrupt_row(id, err))?,
                expires_at,
            },
            _ => return Err(corrupt_row(id, "pending account without token")),
        }
    };
    let image = match (row.image_key, row.image_url) {
        (Some(key), Some(url)) => Some(ProfileImage { key, url }),
        _ => None,
    };
    Ok(Account::from_parts(AccountParts {
        id: AccountId::from_uuid(id),
        first_name: row.first_name,
        last_name: row.last_name,
        email,
        password_digest,
        verification,
        image,
        timestamps: Timestamps::restore(row.created_at, row.updated_at),
    }))
}

fn pending_token(account: &Account) -> (Option<&str>, Option<chrono::DateTime<chrono::Utc>>) {
    match account.verification() {
        VerificationState::Pending { token, expires_at } => (Some(token.as_str()), Some(*expires_at)),
        VerificationState::Verified => (None, None),
    }
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::email.eq(email.as_str()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, email.as_str()))?;
        row.map(row_to_account).transpose()
    }

    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::verification_token.eq(token.as_str()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, ""))?;
        row.map(row_to_account).transpose()
    }

    async fn save(&self, account: &Account) -> Result<Account, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (verification_token, verification_expires_at) = pending_token(account);
        let image = account.image();
        let new_row = NewAccountRow {
            id: *account.id().as_uuid(),
            first_name: account.first_name(),
            last_name: account.last_name(),
            email: account.email().as_str(),
            password_digest: account.password_digest().as_str(),
            verified: account.is_verified(),
            verification_token,
            verification_expires_at,
            image_key: image.map(|image| image.key.as_str()),
            image_url: image.map(|image| image.url.as_str()),
            created_at: account.timestamps().created_at(),
        };
        let changes = AccountChangeset {
            first_name: new_row.first_name,
            last_name: new_row.last_name,
            password_digest: new_row.password_digest,
            verified: new_row.verified,
            verification_token,
            verification_expires_at,
            image_key: new_row.image_key,
            image_url: new_row.image_url,
        };

        let row = diesel::insert_into(accounts::table)
            .values(&new_row)
            .on_conflict(accounts::id)
            .do_update()
            .set((changes, accounts::updated_at.eq(diesel::dsl::now)))
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, account.email().as_str()))?;
        debug!(account_id = %row.id, "account saved");
        row_to_account(row)
    }
}

#[async_trait]
impl StoreHealth for DieselAccountRepository {
    async fn is_reachable(&self) -> bool {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "account store unreachable");
                return false;
            }
        };
        match diesel::sql_query("SELECT 1").execute(&mut conn).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "account store probe failed");
                false
            }
        }
    }
}
