//! Internal Diesel row structs for the `accounts` table.
//!
//! These types never leave the persistence layer; the repository converts
//! them to and from [`crate::domain::Account`].

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::accounts;

/// Row read back from the accounts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_digest: String,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable record for the first save of an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_digest: &'a str,
    pub verified: bool,
    pub verification_token: Option<&'a str>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub image_key: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Mutable columns rewritten on every later save.
///
/// `None` options are written as SQL `NULL` so a redeemed token or a
/// deleted picture is cleared.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = accounts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AccountChangeset<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_digest: &'a str,
    pub verified: bool,
    pub verification_token: Option<&'a str>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub image_key: Option<&'a str>,
    pub image_url: Option<&'a str>,
}
