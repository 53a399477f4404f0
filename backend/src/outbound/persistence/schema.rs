//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `migrations/` exactly. Regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` carries a unique index; `verification_token` is indexed for
    /// the verification lookup.
    accounts (id) {
        id -> Uuid,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Varchar,
        password_digest -> Varchar,
        verified -> Bool,
        verification_token -> Nullable<Varchar>,
        verification_expires_at -> Nullable<Timestamptz>,
        image_key -> Nullable<Varchar>,
        image_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
