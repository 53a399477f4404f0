//! Port for profile picture object storage.
//!
//! Keys are slash-separated paths such as `<accountId>/profilePic.png`. The
//! store owns the mapping from key to public URL.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object store adapters.
    pub enum ProfileImageStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } =>
            "profile image store unavailable: {message}",
        /// The key is not acceptable to the store.
        InvalidKey { key: String } =>
            "invalid object key: {key}",
        /// Reading or writing an object failed.
        Io { message: String } =>
            "profile image store I/O failed: {message}",
    }
}

/// Object storage for profile pictures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileImageStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object, and return
    /// its public URL.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ProfileImageStoreError>;

    /// List at most `limit` keys beginning with `prefix`.
    async fn list_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, ProfileImageStoreError>;

    /// Read the object under `key`; `None` when nothing is stored there.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProfileImageStoreError>;

    /// Delete the object under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), ProfileImageStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_error_quotes_key() {
        let error = ProfileImageStoreError::invalid_key("../escape");
        assert_eq!(error.to_string(), "invalid object key: ../escape");
    }
}
