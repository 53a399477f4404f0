//! Argon2id password hashing.
//!
//! Digests are PHC strings (`$argon2id$v=19$...`) carrying their own salt
//! and parameters, so verification needs nothing but the stored digest.
//! Hashing is CPU bound and runs on the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params};
use async_trait::async_trait;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::domain::PasswordDigest;
use crate::domain::ports::{CredentialHasher, CredentialHasherError};

/// Argon2id hasher with configurable cost parameters.
#[derive(Clone, Default)]
pub struct Argon2CredentialHasher {
    params: Params,
}

impl Argon2CredentialHasher {
    /// Hasher with explicit cost parameters. Tests use cheap ones.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }
}

async fn blocking<T, F>(work: F) -> Result<T, CredentialHasherError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CredentialHasherError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| CredentialHasherError::hash(err.to_string()))?
}

#[async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialHasherError> {
        let argon2 = self.argon2();
        let plaintext = Zeroizing::new(plaintext.to_owned());
        let encoded = blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| CredentialHasherError::hash(err.to_string()))
        })
        .await?;
        PasswordDigest::new(encoded).map_err(|err| CredentialHasherError::hash(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, CredentialHasherError> {
        let argon2 = self.argon2();
        let plaintext = Zeroizing::new(plaintext.to_owned());
        let encoded = digest.as_str().to_owned();
        blocking(move || {
            let parsed = PasswordHash::new(&encoded)
                .map_err(|err| CredentialHasherError::malformed_digest(err.to_string()))?;
            match argon2.verify_password(plaintext.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(err) => Err(CredentialHasherError::hash(err.to_string())),
            }
        })
        .await
    }
}
