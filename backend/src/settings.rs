//! Service configuration loaded via OrthoConfig.
//!
//! Every field may come from the command line, a configuration file or an
//! `ACCOUNTS_*` environment variable. Unset fields fall back to development
//! defaults through the accessor methods.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DEFAULT_VERIFICATION_TOPIC;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/accounts";
const DEFAULT_IMAGE_ROOT: &str = "var/profile-images";
const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:8080/images";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Configuration values for the account service binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNTS")]
pub struct AccountSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Directory holding uploaded profile pictures.
    pub image_root: Option<PathBuf>,
    /// Public URL prefix under which stored pictures are served. The default
    /// points at this service's own `/images` route on the default port.
    pub image_base_url: Option<String>,
    /// Topic carried by verification notifications.
    pub verification_topic: Option<String>,
    /// Endpoint receiving verification notifications. Logged only when unset.
    pub webhook_url: Option<Url>,
    /// File holding the session signing key.
    pub session_key_file: Option<PathBuf>,
    /// Generate a throwaway session key when the key file cannot be read.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session: bool,
    /// Send session cookies over plain HTTP as well.
    #[ortho_config(default = false)]
    pub insecure_cookies: bool,
}

impl AccountSettings {
    /// Return the bind address, defaulting to all interfaces on port 8080.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    pub fn image_root(&self) -> &Path {
        self.image_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_IMAGE_ROOT))
    }

    pub fn image_base_url(&self) -> &str {
        self.image_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_BASE_URL)
    }

    pub fn verification_topic(&self) -> &str {
        self.verification_topic
            .as_deref()
            .unwrap_or(DEFAULT_VERIFICATION_TOPIC)
    }

    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SESSION_KEY_FILE))
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        !self.insecure_cookies
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "ACCOUNTS_BIND_ADDR",
        "ACCOUNTS_DATABASE_URL",
        "ACCOUNTS_IMAGE_ROOT",
        "ACCOUNTS_IMAGE_BASE_URL",
        "ACCOUNTS_VERIFICATION_TOPIC",
        "ACCOUNTS_WEBHOOK_URL",
        "ACCOUNTS_SESSION_KEY_FILE",
        "ACCOUNTS_ALLOW_EPHEMERAL_SESSION",
        "ACCOUNTS_INSECURE_COOKIES",
    ];

    fn load_from_empty_args() -> AccountSettings {
        AccountSettings::load_from_iter([OsString::from("account-service")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().port(), DEFAULT_PORT);
        assert_eq!(settings.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(settings.image_root(), Path::new(DEFAULT_IMAGE_ROOT));
        assert_eq!(settings.verification_topic(), DEFAULT_VERIFICATION_TOPIC);
        assert!(settings.webhook_url.is_none());
        assert!(!settings.allow_ephemeral_session);
        assert!(settings.cookie_secure());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ACCOUNTS_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "ACCOUNTS_DATABASE_URL",
                Some("postgres://svc@db:5432/users".to_owned()),
            ),
            ("ACCOUNTS_IMAGE_ROOT", Some("/srv/pictures".to_owned())),
            (
                "ACCOUNTS_IMAGE_BASE_URL",
                Some("https://cdn.example.com/pics".to_owned()),
            ),
            ("ACCOUNTS_VERIFICATION_TOPIC", Some("verify".to_owned())),
            (
                "ACCOUNTS_WEBHOOK_URL",
                Some("https://notify.example.com/hook".to_owned()),
            ),
            ("ACCOUNTS_SESSION_KEY_FILE", Some("/tmp/key".to_owned())),
            ("ACCOUNTS_ALLOW_EPHEMERAL_SESSION", Some("true".to_owned())),
            ("ACCOUNTS_INSECURE_COOKIES", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.database_url(), "postgres://svc@db:5432/users");
        assert_eq!(settings.image_root(), Path::new("/srv/pictures"));
        assert_eq!(settings.image_base_url(), "https://cdn.example.com/pics");
        assert_eq!(settings.verification_topic(), "verify");
        assert_eq!(
            settings.webhook_url.as_ref().map(Url::as_str),
            Some("https://notify.example.com/hook")
        );
        assert_eq!(settings.session_key_file(), Path::new("/tmp/key"));
        assert!(settings.allow_ephemeral_session);
        assert!(!settings.cookie_secure());
    }
}
