//! Session signing key loading.

use actix_web::cookie::Key;
use std::path::{Path, PathBuf};
use tracing::warn;
use zeroize::Zeroizing;

/// Shortest key file accepted for deriving the cookie key.
pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Errors raised while loading the session key.
#[derive(thiserror::Error, Debug)]
pub enum SessionKeyError {
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file exists but holds too few bytes.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Load the cookie signing key from `path`.
///
/// An unreadable file falls back to a throwaway key when `allow_ephemeral`
/// is set or in debug builds; sessions then end with the process. A file
/// shorter than [`SESSION_KEY_MIN_LEN`] is always an error.
pub fn load_session_key(path: &Path, allow_ephemeral: bool) -> Result<Key, SessionKeyError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(source) if allow_ephemeral || cfg!(debug_assertions) => {
            warn!(path = %path.display(), error = %source, "using temporary session key");
            return Ok(Key::generate());
        }
        Err(source) => {
            return Err(SessionKeyError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionKeyError::TooShort {
            path: path.to_path_buf(),
            length: bytes.len(),
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    Ok(Key::derive_from(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn key_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents).expect("write key");
        file
    }

    #[rstest]
    fn derives_the_same_key_from_the_same_file() {
        let file = key_file(&[b'k'; SESSION_KEY_MIN_LEN]);

        let first = load_session_key(file.path(), false).expect("key");
        let second = load_session_key(file.path(), false).expect("key");

        assert_eq!(first.master(), second.master());
    }

    #[rstest]
    fn short_files_are_rejected_even_when_ephemeral_keys_are_allowed() {
        let file = key_file(b"short");

        match load_session_key(file.path(), true) {
            Err(SessionKeyError::TooShort { length, min_len, .. }) => {
                assert_eq!(length, 5);
                assert_eq!(min_len, SESSION_KEY_MIN_LEN);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("short key file must be rejected"),
        }
    }

    #[rstest]
    fn missing_file_falls_back_when_allowed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent");

        assert!(load_session_key(&missing, true).is_ok());
    }
}
