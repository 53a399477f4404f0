//! Directory-backed profile picture store built on `cap_std`.
//!
//! Keys are relative slash-separated paths below the store root; the public
//! URL of an object is `<public_base_url>/<key>`. All file access goes
//! through a capability handle for the root, so a key can never address a
//! file outside it.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{ProfileImageStore, ProfileImageStoreError};

/// Profile image store writing objects below a local directory.
#[derive(Clone)]
pub struct LocalProfileImageStore {
    root: Arc<Dir>,
    root_path: PathBuf,
    public_base_url: String,
}

impl LocalProfileImageStore {
    /// Open (creating if needed) the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(root: impl AsRef<Path>, public_base_url: impl Into<String>) -> io::Result<Self> {
        let root_path = root.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&root_path, ambient_authority())?;
        let root = Dir::open_ambient_dir(&root_path, ambient_authority())?;
        let public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        Ok(Self {
            root: Arc::new(root),
            root_path,
            public_base_url,
        })
    }

    /// Directory this store writes to.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Public URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, ProfileImageStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, ProfileImageStoreError> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || work(&root))
            .await
            .map_err(|err| ProfileImageStoreError::unavailable(err.to_string()))?
    }
}

fn io_error(key: &str, error: &io::Error) -> ProfileImageStoreError {
    ProfileImageStoreError::io(format!("{key}: {error}"))
}

/// Turn `key` into a relative path, rejecting anything but plain segments.
fn object_path(key: &str) -> Result<PathBuf, ProfileImageStoreError> {
    let plain = !key.is_empty()
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."));
    let path = PathBuf::from(key);
    if plain
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        Ok(path)
    } else {
        Err(ProfileImageStoreError::invalid_key(key))
    }
}

/// Split `prefix` into the folder to scan and the file name prefix to match.
fn split_prefix(prefix: &str) -> Result<(Option<PathBuf>, String), ProfileImageStoreError> {
    match prefix.rsplit_once('/') {
        Some((folder, name)) => Ok((Some(object_path(folder)?), name.to_owned())),
        None => Ok((None, prefix.to_owned())),
    }
}

#[async_trait]
impl ProfileImageStore for LocalProfileImageStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ProfileImageStoreError> {
        let path = object_path(key)?;
        let owned_key = key.to_owned();
        let size = bytes.len();
        self.blocking(move |root| {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                root.create_dir_all(parent)
                    .map_err(|err| io_error(&owned_key, &err))?;
            }
            root.write(&path, &bytes)
                .map_err(|err| io_error(&owned_key, &err))
        })
        .await?;
        debug!(key, size, content_type, "profile image stored");
        Ok(self.url_for(key))
    }

    async fn list_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, ProfileImageStoreError> {
        let (folder, name_prefix) = split_prefix(prefix)?;
        let owned_prefix = prefix.to_owned();
        self.blocking(move |root| {
            let entries = match &folder {
                Some(folder) => root.read_dir(folder),
                None => root.entries(),
            };
            let entries = match entries {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => return Err(io_error(&owned_prefix, &err)),
            };
            let mut keys = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|err| io_error(&owned_prefix, &err))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(&name_prefix) {
                    continue;
                }
                keys.push(match &folder {
                    Some(folder) => format!("{}/{name}", folder.to_string_lossy()),
                    None => name,
                });
            }
            keys.sort();
            keys.truncate(limit);
            Ok(keys)
        })
        .await
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProfileImageStoreError> {
        let path = object_path(key)?;
        let owned_key = key.to_owned();
        self.blocking(move |root| match root.read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&owned_key, &err)),
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), ProfileImageStoreError> {
        let path = object_path(key)?;
        let owned_key = key.to_owned();
        self.blocking(move |root| match root.remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&owned_key, &err)),
        })
        .await?;
        debug!(key, "profile image deleted");
        Ok(())
    }
}
