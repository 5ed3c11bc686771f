//! Durable blob store on the local filesystem
//!
//! Layout: `<root>/<cache>/<hex(sha256(key))>`. Digest file names keep
//! arbitrary keys (URLs with `/`, `?`, long query strings) filesystem-safe at
//! a fixed length. Every file starts with a key header, a `u32` big-endian
//! length followed by the key bytes, so `list` can recover the original key.
//! Writes land in a temp file inside the cache directory and are renamed over
//! the target, so readers never see a partial entry.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tidepool_core::BlobStore;
use tidepool_domain::{is_valid_cache_name, StoreError};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::errors::IntoStoreError;

/// Longest key the store accepts
pub const MAX_KEY_BYTES: usize = 64 * 1024;

const KEY_LENGTH_PREFIX_BYTES: usize = 4;
const FILE_NAME_LEN: usize = 64;

/// `BlobStore` rooted at a directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the store directory; it is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, cache: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_cache_name(cache) {
            return Err(StoreError::Io(format!("invalid cache name '{cache}'")));
        }
        Ok(self.root.join(cache))
    }

    fn entry_path(&self, cache: &str, key: &str) -> Result<PathBuf, StoreError> {
        Ok(self.cache_dir(cache)?.join(file_name(key)))
    }
}

fn file_name(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn is_entry_file_name(name: &str) -> bool {
    name.len() == FILE_NAME_LEN && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn encode_entry(key: &str, value: &[u8]) -> Result<Vec<u8>, StoreError> {
    if key.len() > MAX_KEY_BYTES {
        return Err(StoreError::Io(format!(
            "key of {} bytes exceeds the {MAX_KEY_BYTES}-byte limit",
            key.len()
        )));
    }
    // Bounded by MAX_KEY_BYTES above
    let key_len = u32::try_from(key.len()).unwrap_or(u32::MAX);

    let mut bytes = Vec::with_capacity(KEY_LENGTH_PREFIX_BYTES + key.len() + value.len());
    bytes.extend_from_slice(&key_len.to_be_bytes());
    bytes.extend_from_slice(key.as_bytes());
    bytes.extend_from_slice(value);
    Ok(bytes)
}

/// Length of the key stored in a file header, if it is sane
fn key_length(prefix: [u8; KEY_LENGTH_PREFIX_BYTES]) -> Option<usize> {
    usize::try_from(u32::from_be_bytes(prefix)).ok().filter(|len| *len <= MAX_KEY_BYTES)
}

/// Split a stored file into its key and value
fn decode_entry(mut bytes: Vec<u8>) -> Option<(String, Vec<u8>)> {
    let prefix = bytes.get(..KEY_LENGTH_PREFIX_BYTES)?.try_into().ok()?;
    let header_len = KEY_LENGTH_PREFIX_BYTES + key_length(prefix)?;
    if bytes.len() < header_len {
        return None;
    }

    let value = bytes.split_off(header_len);
    let key = String::from_utf8(bytes.split_off(KEY_LENGTH_PREFIX_BYTES)).ok()?;
    Some((key, value))
}

/// Read only the key header of the file at `path`
async fn read_key(path: &Path) -> std::io::Result<Option<String>> {
    let mut file = fs::File::open(path).await?;
    let mut prefix = [0u8; KEY_LENGTH_PREFIX_BYTES];
    file.read_exact(&mut prefix).await?;
    let Some(len) = key_length(prefix) else {
        return Ok(None);
    };

    let mut key = vec![0u8; len];
    file.read_exact(&mut key).await?;
    Ok(String::from_utf8(key).ok())
}

fn persist(dir: &Path, target: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(value)?;
    temp_file.as_file().sync_data()?;
    temp_file.persist(target).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(cache, key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into_store_error()),
        };

        match decode_entry(bytes) {
            Some((stored_key, value)) if stored_key == key => Ok(Some(value)),
            Some((stored_key, _)) => {
                warn!(cache, key, stored_key = %stored_key, "Digest collision; treating as miss");
                Ok(None)
            }
            None => Err(StoreError::Corrupt {
                key: key.to_string(),
                message: "truncated key header".to_string(),
            }),
        }
    }

    async fn put(&self, cache: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let dir = self.cache_dir(cache)?;
        let target = self.entry_path(cache, key)?;
        let bytes = encode_entry(key, &value)?;

        fs::create_dir_all(&dir).await.map_err(IntoStoreError::into_store_error)?;

        tokio::task::spawn_blocking(move || persist(&dir, &target, &bytes))
            .await
            .map_err(|err| StoreError::Io(format!("write task failed: {err}")))?
            .map_err(IntoStoreError::into_store_error)?;

        debug!(cache, key, "Blob persisted");
        Ok(())
    }

    async fn delete(&self, cache: &str, key: &str) -> Result<bool, StoreError> {
        let path = self.entry_path(cache, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into_store_error()),
        }
    }

    async fn list(&self, cache: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.cache_dir(cache)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into_store_error()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(IntoStoreError::into_store_error)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Leftover temp files from an interrupted write
            if !is_entry_file_name(name) {
                warn!(cache, file = name, "Ignoring foreign file in cache directory");
                continue;
            }

            match read_key(&entry.path()).await {
                Ok(Some(key)) => keys.push(key),
                Ok(None) => warn!(cache, file = name, "Ignoring file with corrupt key header"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!(cache, file = name, error = %err, "Unreadable cache file"),
            }
        }

        keys.sort();
        Ok(keys)
    }
}
