//! Key/value stores for encoded annotation blobs

use crate::error::{StorageError, StorageResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the filesystem store location
pub const STORE_DIR_ENV: &str = "PDF_DRAWER_STORE_DIR";

const ENVELOPE_VERSION: u32 = 1;
const ENTRY_EXTENSION: &str = "json";

/// String-keyed blob storage
pub trait BlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn put(&mut self, key: &str, blob: &str) -> StorageResult<()>;

    /// Remove an entry, returning whether it existed
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// All keys, ascending
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: BTreeMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// One file per key under a root directory
///
/// File names are the hex SHA-256 of the key, so every name has the same
/// length whatever the document is called. The key itself lives in the
/// envelope and is read back from there.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobEnvelope {
    version: u32,
    key: String,
    blob: String,
}

impl FsBlobStore {
    pub fn from_default_project() -> StorageResult<Self> {
        let dirs = ProjectDirs::from("dev", "PdfDrawer", "PdfDrawer")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self {
            root: dirs.data_local_dir().join("annotations"),
        })
    }

    /// Root from `PDF_DRAWER_STORE_DIR`, falling back to the project data directory
    pub fn from_env() -> StorageResult<Self> {
        match std::env::var_os(STORE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Ok(Self::with_root(dir)),
            _ => Self::from_default_project(),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(format!("{}.{ENTRY_EXTENSION}", hex::encode(digest)))
    }

    fn read_envelope(path: &Path) -> StorageResult<BlobEnvelope> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope: BlobEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.key != key {
            return Err(StorageError::KeyMismatch {
                path: path.display().to_string(),
                key: key.to_string(),
            });
        }
        if envelope.version != ENVELOPE_VERSION {
            tracing::warn!(key, version = envelope.version, "unknown storage envelope version");
        }
        Ok(Some(envelope.blob))
    }

    fn put(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root)?;

        let envelope = BlobEnvelope {
            version: ENVELOPE_VERSION,
            key: key.to_string(),
            blob: blob.to_string(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        // Write to a temp file first so a crash never leaves a torn entry
        let path = self.entry_path(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension() != Some(OsStr::new(ENTRY_EXTENSION)) {
                continue;
            }
            match Self::read_envelope(&path) {
                Ok(envelope) => keys.push(envelope.key),
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "skipping unreadable store entry"
                    );
                }
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
