//! Per-document annotation persistence and diagnostics

use crate::backend::BlobStore;
use crate::codec::{self, CodecConfig};
use crate::error::StorageResult;
use crate::key::storage_key;
use pdf_drawer_core::{has_strokes, DocumentIdentity, PageAnnotations};
use serde::Serialize;

/// Snapshot of what is stored for a document
#[derive(Debug, Clone, Serialize)]
pub struct StateDump {
    pub key: String,

    /// Length of the stored blob in characters; `None` when nothing is stored
    pub raw_len: Option<usize>,

    /// Decoded annotations; `None` when absent or unreadable
    pub annotations: Option<PageAnnotations>,
}

/// Size of a stored blob before and after decompression
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageStats {
    pub compressed_len: usize,

    /// `None` when the blob cannot be decompressed
    pub decompressed_len: Option<usize>,

    /// Fraction of space saved, `1 - compressed / decompressed`
    pub compression_ratio: Option<f64>,
}

/// Loads and saves one document's annotations through a [`BlobStore`]
#[derive(Debug)]
pub struct AnnotationPersistence<S> {
    store: S,
    key: String,
    codec: CodecConfig,
}

impl<S: BlobStore> AnnotationPersistence<S> {
    pub fn new(store: S, identity: &DocumentIdentity, codec: CodecConfig) -> Self {
        Self {
            store,
            key: storage_key(identity),
            codec,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Saved annotations, or `None` when nothing usable is stored
    ///
    /// Unreadable blobs and blobs without a single stroke both count as absent.
    pub fn load(&self) -> Option<PageAnnotations> {
        let blob = match self.store.get(&self.key) {
            Ok(blob) => blob?,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "failed to read saved annotations");
                return None;
            }
        };
        codec::decode(&blob).filter(has_strokes)
    }

    pub fn has_saved_data(&self) -> bool {
        self.load().is_some()
    }

    /// Encode and write `annotations`
    pub fn save(&mut self, annotations: &PageAnnotations) -> StorageResult<()> {
        let blob = codec::encode(annotations, &self.codec)?;
        self.store.put(&self.key, &blob)?;
        tracing::debug!(key = %self.key, len = blob.len(), "saved annotations");
        Ok(())
    }

    pub fn dump_state(&self) -> StorageResult<StateDump> {
        let blob = self.store.get(&self.key)?;
        Ok(StateDump {
            key: self.key.clone(),
            raw_len: blob.as_ref().map(|b| b.chars().count()),
            annotations: blob.as_deref().and_then(codec::decode),
        })
    }

    /// Remove the stored entry, returning whether one existed
    pub fn clear_persisted(&mut self) -> StorageResult<bool> {
        self.store.remove(&self.key)
    }

    /// Compression statistics; `None` when nothing is stored
    pub fn storage_stats(&self) -> StorageResult<Option<StorageStats>> {
        Ok(self.store.get(&self.key)?.map(|blob| blob_stats(&blob)))
    }
}

pub fn blob_stats(blob: &str) -> StorageStats {
    let compressed_len = blob.chars().count();
    let decompressed_len = codec::decompress(blob).ok().map(|json| json.chars().count());
    let compression_ratio = decompressed_len
        .filter(|&len| len > 0)
        .map(|len| 1.0 - compressed_len as f64 / len as f64);

    StorageStats {
        compressed_len,
        decompressed_len,
        compression_ratio,
    }
}
