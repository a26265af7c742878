//! Inventory of every saved document in a store

use crate::backend::BlobStore;
use crate::codec;
use crate::error::StorageResult;
use crate::key::{is_annotation_key, parse_storage_key};
use pdf_drawer_core::{total_strokes, PageAnnotations};
use serde::Serialize;

/// One saved document
#[derive(Debug, Clone, Serialize)]
pub struct InventoryEntry {
    pub key: String,

    /// File name recovered from the key, or the key itself when it does not parse
    pub file_name: String,

    pub byte_size: Option<u64>,

    /// Pages with at least one stroke
    pub page_count: usize,

    pub stroke_count: usize,

    /// Length of the stored blob in characters
    pub encoded_len: usize,

    /// Decoded annotations; `None` when the blob is unreadable
    #[serde(skip)]
    pub annotations: Option<PageAnnotations>,
}

impl InventoryEntry {
    fn from_blob(key: String, blob: &str) -> Self {
        let identity = parse_storage_key(&key);
        let annotations = codec::decode(blob);
        let (page_count, stroke_count) = annotations.as_ref().map_or((0, 0), |a| {
            (a.values().filter(|s| !s.is_empty()).count(), total_strokes(a))
        });

        Self {
            file_name: identity
                .as_ref()
                .map_or_else(|| key.clone(), |id| id.name.clone()),
            byte_size: identity.map(|id| id.byte_size),
            key,
            page_count,
            stroke_count,
            encoded_len: blob.chars().count(),
            annotations,
        }
    }

    /// Entry whose stored blob could not be read at all
    fn unreadable(key: String) -> Self {
        let identity = parse_storage_key(&key);
        Self {
            file_name: identity
                .as_ref()
                .map_or_else(|| key.clone(), |id| id.name.clone()),
            byte_size: identity.map(|id| id.byte_size),
            key,
            page_count: 0,
            stroke_count: 0,
            encoded_len: 0,
            annotations: None,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.annotations.is_some()
    }
}

/// Read one entry; a blob the store cannot return is reported as unreadable
fn read_entry<S: BlobStore + ?Sized>(store: &S, key: &str) -> Option<InventoryEntry> {
    match store.get(key) {
        Ok(blob) => blob.map(|blob| InventoryEntry::from_blob(key.to_string(), &blob)),
        Err(error) => {
            tracing::warn!(key, %error, "saved entry is unreadable");
            Some(InventoryEntry::unreadable(key.to_string()))
        }
    }
}

/// All annotation entries in `store`, ordered by key
///
/// Only a failure to enumerate the store is an error; individual entries
/// that cannot be read are listed as unreadable.
pub fn list_entries<S: BlobStore + ?Sized>(store: &S) -> StorageResult<Vec<InventoryEntry>> {
    Ok(store
        .keys()?
        .into_iter()
        .filter(|key| is_annotation_key(key))
        .filter_map(|key| read_entry(store, &key))
        .collect())
}

/// Look up one entry by key
pub fn find_entry<S: BlobStore + ?Sized>(
    store: &S,
    key: &str,
) -> StorageResult<Option<InventoryEntry>> {
    Ok(read_entry(store, key))
}

/// Delete one entry by key, returning whether it existed
pub fn delete_entry<S: BlobStore + ?Sized>(store: &mut S, key: &str) -> StorageResult<bool> {
    let removed = store.remove(key)?;
    if removed {
        tracing::debug!(key, "deleted saved annotations");
    }
    Ok(removed)
}
