//! PDF Drawer Storage Library
//!
//! Compressed, versioned persistence of annotations keyed by document
//! identity, with debounced autosave and an inventory of saved documents.

pub mod autosave;
pub mod backend;
pub mod codec;
pub mod error;
pub mod inventory;
pub mod key;
pub mod persistence;

pub use autosave::{AutosaveConfig, AutosaveScheduler, DEFAULT_DEBOUNCE};
pub use backend::{BlobStore, FsBlobStore, MemoryBlobStore, STORE_DIR_ENV};
pub use codec::{decode, encode, has_saved_data, try_decode, CodecConfig, FORMAT_VERSION};
pub use error::{CodecError, StorageError, StorageResult};
pub use inventory::{delete_entry, find_entry, list_entries, InventoryEntry};
pub use key::{parse_storage_key, storage_key, KEY_PREFIX};
pub use persistence::{blob_stats, AnnotationPersistence, StateDump, StorageStats};
