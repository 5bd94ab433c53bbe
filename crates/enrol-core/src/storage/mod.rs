//! # Storage
//!
//! The two persistence paths of the wizard, kept apart on purpose:
//! - `KeyValueStore`: small, synchronous, string records (the form aggregate)
//! - `BlobStore`: large binary records (the document bundle), backed by redb

mod blob;
mod kv;

pub use blob::{BlobStore, MemoryBlobStore, RedbBlobStore};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
