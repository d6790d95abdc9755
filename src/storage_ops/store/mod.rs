// store/mod.rs
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

use crate::storage_ops::handler_utils::AppError;

/// Chunked object payload, as produced by uploads and downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

/// Lazy, forward-only listing. Backends may paginate internally; the
/// sequence is consumed once and cannot be restarted.
pub type EntryStream = Pin<Box<dyn Stream<Item = anyhow::Result<ObjectEntry>> + Send>>;

#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    /// Expected payload length; a mismatch fails the upload.
    pub content_length: Option<u64>,
    /// MIME type (e.g. application/json, image/png). Backends may ignore it.
    pub content_type: Option<String>,
}

pub struct GetResult {
    pub content_length: u64,
    pub content_type: String,
    pub body: ByteStream,
}

impl std::fmt::Debug for GetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResult")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// One listing result. `is_prefix` is true for a common-prefix entry of a
/// delimiter-bounded listing, i.e. a directory-like grouping rather than a
/// stored key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub is_prefix: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode {
    /// One path segment under the prefix, with `/` as the delimiter.
    Shallow,
    /// Every key under the prefix.
    Recursive,
}

// ──────────────────────────────────────────────────────
// ObjectStore trait
// ──────────────────────────────────────────────────────
/// Capability boundary over the flat object store. Keys are `/`-separated
/// strings with no leading slash; a trailing slash denotes a folder marker.
/// No operation here is transactional across keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`, overwriting any existing object. Returns
    /// the number of bytes written.
    async fn put_stream(
        &self,
        key: &str,
        opts: PutOptions,
        body: ByteStream,
    ) -> Result<u64, AppError>;

    async fn get_stream(&self, key: &str) -> Result<GetResult, AppError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    async fn copy(&self, src: &str, dst: &str) -> Result<(), AppError>;

    async fn list(&self, prefix: &str, mode: ListMode) -> Result<EntryStream, AppError>;
}

// Re-export implementations
pub use local::LocalStore;
pub use memory::MemoryStore;

mod local;
mod memory;
