use std::sync::Arc;

use crate::storage_ops::handler_utils::AppError;
use crate::storage_ops::path;
use crate::storage_ops::store::{ByteStream, GetResult, ObjectStore, PutOptions};

/// Single-object operations. Everything here is a thin pass-through to the
/// store except move/rename, which have no native primitive and are built
/// from copy-then-delete.
pub struct FileOps {
    store: Arc<dyn ObjectStore>,
}

impl FileOps {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn upload(
        &self,
        key: &str,
        body: ByteStream,
        size: Option<u64>,
        content_type: Option<String>,
    ) -> Result<u64, AppError> {
        let opts = PutOptions {
            content_length: size,
            content_type,
        };
        let written = self.store.put_stream(key, opts, body).await?;
        tracing::info!(key, bytes = written, "uploaded object");
        Ok(written)
    }

    /// The caller owns the returned stream and must drain or drop it on
    /// every exit path; the store connection is held until then.
    pub async fn download(&self, key: &str) -> Result<GetResult, AppError> {
        self.store.get_stream(key).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.store.delete(key).await?;
        tracing::info!(key, "deleted object");
        Ok(())
    }

    /// Copy strictly precedes delete: an interruption can leave the object
    /// at both keys, never at none.
    pub async fn move_object(&self, from: &str, to: &str) -> Result<(), AppError> {
        if from == to {
            return Ok(());
        }
        self.store.copy(from, to).await?;
        self.store.delete(from).await?;
        tracing::info!(from, to, "moved object");
        Ok(())
    }

    /// Moves the object to a sibling key under the same directory prefix.
    pub async fn rename(&self, key: &str, new_name: &str) -> Result<(), AppError> {
        path::validate_name(new_name)?;
        let dir = match key.rfind('/') {
            Some(idx) => &key[..idx + 1],
            None => "",
        };
        let to = format!("{dir}{new_name}");
        self.move_object(key, &to).await
    }
}
