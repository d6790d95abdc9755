use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::storage_ops::handler_utils::AppError;
use crate::storage_ops::path;
use crate::storage_ops::store::{ListMode, ObjectStore, PutOptions};

pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a directory listing. `path` is relative to the user root,
/// `size` is null for directories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

fn normalize_dir(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn list_error(e: anyhow::Error) -> AppError {
    AppError::StoreUnavailable(format!("listing failed: {e}"))
}

/// Directory semantics synthesized over the flat key space. A directory is a
/// derived view over a key prefix; the only stored artifact is an optional
/// zero-byte marker for otherwise-empty folders. Multi-object operations are
/// not atomic and not isolated from concurrent writers.
pub struct FolderOps {
    store: Arc<dyn ObjectStore>,
}

impl FolderOps {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Puts the zero-byte folder marker. Re-creating an existing folder
    /// overwrites the marker and is a no-op in effect.
    pub async fn create_folder(&self, folder: &str) -> Result<(), AppError> {
        let prefix = normalize_dir(folder);
        let opts = PutOptions {
            content_length: Some(0),
            content_type: Some(DIRECTORY_CONTENT_TYPE.to_string()),
        };
        self.store
            .put_stream(&prefix, opts, Box::pin(futures_util::stream::empty()))
            .await?;
        tracing::info!(folder = %prefix, "created folder");
        Ok(())
    }

    /// One level only: delimiter-bounded listing projected into `FileInfo`
    /// rows. Order is whatever the store returns.
    pub async fn list_folder(&self, folder: &str) -> Result<Vec<FileInfo>, AppError> {
        let prefix = normalize_dir(folder);
        let mut entries = self.store.list(&prefix, ListMode::Shallow).await?;

        let mut items = Vec::new();
        while let Some(next) = entries.next().await {
            let entry = next.map_err(list_error)?;
            // The folder's own marker comes back from the listing; skip it.
            if entry.key == prefix {
                continue;
            }
            let is_dir = entry.is_prefix || entry.key.ends_with('/');
            let trimmed = entry.key.strip_suffix('/').unwrap_or(&entry.key);
            let name = trimmed[prefix.len()..].to_string();
            if name.is_empty() {
                continue;
            }
            // Path relative to the user root: the key minus its first
            // segment.
            let relative = trimmed.splitn(2, '/').nth(1).unwrap_or("").to_string();
            items.push(FileInfo {
                path: relative,
                name,
                size: if is_dir { None } else { Some(entry.size) },
                kind: if is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            });
        }
        Ok(items)
    }

    /// Deletes every key under the prefix, one at a time. A key that fails
    /// to delete is recorded and the loop keeps going; already-deleted keys
    /// stay deleted and the failures come back as `PartialFailure`.
    pub async fn delete_recursive(&self, folder: &str) -> Result<(), AppError> {
        let prefix = normalize_dir(folder);
        let mut entries = self.store.list(&prefix, ListMode::Recursive).await?;

        let mut deleted = 0u64;
        let mut failed: Vec<String> = Vec::new();
        while let Some(next) = entries.next().await {
            let entry = next.map_err(list_error)?;
            match self.store.delete(&entry.key).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(key = %entry.key, "delete failed: {e}");
                    failed.push(entry.key);
                }
            }
        }

        tracing::info!(folder = %prefix, deleted, failed = failed.len(), "recursive delete");
        if failed.is_empty() {
            Ok(())
        } else {
            Err(AppError::PartialFailure(failed))
        }
    }

    /// Moves the folder *into* `to`, keeping its own name as the last
    /// segment, e.g. `move_folder("a/b", "z")` yields keys under `z/b/`.
    pub async fn move_folder(&self, from: &str, to: &str) -> Result<(), AppError> {
        let from = normalize_dir(from);
        let to = normalize_dir(to);

        let trimmed = &from[..from.len() - 1];
        let folder_name = match trimmed.rfind('/') {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        };
        let target_base = format!("{to}{folder_name}/");

        self.relocate(&from, &target_base).await
    }

    /// Renames the folder in place under its parent prefix.
    pub async fn rename_folder(&self, folder: &str, new_name: &str) -> Result<(), AppError> {
        path::validate_name(new_name)?;
        let from = normalize_dir(folder);

        let trimmed = &from[..from.len() - 1];
        let parent = match trimmed.rfind('/') {
            Some(idx) => &from[..idx + 1],
            // A prefix with no parent segment has nowhere to be renamed to.
            None => return Err(AppError::InvalidPath(folder.to_string())),
        };
        let target_base = format!("{parent}{new_name}/");

        self.relocate(&from, &target_base).await
    }

    /// Relabels every key under `from` to the same suffix under
    /// `target_base`, copying strictly before deleting so an interrupted run
    /// can duplicate data but never lose it. The first failed sub-operation
    /// aborts the remainder.
    async fn relocate(&self, from: &str, target_base: &str) -> Result<(), AppError> {
        if target_base == from {
            return Ok(());
        }
        if target_base.starts_with(from) {
            // Copying a subtree under itself would feed the copies back into
            // the loop's own key space.
            return Err(AppError::InvalidPath(format!(
                "cannot move {from} into {target_base}"
            )));
        }

        let mut entries = self.store.list(from, ListMode::Recursive).await?;
        let mut moved = 0u64;
        while let Some(next) = entries.next().await {
            let entry = next.map_err(list_error)?;
            let target = format!("{target_base}{}", &entry.key[from.len()..]);
            self.store.copy(&entry.key, &target).await?;
            self.store.delete(&entry.key).await?;
            moved += 1;
        }

        tracing::info!(from, to = target_base, moved, "relocated folder");
        Ok(())
    }
}
