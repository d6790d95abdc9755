use super::{ByteStream, EntryStream, GetResult, ListMode, ObjectEntry, ObjectStore, PutOptions};
use crate::storage_ops::handler_utils::AppError;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

/// Removes the temp file on drop unless the write was committed.
struct TempGuard {
    path: PathBuf,
    committed: bool,
}

impl TempGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn mark_committed(&mut self) {
        self.committed = true;
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// True only for this store's own in-flight upload files, which are named
/// `{file_name}.{uuid}.tmp`. A user object that merely ends in `.tmp` has no
/// UUID component and must stay visible.
fn is_temp_artifact(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".tmp") else {
        return false;
    };
    match stem.rfind('.') {
        Some(idx) => uuid::Uuid::parse_str(&stem[idx + 1..]).is_ok(),
        None => false,
    }
}

/// Filesystem-backed object store rooted at a configured directory. Keys map
/// to relative paths; a key with a trailing `/` maps to a directory, which
/// doubles as its folder marker. Keys are produced by the path resolver and
/// never contain `..` segments.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn path_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put_stream(
        &self,
        key: &str,
        opts: PutOptions,
        mut body: ByteStream,
    ) -> Result<u64, AppError> {
        let path = self.key_path(key);

        // Folder marker: the directory itself is the marker object.
        if key.ends_with('/') {
            fs::create_dir_all(&path)
                .await
                .context("Failed to create folder marker")?;
            return Ok(0);
        }

        let parent = path.parent().context("Invalid object path")?;
        fs::create_dir_all(parent)
            .await
            .context("Failed to create parent directories")?;

        // Write to a temp file first, then rename into place.
        let file_name = path
            .file_name()
            .context("Invalid object path")?
            .to_string_lossy()
            .into_owned();
        let tmp_path = parent.join(format!("{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
        let file = fs::File::create(&tmp_path)
            .await
            .context("Failed to create temp file")?;
        let mut guard = TempGuard::new(tmp_path.clone());
        let mut writer = BufWriter::with_capacity(256 * 1024, file);

        let mut total_size = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AppError::Internal)?;
            writer.write_all(&chunk).await?;
            total_size += chunk.len() as u64;
        }

        if let Some(expected) = opts.content_length {
            if total_size != expected {
                return Err(AppError::BadRequest("Content-Length mismatch".into()));
            }
        }

        writer.flush().await?;
        fs::rename(&tmp_path, &path)
            .await
            .context("Failed to rename temp file")?;
        guard.mark_committed();

        Ok(total_size)
    }

    async fn get_stream(&self, key: &str) -> Result<GetResult, AppError> {
        let path = self.key_path(key);
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AppError::NotFound(key.to_string())
            } else {
                AppError::Io(e)
            }
        })?;
        let meta = file.metadata().await?;
        if meta.is_dir() {
            return Err(AppError::NotFound(key.to_string()));
        }
        let total = meta.len();

        let stream = async_stream::try_stream! {
            const CHUNK: usize = 4 * 1024 * 1024;
            let mut reader = tokio::io::BufReader::new(file);
            let mut buf = vec![0u8; CHUNK];
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break; // EOF
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(GetResult {
            content_length: total,
            content_type: "application/octet-stream".to_string(),
            body: Box::pin(stream),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.key_path(key);
        let result = if key.ends_with('/') {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), AppError> {
        let dst_path = self.key_path(dst);
        if src.ends_with('/') {
            fs::create_dir_all(&dst_path)
                .await
                .context("Failed to copy folder marker")?;
            return Ok(());
        }

        let src_path = self.key_path(src);
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create copy destination directories")?;
        }
        fs::copy(&src_path, &dst_path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AppError::NotFound(src.to_string())
            } else {
                AppError::Io(e)
            }
        })?;
        Ok(())
    }

    async fn list(&self, prefix: &str, mode: ListMode) -> Result<EntryStream, AppError> {
        let base = self.key_path(prefix);
        let mut entries: Vec<ObjectEntry> = Vec::new();

        match fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            // Absent prefix lists as empty, same as a flat store.
            _ => return Ok(entry_stream(entries)),
        }

        match mode {
            ListMode::Shallow => {
                let mut dir = fs::read_dir(&base).await?;
                while let Some(entry) = dir.next_entry().await? {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if is_temp_artifact(&name) {
                        continue;
                    }
                    let meta = entry.metadata().await?;
                    if meta.is_dir() {
                        entries.push(ObjectEntry {
                            key: format!("{prefix}{name}/"),
                            size: 0,
                            is_prefix: true,
                        });
                    } else {
                        entries.push(ObjectEntry {
                            key: format!("{prefix}{name}"),
                            size: meta.len(),
                            is_prefix: false,
                        });
                    }
                }
                entries.sort_by(|a, b| a.key.cmp(&b.key));
            }
            ListMode::Recursive => {
                let mut files: Vec<ObjectEntry> = Vec::new();
                let mut dir_keys: Vec<String> = vec![prefix.to_string()];
                let mut stack = vec![base.clone()];
                while let Some(dir_path) = stack.pop() {
                    let mut dir = fs::read_dir(&dir_path).await?;
                    while let Some(entry) = dir.next_entry().await? {
                        let path = entry.path();
                        let meta = entry.metadata().await?;
                        if meta.is_dir() {
                            dir_keys.push(format!("{}/", self.path_key(&path)));
                            stack.push(path);
                            continue;
                        }
                        let name = entry.file_name().to_string_lossy().into_owned();
                        if is_temp_artifact(&name) {
                            continue;
                        }
                        files.push(ObjectEntry {
                            key: self.path_key(&path),
                            size: meta.len(),
                            is_prefix: false,
                        });
                    }
                }
                // Files first, then directory markers deepest-first, so a
                // key-at-a-time delete loop clears the whole subtree.
                files.sort_by(|a, b| a.key.cmp(&b.key));
                dir_keys.sort_by(|a, b| b.cmp(a));
                entries = files;
                entries.extend(dir_keys.into_iter().map(|key| ObjectEntry {
                    key,
                    size: 0,
                    is_prefix: false,
                }));
            }
        }

        Ok(entry_stream(entries))
    }
}

fn entry_stream(entries: Vec<ObjectEntry>) -> EntryStream {
    Box::pin(futures_util::stream::iter(
        entries.into_iter().map(anyhow::Ok),
    ))
}
