use super::{ByteStream, EntryStream, GetResult, ListMode, ObjectEntry, ObjectStore, PutOptions};
use crate::storage_ops::handler_utils::AppError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures_util::StreamExt;
use std::collections::BTreeMap;

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-memory object store. Backs the `memory` backend selection and the
/// integration tests; every operation sees the map's current state, there is
/// no caching in front of it.
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_stream(
        &self,
        key: &str,
        opts: PutOptions,
        mut body: ByteStream,
    ) -> Result<u64, AppError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AppError::Internal)?;
            buf.extend_from_slice(&chunk);
        }
        let total = buf.len() as u64;

        if let Some(expected) = opts.content_length {
            if total != expected {
                return Err(AppError::BadRequest("Content-Length mismatch".into()));
            }
        }

        let content_type = opts
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data: buf.freeze(),
                content_type,
            },
        );
        Ok(total)
    }

    async fn get_stream(&self, key: &str) -> Result<GetResult, AppError> {
        let obj = self
            .objects
            .get(key)
            .map(|e| e.value().clone())
            .ok_or_else(|| AppError::NotFound(key.to_string()))?;

        let len = obj.data.len() as u64;
        let body: ByteStream = Box::pin(futures_util::stream::once(async move { Ok(obj.data) }));
        Ok(GetResult {
            content_length: len,
            content_type: obj.content_type,
            body,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.remove(key);
        Ok(())
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), AppError> {
        let obj = self
            .objects
            .get(src)
            .map(|e| e.value().clone())
            .ok_or_else(|| AppError::NotFound(src.to_string()))?;
        self.objects.insert(dst.to_string(), obj);
        Ok(())
    }

    async fn list(&self, prefix: &str, mode: ListMode) -> Result<EntryStream, AppError> {
        // Project the flat key set into entries up front; the map is the
        // source of truth and the snapshot is taken at call time.
        let mut entries: BTreeMap<String, ObjectEntry> = BTreeMap::new();

        for item in self.objects.iter() {
            let key = item.key();
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };

            match mode {
                ListMode::Recursive => {
                    entries.insert(
                        key.clone(),
                        ObjectEntry {
                            key: key.clone(),
                            size: item.value().data.len() as u64,
                            is_prefix: false,
                        },
                    );
                }
                ListMode::Shallow => {
                    if let Some(pos) = rest.find('/') {
                        if !rest[..pos].is_empty() {
                            // Deeper key: report the next segment as a
                            // common prefix.
                            let common = format!("{}{}/", prefix, &rest[..pos]);
                            entries.insert(
                                common.clone(),
                                ObjectEntry {
                                    key: common,
                                    size: 0,
                                    is_prefix: true,
                                },
                            );
                            continue;
                        }
                    }
                    // Direct child, or the prefix's own folder marker.
                    entries.insert(
                        key.clone(),
                        ObjectEntry {
                            key: key.clone(),
                            size: item.value().data.len() as u64,
                            is_prefix: false,
                        },
                    );
                }
            }
        }

        let stream = futures_util::stream::iter(entries.into_values().map(anyhow::Ok));
        Ok(Box::pin(stream))
    }
}
