use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use futures_util::io::AsyncWriteExt;
use futures_util::StreamExt;

use crate::storage_ops::handler_utils::AppError;
use crate::storage_ops::store::{ListMode, ObjectStore};

fn zip_error(e: async_zip::error::ZipError) -> AppError {
    AppError::Internal(anyhow::Error::new(e).context("zip write failed"))
}

/// Streams every object under `folder` into `sink` as a zip archive, one
/// entry per object, named by the key with the folder prefix stripped.
/// Object bytes are copied chunk by chunk straight into the archive; neither
/// the tree nor any single object is buffered whole. The first failed
/// sub-operation aborts the stream and leaves the archive truncated; there
/// is no partial-archive recovery.
pub async fn stream_folder_as_zip<W>(
    store: &dyn ObjectStore,
    folder: &str,
    sink: W,
) -> Result<(), AppError>
where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    let prefix = if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    };

    let mut zip = ZipFileWriter::with_tokio(sink);
    let mut entries = store.list(&prefix, ListMode::Recursive).await?;

    let mut archived = 0u64;
    while let Some(next) = entries.next().await {
        let entry =
            next.map_err(|e| AppError::StoreUnavailable(format!("listing failed: {e}")))?;
        // Folder markers carry no bytes.
        if entry.is_prefix || entry.key.ends_with('/') {
            continue;
        }

        let name = entry.key[prefix.len()..].to_string();
        let builder = ZipEntryBuilder::new(name.into(), Compression::Deflate);
        let mut entry_writer = zip.write_entry_stream(builder).await.map_err(zip_error)?;

        let mut body = store.get_stream(&entry.key).await?.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AppError::Internal)?;
            entry_writer.write_all(&chunk).await?;
        }
        entry_writer.close().await.map_err(zip_error)?;
        archived += 1;
    }

    zip.close().await.map_err(zip_error)?;
    tracing::info!(folder = %prefix, archived, "streamed folder as zip");
    Ok(())
}
