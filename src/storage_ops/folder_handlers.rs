use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use tokio_util::io::ReaderStream;

use crate::storage_ops::archive;
use crate::storage_ops::auth::AuthenticatedUser;
use crate::storage_ops::folder_ops::{FileInfo, FolderOps};
use crate::storage_ops::handler_utils::{AppError, MoveQuery, PathQuery, RenameQuery};
use crate::storage_ops::path;
use crate::AppState;

pub async fn create_directory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, "CREATE directory");
    let prefix = path::resolve(user.id, &params.path)?;
    FolderOps::new(state.store.clone())
        .create_folder(&prefix)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn get_directory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<Json<Vec<FileInfo>>, AppError> {
    tracing::info!(user = user.id, path = %params.path, "LIST directory");
    let prefix = path::resolve(user.id, &params.path)?;
    let contents = FolderOps::new(state.store.clone())
        .list_folder(&prefix)
        .await?;
    Ok(Json(contents))
}

pub async fn delete_directory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, "DELETE directory");
    let prefix = path::resolve(user.id, &params.path)?;
    FolderOps::new(state.store.clone())
        .delete_recursive(&prefix)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<MoveQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, from = %params.from, to = %params.to, "MOVE directory");
    let from = path::resolve(user.id, &params.from)?;
    let to = path::resolve(user.id, &params.to)?;
    FolderOps::new(state.store.clone())
        .move_folder(&from, &to)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn rename_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<RenameQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, new_name = %params.new_name, "RENAME directory");
    let from = path::resolve(user.id, &params.path)?;
    FolderOps::new(state.store.clone())
        .rename_folder(&from, &params.new_name)
        .await?;
    Ok(StatusCode::OK)
}

/// Streams the folder subtree as a zip through a bounded in-process pipe so
/// the response starts before the archive is complete. A store error
/// mid-stream drops the write half and truncates the body; the client sees
/// an invalid archive rather than a silently shortened one.
pub async fn download_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<Response, AppError> {
    tracing::info!(user = user.id, path = %params.path, "DOWNLOAD directory as zip");
    let prefix = path::resolve(user.id, &params.path)?;

    let (writer, reader) = tokio::io::duplex(64 * 1024);
    let store = state.store.clone();
    let task_prefix = prefix.clone();
    tokio::spawn(async move {
        if let Err(e) = archive::stream_folder_as_zip(store.as_ref(), &task_prefix, writer).await {
            tracing::error!(folder = %task_prefix, "zip stream failed: {e}");
        }
    });

    let filename = format!("{}.zip", params.path.replace('/', "_"));
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| anyhow::anyhow!("Failed to build response: {e}"))?;
    Ok(response)
}
