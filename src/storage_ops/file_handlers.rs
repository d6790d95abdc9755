use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, StatusCode},
    response::Response,
};
use futures_util::StreamExt;

use crate::storage_ops::auth::AuthenticatedUser;
use crate::storage_ops::file_ops::FileOps;
use crate::storage_ops::handler_utils::{AppError, MoveQuery, PathQuery, RenameQuery};
use crate::storage_ops::path;
use crate::AppState;

/// A file path must name a single object: non-empty and no trailing
/// delimiter.
fn resolve_file_key(user: AuthenticatedUser, relative: &str) -> Result<String, AppError> {
    if relative.is_empty() || relative.ends_with('/') {
        return Err(AppError::InvalidPath(relative.to_string()));
    }
    path::resolve(user.id, relative)
}

/// Raw-body upload; the transport layer upstream has already dealt with
/// multipart framing. Overwrites any existing object at the key.
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
    req: Request,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, "PUT file");
    let key = resolve_file_key(user, &params.path)?;

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    let body = req
        .into_body()
        .into_data_stream()
        .map(|chunk| chunk.map_err(anyhow::Error::from));

    FileOps::new(state.store.clone())
        .upload(&key, Box::pin(body), content_length, content_type)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn download_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<Response, AppError> {
    tracing::info!(user = user.id, path = %params.path, "GET file");
    let key = resolve_file_key(user, &params.path)?;

    let result = FileOps::new(state.store.clone()).download(&key).await?;
    let filename = params
        .path
        .rsplit('/')
        .next()
        .unwrap_or(params.path.as_str())
        .to_string();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(result.body))
        .map_err(|e| anyhow::anyhow!("Failed to build response: {e}"))?;
    Ok(response)
}

pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, "DELETE file");
    let key = resolve_file_key(user, &params.path)?;
    FileOps::new(state.store.clone()).delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<MoveQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, from = %params.from, to = %params.to, "MOVE file");
    let from = resolve_file_key(user, &params.from)?;
    let to = resolve_file_key(user, &params.to)?;
    FileOps::new(state.store.clone())
        .move_object(&from, &to)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn rename_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<RenameQuery>,
) -> Result<StatusCode, AppError> {
    tracing::info!(user = user.id, path = %params.path, new_name = %params.new_name, "RENAME file");
    let key = resolve_file_key(user, &params.path)?;
    FileOps::new(state.store.clone())
        .rename(&key, &params.new_name)
        .await?;
    Ok(StatusCode::OK)
}
