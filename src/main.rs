// main.rs

use anyhow::{Context, Result};
use std::{env, path::Path, sync::Arc};

use axum::extract::DefaultBodyLimit;
use tokio::fs;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use cloudfiles::storage_ops::store::{LocalStore, MemoryStore, ObjectStore};
use cloudfiles::{app, AppState};

// --- Main Entry Point ---
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting cloudfiles server...");

    // Choose store implementation
    let store: Arc<dyn ObjectStore> = match env::var("STORE_BACKEND").as_deref() {
        Ok("memory") => {
            info!("Using in-memory object store");
            Arc::new(MemoryStore::new())
        }
        _ => {
            let storage_root =
                Path::new(&env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage_data".into()))
                    .to_path_buf();
            fs::create_dir_all(&storage_root)
                .await
                .context("Failed to create storage root directory")?;
            info!("Using local object store at {}", storage_root.display());
            Arc::new(LocalStore::new(storage_root))
        }
    };

    let state = AppState { store };

    // CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    // Body size limit
    let body_limit = DefaultBodyLimit::max(
        env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10 * 1024 * 1024 * 1024),
    );

    let router = app(state).layer(body_limit).layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind TCP listener")?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router).await.context("Axum server failed")?;
    Ok(())
}
