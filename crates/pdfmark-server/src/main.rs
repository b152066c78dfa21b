//! pdfmark upload/export server
//!
//! Stores PDFs posted by the editor and the annotated PNGs it exports.
//!
//! ## Endpoints
//!
//! - `POST /upload`: multipart field `pdf_file`, answers `{ "pdfUrl", "filename" }`
//! - `POST /export`: `{ "image_data": "data:image/png;base64,...", "filename" }`, answers `{ "url" }`
//! - `GET /storage/...`: stored files
//! - `GET /health`

mod config;
mod routes;
mod storage;

use config::ServerConfig;
use routes::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfmark_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = config.bind;
    info!("Storage root: {}", config.storage_root.display());
    info!("Public URL: {}", config.public_base_url);

    let app = routes::router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pdfmark server listening on {}", addr);
    axum::serve(listener, app).await
}
