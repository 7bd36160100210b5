/// Aperture Gallery - photo album server
///
/// A self-hosted photo gallery backed by S3-compatible object storage,
/// with album-level access control and an admin-managed upload pipeline.

mod access;
mod api;
mod auth;
mod blob_store;
mod config;
mod context;
mod error;
mod gallery;
mod images;
mod models;
mod server;
mod store;

use config::ServerConfig;
use context::AppContext;
use error::GalleryResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> GalleryResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aperture_gallery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
