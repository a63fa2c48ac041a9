use std::path::PathBuf;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::config::AppConfig;
use server::database::init_db;
use server::identity::HttpIdentityVerifier;
use server::scan::VirusTotalScanner;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::load()?);
    tracing::info!("configuration loaded");

    let db = init_db(&config.database.url).await?;
    tracing::info!("database initialized");

    let blob_store = FilesystemBlobStore::new(
        PathBuf::from(&config.storage.path),
        config.storage.max_blob_size,
    )
    .await?;

    let state = AppState {
        db,
        config: config.clone(),
        blob_store: Arc::new(blob_store),
        scanner: Arc::new(VirusTotalScanner::new(&config.scan)),
        identity: Arc::new(HttpIdentityVerifier::new(
            config.auth.identity_verify_url.clone(),
        )),
    };

    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
