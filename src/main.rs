use std::sync::Arc;

use tracing::{info, warn};

use config_commit_api::config::Config;
use config_commit_api::github::GithubContentStore;
use config_commit_api::store::ContentStore;
use config_commit_api::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "config_commit_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load config
    let config = Arc::new(Config::from_env()?);
    info!("Config loaded successfully");
    if config.github_token.is_none() || config.github_repo.is_none() {
        warn!("GITHUB_TOKEN or GITHUB_REPO not set; update requests will fail until configured");
    }

    let store: Arc<dyn ContentStore> = Arc::new(GithubContentStore::from_config(&config));
    let state = AppState {
        config: config.clone(),
        store,
    };
    let app = create_router(state);

    // Start HTTP server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Config commit API server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
