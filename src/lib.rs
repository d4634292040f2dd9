pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod handlers;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use config::Config;
use store::ContentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ContentStore>,
}

pub fn create_router(state: AppState) -> Router {
    // The update endpoint sits behind the identity middleware; health does
    // not. Wrong methods on /config get 405 from the method router, after
    // the identity check.
    let protected = Router::new()
        .route("/config", post(handlers::update::update_config))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
