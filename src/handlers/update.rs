use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Error;
use crate::github::encode_config;
use crate::models::{CallerIdentity, UpdateConfigRequest};
use crate::AppState;

/// POST /config
///
/// Replaces the stored configuration document with the one in the request
/// body, as a new commit conditioned on the revision read within this same
/// request. Authentication and the allow-list have already been checked by
/// the identity middleware.
pub async fn update_config(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    body: String,
) -> Result<Response, Error> {
    // An empty body is treated as `{}` and rejected below for the missing
    // `config` field rather than as a parse error.
    let body = if body.trim().is_empty() {
        "{}".to_string()
    } else {
        body
    };

    let request: UpdateConfigRequest = serde_json::from_str(&body)
        .map_err(|e| Error::BadRequest(format!("invalid JSON body: {}", e)))?;

    let config = match request.config {
        Some(Value::Object(map)) => Value::Object(map),
        _ => return Err(Error::BadRequest("config must be an object".to_string())),
    };

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!("Update {} by {}", state.config.config_path, identity.email)
        });

    // Read the current version token; the write below is conditioned on it.
    // The token never outlives this request.
    let current = state.store.fetch().await?;
    debug!(sha = %current.sha, "conditioning write on current revision");

    let (text, content_b64) = encode_config(&config);
    let commit_body = state.store.commit(&message, &content_b64, &current.sha).await?;
    info!(email = %identity.email, bytes = text.len(), "configuration committed");

    // Relay the store's acknowledgment verbatim; it is the authoritative
    // commit record.
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        commit_body,
    )
        .into_response())
}
