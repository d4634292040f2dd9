use serde::Deserialize;
use serde_json::Value;

/// Authenticated caller, as forwarded by the identity-aware gateway.
/// Lives in request extensions for the duration of a single request.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub email: String,
}

/// Body of POST /config.
#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    /// The new configuration document. Must be a JSON object; its internal
    /// shape is the caller's responsibility.
    pub config: Option<Value>,
    /// Optional commit description. Empty string falls back to the
    /// synthesized message.
    pub message: Option<String>,
}

/// The currently stored document as read from the remote store.
///
/// `sha` is the opaque version token the next write must be conditioned on.
/// It is request-scoped: never retain it across requests.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Base64-encoded file content as the Contents API returns it.
    pub content: String,
    pub sha: String,
}
