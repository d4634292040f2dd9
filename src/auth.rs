use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::CallerIdentity;
use crate::AppState;

/// Email claim forwarded by the identity-aware gateway. The gateway
/// authenticates the caller; this service trusts the header it sets.
pub const IDENTITY_HEADER: &str = "x-auth-request-email";

/// Access control for the update endpoint: authentication first, then the
/// optional allow-list. Runs before any other work; on success the caller
/// identity is stored in request extensions for the handler.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let email = req
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);

    let Some(email) = email else {
        warn!("request without authenticated identity");
        return Err(Error::Unauthenticated);
    };

    if !is_allowed(&email, &state.config.allowed_emails) {
        warn!(email = %email, "caller not on allow-list");
        return Err(Error::Forbidden);
    }

    debug!(email = %email, "caller authorized");
    req.extensions_mut().insert(CallerIdentity { email });

    Ok(next.run(req).await)
}

/// Empty allow-list means any authenticated caller is authorized.
pub fn is_allowed(email: &str, allow_list: &[String]) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|allowed| allowed == email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_admits_anyone() {
        assert!(is_allowed("anyone@example.com", &[]));
    }

    #[test]
    fn test_member_is_allowed() {
        let list = vec!["alice@example.com".to_string(), "bob@example.com".to_string()];
        assert!(is_allowed("alice@example.com", &list));
        assert!(is_allowed("bob@example.com", &list));
    }

    #[test]
    fn test_non_member_is_denied() {
        let list = vec!["alice@example.com".to_string()];
        assert!(!is_allowed("mallory@example.com", &list));
        assert!(!is_allowed("", &list));
    }
}
