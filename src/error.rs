use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every failure mode of the update pipeline. Each stage fails fast with one
/// of these; nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unauthorized (login required)")]
    Unauthenticated,

    #[error("Forbidden (not allowed)")]
    Forbidden,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    /// The remote store rejected the read. Upstream status and body are
    /// forwarded verbatim for diagnosability.
    #[error("Failed to read {path}: {status} {body}")]
    UpstreamRead {
        path: String,
        status: u16,
        body: String,
    },

    /// The remote store rejected the conditional write. Covers stale version
    /// tokens (the store's 409) as well as any other write error.
    #[error("Failed to update {path}: {status} {body}")]
    UpstreamWrite {
        path: String,
        status: u16,
        body: String,
    },

    /// Last-resort bucket: transport failures and anything else the pipeline
    /// did not anticipate.
    #[error("Error: {0}")]
    Upstream(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Misconfigured(_)
            | Error::UpstreamRead { .. }
            | Error::UpstreamWrite { .. }
            | Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_string();

        if status.is_server_error() {
            tracing::error!(%status, "{}", body);
        } else {
            tracing::warn!(%status, "{}", body);
        }

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::BadRequest("config must be an object".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Misconfigured("missing GITHUB_TOKEN or GITHUB_REPO".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_errors_carry_status_and_body() {
        let err = Error::UpstreamRead {
            path: "config.json".into(),
            status: 503,
            body: "upstream exploded".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("upstream exploded"));
        assert!(text.contains("config.json"));
    }
}
