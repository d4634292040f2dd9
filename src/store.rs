use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::sync::Mutex;

use crate::error::Error;
use crate::models::DocumentSnapshot;

/// Seam to the remote version-controlled store.
///
/// `fetch` reads the current document and its version token; `commit`
/// submits a conditional write that the store accepts only if `sha` still
/// matches its current token. The store itself enforces the compare-and-swap;
/// callers never pass a token obtained outside the current request.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self) -> Result<DocumentSnapshot, Error>;

    /// On success returns the store's raw acknowledgment body, relayed to the
    /// caller verbatim.
    async fn commit(&self, message: &str, content_b64: &str, sha: &str)
        -> Result<String, Error>;
}

struct DocumentState {
    content: String,
    sha: String,
    revision: u64,
    last_message: Option<String>,
}

/// In-process stand-in for the remote store, with the same conditional-write
/// behavior: a commit carrying a stale sha fails the way a stale Contents API
/// write does (409, body forwarded).
pub struct MemoryContentStore {
    path: String,
    state: Mutex<DocumentState>,
    fetches: AtomicUsize,
    commits: AtomicUsize,
    read_failure: Option<(u16, String)>,
}

impl MemoryContentStore {
    pub fn new(content: &str) -> Self {
        Self {
            path: "config.json".to_string(),
            state: Mutex::new(DocumentState {
                content: content.to_string(),
                sha: Self::sha_for(1),
                revision: 1,
                last_message: None,
            }),
            fetches: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            read_failure: None,
        }
    }

    /// Make every `fetch` fail with the given upstream status and body.
    pub fn with_read_failure(status: u16, body: &str) -> Self {
        Self {
            read_failure: Some((status, body.to_string())),
            ..Self::new("{}")
        }
    }

    fn sha_for(revision: u64) -> String {
        format!("{:040x}", revision)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn current_sha(&self) -> String {
        self.state.lock().await.sha.clone()
    }

    pub async fn current_content(&self) -> String {
        self.state.lock().await.content.clone()
    }

    pub async fn last_message(&self) -> Option<String> {
        self.state.lock().await.last_message.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self) -> Result<DocumentSnapshot, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some((status, body)) = &self.read_failure {
            return Err(Error::UpstreamRead {
                path: self.path.clone(),
                status: *status,
                body: body.clone(),
            });
        }

        let state = self.state.lock().await;
        Ok(DocumentSnapshot {
            content: BASE64.encode(state.content.as_bytes()),
            sha: state.sha.clone(),
        })
    }

    async fn commit(
        &self,
        message: &str,
        content_b64: &str,
        sha: &str,
    ) -> Result<String, Error> {
        self.commits.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().await;
        if state.sha != sha {
            return Err(Error::UpstreamWrite {
                path: self.path.clone(),
                status: 409,
                body: format!(r#"{{"message":"{} does not match {}"}}"#, self.path, state.sha),
            });
        }

        let bytes = BASE64
            .decode(content_b64)
            .map_err(|e| Error::Upstream(format!("invalid base64 content: {}", e)))?;
        state.content = String::from_utf8_lossy(&bytes).into_owned();
        state.revision += 1;
        state.sha = Self::sha_for(state.revision);
        state.last_message = Some(message.to_string());

        Ok(serde_json::json!({
            "content": { "path": self.path, "sha": state.sha },
            "commit": { "sha": format!("commit-{}", state.revision), "message": message },
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_with_current_sha_advances_revision() {
        let store = MemoryContentStore::new("{}");
        let snapshot = store.fetch().await.unwrap();

        let body = store
            .commit("update", &BASE64.encode(b"{\n  \"x\": 1\n}\n"), &snapshot.sha)
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["commit"]["message"], "update");
        assert_ne!(store.current_sha().await, snapshot.sha);
        assert_eq!(store.current_content().await, "{\n  \"x\": 1\n}\n");
    }

    #[tokio::test]
    async fn test_commit_with_stale_sha_is_rejected() {
        let store = MemoryContentStore::new("{}");
        let stale = store.fetch().await.unwrap().sha;

        store
            .commit("first", &BASE64.encode(b"{}\n"), &stale)
            .await
            .unwrap();

        let err = store
            .commit("second", &BASE64.encode(b"{}\n"), &stale)
            .await
            .unwrap_err();
        match err {
            Error::UpstreamWrite { status, .. } => assert_eq!(status, 409),
            other => panic!("expected UpstreamWrite, got {:?}", other),
        }
    }
}
