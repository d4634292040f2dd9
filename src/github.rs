use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use crate::config::Config;
use crate::error::Error;
use crate::models::DocumentSnapshot;
use crate::store::ContentStore;

/// Sent on every outbound call; the GitHub API rejects requests without one.
const USER_AGENT: &str = "config-commit-api";

/// A GitHub repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        match input.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => bail!("invalid repository identifier (expected owner/name): {}", input),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Canonical textual form committed to the repository: pretty-printed JSON
/// with a trailing newline. Byte-for-byte reproducible so repository diffs
/// stay minimal. Returns `(text, base64_of_text)`.
pub fn encode_config(config: &serde_json::Value) -> (String, String) {
    let mut text = serde_json::to_string_pretty(config)
        .expect("JSON value is always serializable");
    text.push('\n');
    let encoded = BASE64.encode(text.as_bytes());
    (text, encoded)
}

/// Shared HTTP client for Contents API requests (connection pooling + timeout).
fn github_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build GitHub client")
    })
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

/// GitHub Contents API implementation of [`ContentStore`].
///
/// Credential and repository are optional so a partially configured
/// deployment fails per request with a misconfiguration error instead of
/// refusing to start.
pub struct GithubContentStore {
    token: Option<String>,
    repo: Option<RepoId>,
    path: String,
    api_base: String,
}

impl GithubContentStore {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token: config.github_token.clone(),
            repo: config.github_repo.clone(),
            path: config.config_path.clone(),
            api_base: config.github_api_base.clone(),
        }
    }

    fn target(&self) -> Result<(&str, &RepoId), Error> {
        match (self.token.as_deref(), self.repo.as_ref()) {
            (Some(token), Some(repo)) => Ok((token, repo)),
            _ => Err(Error::Misconfigured(
                "missing GITHUB_TOKEN or GITHUB_REPO".to_string(),
            )),
        }
    }

    fn contents_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, repo.owner, repo.name, self.path
        )
    }
}

#[async_trait]
impl ContentStore for GithubContentStore {
    async fn fetch(&self) -> Result<DocumentSnapshot, Error> {
        let (token, repo) = self.target()?;

        let response = github_client()
            .get(self.contents_url(repo))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GitHub read request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamRead {
                path: self.path.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let current: ContentsResponse = response.json().await.map_err(|e| {
            Error::Upstream(format!("failed to parse GitHub contents response: {}", e))
        })?;
        tracing::debug!(repo = %repo, path = %self.path, sha = %current.sha, "fetched current document");

        Ok(DocumentSnapshot {
            content: current.content,
            sha: current.sha,
        })
    }

    async fn commit(
        &self,
        message: &str,
        content_b64: &str,
        sha: &str,
    ) -> Result<String, Error> {
        let (token, repo) = self.target()?;

        let response = github_client()
            .put(self.contents_url(repo))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({
                "message": message,
                "content": content_b64,
                "sha": sha,
            }))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GitHub write request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::UpstreamWrite {
                path: self.path.clone(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(repo = %repo, path = %self.path, "committed new document revision");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_id() {
        let repo = RepoId::parse("alice/project").unwrap();
        assert_eq!(repo.owner, "alice");
        assert_eq!(repo.name, "project");
        assert_eq!(repo.to_string(), "alice/project");
    }

    #[test]
    fn test_parse_repo_id_trims_whitespace() {
        assert_eq!(
            RepoId::parse("  alice/project  ").unwrap(),
            RepoId::parse("alice/project").unwrap()
        );
    }

    #[test]
    fn test_parse_repo_id_rejects_invalid() {
        assert!(RepoId::parse("").is_err());
        assert!(RepoId::parse("no-slash").is_err());
        assert!(RepoId::parse("/project").is_err());
        assert!(RepoId::parse("alice/").is_err());
        assert!(RepoId::parse("alice/project/extra").is_err());
    }

    #[test]
    fn test_encode_config_canonical_form() {
        let (text, _) = encode_config(&serde_json::json!({"x": 1}));
        assert_eq!(text, "{\n  \"x\": 1\n}\n");
    }

    #[test]
    fn test_encode_config_round_trips_byte_for_byte() {
        let (text, encoded) = encode_config(&serde_json::json!({"x": 1}));
        let decoded = BASE64.decode(&encoded).unwrap();
        assert_eq!(decoded, text.as_bytes());
    }

    #[test]
    fn test_contents_url() {
        let store = GithubContentStore {
            token: Some("t".into()),
            repo: Some(RepoId::parse("alice/project").unwrap()),
            path: "config.json".into(),
            api_base: "https://api.github.com".into(),
        };
        let repo = store.repo.clone().unwrap();
        assert_eq!(
            store.contents_url(&repo),
            "https://api.github.com/repos/alice/project/contents/config.json"
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_is_misconfigured() {
        let store = GithubContentStore {
            token: None,
            repo: Some(RepoId::parse("alice/project").unwrap()),
            path: "config.json".into(),
            api_base: "https://api.github.com".into(),
        };
        match store.fetch().await.unwrap_err() {
            Error::Misconfigured(detail) => {
                assert!(detail.contains("GITHUB_TOKEN"));
                assert!(detail.contains("GITHUB_REPO"));
            }
            other => panic!("expected Misconfigured, got {:?}", other),
        }
    }
}
