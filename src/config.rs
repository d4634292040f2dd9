use crate::github::RepoId;

#[derive(Clone)]
pub struct Config {
    // HTTP server
    pub host: String,
    pub port: u16,

    // Remote store target. Both are required to serve updates, but their
    // absence is a per-request 500, not a startup failure, so a partially
    // configured deployment still answers health checks.
    pub github_token: Option<String>,
    pub github_repo: Option<RepoId>,
    /// File path within the repository.
    pub config_path: String,
    /// Contents API base URL. Overridable for GitHub Enterprise.
    pub github_api_base: String,

    // Auth
    /// Empty list means any authenticated caller is authorized.
    pub allowed_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let github_repo = match std::env::var("GITHUB_REPO") {
            Ok(raw) if !raw.trim().is_empty() => Some(RepoId::parse(&raw)?),
            _ => None,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            github_repo,
            config_path: std::env::var("CONFIG_PATH")
                .unwrap_or_else(|_| "config.json".to_string()),
            github_api_base: std::env::var("GITHUB_API_BASE")
                .unwrap_or_else(|_| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),

            allowed_emails: parse_list(
                &std::env::var("ALLOWED_EMAILS").unwrap_or_default(),
            ),
        })
    }
}

/// Parse a comma-separated env value into a list, trimming whitespace and
/// dropping empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empties() {
        assert_eq!(
            parse_list("alice@example.com, bob@example.com ,,"),
            vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
        );
    }

    #[test]
    fn test_parse_list_empty_input() {
        assert!(parse_list("").is_empty());
        assert!(parse_list("  ,  ").is_empty());
    }
}
