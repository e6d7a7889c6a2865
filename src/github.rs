use std::process::Command;

use anyhow::Context;
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    graphql::GraphQLEnvelope,
    types::QueryExecutor,
};

/// `GITHUB_TOKEN`, then `GH_TOKEN`, then `gh auth token`.
pub fn get_github_token() -> anyhow::Result<String> {
    // Prefer environment variables over gh CLI to avoid subprocess overhead.
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        return Ok(token);
    }

    if let Ok(token) = std::env::var("GH_TOKEN") {
        return Ok(token);
    }

    let output = Command::new("gh").args(["auth", "token"]).output()?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

/// GraphQL executor backed by an authenticated octocrab client.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates an authenticated client against `api_base_url` using the
    /// available credentials.
    pub fn connect(api_base_url: &str) -> anyhow::Result<Self> {
        let token = get_github_token().context("Failed to obtain GitHub authentication token")?;
        let client = Octocrab::builder()
            .base_uri(api_base_url)
            .with_context(|| format!("Invalid GitHub API base URL: '{}'", api_base_url))?
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl QueryExecutor for GitHub {
    async fn execute(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let envelope: GraphQLEnvelope = self.client.graphql(&payload).await?;
        unwrap_envelope(envelope)
    }
}

/// Returns the envelope's data, logging any server-reported errors. Errors
/// only fail the call when no data came back with them.
pub fn unwrap_envelope(envelope: GraphQLEnvelope) -> Result<serde_json::Value> {
    let messages: Vec<String> = envelope
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.message)
        .collect();

    for message in &messages {
        warn!(%message, "GraphQL error");
    }

    match envelope.data {
        Some(data) if !data.is_null() => Ok(data),
        _ if !messages.is_empty() => Err(Error::GraphQl { messages }),
        _ => {
            debug!("GraphQL response carried neither data nor errors");
            Err(Error::GraphQl {
                messages: vec!["response missing data".to_string()],
            })
        }
    }
}

/// Extracts the repository name (not `owner/repo`) from a GitHub issue URL:
/// the path segment right before `/issues`. Returns `"unknown"` when the URL
/// does not have that shape.
pub fn extract_repo_name_from_url(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return "unknown".to_string();
    };
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    segments
        .iter()
        .position(|segment| *segment == "issues")
        .filter(|&index| index >= 2)
        .map(|index| segments[index - 1])
        .filter(|name| !name.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}

/// Integer key embedded in an opaque node id such as `PVT_kwDOABCD` or
/// `I_12345`: the second `_`-separated segment. Missing or non-numeric
/// segments give 0.
pub fn numeric_id(node_id: &str) -> u64 {
    node_id
        .split('_')
        .nth(1)
        .and_then(|segment| segment.parse().ok())
        .unwrap_or(0)
}

pub fn parse_repo_from_string(repo: &str) -> anyhow::Result<(&str, &str)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("Repository must be in format 'owner/repo', got: '{}'", repo);
    }
    Ok((parts[0], parts[1]))
}
