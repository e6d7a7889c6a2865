use std::time::Duration;

pub const DEFAULT_ORGANIZATION: &str = "giantswarm";
pub const DEFAULT_PROJECT_TITLE: &str = "Roadmap";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(100);

/// Where the board lives and how bulk updates are paced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub organization: String,
    pub project_title: String,
    pub api_base_url: String,
    /// Pause between consecutive status mutations, to stay under the API's
    /// secondary rate limits.
    pub update_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            project_title: DEFAULT_PROJECT_TITLE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            update_delay: DEFAULT_UPDATE_DELAY,
        }
    }
}
