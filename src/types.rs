use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Executes GraphQL documents against the GitHub API.
///
/// Implementations return the response's `data` object. Server-reported
/// GraphQL errors are surfaced as [`Error::GraphQl`](crate::Error::GraphQl)
/// only when no data came back; with partial data they are logged and the
/// data is returned. Transport failures surface as
/// [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str, variables: serde_json::Value)
    -> Result<serde_json::Value>;
}

/// Open/closed state of an issue as reported by GraphQL (`OPEN`, `CLOSED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parent an issue is linked to through GitHub's sub-issue hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub closed: bool,
}

/// Value of the board's Kind field, recognised by its leading word.
///
/// Board options usually carry an emoji suffix (`Epic 🎯`, `Story 📑`), so
/// only the first word is compared, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Epic,
    Story,
    Request,
    Postmortem,
    Operational,
    Other(String),
}

impl Kind {
    pub fn from_field_value(value: &str) -> Self {
        let word = value
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .find(|w| !w.is_empty())
            .unwrap_or_default()
            .to_lowercase();

        match word.as_str() {
            "epic" => Kind::Epic,
            "story" => Kind::Story,
            "request" => Kind::Request,
            "postmortem" => Kind::Postmortem,
            "operational" => Kind::Operational,
            _ => Kind::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Kind::Epic => "Epic",
            Kind::Story => "Story",
            Kind::Request => "Request",
            Kind::Postmortem => "Postmortem",
            Kind::Operational => "Operational",
            Kind::Other(value) => value,
        }
    }

    pub fn is_epic(&self) -> bool {
        matches!(self, Kind::Epic)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Kind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One issue on a project board together with its board field values.
///
/// `item_id` identifies the board item and stays stable when field values
/// change; `issue_id` is the issue's own node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectItem {
    pub item_id: String,
    pub issue_id: String,
    pub issue_number: u64,
    pub title: String,
    pub url: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent: Option<ParentIssue>,
    pub status: Option<String>,
    pub team: Option<String>,
    pub kind: Option<Kind>,
}

/// The part of a [`ProjectItem`] a report row needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub repository: String,
    pub kind: Option<Kind>,
    pub state: IssueState,
    pub parent: Option<ParentIssue>,
    pub item_id: String,
}

/// Report rows partitioned by Kind. Epics never appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    pub roadmap: Vec<ReportIssue>,
    pub customer_work: Vec<ReportIssue>,
    pub operational_work: Vec<ReportIssue>,
    pub other_issues: Vec<ReportIssue>,
}

impl ReportData {
    pub fn total(&self) -> usize {
        self.roadmap.len()
            + self.customer_work.len()
            + self.operational_work.len()
            + self.other_issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All rows in section order.
    pub fn iter(&self) -> impl Iterator<Item = &ReportIssue> {
        self.roadmap
            .iter()
            .chain(&self.customer_work)
            .chain(&self.operational_work)
            .chain(&self.other_issues)
    }
}

/// An issue remembered from the last generated report.
#[derive(Debug, Clone, PartialEq)]
pub struct LastReportEntry {
    pub issue_number: u64,
    pub repository: String,
    pub item_id: String,
    pub kind: Option<Kind>,
}

impl From<&ReportIssue> for LastReportEntry {
    fn from(issue: &ReportIssue) -> Self {
        Self {
            issue_number: issue.number,
            repository: issue.repository.clone(),
            item_id: issue.item_id.clone(),
            kind: issue.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusOption {
    pub id: String,
    pub name: String,
}

/// The board's Status field and its current options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFieldConfig {
    pub field_id: String,
    pub options: Vec<StatusOption>,
}

impl StatusFieldConfig {
    pub fn option_id(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.id.as_str())
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.clone()).collect()
    }
}

/// Single-select options offered by the board's Team and Status fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOptions {
    pub team_options: Vec<String>,
    pub status_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateError {
    pub issue_number: u64,
    pub error: String,
}

/// Outcome of a bulk status update. `success` holds iff nothing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub success: bool,
    pub updated: usize,
    pub failed: usize,
    pub total_issues: usize,
    pub errors: Vec<IssueUpdateError>,
}
