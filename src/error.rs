//! Error taxonomy for board queries, report generation and status updates.

use thiserror::Error;

/// Errors raised by the report pipeline.
///
/// Per-issue failures during a bulk status update are not raised through this
/// type; they are collected into
/// [`BulkUpdateResult`](crate::types::BulkUpdateResult) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("GitHub transport error: {0}")]
    Transport(#[from] octocrab::Error),

    #[error("GraphQL error: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("unexpected GraphQL response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("project '{title}' not found in organization '{organization}'")]
    ProjectNotFound { organization: String, title: String },

    #[error("project '{project}' has no single-select 'Status' field")]
    StatusFieldNotFound { project: String },

    #[error("status option '{status}' not found\n  hint: available options are: {}", available.join(", "))]
    StatusOptionNotFound {
        status: String,
        available: Vec<String>,
    },

    #[error("issue {owner}/{repo}#{number} not found")]
    IssueNotFound {
        owner: String,
        repo: String,
        number: u64,
    },

    #[error("invalid month {month} (expected 1-12)")]
    InvalidMonth { month: u32 },

    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
