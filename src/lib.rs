//! Roadmap reports: tense-aware issue reports from a GitHub project board.
//!
//! Reads every item of an organization's project board, keeps the issues
//! matching a Team and Status, buckets them by their Kind field and renders
//! a Markdown report whose wording follows the status (done, in progress or
//! planned). The issues of the last report can then be moved to another
//! status in bulk, either from the in-memory record or from the citations of
//! a saved report.

pub mod board;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod graphql;
pub mod issue;
pub mod report;
pub mod state;
pub mod types;
pub mod update;

pub use board::Board;
pub use cli::{Command, IssueFormat, ReportMonth, parse_args};
pub use config::Config;
pub use error::{Error, Result};
pub use github::GitHub;
pub use issue::{DetailedIssue, fetch_detailed_issue};
pub use report::{
    CitedIssue, ExampleSampler, FirstSampler, RandomSampler, ReportGenerator, ReportHeading,
    ReportRenderer, Tense, extract_issues_from_report,
};
pub use state::LastReportStore;
pub use types::{
    BoardOptions, BulkUpdateResult, IssueState, IssueUpdateError, Kind, LastReportEntry,
    ParentIssue, ProjectItem, QueryExecutor, ReportData, ReportIssue,
};
pub use update::StatusUpdater;
