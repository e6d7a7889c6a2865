//! Moving the issues of a report to another board status.

use std::collections::HashMap;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    board::Board,
    config::Config,
    error::{Error, Result},
    fetcher::scan_all,
    github::extract_repo_name_from_url,
    graphql::{UPDATE_ITEM_STATUS_MUTATION, UpdateItemData, decode},
    report::extract_issues_from_report,
    state::LastReportStore,
    types::{
        BulkUpdateResult, IssueUpdateError, Kind, LastReportEntry, ProjectItem, QueryExecutor,
    },
};

pub const EPIC_SKIP_REASON: &str = "Cannot update status for Epic issues";
pub const NO_REPORT_REASON: &str =
    "No issues from the last report to update. Generate a report first.";

/// Applies a status to a set of board items, one mutation at a time.
pub struct StatusUpdater<'a, Q: ?Sized> {
    executor: &'a Q,
    config: &'a Config,
}

impl<'a, Q: QueryExecutor + ?Sized> StatusUpdater<'a, Q> {
    pub fn new(executor: &'a Q, config: &'a Config) -> Self {
        Self { executor, config }
    }

    fn board(&self) -> Board<'a, Q> {
        Board::new(
            self.executor,
            &self.config.organization,
            &self.config.project_title,
        )
    }

    /// Moves every issue of the last generated report to `new_status`.
    ///
    /// Fails only when the board, its Status field or the `new_status`
    /// option cannot be found. Per-issue failures are reported in the
    /// result and do not stop the remaining updates.
    pub async fn update_last_report_issues_status(
        &self,
        store: &LastReportStore,
        new_status: &str,
    ) -> Result<BulkUpdateResult> {
        let entries = store.snapshot();
        if entries.is_empty() {
            warn!("No last report recorded, nothing to update");
            return Ok(no_report_result());
        }
        let board = self.board();
        let target = resolve_target(&board, new_status).await?;
        Ok(self.apply_status(&target, &entries, Vec::new()).await)
    }

    /// Moves every issue cited in `report` to `new_status`.
    ///
    /// The board is scanned once to find the cited issues; cited issues that
    /// are not on the board count as failures.
    pub async fn update_issues_from_report(
        &self,
        report: &str,
        new_status: &str,
    ) -> Result<BulkUpdateResult> {
        let cited = extract_issues_from_report(report);
        if cited.is_empty() {
            return Ok(no_report_result());
        }

        let board = self.board();
        let target = resolve_target(&board, new_status).await?;

        let mut on_board: HashMap<(String, u64), ProjectItem> = HashMap::new();
        for item in scan_all(&board).await? {
            let key = (extract_repo_name_from_url(&item.url), item.issue_number);
            on_board.entry(key).or_insert(item);
        }

        let mut entries = Vec::with_capacity(cited.len());
        let mut missing = Vec::new();
        for issue in cited {
            match on_board.remove(&(issue.repository.clone(), issue.issue_number)) {
                Some(item) => entries.push(LastReportEntry {
                    issue_number: item.issue_number,
                    repository: issue.repository,
                    item_id: item.item_id,
                    kind: item.kind,
                }),
                None => missing.push(IssueUpdateError {
                    issue_number: issue.issue_number,
                    error: format!(
                        "Issue {}#{} is not on the {} board",
                        issue.repository,
                        issue.issue_number,
                        board.title()
                    ),
                }),
            }
        }

        Ok(self.apply_status(&target, &entries, missing).await)
    }

    async fn apply_status(
        &self,
        target: &StatusTarget<'_>,
        entries: &[LastReportEntry],
        mut errors: Vec<IssueUpdateError>,
    ) -> BulkUpdateResult {
        info!(
            issues = entries.len(),
            status = %target.status,
            "Updating issue statuses"
        );

        let mut updated = 0;
        let mut first = true;
        for entry in entries {
            if entry.kind.as_ref().is_some_and(Kind::is_epic) {
                debug!(issue = entry.issue_number, "Skipping epic");
                errors.push(IssueUpdateError {
                    issue_number: entry.issue_number,
                    error: EPIC_SKIP_REASON.to_string(),
                });
                continue;
            }

            if !first && !self.config.update_delay.is_zero() {
                tokio::time::sleep(self.config.update_delay).await;
            }
            first = false;

            match self.set_status(target, &entry.item_id).await {
                Ok(()) => {
                    debug!(
                        issue = entry.issue_number,
                        repository = %entry.repository,
                        "Updated status"
                    );
                    updated += 1;
                }
                Err(e) => {
                    warn!(
                        issue = entry.issue_number,
                        repository = %entry.repository,
                        error = %e,
                        "Failed to update status"
                    );
                    errors.push(IssueUpdateError {
                        issue_number: entry.issue_number,
                        error: e.to_string(),
                    });
                }
            }
        }

        let failed = errors.len();
        info!(updated, failed, "Finished status update");

        BulkUpdateResult {
            success: failed == 0,
            updated,
            failed,
            total_issues: updated + failed,
            errors,
        }
    }

    /// Runs one mutation. GitHub answers a rejected mutation with a null
    /// payload, which counts as a failure.
    async fn set_status(&self, target: &StatusTarget<'_>, item_id: &str) -> Result<()> {
        let variables = json!({
            "projectId": target.project_id,
            "itemId": item_id,
            "fieldId": target.field_id,
            "optionId": target.option_id,
        });
        let data = self
            .executor
            .execute(UPDATE_ITEM_STATUS_MUTATION, variables)
            .await?;

        match decode::<UpdateItemData>(data)?.updated_item_id() {
            Some(_) => Ok(()),
            None => Err(Error::GraphQl {
                messages: vec![format!("status update for item {} was rejected", item_id)],
            }),
        }
    }
}

/// Where a bulk update writes: the board, its Status field and the option
/// to set.
struct StatusTarget<'b> {
    project_id: &'b str,
    field_id: String,
    option_id: String,
    status: String,
}

async fn resolve_target<'b, Q: QueryExecutor + ?Sized>(
    board: &'b Board<'_, Q>,
    new_status: &str,
) -> Result<StatusTarget<'b>> {
    let project_id = board.project_id().await?;
    let status_field = board.status_field().await?;
    let option_id = status_field
        .option_id(new_status)
        .map(str::to_string)
        .ok_or_else(|| Error::StatusOptionNotFound {
            status: new_status.to_string(),
            available: status_field.option_names(),
        })?;

    Ok(StatusTarget {
        project_id,
        field_id: status_field.field_id,
        option_id,
        status: new_status.to_string(),
    })
}

fn no_report_result() -> BulkUpdateResult {
    BulkUpdateResult {
        success: false,
        updated: 0,
        failed: 1,
        total_issues: 0,
        errors: vec![IssueUpdateError {
            issue_number: 0,
            error: NO_REPORT_REASON.to_string(),
        }],
    }
}
