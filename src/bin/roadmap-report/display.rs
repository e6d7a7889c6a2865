use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use roadmap_report::{BoardOptions, BulkUpdateResult, DetailedIssue, IssueFormat};

const BODY_PREVIEW_LINES: usize = 20;

fn format_relative_time(time: DateTime<Utc>) -> String {
    use chrono_humanize::HumanTime;
    HumanTime::from(time).to_string()
}

fn or_none(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("none")
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

struct IssueDetailFormatter<'a> {
    detail: &'a DetailedIssue,
}

impl<'a> IssueDetailFormatter<'a> {
    fn new(detail: &'a DetailedIssue) -> Self {
        Self { detail }
    }

    fn format<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.write_header(writer)?;
        self.write_metadata(writer)?;
        self.write_board_section(writer)?;
        self.write_repository_section(writer)?;
        self.write_body(writer)?;
        self.write_comments(writer)?;
        Ok(())
    }

    fn write_header<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "● {}", self.detail.issue.url)?;
        Ok(())
    }

    fn write_metadata<W: Write>(&self, writer: &mut W) -> Result<()> {
        let issue = &self.detail.issue;
        writeln!(
            writer,
            "├─Title: {} ({})",
            issue.title,
            or_none(issue.author.as_deref())
        )?;
        writeln!(writer, "├─Issue #{}", issue.number)?;
        writeln!(writer, "├─State: {}", issue.state.as_str().to_uppercase())?;
        writeln!(
            writer,
            "├─Created: {} ({})",
            issue.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
            format_relative_time(issue.created_at)
        )?;
        writeln!(
            writer,
            "├─Updated: {}",
            format_relative_time(issue.updated_at)
        )?;
        if let Some(closed_at) = issue.closed_at {
            writeln!(writer, "├─Closed: {}", format_relative_time(closed_at))?;
        }
        writeln!(writer, "├─Assignees: {}", join_or_none(&issue.assignees))?;
        writeln!(writer, "├─Labels: {}", join_or_none(&issue.labels))?;
        writeln!(
            writer,
            "├─Milestone: {}",
            or_none(issue.milestone.as_deref())
        )?;
        Ok(())
    }

    fn write_board_section<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.detail.linked_projects.is_empty() {
            writeln!(writer, "├─Board: not linked")?;
            return Ok(());
        }

        for project in &self.detail.linked_projects {
            writeln!(writer, "├─Board: {} (#{})", project.name, project.number)?;
            writeln!(writer, "│ ├─Status: {}", or_none(project.status.as_deref()))?;
            writeln!(writer, "│ ├─Team: {}", or_none(project.team.as_deref()))?;
            writeln!(
                writer,
                "│ ├─Kind: {}",
                project.kind.as_ref().map(|k| k.as_str()).unwrap_or("none")
            )?;
            match &project.parent_issue {
                Some(parent) => writeln!(
                    writer,
                    "│ └─Parent: #{} {} ({})",
                    parent.number,
                    parent.title,
                    if parent.closed { "closed" } else { "open" }
                )?,
                None => writeln!(writer, "│ └─Parent: none")?,
            }
        }
        Ok(())
    }

    fn write_repository_section<W: Write>(&self, writer: &mut W) -> Result<()> {
        let repo = &self.detail.repository;
        writeln!(writer, "├─Repository: {}", repo.full_name)?;
        writeln!(
            writer,
            "│ ├─Language: {}",
            or_none(repo.language.as_deref())
        )?;
        writeln!(
            writer,
            "│ └─Stars: {}, Forks: {}, Open issues: {}",
            repo.stars, repo.forks, repo.open_issues
        )?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> Result<()> {
        let Some(body) = self.detail.issue.body.as_deref() else {
            return Ok(());
        };

        writeln!(writer, "├─Body")?;
        let lines: Vec<&str> = body.lines().collect();
        for line in lines.iter().take(BODY_PREVIEW_LINES) {
            writeln!(writer, "│   {}", line)?;
        }
        if lines.len() > BODY_PREVIEW_LINES {
            writeln!(
                writer,
                "│   ... ({} more lines)",
                lines.len() - BODY_PREVIEW_LINES
            )?;
        }
        Ok(())
    }

    fn write_comments<W: Write>(&self, writer: &mut W) -> Result<()> {
        let comments = &self.detail.comments;
        writeln!(writer, "└─Comments ({})", self.detail.issue.comment_count)?;

        let count = comments.len();
        for (idx, comment) in comments.iter().enumerate() {
            let prefix = if idx + 1 == count { "└─" } else { "├─" };
            let first_line = comment.body.lines().next().unwrap_or("");
            writeln!(
                writer,
                "  {}{} {}: {}",
                prefix,
                or_none(comment.author.as_deref()),
                format_relative_time(comment.created_at),
                first_line
            )?;
        }
        Ok(())
    }
}

fn display_issue_markdown<W: Write>(detail: &DetailedIssue, writer: &mut W) -> Result<()> {
    let issue = &detail.issue;
    writeln!(
        writer,
        "# {} ([{}#{}]({}))",
        issue.title, detail.repository.full_name, issue.number, issue.url
    )?;
    writeln!(writer)?;
    writeln!(writer, "- **State:** {}", issue.state)?;
    writeln!(
        writer,
        "- **Author:** {}",
        or_none(issue.author.as_deref())
    )?;
    writeln!(writer, "- **Assignees:** {}", join_or_none(&issue.assignees))?;
    writeln!(writer, "- **Labels:** {}", join_or_none(&issue.labels))?;
    for project in &detail.linked_projects {
        writeln!(
            writer,
            "- **{}:** {} / {} / {}",
            project.name,
            or_none(project.status.as_deref()),
            or_none(project.team.as_deref()),
            project.kind.as_ref().map(|k| k.as_str()).unwrap_or("none")
        )?;
        if let Some(parent) = &project.parent_issue {
            writeln!(
                writer,
                "- **Parent:** [{}]({})",
                parent.title, parent.url
            )?;
        }
    }

    if let Some(body) = issue.body.as_deref() {
        writeln!(writer)?;
        writeln!(writer, "{}", body.trim_end())?;
    }

    if !detail.comments.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "## Comments")?;
        for comment in &detail.comments {
            writeln!(writer)?;
            writeln!(
                writer,
                "**{}** on {}:",
                or_none(comment.author.as_deref()),
                comment.created_at.format("%Y-%m-%d")
            )?;
            writeln!(writer)?;
            writeln!(writer, "{}", comment.body.trim_end())?;
        }
    }
    Ok(())
}

pub fn display_issue<W: Write>(
    detail: &DetailedIssue,
    format: IssueFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        IssueFormat::Console => IssueDetailFormatter::new(detail).format(writer),
        IssueFormat::Markdown => display_issue_markdown(detail, writer),
        IssueFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, detail)?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

pub fn display_options<W: Write>(options: &BoardOptions, writer: &mut W) -> Result<()> {
    writeln!(writer, "Teams:")?;
    for team in &options.team_options {
        writeln!(writer, "  {}", team)?;
    }
    writeln!(writer, "Statuses:")?;
    for status in &options.status_options {
        writeln!(writer, "  {}", status)?;
    }
    Ok(())
}

/// Prints a one-line summary to `summary` and the full result as JSON to
/// `writer`.
pub fn display_update_result<W: Write, E: Write>(
    result: &BulkUpdateResult,
    writer: &mut W,
    summary: &mut E,
) -> Result<()> {
    writeln!(
        summary,
        "Updated {} of {} issues ({} failed)",
        result.updated, result.total_issues, result.failed
    )?;
    for error in &result.errors {
        writeln!(summary, "  #{}: {}", error.issue_number, error.error)?;
    }
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use roadmap_report::{
        IssueState, IssueUpdateError, Kind, ParentIssue,
        issue::{IssueComment, IssueDetails, LinkedProject, RepositoryDetails},
    };

    use super::*;

    fn create_test_issue() -> DetailedIssue {
        let base_time = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();

        DetailedIssue {
            issue: IssueDetails {
                node_id: "I_kwDOABC_42".to_string(),
                number: 42,
                title: "Rotate cluster certificates".to_string(),
                body: Some("Certificates expire.\nRotate them.".to_string()),
                state: IssueState::Open,
                url: "https://github.com/giantswarm/roadmap/issues/42".to_string(),
                author: Some("alice".to_string()),
                assignees: vec!["bob".to_string()],
                labels: vec!["team/atlas".to_string(), "kind/story".to_string()],
                milestone: None,
                comment_count: 1,
                created_at: base_time,
                updated_at: base_time + chrono::Duration::days(2),
                closed_at: None,
            },
            comments: vec![IssueComment {
                id: Some(1001),
                author: Some("carol".to_string()),
                body: "Started on staging.\nMore later.".to_string(),
                url: "https://github.com/giantswarm/roadmap/issues/42#issuecomment-1001"
                    .to_string(),
                created_at: base_time + chrono::Duration::days(1),
            }],
            repository: RepositoryDetails {
                full_name: "giantswarm/roadmap".to_string(),
                description: None,
                language: Some("Go".to_string()),
                stars: 12,
                forks: 3,
                open_issues: 420,
                url: "https://github.com/giantswarm/roadmap".to_string(),
                created_at: base_time,
                updated_at: base_time,
            },
            linked_projects: vec![LinkedProject {
                id: 7,
                node_id: "PVT_7".to_string(),
                name: "Roadmap".to_string(),
                number: 273,
                url: "https://github.com/orgs/giantswarm/projects/273".to_string(),
                status: Some("In Progress ⛏️".to_string()),
                team: Some("Atlas 🗺️".to_string()),
                kind: Some(Kind::Story),
                parent_issue: Some(ParentIssue {
                    number: 10,
                    title: "Certificate lifecycle".to_string(),
                    url: "https://github.com/giantswarm/roadmap/issues/10".to_string(),
                    closed: false,
                }),
            }],
        }
    }

    #[test]
    fn test_console_format_shows_board_fields() {
        let detail = create_test_issue();
        let mut output = Vec::new();
        display_issue(&detail, IssueFormat::Console, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with("● https://github.com/giantswarm/roadmap/issues/42\n"));
        assert!(output.contains("├─Title: Rotate cluster certificates (alice)"));
        assert!(output.contains("├─State: OPEN"));
        assert!(output.contains("├─Labels: team/atlas, kind/story"));
        assert!(output.contains("├─Milestone: none"));
        assert!(output.contains("├─Board: Roadmap (#273)"));
        assert!(output.contains("│ ├─Status: In Progress ⛏️"));
        assert!(output.contains("│ ├─Kind: Story"));
        assert!(output.contains("│ └─Parent: #10 Certificate lifecycle (open)"));
        assert!(output.contains("│   Rotate them."));
        assert!(output.contains("└─Comments (1)"));
        assert!(output.contains("└─carol"));
        assert!(output.contains("Started on staging."));
        assert!(!output.contains("More later."));
    }

    #[test]
    fn test_console_format_without_board() {
        let mut detail = create_test_issue();
        detail.linked_projects.clear();
        detail.issue.body = None;
        let mut output = Vec::new();
        display_issue(&detail, IssueFormat::Console, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("├─Board: not linked"));
        assert!(!output.contains("├─Body"));
    }

    #[test]
    fn test_markdown_format() {
        let detail = create_test_issue();
        let mut output = Vec::new();
        display_issue(&detail, IssueFormat::Markdown, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with(
            "# Rotate cluster certificates ([giantswarm/roadmap#42](https://github.com/giantswarm/roadmap/issues/42))\n"
        ));
        assert!(output.contains("- **Roadmap:** In Progress ⛏️ / Atlas 🗺️ / Story\n"));
        assert!(output.contains("## Comments"));
        assert!(output.contains("**carol** on 2024-01-16:"));
    }

    #[test]
    fn test_json_format_uses_camel_case() {
        let detail = create_test_issue();
        let mut output = Vec::new();
        display_issue(&detail, IssueFormat::Json, &mut output).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();

        assert_eq!(value["issue"]["commentCount"], 1);
        assert_eq!(value["issue"]["state"], "OPEN");
        assert_eq!(value["linkedProjects"][0]["kind"], "Story");
        assert_eq!(value["linkedProjects"][0]["parentIssue"]["number"], 10);
    }

    #[test]
    fn test_display_options() {
        let options = BoardOptions {
            team_options: vec!["Atlas 🗺️".to_string(), "Rocket 🚀".to_string()],
            status_options: vec!["Done ✅".to_string()],
        };
        let mut output = Vec::new();
        display_options(&options, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Teams:\n  Atlas 🗺️\n  Rocket 🚀\nStatuses:\n  Done ✅\n"
        );
    }

    #[test]
    fn test_display_update_result() {
        let result = BulkUpdateResult {
            success: false,
            updated: 2,
            failed: 1,
            total_issues: 3,
            errors: vec![IssueUpdateError {
                issue_number: 2,
                error: "Cannot update status for Epic issues".to_string(),
            }],
        };
        let mut json = Vec::new();
        let mut summary = Vec::new();
        display_update_result(&result, &mut json, &mut summary).unwrap();

        assert_eq!(
            String::from_utf8(summary).unwrap(),
            "Updated 2 of 3 issues (1 failed)\n  #2: Cannot update status for Epic issues\n"
        );
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["totalIssues"], 3);
        assert_eq!(value["errors"][0]["issueNumber"], 2);
    }
}
