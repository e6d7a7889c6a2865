use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    config::{Config, DEFAULT_API_BASE_URL, DEFAULT_ORGANIZATION, DEFAULT_PROJECT_TITLE},
    github::parse_repo_from_string,
};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Args, Debug, Clone)]
struct BoardArgs {
    /// Organization owning the project board
    #[arg(long = "org", global = true, default_value = DEFAULT_ORGANIZATION, value_name = "LOGIN", help_heading = "Board")]
    pub organization: String,

    /// Title of the project board
    #[arg(long = "project", global = true, default_value = DEFAULT_PROJECT_TITLE, value_name = "TITLE", help_heading = "Board")]
    pub project_title: String,

    /// GitHub API base URL (defaults to $GITHUB_API_BASE_URL or https://api.github.com)
    #[arg(long = "api-url", global = true, value_name = "URL", help_heading = "Board")]
    pub api_base_url: Option<String>,

    /// Pause between status updates, in milliseconds
    #[arg(long = "update-delay-ms", global = true, default_value = "100", value_name = "MS", help_heading = "Board")]
    pub update_delay_ms: u64,
}

#[derive(Subcommand, Debug, Clone)]
enum CliCommand {
    /// Generate a Markdown report of the board issues with a Team and Status
    Report {
        /// Team field value (exact match)
        #[arg(short = 't', long)]
        team: String,

        /// Status field value (exact match); also selects the report's tense
        #[arg(short = 's', long)]
        status: String,

        /// Render the month-end variant for this month
        #[arg(long, value_name = "YYYY-MM")]
        month: Option<String>,

        /// After reporting, move the reported issues to this status
        #[arg(long = "move-to", value_name = "STATUS")]
        move_to: Option<String>,
    },

    /// Move every issue cited in a previously generated report to a status
    UpdateFromReport {
        /// Report file to read citations from
        #[arg(short = 'f', long, value_name = "PATH")]
        file: PathBuf,

        /// Status to move the issues to
        #[arg(short = 's', long)]
        status: String,
    },

    /// List the board's Team and Status options
    Options,

    /// Show an issue with its comments, repository and board fields
    Issue {
        /// OWNER/REPO, or an issue URL
        #[arg(value_name = "OWNER/REPO|ISSUE-URL")]
        target: String,

        /// Issue number (omit when passing a URL)
        number: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = IssueFormat::Console)]
        format: IssueFormat,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "roadmap-report",
    about = "Generate tense-aware issue reports from a GitHub project board and move the reported issues between statuses"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    #[command(flatten)]
    pub board: BoardArgs,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// How `issue` output is rendered.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueFormat {
    Console,
    Markdown,
    Json,
}

/// Month selected for a month-end report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Report {
        team: String,
        status: String,
        month: Option<ReportMonth>,
        move_to: Option<String>,
    },
    UpdateFromReport {
        file: PathBuf,
        status: String,
    },
    Options,
    Issue {
        owner: String,
        repo: String,
        number: u64,
        format: IssueFormat,
    },
}

fn parse_report_month(value: &str) -> Result<ReportMonth> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", value))?;
    Ok(ReportMonth {
        year: date.year(),
        month: date.month(),
    })
}

/// Parses `https://github.com/owner/repo/issues/123`.
pub fn parse_issue_url(url_str: &str) -> Result<(String, String, u64)> {
    let url =
        url::Url::parse(url_str).with_context(|| format!("Failed to parse URL: '{}'", url_str))?;

    let path_segments: Vec<&str> = url
        .path_segments()
        .context("Cannot parse URL path")?
        .collect();

    // ["owner", "repo", "issues", "123"]
    if path_segments.len() != 4 || path_segments[2] != "issues" {
        anyhow::bail!(
            "URL must be in format https://github.com/owner/repo/issues/123, got: '{}'",
            url_str
        );
    }

    let number: u64 = path_segments[3]
        .parse()
        .with_context(|| format!("Invalid issue number in URL: '{}'", url_str))?;

    Ok((
        path_segments[0].to_string(),
        path_segments[1].to_string(),
        number,
    ))
}

fn parse_issue_target(target: &str, number: Option<u64>) -> Result<(String, String, u64)> {
    if target.starts_with("https://") {
        if number.is_some() {
            anyhow::bail!("Cannot pass an issue number together with an issue URL");
        }
        return parse_issue_url(target);
    }

    let (owner, repo) = parse_repo_from_string(target)?;
    let number = number.context("Issue number is required when using OWNER/REPO")?;
    Ok((owner.to_string(), repo.to_string(), number))
}

fn build_config(board: BoardArgs) -> Config {
    let api_base_url = board
        .api_base_url
        .or_else(|| std::env::var("GITHUB_API_BASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    Config {
        organization: board.organization,
        project_title: board.project_title,
        api_base_url,
        update_delay: Duration::from_millis(board.update_delay_ms),
    }
}

fn build_command(command: CliCommand) -> Result<Command> {
    Ok(match command {
        CliCommand::Report {
            team,
            status,
            month,
            move_to,
        } => {
            if team.trim().is_empty() || status.trim().is_empty() {
                anyhow::bail!("Team and status are required");
            }
            Command::Report {
                team,
                status,
                month: month.as_deref().map(parse_report_month).transpose()?,
                move_to,
            }
        }
        CliCommand::UpdateFromReport { file, status } => Command::UpdateFromReport { file, status },
        CliCommand::Options => Command::Options,
        CliCommand::Issue {
            target,
            number,
            format,
        } => {
            let (owner, repo, number) = parse_issue_target(&target, number)?;
            Command::Issue {
                owner,
                repo,
                number,
                format,
            }
        }
    })
}

/// Parses command-line arguments into the board configuration and the
/// command to run.
pub fn parse_args<I, T>(args: I) -> Result<(Config, Command)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    let command = build_command(cli.command)?;
    Ok((build_config(cli.board), command))
}
