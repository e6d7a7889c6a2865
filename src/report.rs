//! Markdown issue reports for a board's team/status slice.

use std::{collections::BTreeSet, sync::LazyLock};

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{debug, info};

use crate::{
    board::Board,
    classify::{NO_PARENT, count_completed_parents, filter_items, group_by_parent, group_issues_by_kind},
    config::Config,
    error::{Error, Result},
    fetcher::scan_all,
    github::extract_repo_name_from_url,
    state::LastReportStore,
    types::{ParentIssue, QueryExecutor, ReportData, ReportIssue},
};

pub const NO_ISSUES_SENTENCE: &str = "There are currently no issues in this team and status.";

const DIVIDER: &str = "--------------------------------------------------------";

/// Verb tense implied by a board status: work that is done is reported in the
/// past, work under way in the present, everything else as planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tense {
    Past,
    Present,
    Planned,
}

impl Tense {
    pub fn from_status(status: &str) -> Self {
        let normalized = status.trim().to_lowercase();
        if normalized.contains("validation") || normalized.contains("done") {
            Tense::Past
        } else if normalized.contains("progress") {
            Tense::Present
        } else {
            Tense::Planned
        }
    }

    fn phrasing(self) -> &'static Phrasing {
        match self {
            Tense::Past => &PAST,
            Tense::Present => &PRESENT,
            Tense::Planned => &PLANNED,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ParentLineStyle {
    /// `- We finished with Parent ([repo#1](url)) by`
    Leading,
    /// `- Parent ([repo#1](url)) completed by`
    Trailing,
}

/// Every verb a report uses, for one tense or report variant.
#[derive(Debug)]
struct Phrasing {
    tldr_completed: &'static str,
    tldr_progress: &'static str,
    parent_line: ParentLineStyle,
    section_completed: &'static str,
    section_progress: &'static str,
    customer_verb: &'static str,
    operational_verb: &'static str,
    other_verb: &'static str,
}

const PAST: Phrasing = Phrasing {
    tldr_completed: "We completed",
    tldr_progress: "We made progress on",
    parent_line: ParentLineStyle::Trailing,
    section_completed: "completed",
    section_progress: "made progress on",
    customer_verb: "delivered",
    operational_verb: "resolved",
    other_verb: "completed",
};

const PRESENT: Phrasing = Phrasing {
    tldr_completed: "We are working on",
    tldr_progress: "We are working on",
    parent_line: ParentLineStyle::Trailing,
    section_completed: "are working on",
    section_progress: "are working on",
    customer_verb: "are delivering",
    operational_verb: "are resolving",
    other_verb: "are working on",
};

const PLANNED: Phrasing = Phrasing {
    tldr_completed: "We plan to work on",
    tldr_progress: "We plan to work on",
    parent_line: ParentLineStyle::Trailing,
    section_completed: "is planned",
    section_progress: "is planned",
    customer_verb: "plan to deliver",
    operational_verb: "plan to resolve",
    other_verb: "plan to work on",
};

const MONTHLY: Phrasing = Phrasing {
    tldr_completed: "We finished with",
    tldr_progress: "We made progress on",
    parent_line: ParentLineStyle::Leading,
    section_completed: "We finished with",
    section_progress: "We made progress on",
    customer_verb: "delivered",
    operational_verb: "resolved",
    other_verb: "completed",
};

/// Which report is being rendered; decides the title and the phrasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportHeading {
    TeamStatus { team: String, status: String },
    Monthly { team: String, year: i32, month: u32 },
}

impl ReportHeading {
    fn title(&self) -> Result<String> {
        match self {
            ReportHeading::TeamStatus { team, status } => {
                Ok(format!("# Team {} - Status: {}", team, status))
            }
            ReportHeading::Monthly { team, year, month } => Ok(format!(
                "# Team {} Issue Report - {} {}",
                team,
                month_name(*year, *month)?,
                year
            )),
        }
    }

    fn phrasing(&self) -> &'static Phrasing {
        match self {
            ReportHeading::TeamStatus { status, .. } => Tense::from_status(status).phrasing(),
            ReportHeading::Monthly { .. } => &MONTHLY,
        }
    }
}

fn month_name(year: i32, month: u32) -> Result<String> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%B").to_string())
        .ok_or(Error::InvalidMonth { month })
}

/// Picks up to `max` example issues for a TL;DR line.
pub trait ExampleSampler: Send + Sync {
    fn sample<'a>(&self, issues: &'a [ReportIssue], max: usize) -> Vec<&'a ReportIssue>;
}

/// Random examples; each report highlights different issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl ExampleSampler for RandomSampler {
    fn sample<'a>(&self, issues: &'a [ReportIssue], max: usize) -> Vec<&'a ReportIssue> {
        issues
            .choose_multiple(&mut rand::thread_rng(), max)
            .collect()
    }
}

/// The first issues in section order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSampler;

impl ExampleSampler for FirstSampler {
    fn sample<'a>(&self, issues: &'a [ReportIssue], max: usize) -> Vec<&'a ReportIssue> {
        issues.iter().take(max).collect()
    }
}

/// `A`, `A and B`, `A, B and C`.
pub fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

fn citation(title: &str, repository: &str, number: u64, url: &str) -> String {
    format!("{} ([{}#{}]({}))", title, repository, number, url)
}

fn parent_citation(parent: &ParentIssue) -> String {
    citation(
        &parent.title,
        &extract_repo_name_from_url(&parent.url),
        parent.number,
        &parent.url,
    )
}

fn issue_line(issue: &ReportIssue) -> String {
    format!(
        "{} - [{}#{}]({})",
        issue.title, issue.repository, issue.number, issue.url
    )
}

/// Renders [`ReportData`] as Markdown.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer<S = RandomSampler> {
    sampler: S,
}

impl<S: ExampleSampler> ReportRenderer<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// The full document: title, TL;DR, divider, then one section per
    /// non-empty bucket.
    pub fn render(&self, data: &ReportData, heading: &ReportHeading) -> Result<String> {
        let phrasing = heading.phrasing();
        let mut report = format!("{}\n\n**TL;DR**\n", heading.title()?);

        if data.is_empty() {
            report.push_str(NO_ISSUES_SENTENCE);
            report.push('\n');
            return Ok(report);
        }

        report.push_str(&self.tldr(data, phrasing));
        report.push('\n');
        report.push_str(DIVIDER);
        report.push_str("\n\n");

        let sections = [
            ("Roadmap", &data.roadmap),
            ("Customer Work", &data.customer_work),
            ("Operational Work", &data.operational_work),
            ("Other Issues", &data.other_issues),
        ];
        for (name, issues) in sections {
            if !issues.is_empty() {
                report.push_str(&section(name, issues, phrasing));
            }
        }

        Ok(report)
    }

    /// TL;DR lines for a team/status report, phrased for `status`.
    pub fn create_tldr(&self, data: &ReportData, status: &str) -> String {
        if data.is_empty() {
            return NO_ISSUES_SENTENCE.to_string();
        }
        self.tldr(data, Tense::from_status(status).phrasing())
    }

    fn tldr(&self, data: &ReportData, phrasing: &Phrasing) -> String {
        let mut tldr = String::new();

        if !data.roadmap.is_empty() {
            let (completed, in_progress): (Vec<_>, Vec<_>) = group_by_parent(&data.roadmap)
                .into_iter()
                .filter(|(title, _)| *title != NO_PARENT)
                .filter_map(|(_, group)| group.parent.map(|p| (group.is_completed(), p)))
                .partition(|(is_completed, _)| *is_completed);

            for (lead, parents) in [
                (phrasing.tldr_completed, completed),
                (phrasing.tldr_progress, in_progress),
            ] {
                if parents.is_empty() {
                    continue;
                }
                let links: Vec<String> = parents.iter().map(|(_, p)| parent_citation(p)).collect();
                tldr.push_str(&format!("- {} {}.\n", lead, join_with_and(&links)));
            }
        }

        let summaries = [
            (
                &data.customer_work,
                phrasing.customer_verb,
                "customer requests, providing direct value to our customers and improving their platform experience",
            ),
            (
                &data.operational_work,
                phrasing.operational_verb,
                "operational issues, improving platform stability, maintainability, and user experience",
            ),
            (
                &data.other_issues,
                phrasing.other_verb,
                "other issues, covering various tasks and improvements",
            ),
        ];
        for (issues, verb, description) in summaries {
            if issues.is_empty() {
                continue;
            }
            tldr.push_str(&format!("- We {} {} {}", verb, issues.len(), description));
            let examples: Vec<String> = self
                .sampler
                .sample(issues, 2)
                .into_iter()
                .map(|i| citation(&i.title, &i.repository, i.number, &i.url))
                .collect();
            if !examples.is_empty() {
                tldr.push_str(&format!(", including {}", examples.join(" and ")));
            }
            tldr.push_str(".\n");
        }

        tldr
    }
}

fn section(name: &str, issues: &[ReportIssue], phrasing: &Phrasing) -> String {
    let mut section = format!("**{}**\n", name);

    for (title, group) in group_by_parent(issues) {
        let parent = match group.parent {
            Some(parent) if title != NO_PARENT => parent,
            _ => {
                for issue in &group.children {
                    section.push_str(&format!("- {}\n", issue_line(issue)));
                }
                continue;
            }
        };

        let status_text = if group.is_completed() {
            phrasing.section_completed
        } else {
            phrasing.section_progress
        };
        let line = match phrasing.parent_line {
            ParentLineStyle::Leading => format!("- {} {} by\n", status_text, parent_citation(parent)),
            ParentLineStyle::Trailing => format!("- {} {} by\n", parent_citation(parent), status_text),
        };
        section.push_str(&line);

        for issue in &group.children {
            section.push_str(&format!("  - {}\n", issue_line(issue)));
        }
    }

    section.push('\n');
    section
}

/// An issue cited in a report as `[repo#number](url)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CitedIssue {
    pub issue_number: u64,
    pub repository: String,
}

/// Every distinct issue cited in a report, sorted by issue number.
pub fn extract_issues_from_report(report: &str) -> Vec<CitedIssue> {
    static CITATION: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[([A-Za-z0-9_.\-]+)#(\d+)\]\(").expect("Failed to compile citation pattern")
    });

    CITATION
        .captures_iter(report)
        .filter_map(|caps| {
            Some(CitedIssue {
                issue_number: caps[2].parse().ok()?,
                repository: caps[1].to_string(),
            })
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds reports from the board and records the issues each one covers.
pub struct ReportGenerator<'a, Q: ?Sized, S = RandomSampler> {
    executor: &'a Q,
    config: &'a Config,
    store: &'a LastReportStore,
    renderer: ReportRenderer<S>,
}

impl<'a, Q: QueryExecutor + ?Sized> ReportGenerator<'a, Q, RandomSampler> {
    pub fn new(executor: &'a Q, config: &'a Config, store: &'a LastReportStore) -> Self {
        Self::with_sampler(executor, config, store, RandomSampler)
    }
}

impl<'a, Q: QueryExecutor + ?Sized, S: ExampleSampler> ReportGenerator<'a, Q, S> {
    pub fn with_sampler(
        executor: &'a Q,
        config: &'a Config,
        store: &'a LastReportStore,
        sampler: S,
    ) -> Self {
        Self {
            executor,
            config,
            store,
            renderer: ReportRenderer::new(sampler),
        }
    }

    /// Report on the board issues with Team `team` and Status `status`,
    /// phrased in the tense the status implies.
    pub async fn generate_report(&self, team: &str, status: &str) -> Result<String> {
        let heading = ReportHeading::TeamStatus {
            team: team.to_string(),
            status: status.to_string(),
        };
        self.generate(team, status, &heading).await
    }

    /// Month-end report on the board issues with Team `team` and Status
    /// `status`, always phrased as finished work.
    pub async fn generate_monthly_report(
        &self,
        team: &str,
        status: &str,
        year: i32,
        month: u32,
    ) -> Result<String> {
        month_name(year, month)?;
        let heading = ReportHeading::Monthly {
            team: team.to_string(),
            year,
            month,
        };
        self.generate(team, status, &heading).await
    }

    async fn generate(&self, team: &str, status: &str, heading: &ReportHeading) -> Result<String> {
        info!(team, status, "Generating issue report");

        let board = Board::new(
            self.executor,
            &self.config.organization,
            &self.config.project_title,
        );
        let items = filter_items(scan_all(&board).await?, team, status);
        let data = group_issues_by_kind(&items);

        info!(
            matching = items.len(),
            rows = data.total(),
            roadmap = data.roadmap.len(),
            customer_work = data.customer_work.len(),
            operational_work = data.operational_work.len(),
            other_issues = data.other_issues.len(),
            completed_parents = count_completed_parents(&data.roadmap),
            "Grouped issues for report"
        );

        let report = self.renderer.render(&data, heading)?;
        self.store.record(&data);
        debug!(recorded = self.store.len(), "Recorded last report");
        Ok(report)
    }
}
