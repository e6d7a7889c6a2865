//! Sorting board issues into report sections and parent groups.

use indexmap::IndexMap;

use crate::{
    github::extract_repo_name_from_url,
    types::{Kind, ParentIssue, ProjectItem, ReportData, ReportIssue},
};

/// Group key for issues that have no parent.
pub const NO_PARENT: &str = "No Parent";

/// Keeps the items whose Team and Status field values equal the given ones.
pub fn filter_items(items: Vec<ProjectItem>, team: &str, status: &str) -> Vec<ProjectItem> {
    items
        .into_iter()
        .filter(|item| item.team.as_deref() == Some(team) && item.status.as_deref() == Some(status))
        .collect()
}

impl From<&ProjectItem> for ReportIssue {
    fn from(item: &ProjectItem) -> Self {
        Self {
            number: item.issue_number,
            title: item.title.clone(),
            url: item.url.clone(),
            repository: extract_repo_name_from_url(&item.url),
            kind: item.kind.clone(),
            state: item.state,
            parent: item.parent.clone(),
            item_id: item.item_id.clone(),
        }
    }
}

/// Partitions issues into report sections by Kind.
///
/// Epics are dropped: they only show up as the parent of other rows. Kinds
/// without a section of their own, and issues without a Kind, land in
/// `other_issues`.
pub fn group_issues_by_kind(items: &[ProjectItem]) -> ReportData {
    let mut data = ReportData::default();

    for item in items {
        let bucket = match &item.kind {
            Some(Kind::Epic) => continue,
            Some(Kind::Story) => &mut data.roadmap,
            Some(Kind::Request) => &mut data.customer_work,
            Some(Kind::Postmortem | Kind::Operational) => &mut data.operational_work,
            Some(Kind::Other(_)) | None => &mut data.other_issues,
        };
        bucket.push(ReportIssue::from(item));
    }

    data
}

/// Issues sharing one parent, in the order they were first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentGroup<'a> {
    pub parent: Option<&'a ParentIssue>,
    pub children: Vec<&'a ReportIssue>,
}

impl ParentGroup<'_> {
    /// A group is complete when its parent issue is closed, regardless of
    /// the state of the children listed under it.
    pub fn is_completed(&self) -> bool {
        self.parent.is_some_and(|p| p.closed)
    }
}

/// Groups issues by parent title, keeping first-encounter order. Issues
/// without a parent collect under [`NO_PARENT`].
pub fn group_by_parent(issues: &[ReportIssue]) -> IndexMap<&str, ParentGroup<'_>> {
    let mut groups: IndexMap<&str, ParentGroup<'_>> = IndexMap::new();

    for issue in issues {
        let key = issue.parent.as_ref().map_or(NO_PARENT, |p| p.title.as_str());
        groups
            .entry(key)
            .or_insert_with(|| ParentGroup {
                parent: issue.parent.as_ref(),
                children: Vec::new(),
            })
            .children
            .push(issue);
    }

    groups
}

/// Number of parent groups whose parent issue is closed.
pub fn count_completed_parents(issues: &[ReportIssue]) -> usize {
    group_by_parent(issues)
        .iter()
        .filter(|(title, group)| **title != NO_PARENT && group.is_completed())
        .count()
}
