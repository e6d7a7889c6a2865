//! Everything known about a single issue, including its board fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    board::Board,
    config::Config,
    error::{Error, Result},
    fetcher::find_item_by_issue_id,
    github::numeric_id,
    graphql::{Connection, GraphQLParent, decode},
    types::{IssueState, Kind, ParentIssue, QueryExecutor},
};

const ISSUE_QUERY: &str = r#"
    query($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            issue(number: $number) {
                id
                number
                title
                body
                state
                url
                createdAt
                updatedAt
                closedAt
                author {
                    login
                }
                assignees(first: 10) {
                    nodes {
                        login
                    }
                }
                labels(first: 20) {
                    nodes {
                        name
                    }
                }
                milestone {
                    title
                }
                comments {
                    totalCount
                }
            }
        }
    }
"#;

const COMMENTS_QUERY: &str = r#"
    query($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            issue(number: $number) {
                comments(first: 100) {
                    nodes {
                        databaseId
                        body
                        createdAt
                        url
                        author {
                            login
                        }
                    }
                }
            }
        }
    }
"#;

const REPOSITORY_QUERY: &str = r#"
    query($owner: String!, $repo: String!) {
        repository(owner: $owner, name: $repo) {
            nameWithOwner
            description
            url
            createdAt
            updatedAt
            stargazerCount
            forkCount
            primaryLanguage {
                name
            }
            issues(states: OPEN) {
                totalCount
            }
        }
    }
"#;

const LINKED_PROJECTS_QUERY: &str = r#"
    query($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            issue(number: $number) {
                id
                parent {
                    number
                    title
                    url
                    closed
                }
                projectsV2(first: 10) {
                    nodes {
                        id
                        title
                        number
                        url
                    }
                }
            }
        }
    }
"#;

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
struct IssueData<T> {
    issue: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Login {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Name {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Title {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLIssue {
    id: String,
    number: u64,
    title: String,
    body: Option<String>,
    state: IssueState,
    url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    author: Option<Login>,
    assignees: Connection<Login>,
    labels: Option<Connection<Name>>,
    milestone: Option<Title>,
    comments: TotalCount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLComment {
    database_id: Option<u64>,
    body: String,
    created_at: DateTime<Utc>,
    url: String,
    author: Option<Login>,
}

#[derive(Debug, Deserialize)]
struct CommentsOnly {
    comments: Connection<GraphQLComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLRepository {
    name_with_owner: String,
    description: Option<String>,
    url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    stargazer_count: u64,
    fork_count: u64,
    primary_language: Option<Name>,
    issues: TotalCount,
}

#[derive(Debug, Deserialize)]
struct GraphQLLinkedProject {
    id: String,
    title: String,
    number: u64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct LinkedProjectsIssue {
    id: String,
    parent: Option<GraphQLParent>,
    #[serde(rename = "projectsV2")]
    projects: Connection<GraphQLLinkedProject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetails {
    pub node_id: String,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub url: String,
    pub author: Option<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub milestone: Option<String>,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: Option<u64>,
    pub author: Option<String>,
    pub body: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetails {
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The issue's item on the configured board, with its field values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProject {
    pub id: u64,
    pub node_id: String,
    pub name: String,
    pub number: u64,
    pub url: String,
    pub status: Option<String>,
    pub team: Option<String>,
    pub kind: Option<Kind>,
    pub parent_issue: Option<ParentIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedIssue {
    pub issue: IssueDetails,
    pub comments: Vec<IssueComment>,
    pub repository: RepositoryDetails,
    pub linked_projects: Vec<LinkedProject>,
}

fn issue_variables(owner: &str, repo: &str, number: u64) -> serde_json::Value {
    json!({ "owner": owner, "repo": repo, "number": number })
}

fn not_found(owner: &str, repo: &str, number: u64) -> Error {
    Error::IssueNotFound {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    }
}

async fn fetch_issue<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<IssueDetails> {
    let data = executor
        .execute(ISSUE_QUERY, issue_variables(owner, repo, number))
        .await?;
    let response: RepositoryData<IssueData<GraphQLIssue>> = decode(data)?;
    let issue = response
        .repository
        .and_then(|r| r.issue)
        .ok_or_else(|| not_found(owner, repo, number))?;

    Ok(IssueDetails {
        node_id: issue.id,
        number: issue.number,
        title: issue.title,
        body: issue.body.filter(|b| !b.is_empty()),
        state: issue.state,
        url: issue.url,
        author: issue.author.map(|a| a.login),
        assignees: issue.assignees.nodes.into_iter().map(|a| a.login).collect(),
        labels: issue
            .labels
            .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
            .unwrap_or_default(),
        milestone: issue.milestone.map(|m| m.title),
        comment_count: issue.comments.total_count,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
    })
}

async fn fetch_comments<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<Vec<IssueComment>> {
    let data = executor
        .execute(COMMENTS_QUERY, issue_variables(owner, repo, number))
        .await?;
    let response: RepositoryData<IssueData<CommentsOnly>> = decode(data)?;
    let issue = response
        .repository
        .and_then(|r| r.issue)
        .ok_or_else(|| not_found(owner, repo, number))?;

    Ok(issue
        .comments
        .nodes
        .into_iter()
        .map(|c| IssueComment {
            id: c.database_id,
            author: c.author.map(|a| a.login),
            body: c.body,
            url: c.url,
            created_at: c.created_at,
        })
        .collect())
}

async fn fetch_repository<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    owner: &str,
    repo: &str,
) -> Result<RepositoryDetails> {
    let data = executor
        .execute(REPOSITORY_QUERY, json!({ "owner": owner, "repo": repo }))
        .await?;
    let response: RepositoryData<GraphQLRepository> = decode(data)?;
    let repository = response
        .repository
        .ok_or_else(|| Error::InvalidInput(format!("Repository {}/{} not found", owner, repo)))?;

    Ok(RepositoryDetails {
        full_name: repository.name_with_owner,
        description: repository.description,
        language: repository.primary_language.map(|l| l.name),
        stars: repository.stargazer_count,
        forks: repository.fork_count,
        open_issues: repository.issues.total_count,
        url: repository.url,
        created_at: repository.created_at,
        updated_at: repository.updated_at,
    })
}

/// Reads the issue's item on the configured board, if the issue is linked
/// to it.
pub async fn fetch_linked_projects<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    config: &Config,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<Vec<LinkedProject>> {
    let data = executor
        .execute(LINKED_PROJECTS_QUERY, issue_variables(owner, repo, number))
        .await?;
    let response: RepositoryData<IssueData<LinkedProjectsIssue>> = decode(data)?;
    let issue = response
        .repository
        .and_then(|r| r.issue)
        .ok_or_else(|| not_found(owner, repo, number))?;

    debug!(
        issue = number,
        linked = issue.projects.nodes.len(),
        "Found projects linked to issue"
    );

    let Some(project) = issue
        .projects
        .nodes
        .into_iter()
        .find(|p| p.title == config.project_title)
    else {
        debug!(issue = number, board = %config.project_title, "Issue is not on the board");
        return Ok(Vec::new());
    };

    let board = Board::with_project_id(executor, owner, &project.title, &project.id);
    let Some(item) = find_item_by_issue_id(&board, &issue.id).await? else {
        debug!(issue = number, board = %project.title, "Issue not found among board items");
        return Ok(Vec::new());
    };

    Ok(vec![LinkedProject {
        id: numeric_id(&project.id),
        node_id: project.id,
        name: project.title,
        number: project.number,
        url: project.url,
        status: item.status,
        team: item.team,
        kind: item.kind,
        parent_issue: issue.parent.map(ParentIssue::from),
    }])
}

/// Fetches the issue, its comments, its repository and its board fields
/// concurrently.
///
/// A failure to read the board fields is logged and yields no linked
/// projects; any other failure fails the whole lookup.
pub async fn fetch_detailed_issue<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    config: &Config,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<DetailedIssue> {
    let linked_projects = async {
        Ok::<_, Error>(
            fetch_linked_projects(executor, config, owner, repo, number)
                .await
                .unwrap_or_else(|e| {
                    warn!(issue = number, error = %e, "Could not fetch linked projects");
                    Vec::new()
                }),
        )
    };

    let (issue, comments, repository, linked_projects) = tokio::try_join!(
        fetch_issue(executor, owner, repo, number),
        fetch_comments(executor, owner, repo, number),
        fetch_repository(executor, owner, repo),
        linked_projects,
    )?;

    Ok(DetailedIssue {
        issue,
        comments,
        repository,
        linked_projects,
    })
}
