//! Project board lookups: resolving the board id and reading its fields.

use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    graphql::{
        GraphQLProjectField, NodeData, PROJECT_FIELDS_QUERY, PROJECT_QUERY, ProjectFieldsNode,
        ProjectSearchData, decode,
    },
    types::{BoardOptions, QueryExecutor, StatusFieldConfig},
};

/// A named project board of an organization.
///
/// The board id is resolved on first use and cached for the lifetime of this
/// value, so one call chain (report generation, bulk update) queries it once.
/// Field configuration is never cached.
pub struct Board<'a, Q: ?Sized> {
    executor: &'a Q,
    organization: String,
    title: String,
    project_id: OnceCell<String>,
}

impl<'a, Q: QueryExecutor + ?Sized> Board<'a, Q> {
    pub fn new(executor: &'a Q, organization: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            executor,
            organization: organization.into(),
            title: title.into(),
            project_id: OnceCell::new(),
        }
    }

    /// A board whose id is already known, e.g. from an issue's linked
    /// projects.
    pub fn with_project_id(
        executor: &'a Q,
        organization: impl Into<String>,
        title: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            organization: organization.into(),
            title: title.into(),
            project_id: OnceCell::new_with(Some(project_id.into())),
        }
    }

    pub fn executor(&self) -> &'a Q {
        self.executor
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The board's opaque project id.
    ///
    /// Searches up to 10 of the organization's projects matching the title
    /// and takes the first exact title match.
    pub async fn project_id(&self) -> Result<&str> {
        let id = self
            .project_id
            .get_or_try_init(|| find_project_id(self.executor, &self.organization, &self.title))
            .await?;
        Ok(id.as_str())
    }

    async fn fields(&self) -> Result<Vec<GraphQLProjectField>> {
        let project_id = self.project_id().await?;
        let data = self
            .executor
            .execute(PROJECT_FIELDS_QUERY, json!({ "projectId": project_id }))
            .await?;
        let response: NodeData<ProjectFieldsNode> = decode(data)?;
        Ok(response.node.map(|n| n.fields.nodes).unwrap_or_default())
    }

    /// Option names of the board's Team and Status single-select fields.
    pub async fn team_and_status_options(&self) -> Result<BoardOptions> {
        let fields = self.fields().await?;
        let options_of = |name: &str| {
            fields
                .iter()
                .find(|f| f.name.as_deref() == Some(name))
                .map(|f| f.options.iter().map(|o| o.name.clone()).collect())
                .unwrap_or_default()
        };

        Ok(BoardOptions {
            team_options: options_of("Team"),
            status_options: options_of("Status"),
        })
    }

    /// The Status field's id and current options, read fresh from the board.
    pub async fn status_field(&self) -> Result<StatusFieldConfig> {
        self.fields()
            .await?
            .into_iter()
            .find(|f| f.name.as_deref() == Some("Status"))
            .and_then(|f| {
                Some(StatusFieldConfig {
                    field_id: f.id?,
                    options: f.options,
                })
            })
            .ok_or_else(|| Error::StatusFieldNotFound {
                project: self.title.clone(),
            })
    }
}

/// Resolves a project title to its id within an organization.
pub async fn find_project_id<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    organization: &str,
    title: &str,
) -> Result<String> {
    let data = executor
        .execute(PROJECT_QUERY, json!({ "owner": organization, "title": title }))
        .await?;
    let response: ProjectSearchData = decode(data)?;

    let candidates = response
        .organization
        .map(|org| org.projects.nodes)
        .unwrap_or_default();
    debug!(
        organization,
        candidates = candidates.len(),
        "Searched projects by title"
    );

    let project = candidates
        .into_iter()
        .find(|p| p.title == title)
        .ok_or_else(|| Error::ProjectNotFound {
            organization: organization.to_string(),
            title: title.to_string(),
        })?;

    info!(title = %project.title, id = %project.id, number = ?project.number, "Found project board");
    Ok(project.id)
}
