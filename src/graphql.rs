//! GraphQL documents and response shapes for Projects v2 boards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{Error, Result},
    types::{IssueState, Kind, ParentIssue, ProjectItem, StatusOption},
};

pub const PROJECT_QUERY: &str = r#"
    query($owner: String!, $title: String!) {
        organization(login: $owner) {
            projectsV2(first: 10, query: $title) {
                nodes {
                    id
                    title
                    number
                }
            }
        }
    }
"#;

pub const PROJECT_ITEMS_QUERY: &str = r#"
    query($projectId: ID!, $after: String) {
        node(id: $projectId) {
            ... on ProjectV2 {
                items(first: 100, after: $after) {
                    pageInfo {
                        hasNextPage
                        endCursor
                    }
                    nodes {
                        id
                        content {
                            __typename
                            ... on Issue {
                                id
                                number
                                title
                                url
                                state
                                createdAt
                                updatedAt
                                parent {
                                    number
                                    title
                                    url
                                    closed
                                }
                            }
                        }
                        fieldValues(first: 100) {
                            nodes {
                                __typename
                                ... on ProjectV2ItemFieldTextValue {
                                    text
                                    field {
                                        ... on ProjectV2Field {
                                            name
                                        }
                                    }
                                }
                                ... on ProjectV2ItemFieldSingleSelectValue {
                                    name
                                    field {
                                        ... on ProjectV2SingleSelectField {
                                            name
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

pub const PROJECT_FIELDS_QUERY: &str = r#"
    query($projectId: ID!) {
        node(id: $projectId) {
            ... on ProjectV2 {
                fields(first: 50) {
                    nodes {
                        ... on ProjectV2SingleSelectField {
                            id
                            name
                            options {
                                id
                                name
                            }
                        }
                    }
                }
            }
        }
    }
"#;

pub const UPDATE_ITEM_STATUS_MUTATION: &str = r#"
    mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $optionId: String!) {
        updateProjectV2ItemFieldValue(
            input: {
                projectId: $projectId
                itemId: $itemId
                fieldId: $fieldId
                value: { singleSelectOptionId: $optionId }
            }
        ) {
            projectV2Item {
                id
            }
        }
    }
"#;

/// The `{data, errors}` envelope every GraphQL response arrives in.
#[derive(Debug, Deserialize)]
pub struct GraphQLEnvelope {
    pub data: Option<serde_json::Value>,
    pub errors: Option<Vec<GraphQLErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLErrorEntry {
    pub message: String,
}

/// Deserializes a `data` object into a typed response.
pub fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data).map_err(Error::from)
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSearchData {
    pub organization: Option<OrganizationProjects>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationProjects {
    #[serde(rename = "projectsV2")]
    pub projects: Connection<GraphQLProject>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLProject {
    pub id: String,
    pub title: String,
    pub number: Option<u64>,
}

/// Wrapper for `node(id:)` lookups, which return null for unknown ids.
#[derive(Debug, Deserialize)]
pub struct NodeData<T> {
    pub node: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItemsNode {
    pub items: ItemConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<GraphQLProjectItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLProjectItem {
    pub id: String,
    pub content: Option<GraphQLItemContent>,
    pub field_values: Connection<GraphQLFieldValue>,
}

/// Board item content. Only issues take part in reports; draft issues and
/// pull requests fall into `Other`.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum GraphQLItemContent {
    Issue(GraphQLIssueContent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLIssueContent {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent: Option<GraphQLParent>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLParent {
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub closed: bool,
}

impl From<GraphQLParent> for ParentIssue {
    fn from(parent: GraphQLParent) -> Self {
        Self {
            number: parent.number,
            title: parent.title,
            url: parent.url,
            closed: parent.closed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQLFieldName {
    pub name: String,
}

/// One member of the `ProjectV2ItemFieldValue` union.
///
/// Only text and single-select values carry the fields reports read; every
/// other member (dates, numbers, iterations, ...) is `Unsupported`.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum GraphQLFieldValue {
    #[serde(rename = "ProjectV2ItemFieldTextValue")]
    Text {
        text: Option<String>,
        field: Option<GraphQLFieldName>,
    },
    #[serde(rename = "ProjectV2ItemFieldSingleSelectValue")]
    SingleSelect {
        name: Option<String>,
        field: Option<GraphQLFieldName>,
    },
    #[serde(other)]
    Unsupported,
}

impl GraphQLFieldValue {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            GraphQLFieldValue::Text { field, .. } | GraphQLFieldValue::SingleSelect { field, .. } => {
                field.as_ref().map(|f| f.name.as_str())
            }
            GraphQLFieldValue::Unsupported => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            GraphQLFieldValue::Text { text, .. } => text.as_deref(),
            GraphQLFieldValue::SingleSelect { name, .. } => name.as_deref(),
            GraphQLFieldValue::Unsupported => None,
        }
    }
}

/// Status, Team and Kind values read off one board item.
#[derive(Debug, Default, PartialEq)]
pub struct ItemFields {
    pub status: Option<String>,
    pub team: Option<String>,
    pub kind: Option<String>,
}

/// Picks Status, Team and Kind by case-insensitive field name. The first
/// value seen for a field wins.
pub fn extract_item_fields(values: &[GraphQLFieldValue]) -> ItemFields {
    let mut fields = ItemFields::default();

    for value in values {
        let (Some(name), Some(text)) = (value.field_name(), value.value()) else {
            continue;
        };
        let slot = match name.to_lowercase().as_str() {
            "status" => &mut fields.status,
            "team" => &mut fields.team,
            "kind" => &mut fields.kind,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fields
}

/// Converts a board item into a [`ProjectItem`], or `None` when the item does
/// not wrap an issue.
pub fn convert_project_item(item: GraphQLProjectItem) -> Option<ProjectItem> {
    let Some(GraphQLItemContent::Issue(issue)) = item.content else {
        return None;
    };
    let fields = extract_item_fields(&item.field_values.nodes);

    Some(ProjectItem {
        item_id: item.id,
        issue_id: issue.id,
        issue_number: issue.number,
        title: issue.title,
        url: issue.url,
        state: issue.state,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        parent: issue.parent.map(ParentIssue::from),
        status: fields.status,
        team: fields.team,
        kind: fields.kind.as_deref().map(Kind::from_field_value),
    })
}

#[derive(Debug, Deserialize)]
pub struct ProjectFieldsNode {
    pub fields: Connection<GraphQLProjectField>,
}

/// A board field. Fields that are not single-select come back empty.
#[derive(Debug, Deserialize)]
pub struct GraphQLProjectField {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<StatusOption>,
}

/// Payload of [`UPDATE_ITEM_STATUS_MUTATION`]. A rejected mutation comes back
/// as a null payload next to the error entries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemData {
    pub update_project_v2_item_field_value: Option<UpdatedItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedItemPayload {
    pub project_v2_item: Option<UpdatedItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatedItem {
    pub id: String,
}

impl UpdateItemData {
    /// Id of the item the mutation changed, if it changed one.
    pub fn updated_item_id(self) -> Option<String> {
        self.update_project_v2_item_field_value?
            .project_v2_item
            .map(|item| item.id)
    }
}
