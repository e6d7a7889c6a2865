//! Cursor-paginated traversal of a board's items.

use futures::{Stream, TryStreamExt, stream};
use serde_json::json;
use tracing::debug;

use crate::{
    board::Board,
    error::{Error, Result},
    graphql::{NodeData, PROJECT_ITEMS_QUERY, ProjectItemsNode, convert_project_item, decode},
    types::{ProjectItem, QueryExecutor},
};

enum Cursor {
    Start,
    After(String),
    Exhausted,
}

struct Page {
    items: Vec<ProjectItem>,
    next: Cursor,
}

async fn fetch_page<Q: QueryExecutor + ?Sized>(
    executor: &Q,
    project_id: &str,
    after: Option<&str>,
) -> Result<Page> {
    let data = executor
        .execute(
            PROJECT_ITEMS_QUERY,
            json!({ "projectId": project_id, "after": after }),
        )
        .await?;
    let response: NodeData<ProjectItemsNode> = decode(data)?;

    let Some(node) = response.node else {
        return Ok(Page {
            items: Vec::new(),
            next: Cursor::Exhausted,
        });
    };
    let page_info = node.items.page_info;
    let raw_count = node.items.nodes.len();
    let items: Vec<ProjectItem> = node
        .items
        .nodes
        .into_iter()
        .filter_map(convert_project_item)
        .collect();

    debug!(
        raw_count,
        issues = items.len(),
        has_next_page = page_info.has_next_page,
        "Fetched project items page"
    );

    // A page claiming more results without a cursor would repeat forever.
    let next = match (page_info.has_next_page, page_info.end_cursor) {
        (true, Some(cursor)) => Cursor::After(cursor),
        _ => Cursor::Exhausted,
    };

    Ok(Page { items, next })
}

/// Lazily walks every issue item on a board, 100 per page.
///
/// The next page is requested only once the previous page's items have been
/// consumed, so dropping the stream early stops further requests. The stream
/// cannot be restarted. Board items that are not issues are skipped.
pub fn project_items<'a, Q: QueryExecutor + ?Sized>(
    executor: &'a Q,
    project_id: &'a str,
) -> impl Stream<Item = Result<ProjectItem>> + Send + 'a {
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let after = match cursor {
            Cursor::Exhausted => return Ok::<_, Error>(None),
            Cursor::Start => None,
            Cursor::After(cursor) => Some(cursor),
        };
        let page = fetch_page(executor, project_id, after.as_deref()).await?;
        let items = stream::iter(page.items.into_iter().map(Ok::<_, Error>));
        Ok(Some((items, page.next)))
    })
    .try_flatten()
}

/// Visits every page and returns all issue items on the board.
pub async fn scan_all<Q: QueryExecutor + ?Sized>(board: &Board<'_, Q>) -> Result<Vec<ProjectItem>> {
    let project_id = board.project_id().await?;
    let items: Vec<ProjectItem> = project_items(board.executor(), project_id)
        .try_collect()
        .await?;
    debug!(count = items.len(), "Collected all project items");
    Ok(items)
}

/// Returns the first item matching `predicate`, fetching no further pages
/// once it is found.
pub async fn find_item<Q, P>(board: &Board<'_, Q>, mut predicate: P) -> Result<Option<ProjectItem>>
where
    Q: QueryExecutor + ?Sized,
    P: FnMut(&ProjectItem) -> bool,
{
    let project_id = board.project_id().await?;
    let items = project_items(board.executor(), project_id);
    futures::pin_mut!(items);

    while let Some(item) = items.try_next().await? {
        if predicate(&item) {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

/// Finds the board item wrapping the issue with node id `issue_id`.
pub async fn find_item_by_issue_id<Q: QueryExecutor + ?Sized>(
    board: &Board<'_, Q>,
    issue_id: &str,
) -> Result<Option<ProjectItem>> {
    find_item(board, |item| item.issue_id == issue_id).await
}

/// Finds the board item wrapping issue `number` of repository `repository`
/// (the bare repository name, as used in report citations).
pub async fn find_item_by_number<Q: QueryExecutor + ?Sized>(
    board: &Board<'_, Q>,
    repository: &str,
    number: u64,
) -> Result<Option<ProjectItem>> {
    find_item(board, |item| {
        item.issue_number == number
            && crate::github::extract_repo_name_from_url(&item.url) == repository
    })
    .await
}
