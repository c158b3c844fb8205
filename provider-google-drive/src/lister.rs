//! Paginated item listing
//!
//! Follows continuation tokens until the final page. A failed page stops the
//! walk for that call only: whatever was accumulated is still returned and
//! the interrupting error travels alongside it in [`Listing`].

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::api::DriveApi;
use crate::error::GoogleDriveError;
use crate::query::ListQuery;
use crate::types::{CollectionId, ContainerId, Item};

/// Result of walking every page of one query
#[derive(Debug, Default)]
pub struct Listing {
    /// Items in arrival order
    pub items: Vec<Item>,
    /// Pages successfully fetched
    pub pages: usize,
    /// Error that cut the walk short, if any
    pub interruption: Option<GoogleDriveError>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.interruption.is_none()
    }
}

/// List the direct children of `parent` (or everything visible when `None`),
/// scoped to `collection` when given.
///
/// Partial results are returned on failure; see [`list_children_detailed`]
/// to find out whether the listing was cut short.
pub async fn list_children(
    api: &dyn DriveApi,
    parent: Option<&ContainerId>,
    collection: Option<&CollectionId>,
) -> Vec<Item> {
    list_children_detailed(api, parent, collection).await.items
}

/// Like [`list_children`] but also reports page count and interruption.
pub async fn list_children_detailed(
    api: &dyn DriveApi,
    parent: Option<&ContainerId>,
    collection: Option<&CollectionId>,
) -> Listing {
    list_matching(api, &ListQuery::children(parent, collection)).await
}

/// Walk every page of `query`.
#[instrument(skip(api, query), fields(filter = %query.filter()))]
pub async fn list_matching(api: &dyn DriveApi, query: &ListQuery) -> Listing {
    let mut listing = Listing::default();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = match api.list_page(query, page_token.clone()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    error = %e,
                    pages = listing.pages,
                    items = listing.items.len(),
                    "Listing interrupted, keeping partial result"
                );
                listing.interruption = Some(e);
                break;
            }
        };

        listing.pages += 1;
        listing.items.extend(page.items);

        match page.next_page_token {
            Some(token) if !seen_tokens.insert(token.clone()) => {
                warn!(
                    pages = listing.pages,
                    "Continuation token repeated, stopping pagination"
                );
                listing.interruption = Some(GoogleDriveError::PaginationLoop {
                    pages: listing.pages,
                });
                break;
            }
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(
        pages = listing.pages,
        items = listing.items.len(),
        complete = listing.is_complete(),
        "Listing finished"
    );

    listing
}
