//! Remote API surface consumed by the lister, root resolver and tree builder
//!
//! `GoogleDriveConnector` is the production implementation; tests drive the
//! traversal logic with in-memory implementations.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::query::ListQuery;
use crate::types::{CollectionId, Item, ItemId, SharedDrive};

/// One page of a files.list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesPage {
    pub items: Vec<Item>,
    /// Continuation cursor; `None` on the final page
    pub next_page_token: Option<String>,
}

impl FilesPage {
    pub fn last(items: Vec<Item>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn with_next(items: Vec<Item>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(token.into()),
        }
    }
}

/// Authenticated handle on the Drive API
///
/// Implementations are shared read-only across concurrent sub-traversals.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetch one page of items matching `query`.
    async fn list_page(&self, query: &ListQuery, page_token: Option<String>) -> Result<FilesPage>;

    /// Fetch a shared drive's own metadata.
    async fn get_collection(&self, collection: &CollectionId) -> Result<SharedDrive>;

    /// Download a file's content.
    async fn download(&self, file_id: &ItemId) -> Result<Bytes>;
}
