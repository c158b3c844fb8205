//! files.list query construction
//!
//! Builds the `q` filter expression and the scoping parameters for a
//! listing. When a shared drive is given, the search corpus is that drive
//! (`corpora=drive`); otherwise it is the caller's own space
//! (`corpora=user`).

use crate::types::{CollectionId, ContainerId, FOLDER_MIME_TYPE};

/// Maximum results per page (Google Drive API limit)
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Fields requested for every listing
pub const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

/// A files.list request minus its continuation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    filter: String,
    collection: Option<CollectionId>,
    page_size: u32,
}

impl ListQuery {
    /// Non-trashed direct children of `parent` (or of everything visible
    /// when no parent is given), scoped to `collection` when present.
    pub fn children(parent: Option<&ContainerId>, collection: Option<&CollectionId>) -> Self {
        let mut filter = String::from("trashed = false");
        if let Some(parent) = parent {
            filter.push_str(&format!(" and '{}' in parents", escape_literal(parent.as_str())));
        }

        Self {
            filter,
            collection: collection.cloned(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Non-trashed folders named exactly `name` inside `collection`.
    pub fn folders_named(name: &str, collection: &CollectionId) -> Self {
        let filter = format!(
            "mimeType = '{}' and name = '{}' and trashed = false",
            FOLDER_MIME_TYPE,
            escape_literal(name)
        );

        Self {
            filter,
            collection: Some(collection.clone()),
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// The `q` expression
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn collection(&self) -> Option<&CollectionId> {
        self.collection.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// URL query string (without the leading `?`) for one page request.
    pub fn to_query_string(&self, page_token: Option<&str>) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("q", self.filter.clone()),
            ("fields", LIST_FIELDS.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];

        match &self.collection {
            Some(collection) => {
                params.push(("corpora", "drive".to_string()));
                params.push(("driveId", collection.as_str().to_string()));
                params.push(("includeItemsFromAllDrives", "true".to_string()));
                params.push(("supportsAllDrives", "true".to_string()));
            }
            None => {
                params.push(("corpora", "user".to_string()));
                params.push(("spaces", "drive".to_string()));
            }
        }

        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        params
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Escape a value for use inside a single-quoted query literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
