//! Root folder resolution
//!
//! A shared drive's distinguished root is the folder inside it whose name
//! equals the drive's own display name.

use tracing::{debug, info, instrument, warn};

use crate::api::DriveApi;
use crate::error::{GoogleDriveError, Result};
use crate::lister::list_matching;
use crate::query::ListQuery;
use crate::types::{CollectionId, ContainerId};

/// The resolved root container and the display name it was matched on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFolder {
    pub id: ContainerId,
    pub name: String,
}

/// Find the root folder of `collection`.
///
/// The server-side filter is re-checked locally so only folders named
/// exactly after the drive qualify. When several match, the smallest id
/// wins.
#[instrument(skip(api), fields(collection_id = %collection))]
pub async fn locate_root(api: &dyn DriveApi, collection: &CollectionId) -> Result<RootFolder> {
    let drive = api.get_collection(collection).await?;
    debug!(name = %drive.name, "Resolved shared drive name");

    let listing = list_matching(api, &ListQuery::folders_named(&drive.name, collection)).await;

    let root = listing
        .items
        .iter()
        .filter(|item| item.name == drive.name)
        .filter_map(|item| item.container_id())
        .min();

    match (root, listing.interruption) {
        (Some(id), interruption) => {
            if interruption.is_some() {
                warn!("Root search was interrupted; choosing among candidates seen so far");
            }
            info!(root_id = %id, "Resolved root folder");
            Ok(RootFolder {
                id,
                name: drive.name,
            })
        }
        (None, Some(e)) => Err(e),
        (None, None) => Err(GoogleDriveError::RootNotFound {
            collection_id: collection.to_string(),
            name: drive.name,
        }),
    }
}

/// Resolve only the root container id of `collection`.
pub async fn resolve_root(api: &dyn DriveApi, collection: &CollectionId) -> Result<ContainerId> {
    locate_root(api, collection).await.map(|root| root.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FilesPage;
    use crate::types::{Item, ItemId, SharedDrive};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct FixedDrive {
        name: String,
        search: Vec<Item>,
        fail_search: bool,
        queries: Mutex<Vec<ListQuery>>,
    }

    impl FixedDrive {
        fn new(name: &str, search: Vec<Item>) -> Self {
            Self {
                name: name.to_string(),
                search,
                fail_search: false,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DriveApi for FixedDrive {
        async fn list_page(&self, query: &ListQuery, _page_token: Option<String>) -> Result<FilesPage> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_search {
                return Err(GoogleDriveError::NetworkError("timed out".to_string()));
            }
            Ok(FilesPage::last(self.search.clone()))
        }

        async fn get_collection(&self, collection: &CollectionId) -> Result<SharedDrive> {
            Ok(SharedDrive {
                id: collection.to_string(),
                name: self.name.clone(),
            })
        }

        async fn download(&self, file_id: &ItemId) -> Result<Bytes> {
            Err(GoogleDriveError::FileNotFound {
                file_id: file_id.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_matches_exact_folder_name_only() {
        let api = FixedDrive::new(
            "X",
            vec![
                Item::leaf("file-x", "X"),
                Item::container("near", "X "),
                Item::container("lower", "x"),
                Item::container("root-x", "X"),
            ],
        );
        let collection = CollectionId::new("0AAdrive");

        let root = locate_root(&api, &collection).await.unwrap();

        assert_eq!(root.id, ContainerId::new("root-x"));
        assert_eq!(root.name, "X");

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].collection(), Some(&collection));
        assert!(queries[0].filter().contains("name = 'X'"));
        assert!(queries[0].filter().contains("mimeType = 'application/vnd.google-apps.folder'"));
    }

    #[tokio::test]
    async fn test_smallest_id_wins_tie() {
        let api = FixedDrive::new(
            "Corpus",
            vec![
                Item::container("zz9", "Corpus"),
                Item::container("aa1", "Corpus"),
                Item::container("mm5", "Corpus"),
            ],
        );

        let id = resolve_root(&api, &CollectionId::new("d")).await.unwrap();

        assert_eq!(id, ContainerId::new("aa1"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_root_not_found() {
        let api = FixedDrive::new("Corpus", vec![Item::leaf("f", "Corpus")]);

        let result = resolve_root(&api, &CollectionId::new("d")).await;

        assert!(matches!(
            result,
            Err(GoogleDriveError::RootNotFound { ref name, .. }) if name == "Corpus"
        ));
    }

    #[tokio::test]
    async fn test_failed_search_reports_transport_error() {
        let mut api = FixedDrive::new("Corpus", Vec::new());
        api.fail_search = true;

        let result = resolve_root(&api, &CollectionId::new("d")).await;

        assert!(matches!(result, Err(GoogleDriveError::NetworkError(_))));
    }
}
