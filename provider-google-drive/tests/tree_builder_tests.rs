//! Integration tests for drive tree construction
//!
//! These tests drive the tree builder against an in-memory drive:
//! - End-to-end JSON shape
//! - Pagination and partial listing failures
//! - Root resolution by display name
//! - Concurrency limits and output determinism
//! - Cycle and depth guards

use async_trait::async_trait;
use bytes::Bytes;
use provider_google_drive::{
    CollectionId, ContainerId, DriveApi, FilesPage, GoogleDriveError, Item, ItemId, ListQuery,
    Result, SharedDrive, TraversalFailure, TreeBuilder, TreeBuilderConfig,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// In-memory drive
// ============================================================================

/// A shared drive held in memory
///
/// Children are served `page_size` at a time using the page index as the
/// continuation token. A container in `failing` returns a network error when
/// the given page index is requested.
struct InMemoryDrive {
    name: String,
    children: HashMap<String, Vec<Item>>,
    failing: HashMap<String, usize>,
    page_size: usize,
    metadata_error: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    list_calls: AtomicUsize,
    listed: Mutex<Vec<String>>,
}

impl InMemoryDrive {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: HashMap::new(),
            failing: HashMap::new(),
            page_size: 1000,
            metadata_error: false,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            listed: Mutex::new(Vec::new()),
        }
    }

    fn with_children(mut self, parent: &str, items: Vec<Item>) -> Self {
        self.children.insert(parent.to_string(), items);
        self
    }

    fn failing(mut self, parent: &str, at_page: usize) -> Self {
        self.failing.insert(parent.to_string(), at_page);
        self
    }

    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn all_items(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.children.values().flatten().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items.dedup_by(|a, b| a.id == b.id);
        items
    }

    fn parent_of(query: &ListQuery) -> Option<String> {
        query
            .filter()
            .strip_prefix("trashed = false and '")
            .and_then(|rest| rest.strip_suffix("' in parents"))
            .map(str::to_string)
    }
}

#[async_trait]
impl DriveApi for InMemoryDrive {
    async fn list_page(&self, query: &ListQuery, page_token: Option<String>) -> Result<FilesPage> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(2)).await;

        let page: usize = page_token.as_deref().map_or(0, |t| t.parse().unwrap_or(0));

        let result = match Self::parent_of(query) {
            Some(parent) => {
                self.listed.lock().unwrap().push(parent.clone());
                if self.failing.get(&parent) == Some(&page) {
                    Err(GoogleDriveError::NetworkError(format!("listing {} failed", parent)))
                } else {
                    let items = self.children.get(&parent).cloned().unwrap_or_default();
                    Ok(paginate(items, page, self.page_size))
                }
            }
            // Root search: every folder in the drive, name filtering left to the caller
            None => {
                let folders = self
                    .all_items()
                    .into_iter()
                    .filter(|item| item.is_container())
                    .collect();
                Ok(paginate(folders, page, self.page_size))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_collection(&self, collection: &CollectionId) -> Result<SharedDrive> {
        if self.metadata_error {
            return Err(GoogleDriveError::CollectionNotFound {
                collection_id: collection.to_string(),
            });
        }
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

fn paginate(items: Vec<Item>, page: usize, page_size: usize) -> FilesPage {
    let start = page * page_size;
    let chunk: Vec<Item> = items.iter().skip(start).take(page_size).cloned().collect();
    if start + page_size < items.len() {
        FilesPage::with_next(chunk, (page + 1).to_string())
    } else {
        FilesPage::last(chunk)
    }
}

/// The drive used by most tests: `R -> [A/, B]`, `A -> [C]`, where the drive
/// and its root folder are both named "R".
fn sample_drive() -> InMemoryDrive {
    InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("A", "A"), Item::leaf("B", "B")])
        .with_children("A", vec![Item::leaf("C", "C")])
}

fn collection() -> CollectionId {
    CollectionId::new("0AAdrive")
}

fn builder(drive: InMemoryDrive, max_concurrency: usize) -> (Arc<InMemoryDrive>, TreeBuilder) {
    let drive = Arc::new(drive);
    let config = TreeBuilderConfig::default().with_max_concurrency(max_concurrency);
    let builder = TreeBuilder::with_config(drive.clone(), config);
    (drive, builder)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_json_shape() {
    let (_, builder) = builder(sample_drive(), 4);

    let tree = builder.build_tree(&collection()).await;

    assert!(tree.failure().is_none());
    assert!(tree.is_complete());
    assert_eq!(tree.root_id, Some(ContainerId::new("R")));
    assert_eq!(
        tree.to_json(),
        json!({
            "R": {
                "name": "R",
                "children": {
                    "A": {
                        "name": "A",
                        "children": {
                            "C": {"name": "C", "is_file": true}
                        }
                    },
                    "B": {"name": "B", "is_file": true}
                }
            }
        })
    );
    assert_eq!(tree.stats.containers_listed, 2);
    assert_eq!(tree.stats.leaves, 2);
    assert_eq!(tree.stats.max_depth_reached, 1);
}

#[tokio::test]
async fn test_unbounded_concurrency_setting_still_builds() {
    let drive = Arc::new(sample_drive());
    let config = TreeBuilderConfig {
        max_concurrency: usize::MAX,
        ..TreeBuilderConfig::default()
    };
    let builder = TreeBuilder::with_config(drive.clone(), config);

    let tree = builder.build_tree(&collection()).await;

    assert!(tree.is_complete());
    assert_eq!(tree.stats.containers_listed, 2);
}

#[tokio::test]
async fn test_empty_container_has_empty_children() {
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("E", "Empty")]);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;
    let json = tree.to_json();

    assert_eq!(json["R"]["children"]["E"], json!({"name": "Empty", "children": {}}));
}

#[tokio::test]
async fn test_leaf_nodes_have_no_children_key() {
    let (_, builder) = builder(sample_drive(), 4);

    let json = builder.build_tree(&collection()).await.to_json();
    let leaf = json["R"]["children"]["B"].as_object().unwrap();

    assert!(!leaf.contains_key("children"));
    assert_eq!(leaf["is_file"], json!(true));
}

#[tokio::test]
async fn test_children_span_multiple_pages() {
    let files: Vec<Item> = (0..23)
        .map(|i| Item::leaf(format!("f{:02}", i), format!("file {}", i)))
        .collect();
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", files)
        .with_page_size(5);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert_eq!(tree.root.children().unwrap().len(), 23);
    assert_eq!(tree.stats.leaves, 23);
    assert_eq!(tree.stats.pages_fetched, 5);
}

#[tokio::test]
async fn test_partial_failure_keeps_siblings() {
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children(
            "R",
            vec![Item::container("A", "A"), Item::container("B", "B")],
        )
        .with_children("A", vec![Item::leaf("C", "C")])
        .with_children("B", vec![Item::leaf("D", "D")])
        .failing("B", 0);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert!(tree.failure().is_none());
    assert!(!tree.is_complete());
    assert_eq!(tree.stats.interrupted_listings, 1);

    let json = tree.to_json();
    assert_eq!(
        json["R"]["children"]["A"],
        json!({"name": "A", "children": {"C": {"name": "C", "is_file": true}}})
    );
    assert_eq!(json["R"]["children"]["B"], json!({"name": "B", "children": {}}));
}

#[tokio::test]
async fn test_failure_after_first_page_keeps_that_page() {
    let files: Vec<Item> = (0..6)
        .map(|i| Item::leaf(format!("f{}", i), format!("file {}", i)))
        .collect();
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("A", "A")])
        .with_children("A", files)
        .with_page_size(4)
        .failing("A", 1);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    let a = &tree.root.children().unwrap()[&ItemId::new("A")];
    assert_eq!(a.children().unwrap().len(), 4);
    assert_eq!(tree.stats.interrupted_listings, 1);
}

#[tokio::test]
async fn test_traversal_is_idempotent() {
    let (drive, builder) = builder(sample_drive(), 4);

    let first = builder.build_tree(&collection()).await;
    let calls_after_first = drive.list_calls.load(Ordering::SeqCst);
    let second = builder.build_tree(&collection()).await;

    assert_eq!(first.root, second.root);
    assert_eq!(first.stats, second.stats);
    assert_ne!(first.traversal_id, second.traversal_id);
    // No caching: the second traversal lists everything again
    assert_eq!(drive.list_calls.load(Ordering::SeqCst), calls_after_first * 2);
}

fn wide_drive() -> InMemoryDrive {
    let mut drive = InMemoryDrive::new("Corpus").with_children(
        "drive-top",
        vec![Item::container("root", "Corpus")],
    );

    let folders: Vec<Item> = (0..6)
        .map(|i| Item::container(format!("d{}", i), format!("dir {}", i)))
        .collect();
    drive = drive.with_children("root", folders);

    for i in 0..6 {
        let mut items: Vec<Item> = (0..3)
            .map(|j| Item::leaf(format!("d{}-f{}", i, j), format!("file {}", j)))
            .collect();
        items.push(Item::container(format!("d{}-sub", i), "sub"));
        drive = drive
            .with_children(&format!("d{}", i), items)
            .with_children(&format!("d{}-sub", i), vec![Item::leaf(format!("d{}-deep", i), "deep")]);
    }

    drive
}

#[tokio::test]
async fn test_concurrency_does_not_change_output() {
    let (sequential_drive, sequential) = builder(wide_drive(), 1);
    let (_, parallel) = builder(wide_drive(), 8);

    let a = sequential.build_tree(&collection()).await;
    let b = parallel.build_tree(&collection()).await;

    assert_eq!(a.root, b.root);
    assert_eq!(a.to_json(), b.to_json());
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.root.node_count(), 1 + 6 * (1 + 3 + 1 + 1));
    assert_eq!(sequential_drive.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_in_flight_listings_are_bounded() {
    let (drive, builder) = builder(wide_drive(), 3);

    let tree = builder.build_tree(&collection()).await;

    assert!(tree.is_complete());
    assert!(drive.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_cycle_is_unbounded_recursion() {
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("A", "A")])
        .with_children("A", vec![Item::container("B", "B")])
        .with_children("B", vec![Item::container("A", "A")]);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert!(matches!(
        tree.failure(),
        Some(TraversalFailure::UnboundedRecursion { item_id, .. }) if item_id == "A"
    ));
    assert!(tree.root.children().unwrap().is_empty());
    assert_eq!(tree.to_json(), json!({}));
}

#[tokio::test]
async fn test_self_parent_is_unbounded_recursion() {
    let drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("R", "R")]);
    let (_, builder) = builder(drive, 1);

    let tree = builder.build_tree(&collection()).await;

    assert!(matches!(
        tree.failure(),
        Some(TraversalFailure::UnboundedRecursion { depth: 1, .. })
    ));
}

#[tokio::test]
async fn test_depth_limit_is_unbounded_recursion() {
    let mut drive = InMemoryDrive::new("R")
        .with_children("drive-top", vec![Item::container("R", "R")])
        .with_children("R", vec![Item::container("L1", "L1")]);
    for level in 1..10 {
        drive = drive.with_children(
            &format!("L{}", level),
            vec![Item::container(format!("L{}", level + 1), "next")],
        );
    }
    let drive = Arc::new(drive);
    let builder = TreeBuilder::with_config(
        drive.clone(),
        TreeBuilderConfig::default().with_max_depth(3),
    );

    let tree = builder.build_tree(&collection()).await;

    assert!(matches!(
        tree.failure(),
        Some(TraversalFailure::UnboundedRecursion { depth: 4, .. })
    ));
    assert!(tree.failure().unwrap().is_fatal());
}

#[tokio::test]
async fn test_missing_root_gives_empty_tree() {
    let drive = InMemoryDrive::new("Missing")
        .with_children("drive-top", vec![Item::container("R", "R")]);
    let (_, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert!(matches!(
        tree.failure(),
        Some(TraversalFailure::RootNotFound { name, .. }) if name == "Missing"
    ));
    assert!(tree.root_id.is_none());
    assert_eq!(tree.to_json(), json!({}));
}

#[tokio::test]
async fn test_root_matches_exact_folder_name() {
    let drive = InMemoryDrive::new("X")
        .with_children(
            "drive-top",
            vec![
                Item::leaf("file-x", "X"),
                Item::container("near-x", "X-archive"),
                Item::container("real-x", "X"),
            ],
        )
        .with_children("real-x", vec![Item::leaf("k", "kept")])
        .with_children("near-x", vec![Item::leaf("n", "ignored")]);
    let (drive, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert_eq!(tree.root_id, Some(ContainerId::new("real-x")));
    assert_eq!(tree.root.name, "X");
    assert!(tree.root.children().unwrap().contains_key(&ItemId::new("k")));
    assert!(!drive.listed.lock().unwrap().contains(&"near-x".to_string()));
}

#[tokio::test]
async fn test_collection_metadata_failure_is_remote() {
    let mut drive = sample_drive();
    drive.metadata_error = true;
    let (drive, builder) = builder(drive, 4);

    let tree = builder.build_tree(&collection()).await;

    assert!(matches!(tree.failure(), Some(TraversalFailure::Remote { .. })));
    assert_eq!(drive.list_calls.load(Ordering::SeqCst), 0);
}
