//! Hierarchical tree builder
//!
//! Resolves a shared drive's root folder, then lists every container
//! beneath it and assembles a labeled tree. Sibling subtrees are expanded
//! concurrently; a semaphore bounds the number of listings in flight and a
//! permit is only held while one container is being listed.
//!
//! Failures are reported on the returned [`DriveTree`] rather than as an
//! `Err`:
//!
//! - a failed page leaves that container with whatever was listed before it
//! - a missing root yields an empty tree
//! - a cycle or an over-deep hierarchy discards the whole tree

use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use crate::api::DriveApi;
use crate::error::{GoogleDriveError, Result};
use crate::lister::list_children_detailed;
use crate::root::locate_root;
use crate::types::{CollectionId, ContainerId, ItemId, ItemKind};

/// Default number of container listings allowed in flight
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default nesting limit below the root folder
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Shape of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Folder with its direct children keyed by item id
    Container(BTreeMap<ItemId, TreeNode>),
    Leaf,
}

/// One node of the drive hierarchy
///
/// Serializes as `{"name": .., "children": {..}}` for containers and
/// `{"name": .., "is_file": true}` for leaves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TreeNodeRepr")]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
}

impl TreeNode {
    /// An empty container
    pub fn container(name: impl Into<String>) -> Self {
        Self::with_children(name, BTreeMap::new())
    }

    pub fn with_children(name: impl Into<String>, children: BTreeMap<ItemId, TreeNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Container(children),
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Leaf,
        }
    }

    /// Children of a container; `None` for leaves.
    pub fn children(&self) -> Option<&BTreeMap<ItemId, TreeNode>> {
        match &self.kind {
            NodeKind::Container(children) => Some(children),
            NodeKind::Leaf => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.values().map(TreeNode::node_count).sum())
            .unwrap_or(0)
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", &self.name)?;
        match &self.kind {
            NodeKind::Container(children) => map.serialize_entry("children", children)?,
            NodeKind::Leaf => map.serialize_entry("is_file", &true)?,
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct TreeNodeRepr {
    name: String,
    #[serde(default)]
    children: Option<BTreeMap<ItemId, TreeNode>>,
    #[serde(default)]
    is_file: bool,
}

impl TryFrom<TreeNodeRepr> for TreeNode {
    type Error = String;

    fn try_from(repr: TreeNodeRepr) -> std::result::Result<Self, Self::Error> {
        match (repr.is_file, repr.children) {
            (true, Some(_)) => Err(format!("node '{}' is both a file and a folder", repr.name)),
            (true, None) => Ok(TreeNode::leaf(repr.name)),
            (false, children) => Ok(TreeNode::with_children(
                repr.name,
                children.unwrap_or_default(),
            )),
        }
    }
}

/// Counters gathered while walking the hierarchy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub containers_listed: usize,
    pub leaves: usize,
    pub pages_fetched: usize,
    /// Listings that stopped early and left a container partially filled
    pub interrupted_listings: usize,
    /// Deepest container level reached (root is 0)
    pub max_depth_reached: usize,
}

impl AddAssign for TraversalStats {
    fn add_assign(&mut self, other: Self) {
        self.containers_listed += other.containers_listed;
        self.leaves += other.leaves;
        self.pages_fetched += other.pages_fetched;
        self.interrupted_listings += other.interrupted_listings;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
    }
}

/// Why a traversal produced an empty tree
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraversalFailure {
    /// No usable access token could be obtained
    #[error("credentials unavailable: {message}")]
    Credential { message: String },

    #[error("root folder '{name}' not found in shared drive {collection_id}")]
    RootNotFound { collection_id: String, name: String },

    /// The remote API failed before the root was known
    #[error("remote error: {message}")]
    Remote { message: String },

    #[error("unbounded recursion at item {item_id} (depth {depth})")]
    UnboundedRecursion { item_id: String, depth: usize },
}

impl TraversalFailure {
    /// Whether the traversal discovered a structural problem in the
    /// hierarchy, as opposed to simply not finding anything to walk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TraversalFailure::UnboundedRecursion { .. })
    }
}

impl From<GoogleDriveError> for TraversalFailure {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::RootNotFound {
                collection_id,
                name,
            } => TraversalFailure::RootNotFound {
                collection_id,
                name,
            },
            GoogleDriveError::UnboundedRecursion { item_id, depth } => {
                TraversalFailure::UnboundedRecursion { item_id, depth }
            }
            other => TraversalFailure::Remote {
                message: other.to_string(),
            },
        }
    }
}

/// Outcome of one traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveTree {
    pub traversal_id: Uuid,
    pub collection_id: CollectionId,
    /// Resolved root folder, when resolution succeeded
    pub root_id: Option<ContainerId>,
    pub root: TreeNode,
    pub stats: TraversalStats,
    pub failure: Option<TraversalFailure>,
}

impl DriveTree {
    /// An empty tree carrying `failure`.
    pub fn empty(collection_id: CollectionId, failure: TraversalFailure) -> Self {
        Self {
            traversal_id: Uuid::new_v4(),
            collection_id,
            root_id: None,
            root: TreeNode::container(""),
            stats: TraversalStats::default(),
            failure: Some(failure),
        }
    }

    pub fn failure(&self) -> Option<&TraversalFailure> {
        self.failure.as_ref()
    }

    /// True when nothing failed and no listing was cut short.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.stats.interrupted_listings == 0
    }

    /// `{"<root id>": node}`, or `{}` when the traversal failed.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        if let (Some(root_id), None) = (&self.root_id, &self.failure) {
            // TreeNode serialization cannot fail: string keys, no floats
            if let Ok(node) = serde_json::to_value(&self.root) {
                object.insert(root_id.to_string(), node);
            }
        }
        serde_json::Value::Object(object)
    }
}

/// Traversal limits
#[derive(Debug, Clone)]
pub struct TreeBuilderConfig {
    /// Container listings allowed in flight at once (1 = sequential)
    pub max_concurrency: usize,
    /// Nesting limit below the root
    pub max_depth: usize,
}

impl Default for TreeBuilderConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TreeBuilderConfig {
    /// Clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = clamp_concurrency(max_concurrency);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

fn clamp_concurrency(max_concurrency: usize) -> usize {
    max_concurrency.clamp(1, Semaphore::MAX_PERMITS)
}

/// Per-traversal state shared by every recursion level
struct Walk<'a> {
    collection: &'a CollectionId,
    permits: Semaphore,
}

/// Builds [`DriveTree`]s from a shared [`DriveApi`] handle
///
/// The builder holds no per-traversal state; every call to
/// [`TreeBuilder::build_tree`] walks the remote hierarchy from scratch.
pub struct TreeBuilder {
    api: Arc<dyn DriveApi>,
    config: TreeBuilderConfig,
}

impl TreeBuilder {
    pub fn new(api: Arc<dyn DriveApi>) -> Self {
        Self::with_config(api, TreeBuilderConfig::default())
    }

    pub fn with_config(api: Arc<dyn DriveApi>, config: TreeBuilderConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &TreeBuilderConfig {
        &self.config
    }

    /// Walk the hierarchy of `collection` below its root folder.
    #[instrument(skip(self), fields(collection_id = %collection, traversal_id))]
    pub async fn build_tree(&self, collection: &CollectionId) -> DriveTree {
        let traversal_id = Uuid::new_v4();
        Span::current().record("traversal_id", tracing::field::display(&traversal_id));

        let root = match locate_root(self.api.as_ref(), collection).await {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "Root resolution failed, returning empty tree");
                return DriveTree {
                    traversal_id,
                    ..DriveTree::empty(collection.clone(), e.into())
                };
            }
        };

        let walk = Walk {
            collection,
            permits: Semaphore::new(clamp_concurrency(self.config.max_concurrency)),
        };

        match self
            .expand(&walk, root.id.clone(), root.name.clone(), Vec::new())
            .await
        {
            Ok((node, stats)) => {
                info!(
                    containers = stats.containers_listed,
                    leaves = stats.leaves,
                    pages = stats.pages_fetched,
                    interrupted = stats.interrupted_listings,
                    "Drive tree built"
                );
                DriveTree {
                    traversal_id,
                    collection_id: collection.clone(),
                    root_id: Some(root.id),
                    root: node,
                    stats,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Traversal aborted, discarding tree");
                DriveTree {
                    traversal_id,
                    collection_id: collection.clone(),
                    root_id: Some(root.id),
                    root: TreeNode::container(root.name),
                    stats: TraversalStats::default(),
                    failure: Some(e.into()),
                }
            }
        }
    }

    /// List `container` and recurse into its sub-containers.
    ///
    /// `ancestors` holds every container from the root down to (excluding)
    /// this one.
    fn expand<'a>(
        &'a self,
        walk: &'a Walk<'a>,
        container: ContainerId,
        name: String,
        ancestors: Vec<ContainerId>,
    ) -> BoxFuture<'a, Result<(TreeNode, TraversalStats)>> {
        async move {
            let depth = ancestors.len();
            if depth > self.config.max_depth || ancestors.contains(&container) {
                return Err(GoogleDriveError::UnboundedRecursion {
                    item_id: container.to_string(),
                    depth,
                });
            }

            let listing = {
                let _permit = walk
                    .permits
                    .acquire()
                    .await
                    .map_err(|e| GoogleDriveError::Internal(e.to_string()))?;
                list_children_detailed(self.api.as_ref(), Some(&container), Some(walk.collection))
                    .await
            };

            let mut stats = TraversalStats {
                containers_listed: 1,
                pages_fetched: listing.pages,
                interrupted_listings: usize::from(!listing.is_complete()),
                max_depth_reached: depth,
                ..TraversalStats::default()
            };

            debug!(
                container_id = %container,
                depth,
                items = listing.items.len(),
                "Listed container"
            );

            let mut lineage = ancestors;
            lineage.push(container);

            let mut children = BTreeMap::new();
            let mut pending_ids = Vec::new();
            let mut pending = Vec::new();

            for item in listing.items {
                match item.kind {
                    ItemKind::Leaf => {
                        stats.leaves += 1;
                        children.insert(item.id, TreeNode::leaf(item.name));
                    }
                    ItemKind::Container => {
                        let child = ContainerId::new(item.id.as_str());
                        pending.push(self.expand(walk, child, item.name, lineage.clone()));
                        pending_ids.push(item.id);
                    }
                }
            }

            for (id, (node, child_stats)) in pending_ids.into_iter().zip(try_join_all(pending).await?) {
                stats += child_stats;
                children.insert(id, node);
            }

            Ok((TreeNode::with_children(name, children), stats))
        }
        .boxed()
    }
}

/// Build the tree of `collection` with default limits.
pub async fn build_tree(api: Arc<dyn DriveApi>, collection: &CollectionId) -> DriveTree {
    TreeBuilder::new(api).build_tree(collection).await
}
