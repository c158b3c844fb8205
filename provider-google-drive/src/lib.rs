//! # Google Drive Provider
//!
//! Builds a hierarchical view of a Google Drive shared drive.
//!
//! ## Overview
//!
//! This crate provides:
//! - `GoogleDriveConnector`, a Drive API v3 client over the host `HttpClient`
//! - Paginated child listing that keeps partial results on failure
//! - Root folder resolution by matching the shared drive's display name
//! - A concurrent, cycle-guarded tree builder producing [`DriveTree`]
//!
//! ## Example
//!
//! ```ignore
//! use provider_google_drive::{CollectionId, GoogleDriveConnector, TreeBuilder};
//! use std::sync::Arc;
//!
//! let api = Arc::new(GoogleDriveConnector::new(http_client, access_token));
//! let tree = TreeBuilder::new(api).build_tree(&CollectionId::new("0AAbc")).await;
//! println!("{}", tree.to_json());
//! ```

pub mod api;
pub mod connector;
pub mod error;
pub mod lister;
pub mod query;
pub mod root;
pub mod tree;
pub mod types;

pub use api::{DriveApi, FilesPage};
pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
pub use lister::{list_children, list_children_detailed, list_matching, Listing};
pub use query::ListQuery;
pub use root::{locate_root, resolve_root, RootFolder};
pub use tree::{
    build_tree, DriveTree, NodeKind, TraversalFailure, TraversalStats, TreeBuilder,
    TreeBuilderConfig, TreeNode,
};
pub use types::{CollectionId, ContainerId, Item, ItemId, ItemKind, SharedDrive};
