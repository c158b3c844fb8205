//! Google Drive identifiers, items, and API response types
//!
//! Identifiers are opaque strings wrapped in newtypes so a shared-drive id
//! cannot be passed where a folder id is expected. The wire types mirror the
//! subset of Drive API v3 responses the provider requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type Google Drive reports for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of any Drive item (file or folder)
    ItemId
);

string_id!(
    /// Identifier of a folder-like item
    ContainerId
);

string_id!(
    /// Identifier of a shared drive
    CollectionId
);

impl From<ContainerId> for ItemId {
    fn from(id: ContainerId) -> Self {
        ItemId(id.0)
    }
}

impl ContainerId {
    /// View this container as a generic item id.
    pub fn to_item_id(&self) -> ItemId {
        ItemId(self.0.clone())
    }
}

/// Whether an item can hold children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Container,
    Leaf,
}

impl ItemKind {
    /// Classify a reported MIME type. Anything other than the folder marker
    /// is a leaf.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            ItemKind::Container
        } else {
            ItemKind::Leaf
        }
    }
}

/// A direct child returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn container(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self::new(id, name, ItemKind::Container)
    }

    pub fn leaf(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self::new(id, name, ItemKind::Leaf)
    }

    pub fn is_container(&self) -> bool {
        self.kind == ItemKind::Container
    }

    /// The item's id as a container id, if it is one.
    pub fn container_id(&self) -> Option<ContainerId> {
        self.is_container()
            .then(|| ContainerId::new(self.id.as_str()))
    }
}

/// Google Drive API file resource (only the requested fields)
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type; absent on some shortcut and third-party records
    #[serde(default)]
    pub mime_type: String,
}

impl From<DriveFile> for Item {
    fn from(file: DriveFile) -> Self {
        let kind = ItemKind::from_mime_type(&file.mime_type);
        Item::new(file.id, file.name, kind)
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,

    /// Whether the search may have missed results
    #[serde(default)]
    pub incomplete_search: bool,
}

/// Google Drive API drives.get response
///
/// See: https://developers.google.com/drive/api/v3/reference/drives#resource
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDrive {
    pub id: String,
    pub name: String,
}
