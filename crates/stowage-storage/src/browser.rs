//! Folder-style navigation over the flat key namespace.
//!
//! A listing is one delimiter level below a prefix: common prefixes become
//! folders and objects become files. The zero-byte placeholder object some
//! tools create for a folder (key equal to the prefix) is not shown.

use crate::keys::normalize_prefix;
use crate::{Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use stowage_core::constants::KEY_DELIMITER;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEntry {
    Folder {
        /// Folder name relative to the listed prefix, without the delimiter
        name: String,
        /// Full prefix to navigate into
        prefix: String,
    },
    File {
        /// File name relative to the listed prefix
        name: String,
        key: String,
        size: u64,
        last_modified: Option<DateTime<Utc>>,
    },
}

impl BrowserEntry {
    pub fn name(&self) -> &str {
        match self {
            BrowserEntry::Folder { name, .. } | BrowserEntry::File { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, BrowserEntry::Folder { .. })
    }
}

/// Folders first, then files, each in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub prefix: String,
    pub entries: Vec<BrowserEntry>,
}

impl DirectoryListing {
    pub fn folders(&self) -> impl Iterator<Item = &BrowserEntry> {
        self.entries.iter().filter(|e| e.is_folder())
    }

    pub fn files(&self) -> impl Iterator<Item = &BrowserEntry> {
        self.entries.iter().filter(|e| !e.is_folder())
    }
}

/// List one level below `prefix`.
pub async fn list_dir(storage: &dyn Storage, prefix: &str) -> StorageResult<DirectoryListing> {
    let prefix = normalize_prefix(prefix);
    let listing = storage.list(&prefix).await?;

    let folders = listing.common_prefixes.into_iter().filter_map(|p| {
        let name = p
            .strip_prefix(prefix.as_str())?
            .trim_end_matches(KEY_DELIMITER)
            .to_string();
        (!name.is_empty()).then_some(BrowserEntry::Folder { name, prefix: p })
    });

    let files = listing
        .objects
        .into_iter()
        .filter(|o| o.key != prefix)
        .filter_map(|o| {
            let name = o.key.strip_prefix(prefix.as_str())?.to_string();
            Some(BrowserEntry::File {
                name,
                key: o.key,
                size: o.size,
                last_modified: o.last_modified,
            })
        });

    let entries = folders.chain(files).collect();

    tracing::debug!(prefix = %prefix, "Listed directory");

    Ok(DirectoryListing { prefix, entries })
}

/// Prefix one level up: `a/b/` -> `a/`, `a/` -> root (`""`), root -> root.
pub fn parent_prefix(prefix: &str) -> String {
    let prefix = normalize_prefix(prefix);
    let trimmed = prefix.trim_end_matches(KEY_DELIMITER);
    match trimmed.rfind(KEY_DELIMITER) {
        Some(idx) => trimmed[..=idx].to_string(),
        None => String::new(),
    }
}

/// Rename `old_name` to `new_name` within `prefix` by copying then deleting.
///
/// The destination is overwritten if it exists. The source is only deleted
/// after the copy succeeded.
pub async fn rename(
    storage: &dyn Storage,
    prefix: &str,
    old_name: &str,
    new_name: &str,
) -> StorageResult<String> {
    if new_name.is_empty() || new_name.contains(KEY_DELIMITER) {
        return Err(StorageError::InvalidKey(format!(
            "Invalid file name: {:?}",
            new_name
        )));
    }

    let prefix = normalize_prefix(prefix);
    let from = format!("{}{}", prefix, old_name);
    let to = format!("{}{}", prefix, new_name);

    if from == to {
        return Ok(to);
    }

    storage.copy(&from, &to).await?;
    storage.delete(&from).await?;

    tracing::info!(from_key = %from, to_key = %to, "Renamed object");

    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockStorage;
    use bytes::Bytes;

    fn seeded() -> MockStorage {
        let storage = MockStorage::new();
        storage.set_file("photos/", Bytes::new());
        storage.set_file("photos/a.jpg", "a");
        storage.set_file("photos/2024/b.jpg", "b");
        storage.set_file("notes.txt", "n");
        storage
    }

    #[tokio::test]
    async fn test_list_dir_splits_folders_and_files() {
        let storage = seeded();

        let listing = list_dir(&storage, "photos/").await.unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["2024", "a.jpg"]);
        assert_eq!(listing.folders().count(), 1);
        assert_eq!(
            listing.files().next(),
            Some(&BrowserEntry::File {
                name: "a.jpg".to_string(),
                key: "photos/a.jpg".to_string(),
                size: 1,
                last_modified: None,
            })
        );
    }

    #[tokio::test]
    async fn test_list_dir_root() {
        let storage = seeded();

        let listing = list_dir(&storage, "").await.unwrap();

        assert_eq!(listing.prefix, "");
        assert_eq!(
            listing.entries[0],
            BrowserEntry::Folder {
                name: "photos".to_string(),
                prefix: "photos/".to_string(),
            }
        );
        assert_eq!(listing.entries[1].name(), "notes.txt");
    }

    #[test]
    fn test_parent_prefix() {
        assert_eq!(parent_prefix("a/b/"), "a/");
        assert_eq!(parent_prefix("a/"), "");
        assert_eq!(parent_prefix(""), "");
        assert_eq!(parent_prefix("a/b/c/"), "a/b/");
    }

    #[tokio::test]
    async fn test_rename_copies_then_deletes() {
        let storage = seeded();

        let key = rename(&storage, "photos/", "a.jpg", "c.jpg").await.unwrap();

        assert_eq!(key, "photos/c.jpg");
        assert_eq!(storage.get_file("photos/c.jpg"), Some(Bytes::from("a")));
        assert!(!storage.has_file("photos/a.jpg"));
    }

    #[tokio::test]
    async fn test_rename_missing_source_keeps_store_intact() {
        let storage = seeded();

        let result = rename(&storage, "photos/", "missing.jpg", "c.jpg").await;

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.has_file("photos/c.jpg"));
    }

    #[tokio::test]
    async fn test_rename_rejects_nested_name() {
        let storage = seeded();
        let result = rename(&storage, "photos/", "a.jpg", "x/c.jpg").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(storage.has_file("photos/a.jpg"));
    }

    #[tokio::test]
    async fn test_rename_to_same_name_is_noop() {
        let storage = seeded();
        rename(&storage, "photos", "a.jpg", "a.jpg").await.unwrap();
        assert!(storage.has_file("photos/a.jpg"));
    }
}
