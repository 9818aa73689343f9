//! Shared key handling for storage backends.
//!
//! Keys are `prefix + name`, where a prefix is empty (root) or ends with `/`.

use stowage_core::constants::KEY_DELIMITER;

use crate::{StorageError, StorageResult};

/// Normalize a user-supplied prefix: no leading delimiter, and a trailing
/// delimiter unless it is the root.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_start_matches(KEY_DELIMITER);
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.ends_with(KEY_DELIMITER) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, KEY_DELIMITER)
    }
}

/// Build the object key for a file uploaded under `prefix`.
pub fn object_key(prefix: &str, name: &str) -> String {
    format!("{}{}", normalize_prefix(prefix), name)
}

/// Reject keys that could escape a filesystem root or address nothing.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with(KEY_DELIMITER) || key.split(KEY_DELIMITER).any(|part| part == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
