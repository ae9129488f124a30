//! Folder-aware operations composed from `ObjectStore` primitives.
//!
//! Folders are prefixes, so "delete folder" and "rename folder" fan out over every
//! key under the prefix. None of these are transactional.

use log::{info, warn};

use super::types::{AclGrant, AclPermission, CannedAcl, GranteeType, ALL_USERS_GROUP};
use super::ObjectStore;
use crate::error::{Error, Result};
use crate::path::{is_folder_key, normalize_prefix};

/// Whether a grant list gives everyone read access.
pub fn grants_are_public(grants: &[AclGrant]) -> bool {
    grants.iter().any(|grant| {
        grant.grantee_type == GranteeType::Group
            && grant.uri.as_deref() == Some(ALL_USERS_GROUP)
            && grant.permission == Some(AclPermission::Read)
    })
}

/// Every key under `prefix`, folder markers included.
pub async fn list_keys(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>> {
    let listing = store.list(prefix, None).await?;
    Ok(listing.contents.into_iter().map(|obj| obj.key).collect())
}

/// Create an empty folder marker. Returns the marker key.
pub async fn create_folder(store: &dyn ObjectStore, path: &str) -> Result<String> {
    let key = normalize_prefix(path);
    if key.is_empty() {
        return Err(Error::InvalidName("folder path cannot be empty".into()));
    }
    store.put_object(&key, Vec::new(), None).await?;
    info!("create_folder: {}", key);
    Ok(key)
}

/// Delete a file, or a folder with everything below it.
///
/// Returns the number of objects removed, the folder marker included.
pub async fn delete_item(store: &dyn ObjectStore, key: &str) -> Result<usize> {
    if !is_folder_key(key) {
        store.delete_object(key).await?;
        info!("delete_item: {}", key);
        return Ok(1);
    }

    let keys = list_keys(store, key).await?;
    let mut deleted = 0;
    for child in keys.iter().filter(|k| k.as_str() != key) {
        store.delete_object(child).await?;
        deleted += 1;
    }
    store.delete_object(key).await?;
    deleted += 1;

    info!("delete_item: {} ({} objects)", key, deleted);
    Ok(deleted)
}

/// Rename by copy-then-delete.
///
/// For folders every key under the prefix is copied before any original is
/// deleted. A failed copy removes the copies made so far and returns
/// `Error::RenameAborted`. If copying succeeded but deleting did not, both keys
/// stay reachable and `Error::RenameIncomplete` says so.
pub async fn rename_item(store: &dyn ObjectStore, old_key: &str, new_key: &str) -> Result<()> {
    if old_key == new_key {
        return Ok(());
    }
    if is_folder_key(old_key) != is_folder_key(new_key) {
        return Err(Error::InvalidName(format!(
            "cannot rename {} to {}: file/folder mismatch",
            old_key, new_key
        )));
    }

    let moves: Vec<(String, String)> = if is_folder_key(old_key) {
        let mut keys = list_keys(store, old_key).await?;
        if !keys.iter().any(|k| k == old_key) {
            keys.push(old_key.to_string());
        }
        keys.into_iter()
            .map(|k| {
                let dest = format!("{}{}", new_key, &k[old_key.len()..]);
                (k, dest)
            })
            .collect()
    } else {
        vec![(old_key.to_string(), new_key.to_string())]
    };

    let mut copied: Vec<&str> = Vec::with_capacity(moves.len());
    for (from, to) in &moves {
        let outcome = if from == old_key && is_folder_key(old_key) {
            // The marker may only exist implicitly; write a fresh one.
            store.put_object(to, Vec::new(), None).await.map(|_| ())
        } else {
            store.copy_object(from, to).await
        };
        if let Err(e) = outcome {
            warn!(
                "rename_item: copying {} failed, removing {} copies: {}",
                from,
                copied.len(),
                e
            );
            let left_behind = remove_copies(store, &copied).await;
            return Err(Error::RenameAborted {
                from: old_key.to_string(),
                to: new_key.to_string(),
                reason: e.to_string(),
                left_behind,
            });
        }
        copied.push(to.as_str());
    }

    for (from, _) in &moves {
        if let Err(e) = store.delete_object(from).await {
            warn!("rename_item: copied {} -> {} but delete failed: {}", old_key, new_key, e);
            return Err(Error::RenameIncomplete {
                from: old_key.to_string(),
                to: new_key.to_string(),
                reason: e.to_string(),
            });
        }
    }

    info!("rename_item: {} -> {}", old_key, new_key);
    Ok(())
}

/// Best-effort removal of partial rename copies. Returns the keys that remain.
async fn remove_copies(store: &dyn ObjectStore, keys: &[&str]) -> Vec<String> {
    let mut left_behind = Vec::new();
    for key in keys {
        if let Err(e) = store.delete_object(key).await {
            warn!("rename_item: could not remove copy {}: {}", key, e);
            left_behind.push(key.to_string());
        }
    }
    left_behind
}

pub async fn is_public(store: &dyn ObjectStore, key: &str) -> Result<bool> {
    let grants = store.get_object_acl(key).await?;
    Ok(grants_are_public(&grants))
}

/// Apply a canned ACL, then read it back. Returns the confirmed state.
pub async fn set_public(store: &dyn ObjectStore, key: &str, public: bool) -> Result<bool> {
    store
        .put_object_acl(key, CannedAcl::from_public(public))
        .await?;
    let confirmed = is_public(store, key).await?;
    info!(
        "set_public: {} is now {}",
        key,
        if confirmed { "public" } else { "private" }
    );
    Ok(confirmed)
}

/// Static URL for public objects, presigned GET for private ones.
pub async fn file_url(store: &dyn ObjectStore, key: &str, expires_in_secs: u64) -> Result<String> {
    if is_public(store, key).await? {
        Ok(store.public_url(key))
    } else {
        store.presigned_get(key, expires_in_secs).await
    }
}
