//! Folder/item reconciliation: a delimiter listing becomes sorted folder and file items.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::warn;

use crate::error::Result;
use crate::item::{sort_items, StorageItem};
use crate::path::is_folder_key;
use crate::store::ops::grants_are_public;
use crate::store::{ObjectStore, RawListing};

/// List one folder level and reconcile it into items.
pub async fn list_items(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<StorageItem>> {
    let listing = store.list(prefix, Some("/")).await?;
    Ok(reconcile(store, prefix, listing, Utc::now()).await)
}

/// Build the item list for `prefix` from a raw listing.
///
/// The folder marker for `prefix` itself is dropped. ACL lookups that fail leave
/// the file private.
pub async fn reconcile(
    store: &dyn ObjectStore,
    prefix: &str,
    listing: RawListing,
    listed_at: DateTime<Utc>,
) -> Vec<StorageItem> {
    let mut items: Vec<StorageItem> = listing
        .common_prefixes
        .iter()
        .map(|p| StorageItem::folder(p.clone(), listed_at))
        .collect();

    let mut files = Vec::new();
    for obj in listing.contents {
        if obj.key == prefix {
            continue;
        }
        // Zero-byte markers for sub-folders only show up without a delimiter.
        if is_folder_key(&obj.key) {
            if !items.iter().any(|i| i.key == obj.key) {
                items.push(StorageItem::folder(obj.key, listed_at));
            }
            continue;
        }
        files.push(StorageItem::file(
            obj.key,
            obj.size,
            obj.last_modified.unwrap_or(listed_at),
        ));
    }

    let visibility = join_all(files.iter().map(|file| lookup_public(store, &file.key))).await;
    for (file, is_public) in files.iter_mut().zip(visibility) {
        file.is_public = is_public;
    }

    items.extend(files);
    sort_items(&mut items);
    items
}

async fn lookup_public(store: &dyn ObjectStore, key: &str) -> bool {
    match store.get_object_acl(key).await {
        Ok(grants) => grants_are_public(&grants),
        Err(e) => {
            warn!("reconcile: ACL lookup failed for {}, treating as private: {}", key, e);
            false
        }
    }
}
