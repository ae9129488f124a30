//! Object store access
//!
//! This module is organized into submodules:
//! - `types`: SDK-independent listing, ACL and multipart types
//! - `client`: `S3Store`, client creation and the `ObjectStore` impl
//! - `list`: delimiter and recursive listings
//! - `objects`: delete and copy
//! - `upload`: single PUT, presigned PUT and multipart primitives
//! - `presigned`: presigned URL generation
//! - `acl`: object ACL read/write
//! - `ops`: folder-aware operations built on the trait

mod acl;
mod client;
mod list;
#[cfg(test)]
pub(crate) mod memory;
mod objects;
pub mod ops;
mod presigned;
mod types;
mod upload;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{create_s3_client, encode_key, S3Store};
pub use types::{
    AclGrant, AclPermission, CannedAcl, CompletedPartInfo, GranteeType, RawListing, RawObject,
    ALL_USERS_GROUP,
};

/// Primitives of an S3-compatible store. Nothing here retries.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List under `prefix`, following continuation tokens to the end.
    /// With a delimiter, deeper keys are grouped into common prefixes.
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<RawListing>;

    /// Direct write. Returns the ETag.
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: Option<&str>)
        -> Result<String>;

    async fn presigned_put(&self, key: &str, expires_in_secs: u64) -> Result<String>;

    /// PUT a body to a URL produced by `presigned_put`.
    async fn put_presigned(&self, url: &str, body: Vec<u8>, content_type: Option<&str>)
        -> Result<()>;

    /// Returns the upload ID.
    async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        with_checksums: bool,
    ) -> Result<String>;

    /// Returns the part's ETag.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        checksum_sha256: Option<&str>,
    ) -> Result<String>;

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> Result<()>;

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()>;

    async fn delete_object(&self, key: &str) -> Result<()>;

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()>;

    async fn get_object_acl(&self, key: &str) -> Result<Vec<AclGrant>>;

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> Result<()>;

    async fn presigned_get(&self, key: &str, expires_in_secs: u64) -> Result<String>;

    /// Static URL for objects readable by everyone.
    fn public_url(&self, key: &str) -> String;
}
