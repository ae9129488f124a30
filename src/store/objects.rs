//! Object operations (delete, copy)

use super::client::{encode_key, S3Store};
use crate::error::{Error, Result};

impl S3Store {
    /// Delete a single object
    pub(super) async fn remove_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("delete_object", key, e))?;
        Ok(())
    }

    /// Server-side copy within the bucket
    pub(super) async fn duplicate_object(&self, source_key: &str, dest_key: &str) -> Result<()> {
        let copy_source = format!("{}/{}", self.bucket, encode_key(source_key));

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("copy_object", source_key, e))?;

        Ok(())
    }
}
