//! Presigned URL generation

use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

use super::client::S3Store;
use crate::error::{Error, Result};

fn presigning_config(expires_in_secs: u64) -> Result<PresigningConfig> {
    PresigningConfig::builder()
        .expires_in(Duration::from_secs(expires_in_secs))
        .build()
        .map_err(|e| Error::Config(format!("Invalid presign expiry: {}", e)))
}

impl S3Store {
    /// Generate a presigned URL for object access
    pub(super) async fn generate_presigned_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String> {
        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config(expires_in_secs)?)
            .await
            .map_err(|e| Error::from_sdk("presign_get", key, e))?;

        Ok(presigned_request.uri().to_string())
    }

    /// Generate a presigned URL for uploading an object (PUT)
    pub(super) async fn generate_presigned_put_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String> {
        let presigned_request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config(expires_in_secs)?)
            .await
            .map_err(|e| Error::from_sdk("presign_put", key, e))?;

        Ok(presigned_request.uri().to_string())
    }
}
