//! S3 client creation and the `ObjectStore` implementation

use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::Client;

use super::types::{AclGrant, CannedAcl, CompletedPartInfo, RawListing};
use super::ObjectStore;
use crate::config::StoreConfig;
use crate::error::Result;

/// Build an SDK client for any S3-compatible endpoint.
pub fn create_s3_client(config: &StoreConfig) -> Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "bucket-explorer",
    );

    let mut builder = S3ConfigBuilder::new()
        .credentials_provider(credentials)
        .region(Region::new(config.region.clone()));

    if let Some(endpoint_url) = config.endpoint.as_deref() {
        builder = builder.endpoint_url(endpoint_url);
    }

    if config.force_path_style {
        builder = builder.force_path_style(true);
    }

    Client::from_conf(builder.build())
}

/// Encode a key for use in a URL path - each segment individually, `/` kept.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// One configured bucket. Built once at startup and shared.
pub struct S3Store {
    pub(super) client: Client,
    pub(super) http: reqwest::Client,
    pub(super) bucket: String,
    public_base: String,
}

impl S3Store {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            client: create_s3_client(config),
            http: reqwest::Client::new(),
            bucket: config.bucket.clone(),
            public_base: config.public_base(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<RawListing> {
        self.list_objects(prefix, delimiter).await
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        self.upload_simple(key, body, content_type).await
    }

    async fn presigned_put(&self, key: &str, expires_in_secs: u64) -> Result<String> {
        self.generate_presigned_put_url(key, expires_in_secs).await
    }

    async fn put_presigned(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        self.upload_to_presigned_url(url, body, content_type).await
    }

    async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        with_checksums: bool,
    ) -> Result<String> {
        self.initiate_multipart_upload(key, content_type, with_checksums)
            .await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        checksum_sha256: Option<&str>,
    ) -> Result<String> {
        self.send_part(key, upload_id, part_number, body, checksum_sha256)
            .await
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> Result<()> {
        self.finish_multipart_upload(key, upload_id, parts).await
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.cancel_multipart_upload(key, upload_id).await
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.remove_object(key).await
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()> {
        self.duplicate_object(source_key, dest_key).await
    }

    async fn get_object_acl(&self, key: &str) -> Result<Vec<AclGrant>> {
        self.fetch_acl(key).await
    }

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> Result<()> {
        self.apply_acl(key, acl).await
    }

    async fn presigned_get(&self, key: &str, expires_in_secs: u64) -> Result<String> {
        self.generate_presigned_url(key, expires_in_secs).await
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base, self.bucket, encode_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_key_keeps_separators() {
        assert_eq!(encode_key("my folder/a+b.txt"), "my%20folder/a%2Bb.txt");
        assert_eq!(encode_key("plain/key"), "plain/key");
    }

    #[test]
    fn public_url_uses_static_endpoint() {
        let store = S3Store::new(&StoreConfig {
            bucket: "media".into(),
            access_key_id: "AK".into(),
            secret_access_key: "SK".into(),
            endpoint: Some("https://s3.tebi.io".into()),
            ..StoreConfig::default()
        });
        assert_eq!(
            store.public_url("photos/cat 1.png"),
            "https://s3.tebi.io/media/photos/cat%201.png"
        );
        assert_eq!(store.bucket(), "media");
    }
}
