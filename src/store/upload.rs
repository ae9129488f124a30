//! Upload primitives (simple, presigned, multipart)

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ChecksumAlgorithm, CompletedMultipartUpload, CompletedPart};

use super::client::S3Store;
use super::types::CompletedPartInfo;
use crate::error::{Error, Result};

impl S3Store {
    /// Single PUT through the SDK
    pub(super) async fn upload_simple(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_sdk("put_object", key, e))?;

        Ok(response.e_tag().unwrap_or_default().to_string())
    }

    /// PUT straight to a presigned URL, bypassing the SDK
    pub(super) async fn upload_to_presigned_url(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut request = self.http.put(url).body(body);
        if let Some(ct) = content_type {
            request = request.header("Content-Type", ct);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 403 {
                return Err(Error::AccessDenied(format!("presigned PUT: {}", text)));
            }
            return Err(Error::transport(
                "presigned_put",
                format!("{} - {}", status, text),
            ));
        }

        Ok(())
    }

    pub(super) async fn initiate_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        with_checksums: bool,
    ) -> Result<String> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        if with_checksums {
            request = request.checksum_algorithm(ChecksumAlgorithm::Sha256);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_sdk("create_multipart_upload", key, e))?;

        response
            .upload_id()
            .map(|id| id.to_string())
            .ok_or_else(|| Error::transport("create_multipart_upload", "No upload ID returned"))
    }

    pub(super) async fn send_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        checksum_sha256: Option<&str>,
    ) -> Result<String> {
        let mut request = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body));

        if let Some(checksum) = checksum_sha256 {
            request = request.checksum_sha256(checksum);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_sdk("upload_part", key, e))?;

        response
            .e_tag()
            .map(|etag| etag.trim_matches('"').to_string())
            .ok_or_else(|| {
                Error::transport("upload_part", format!("No ETag received for part {}", part_number))
            })
    }

    pub(super) async fn finish_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> Result<()> {
        let completed_parts: Vec<CompletedPart> = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.etag)
                    .set_checksum_sha256(part.checksum_sha256.clone())
                    .build()
            })
            .collect();

        let completed_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload)
            .send()
            .await
            .map_err(|e| Error::from_sdk("complete_multipart_upload", key, e))?;

        Ok(())
    }

    pub(super) async fn cancel_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| Error::from_sdk("abort_multipart_upload", key, e))?;

        Ok(())
    }
}
