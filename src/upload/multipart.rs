//! Chunked multipart upload with abort-on-error

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use super::source::UploadFile;
use crate::config::{UploadSettings, MAX_PARTS};
use crate::error::{Error, Result};
use crate::store::{CompletedPartInfo, ObjectStore};

/// Number of parts for `size` bytes split into `chunk_size` chunks (at least one).
pub fn part_count(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size).max(1)
}

/// Upload `file` to `key` as a multipart session. Returns the upload ID.
///
/// `on_bytes` receives the running total of uploaded bytes after each part.
/// Any failure aborts the session before the error is returned.
pub async fn upload_multipart(
    store: &dyn ObjectStore,
    settings: &UploadSettings,
    file: &UploadFile,
    key: &str,
    on_bytes: &(dyn Fn(u64) + Send + Sync),
) -> Result<String> {
    let total_parts = part_count(file.size(), settings.chunk_size);
    if total_parts > MAX_PARTS {
        return Err(Error::Config(format!(
            "{} needs {} parts of {} bytes, more than the {} allowed",
            file.name, total_parts, settings.chunk_size, MAX_PARTS
        )));
    }

    let upload_id = store
        .create_multipart_upload(key, file.content_type.as_deref(), settings.verify_parts)
        .await?;

    let outcome = async {
        let parts = upload_parts(store, settings, file, key, &upload_id, on_bytes).await?;
        store.complete_multipart_upload(key, &upload_id, &parts).await
    }
    .await;

    if let Err(e) = outcome {
        warn!("multipart: {} upload {} failed, aborting: {}", key, upload_id, e);
        if let Err(abort_err) = store.abort_multipart_upload(key, &upload_id).await {
            warn!("multipart: abort of {} for {} failed: {}", upload_id, key, abort_err);
        }
        return Err(Error::MultipartAborted {
            key: key.to_string(),
            upload_id,
            reason: e.to_string(),
        });
    }

    Ok(upload_id)
}

async fn upload_parts(
    store: &dyn ObjectStore,
    settings: &UploadSettings,
    file: &UploadFile,
    key: &str,
    upload_id: &str,
    on_bytes: &(dyn Fn(u64) + Send + Sync),
) -> Result<Vec<CompletedPartInfo>> {
    let file_size = file.size();
    let chunk_size = settings.chunk_size;
    let total_parts = part_count(file_size, chunk_size);
    let uploaded_bytes = AtomicU64::new(0);
    let uploaded_bytes = &uploaded_bytes;

    // `buffered` yields in input order, so the manifest stays sorted by part number.
    stream::iter(1..=total_parts)
        .map(|part_number| async move {
            let start = (part_number - 1) * chunk_size;
            let len = chunk_size.min(file_size - start);
            let number = i32::try_from(part_number).map_err(|_| {
                Error::Config(format!("part number {} out of range", part_number))
            })?;
            let data = file.read_range(start, len).await?;
            let checksum = settings
                .verify_parts
                .then(|| BASE64.encode(Sha256::digest(&data)));

            let etag = store
                .upload_part(key, upload_id, number, data, checksum.as_deref())
                .await?;

            let total = uploaded_bytes.fetch_add(len, Ordering::SeqCst) + len;
            debug!(
                "multipart: {} part {}/{} done ({} of {} bytes)",
                key, part_number, total_parts, total, file_size
            );
            on_bytes(total);

            Ok::<_, Error>(CompletedPartInfo {
                part_number: number,
                etag,
                checksum_sha256: checksum,
            })
        })
        .buffered(settings.part_concurrency.max(1))
        .try_collect()
        .await
}
