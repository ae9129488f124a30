//! List operations

use chrono::{DateTime, Utc};
use log::debug;

use super::client::S3Store;
use super::types::{RawListing, RawObject};
use crate::error::{Error, Result};

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

impl S3Store {
    /// List objects under a prefix, all pages, with an optional delimiter
    pub(super) async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<RawListing> {
        let mut listing = RawListing::default();
        let mut continuation_token: Option<String> = None;
        let mut page_count = 0;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(1000);

            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(d) = delimiter {
                request = request.delimiter(d);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::from_sdk("list_objects", prefix, e))?;
            page_count += 1;

            listing
                .contents
                .extend(response.contents().iter().filter_map(|obj| {
                    Some(RawObject {
                        key: obj.key()?.to_string(),
                        size: obj.size().unwrap_or(0).max(0) as u64,
                        last_modified: obj.last_modified().and_then(to_chrono),
                        etag: obj.e_tag().unwrap_or_default().to_string(),
                    })
                }));

            for folder in response
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(|s| s.to_string()))
            {
                if !listing.common_prefixes.contains(&folder) {
                    listing.common_prefixes.push(folder);
                }
            }

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            continuation_token = response.next_continuation_token().map(|s| s.to_string());
            if continuation_token.is_none() {
                break;
            }
        }

        debug!(
            "list_objects: prefix={:?} pages={} folders={} objects={}",
            prefix,
            page_count,
            listing.common_prefixes.len(),
            listing.contents.len()
        );

        Ok(listing)
    }
}
