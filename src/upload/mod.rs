//! Upload orchestration
//!
//! A dropped batch is grouped by folder sub-path. Each group's folder marker is
//! created first (best effort), then its files are uploaded one by one with a
//! strategy picked by size. One file failing never stops the rest of the batch.

mod multipart;
mod source;

pub use multipart::{part_count, upload_multipart};
pub use source::{collect_dropped_paths, UploadFile, UploadSource};

use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::UploadSettings;
use crate::error::{Error, Result};
use crate::path::normalize_prefix;
use crate::store::{ops, ObjectStore};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStrategy {
    /// One PUT through the store client.
    Direct,
    /// One PUT to a presigned URL.
    Presigned,
    Multipart,
}

impl UploadStrategy {
    pub fn select(size: u64, settings: &UploadSettings) -> Self {
        if size <= settings.small_file_threshold {
            UploadStrategy::Direct
        } else if size > settings.multipart_threshold {
            UploadStrategy::Multipart
        } else {
            UploadStrategy::Presigned
        }
    }
}

/// Pre-flight size check, before any network call.
pub fn check_size(file: &UploadFile, settings: &UploadSettings) -> Result<()> {
    let size = file.size();
    if size > settings.max_file_size {
        return Err(Error::FileTooLarge {
            name: file.name.clone(),
            size,
            limit: settings.max_file_size,
        });
    }
    Ok(())
}

/// Per-file progress shown while a batch runs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadTask {
    pub file_name: String,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadProgress {
    pub index: usize,
    pub file_name: String,
    pub key: String,
    pub percent: u8,
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
}

pub type ProgressCallback = Box<dyn Fn(&UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    pub file_name: String,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub uploaded: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.uploaded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn message(&self) -> String {
        match (self.succeeded(), self.failed_count()) {
            (0, 0) => "Nothing to upload".to_string(),
            (1, 0) => "File uploaded successfully".to_string(),
            (n, 0) => format!("{} files uploaded successfully", n),
            (n, f) => format!("{} files uploaded, {} failed", n, f),
        }
    }
}

/// Shared upload task list, updated from progress callbacks.
#[derive(Debug, Clone, Default)]
pub struct UploadTracker {
    tasks: Arc<Mutex<Vec<UploadTask>>>,
}

impl UploadTracker {
    pub fn start(&self, files: &[UploadFile]) {
        let mut tasks = self.lock();
        *tasks = files
            .iter()
            .map(|f| UploadTask {
                file_name: f.name.clone(),
                progress: 0,
            })
            .collect();
    }

    /// Progress never moves backwards.
    pub fn update(&self, index: usize, percent: u8) {
        if let Some(task) = self.lock().get_mut(index) {
            task.progress = task.progress.max(percent.min(100));
        }
    }

    pub fn finish(&self) {
        self.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<UploadTask>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).min(100.0) as u8
}

/// Partition files by folder sub-path, keeping first-seen order and input indexes.
fn group_by_folder(files: Vec<UploadFile>) -> Vec<(String, Vec<(usize, UploadFile)>)> {
    let mut groups: Vec<(String, Vec<(usize, UploadFile)>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, file) in files.into_iter().enumerate() {
        let dir = normalize_prefix(&file.relative_dir);
        let slot = *positions.entry(dir.clone()).or_insert_with(|| {
            groups.push((dir, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((index, file));
    }
    groups
}

/// Upload one file to `key`. `on_bytes` gets the running byte total.
pub async fn upload_file(
    store: &dyn ObjectStore,
    settings: &UploadSettings,
    file: &UploadFile,
    key: &str,
    on_bytes: &(dyn Fn(u64) + Send + Sync),
) -> Result<UploadStrategy> {
    check_size(file, settings)?;

    let strategy = UploadStrategy::select(file.size(), settings);
    match strategy {
        UploadStrategy::Direct => {
            let body = file.read_all().await?;
            store
                .put_object(key, body, file.content_type.as_deref())
                .await?;
        }
        UploadStrategy::Presigned => {
            let url = store.presigned_put(key, settings.presign_expiry_secs).await?;
            let body = file.read_all().await?;
            store
                .put_presigned(&url, body, file.content_type.as_deref())
                .await?;
        }
        UploadStrategy::Multipart => {
            upload_multipart(store, settings, file, key, on_bytes).await?;
        }
    }
    on_bytes(file.size());
    Ok(strategy)
}

/// Upload a dropped batch under `base_path`.
pub async fn upload_batch(
    store: &dyn ObjectStore,
    settings: &UploadSettings,
    base_path: &str,
    files: Vec<UploadFile>,
    progress: Option<&ProgressCallback>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    if files.is_empty() {
        return summary;
    }

    let base = normalize_prefix(base_path);
    let total_files = files.len();

    for (folder, group) in group_by_folder(files) {
        if !folder.is_empty() {
            let folder_path = format!("{}{}", base, folder);
            if let Err(e) = ops::create_folder(store, &folder_path).await {
                // Usually "already exists"; uploading into the prefix still works.
                warn!("upload: could not create folder {}: {}", folder_path, e);
            }
        }

        for (index, file) in group {
            let key = format!("{}{}{}", base, folder, file.name);
            let total_bytes = file.size();
            let report = |uploaded_bytes: u64| {
                if let Some(cb) = progress {
                    cb(&UploadProgress {
                        index,
                        file_name: file.name.clone(),
                        key: key.clone(),
                        percent: percent(uploaded_bytes, total_bytes),
                        uploaded_bytes,
                        total_bytes,
                    });
                }
            };

            report(0);
            match upload_file(store, settings, &file, &key, &report).await {
                Ok(strategy) => {
                    info!("upload: {} ({} bytes, {:?})", key, total_bytes, strategy);
                    summary.uploaded.push(key);
                }
                Err(e) => {
                    warn!("upload: {} failed: {}", key, e);
                    summary.failed.push(FailedUpload {
                        file_name: file.name.clone(),
                        key,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        "upload: batch of {} finished, {} ok, {} failed",
        total_files,
        summary.succeeded(),
        summary.failed_count()
    );
    summary
}
