//! Files handed to the orchestrator, either in memory or on local disk.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use walkdir::WalkDir;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Vec<u8>),
    Path { path: PathBuf, size: u64 },
}

/// One dropped file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    /// Folder sub-path relative to the drop target, e.g. `photos/2024/`. Empty for root files.
    pub relative_dir: String,
    pub content_type: Option<String>,
    pub source: UploadSource,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            content_type: guess_content_type(&name),
            name,
            relative_dir: String::new(),
            source: UploadSource::Bytes(data),
        }
    }

    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let size = tokio::fs::metadata(&path).await?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| Error::InvalidName(format!("{} has no file name", path.display())))?;
        Ok(Self {
            content_type: guess_content_type(&name),
            name,
            relative_dir: String::new(),
            source: UploadSource::Path { path, size },
        })
    }

    /// Place the file under a sub-folder of the drop target.
    pub fn in_dir(mut self, relative_dir: &str) -> Self {
        self.relative_dir = crate::path::normalize_prefix(relative_dir);
        self
    }

    pub fn size(&self) -> u64 {
        match &self.source {
            UploadSource::Bytes(data) => data.len() as u64,
            UploadSource::Path { size, .. } => *size,
        }
    }

    pub async fn read_all(&self) -> Result<Vec<u8>> {
        match &self.source {
            UploadSource::Bytes(data) => Ok(data.clone()),
            UploadSource::Path { path, .. } => Ok(tokio::fs::read(path).await?),
        }
    }

    /// Read `len` bytes starting at `offset`.
    pub async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        match &self.source {
            UploadSource::Bytes(data) => {
                let start = (offset as usize).min(data.len());
                let end = (start + len as usize).min(data.len());
                Ok(data[start..end].to_vec())
            }
            UploadSource::Path { path, .. } => {
                let mut file = File::open(path).await?;
                file.seek(SeekFrom::Start(offset)).await?;
                let mut buffer = vec![0u8; len as usize];
                file.read_exact(&mut buffer).await?;
                Ok(buffer)
            }
        }
    }
}

fn guess_content_type(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Expand dropped paths into upload files.
///
/// A dropped directory keeps its own name as the first segment of every file's
/// `relative_dir`, so dropping `photos/` recreates `photos/...` at the target.
pub fn collect_dropped_paths(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();
    for dropped in paths {
        if dropped.is_file() {
            files.push(file_entry(dropped, "")?);
            continue;
        }

        let root = dropped.parent().unwrap_or_else(|| Path::new(""));
        let mut entries: Vec<_> = WalkDir::new(dropped)
            .follow_links(false)
            .into_iter()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Io(e.into()))?;
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries.into_iter().filter(|e| e.file_type().is_file()) {
            let relative_dir = entry
                .path()
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| {
                    p.components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .unwrap_or_default();
            files.push(file_entry(entry.path(), &relative_dir)?);
        }
    }
    Ok(files)
}

fn file_entry(path: &Path, relative_dir: &str) -> Result<UploadFile> {
    let size = std::fs::metadata(path)?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidName(format!("{} has no file name", path.display())))?;
    Ok(UploadFile {
        content_type: guess_content_type(&name),
        name,
        relative_dir: crate::path::normalize_prefix(relative_dir),
        source: UploadSource::Path {
            path: path.to_path_buf(),
            size,
        },
    })
}
