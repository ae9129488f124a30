//! Listed entries and the small display helpers that go with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemKind {
    #[serde(rename = "folder")]
    Folder,
    #[serde(rename = "file")]
    File,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Folder => write!(f, "folder"),
            ItemKind::File => write!(f, "file"),
        }
    }
}

/// One entry of a folder listing. Folders are keys ending in `/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageItem {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    pub kind: ItemKind,
    pub is_public: bool,
    pub content_type: Option<String>,
}

impl StorageItem {
    pub fn folder(key: impl Into<String>, listed_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified: listed_at,
            size: 0,
            kind: ItemKind::Folder,
            is_public: false,
            content_type: None,
        }
    }

    pub fn file(key: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        let key = key.into();
        let content_type = mime_guess::from_path(&key)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Self {
            key,
            last_modified,
            size,
            kind: ItemKind::File,
            is_public: false,
            content_type,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    /// Last path segment without the trailing slash.
    pub fn name(&self) -> &str {
        crate::path::base_name(&self.key)
    }

    pub fn category(&self) -> FileCategory {
        if self.is_folder() {
            FileCategory::Folder
        } else {
            FileCategory::from_name(&self.key)
        }
    }
}

/// Coarse file type used to pick an icon and a preview renderer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Folder,
    Image,
    Video,
    Audio,
    Text,
    Document,
    Spreadsheet,
    Presentation,
    Code,
    Json,
    Pdf,
    Archive,
    Other,
}

impl FileCategory {
    pub fn from_name(name: &str) -> Self {
        let extension = name
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "bmp" => FileCategory::Image,
            "mp4" | "webm" | "mov" | "avi" | "mkv" => FileCategory::Video,
            "mp3" | "wav" | "ogg" | "aac" | "m4a" => FileCategory::Audio,
            "txt" | "md" => FileCategory::Text,
            "doc" | "docx" | "odt" | "rtf" => FileCategory::Document,
            "xls" | "xlsx" | "csv" | "ods" => FileCategory::Spreadsheet,
            "ppt" | "pptx" | "odp" => FileCategory::Presentation,
            "js" | "ts" | "jsx" | "tsx" | "html" | "css" | "py" | "java" | "cpp" | "c"
            | "php" | "rb" | "rs" => FileCategory::Code,
            "json" => FileCategory::Json,
            "pdf" => FileCategory::Pdf,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" => FileCategory::Archive,
            _ => FileCategory::Other,
        }
    }

    /// Whether the preview pane can render this category inline.
    pub fn is_previewable(&self) -> bool {
        matches!(
            self,
            FileCategory::Image | FileCategory::Video | FileCategory::Audio | FileCategory::Pdf
        )
    }
}

/// Sort folders first, then by key.
pub fn sort_items(items: &mut [StorageItem]) {
    items.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.key.cmp(&b.key)));
}

/// Human readable size, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

/// Shorten a name to `max_len` characters, keeping the extension visible.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        return name.to_string();
    }
    if let Some((stem, ext)) = name.rsplit_once('.') {
        let ext_len = ext.chars().count();
        if !stem.is_empty() && ext_len + 4 < max_len {
            let keep: String = stem.chars().take(max_len - ext_len - 4).collect();
            return format!("{}....{}", keep, ext);
        }
    }
    let keep: String = chars.iter().take(max_len.saturating_sub(3)).collect();
    format!("{}...", keep)
}
