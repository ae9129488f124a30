//! View modes and row rendering for the item list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::item::{format_file_size, truncate_name, FileCategory, StorageItem};

/// Grid cards truncate names to this many characters.
const GRID_NAME_LEN: usize = 20;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
    Detail,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Grid => write!(f, "grid"),
            ViewMode::List => write!(f, "list"),
            ViewMode::Detail => write!(f, "detail"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            "detail" | "details" => Ok(ViewMode::Detail),
            other => Err(Error::Config(format!("unknown view mode: {}", other))),
        }
    }
}

/// One rendered entry. Which fields are filled depends on the view mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub name: String,
    pub category: FileCategory,
    pub size: Option<String>,
    pub modified: Option<String>,
    pub visibility: Option<&'static str>,
    pub dragging_over: bool,
    pub deleting: bool,
}

impl Row {
    pub fn render(&self) -> String {
        let marker = if self.is_folder() { "/" } else { "" };
        let mut line = format!("{}{}", self.name, marker);
        for cell in [self.size.as_deref(), self.modified.as_deref(), self.visibility]
            .into_iter()
            .flatten()
        {
            line.push_str("  ");
            line.push_str(cell);
        }
        if self.dragging_over {
            line.push_str("  [drop here]");
        }
        if self.deleting {
            line.push_str("  [deleting]");
        }
        line
    }

    fn is_folder(&self) -> bool {
        self.category == FileCategory::Folder
    }
}

/// Build one row for `item`.
pub fn row(item: &StorageItem, mode: ViewMode) -> Row {
    let name = match mode {
        ViewMode::Grid => truncate_name(item.name(), GRID_NAME_LEN),
        ViewMode::List | ViewMode::Detail => item.name().to_string(),
    };
    let size = match (mode, item.is_folder()) {
        (ViewMode::Grid, _) => None,
        (_, true) => Some("-".to_string()),
        (_, false) => Some(format_file_size(item.size)),
    };
    let detail = mode == ViewMode::Detail;
    let modified = detail.then(|| item.last_modified.format("%Y-%m-%d %H:%M").to_string());
    let visibility = (detail && !item.is_folder())
        .then_some(if item.is_public { "public" } else { "private" });

    Row {
        key: item.key.clone(),
        name,
        category: item.category(),
        size,
        modified,
        visibility,
        dragging_over: false,
        deleting: false,
    }
}
