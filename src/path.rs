//! Key and prefix helpers. Folders exist only as key prefixes ending in `/`.

use serde::Serialize;

use crate::error::{Error, Result};

/// Route prefix for explorer paths, e.g. `/storage/photos/2024`.
pub const ROUTE_ROOT: &str = "/storage";

/// Breadcrumb segments shown before collapsing the rest into an overflow entry.
pub const MAX_BREADCRUMB_SEGMENTS: usize = 3;

pub fn is_folder_key(key: &str) -> bool {
    key.ends_with('/')
}

/// Make a prefix usable for listing: empty stays empty, anything else ends in `/`.
pub fn normalize_prefix(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Last segment of a key, without a trailing slash.
pub fn base_name(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Prefix of the folder containing `key`, `""` for root entries.
pub fn parent_path(key: &str) -> String {
    let parts: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() <= 1 {
        return String::new();
    }
    format!("{}/", parts[..parts.len() - 1].join("/"))
}

/// Reject names that would escape the current folder or produce empty segments.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidName("name cannot be empty".into()));
    }
    if trimmed.contains('/') {
        return Err(Error::InvalidName(format!("{} contains '/'", trimmed)));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(Error::InvalidName(format!("{} is reserved", trimmed)));
    }
    Ok(trimmed)
}

/// Sibling key for a renamed item, keeping the folder slash.
pub fn renamed_key(old_key: &str, new_name: &str) -> Result<String> {
    let name = validate_name(new_name)?;
    let suffix = if is_folder_key(old_key) { "/" } else { "" };
    Ok(format!("{}{}{}", parent_path(old_key), name, suffix))
}

/// `photos/2024/` -> `/storage/photos/2024`.
pub fn prefix_to_route(prefix: &str) -> String {
    let segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        ROUTE_ROOT.to_string()
    } else {
        format!("{}/{}", ROUTE_ROOT, segments.join("/"))
    }
}

/// `/storage/photos/2024` -> `photos/2024/`. Paths outside the route root map to root.
pub fn route_to_prefix(route: &str) -> String {
    let rest = match route.strip_prefix(ROUTE_ROOT) {
        Some(rest) => rest,
        None => return String::new(),
    };
    let segments: Vec<String> = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect();
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Breadcrumbs {
    /// Leading segments folded into an overflow menu.
    pub hidden: Vec<Crumb>,
    pub visible: Vec<Crumb>,
}

pub fn breadcrumbs(prefix: &str) -> Breadcrumbs {
    let segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    let crumbs: Vec<Crumb> = segments
        .iter()
        .enumerate()
        .map(|(i, name)| Crumb {
            name: name.to_string(),
            prefix: format!("{}/", segments[..=i].join("/")),
        })
        .collect();

    let split = crumbs.len().saturating_sub(MAX_BREADCRUMB_SEGMENTS);
    let (hidden, visible) = crumbs.split_at(split);
    Breadcrumbs {
        hidden: hidden.to_vec(),
        visible: visible.to_vec(),
    }
}
