//! Configuration: store connection, upload limits and local preference storage.
//!
//! Values come from an optional TOML file and are then overridden by `EXPLORER_*`
//! environment variables, so a bare environment is enough to point at a bucket.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const MIB: u64 = 1024 * 1024;

/// Smallest part S3 accepts for any part but the last.
pub const MIN_CHUNK_SIZE: u64 = 5 * MIB;

/// S3 rejects part numbers above this.
pub const MAX_PARTS: u64 = 10_000;

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Full endpoint URL, e.g. `https://s3.tebi.io`. `None` uses the AWS default.
    #[serde(default = "default_endpoint")]
    pub endpoint: Option<String>,
    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
    /// Base for public object URLs. Falls back to `endpoint`.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_region() -> String {
    "global".to_string()
}

fn default_endpoint() -> Option<String> {
    Some("https://s3.tebi.io".to_string())
}

fn default_force_path_style() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: default_region(),
            endpoint: default_endpoint(),
            force_path_style: default_force_path_style(),
            public_base_url: None,
        }
    }
}

impl StoreConfig {
    /// Base URL used to build static public object URLs.
    pub fn public_base(&self) -> String {
        let base = self
            .public_base_url
            .as_deref()
            .or(self.endpoint.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region));
        base.trim_end_matches('/').to_string()
    }
}

/// Size limits and transfer tuning for uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Files up to this size are written with a single direct PUT.
    #[serde(default = "default_small_file_threshold")]
    pub small_file_threshold: u64,
    /// Files above this size use a multipart session.
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Parts in flight per multipart upload. 1 keeps chunk transfers sequential.
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,
    /// Send a SHA-256 checksum with every part.
    #[serde(default = "default_verify_parts")]
    pub verify_parts: bool,
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

fn default_small_file_threshold() -> u64 {
    MIB
}

fn default_multipart_threshold() -> u64 {
    5 * MIB
}

fn default_chunk_size() -> u64 {
    5 * MIB
}

fn default_max_file_size() -> u64 {
    10 * 1024 * MIB
}

fn default_part_concurrency() -> usize {
    1
}

fn default_verify_parts() -> bool {
    true
}

fn default_presign_expiry() -> u64 {
    3600
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            small_file_threshold: default_small_file_threshold(),
            multipart_threshold: default_multipart_threshold(),
            chunk_size: default_chunk_size(),
            max_file_size: default_max_file_size(),
            part_concurrency: default_part_concurrency(),
            verify_parts: default_verify_parts(),
            presign_expiry_secs: default_presign_expiry(),
        }
    }
}

impl UploadSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::Config(format!(
                "chunk_size must be at least {} bytes",
                MIN_CHUNK_SIZE
            )));
        }
        if self.max_file_size.div_ceil(self.chunk_size) > MAX_PARTS {
            return Err(Error::Config(format!(
                "max_file_size needs more than {} parts of chunk_size",
                MAX_PARTS
            )));
        }
        if self.small_file_threshold > self.multipart_threshold {
            return Err(Error::Config(
                "small_file_threshold cannot exceed multipart_threshold".into(),
            ));
        }
        if self.part_concurrency == 0 {
            return Err(Error::Config("part_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub upload: UploadSettings,
    /// Database file holding persisted preferences such as the view mode.
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("EXPLORER_ENDPOINT") {
            self.store.endpoint = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("EXPLORER_REGION") {
            self.store.region = v;
        }
        if let Some(v) = lookup("EXPLORER_BUCKET") {
            self.store.bucket = v;
        }
        if let Some(v) = lookup("EXPLORER_ACCESS_KEY") {
            self.store.access_key_id = v;
        }
        if let Some(v) = lookup("EXPLORER_SECRET_KEY") {
            self.store.secret_access_key = v;
        }
        if let Some(v) = lookup("EXPLORER_PUBLIC_URL") {
            self.store.public_base_url = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.bucket.trim().is_empty() {
            return Err(Error::Config("bucket is not set (EXPLORER_BUCKET)".into()));
        }
        if self.store.access_key_id.is_empty() || self.store.secret_access_key.is_empty() {
            return Err(Error::Config(
                "credentials are not set (EXPLORER_ACCESS_KEY / EXPLORER_SECRET_KEY)".into(),
            ));
        }
        self.upload.validate()
    }

    /// Configured preferences file, or `preferences.db` in the platform data dir.
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "bucket-explorer")
                .map(|dirs| dirs.data_dir().join("preferences.db"))
        })
    }
}
