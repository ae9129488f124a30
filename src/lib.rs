//! Browser-style file manager for S3-compatible object storage.
//!
//! The library is organized into modules:
//! - `store`: the `ObjectStore` trait, the S3 implementation and folder-aware ops
//! - `upload`: batch upload orchestration (direct, presigned and multipart)
//! - `reconcile`: listing to folder/file items
//! - `explorer`: explorer state, dialogs, drag-and-drop and row rendering
//! - `preview`: preview URL loading with retry
//! - `prefs`: persisted preferences
//! - `item`, `path`: item model and key helpers
//! - `config`, `error`

pub mod config;
pub mod error;
pub mod explorer;
pub mod item;
pub mod path;
pub mod prefs;
pub mod preview;
pub mod reconcile;
pub mod store;
pub mod upload;

pub use config::{AppConfig, StoreConfig, UploadSettings};
pub use error::{Error, Result};
pub use explorer::{Dialog, DropTarget, Explorer, ExplorerState, Notification, ViewMode};
pub use item::{ItemKind, StorageItem};
pub use preview::{PreviewLoader, PreviewState};
pub use store::{ObjectStore, S3Store};
pub use upload::{BatchSummary, UploadFile};
