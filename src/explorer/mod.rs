//! Explorer state container.
//!
//! `Explorer` holds everything the file manager shows: the current folder, its
//! items, the view mode, open dialogs, the drag target and pending notifications.
//! Mutating operations update the items optimistically, call the store, then
//! re-fetch the listing whatever the outcome.

mod view;

pub use view::{row, Row, ViewMode};

use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UploadSettings;
use crate::error::{Error, Result};
use crate::item::StorageItem;
use crate::path::{self, breadcrumbs, normalize_prefix, prefix_to_route, Breadcrumbs};
use crate::prefs::Preferences;
use crate::reconcile::list_items;
use crate::store::{ops, ObjectStore};
use crate::upload::{
    collect_dropped_paths, upload_batch, BatchSummary, ProgressCallback, UploadFile,
    UploadProgress, UploadTask, UploadTracker,
};

/// Modal text-input dialogs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Dialog {
    NewFolder { name: String },
    Rename { key: String, name: String },
}

/// Where dragged files would land if dropped now.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum DropTarget {
    CurrentFolder,
    Folder(String),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExplorerState {
    /// Current prefix, `""` for the bucket root.
    pub path: String,
    pub items: Vec<StorageItem>,
    pub view_mode: ViewMode,
    pub selected: Option<StorageItem>,
    pub dialog: Option<Dialog>,
    pub drop_target: Option<DropTarget>,
    pub deleting: Option<String>,
    pub notifications: Vec<Notification>,
}

pub struct Explorer {
    store: Arc<dyn ObjectStore>,
    settings: UploadSettings,
    prefs: Option<Preferences>,
    uploads: UploadTracker,
    state: ExplorerState,
}

impl Explorer {
    pub fn new(store: Arc<dyn ObjectStore>, settings: UploadSettings) -> Self {
        Self {
            store,
            settings,
            prefs: None,
            uploads: UploadTracker::default(),
            state: ExplorerState::default(),
        }
    }

    /// Attach a preference store and restore the saved view mode from it.
    pub async fn with_preferences(mut self, prefs: Preferences) -> Self {
        match prefs.view_mode().await {
            Ok(Some(mode)) => self.state.view_mode = mode,
            Ok(None) => {}
            Err(e) => warn!("explorer: could not load view mode: {}", e),
        }
        self.prefs = Some(prefs);
        self
    }

    pub fn state(&self) -> &ExplorerState {
        &self.state
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.state.notifications)
    }

    fn notify_ok(&mut self, message: impl Into<String>) {
        self.state.notifications.push(Notification {
            kind: NoticeKind::Success,
            message: message.into(),
        });
    }

    fn notify_err(&mut self, context: &str, err: &Error) {
        self.state.notifications.push(Notification {
            kind: NoticeKind::Error,
            message: format!("{}: {}", context, err),
        });
    }

    // ============ Navigation ============

    pub async fn navigate(&mut self, path: &str) -> Result<()> {
        self.state.path = normalize_prefix(path);
        self.state.selected = None;
        self.state.dialog = None;
        self.state.drop_target = None;
        self.refresh().await
    }

    /// Re-fetch the current listing. On failure the list is emptied.
    pub async fn refresh(&mut self) -> Result<()> {
        match list_items(self.store.as_ref(), &self.state.path).await {
            Ok(items) => {
                self.state.items = items;
                Ok(())
            }
            Err(e) => {
                self.state.items.clear();
                self.notify_err("Failed to load files", &e);
                Err(e)
            }
        }
    }

    /// Folders navigate, files become the selection.
    pub async fn open(&mut self, item: &StorageItem) -> Result<()> {
        if item.is_folder() {
            self.navigate(&item.key).await
        } else {
            self.state.selected = Some(item.clone());
            Ok(())
        }
    }

    pub fn close_selection(&mut self) {
        self.state.selected = None;
    }

    pub async fn go_up(&mut self) -> Result<()> {
        let parent = path::parent_path(&self.state.path);
        self.navigate(&parent).await
    }

    pub fn breadcrumbs(&self) -> Breadcrumbs {
        breadcrumbs(&self.state.path)
    }

    pub fn route(&self) -> String {
        prefix_to_route(&self.state.path)
    }

    pub async fn set_view_mode(&mut self, mode: ViewMode) {
        self.state.view_mode = mode;
        if let Some(prefs) = &self.prefs {
            if let Err(e) = prefs.save_view_mode(mode).await {
                warn!("explorer: could not save view mode: {}", e);
            }
        }
    }

    pub fn rows(&self) -> Vec<Row> {
        let drop_folder = match &self.state.drop_target {
            Some(DropTarget::Folder(key)) => Some(key.as_str()),
            _ => None,
        };
        self.state
            .items
            .iter()
            .map(|item| {
                let mut r = row(item, self.state.view_mode);
                r.dragging_over = drop_folder == Some(item.key.as_str());
                r.deleting = self.state.deleting.as_deref() == Some(item.key.as_str());
                r
            })
            .collect()
    }

    // ============ Dialogs ============

    pub fn open_new_folder_dialog(&mut self) {
        self.state.dialog = Some(Dialog::NewFolder {
            name: String::new(),
        });
    }

    pub fn open_rename_dialog(&mut self, item: &StorageItem) {
        self.state.dialog = Some(Dialog::Rename {
            key: item.key.clone(),
            name: item.name().to_string(),
        });
    }

    pub fn edit_dialog(&mut self, text: &str) {
        match &mut self.state.dialog {
            Some(Dialog::NewFolder { name }) | Some(Dialog::Rename { name, .. }) => {
                *name = text.to_string();
            }
            None => {}
        }
    }

    pub fn cancel_dialog(&mut self) {
        self.state.dialog = None;
    }

    /// Run the open dialog's action. A failed submit keeps the dialog open.
    pub async fn submit_dialog(&mut self) -> Result<()> {
        let Some(dialog) = self.state.dialog.clone() else {
            return Ok(());
        };
        let outcome = match &dialog {
            Dialog::NewFolder { name } => self.create_folder(name).await,
            Dialog::Rename { key, name } => self.rename_key(key, name).await,
        };
        if outcome.is_ok() {
            self.state.dialog = None;
        }
        outcome
    }

    // ============ Item operations ============

    pub async fn create_folder(&mut self, name: &str) -> Result<()> {
        let name = match path::validate_name(name) {
            Ok(name) => name.to_string(),
            Err(e) => {
                self.notify_err("Failed to create folder", &e);
                return Err(e);
            }
        };
        let target = format!("{}{}", self.state.path, name);
        let outcome = ops::create_folder(self.store.as_ref(), &target).await;
        self.finish("Failed to create folder", outcome, |key| {
            format!("Folder {} created", key)
        })
        .await
    }

    /// Remove the item from the list right away, then delete it remotely.
    pub async fn delete(&mut self, item: &StorageItem) -> Result<()> {
        self.state.deleting = Some(item.key.clone());
        self.state.items.retain(|i| i.key != item.key);
        if self.state.selected.as_ref().map(|s| &s.key) == Some(&item.key) {
            self.state.selected = None;
        }

        let outcome = ops::delete_item(self.store.as_ref(), &item.key).await;
        self.state.deleting = None;
        let name = item.name().to_string();
        self.finish("Failed to delete", outcome, |_| format!("{} deleted", name))
            .await
    }

    /// Flip visibility in the list right away, then apply the ACL remotely.
    pub async fn toggle_public(&mut self, item: &StorageItem) -> Result<()> {
        if item.is_folder() {
            let err = Error::InvalidName(format!("{} is a folder", item.key));
            self.notify_err("Failed to update permissions", &err);
            return Err(err);
        }
        let make_public = !item.is_public;
        if let Some(listed) = self.state.items.iter_mut().find(|i| i.key == item.key) {
            listed.is_public = make_public;
        }

        let outcome = ops::set_public(self.store.as_ref(), &item.key, make_public).await;
        let name = item.name().to_string();
        self.finish("Failed to update permissions", outcome, |public| {
            format!(
                "{} is now {}",
                name,
                if public { "public" } else { "private" }
            )
        })
        .await
    }

    pub async fn rename(&mut self, item: &StorageItem, new_name: &str) -> Result<()> {
        self.rename_key(&item.key, new_name).await
    }

    async fn rename_key(&mut self, key: &str, new_name: &str) -> Result<()> {
        let new_key = match path::renamed_key(key, new_name) {
            Ok(new_key) => new_key,
            Err(e) => {
                self.notify_err("Failed to rename", &e);
                return Err(e);
            }
        };
        let outcome = ops::rename_item(self.store.as_ref(), key, &new_key).await;
        self.finish("Failed to rename", outcome, |_| {
            format!("Renamed to {}", path::base_name(&new_key))
        })
        .await
    }

    /// Folders resolve to their explorer route, files to a download URL.
    pub async fn copy_url(&mut self, item: &StorageItem) -> Result<String> {
        if item.is_folder() {
            let route = prefix_to_route(&item.key);
            self.notify_ok("URL copied");
            return Ok(route);
        }
        match ops::file_url(
            self.store.as_ref(),
            &item.key,
            self.settings.presign_expiry_secs,
        )
        .await
        {
            Ok(url) => {
                self.notify_ok("URL copied");
                Ok(url)
            }
            Err(e) => {
                self.notify_err("Failed to get URL", &e);
                Err(e)
            }
        }
    }

    // ============ Uploads & drag-and-drop ============

    /// Upload into `target`, or the current folder when `None`.
    pub async fn upload(&mut self, files: Vec<UploadFile>, target: Option<&str>) -> BatchSummary {
        self.upload_with_progress(files, target, None).await
    }

    /// Like [`Explorer::upload`], also forwarding every progress event to `observer`.
    ///
    /// The upload tracker is updated before `observer` runs, so a handle from
    /// [`Explorer::upload_tracker`] read inside it reflects the event.
    pub async fn upload_with_progress(
        &mut self,
        files: Vec<UploadFile>,
        target: Option<&str>,
        observer: Option<ProgressCallback>,
    ) -> BatchSummary {
        let base = target
            .map(normalize_prefix)
            .unwrap_or_else(|| self.state.path.clone());

        self.uploads.start(&files);
        let tracker = self.uploads.clone();
        let on_progress: ProgressCallback = Box::new(move |p: &UploadProgress| {
            tracker.update(p.index, p.percent);
            if let Some(observer) = &observer {
                observer(p);
            }
        });

        let summary = upload_batch(
            self.store.as_ref(),
            &self.settings,
            &base,
            files,
            Some(&on_progress),
        )
        .await;
        self.uploads.finish();

        if summary.failed.is_empty() {
            if summary.succeeded() > 0 {
                self.notify_ok(summary.message());
            }
        } else {
            self.state.notifications.push(Notification {
                kind: NoticeKind::Error,
                message: summary.message(),
            });
        }
        if let Err(e) = self.refresh().await {
            warn!("explorer: refresh after upload failed: {}", e);
        }
        summary
    }

    pub fn upload_tasks(&self) -> Vec<UploadTask> {
        self.uploads.snapshot()
    }

    /// Shared handle on the running batch's tasks, readable while an upload is in flight.
    pub fn upload_tracker(&self) -> UploadTracker {
        self.uploads.clone()
    }

    pub fn drag_enter(&mut self, target: DropTarget) {
        self.state.drop_target = Some(target);
    }

    pub fn drag_leave(&mut self) {
        self.state.drop_target = None;
    }

    /// Expand dropped paths and upload them to the current drag target.
    pub async fn drop_paths(&mut self, paths: &[PathBuf]) -> Result<BatchSummary> {
        let target = match self.state.drop_target.take() {
            Some(DropTarget::Folder(key)) => Some(key),
            Some(DropTarget::CurrentFolder) | None => None,
        };
        let files = match collect_dropped_paths(paths) {
            Ok(files) => files,
            Err(e) => {
                self.notify_err("Failed to read dropped files", &e);
                return Err(e);
            }
        };
        Ok(self.upload(files, target.as_deref()).await)
    }

    /// Notify, log, and re-fetch after a mutating operation.
    async fn finish<T>(
        &mut self,
        context: &str,
        outcome: Result<T>,
        success: impl FnOnce(T) -> String,
    ) -> Result<()> {
        let result = match outcome {
            Ok(value) => {
                let message = success(value);
                info!("explorer: {}", message);
                self.notify_ok(message);
                Ok(())
            }
            Err(e) => {
                warn!("explorer: {}: {}", context, e);
                self.notify_err(context, &e);
                Err(e)
            }
        };
        if let Err(e) = self.refresh().await {
            warn!("explorer: refresh failed: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIB;
    use crate::store::memory::{Call, MemoryStore};

    fn explorer(store: &Arc<MemoryStore>) -> Explorer {
        Explorer::new(store.clone(), UploadSettings::default())
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert("docs/", b"");
        store.insert("docs/a.txt", b"a");
        store.insert("docs/b.txt", b"b");
        store.insert("docs/c.txt", b"c");
        store.insert("readme.md", b"hello");
        store
    }

    fn item<'a>(explorer: &'a Explorer, key: &str) -> &'a StorageItem {
        explorer
            .state()
            .items
            .iter()
            .find(|i| i.key == key)
            .unwrap()
    }

    fn last_notice(explorer: &mut Explorer) -> Notification {
        explorer.take_notifications().pop().unwrap()
    }

    #[tokio::test]
    async fn navigate_open_and_go_up() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();
        let keys: Vec<_> = ex.state().items.iter().map(|i| i.key.clone()).collect();
        assert_eq!(keys, vec!["docs/".to_string(), "readme.md".to_string()]);

        let docs = item(&ex, "docs/").clone();
        ex.open(&docs).await.unwrap();
        assert_eq!(ex.state().path, "docs/");
        assert_eq!(ex.route(), "/storage/docs");
        assert_eq!(ex.state().items.len(), 3);

        let file = item(&ex, "docs/a.txt").clone();
        ex.open(&file).await.unwrap();
        assert_eq!(ex.state().selected.as_ref().map(|s| s.key.as_str()), Some("docs/a.txt"));

        ex.go_up().await.unwrap();
        assert_eq!(ex.state().path, "");
        assert!(ex.state().selected.is_none());
    }

    #[tokio::test]
    async fn listing_failure_notifies_and_clears() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("docs").await.unwrap();
        store.fail_list();

        assert!(ex.refresh().await.is_err());
        assert!(ex.state().items.is_empty());
        assert_eq!(last_notice(&mut ex).kind, NoticeKind::Error);

        store.heal_list();
        ex.refresh().await.unwrap();
        assert_eq!(ex.state().items.len(), 3);
    }

    #[tokio::test]
    async fn delete_folder_removes_everything() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let docs = item(&ex, "docs/").clone();
        ex.delete(&docs).await.unwrap();

        assert_eq!(store.calls_of(|c| matches!(c, Call::Delete(_))).len(), 4);
        assert_eq!(store.keys(), vec!["readme.md".to_string()]);
        assert!(ex.state().deleting.is_none());
        assert_eq!(last_notice(&mut ex).kind, NoticeKind::Success);
    }

    #[tokio::test]
    async fn failed_delete_restores_item() {
        let store = seeded();
        store.fail_delete("readme.md");
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let readme = item(&ex, "readme.md").clone();
        assert!(ex.delete(&readme).await.is_err());

        assert!(ex.state().items.iter().any(|i| i.key == "readme.md"));
        let notice = last_notice(&mut ex);
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.starts_with("Failed to delete"));
    }

    #[tokio::test]
    async fn toggle_public_round_trip() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let readme = item(&ex, "readme.md").clone();
        ex.toggle_public(&readme).await.unwrap();
        assert!(item(&ex, "readme.md").is_public);
        assert_eq!(last_notice(&mut ex).message, "readme.md is now public");

        let readme = item(&ex, "readme.md").clone();
        ex.toggle_public(&readme).await.unwrap();
        assert!(!item(&ex, "readme.md").is_public);
    }

    #[tokio::test]
    async fn failed_toggle_is_undone_by_refetch() {
        let store = seeded();
        store.fail_put_acl("readme.md");
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let readme = item(&ex, "readme.md").clone();
        assert!(ex.toggle_public(&readme).await.is_err());
        assert!(!item(&ex, "readme.md").is_public);
    }

    #[tokio::test]
    async fn rename_dialog_flow() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("docs/").await.unwrap();

        let a = item(&ex, "docs/a.txt").clone();
        ex.open_rename_dialog(&a);
        assert_eq!(
            ex.state().dialog,
            Some(Dialog::Rename {
                key: "docs/a.txt".into(),
                name: "a.txt".into()
            })
        );

        ex.edit_dialog("bad/name");
        assert!(ex.submit_dialog().await.is_err());
        assert!(ex.state().dialog.is_some());

        ex.edit_dialog("renamed.txt");
        ex.submit_dialog().await.unwrap();
        assert!(ex.state().dialog.is_none());
        assert!(store.get("docs/renamed.txt").is_some());
        assert!(store.get("docs/a.txt").is_none());
        assert!(ex.state().items.iter().any(|i| i.key == "docs/renamed.txt"));
    }

    #[tokio::test]
    async fn incomplete_rename_shows_both_keys() {
        let store = seeded();
        store.fail_delete("readme.md");
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let readme = item(&ex, "readme.md").clone();
        let err = ex.rename(&readme, "README.md").await.unwrap_err();

        assert!(matches!(err, Error::RenameIncomplete { .. }));
        assert!(ex.state().items.iter().any(|i| i.key == "readme.md"));
        assert!(ex.state().items.iter().any(|i| i.key == "README.md"));
    }

    #[tokio::test]
    async fn new_folder_dialog_creates_marker() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("docs").await.unwrap();

        ex.open_new_folder_dialog();
        ex.edit_dialog("  reports ");
        ex.submit_dialog().await.unwrap();

        assert_eq!(store.get("docs/reports/").as_deref(), Some(&b""[..]));
        assert!(ex.state().items.iter().any(|i| i.key == "docs/reports/"));
        assert_eq!(last_notice(&mut ex).message, "Folder docs/reports/ created");
    }

    #[tokio::test]
    async fn copy_url_for_folders_and_files() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let docs = item(&ex, "docs/").clone();
        assert_eq!(ex.copy_url(&docs).await.unwrap(), "/storage/docs");

        let readme = item(&ex, "readme.md").clone();
        let url = ex.copy_url(&readme).await.unwrap();
        assert!(url.contains("X-Amz-Signature"));

        store.make_public("readme.md");
        let url = ex.copy_url(&readme).await.unwrap();
        assert_eq!(url, "https://public.example/bucket/readme.md");
    }

    #[tokio::test]
    async fn upload_into_current_folder_refreshes() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("docs").await.unwrap();

        let files = vec![
            UploadFile::from_bytes("new.txt", b"n".to_vec()),
            UploadFile::from_bytes("deep.txt", b"d".to_vec()).in_dir("sub"),
        ];
        let summary = ex.upload(files, None).await;

        assert_eq!(summary.succeeded(), 2);
        assert!(ex.upload_tasks().is_empty());
        assert!(ex.state().items.iter().any(|i| i.key == "docs/new.txt"));
        assert!(ex.state().items.iter().any(|i| i.key == "docs/sub/"));
        assert_eq!(last_notice(&mut ex).message, "2 files uploaded successfully");
    }

    #[tokio::test]
    async fn upload_progress_is_visible_while_running() {
        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        let tracker = ex.upload_tracker();
        let seen: Arc<std::sync::Mutex<Vec<Vec<UploadTask>>>> = Arc::default();
        let sink = seen.clone();
        let observer: ProgressCallback = Box::new(move |_: &UploadProgress| {
            sink.lock().unwrap().push(tracker.snapshot());
        });

        let files = vec![
            UploadFile::from_bytes("big.bin", vec![7u8; 11 * MIB as usize]),
            UploadFile::from_bytes("small.txt", b"s".to_vec()),
        ];
        let summary = ex.upload_with_progress(files, None, Some(observer)).await;
        assert_eq!(summary.succeeded(), 2);

        let seen = seen.lock().unwrap();
        assert!(seen.iter().all(|tasks| tasks.len() == 2));
        assert!(seen.iter().any(|tasks| {
            tasks[0].file_name == "big.bin" && tasks[0].progress > 0 && tasks[0].progress < 100
        }));
        assert!(seen.iter().any(|tasks| tasks[0].progress == 100 && tasks[1].progress < 100));
        assert!(!ex.upload_tracker().is_active());
        assert!(store.get("big.bin").is_some());
    }

    #[tokio::test]
    async fn drop_onto_folder_row() {
        let dir = tempfile::tempdir().unwrap();
        let dropped = dir.path().join("photo.png");
        std::fs::write(&dropped, b"png").unwrap();

        let store = seeded();
        let mut ex = explorer(&store);
        ex.navigate("").await.unwrap();

        ex.drag_enter(DropTarget::Folder("docs/".into()));
        let rows = ex.rows();
        assert!(rows.iter().find(|r| r.key == "docs/").unwrap().dragging_over);
        assert!(!rows.iter().find(|r| r.key == "readme.md").unwrap().dragging_over);

        let summary = ex.drop_paths(&[dropped]).await.unwrap();
        assert_eq!(summary.uploaded, vec!["docs/photo.png".to_string()]);
        assert!(ex.state().drop_target.is_none());

        ex.drag_enter(DropTarget::CurrentFolder);
        ex.drag_leave();
        assert!(ex.state().drop_target.is_none());
    }

    #[tokio::test]
    async fn view_mode_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("prefs.db");
        let store = seeded();

        let prefs = Preferences::open(&db).await.unwrap();
        let mut ex = explorer(&store).with_preferences(prefs).await;
        assert_eq!(ex.state().view_mode, ViewMode::Grid);
        ex.set_view_mode(ViewMode::List).await;
        drop(ex);

        let prefs = Preferences::open(&db).await.unwrap();
        let ex = explorer(&store).with_preferences(prefs).await;
        assert_eq!(ex.state().view_mode, ViewMode::List);
    }

    #[tokio::test]
    async fn breadcrumbs_collapse_deep_paths() {
        let store = Arc::new(MemoryStore::new());
        let mut ex = explorer(&store);
        ex.navigate("/projects/a/b/c/d").await.unwrap();
        let crumbs = ex.breadcrumbs();
        assert_eq!(crumbs.visible.len(), 3);
        assert_eq!(crumbs.hidden.len(), 2);
        assert_eq!(crumbs.visible[2].prefix, "projects/a/b/c/d/");
    }
}
