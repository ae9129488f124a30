//! Local preferences stored in an `app_state` key/value table.

use log::{debug, warn};
use std::path::Path;
use tokio::sync::Mutex;
use turso::{Builder, Connection};

use crate::error::{Error, Result};
use crate::explorer::ViewMode;

const VIEW_MODE_KEY: &str = "view_mode";

fn table_sql() -> &'static str {
    "
    CREATE TABLE IF NOT EXISTS app_state (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "
}

/// Preference database handle.
///
/// The connection sits behind a mutex so all access is serialized.
pub struct Preferences {
    conn: Mutex<Connection>,
}

impl Preferences {
    /// Open (or create) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Config(format!("non UTF-8 path {}", path.display())))?;

        let db = Builder::new_local(path_str).build().await?;
        let conn = db.connect()?;
        conn.execute_batch(table_sql()).await?;
        debug!("prefs: opened {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query("SELECT value FROM app_state WHERE key = ?1", turso::params![key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO app_state (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = ?2",
            turso::params![key, value],
        )
        .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM app_state WHERE key = ?1", turso::params![key])
            .await?;
        Ok(())
    }

    /// Stored view mode, if any. Unknown values are ignored.
    pub async fn view_mode(&self) -> Result<Option<ViewMode>> {
        let Some(raw) = self.get(VIEW_MODE_KEY).await? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(mode) => Ok(Some(mode)),
            Err(_) => {
                warn!("prefs: ignoring unknown view mode {:?}", raw);
                Ok(None)
            }
        }
    }

    pub async fn save_view_mode(&self, mode: ViewMode) -> Result<()> {
        self.set(VIEW_MODE_KEY, &mode.to_string()).await
    }
}
