//! File preview loading with retry.
//!
//! Viewing a file resolves its URL, retrying on a fixed delay until it works,
//! the store denies access, or the viewer is closed.

use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::store::{ops, ObjectStore};

pub const RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PreviewState {
    Loading,
    Loaded { url: String },
    /// Waiting before attempt number `attempt`.
    Retrying { attempt: u32, error: String },
    Forbidden { error: String },
    Closed,
}

impl PreviewState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PreviewState::Loaded { .. } | PreviewState::Forbidden { .. } | PreviewState::Closed
        )
    }
}

pub struct PreviewLoader {
    store: Arc<dyn ObjectStore>,
    key: String,
    expires_in_secs: u64,
    retry_delay: Duration,
}

impl PreviewLoader {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>, expires_in_secs: u64) -> Self {
        Self {
            store,
            key: key.into(),
            expires_in_secs,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Drive the loader to a terminal state, reporting every transition.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        mut on_state: impl FnMut(&PreviewState),
    ) -> PreviewState {
        let mut attempt: u32 = 1;
        on_state(&PreviewState::Loading);

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                res = ops::file_url(self.store.as_ref(), &self.key, self.expires_in_secs) => Some(res),
            };

            let state = match outcome {
                None => PreviewState::Closed,
                Some(Ok(url)) => {
                    info!("preview: {} loaded after {} attempt(s)", self.key, attempt);
                    PreviewState::Loaded { url }
                }
                Some(Err(e)) if e.is_access_denied() => {
                    warn!("preview: {} forbidden: {}", self.key, e);
                    PreviewState::Forbidden {
                        error: e.to_string(),
                    }
                }
                Some(Err(e)) => {
                    attempt += 1;
                    warn!(
                        "preview: {} failed, retrying in {:?} (attempt {}): {}",
                        self.key, self.retry_delay, attempt, e
                    );
                    PreviewState::Retrying {
                        attempt,
                        error: e.to_string(),
                    }
                }
            };

            on_state(&state);
            if state.is_terminal() {
                return state;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    on_state(&PreviewState::Closed);
                    return PreviewState::Closed;
                }
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }
}
