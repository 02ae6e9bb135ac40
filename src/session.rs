//! Long-lived server state shared between request handlers and the
//! validation worker.
//!
//! The document store is guarded by a mutex held only for the duration of
//! a mutation; the analysis snapshot is an `Arc` behind a lock, replaced
//! wholesale at the end of a pass so readers never observe a torn update.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock};

use crate::config::Settings;
use crate::documents::DocumentStore;
use crate::symbols::AnalysisSnapshot;

#[derive(Default)]
pub struct Session {
    pub documents: Mutex<DocumentStore>,
    snapshot: RwLock<Arc<AnalysisSnapshot>>,
    pub settings: RwLock<Settings>,
    pub workspace_root: RwLock<Option<PathBuf>>,
    passes: AtomicU64,
    pass_notify: Notify,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current analysis output; cheap to clone and safe to hold across
    /// awaits. May be one or more cycles stale relative to queued edits.
    pub async fn snapshot(&self) -> Arc<AnalysisSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Replace the published snapshot. Called by the worker only, at the
    /// end of a successful pass.
    pub async fn install_snapshot(&self, snapshot: Arc<AnalysisSnapshot>) {
        *self.snapshot.write().await = snapshot;
    }

    /// Number of completed validation cycles since startup.
    pub fn completed_passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_pass_complete(&self) {
        self.passes.fetch_add(1, Ordering::SeqCst);
        self.pass_notify.notify_waiters();
    }

    /// Wait until at least `count` validation cycles have completed.
    pub async fn wait_for_passes(&self, count: u64) {
        loop {
            let notified = self.pass_notify.notified();
            if self.completed_passes() >= count {
                return;
            }
            notified.await;
        }
    }
}
