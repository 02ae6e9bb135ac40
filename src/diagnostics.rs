//! Diagnostic publication with a clear-then-set lifecycle.
//!
//! The publisher remembers the mapping it last sent; on each publish it
//! first clears every document that dropped out of the new mapping, then
//! sets the new lists. Both sets are computed from immutable snapshots
//! before any notification goes out.

use tokio::sync::Mutex;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::{Diagnostic, MessageType, Url};
use tower_lsp::Client;

use crate::engine::DiagnosticMap;

/// Outbound channel for diagnostics and log lines; the real implementation
/// is the tower-lsp [`Client`], tests substitute a recorder.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync + 'static {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>);
    async fn log(&self, message: String);
}

#[async_trait]
impl DiagnosticsSink for Client {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        self.publish_diagnostics(uri, diagnostics, None).await;
    }

    async fn log(&self, message: String) {
        self.log_message(MessageType::LOG, message).await;
    }
}

pub struct DiagnosticsPublisher<S> {
    sink: S,
    history: Mutex<DiagnosticMap>,
}

impl<S: DiagnosticsSink> DiagnosticsPublisher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            history: Mutex::new(DiagnosticMap::new()),
        }
    }

    /// Publish a fresh mapping.
    ///
    /// Documents present in the previous publication but absent from
    /// `new_diagnostics` get exactly one explicit empty set; every key of
    /// the new mapping is then sent as-is, including empty lists that
    /// overwrite stale entries.
    pub async fn publish(&self, new_diagnostics: DiagnosticMap) {
        let mut history = self.history.lock().await;
        let mut to_clear: Vec<Url> = history
            .keys()
            .filter(|uri| !new_diagnostics.contains_key(uri))
            .cloned()
            .collect();
        to_clear.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for uri in to_clear {
            self.sink.publish(uri, Vec::new()).await;
        }
        for (uri, diagnostics) in &new_diagnostics {
            self.sink.publish(uri.clone(), diagnostics.clone()).await;
        }
        *history = new_diagnostics;
    }

    /// The most recently published mapping; rename inspects it for
    /// error-severity diagnostics before touching the workspace.
    pub async fn history(&self) -> DiagnosticMap {
        self.history.lock().await.clone()
    }

    pub async fn log(&self, message: String) {
        self.sink.log(message).await;
    }
}
