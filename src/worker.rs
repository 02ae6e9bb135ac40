//! Change queue and single-flight validation worker.
//!
//! Protocol handlers enqueue [`ChangeEvent`]s without blocking; one
//! long-lived task drains the queue, applies the mutations to the document
//! store, runs exactly one analysis pass over the result, swaps the
//! snapshot in, and publishes diagnostics. Events arriving while a pass is
//! running are picked up by the next loop iteration immediately, so a
//! `Rescan` queued mid-pass triggers exactly one more pass. A panic inside
//! the engine costs only its own cycle, never the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ParsingMode;
use crate::diagnostics::{DiagnosticsPublisher, DiagnosticsSink};
use crate::documents::{path_from_uri, uri_from_path, ChangeEvent};
use crate::engine::{DiagnosticCollector, EngineFactory, ProgressObserver};
use crate::session::Session;
use crate::symbols::AnalysisSnapshot;

/// File extensions the workspace walk considers analyzable.
pub const SOURCE_EXTENSIONS: [&str; 3] = ["rsl", "check", "trlc"];

/// Producer half of the change queue. `enqueue` never blocks and never
/// rejects; if the worker is gone the event is dropped, which only happens
/// during shutdown.
#[derive(Clone)]
pub struct ChangeQueue {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeQueue {
    pub fn enqueue(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            warn!("change event dropped, validation worker has shut down");
        }
    }
}

/// Spawn the validation worker and hand back the queue producer.
pub fn spawn<S: DiagnosticsSink>(
    session: Arc<Session>,
    factory: Arc<dyn EngineFactory>,
    publisher: Arc<DiagnosticsPublisher<S>>,
) -> ChangeQueue {
    let (tx, rx) = mpsc::unbounded_channel();
    let worker = ValidationWorker {
        rx,
        cx: PassContext {
            session,
            factory,
            publisher,
        },
    };
    tokio::spawn(worker.run());
    ChangeQueue { tx }
}

struct ValidationWorker<S: DiagnosticsSink> {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    cx: PassContext<S>,
}

impl<S: DiagnosticsSink> ValidationWorker<S> {
    async fn run(mut self) {
        while let Some(first) = self.rx.recv().await {
            // Pop everything queued so far in one go; the channel is only
            // locked per pop, never across the pass.
            let mut batch = vec![first];
            while let Ok(event) = self.rx.try_recv() {
                batch.push(event);
            }
            // Each cycle runs in its own task so a panic inside the engine
            // is confined to that pass; the loop logs it and keeps
            // draining later edits.
            if let Err(fault) = tokio::spawn(self.cx.clone().cycle(batch)).await {
                if fault.is_panic() {
                    warn!("validation cycle panicked, resuming with the next batch");
                }
            }
            self.cx.session.mark_pass_complete();
        }
        debug!("change queue closed, validation worker exiting");
    }
}

/// Everything one validation cycle needs, cloned per pass so the cycle can
/// run as a standalone task.
struct PassContext<S: DiagnosticsSink> {
    session: Arc<Session>,
    factory: Arc<dyn EngineFactory>,
    publisher: Arc<DiagnosticsPublisher<S>>,
}

impl<S: DiagnosticsSink> Clone for PassContext<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            factory: self.factory.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

impl<S: DiagnosticsSink> PassContext<S> {
    /// One drain-and-validate cycle. Faults surface as diagnostics or log
    /// lines; the loop itself must survive every cycle.
    async fn cycle(self, batch: Vec<ChangeEvent>) {
        debug!(events = batch.len(), "validation cycle starting");
        let rescan_requested = batch.iter().any(|e| matches!(e, ChangeEvent::Rescan));

        // Apply mutations in arrival order, then snapshot the store so the
        // lock is not held during analysis. Later updates to the same
        // document overwrite earlier ones, so only the final state feeds
        // the pass.
        let documents = {
            let mut store = self.session.documents.lock().await;
            for event in batch {
                store.apply(event);
            }
            store.clone()
        };

        let settings = self.session.settings.read().await.clone();
        let root = self.session.workspace_root.read().await.clone();

        let mut collector = DiagnosticCollector::new();
        let mut engine = self.factory.create_engine();
        let mut progress = LogProgress::default();

        for include in &settings.include_paths {
            if !engine.register_include(include, &mut collector) {
                warn!(path = %include.display(), "include root could not be registered");
            }
        }

        let walk = settings.parsing == ParsingMode::Full || rescan_requested;
        match (walk, root) {
            (true, Some(root)) => {
                for path in scan_workspace(&root) {
                    let content = documents.content_for_path(&path);
                    if !engine.register_file(&path, content, &mut collector) {
                        if let Some(uri) = uri_from_path(&path) {
                            collector.registration_failure(
                                uri,
                                format!("failed to register {}", path.display()),
                            );
                        }
                    }
                }
            }
            _ => {
                // Partial mode (or no workspace root): only the open
                // documents are analyzed.
                for (uri, content) in documents.iter() {
                    let Some(path) = path_from_uri(uri) else {
                        continue;
                    };
                    if !engine.register_file(&path, Some(content), &mut collector) {
                        collector.registration_failure(
                            uri.clone(),
                            format!("failed to register {}", path.display()),
                        );
                    }
                }
            }
        }

        let output = engine.process(&mut collector, &mut progress);
        info!(
            files = output.units.len(),
            "analysis pass complete"
        );

        self.session
            .install_snapshot(Arc::new(AnalysisSnapshot {
                symbols: output.symbols,
                units: output.units,
            }))
            .await;

        self.publisher.publish(collector.into_diagnostics()).await;
        self.publisher
            .log(format!("validated {} file(s)", documents.len()))
            .await;
    }
}

/// Analyzable files under `root`, honoring ignore files and skipping
/// hidden directories; sorted for a stable registration order.
pub fn scan_workspace(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(root)
        .follow_links(false)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_source_file(path))
        .collect();
    files.sort();
    files
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Progress observer that forwards engine reports to the log; reports are
/// best-effort and never affect the pass.
#[derive(Default)]
struct LogProgress {
    last_percent: u8,
}

impl ProgressObserver for LogProgress {
    fn parse_begin(&mut self) {
        debug!("parse started");
    }

    fn parse_progress(&mut self, percent: u8) {
        if percent != self.last_percent {
            self.last_percent = percent;
            debug!(percent, "parse progress");
        }
    }

    fn parse_end(&mut self) {
        debug!("parse finished");
    }
}
