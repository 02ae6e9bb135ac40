//! Boundary to the analysis engine.
//!
//! The grammar, type checker and constraint verifier live behind the
//! [`AnalysisEngine`] trait; this crate only drives registration and
//! collects the diagnostic stream. A fresh engine is built from the
//! [`EngineFactory`] for every validation cycle, so no analysis state
//! leaks between passes.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, Location, NumberOrString, Url,
};

use crate::symbols::{ParsedUnit, SymbolTable};

/// Severity of an engine message, mapped onto the protocol severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn to_lsp(self) -> DiagnosticSeverity {
        match self {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
            Severity::Info => DiagnosticSeverity::INFORMATION,
        }
    }
}

/// Control-flow signal raised by a fatal diagnostic.
///
/// The engine propagates this out of the file it is currently analyzing
/// and catches it at the per-file boundary; remaining diagnostics for that
/// file are simply absent for the pass.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("analysis of the file stopped after a fatal diagnostic")]
pub struct AnalysisFault;

pub type DiagnosticMap = HashMap<Url, Vec<Diagnostic>>;

/// Message handler passed to the engine; accumulates diagnostics per
/// document for one pass.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: DiagnosticMap,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one engine message. Returns `Err(AnalysisFault)` for fatal
    /// messages so the engine can unwind out of the offending file with `?`.
    pub fn emit(
        &mut self,
        location: &Location,
        severity: Severity,
        message: &str,
        fatal: bool,
        extra_info: Option<&str>,
        category: Option<&str>,
    ) -> Result<(), AnalysisFault> {
        let mut text = message.to_string();
        if let Some(extra) = extra_info {
            text.push('\n');
            text.push_str(extra);
        }
        let diagnostic = Diagnostic {
            range: location.range,
            severity: Some(severity.to_lsp()),
            code: category.map(|c| NumberOrString::String(c.to_string())),
            source: Some("trlc".to_string()),
            message: text,
            ..Diagnostic::default()
        };
        self.diagnostics
            .entry(location.uri.clone())
            .or_default()
            .push(diagnostic);
        if fatal {
            Err(AnalysisFault)
        } else {
            Ok(())
        }
    }

    /// Registration-time failure for a file that could not be read or
    /// registered; accumulated like any other diagnostic, never aborts the
    /// pass.
    pub fn registration_failure(&mut self, uri: Url, message: String) {
        let diagnostic = Diagnostic {
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some("trlc".to_string()),
            message,
            ..Diagnostic::default()
        };
        self.diagnostics.entry(uri).or_default().push(diagnostic);
    }

    pub fn into_diagnostics(self) -> DiagnosticMap {
        self.diagnostics
    }
}

/// Best-effort observer for long-running pass progress. Absence or failure
/// of the observer never affects correctness of the pass.
pub trait ProgressObserver: Send {
    fn parse_begin(&mut self) {}
    fn parse_progress(&mut self, _percent: u8) {}
    fn parse_end(&mut self) {}
}

/// Observer that drops every report.
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Result of one `process` call: the new symbol table and one parsed unit
/// per analyzed file.
#[derive(Debug, Default)]
pub struct AnalysisOutput {
    pub symbols: SymbolTable,
    pub units: HashMap<Url, ParsedUnit>,
}

/// One analysis run over a registered file set.
///
/// Implementations are expected to stop analyzing a file when
/// [`DiagnosticCollector::emit`] signals a fault, and to carry on with the
/// remaining files.
pub trait AnalysisEngine: Send {
    /// Register a scan-only include root; its files contribute symbols but
    /// are not owned by the workspace.
    fn register_include(&mut self, root: &Path, handler: &mut DiagnosticCollector) -> bool;

    /// Register one file, with `content` overriding the on-disk text when
    /// the editor holds a newer copy. Returns `false` on registration
    /// failure.
    fn register_file(
        &mut self,
        path: &Path,
        content: Option<&str>,
        handler: &mut DiagnosticCollector,
    ) -> bool;

    /// Analyze everything registered so far.
    fn process(
        &mut self,
        handler: &mut DiagnosticCollector,
        progress: &mut dyn ProgressObserver,
    ) -> AnalysisOutput;
}

/// Builds a fresh engine for each validation cycle.
pub trait EngineFactory: Send + Sync + 'static {
    fn create_engine(&self) -> Box<dyn AnalysisEngine>;
}
