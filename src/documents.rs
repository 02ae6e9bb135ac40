//! In-memory mirror of the documents the editor has open.
//!
//! The store is the authoritative copy of open-file contents; files not in
//! the store are read from disk by the analysis engine. It is mutated only
//! by the validation worker applying queued [`ChangeEvent`]s, so request
//! handlers never race with it beyond the brief store lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;

/// A pending workspace mutation, consumed exactly once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Replace the stored content of a document (open or edit).
    Update { uri: Url, text: String },
    /// Forget a document; subsequent passes read it from disk again.
    Delete { uri: Url },
    /// No store mutation; forces a full workspace walk on the next pass.
    Rescan,
}

#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    files: HashMap<Url, String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one queued event. Updates overwrite, deletes remove, rescans
    /// leave the store untouched.
    pub fn apply(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Update { uri, text } => {
                self.files.insert(uri, text);
            }
            ChangeEvent::Delete { uri } => {
                self.files.remove(&uri);
            }
            ChangeEvent::Rescan => {}
        }
    }

    pub fn get(&self, uri: &Url) -> Option<&str> {
        self.files.get(uri).map(String::as_str)
    }

    /// Open-document override for a filesystem path, if the editor holds a
    /// newer copy than the disk.
    pub fn content_for_path(&self, path: &Path) -> Option<&str> {
        let uri = uri_from_path(path)?;
        self.get(&uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Url, &str)> {
        self.files.iter().map(|(uri, text)| (uri, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn uri_from_path(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

pub fn path_from_uri(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}
