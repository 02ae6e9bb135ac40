//! Cross-file rename.
//!
//! Rename only runs against a trustworthy analysis: full parsing mode and
//! an error-free diagnostic history. Anything less and the reference set
//! may be incomplete, so the request fails fast with a user-visible
//! reason instead of attempting a partial rename.

use std::collections::HashMap;

use thiserror::Error;
use tower_lsp::lsp_types::{DiagnosticSeverity, Position, TextEdit, Url};

use crate::config::ParsingMode;
use crate::engine::DiagnosticMap;
use crate::index::token_at_greedy;
use crate::resolve::{find_references, resolve_entity};
use crate::symbols::{AnalysisSnapshot, TokenKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    #[error("rename requires full parsing mode; partial analysis cannot find every reference")]
    PartialMode,
    #[error("rename requires an error-free workspace; fix the reported problems first")]
    WorkspaceHasErrors,
    #[error("there is no renameable symbol under the cursor")]
    NotRenameable,
    #[error("built-in names cannot be renamed")]
    Builtin,
}

/// Per-file edit groups for renaming the entity under the cursor.
///
/// Each edit replaces exactly one token span with `new_name`; no
/// re-analysis happens here, the caller re-triggers validation once the
/// edits land.
pub fn build_rename(
    snapshot: &AnalysisSnapshot,
    history: &DiagnosticMap,
    mode: ParsingMode,
    uri: &Url,
    position: Position,
    new_name: &str,
) -> Result<HashMap<Url, Vec<TextEdit>>, RenameError> {
    if mode == ParsingMode::Partial {
        return Err(RenameError::PartialMode);
    }

    let unit = snapshot.unit(uri).ok_or(RenameError::NotRenameable)?;
    let (_, token) = token_at_greedy(unit, position).ok_or(RenameError::NotRenameable)?;
    if token.kind != TokenKind::Identifier {
        return Err(RenameError::NotRenameable);
    }
    let entity = match resolve_entity(token, &snapshot.symbols, true) {
        None => return Err(RenameError::NotRenameable),
        Some(id) if snapshot.symbols.entity(id).is_builtin() => {
            return Err(RenameError::Builtin)
        }
        Some(id) => id,
    };

    if history_has_errors(history) {
        return Err(RenameError::WorkspaceHasErrors);
    }

    let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
    for location in find_references(snapshot, entity, uri) {
        changes.entry(location.uri).or_default().push(TextEdit {
            range: location.range,
            new_text: new_name.to_string(),
        });
    }
    Ok(changes)
}

fn history_has_errors(history: &DiagnosticMap) -> bool {
    history.values().flatten().any(|diagnostic| {
        diagnostic.severity == Some(DiagnosticSeverity::ERROR)
    })
}
