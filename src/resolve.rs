//! Entity resolution and cross-file reference search.

use tower_lsp::lsp_types::{Location, Url};

use crate::symbols::{AnalysisSnapshot, ParsedUnit, SymbolTable, Token, TokenKind};
use crate::symbols::{EntityId, TokenLink};

/// Semantic entity a token denotes, if any.
///
/// A declaration token resolves to itself; the use wrappers (reference,
/// enumeration-literal use) are dereferenced one level to the underlying
/// definition. Built-in entities resolve to `None` unless the caller asks
/// for them.
pub fn resolve_entity(
    token: &Token,
    symbols: &SymbolTable,
    include_builtins: bool,
) -> Option<EntityId> {
    let id = match token.link? {
        TokenLink::Declaration(id) => id,
        TokenLink::Reference(id) => id,
        TokenLink::EnumLiteralUse(id) => id,
    };
    if !include_builtins && symbols.entity(id).is_builtin() {
        return None;
    }
    Some(id)
}

/// True when `unit` is visibility-reachable from `origin`: same declared
/// package, or a package that imports or is imported by the origin's
/// package.
///
/// This is a deliberate approximation that bounds the search space; it
/// does not chase transitive import chains, and same-name entities in
/// unrelated packages are excluded even if accidentally identical.
fn visibility_reachable(origin: &ParsedUnit, unit: &ParsedUnit) -> bool {
    match (origin.package, unit.package) {
        (Some(a), Some(b)) => {
            a == b || origin.imports.contains(&b) || unit.imports.contains(&a)
        }
        // A unit without a package declaration is only reachable from
        // itself; nothing can import it.
        _ => false,
    }
}

/// Every token location in visibility-reachable files that denotes
/// `entity`, compared by identity.
///
/// Results come in file-processing order, then in-file token order; no
/// global order is imposed beyond that and callers needing determinism
/// must sort.
pub fn find_references(
    snapshot: &AnalysisSnapshot,
    entity: EntityId,
    origin: &Url,
) -> Vec<Location> {
    collect_references(snapshot, entity, origin, true)
}

/// As [`find_references`], but without the declaring occurrences. Used for
/// `textDocument/references` when the client opts out of declarations.
pub fn find_references_excluding_declarations(
    snapshot: &AnalysisSnapshot,
    entity: EntityId,
    origin: &Url,
) -> Vec<Location> {
    collect_references(snapshot, entity, origin, false)
}

fn collect_references(
    snapshot: &AnalysisSnapshot,
    entity: EntityId,
    origin: &Url,
    include_declarations: bool,
) -> Vec<Location> {
    let Some(origin_unit) = snapshot.unit(origin) else {
        return Vec::new();
    };
    let mut locations = Vec::new();
    for (uri, unit) in &snapshot.units {
        if uri != origin && !visibility_reachable(origin_unit, unit) {
            continue;
        }
        for token in &unit.tokens {
            if token.kind != TokenKind::Identifier {
                continue;
            }
            if !include_declarations && matches!(token.link, Some(TokenLink::Declaration(_))) {
                continue;
            }
            if resolve_entity(token, &snapshot.symbols, true) == Some(entity) {
                locations.push(Location::new(uri.clone(), token.range));
            }
        }
    }
    locations
}
