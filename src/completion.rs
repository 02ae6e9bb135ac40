//! Context-sensitive completion.
//!
//! The candidate list is selected from the trigger character and the
//! semantic link of the token just before it; branches are mutually
//! exclusive, and a position with no usable context yields an empty list
//! rather than `None` so the caller always gets a well-formed response.

use tower_lsp::lsp_types::{CompletionItemKind, Position, Url};

use crate::index::{token_at_greedy, token_lookback};
use crate::resolve::resolve_entity;
use crate::symbols::{AnalysisSnapshot, EntityId, EntityKind, ParsedUnit, Token, TokenKind};

/// One completion candidate, independent of the protocol item shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub detail: Option<String>,
    pub kind: CompletionItemKind,
    pub insert_text: Option<String>,
}

impl CompletionCandidate {
    fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            detail: None,
            kind,
            insert_text: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }
}

/// Completion context, matched exhaustively when producing candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionContext {
    /// After a `package` or `import` keyword: known package names.
    PackageNames,
    /// After `{` following a record type name: the synthesized block of
    /// required component assignments.
    RecordBlock(EntityId),
    /// After `.` on a component typed as an enumeration: qualified
    /// literal names.
    QualifiedEnumLiterals(EntityId),
    /// After `.` on an enumeration type itself: bare literal names.
    EnumLiterals(EntityId),
    /// After `.` on a package name: its top-level members.
    PackageMembers(EntityId),
    /// After `.` on a tuple-typed reference: the tuple's component names.
    TupleComponents(EntityId),
    /// After `=` on a component typed as a record: matching record
    /// instances from the record type's package.
    RecordValues(EntityId),
}

/// Candidates for a completion request at `position` in `uri`.
pub fn completion_candidates(
    snapshot: &AnalysisSnapshot,
    uri: &Url,
    position: Position,
    trigger: Option<char>,
) -> Vec<CompletionCandidate> {
    let Some(unit) = snapshot.unit(uri) else {
        return Vec::new();
    };
    match detect_context(snapshot, unit, position, trigger) {
        Some(context) => candidates_for(snapshot, context),
        None => Vec::new(),
    }
}

/// Token immediately before the trigger position.
///
/// The snapshot is typically one pass behind the edit that produced the
/// trigger character, so the character itself is usually absent from the
/// token stream; when a fresh pass has already tokenized it, step back
/// over it.
fn token_before_trigger<'a>(
    unit: &'a ParsedUnit,
    position: Position,
    trigger: Option<char>,
) -> Option<&'a Token> {
    let probe = Position::new(position.line, position.character.saturating_sub(1));
    let (idx, token) = token_at_greedy(unit, probe)?;
    match trigger {
        Some(ch)
            if token.kind == TokenKind::Punctuation && token.text == ch.to_string() =>
        {
            token_lookback(unit, idx, 1)
        }
        _ => Some(token),
    }
}

fn detect_context(
    snapshot: &AnalysisSnapshot,
    unit: &ParsedUnit,
    position: Position,
    trigger: Option<char>,
) -> Option<CompletionContext> {
    let token = token_before_trigger(unit, position, trigger)?;

    if trigger.is_none() {
        return match token.kind {
            TokenKind::Keyword if token.text == "package" || token.text == "import" => {
                Some(CompletionContext::PackageNames)
            }
            _ => None,
        };
    }

    let entity = resolve_entity(token, &snapshot.symbols, true)?;
    match (trigger?, &snapshot.symbols.entity(entity).kind) {
        ('{', EntityKind::RecordType { .. }) => Some(CompletionContext::RecordBlock(entity)),
        ('.', EntityKind::Component { component_type, .. }) => {
            match &snapshot.symbols.entity(*component_type).kind {
                EntityKind::EnumerationType { .. } => {
                    Some(CompletionContext::QualifiedEnumLiterals(*component_type))
                }
                EntityKind::TupleType { .. } => {
                    Some(CompletionContext::TupleComponents(*component_type))
                }
                _ => None,
            }
        }
        ('.', EntityKind::EnumerationType { .. }) => {
            Some(CompletionContext::EnumLiterals(entity))
        }
        ('.', EntityKind::Package { .. }) => Some(CompletionContext::PackageMembers(entity)),
        ('=', EntityKind::Component { component_type, .. }) => {
            match &snapshot.symbols.entity(*component_type).kind {
                EntityKind::RecordType { .. } => {
                    Some(CompletionContext::RecordValues(*component_type))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn candidates_for(
    snapshot: &AnalysisSnapshot,
    context: CompletionContext,
) -> Vec<CompletionCandidate> {
    let symbols = &snapshot.symbols;
    match context {
        CompletionContext::PackageNames => symbols
            .package_names()
            .into_iter()
            .map(|name| {
                CompletionCandidate::new(name, CompletionItemKind::MODULE)
                    .with_detail("package")
            })
            .collect(),

        CompletionContext::RecordBlock(record) => {
            let EntityKind::RecordType { components } = &symbols.entity(record).kind else {
                return Vec::new();
            };
            let block = components
                .iter()
                .filter_map(|&id| {
                    let entity = symbols.entity(id);
                    match entity.kind {
                        EntityKind::Component { optional: false, .. } => {
                            Some(format!("{} = ", entity.name))
                        }
                        _ => None,
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            vec![CompletionCandidate::new(
                &symbols.entity(record).name,
                CompletionItemKind::SNIPPET,
            )
            .with_detail("required components")
            .with_insert_text(block)]
        }

        CompletionContext::QualifiedEnumLiterals(enumeration) => {
            let enum_name = symbols.entity(enumeration).name.clone();
            literal_ids(snapshot, enumeration)
                .iter()
                .map(|&id| {
                    let qualified = format!("{}.{}", enum_name, symbols.entity(id).name);
                    CompletionCandidate::new(&qualified, CompletionItemKind::ENUM_MEMBER)
                        .with_insert_text(qualified)
                })
                .collect()
        }

        CompletionContext::EnumLiterals(enumeration) => literal_ids(snapshot, enumeration)
            .iter()
            .map(|&id| {
                CompletionCandidate::new(
                    &symbols.entity(id).name,
                    CompletionItemKind::ENUM_MEMBER,
                )
            })
            .collect(),

        CompletionContext::PackageMembers(package) => {
            let EntityKind::Package { members, .. } = &symbols.entity(package).kind else {
                return Vec::new();
            };
            members
                .iter()
                .map(|&id| {
                    let entity = symbols.entity(id);
                    CompletionCandidate::new(&entity.name, member_kind(&entity.kind))
                        .with_detail(entity.kind_name())
                })
                .collect()
        }

        CompletionContext::TupleComponents(tuple) => {
            let EntityKind::TupleType { components } = &symbols.entity(tuple).kind else {
                return Vec::new();
            };
            components
                .iter()
                .map(|&id| {
                    CompletionCandidate::new(
                        &symbols.entity(id).name,
                        CompletionItemKind::FIELD,
                    )
                })
                .collect()
        }

        CompletionContext::RecordValues(record) => {
            let Some(package) = symbols.entity(record).package else {
                return Vec::new();
            };
            let EntityKind::Package { members, .. } = &symbols.entity(package).kind else {
                return Vec::new();
            };
            members
                .iter()
                .filter(|&&id| {
                    matches!(
                        symbols.entity(id).kind,
                        EntityKind::RecordObject { record_type } if record_type == record
                    )
                })
                .map(|&id| {
                    CompletionCandidate::new(
                        &symbols.entity(id).name,
                        CompletionItemKind::VALUE,
                    )
                    .with_detail("record object")
                })
                .collect()
        }
    }
}

fn literal_ids(snapshot: &AnalysisSnapshot, enumeration: EntityId) -> Vec<EntityId> {
    match &snapshot.symbols.entity(enumeration).kind {
        EntityKind::EnumerationType { literals } => literals.clone(),
        _ => Vec::new(),
    }
}

fn member_kind(kind: &EntityKind) -> CompletionItemKind {
    match kind {
        EntityKind::Package { .. } => CompletionItemKind::MODULE,
        EntityKind::RecordType { .. } | EntityKind::TupleType { .. } => {
            CompletionItemKind::STRUCT
        }
        EntityKind::EnumerationType { .. } => CompletionItemKind::ENUM,
        EntityKind::EnumerationLiteral => CompletionItemKind::ENUM_MEMBER,
        EntityKind::Component { .. } => CompletionItemKind::FIELD,
        EntityKind::RecordObject { .. } => CompletionItemKind::VALUE,
        EntityKind::Builtin => CompletionItemKind::KEYWORD,
    }
}
