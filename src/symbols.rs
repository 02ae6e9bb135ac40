//! Semantic model produced by an analysis pass.
//!
//! The symbol table owns every semantic entity in an arena; entities are
//! referred to by [`EntityId`] and compared by id, never cloned. One
//! [`ParsedUnit`] per analyzed file carries the ordered token stream that
//! the position index and all interactive queries operate on. The whole
//! set is bundled into an [`AnalysisSnapshot`] and swapped in wholesale
//! after each successful pass.

use std::collections::HashMap;

use tower_lsp::lsp_types::{Location, Range, Url};

/// Index into the symbol table's entity arena.
///
/// Two tokens denote the same construct exactly when their resolved ids
/// are equal; name equality is never used for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u32);

/// A named semantic construct of the analyzed language.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Declaration site. `None` for built-ins, which have no source location.
    pub location: Option<Location>,
    /// Owning package, `None` for packages themselves and built-ins.
    pub package: Option<EntityId>,
}

/// Closed set of entity kinds.
///
/// Resolution and completion branch on this with exhaustive matches, so a
/// new kind cannot be added without every consumer being revisited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Package {
        imports: Vec<EntityId>,
        members: Vec<EntityId>,
    },
    RecordType {
        components: Vec<EntityId>,
    },
    Component {
        component_type: EntityId,
        optional: bool,
    },
    EnumerationType {
        literals: Vec<EntityId>,
    },
    EnumerationLiteral,
    TupleType {
        components: Vec<EntityId>,
    },
    RecordObject {
        record_type: EntityId,
    },
    /// Built-in type or function, not user-defined and never renameable.
    Builtin,
}

impl Entity {
    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, EntityKind::Builtin)
    }

    /// Human-readable kind word used in hover text and log output.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Package { .. } => "package",
            EntityKind::RecordType { .. } => "record type",
            EntityKind::Component { .. } => "component",
            EntityKind::EnumerationType { .. } => "enumeration",
            EntityKind::EnumerationLiteral => "enumeration literal",
            EntityKind::TupleType { .. } => "tuple type",
            EntityKind::RecordObject { .. } => "record object",
            EntityKind::Builtin => "built-in",
        }
    }
}

/// Root lookup structure from an analysis pass.
///
/// Replaced wholesale each pass; ids are only meaningful against the table
/// that issued them.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entities: Vec<Entity>,
    packages: HashMap<String, EntityId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        if let EntityKind::Package { .. } = entity.kind {
            self.packages.insert(entity.name.clone(), id);
        }
        self.entities.push(entity);
        id
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0 as usize]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0 as usize]
    }

    pub fn package(&self, name: &str) -> Option<EntityId> {
        self.packages.get(name).copied()
    }

    /// Top-level package names, sorted for stable presentation.
    pub fn package_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    String,
    Integer,
    Comment,
}

/// Link from a token to the semantic model.
///
/// Wrappers mirror how the analysis engine annotates tokens: a token is
/// either the declaration itself or one of the use forms that stand for a
/// declaration made elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLink {
    /// The token is the declaring occurrence of the entity.
    Declaration(EntityId),
    /// The token names an entity declared elsewhere (name use, alias).
    Reference(EntityId),
    /// The token is a qualified use of an enumeration literal.
    EnumLiteralUse(EntityId),
}

impl TokenLink {
    pub fn target(self) -> EntityId {
        match self {
            TokenLink::Declaration(id)
            | TokenLink::Reference(id)
            | TokenLink::EnumLiteralUse(id) => id,
        }
    }
}

/// One lexical token with its half-open source range `[start, end)`.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
    pub link: Option<TokenLink>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            link: None,
        }
    }

    pub fn linked(mut self, link: TokenLink) -> Self {
        self.link = Some(link);
        self
    }
}

/// Per-file analysis result: the ordered token stream plus the file's
/// declared package and imports.
#[derive(Debug, Clone, Default)]
pub struct ParsedUnit {
    pub package: Option<EntityId>,
    pub imports: Vec<EntityId>,
    pub tokens: Vec<Token>,
}

/// The current analysis output, consumed read-only by every interactive
/// query. Produced by the validation worker and swapped in atomically;
/// readers may see a stale pass but never a partially updated one.
#[derive(Debug, Default)]
pub struct AnalysisSnapshot {
    pub symbols: SymbolTable,
    pub units: HashMap<Url, ParsedUnit>,
}

impl AnalysisSnapshot {
    pub fn unit(&self, uri: &Url) -> Option<&ParsedUnit> {
        self.units.get(uri)
    }
}
