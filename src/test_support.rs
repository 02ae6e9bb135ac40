//! Shared fixture for query-layer tests.
//!
//! Builds the snapshot an analysis pass would produce for a small
//! workspace:
//!
//! ```text
//! p.rsl    package P; type T { x : Integer, optional y/c/pos/parent },
//!          enum Color { red green }, tuple Coord { lat lon : Integer }
//! a.trlc   package P; T first { x = 1 }
//! b.trlc   package Q; import P; T second { x = 2, c = Color.red }
//! r.rsl    package R; an unrelated type also called T
//! d.trlc   package S; a stray reference to P.T with no import of P
//! ```

use std::sync::Arc;

use tower_lsp::lsp_types::{Location, Position, Range, Url};

use crate::symbols::{
    AnalysisSnapshot, Entity, EntityId, EntityKind, ParsedUnit, SymbolTable, Token, TokenKind,
    TokenLink,
};

pub(crate) fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///ws/{name}")).unwrap()
}

pub(crate) fn span(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

pub(crate) fn kw(text: &str, line: u32, start: u32) -> Token {
    Token::new(
        TokenKind::Keyword,
        text,
        span(line, start, start + text.len() as u32),
    )
}

pub(crate) fn punct(text: &str, line: u32, start: u32) -> Token {
    Token::new(
        TokenKind::Punctuation,
        text,
        span(line, start, start + text.len() as u32),
    )
}

pub(crate) fn ident(text: &str, line: u32, start: u32, link: TokenLink) -> Token {
    Token::new(
        TokenKind::Identifier,
        text,
        span(line, start, start + text.len() as u32),
    )
    .linked(link)
}

pub(crate) struct Fixture {
    pub snapshot: Arc<AnalysisSnapshot>,
    pub integer: EntityId,
    pub p: EntityId,
    pub q: EntityId,
    pub t: EntityId,
    pub x: EntityId,
    pub color: EntityId,
    pub red: EntityId,
    pub green: EntityId,
    pub coord: EntityId,
    pub pos: EntityId,
    pub parent: EntityId,
    pub c: EntityId,
    pub first: EntityId,
    pub second: EntityId,
    pub t_unrelated: EntityId,
}

pub(crate) fn fixture() -> Fixture {
    let mut symbols = SymbolTable::new();
    let builtin = |symbols: &mut SymbolTable, name: &str| {
        symbols.add(Entity {
            name: name.into(),
            kind: EntityKind::Builtin,
            location: None,
            package: None,
        })
    };
    let integer = builtin(&mut symbols, "Integer");
    let string = builtin(&mut symbols, "String");

    let package = |symbols: &mut SymbolTable, name: &str, file: &str, line: u32, start: u32| {
        symbols.add(Entity {
            name: name.into(),
            kind: EntityKind::Package {
                imports: Vec::new(),
                members: Vec::new(),
            },
            location: Some(Location::new(
                uri(file),
                span(line, start, start + name.len() as u32),
            )),
            package: None,
        })
    };
    let p = package(&mut symbols, "P", "p.rsl", 0, 8);
    let q = package(&mut symbols, "Q", "b.trlc", 0, 8);
    let r = package(&mut symbols, "R", "r.rsl", 0, 8);
    let s = package(&mut symbols, "S", "d.trlc", 0, 8);

    let entity = |symbols: &mut SymbolTable,
                  name: &str,
                  kind: EntityKind,
                  pkg: EntityId,
                  file: &str,
                  line: u32,
                  start: u32| {
        symbols.add(Entity {
            name: name.into(),
            kind,
            location: Some(Location::new(
                uri(file),
                span(line, start, start + name.len() as u32),
            )),
            package: Some(pkg),
        })
    };

    let t = entity(
        &mut symbols,
        "T",
        EntityKind::RecordType { components: Vec::new() },
        p,
        "p.rsl",
        2,
        5,
    );
    let component = |symbols: &mut SymbolTable,
                     name: &str,
                     ty: EntityId,
                     optional: bool,
                     line: u32,
                     start: u32| {
        entity(
            symbols,
            name,
            EntityKind::Component {
                component_type: ty,
                optional,
            },
            p,
            "p.rsl",
            line,
            start,
        )
    };
    let x = component(&mut symbols, "x", integer, false, 3, 2);
    let y = component(&mut symbols, "y", string, true, 4, 11);

    let color = entity(
        &mut symbols,
        "Color",
        EntityKind::EnumerationType { literals: Vec::new() },
        p,
        "p.rsl",
        10,
        5,
    );
    let red = entity(
        &mut symbols,
        "red",
        EntityKind::EnumerationLiteral,
        p,
        "p.rsl",
        11,
        2,
    );
    let green = entity(
        &mut symbols,
        "green",
        EntityKind::EnumerationLiteral,
        p,
        "p.rsl",
        12,
        2,
    );

    let coord = entity(
        &mut symbols,
        "Coord",
        EntityKind::TupleType { components: Vec::new() },
        p,
        "p.rsl",
        15,
        6,
    );
    let lat = entity(
        &mut symbols,
        "lat",
        EntityKind::Component {
            component_type: integer,
            optional: false,
        },
        p,
        "p.rsl",
        16,
        2,
    );
    let lon = entity(
        &mut symbols,
        "lon",
        EntityKind::Component {
            component_type: integer,
            optional: false,
        },
        p,
        "p.rsl",
        17,
        2,
    );

    let c = component(&mut symbols, "c", color, true, 5, 11);
    let pos = component(&mut symbols, "pos", coord, true, 6, 11);
    let parent = component(&mut symbols, "parent", t, true, 7, 11);

    let first = entity(
        &mut symbols,
        "first",
        EntityKind::RecordObject { record_type: t },
        p,
        "a.trlc",
        2,
        2,
    );
    let second = symbols.add(Entity {
        name: "second".into(),
        kind: EntityKind::RecordObject { record_type: t },
        location: Some(Location::new(uri("b.trlc"), span(3, 2, 8))),
        package: Some(q),
    });

    let t_unrelated = entity(
        &mut symbols,
        "T",
        EntityKind::RecordType { components: Vec::new() },
        r,
        "r.rsl",
        2,
        5,
    );
    let x_unrelated = symbols.add(Entity {
        name: "x".into(),
        kind: EntityKind::Component {
            component_type: integer,
            optional: false,
        },
        location: Some(Location::new(uri("r.rsl"), span(3, 2, 3))),
        package: Some(r),
    });

    // Wire up membership and imports now that every id exists.
    if let EntityKind::Package { members, .. } = &mut symbols.entity_mut(p).kind {
        *members = vec![t, color, coord, first];
    }
    if let EntityKind::Package { imports, members } = &mut symbols.entity_mut(q).kind {
        *imports = vec![p];
        *members = vec![second];
    }
    if let EntityKind::Package { members, .. } = &mut symbols.entity_mut(r).kind {
        *members = vec![t_unrelated];
    }
    if let EntityKind::RecordType { components } = &mut symbols.entity_mut(t).kind {
        *components = vec![x, y, c, pos, parent];
    }
    if let EntityKind::EnumerationType { literals } = &mut symbols.entity_mut(color).kind {
        *literals = vec![red, green];
    }
    if let EntityKind::TupleType { components } = &mut symbols.entity_mut(coord).kind {
        *components = vec![lat, lon];
    }
    if let EntityKind::RecordType { components } = &mut symbols.entity_mut(t_unrelated).kind {
        *components = vec![x_unrelated];
    }

    let mut units = std::collections::HashMap::new();

    units.insert(
        uri("p.rsl"),
        ParsedUnit {
            package: Some(p),
            imports: Vec::new(),
            tokens: vec![
                kw("package", 0, 0),
                ident("P", 0, 8, TokenLink::Declaration(p)),
                kw("type", 2, 0),
                ident("T", 2, 5, TokenLink::Declaration(t)),
                punct("{", 2, 7),
                ident("x", 3, 2, TokenLink::Declaration(x)),
                punct(":", 3, 4),
                ident("Integer", 3, 6, TokenLink::Reference(integer)),
                kw("optional", 4, 2),
                ident("y", 4, 11, TokenLink::Declaration(y)),
                punct(":", 4, 13),
                ident("String", 4, 15, TokenLink::Reference(string)),
                kw("optional", 5, 2),
                ident("c", 5, 11, TokenLink::Declaration(c)),
                punct(":", 5, 13),
                ident("Color", 5, 15, TokenLink::Reference(color)),
                kw("optional", 6, 2),
                ident("pos", 6, 11, TokenLink::Declaration(pos)),
                punct(":", 6, 15),
                ident("Coord", 6, 17, TokenLink::Reference(coord)),
                kw("optional", 7, 2),
                ident("parent", 7, 11, TokenLink::Declaration(parent)),
                punct(":", 7, 18),
                ident("T", 7, 20, TokenLink::Reference(t)),
                punct("}", 8, 0),
                kw("enum", 10, 0),
                ident("Color", 10, 5, TokenLink::Declaration(color)),
                punct("{", 10, 11),
                ident("red", 11, 2, TokenLink::Declaration(red)),
                ident("green", 12, 2, TokenLink::Declaration(green)),
                punct("}", 13, 0),
                kw("tuple", 15, 0),
                ident("Coord", 15, 6, TokenLink::Declaration(coord)),
                punct("{", 15, 12),
                ident("lat", 16, 2, TokenLink::Declaration(lat)),
                punct(":", 16, 6),
                ident("Integer", 16, 8, TokenLink::Reference(integer)),
                ident("lon", 17, 2, TokenLink::Declaration(lon)),
                punct(":", 17, 6),
                ident("Integer", 17, 8, TokenLink::Reference(integer)),
                punct("}", 18, 0),
            ],
        },
    );

    units.insert(
        uri("a.trlc"),
        ParsedUnit {
            package: Some(p),
            imports: Vec::new(),
            tokens: vec![
                kw("package", 0, 0),
                ident("P", 0, 8, TokenLink::Reference(p)),
                ident("T", 2, 0, TokenLink::Reference(t)),
                ident("first", 2, 2, TokenLink::Declaration(first)),
                punct("{", 2, 8),
                ident("x", 3, 2, TokenLink::Reference(x)),
                punct("=", 3, 4),
                Token::new(TokenKind::Integer, "1", span(3, 6, 7)),
                punct("}", 4, 0),
            ],
        },
    );

    units.insert(
        uri("b.trlc"),
        ParsedUnit {
            package: Some(q),
            imports: vec![p],
            tokens: vec![
                kw("package", 0, 0),
                ident("Q", 0, 8, TokenLink::Declaration(q)),
                kw("import", 1, 0),
                ident("P", 1, 7, TokenLink::Reference(p)),
                ident("T", 3, 0, TokenLink::Reference(t)),
                ident("second", 3, 2, TokenLink::Declaration(second)),
                punct("{", 3, 9),
                ident("x", 4, 2, TokenLink::Reference(x)),
                punct("=", 4, 4),
                Token::new(TokenKind::Integer, "2", span(4, 6, 7)),
                ident("c", 5, 2, TokenLink::Reference(c)),
                punct("=", 5, 4),
                ident("Color", 5, 6, TokenLink::Reference(color)),
                punct(".", 5, 11),
                ident("red", 5, 12, TokenLink::EnumLiteralUse(red)),
                punct("}", 6, 0),
            ],
        },
    );

    units.insert(
        uri("r.rsl"),
        ParsedUnit {
            package: Some(r),
            imports: Vec::new(),
            tokens: vec![
                kw("package", 0, 0),
                ident("R", 0, 8, TokenLink::Declaration(r)),
                kw("type", 2, 0),
                ident("T", 2, 5, TokenLink::Declaration(t_unrelated)),
                punct("{", 2, 7),
                ident("x", 3, 2, TokenLink::Declaration(x_unrelated)),
                punct(":", 3, 4),
                ident("Integer", 3, 6, TokenLink::Reference(integer)),
                punct("}", 4, 0),
            ],
        },
    );

    // A file whose package neither is P nor imports it; any entity match
    // here must stay invisible to reference searches originating in P.
    units.insert(
        uri("d.trlc"),
        ParsedUnit {
            package: Some(s),
            imports: Vec::new(),
            tokens: vec![
                kw("package", 0, 0),
                ident("S", 0, 8, TokenLink::Declaration(s)),
                ident("T", 2, 0, TokenLink::Reference(t)),
            ],
        },
    );

    Fixture {
        snapshot: Arc::new(AnalysisSnapshot { symbols, units }),
        integer,
        p,
        q,
        t,
        x,
        color,
        red,
        green,
        coord,
        pos,
        parent,
        c,
        first,
        second,
        t_unrelated,
    }
}
