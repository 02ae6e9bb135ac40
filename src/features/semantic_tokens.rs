//! Full-document semantic tokens over the position index.
//!
//! Token kinds and entity links map onto the protocol's token types; the
//! wire format encodes each token as a delta from the previous one. The
//! lexer never produces multi-line identifier tokens, so no line
//! splitting is needed here.

use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

use crate::resolve::resolve_entity;
use crate::symbols::{EntityKind, ParsedUnit, SymbolTable, Token, TokenKind};

/// Token types in legend order; indices below refer to this table.
pub const TOKEN_TYPES: [SemanticTokenType; 9] = [
    SemanticTokenType::KEYWORD,
    SemanticTokenType::NAMESPACE,
    SemanticTokenType::TYPE,
    SemanticTokenType::PROPERTY,
    SemanticTokenType::ENUM_MEMBER,
    SemanticTokenType::VARIABLE,
    SemanticTokenType::STRING,
    SemanticTokenType::NUMBER,
    SemanticTokenType::COMMENT,
];

const KEYWORD: u32 = 0;
const NAMESPACE: u32 = 1;
const TYPE: u32 = 2;
const PROPERTY: u32 = 3;
const ENUM_MEMBER: u32 = 4;
const VARIABLE: u32 = 5;
const STRING: u32 = 6;
const NUMBER: u32 = 7;
const COMMENT: u32 = 8;

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.to_vec(),
        token_modifiers: Vec::new(),
    }
}

/// Delta-encoded semantic tokens for one file.
pub fn encode(unit: &ParsedUnit, symbols: &SymbolTable) -> Vec<SemanticToken> {
    let mut data = Vec::new();
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in &unit.tokens {
        let Some(token_type) = classify(token, symbols) else {
            continue;
        };
        let line = token.range.start.line;
        let start = token.range.start.character;
        let delta_line = line - prev_line;
        let delta_start = if delta_line == 0 {
            start - prev_start
        } else {
            start
        };
        data.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.range.end.character - start,
            token_type,
            token_modifiers_bitset: 0,
        });
        prev_line = line;
        prev_start = start;
    }

    data
}

fn classify(token: &Token, symbols: &SymbolTable) -> Option<u32> {
    match token.kind {
        TokenKind::Keyword => Some(KEYWORD),
        TokenKind::String => Some(STRING),
        TokenKind::Integer => Some(NUMBER),
        TokenKind::Comment => Some(COMMENT),
        TokenKind::Punctuation => None,
        TokenKind::Identifier => {
            let entity = resolve_entity(token, symbols, true)?;
            Some(match symbols.entity(entity).kind {
                EntityKind::Package { .. } => NAMESPACE,
                EntityKind::RecordType { .. }
                | EntityKind::EnumerationType { .. }
                | EntityKind::TupleType { .. }
                | EntityKind::Builtin => TYPE,
                EntityKind::Component { .. } => PROPERTY,
                EntityKind::EnumerationLiteral => ENUM_MEMBER,
                EntityKind::RecordObject { .. } => VARIABLE,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, uri};

    #[test]
    fn encodes_deltas_in_token_order() {
        let fx = fixture();
        let unit = fx.snapshot.unit(&uri("a.trlc")).unwrap();
        let tokens = encode(unit, &fx.snapshot.symbols);

        // package(kw) P(namespace) T(type) first(variable) x(property)
        // 1(number); punctuation is skipped.
        let types: Vec<u32> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![KEYWORD, NAMESPACE, TYPE, VARIABLE, PROPERTY, NUMBER]
        );

        // First token starts the file: absolute coordinates.
        assert_eq!(tokens[0].delta_line, 0);
        assert_eq!(tokens[0].delta_start, 0);
        assert_eq!(tokens[0].length, 7);
        // "P" sits on the same line, 8 columns later.
        assert_eq!(tokens[1].delta_line, 0);
        assert_eq!(tokens[1].delta_start, 8);
        // "T" is two lines down, restarting the column delta.
        assert_eq!(tokens[2].delta_line, 2);
        assert_eq!(tokens[2].delta_start, 0);
    }

    #[test]
    fn unlinked_identifiers_are_not_highlighted() {
        let fx = fixture();
        let unit = ParsedUnit {
            package: None,
            imports: Vec::new(),
            tokens: vec![crate::symbols::Token::new(
                crate::symbols::TokenKind::Identifier,
                "mystery",
                crate::test_support::span(0, 0, 7),
            )],
        };
        assert!(encode(&unit, &fx.snapshot.symbols).is_empty());
    }

    #[test]
    fn legend_matches_the_type_table() {
        assert_eq!(legend().token_types.len(), TOKEN_TYPES.len());
    }
}
