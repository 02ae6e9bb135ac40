//! Position index: lookup of the token under (or near) a cursor.
//!
//! Tokens in a [`ParsedUnit`] are ordered by start position, which lets
//! `token_at` binary-search the span list. Ranges are half-open
//! `[start, end)` in line-then-column order.

use tower_lsp::lsp_types::Position;

use crate::symbols::{ParsedUnit, Token};

/// Token whose range contains `position`, with its index in the unit's
/// token stream.
pub fn token_at(unit: &ParsedUnit, position: Position) -> Option<(usize, &Token)> {
    let idx = unit
        .tokens
        .partition_point(|token| token.range.start <= position)
        .checked_sub(1)?;
    let token = &unit.tokens[idx];
    (position < token.range.end).then_some((idx, token))
}

/// Greedy variant: when the cursor sits in whitespace (commonly just after
/// an identifier), step the column left one at a time down to zero and
/// retry.
pub fn token_at_greedy(unit: &ParsedUnit, position: Position) -> Option<(usize, &Token)> {
    (0..=position.character)
        .rev()
        .find_map(|character| token_at(unit, Position::new(position.line, character)))
}

/// Token `n` positions before the token at index `idx`.
///
/// Used by features that need the token before a trigger character.
pub fn token_lookback(unit: &ParsedUnit, idx: usize, n: usize) -> Option<&Token> {
    unit.tokens.get(idx.checked_sub(n)?)
}
