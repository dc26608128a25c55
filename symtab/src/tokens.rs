//! The token log: an observational record of the lexical tokens of a file,
//! rendered as a table for display. Nothing in semantic analysis reads it.
use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub kind: String,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

/// Collapses every whitespace run (including line breaks) to a single space
/// and trims both ends.
pub fn normalize_lexeme(lexeme: &str) -> String {
    lexeme.split_whitespace().join(" ")
}

pub struct TokenTable<'a> {
    tokens: &'a [TokenEntry],
}

impl<'a> TokenTable<'a> {
    pub fn new(tokens: &'a [TokenEntry]) -> Self {
        TokenTable { tokens }
    }
}

const RULE: &str = "------+---------------------+------------------------+------+--------";

impl<'a> fmt::Display for TokenTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== SYMBOL TABLE ==========")?;
        writeln!(
            f,
            " {:<4} | {:<19} | {:<22} | {:>4} | {:>6}",
            "#", "KIND", "LEXEME", "LINE", "COLUMN"
        )?;
        writeln!(f, "{}", RULE)?;
        for (idx, token) in self.tokens.iter().enumerate() {
            writeln!(
                f,
                " {:<4} | {:<19} | {:<22} | {:>4} | {:>6}",
                idx + 1,
                token.kind,
                normalize_lexeme(&token.lexeme),
                token.line,
                token.column
            )?;
        }
        write!(f, "{}", RULE)
    }
}
