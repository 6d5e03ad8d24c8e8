//! Tokenizer for single OAL lines.
//!
//! OAL is line oriented, so the lexer never sees more than one statement.
//! Whitespace is kept as tokens so expression rewriting can rebuild the
//! original spacing.

use crate::diagnostic::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Punct,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    /// Identifier comparison ignoring ASCII case.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(kw)
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

const TWO_CHAR_PUNCT: &[&str] = &["::", "->", "==", "!=", "<=", ">=", "&&", "||"];

/// Splits a line into tokens. Never fails; an unterminated string runs to
/// the end of the line.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let kind = if c.is_whitespace() {
            while matches!(chars.peek(), Some((_, ch)) if ch.is_whitespace()) {
                chars.next();
            }
            TokenKind::Whitespace
        } else if c.is_alphabetic() || c == '_' {
            while matches!(chars.peek(), Some((_, ch)) if ch.is_alphanumeric() || *ch == '_') {
                chars.next();
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            lex_number(line, &mut chars);
            TokenKind::Number
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut escaped = false;
            for (_, ch) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == c {
                    break;
                }
            }
            TokenKind::Str
        } else {
            let rest = &line[start..];
            let width = TWO_CHAR_PUNCT
                .iter()
                .find(|p| rest.starts_with(**p))
                .map(|p| p.len())
                .unwrap_or(c.len_utf8());
            while matches!(chars.peek(), Some((i, _)) if *i < start + width) {
                chars.next();
            }
            TokenKind::Punct
        };

        let end = chars.peek().map(|(i, _)| *i).unwrap_or(line.len());
        tokens.push(Token {
            kind,
            text: &line[start..end],
            span: Span::new(start, end),
        });
    }

    tokens
}

fn lex_number(line: &str, chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    while matches!(chars.peek(), Some((_, ch)) if ch.is_ascii_digit()) {
        chars.next();
    }
    // A fraction only when a digit follows the dot, so `3.field` stays apart.
    if let Some(&(dot, '.')) = chars.peek() {
        let after = line[dot + 1..].chars().next();
        if after.is_some_and(|ch| ch.is_ascii_digit()) {
            chars.next();
            while matches!(chars.peek(), Some((_, ch)) if ch.is_ascii_digit()) {
                chars.next();
            }
        }
    }
}

/// Tokens without whitespace.
pub fn significant<'a>(tokens: &[Token<'a>]) -> Vec<Token<'a>> {
    tokens.iter().filter(|t| !t.is_trivia()).cloned().collect()
}
