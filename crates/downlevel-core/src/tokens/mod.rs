/*!
# Token Streams

Read-only lexical context for a source file. Tokens are produced once per file
by the external lexer (or by the coarse [`TokenStream::scan`] fallback) and are
never mutated by rules.
*/

pub mod follow;

pub use follow::is_followed_by_separator;

use serde::{Deserialize, Serialize};

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Comma,
    Semicolon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Whitespace,
    Comment,
    DocComment,
    Variable,
    Identifier,
    Literal,
    Operator,
}

impl TokenKind {
    /// Tokens that carry no syntax
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    pub fn is_closing_delimiter(self) -> bool {
        matches!(
            self,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.len();
        Self {
            kind,
            text,
            span: Span::new(start, end),
        }
    }
}

/// Tokens of one file, ordered by position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens starting at or after `offset`
    pub fn tokens_from(&self, offset: usize) -> &[Token] {
        let index = self.tokens.partition_point(|token| token.span.start < offset);
        &self.tokens[index..]
    }

    /// Coarse lexer for PHP-like source
    ///
    /// Only distinguishes what separator analysis needs: delimiters, commas,
    /// trivia, and opaque runs of everything else. String literals and comments
    /// are kept whole so commas inside them are never mistaken for separators.
    pub fn scan(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let start = pos;
            let c = bytes[pos];
            let kind = match c {
                b',' => single(&mut pos, TokenKind::Comma),
                b';' => single(&mut pos, TokenKind::Semicolon),
                b'(' => single(&mut pos, TokenKind::OpenParen),
                b')' => single(&mut pos, TokenKind::CloseParen),
                b'[' => single(&mut pos, TokenKind::OpenBracket),
                b']' => single(&mut pos, TokenKind::CloseBracket),
                b'{' => single(&mut pos, TokenKind::OpenBrace),
                b'}' => single(&mut pos, TokenKind::CloseBrace),
                c if c.is_ascii_whitespace() => {
                    pos = skip_while(bytes, pos, |b| b.is_ascii_whitespace());
                    TokenKind::Whitespace
                }
                b'#' => {
                    pos = skip_while(bytes, pos, |b| b != b'\n');
                    TokenKind::Comment
                }
                b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                    pos = skip_while(bytes, pos, |b| b != b'\n');
                    TokenKind::Comment
                }
                b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                    let doc = bytes.get(pos + 2) == Some(&b'*');
                    pos = source[pos + 2..]
                        .find("*/")
                        .map_or(bytes.len(), |end| pos + 2 + end + 2);
                    if doc {
                        TokenKind::DocComment
                    } else {
                        TokenKind::Comment
                    }
                }
                b'\'' | b'"' => {
                    pos = skip_string(bytes, pos);
                    TokenKind::Literal
                }
                b'$' => {
                    pos = skip_while(bytes, pos + 1, is_word_byte);
                    TokenKind::Variable
                }
                c if c.is_ascii_digit() => {
                    pos = skip_while(bytes, pos, is_word_byte);
                    TokenKind::Literal
                }
                c if is_word_byte(c) || c == b'\\' => {
                    pos = skip_while(bytes, pos, |b| is_word_byte(b) || b == b'\\');
                    TokenKind::Identifier
                }
                _ => {
                    // Advance by one whole character so slicing stays on char boundaries
                    pos += source[pos..].chars().next().map_or(1, char::len_utf8);
                    TokenKind::Operator
                }
            };
            tokens.push(Token::new(kind, &source[start..pos], start));
        }

        Self { tokens }
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn skip_while(bytes: &[u8], mut pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    while pos < bytes.len() && pred(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}
