/*!
# Trailing Separator Detection

Answers whether a list element is followed by a dangling comma, which the AST
itself does not record.
*/

use crate::ast::Span;

use super::{TokenKind, TokenStream};

/// Check whether the node at `span` is followed by a trailing comma
///
/// True only for the pattern `<node> , <closing delimiter>` with any amount of
/// whitespace or comments in between. An ordinary separator that precedes
/// another element yields false. Missing tokens or a synthesized node without
/// a span yield false as well: no signal means no rewrite.
pub fn is_followed_by_separator(tokens: Option<&TokenStream>, span: Option<Span>) -> bool {
    let (Some(tokens), Some(span)) = (tokens, span) else {
        return false;
    };

    let mut significant = tokens
        .tokens_from(span.end)
        .iter()
        .filter(|token| !token.kind.is_trivia());

    match significant.next() {
        Some(token) if token.kind == TokenKind::Comma => {}
        _ => return false,
    }

    significant
        .next()
        .is_some_and(|token| token.kind.is_closing_delimiter())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Span of the `n`th occurrence of `needle` in `source`
    fn span_of(source: &str, needle: &str, n: usize) -> Option<Span> {
        source
            .match_indices(needle)
            .nth(n)
            .map(|(start, text)| Span::new(start, start + text.len()))
    }

    #[test]
    fn test_trailing_comma_before_paren() {
        let source = "f($a, $b,)";
        let tokens = TokenStream::scan(source);
        assert!(is_followed_by_separator(Some(&tokens), span_of(source, "$b", 0)));
    }

    #[test]
    fn test_inner_separator_is_not_trailing() {
        let source = "f($a, $b,)";
        let tokens = TokenStream::scan(source);
        assert!(!is_followed_by_separator(Some(&tokens), span_of(source, "$a", 0)));
    }

    #[test]
    fn test_no_separator() {
        let source = "f($a, $b, $c)";
        let tokens = TokenStream::scan(source);
        assert!(!is_followed_by_separator(Some(&tokens), span_of(source, "$c", 0)));
    }

    #[test]
    fn test_trivia_is_skipped() {
        let source = "function () use (\n    $a // first\n    , /* done */\n) {}";
        let tokens = TokenStream::scan(source);
        assert!(is_followed_by_separator(Some(&tokens), span_of(source, "$a", 0)));
    }

    #[test]
    fn test_single_element_list() {
        let source = "new Foo($only,)";
        let tokens = TokenStream::scan(source);
        assert!(is_followed_by_separator(Some(&tokens), span_of(source, "$only", 0)));
    }

    #[test]
    fn test_other_closers() {
        let source = "[$a, $b,]";
        let tokens = TokenStream::scan(source);
        assert!(is_followed_by_separator(Some(&tokens), span_of(source, "$b", 0)));
    }

    #[test]
    fn test_missing_context_is_no_signal() {
        let source = "f($a,)";
        let tokens = TokenStream::scan(source);
        assert!(!is_followed_by_separator(None, span_of(source, "$a", 0)));
        assert!(!is_followed_by_separator(Some(&tokens), None));
        assert!(!is_followed_by_separator(Some(&TokenStream::default()), span_of(source, "$a", 0)));
    }

    #[test]
    fn test_comma_at_end_of_input() {
        let source = "$a,";
        let tokens = TokenStream::scan(source);
        assert!(!is_followed_by_separator(Some(&tokens), span_of(source, "$a", 0)));
    }
}
