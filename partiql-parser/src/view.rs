use partiql_core::{operator, Keyword, Position, Token, TokenKind};

use crate::error::{ErrorCode, ParserError};

/// A purely functional cursor over the lexed token slice.
///
/// Advancing never mutates: [`Tokens::tail`] returns a new view. The slice is
/// EOF-terminated, so `head` is always defined and `tail` saturates at the
/// EOF token.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Tokens<'a> {
    slice: &'a [Token],
    offset: usize,
}

impl<'a> Tokens<'a> {
    /// Creates a view over an EOF-terminated token slice.
    pub(crate) fn new(slice: &'a [Token]) -> Self {
        debug_assert!(matches!(
            slice.last().map(|token| &token.kind),
            Some(TokenKind::Eof)
        ));
        Self { slice, offset: 0 }
    }

    /// The head token.
    pub(crate) fn head(&self) -> &'a Token {
        &self.slice[self.offset.min(self.slice.len() - 1)]
    }

    /// The head token kind.
    pub(crate) fn kind(&self) -> &'a TokenKind {
        &self.head().kind
    }

    /// The view after the head token.
    pub(crate) fn tail(self) -> Self {
        Self {
            slice: self.slice,
            offset: (self.offset + 1).min(self.slice.len() - 1),
        }
    }

    /// The token `n` positions after the head.
    pub(crate) fn peek(&self, n: usize) -> &'a Token {
        &self.slice[(self.offset + n).min(self.slice.len() - 1)]
    }

    /// The keyword of the head token, if it is one.
    pub(crate) fn keyword(&self) -> Option<Keyword> {
        self.head().keyword()
    }

    /// The position of the head token.
    pub(crate) fn position(&self) -> Position {
        self.head().position()
    }

    /// The number of tokens left, including the EOF token.
    pub(crate) fn len(&self) -> usize {
        self.slice.len() - self.offset.min(self.slice.len())
    }

    /// True iff only semicolons remain before EOF.
    pub(crate) fn only_end_of_statement(&self) -> bool {
        self.slice[self.offset..]
            .iter()
            .all(|token| matches!(token.kind, TokenKind::Semicolon | TokenKind::Eof))
    }

    /// Raises `code` at the head token, attaching the token text.
    pub(crate) fn err<T>(&self, code: ErrorCode) -> Result<T, ParserError> {
        Err(self.error(code))
    }

    /// Builds an error located at the head token.
    pub(crate) fn error(&self, code: ErrorCode) -> ParserError {
        ParserError::at(code, self.position()).with("actual", self.head().to_string())
    }

    /// Consumes the head if it is the given dataless kind, failing with
    /// `expected token` otherwise.
    pub(crate) fn expect(self, kind: &TokenKind) -> Result<Self, ParserError> {
        if self.kind() == kind {
            Ok(self.tail())
        } else {
            Err(self
                .error(ErrorCode::ExpectedTokenType)
                .with("expected", kind.to_string()))
        }
    }

    /// Consumes the head if it is the given keyword, failing with
    /// `expected keyword` otherwise.
    pub(crate) fn expect_keyword(self, keyword: Keyword) -> Result<Self, ParserError> {
        if self.keyword() == Some(keyword) {
            Ok(self.tail())
        } else {
            Err(self
                .error(ErrorCode::ExpectedKeyword)
                .with("keyword", keyword.as_str()))
        }
    }

    /// Consumes the head if it is the given keyword.
    pub(crate) fn eat_keyword(self, keyword: Keyword) -> Option<Self> {
        if self.keyword() == Some(keyword) {
            Some(self.tail())
        } else {
            None
        }
    }

    /// Consumes an identifier head, returning its token.
    pub(crate) fn expect_identifier(self) -> Result<(&'a Token, Self), ParserError> {
        match self.kind() {
            TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => Ok((self.head(), self.tail())),
            _ => Err(self
                .error(ErrorCode::ExpectedTokenType)
                .with("expected", "identifier")),
        }
    }

    /// True if the head token can start a unary expression.
    pub(crate) fn is_unary_operator(&self) -> bool {
        operator::is_unary_operator(self.kind())
    }

    /// True if the head token is a recognized infix operator.
    pub(crate) fn is_binary_operator(&self) -> bool {
        operator::is_binary_operator(self.kind())
    }

    /// True if the head token is a query-level set operator.
    pub(crate) fn is_query_operator(&self) -> bool {
        operator::is_query_operator(self.kind())
    }

    /// Infix binding power of the head token.
    pub(crate) fn infix_precedence(&self) -> Option<i32> {
        operator::infix_precedence(self.kind())
    }

    /// Prefix binding power of the head token.
    pub(crate) fn prefix_precedence(&self) -> Option<i32> {
        operator::prefix_precedence(self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partiql_lexer::Lexer;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn head_and_tail() {
        let tokens = lex("a b");
        let view = Tokens::new(&tokens);
        assert_eq!(view.kind(), &TokenKind::Ident("a".into()));
        assert_eq!(view.tail().kind(), &TokenKind::Ident("b".into()));
        assert_eq!(view.tail().tail().kind(), &TokenKind::Eof);
        // the view saturates at EOF
        assert_eq!(view.tail().tail().tail().kind(), &TokenKind::Eof);
    }

    #[test]
    fn only_end_of_statement() {
        let tokens = lex("a ;;");
        let view = Tokens::new(&tokens);
        assert!(!view.only_end_of_statement());
        assert!(view.tail().only_end_of_statement());
    }

    #[test]
    fn precedence_queries() {
        let tokens = lex("not a");
        let view = Tokens::new(&tokens);
        assert!(view.is_unary_operator());
        assert_eq!(view.prefix_precedence(), Some(operator::NOT_PRECEDENCE));
        assert!(!view.tail().is_binary_operator());
        assert_eq!(view.tail().infix_precedence(), None);
    }

    #[test]
    fn expect_keyword_reports_context() {
        let tokens = lex("select");
        let view = Tokens::new(&tokens);
        let err = view.expect_keyword(Keyword::From).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExpectedKeyword);
        assert_eq!(err.context.get("keyword").map(String::as_str), Some("from"));
        assert_eq!(err.position, Some(Position::new(1, 1)));
    }
}
