pub(crate) mod datetime;
mod ddl;
mod dml;
mod func;
mod select;
mod term;
mod types;
mod with;

use partiql_ast::{Expr, Sexp, Statement};
use partiql_core::{operator, Keyword, TokenKind};
use partiql_lexer::Lexer;
use tokio_util::sync::CancellationToken;

use crate::build;
use crate::error::{ErrorCode, ParserError};
use crate::node::{NodeKind, ParseNode};
use crate::view::Tokens;

pub(crate) type PResult<'a> = Result<ParseNode<'a>, ParserError>;

/// The path-term parsing modes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PathMode {
    /// Anywhere: all component forms are allowed.
    Full,
    /// RETURNING element paths: no wildcards, no unpivot.
    Query,
    /// DML lvalues and index keys: no wildcards, bracket components must be
    /// literals.
    Simple,
}

/// PartiQL parser.
///
/// The parser is synchronous and pure; the only piece of shared state is the
/// cooperative cancellation token, checked at each entry to the expression
/// parser.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    cancellation: CancellationToken,
}

impl Parser {
    /// Creates a parser that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that aborts with an `interrupted` error once the
    /// given token is cancelled.
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// Parses a single statement into the expression AST.
    ///
    /// Trailing tokens are rejected; tokens after a terminating semicolon
    /// raise a distinct error code.
    pub fn parse_expr_node(&self, source: &str) -> Result<Expr, ParserError> {
        let tokens = Lexer::new(source).tokenize()?;
        let view = Tokens::new(&tokens);
        let node = self.parse_expression(view, operator::TOP_LEVEL)?;

        let rest = node.remaining;
        if !rest.only_end_of_statement() {
            return if matches!(rest.kind(), TokenKind::Semicolon) {
                rest.tail().err(ErrorCode::UnexpectedTokenAfterSemicolon)
            } else {
                rest.err(ErrorCode::UnexpectedToken)
            };
        }
        build::validate_top_level(&node)?;
        build::build_expr(&node)
    }

    /// Parses a single statement into the public [`Statement`] enum.
    pub fn parse_ast_statement(&self, source: &str) -> Result<Statement, ParserError> {
        self.parse_expr_node(source).map(Statement::from)
    }

    /// Parses a single statement and serializes it to the canonical V0
    /// s-expression form.
    pub fn parse(&self, source: &str) -> Result<Sexp, ParserError> {
        self.parse_expr_node(source).map(|expr| expr.to_sexp())
    }

    fn check_interrupted(&self, tokens: &Tokens<'_>) -> Result<(), ParserError> {
        if self.cancellation.is_cancelled() {
            tokens.err(ErrorCode::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Parses tokens while the next infix operator binds tighter than
    /// `min_precedence` (left-associative precedence climbing).
    pub(crate) fn parse_expression<'a>(
        &self,
        tokens: Tokens<'a>,
        min_precedence: i32,
    ) -> PResult<'a> {
        self.check_interrupted(&tokens)?;
        let mut expr = self.parse_unary_term(tokens)?;
        loop {
            let rest = expr.remaining;
            if !rest.is_binary_operator() {
                break;
            }
            let precedence = match rest.infix_precedence() {
                Some(precedence) if precedence > min_precedence => precedence,
                _ => break,
            };
            expr = self.parse_infix(expr, rest, precedence)?;
        }
        Ok(expr)
    }

    /// Like [`Self::parse_expression`], but only the query-level set
    /// operators are accepted as infix. Used for `WITH` bodies.
    pub(crate) fn parse_query_expression<'a>(
        &self,
        tokens: Tokens<'a>,
        min_precedence: i32,
    ) -> PResult<'a> {
        self.check_interrupted(&tokens)?;
        let mut expr = self.parse_unary_term(tokens)?;
        loop {
            let rest = expr.remaining;
            if !rest.is_query_operator() {
                break;
            }
            let precedence = match rest.infix_precedence() {
                Some(precedence) if precedence > min_precedence => precedence,
                _ => break,
            };
            let op = rest.head().clone();
            let right = self.parse_query_expression(rest.tail(), precedence)?;
            let remaining = right.remaining;
            expr = ParseNode::new(NodeKind::Binary, Some(op), vec![expr, right], remaining);
        }
        Ok(expr)
    }

    /// Parses one infix operator application; `tokens` sits on the operator.
    fn parse_infix<'a>(
        &self,
        left: ParseNode<'a>,
        tokens: Tokens<'a>,
        precedence: i32,
    ) -> PResult<'a> {
        let op = tokens.head().clone();
        let rest = tokens.tail();
        match tokens.keyword() {
            // The RHS of IS is a type, not an expression.
            Some(Keyword::Is) | Some(Keyword::IsNot) => {
                let data_type = self.parse_type(rest)?;
                let remaining = data_type.remaining;
                Ok(ParseNode::new(
                    NodeKind::Binary,
                    Some(op),
                    vec![left, data_type],
                    remaining,
                ))
            }
            // `x IN (a, b, c)` takes a parenthesized list, unless the list
            // is a sub-query (or VALUES), which falls through to the
            // ordinary expression parse.
            Some(Keyword::In) | Some(Keyword::NotIn)
                if matches!(rest.kind(), TokenKind::LeftParen)
                    && !matches!(
                        rest.peek(1).keyword(),
                        Some(Keyword::Select) | Some(Keyword::Values)
                    ) =>
            {
                let items = self.parse_paren_list(rest)?;
                let remaining = items.remaining;
                Ok(ParseNode::new(
                    NodeKind::Binary,
                    Some(op),
                    vec![left, items],
                    remaining,
                ))
            }
            Some(Keyword::Between) | Some(Keyword::NotBetween) => {
                let low = self.parse_expression(rest, precedence)?;
                let rest = low.remaining.expect_keyword(Keyword::And)?;
                let high = self.parse_expression(rest, precedence)?;
                let remaining = high.remaining;
                Ok(ParseNode::new(
                    NodeKind::Ternary,
                    Some(op),
                    vec![left, low, high],
                    remaining,
                ))
            }
            Some(Keyword::Like) | Some(Keyword::NotLike) => {
                let pattern = self.parse_expression(rest, precedence)?;
                match pattern.remaining.eat_keyword(Keyword::Escape) {
                    Some(rest) => {
                        let escape = self.parse_expression(rest, precedence)?;
                        let remaining = escape.remaining;
                        Ok(ParseNode::new(
                            NodeKind::Ternary,
                            Some(op),
                            vec![left, pattern, escape],
                            remaining,
                        ))
                    }
                    None => {
                        let remaining = pattern.remaining;
                        Ok(ParseNode::new(
                            NodeKind::Binary,
                            Some(op),
                            vec![left, pattern],
                            remaining,
                        ))
                    }
                }
            }
            _ => {
                let right = self.parse_expression(rest, precedence)?;
                let remaining = right.remaining;
                Ok(ParseNode::new(
                    NodeKind::Binary,
                    Some(op),
                    vec![left, right],
                    remaining,
                ))
            }
        }
    }

    /// Parses a unary term: prefix operators with numeric-literal folding,
    /// then path terms.
    fn parse_unary_term<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        if !tokens.is_unary_operator() {
            return self.parse_path_term(tokens, PathMode::Full);
        }
        match tokens.kind() {
            TokenKind::Operator(partiql_core::Operator::Plus) => {
                let term = self.parse_unary_term(tokens.tail())?;
                if is_numeric_atom(&term) {
                    // fold `+<literal>` to the literal itself
                    return Ok(term);
                }
                let remaining = term.remaining;
                Ok(ParseNode::new(
                    NodeKind::Unary,
                    Some(tokens.head().clone()),
                    vec![term],
                    remaining,
                ))
            }
            TokenKind::Operator(partiql_core::Operator::Minus) => {
                let term = self.parse_unary_term(tokens.tail())?;
                if let Some(folded) = negate_numeric_atom(&term) {
                    return Ok(folded);
                }
                let remaining = term.remaining;
                Ok(ParseNode::new(
                    NodeKind::Unary,
                    Some(tokens.head().clone()),
                    vec![term],
                    remaining,
                ))
            }
            TokenKind::Keyword(Keyword::Not) => {
                let operand =
                    self.parse_expression(tokens.tail(), operator::NOT_PRECEDENCE)?;
                let remaining = operand.remaining;
                Ok(ParseNode::new(
                    NodeKind::Unary,
                    Some(tokens.head().clone()),
                    vec![operand],
                    remaining,
                ))
            }
            // `@`: validated against its operand by the term parser
            _ => self.parse_path_term(tokens, PathMode::Full),
        }
    }

    /// Parses a parenthesized, comma-separated expression list into a LIST
    /// node; `tokens` sits on the `(`. At least one element is required.
    pub(crate) fn parse_paren_list<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let rest = expect_left_paren(tokens)?;
        if matches!(rest.kind(), TokenKind::RightParen) {
            return rest.err(ErrorCode::ExpectedExpression);
        }
        let (children, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            parser.parse_expression(tokens, operator::TOP_LEVEL)
        })?;
        let remaining = expect_right_paren(rest)?;
        Ok(ParseNode::new(
            NodeKind::List,
            Some(tokens.head().clone()),
            children,
            remaining,
        ))
    }

    /// Parses a comma-separated list of 1+ items accepted by `f`.
    pub(crate) fn parse_comma_separated<'a, F>(
        &self,
        mut tokens: Tokens<'a>,
        mut f: F,
    ) -> Result<(Vec<ParseNode<'a>>, Tokens<'a>), ParserError>
    where
        F: FnMut(&Self, Tokens<'a>) -> PResult<'a>,
    {
        let mut items = vec![];
        loop {
            let item = f(self, tokens)?;
            tokens = item.remaining;
            items.push(item);
            if matches!(tokens.kind(), TokenKind::Comma) {
                tokens = tokens.tail();
            } else {
                break;
            }
        }
        Ok((items, tokens))
    }
}

/// Consumes a `)`, failing with the dedicated error code.
pub(crate) fn expect_right_paren(tokens: Tokens<'_>) -> Result<Tokens<'_>, ParserError> {
    if matches!(tokens.kind(), TokenKind::RightParen) {
        Ok(tokens.tail())
    } else {
        tokens.err(ErrorCode::ExpectedRightParen)
    }
}

/// Consumes a `(`, failing with the dedicated error code.
pub(crate) fn expect_left_paren(tokens: Tokens<'_>) -> Result<Tokens<'_>, ParserError> {
    if matches!(tokens.kind(), TokenKind::LeftParen) {
        Ok(tokens.tail())
    } else {
        tokens.err(ErrorCode::ExpectedLeftParen)
    }
}

fn is_numeric_atom(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && node
            .token
            .as_ref()
            .and_then(|token| token.value())
            .map(|value| value.is_number())
            .unwrap_or(false)
}

/// Folds `-<numeric literal>` into a negated literal atom, keeping the
/// literal's span.
fn negate_numeric_atom<'a>(node: &ParseNode<'a>) -> Option<ParseNode<'a>> {
    if node.kind != NodeKind::Atom {
        return None;
    }
    let token = node.token.as_ref()?;
    let negated = token.value()?.negate()?;
    Some(ParseNode::atom(
        NodeKind::Atom,
        partiql_core::Token::new(TokenKind::Literal(negated), token.span),
        node.remaining,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remaining_never_grows(node: &ParseNode<'_>, limit: usize) {
        assert!(node.remaining.len() <= limit, "remaining grew past its input");
        for child in &node.children {
            // children are produced left-to-right, before the node finishes
            assert!(child.remaining.len() >= node.remaining.len());
            remaining_never_grows(child, limit);
        }
    }

    #[test]
    fn parse_nodes_carry_token_suffixes() {
        for source in [
            "a + b * c - d",
            "SELECT a, b.c FROM t, u WHERE a BETWEEN 1 AND 2",
            "UPDATE foo SET a = 1 REMOVE b WHERE c RETURNING ALL NEW *",
        ] {
            let tokens = partiql_lexer::Lexer::new(source).tokenize().unwrap();
            let view = Tokens::new(&tokens);
            let parser = Parser::new();
            let node = parser
                .parse_expression(view, operator::TOP_LEVEL)
                .unwrap_or_else(|err| panic!("parse failed for {:?}: {}", source, err));
            assert!(node.remaining.only_end_of_statement());
            remaining_never_grows(&node, view.len());
        }
    }
}
