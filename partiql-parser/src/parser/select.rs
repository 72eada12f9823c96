//! `SELECT`/`PIVOT` parsing and the FROM-source join tree.
//!
//! ```txt
//! <select> ::= SELECT [DISTINCT | ALL] (VALUE <expr> | <select list> | *)
//!              [FROM <from source list>]
//!              [LET <binding list>] [WHERE <expr>]
//!              [GROUP [PARTIAL] BY <item list> [GROUP AS <name>]]
//!              [HAVING <expr>] [ORDER BY <sort specs>] [LIMIT <expr>]
//!
//! <from source> ::= <expr> | UNPIVOT <expr> | ( <from source list> )
//! ```
//!
//! The optional trailing clauses are each accepted at most once, in any
//! relative order.

use partiql_core::{operator, Keyword, TokenKind};

use crate::error::{ErrorCode, ParserError};
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_right_paren, Parser, PResult};
use crate::view::Tokens;

impl Parser {
    /// Parses a `SELECT` query; `tokens` sits on the keyword.
    pub(crate) fn parse_select<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let select_token = tokens.head().clone();
        let mut rest = tokens.tail();

        let mut distinct = false;
        if let Some(after) = rest.eat_keyword(Keyword::Distinct) {
            distinct = true;
            rest = after;
        } else if let Some(after) = rest.eat_keyword(Keyword::All) {
            rest = after;
        }

        let (kind, projection) = match rest.eat_keyword(Keyword::Value) {
            Some(after) => {
                let expr = self.parse_expression(after, operator::TOP_LEVEL)?;
                (NodeKind::SelectValue, expr)
            }
            None => {
                // an empty projection list would otherwise dispatch into
                // the FROM-prefixed DML parser
                if rest.keyword() == Some(Keyword::From) {
                    return rest.err(ErrorCode::ExpectedExpression);
                }
                (NodeKind::SelectList, self.parse_select_list(rest)?)
            }
        };
        let projection = if distinct {
            let remaining = projection.remaining;
            ParseNode::new(NodeKind::Distinct, None, vec![projection], remaining)
        } else {
            projection
        };
        self.parse_select_after_projection(kind, select_token, projection)
    }

    /// Parses `PIVOT <value> AT <name> FROM ...`.
    pub(crate) fn parse_pivot<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let pivot_token = tokens.head().clone();
        let value = self.parse_expression(tokens.tail(), operator::TOP_LEVEL)?;
        let rest = value.remaining.expect(&TokenKind::At)?;
        let name = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let remaining = name.remaining;
        let member = ParseNode::new(NodeKind::Member, None, vec![name, value], remaining);
        self.parse_select_after_projection(NodeKind::Pivot, pivot_token, member)
    }

    /// Parses the projection list into an ARG_LIST node, enforcing the
    /// select-list star rules.
    fn parse_select_list<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let (items, rest) = self.parse_comma_separated(tokens, |parser, tokens| {
            parser.parse_select_list_item(tokens)
        })?;
        if items.len() > 1 {
            if let Some(star) = items
                .iter()
                .find(|item| item.kind == NodeKind::ProjectAll && item.children.is_empty())
            {
                return Err(star
                    .position()
                    .map(|position| {
                        ParserError::at(ErrorCode::AsteriskIsNotAloneInSelectList, position)
                    })
                    .unwrap_or_else(|| {
                        ParserError::new(ErrorCode::AsteriskIsNotAloneInSelectList)
                    }));
            }
        }
        Ok(ParseNode::new(NodeKind::ArgList, None, items, rest))
    }

    fn parse_select_list_item<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        if matches!(tokens.kind(), TokenKind::Star) {
            return Ok(ParseNode::atom(
                NodeKind::ProjectAll,
                tokens.head().clone(),
                tokens.tail(),
            ));
        }
        let expr = self.parse_expression(tokens, operator::TOP_LEVEL)?;
        if let Some(demoted) = demote_project_all(&expr, tokens)? {
            return Ok(demoted);
        }
        self.parse_optional_item_alias(expr)
    }

    /// Wraps an expression in AS_ALIAS when an explicit `AS <name>` (or a
    /// bare identifier alias) follows.
    fn parse_optional_item_alias<'a>(&self, expr: ParseNode<'a>) -> PResult<'a> {
        let rest = expr.remaining;
        let name = match rest.kind() {
            TokenKind::As => {
                let after = rest.tail();
                match after.kind() {
                    TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => after,
                    _ => return after.err(ErrorCode::ExpectedIdentifierForAlias),
                }
            }
            TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => rest,
            _ => return Ok(expr),
        };
        let remaining = name.tail();
        Ok(ParseNode::new(
            NodeKind::AsAlias,
            Some(name.head().clone()),
            vec![expr],
            remaining,
        ))
    }

    fn parse_select_after_projection<'a>(
        &self,
        kind: NodeKind,
        select_token: partiql_core::Token,
        projection: ParseNode<'a>,
    ) -> PResult<'a> {
        let mut rest = projection.remaining;
        let mut children = vec![projection];
        if let Some(after) = rest.eat_keyword(Keyword::From) {
            let sources = self.parse_from_source_list(after)?;
            rest = sources.remaining;
            children.push(ParseNode::new(
                NodeKind::FromClause,
                None,
                vec![sources],
                rest,
            ));
        }

        let mut seen_let = false;
        let mut seen_where = false;
        let mut seen_order = false;
        let mut seen_group = false;
        let mut seen_having = false;
        let mut seen_limit = false;
        loop {
            let clause = match rest.keyword() {
                Some(Keyword::Let) if !seen_let => {
                    seen_let = true;
                    self.parse_let_clause(rest)?
                }
                Some(Keyword::Where) if !seen_where => {
                    seen_where = true;
                    let expr = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    let remaining = expr.remaining;
                    ParseNode::new(
                        NodeKind::Where,
                        Some(rest.head().clone()),
                        vec![expr],
                        remaining,
                    )
                }
                Some(Keyword::Order) if !seen_order => {
                    seen_order = true;
                    self.parse_order_by_clause(rest)?
                }
                // GROUP AS belongs to a GROUP BY clause, so a GROUP head
                // here always starts one
                Some(Keyword::Group) if !seen_group => {
                    seen_group = true;
                    self.parse_group_clause(rest)?
                }
                Some(Keyword::Having) if !seen_having => {
                    seen_having = true;
                    let expr = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    let remaining = expr.remaining;
                    ParseNode::new(
                        NodeKind::Having,
                        Some(rest.head().clone()),
                        vec![expr],
                        remaining,
                    )
                }
                Some(Keyword::Limit) if !seen_limit => {
                    seen_limit = true;
                    let expr = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    let remaining = expr.remaining;
                    ParseNode::new(
                        NodeKind::Limit,
                        Some(rest.head().clone()),
                        vec![expr],
                        remaining,
                    )
                }
                _ => break,
            };
            rest = clause.remaining;
            children.push(clause);
        }

        Ok(ParseNode::new(kind, Some(select_token), children, rest))
    }

    /// Parses `LET <expr> AS <name> (, ...)*`.
    fn parse_let_clause<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let let_token = tokens.head().clone();
        let (bindings, rest) = self.parse_comma_separated(tokens.tail(), |parser, tokens| {
            let expr = parser.parse_expression(tokens, operator::TOP_LEVEL)?;
            let after = expr.remaining;
            if !matches!(after.kind(), TokenKind::As) {
                return after.err(ErrorCode::ExpectedAs);
            }
            let (name, remaining) = after.tail().expect_identifier()?;
            Ok(ParseNode::new(
                NodeKind::AsAlias,
                Some(name.clone()),
                vec![expr],
                remaining,
            ))
        })?;
        Ok(ParseNode::new(
            NodeKind::Let,
            Some(let_token),
            bindings,
            rest,
        ))
    }

    /// Parses `ORDER BY <expr> [ASC|DESC] (, ...)*`.
    fn parse_order_by_clause<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let order_token = tokens.head().clone();
        let rest = tokens.tail().expect(&TokenKind::By)?;
        let (specs, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            let expr = parser.parse_expression(tokens, operator::TOP_LEVEL)?;
            let after = expr.remaining;
            let mut children = vec![expr];
            let remaining = match after.kind() {
                TokenKind::Asc | TokenKind::Desc => {
                    children.push(ParseNode::atom(
                        NodeKind::OrderingSpec,
                        after.head().clone(),
                        after.tail(),
                    ));
                    after.tail()
                }
                _ => after,
            };
            Ok(ParseNode::new(
                NodeKind::SortSpec,
                None,
                children,
                remaining,
            ))
        })?;
        Ok(ParseNode::new(
            NodeKind::OrderBy,
            Some(order_token),
            specs,
            rest,
        ))
    }

    /// Parses `GROUP [PARTIAL] BY <item list> [GROUP AS <name>]`. Literals
    /// (including ordinals) are rejected as grouping items.
    fn parse_group_clause<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let group_token = tokens.head().clone();
        let mut rest = tokens.tail();
        let kind = match rest.eat_keyword(Keyword::Partial) {
            Some(after) => {
                rest = after;
                NodeKind::GroupPartial
            }
            None => NodeKind::Group,
        };
        let rest = rest.expect(&TokenKind::By)?;

        let (items, mut rest) = self.parse_comma_separated(rest, |parser, tokens| {
            let expr = parser.parse_expression(tokens, operator::TOP_LEVEL)?;
            if is_literal_item(&expr) {
                return tokens.err(ErrorCode::UnsupportedLiteralsGroupBy);
            }
            let after = expr.remaining;
            if matches!(after.kind(), TokenKind::As) {
                let (name, remaining) = after.tail().expect_identifier()?;
                return Ok(ParseNode::new(
                    NodeKind::AsAlias,
                    Some(name.clone()),
                    vec![expr],
                    remaining,
                ));
            }
            Ok(expr)
        })?;

        let mut children = vec![ParseNode::new(NodeKind::ArgList, None, items, rest)];
        if rest.keyword() == Some(Keyword::Group) && matches!(rest.peek(1).kind, TokenKind::As) {
            let (name, after) = rest.tail().tail().expect_identifier()?;
            children.push(ParseNode::new(
                NodeKind::AsAlias,
                Some(name.clone()),
                vec![],
                after,
            ));
            rest = after;
        }
        Ok(ParseNode::new(kind, Some(group_token), children, rest))
    }

    /// Parses a left-associative tree of FROM sources; commas form implicit
    /// inner cross joins.
    pub(crate) fn parse_from_source_list<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let mut left = self.parse_from_source(tokens)?;
        loop {
            let rest = left.remaining;
            match rest.kind() {
                TokenKind::Comma => {
                    let right = self.parse_from_source(rest.tail())?;
                    let remaining = right.remaining;
                    // no token marks the implicit join
                    left = ParseNode::new(
                        NodeKind::InnerJoin,
                        None,
                        vec![left, right],
                        remaining,
                    );
                }
                TokenKind::Keyword(keyword) if keyword.is_join() => {
                    let join_token = rest.head().clone();
                    let right = self.parse_from_source(rest.tail())?;
                    let kind = join_node_kind(*keyword);
                    let (children, remaining) = if keyword.is_cross_join() {
                        let remaining = right.remaining;
                        (vec![left, right], remaining)
                    } else {
                        let after = right.remaining.expect_keyword(Keyword::On)?;
                        let condition = self.parse_expression(after, operator::TOP_LEVEL)?;
                        let remaining = condition.remaining;
                        (vec![left, right, condition], remaining)
                    };
                    left = ParseNode::new(kind, Some(join_token), children, remaining);
                }
                TokenKind::Keyword(
                    Keyword::Left
                    | Keyword::Right
                    | Keyword::Inner
                    | Keyword::Outer
                    | Keyword::Cross,
                ) => return rest.err(ErrorCode::MalformedJoin),
                _ => break,
            }
        }
        Ok(left)
    }

    /// Parses one FROM source with its optional aliases.
    fn parse_from_source<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        match tokens.kind() {
            TokenKind::Keyword(Keyword::Unpivot) => {
                let expr = self.parse_expression(tokens.tail(), operator::TOP_LEVEL)?;
                let remaining = expr.remaining;
                let node = ParseNode::new(
                    NodeKind::Unpivot,
                    Some(tokens.head().clone()),
                    vec![expr],
                    remaining,
                );
                self.parse_source_aliases(node)
            }
            // a parenthesized sub-source, unless the parenthesis opens a
            // sub-query or a row literal
            TokenKind::LeftParen
                if !matches!(
                    tokens.peek(1).keyword(),
                    Some(Keyword::Select) | Some(Keyword::Values)
                ) && !matches!(tokens.peek(1).kind, TokenKind::Literal(_)) =>
            {
                let tree = self.parse_from_source_list(tokens.tail())?;
                let remaining = expect_right_paren(tree.remaining)?;
                Ok(ParseNode::new(
                    NodeKind::FromSourceJoin,
                    Some(tokens.head().clone()),
                    vec![tree],
                    remaining,
                ))
            }
            _ => {
                let expr = self.parse_expression(tokens, operator::TOP_LEVEL)?;
                self.parse_source_aliases(expr)
            }
        }
    }

    /// Wraps a source in its `AS`/`AT`/`BY` alias nodes, in that order. The
    /// `AS` keyword is optional; `AT` and `BY` require theirs.
    pub(crate) fn parse_source_aliases<'a>(&self, node: ParseNode<'a>) -> PResult<'a> {
        let mut node = node;
        let rest = node.remaining;
        match rest.kind() {
            TokenKind::As => {
                let after = rest.tail();
                match after.kind() {
                    TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => {
                        node = ParseNode::new(
                            NodeKind::AsAlias,
                            Some(after.head().clone()),
                            vec![node],
                            after.tail(),
                        );
                    }
                    _ => return after.err(ErrorCode::ExpectedIdentifierForAlias),
                }
            }
            TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => {
                node = ParseNode::new(
                    NodeKind::AsAlias,
                    Some(rest.head().clone()),
                    vec![node],
                    rest.tail(),
                );
            }
            _ => {}
        }
        if matches!(node.remaining.kind(), TokenKind::At) {
            let (name, remaining) = node.remaining.tail().expect_identifier()?;
            node = ParseNode::new(NodeKind::AtAlias, Some(name.clone()), vec![node], remaining);
        }
        if matches!(node.remaining.kind(), TokenKind::By) {
            let (name, remaining) = node.remaining.tail().expect_identifier()?;
            node = ParseNode::new(NodeKind::ByAlias, Some(name.clone()), vec![node], remaining);
        }
        Ok(node)
    }
}

fn join_node_kind(keyword: Keyword) -> NodeKind {
    match keyword {
        Keyword::Join | Keyword::InnerJoin | Keyword::CrossJoin => NodeKind::InnerJoin,
        Keyword::LeftJoin | Keyword::LeftCrossJoin => NodeKind::LeftJoin,
        Keyword::RightJoin | Keyword::RightCrossJoin => NodeKind::RightJoin,
        Keyword::OuterJoin | Keyword::OuterCrossJoin => NodeKind::OuterJoin,
        _ => unreachable!("checked by Keyword::is_join"),
    }
}

fn is_literal_item(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && matches!(
            node.token.as_ref().map(|token| &token.kind),
            Some(TokenKind::Literal(_))
                | Some(TokenKind::IonLiteral(_))
                | Some(TokenKind::Null)
                | Some(TokenKind::Missing)
        )
}

/// Rewrites a select-list path ending in `.*` into PROJECT_ALL, rejecting
/// `[*]` components and non-trailing `.*` along the way.
fn demote_project_all<'a>(
    expr: &ParseNode<'a>,
    tokens: Tokens<'a>,
) -> Result<Option<ParseNode<'a>>, ParserError> {
    if expr.kind != NodeKind::Path {
        return Ok(None);
    }
    let components = &expr.children[1..];
    let last = components.len() - 1;
    let mut saw_bracket = false;
    for (index, component) in components.iter().enumerate() {
        match component.kind {
            NodeKind::PathWildcard => {
                return Err(mix_error(component, tokens));
            }
            NodeKind::PathUnpivot if index != last => {
                return Err(mix_error(component, tokens));
            }
            NodeKind::PathUnpivot => {
                // a bracket component between the root and the trailing
                // `.*` blocks the rewrite
                if saw_bracket {
                    return Err(mix_error(component, tokens));
                }
                let inner = if components.len() == 1 {
                    expr.children[0].clone()
                } else {
                    let children = expr.children[..expr.children.len() - 1].to_vec();
                    ParseNode::new(NodeKind::Path, None, children, expr.remaining)
                };
                return Ok(Some(ParseNode::new(
                    NodeKind::ProjectAll,
                    None,
                    vec![inner],
                    expr.remaining,
                )));
            }
            NodeKind::PathSqb => saw_bracket = true,
            _ => {}
        }
    }
    Ok(None)
}

fn mix_error(component: &ParseNode<'_>, tokens: Tokens<'_>) -> ParserError {
    component
        .position()
        .map(|position| ParserError::at(ErrorCode::CannotMixWildcardsInSelectList, position))
        .unwrap_or_else(|| tokens.error(ErrorCode::CannotMixWildcardsInSelectList))
}
