//! DML parsing: `INSERT INTO`, `SET`/`UPDATE`, `REMOVE`, `DELETE`, the
//! `FROM`-prefixed form, `ON CONFLICT` and `RETURNING`.
//!
//! A standalone operation is its own statement node with an optional
//! trailing RETURNING child; the legacy `UPDATE`/`FROM`/`DELETE` wrappers
//! carry [target, ops, WHERE?, RETURNING?] children, collecting multiple
//! consecutive operations into a DML_LIST.

use partiql_core::{operator, Keyword, Operator, TokenKind};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{Parser, PathMode, PResult};
use crate::view::Tokens;

impl Parser {
    /// Parses a standalone `INSERT INTO ...` statement.
    pub(crate) fn parse_insert<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let node = self.parse_insert_op(tokens)?;
        self.parse_statement_suffix(node, false)
    }

    /// Parses a standalone `SET ...` statement.
    pub(crate) fn parse_set_statement<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let node = self.parse_set_op(tokens)?;
        self.parse_statement_suffix(node, true)
    }

    /// Parses a standalone `REMOVE ...` statement.
    pub(crate) fn parse_remove_statement<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let node = self.parse_remove_op(tokens)?;
        self.parse_statement_suffix(node, true)
    }

    /// Parses the legacy `UPDATE <target> <op>+ [WHERE] [RETURNING]` form.
    pub(crate) fn parse_update<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let update_token = tokens.head().clone();
        let target = self.parse_path_term(tokens.tail(), PathMode::Simple)?;
        let target = self.parse_source_aliases(target)?;
        let rest = target.remaining;

        let (ops, rest) = self.parse_dml_op_sequence(rest)?;
        if ops.is_empty() {
            return rest.err(ErrorCode::MissingSetAssignment);
        }
        let ops = collect_ops(ops, rest);

        let mut children = vec![target, ops];
        let rest = self.parse_where_returning_suffix(&mut children, rest)?;
        Ok(ParseNode::new(
            NodeKind::Update,
            Some(update_token),
            children,
            rest,
        ))
    }

    /// Parses `DELETE FROM <target> [WHERE] [RETURNING]`.
    pub(crate) fn parse_delete<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let delete_token = tokens.head().clone();
        let rest = tokens.tail().expect_keyword(Keyword::From)?;
        let target = self.parse_path_term(rest, PathMode::Simple)?;
        let target = self.parse_source_aliases(target)?;
        let rest = target.remaining;

        let mut children = vec![target];
        let rest = self.parse_where_returning_suffix(&mut children, rest)?;
        Ok(ParseNode::new(
            NodeKind::Delete,
            Some(delete_token),
            children,
            rest,
        ))
    }

    /// Parses the `FROM <source> <op>+ [WHERE] [RETURNING]` form.
    pub(crate) fn parse_from_dml<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let from_token = tokens.head().clone();
        let sources = self.parse_from_source_list(tokens.tail())?;
        let rest = sources.remaining;

        let (ops, rest) = self.parse_dml_op_sequence(rest)?;
        if ops.is_empty() {
            return rest.err(ErrorCode::UnsupportedSyntax);
        }
        let ops = collect_ops(ops, rest);

        let mut children = vec![sources, ops];
        let rest = self.parse_where_returning_suffix(&mut children, rest)?;
        Ok(ParseNode::new(
            NodeKind::From,
            Some(from_token),
            children,
            rest,
        ))
    }

    /// Parses consecutive `SET` / `REMOVE` / `INSERT INTO` operations.
    fn parse_dml_op_sequence<'a>(
        &self,
        mut tokens: Tokens<'a>,
    ) -> Result<(Vec<ParseNode<'a>>, Tokens<'a>), crate::error::ParserError> {
        let mut ops = vec![];
        loop {
            let op = match tokens.keyword() {
                Some(Keyword::Set) => self.parse_set_op(tokens)?,
                Some(Keyword::Remove) => self.parse_remove_op(tokens)?,
                Some(Keyword::InsertInto) => self.parse_insert_op(tokens)?,
                _ => break,
            };
            tokens = op.remaining;
            ops.push(op);
        }
        Ok((ops, tokens))
    }

    /// Parses `INSERT INTO <path> (VALUE <expr> [AT <pos>] [ON CONFLICT ...]
    /// | <values>)` without any RETURNING suffix.
    fn parse_insert_op<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let insert_token = tokens.head().clone();
        let target = self.parse_path_term(tokens.tail(), PathMode::Simple)?;
        let rest = target.remaining;

        match rest.eat_keyword(Keyword::Value) {
            Some(after) => {
                let value = self.parse_expression(after, operator::TOP_LEVEL)?;
                let mut rest = value.remaining;
                let mut children = vec![target, value];
                if matches!(rest.kind(), TokenKind::At) {
                    let position = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    rest = position.remaining;
                    children.push(position);
                }
                if rest.keyword() == Some(Keyword::OnConflict) {
                    let on_conflict = self.parse_on_conflict(rest)?;
                    rest = on_conflict.remaining;
                    children.push(on_conflict);
                }
                Ok(ParseNode::new(
                    NodeKind::InsertValue,
                    Some(insert_token),
                    children,
                    rest,
                ))
            }
            None => {
                let values = self.parse_expression(rest, operator::TOP_LEVEL)?;
                let remaining = values.remaining;
                Ok(ParseNode::new(
                    NodeKind::Insert,
                    Some(insert_token),
                    vec![target, values],
                    remaining,
                ))
            }
        }
    }

    /// Parses `ON CONFLICT WHERE <expr> DO NOTHING`.
    fn parse_on_conflict<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let conflict_token = tokens.head().clone();
        let rest = tokens.tail();
        if rest.keyword() != Some(Keyword::Where) {
            return rest.err(ErrorCode::ExpectedWhere);
        }
        let condition = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
        let rest = condition.remaining;
        let check = ParseNode::new(NodeKind::Check, None, vec![condition], rest);

        if rest.keyword() != Some(Keyword::DoNothing) {
            return rest.err(ErrorCode::ExpectedConflictAction);
        }
        let action = ParseNode::atom(NodeKind::ConflictAction, rest.head().clone(), rest.tail());
        let remaining = action.remaining;
        Ok(ParseNode::new(
            NodeKind::OnConflict,
            Some(conflict_token),
            vec![check, action],
            remaining,
        ))
    }

    /// Parses `SET <path> = <expr> (, ...)*` into a SET node of ASSIGNMENT
    /// children.
    fn parse_set_op<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let set_token = tokens.head().clone();
        let rest = tokens.tail();
        if !matches!(rest.kind(), TokenKind::Ident(_) | TokenKind::QuotedIdent(_)) {
            return rest.err(ErrorCode::MissingSetAssignment);
        }
        let (assignments, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            let target = parser.parse_path_term(tokens, PathMode::Simple)?;
            let after = target
                .remaining
                .expect(&TokenKind::Operator(Operator::Eq))?;
            let value = parser.parse_expression(after, operator::TOP_LEVEL)?;
            let remaining = value.remaining;
            Ok(ParseNode::new(
                NodeKind::Assignment,
                None,
                vec![target, value],
                remaining,
            ))
        })?;
        Ok(ParseNode::new(
            NodeKind::Set,
            Some(set_token),
            assignments,
            rest,
        ))
    }

    /// Parses `REMOVE <path>`.
    fn parse_remove_op<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let remove_token = tokens.head().clone();
        let target = self.parse_path_term(tokens.tail(), PathMode::Simple)?;
        let remaining = target.remaining;
        Ok(ParseNode::new(
            NodeKind::Remove,
            Some(remove_token),
            vec![target],
            remaining,
        ))
    }

    /// Parses `RETURNING <elem> (, <elem>)*` where
    /// `<elem> ::= (MODIFIED|ALL) (OLD|NEW) (* | <path>)`; element paths are
    /// limited to two components.
    pub(crate) fn parse_returning<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let returning_token = tokens.head().clone();
        let (elems, rest) = self.parse_comma_separated(tokens.tail(), |parser, tokens| {
            let mapping = match tokens.keyword() {
                Some(
                    Keyword::ModifiedOld
                    | Keyword::ModifiedNew
                    | Keyword::AllOld
                    | Keyword::AllNew,
                ) => ParseNode::atom(
                    NodeKind::ReturningMapping,
                    tokens.head().clone(),
                    tokens.tail(),
                ),
                _ => return tokens.err(ErrorCode::ExpectedReturningClause),
            };
            let rest = mapping.remaining;
            let column = if matches!(rest.kind(), TokenKind::Star) {
                ParseNode::atom(NodeKind::ReturningWildcard, rest.head().clone(), rest.tail())
            } else {
                let path = parser.parse_path_term(rest, PathMode::Query)?;
                if path.kind == NodeKind::Path && path.children.len() > 2 {
                    return rest.err(ErrorCode::InvalidPathComponent);
                }
                path
            };
            let remaining = column.remaining;
            Ok(ParseNode::new(
                NodeKind::ReturningElem,
                None,
                vec![mapping, column],
                remaining,
            ))
        })?;
        Ok(ParseNode::new(
            NodeKind::Returning,
            Some(returning_token),
            elems,
            rest,
        ))
    }

    /// Appends optional WHERE (when allowed) and RETURNING children to a
    /// standalone operation node.
    fn parse_statement_suffix<'a>(
        &self,
        mut node: ParseNode<'a>,
        allow_where: bool,
    ) -> PResult<'a> {
        let mut rest = node.remaining;
        if allow_where {
            if let Some(after) = rest.eat_keyword(Keyword::Where) {
                let where_token = rest.head().clone();
                let expr = self.parse_expression(after, operator::TOP_LEVEL)?;
                rest = expr.remaining;
                node.children.push(ParseNode::new(
                    NodeKind::Where,
                    Some(where_token),
                    vec![expr],
                    rest,
                ));
            }
        }
        if rest.keyword() == Some(Keyword::Returning) {
            let returning = self.parse_returning(rest)?;
            rest = returning.remaining;
            node.children.push(returning);
        }
        Ok(node.with_remaining(rest))
    }

    /// Appends optional WHERE and RETURNING children of the legacy wrapper
    /// forms, in that order.
    fn parse_where_returning_suffix<'a>(
        &self,
        children: &mut Vec<ParseNode<'a>>,
        tokens: Tokens<'a>,
    ) -> Result<Tokens<'a>, crate::error::ParserError> {
        let mut rest = tokens;
        if let Some(after) = rest.eat_keyword(Keyword::Where) {
            let where_token = rest.head().clone();
            let expr = self.parse_expression(after, operator::TOP_LEVEL)?;
            rest = expr.remaining;
            children.push(ParseNode::new(
                NodeKind::Where,
                Some(where_token),
                vec![expr],
                rest,
            ));
        }
        if rest.keyword() == Some(Keyword::Returning) {
            let returning = self.parse_returning(rest)?;
            rest = returning.remaining;
            children.push(returning);
        }
        Ok(rest)
    }
}

/// A single operation stands alone; several collect into a DML_LIST.
fn collect_ops<'a>(mut ops: Vec<ParseNode<'a>>, remaining: Tokens<'a>) -> ParseNode<'a> {
    if ops.len() == 1 {
        ops.remove(0)
    } else {
        ParseNode::new(NodeKind::DmlList, None, ops, remaining)
    }
}
