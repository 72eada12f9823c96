//! DDL parsing (`CREATE`/`DROP` `TABLE`/`INDEX`) and `EXEC`.
//!
//! DDL statements forbid trailing tokens beyond the terminating
//! EOF/semicolons, which also rejects them in any nested position.

use partiql_core::{operator, Keyword, TokenKind};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_left_paren, expect_right_paren, Parser, PathMode, PResult};
use crate::view::Tokens;

impl Parser {
    /// Parses `CREATE TABLE <name>` or `CREATE INDEX ON <table> (<keys>)`.
    pub(crate) fn parse_create<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let create_token = tokens.head().clone();
        let rest = tokens.tail();
        let node = match rest.keyword() {
            Some(Keyword::Table) => {
                let (name, remaining) = rest.tail().expect_identifier()?;
                ParseNode::new(
                    NodeKind::CreateTable,
                    Some(create_token),
                    vec![ParseNode::atom(NodeKind::Atom, name.clone(), remaining)],
                    remaining,
                )
            }
            Some(Keyword::Index) => {
                let rest = rest.tail().expect_keyword(Keyword::On)?;
                let (table, rest) = rest.expect_identifier()?;
                let table_atom = ParseNode::atom(NodeKind::Atom, table.clone(), rest);
                let rest = expect_left_paren(rest)?;
                let (keys, rest) = self.parse_comma_separated(rest, |parser, tokens| {
                    parser.parse_path_term(tokens, PathMode::Simple)
                })?;
                let remaining = expect_right_paren(rest)?;
                let mut children = vec![table_atom];
                children.extend(keys);
                ParseNode::new(NodeKind::CreateIndex, Some(create_token), children, remaining)
            }
            _ => return rest.err(ErrorCode::UnexpectedKeyword),
        };
        expect_end_of_ddl(node)
    }

    /// Parses `DROP TABLE <name>` or `DROP INDEX <index> ON <table>`.
    pub(crate) fn parse_drop<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let drop_token = tokens.head().clone();
        let rest = tokens.tail();
        let node = match rest.keyword() {
            Some(Keyword::Table) => {
                let (name, remaining) = rest.tail().expect_identifier()?;
                ParseNode::new(
                    NodeKind::DropTable,
                    Some(drop_token),
                    vec![ParseNode::atom(NodeKind::Atom, name.clone(), remaining)],
                    remaining,
                )
            }
            Some(Keyword::Index) => {
                let (index, rest) = rest.tail().expect_identifier()?;
                let index_atom = ParseNode::atom(NodeKind::Atom, index.clone(), rest);
                let rest = rest.expect_keyword(Keyword::On)?;
                let (table, remaining) = rest.expect_identifier()?;
                ParseNode::new(
                    NodeKind::DropIndex,
                    Some(drop_token),
                    vec![
                        index_atom,
                        ParseNode::atom(NodeKind::Atom, table.clone(), remaining),
                    ],
                    remaining,
                )
            }
            _ => return rest.err(ErrorCode::UnexpectedKeyword),
        };
        expect_end_of_ddl(node)
    }

    /// Parses `EXEC <procedure> [<expr> (, <expr>)*]`.
    ///
    /// A `(` after the procedure name is rejected (arguments are bare), as
    /// is any later `exec` keyword in the remaining tokens. Zero arguments
    /// are accepted only at end of statement.
    pub(crate) fn parse_exec<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let exec_token = tokens.head().clone();
        let rest = tokens.tail();
        if !matches!(rest.kind(), TokenKind::Ident(_) | TokenKind::QuotedIdent(_)) {
            return rest.err(ErrorCode::NoStoredProcedureProvided);
        }
        let name = ParseNode::atom(NodeKind::Atom, rest.head().clone(), rest.tail());
        let rest = name.remaining;
        if matches!(rest.kind(), TokenKind::LeftParen) {
            return rest.err(ErrorCode::UnexpectedToken);
        }

        let mut children = vec![name];
        let remaining = if rest.only_end_of_statement() {
            rest
        } else {
            let (args, remaining) = self.parse_comma_separated(rest, |parser, tokens| {
                parser.parse_expression(tokens, operator::TOP_LEVEL)
            })?;
            children.extend(args);
            remaining
        };

        let mut scan = remaining;
        while !matches!(scan.kind(), TokenKind::Eof) {
            if scan.keyword() == Some(Keyword::Exec) {
                return scan.err(ErrorCode::UnexpectedKeyword);
            }
            scan = scan.tail();
        }

        Ok(ParseNode::new(
            NodeKind::Exec,
            Some(exec_token),
            children,
            remaining,
        ))
    }
}

fn expect_end_of_ddl(node: ParseNode<'_>) -> PResult<'_> {
    if node.remaining.only_end_of_statement() {
        Ok(node)
    } else {
        node.remaining.err(ErrorCode::UnexpectedToken)
    }
}
