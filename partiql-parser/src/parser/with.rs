//! `WITH [RECURSIVE]` parsing.
//!
//! ```txt
//! <with query> ::= WITH [RECURSIVE] <binding> (, <binding>)* <query>
//! <binding>    ::= <name> AS [[NOT] MATERIALIZED] ( <query> )
//! ```
//!
//! Binding bodies and the final query are parsed with the query-level
//! expression parser, so only the set operators combine them.

use partiql_core::{operator, Keyword, TokenKind};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_left_paren, expect_right_paren, Parser, PResult};
use crate::view::Tokens;

impl Parser {
    pub(crate) fn parse_with<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let with_token = tokens.head().clone();
        let mut rest = tokens.tail();
        let mut children = vec![];

        if rest.keyword() == Some(Keyword::Recursive) {
            children.push(ParseNode::atom(
                NodeKind::Recursive,
                rest.head().clone(),
                rest.tail(),
            ));
            rest = rest.tail();
        }

        let (bindings, rest) =
            self.parse_comma_separated(rest, |parser, tokens| parser.parse_with_binding(tokens))?;
        children.extend(bindings);

        let query = self.parse_query_expression(rest, operator::TOP_LEVEL)?;
        let remaining = query.remaining;
        children.push(query);
        Ok(ParseNode::new(
            NodeKind::With,
            Some(with_token),
            children,
            remaining,
        ))
    }

    fn parse_with_binding<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let (name, rest) = tokens.expect_identifier()?;
        if !matches!(rest.kind(), TokenKind::As) {
            return rest.err(ErrorCode::ExpectedAs);
        }
        let mut rest = rest.tail();

        // absent both MATERIALIZED and NOT MATERIALIZED, the binding is
        // materialized
        let materialized = match rest.keyword() {
            Some(keyword @ Keyword::Materialized) | Some(keyword @ Keyword::NotMaterialized) => {
                let token = rest.head().clone();
                rest = rest.tail();
                Some((keyword, token))
            }
            _ => None,
        };

        let rest = expect_left_paren(rest)?;
        let query = self.parse_query_expression(rest, operator::TOP_LEVEL)?;
        let remaining = expect_right_paren(query.remaining)?;

        let binding = ParseNode::new(
            NodeKind::AsAlias,
            Some(name.clone()),
            vec![query],
            remaining,
        );
        Ok(match materialized {
            Some((_, token)) => ParseNode::new(
                NodeKind::Materialized,
                Some(token),
                vec![binding],
                remaining,
            ),
            None => binding,
        })
    }
}
