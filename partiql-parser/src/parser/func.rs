//! Function calls, aggregate calls, and the built-ins with bespoke surface
//! syntax (`SUBSTRING`, `TRIM`, `EXTRACT`, `DATE_ADD`, `DATE_DIFF`).

use partiql_core::{operator, Keyword, TokenKind};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_left_paren, expect_right_paren, Parser, PResult};
use crate::view::Tokens;

impl Parser {
    /// Parses `<name>(...)`; `tokens` sits on the name token.
    pub(crate) fn parse_call<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        if matches!(rest.kind(), TokenKind::RightParen) {
            return Ok(ParseNode::new(
                NodeKind::Call,
                Some(name),
                vec![],
                rest.tail(),
            ));
        }
        let (args, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            parser.parse_expression(tokens, operator::TOP_LEVEL)
        })?;
        let remaining = expect_right_paren(rest)?;
        Ok(ParseNode::new(NodeKind::Call, Some(name), args, remaining))
    }

    /// Parses an aggregate call. `COUNT(*)` is the only star form; every
    /// aggregate takes exactly one argument with an optional leading
    /// `DISTINCT`/`ALL`.
    pub(crate) fn parse_aggregate<'a>(&self, keyword: Keyword, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;

        if keyword == Keyword::Count && matches!(rest.kind(), TokenKind::Star) {
            let remaining = expect_right_paren(rest.tail())?;
            return Ok(ParseNode::new(
                NodeKind::CallAggWildcard,
                Some(name),
                vec![],
                remaining,
            ));
        }

        let (distinct, rest) = match rest.keyword() {
            Some(Keyword::Distinct) => (true, rest.tail()),
            Some(Keyword::All) => (false, rest.tail()),
            _ => (false, rest),
        };
        if matches!(rest.kind(), TokenKind::Star) {
            return rest.err(ErrorCode::UnsupportedCallWithStar);
        }
        let arg = self.parse_expression(rest, operator::TOP_LEVEL)?;
        if matches!(arg.remaining.kind(), TokenKind::Comma) {
            return arg
                .remaining
                .err(ErrorCode::NonUnaryAggregateFunctionCall);
        }
        let remaining = expect_right_paren(arg.remaining)?;
        let kind = if distinct {
            NodeKind::CallDistinctAgg
        } else {
            NodeKind::CallAgg
        };
        Ok(ParseNode::new(kind, Some(name), vec![arg], remaining))
    }

    /// Parses `SUBSTRING(<s> FROM <pos> [FOR <len>])` or the comma form
    /// `SUBSTRING(<s>, <pos> [, <len>])`; the first delimiter decides.
    pub(crate) fn parse_substring<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        let source = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let rest = source.remaining;
        let mut children = vec![];

        match rest.kind() {
            TokenKind::Keyword(Keyword::From) => {
                let position = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                let mut rest = position.remaining;
                let mut length = None;
                if matches!(rest.kind(), TokenKind::For) {
                    let parsed = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    rest = parsed.remaining;
                    length = Some(parsed);
                }
                children.push(source);
                children.push(position);
                children.extend(length);
                let remaining = expect_right_paren(rest)?;
                Ok(ParseNode::new(
                    NodeKind::Call,
                    Some(name),
                    children,
                    remaining,
                ))
            }
            TokenKind::Comma => {
                let position = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                let mut rest = position.remaining;
                let mut length = None;
                if matches!(rest.kind(), TokenKind::Comma) {
                    let parsed = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
                    rest = parsed.remaining;
                    length = Some(parsed);
                }
                children.push(source);
                children.push(position);
                children.extend(length);
                let remaining = expect_right_paren(rest)?;
                Ok(ParseNode::new(
                    NodeKind::Call,
                    Some(name),
                    children,
                    remaining,
                ))
            }
            _ => rest.err(ErrorCode::ExpectedArgumentDelimiter),
        }
    }

    /// Parses `TRIM([[<spec>] [<chars>] FROM] <source>)`.
    pub(crate) fn parse_trim<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        let mut children = vec![];

        let rest = if let TokenKind::TrimSpec(_) = rest.kind() {
            let spec = ParseNode::atom(NodeKind::Atom, rest.head().clone(), rest.tail());
            let after = spec.remaining;
            children.push(spec);
            match after.eat_keyword(Keyword::From) {
                // TRIM(LEADING FROM s)
                Some(after_from) => after_from,
                // TRIM(LEADING <chars> FROM s)
                None => {
                    let chars = self.parse_expression(after, operator::TOP_LEVEL)?;
                    let after_from = chars.remaining.expect_keyword(Keyword::From)?;
                    children.push(chars);
                    after_from
                }
            }
        } else {
            let first = self.parse_expression(rest, operator::TOP_LEVEL)?;
            match first.remaining.eat_keyword(Keyword::From) {
                // TRIM(<chars> FROM s)
                Some(after_from) => {
                    children.push(first);
                    after_from
                }
                // TRIM(s)
                None => {
                    let remaining = expect_right_paren(first.remaining)?;
                    children.push(first);
                    return Ok(ParseNode::new(
                        NodeKind::Call,
                        Some(name),
                        children,
                        remaining,
                    ));
                }
            }
        };

        let source = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let remaining = expect_right_paren(source.remaining)?;
        children.push(source);
        Ok(ParseNode::new(
            NodeKind::Call,
            Some(name),
            children,
            remaining,
        ))
    }

    /// Parses `EXTRACT(<date part> FROM <expr>)`.
    pub(crate) fn parse_extract<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        let part = self.expect_date_part(rest)?;
        let after = part.remaining.expect_keyword(Keyword::From)?;
        let source = self.parse_expression(after, operator::TOP_LEVEL)?;
        let remaining = expect_right_paren(source.remaining)?;
        Ok(ParseNode::new(
            NodeKind::Call,
            Some(name),
            vec![part, source],
            remaining,
        ))
    }

    /// Parses `DATE_ADD(<date part>, <a>, <b>)` and `DATE_DIFF(...)`.
    pub(crate) fn parse_date_add_or_diff<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let name = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        let part = self.expect_date_part(rest)?;
        let rest = expect_comma(part.remaining)?;
        let first = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let rest = expect_comma(first.remaining)?;
        let second = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let remaining = expect_right_paren(second.remaining)?;
        Ok(ParseNode::new(
            NodeKind::Call,
            Some(name),
            vec![part, first, second],
            remaining,
        ))
    }

    fn expect_date_part<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        match tokens.kind() {
            TokenKind::DatePart(_) => Ok(ParseNode::atom(
                NodeKind::Atom,
                tokens.head().clone(),
                tokens.tail(),
            )),
            _ => Err(tokens
                .error(ErrorCode::ExpectedTokenType)
                .with("expected", "date part")),
        }
    }
}

fn expect_comma(tokens: Tokens<'_>) -> Result<Tokens<'_>, crate::error::ParserError> {
    if matches!(tokens.kind(), TokenKind::Comma) {
        Ok(tokens.tail())
    } else {
        tokens.err(ErrorCode::ExpectedArgumentDelimiter)
    }
}
