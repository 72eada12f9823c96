//! Term and path parsing: atoms, literals, parenthesized groups, `CASE`,
//! `CAST`, `VALUES` and the keyword dispatch into the statement parsers.

use partiql_core::{operator, Keyword, Operator, TokenKind};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_left_paren, expect_right_paren, Parser, PathMode, PResult};
use crate::view::Tokens;

impl Parser {
    /// Parses a base term followed by any number of path components.
    pub(crate) fn parse_path_term<'a>(&self, tokens: Tokens<'a>, mode: PathMode) -> PResult<'a> {
        let root = match mode {
            PathMode::Full => self.parse_term(tokens)?,
            // restricted modes only allow an identifier at the root
            PathMode::Query | PathMode::Simple => {
                let (token, rest) = tokens.expect_identifier()?;
                ParseNode::atom(NodeKind::Atom, token.clone(), rest)
            }
        };

        let mut components = vec![];
        let mut rest = root.remaining;
        loop {
            match rest.kind() {
                TokenKind::Dot => {
                    let after_dot = rest.tail();
                    let component = match after_dot.kind() {
                        TokenKind::Ident(text) => ParseNode::new(
                            NodeKind::PathDot,
                            Some(after_dot.head().clone()),
                            vec![ParseNode::atom(
                                NodeKind::CaseInsensitiveAtom,
                                string_atom(after_dot, text),
                                after_dot.tail(),
                            )],
                            after_dot.tail(),
                        ),
                        TokenKind::QuotedIdent(text) => ParseNode::new(
                            NodeKind::PathDot,
                            Some(after_dot.head().clone()),
                            vec![ParseNode::atom(
                                NodeKind::CaseSensitiveAtom,
                                string_atom(after_dot, text),
                                after_dot.tail(),
                            )],
                            after_dot.tail(),
                        ),
                        TokenKind::Star if mode == PathMode::Full => ParseNode::atom(
                            NodeKind::PathUnpivot,
                            after_dot.head().clone(),
                            after_dot.tail(),
                        ),
                        _ => return after_dot.err(ErrorCode::InvalidPathComponent),
                    };
                    rest = component.remaining;
                    components.push(component);
                }
                TokenKind::LeftBracket => {
                    let inner = rest.tail();
                    let component = if matches!(inner.kind(), TokenKind::Star) {
                        if mode != PathMode::Full {
                            return inner.err(ErrorCode::InvalidPathComponent);
                        }
                        let after =
                            inner.tail().expect(&TokenKind::RightBracket)?;
                        ParseNode::atom(NodeKind::PathWildcard, inner.head().clone(), after)
                    } else {
                        let index = self.parse_expression(inner, operator::TOP_LEVEL)?;
                        if mode == PathMode::Simple && !is_literal_atom(&index) {
                            return inner.err(ErrorCode::InvalidPathComponent);
                        }
                        let after = index.remaining.expect(&TokenKind::RightBracket)?;
                        ParseNode::new(NodeKind::PathSqb, None, vec![index], after)
                    };
                    rest = component.remaining;
                    components.push(component);
                }
                _ => break,
            }
        }

        if components.is_empty() {
            Ok(root)
        } else {
            let mut children = vec![root];
            children.extend(components);
            Ok(ParseNode::new(NodeKind::Path, None, children, rest))
        }
    }

    /// Parses a term, dispatching on the head token.
    pub(crate) fn parse_term<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        match tokens.kind() {
            // `@` is only legal immediately before an identifier
            TokenKind::Operator(Operator::AtSign) => {
                let after = tokens.tail();
                match after.kind() {
                    TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => {
                        let atom =
                            ParseNode::atom(NodeKind::Atom, after.head().clone(), after.tail());
                        let remaining = atom.remaining;
                        Ok(ParseNode::new(
                            NodeKind::Unary,
                            Some(tokens.head().clone()),
                            vec![atom],
                            remaining,
                        ))
                    }
                    _ => after.err(ErrorCode::MissingIdentifierAfterAt),
                }
            }
            TokenKind::Keyword(keyword) => self.parse_keyword_term(*keyword, tokens),
            TokenKind::LeftParen => self.parse_paren_term(tokens),
            TokenKind::LeftBracket => self.parse_list_literal(tokens),
            TokenKind::LeftDoubleAngle => self.parse_bag_literal(tokens),
            TokenKind::LeftCurly => self.parse_struct_literal(tokens),
            TokenKind::Ident(_) | TokenKind::QuotedIdent(_) => {
                if matches!(tokens.tail().kind(), TokenKind::LeftParen) {
                    self.parse_call(tokens)
                } else {
                    Ok(ParseNode::atom(
                        NodeKind::Atom,
                        tokens.head().clone(),
                        tokens.tail(),
                    ))
                }
            }
            TokenKind::QuestionMark(_) => Ok(ParseNode::atom(
                NodeKind::Parameter,
                tokens.head().clone(),
                tokens.tail(),
            )),
            TokenKind::Literal(_)
            | TokenKind::IonLiteral(_)
            | TokenKind::Null
            | TokenKind::Missing
            | TokenKind::TrimSpec(_) => Ok(ParseNode::atom(
                NodeKind::Atom,
                tokens.head().clone(),
                tokens.tail(),
            )),
            _ => tokens.err(ErrorCode::ExpectedExpression),
        }
    }

    fn parse_keyword_term<'a>(&self, keyword: Keyword, tokens: Tokens<'a>) -> PResult<'a> {
        match keyword {
            Keyword::Case => self.parse_case(tokens),
            Keyword::Cast => self.parse_cast(tokens),
            Keyword::Select => self.parse_select(tokens),
            Keyword::Pivot => self.parse_pivot(tokens),
            Keyword::Values => self.parse_values(tokens),
            Keyword::With => self.parse_with(tokens),
            Keyword::From => self.parse_from_dml(tokens),
            Keyword::InsertInto => self.parse_insert(tokens),
            Keyword::Update => self.parse_update(tokens),
            Keyword::Set => self.parse_set_statement(tokens),
            Keyword::Remove => self.parse_remove_statement(tokens),
            Keyword::Delete => self.parse_delete(tokens),
            Keyword::Create => self.parse_create(tokens),
            Keyword::Drop => self.parse_drop(tokens),
            Keyword::Exec => self.parse_exec(tokens),
            Keyword::Substring => self.parse_substring(tokens),
            Keyword::Trim => self.parse_trim(tokens),
            Keyword::Extract => self.parse_extract(tokens),
            Keyword::DateAdd | Keyword::DateDiff => self.parse_date_add_or_diff(tokens),
            Keyword::Date => self.parse_date_literal(tokens),
            Keyword::Time => self.parse_time_literal(tokens),
            keyword if keyword.is_aggregate() => self.parse_aggregate(keyword, tokens),
            Keyword::List | Keyword::Bag | Keyword::Sexp
                if matches!(tokens.tail().kind(), TokenKind::LeftParen) =>
            {
                self.parse_call(tokens)
            }
            _ => tokens.err(ErrorCode::UnexpectedKeyword),
        }
    }

    /// Parses `( ... )`: one element is a grouping, more form a row
    /// constructor, zero is an error.
    fn parse_paren_term<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let rest = expect_left_paren(tokens)?;
        if matches!(rest.kind(), TokenKind::RightParen) {
            return rest.err(ErrorCode::ExpectedExpression);
        }
        let (mut items, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            parser.parse_expression(tokens, operator::TOP_LEVEL)
        })?;
        let remaining = expect_right_paren(rest)?;
        if items.len() == 1 {
            Ok(items.remove(0).with_remaining(remaining))
        } else {
            Ok(ParseNode::new(
                NodeKind::List,
                Some(tokens.head().clone()),
                items,
                remaining,
            ))
        }
    }

    fn parse_list_literal<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let rest = tokens.tail();
        if matches!(rest.kind(), TokenKind::RightBracket) {
            return Ok(ParseNode::new(
                NodeKind::List,
                Some(tokens.head().clone()),
                vec![],
                rest.tail(),
            ));
        }
        let (items, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            parser.parse_expression(tokens, operator::TOP_LEVEL)
        })?;
        let remaining = rest.expect(&TokenKind::RightBracket)?;
        Ok(ParseNode::new(
            NodeKind::List,
            Some(tokens.head().clone()),
            items,
            remaining,
        ))
    }

    fn parse_bag_literal<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let rest = tokens.tail();
        if matches!(rest.kind(), TokenKind::RightDoubleAngle) {
            return Ok(ParseNode::new(
                NodeKind::Bag,
                Some(tokens.head().clone()),
                vec![],
                rest.tail(),
            ));
        }
        let (items, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            parser.parse_expression(tokens, operator::TOP_LEVEL)
        })?;
        let remaining = rest.expect(&TokenKind::RightDoubleAngle)?;
        Ok(ParseNode::new(
            NodeKind::Bag,
            Some(tokens.head().clone()),
            items,
            remaining,
        ))
    }

    /// Parses `{ key: value, ... }`; the empty struct is legal.
    fn parse_struct_literal<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let rest = tokens.tail();
        if matches!(rest.kind(), TokenKind::RightCurly) {
            return Ok(ParseNode::new(
                NodeKind::Struct,
                Some(tokens.head().clone()),
                vec![],
                rest.tail(),
            ));
        }
        let (members, rest) = self.parse_comma_separated(rest, |parser, tokens| {
            let name = parser.parse_expression(tokens, operator::TOP_LEVEL)?;
            let rest = name.remaining.expect(&TokenKind::Colon)?;
            let value = parser.parse_expression(rest, operator::TOP_LEVEL)?;
            let remaining = value.remaining;
            Ok(ParseNode::new(
                NodeKind::Member,
                None,
                vec![name, value],
                remaining,
            ))
        })?;
        let remaining = rest.expect(&TokenKind::RightCurly)?;
        Ok(ParseNode::new(
            NodeKind::Struct,
            Some(tokens.head().clone()),
            members,
            remaining,
        ))
    }

    /// Parses `CASE [operand] WHEN ... THEN ... [ELSE ...] END`.
    fn parse_case<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let case_token = tokens.head().clone();
        let mut rest = tokens.tail();
        let mut children = vec![];

        if rest.keyword() != Some(Keyword::When) {
            let operand = self.parse_expression(rest, operator::TOP_LEVEL)?;
            rest = operand.remaining;
            children.push(operand);
        }
        if rest.keyword() != Some(Keyword::When) {
            return rest.err(ErrorCode::ExpectedWhen);
        }
        while rest.keyword() == Some(Keyword::When) {
            let when_token = rest.head().clone();
            let condition = self.parse_expression(rest.tail(), operator::TOP_LEVEL)?;
            let after = condition.remaining.expect_keyword(Keyword::Then)?;
            let value = self.parse_expression(after, operator::TOP_LEVEL)?;
            rest = value.remaining;
            children.push(ParseNode::new(
                NodeKind::When,
                Some(when_token),
                vec![condition, value],
                rest,
            ));
        }
        if let Some(after) = rest.eat_keyword(Keyword::Else) {
            let value = self.parse_expression(after, operator::TOP_LEVEL)?;
            rest = value.remaining;
            children.push(ParseNode::new(NodeKind::Else, None, vec![value], rest));
        }
        let remaining = rest.expect_keyword(Keyword::End)?;
        Ok(ParseNode::new(
            NodeKind::Case,
            Some(case_token),
            children,
            remaining,
        ))
    }

    /// Parses `CAST ( <expr> AS <type> )`.
    fn parse_cast<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let cast_token = tokens.head().clone();
        let rest = expect_left_paren(tokens.tail())?;
        let expr = self.parse_expression(rest, operator::TOP_LEVEL)?;
        let rest = expr.remaining;
        if !matches!(rest.kind(), TokenKind::As) {
            return rest.err(ErrorCode::ExpectedAs);
        }
        let data_type = self.parse_type(rest.tail())?;
        let remaining = expect_right_paren(data_type.remaining)?;
        Ok(ParseNode::new(
            NodeKind::Cast,
            Some(cast_token),
            vec![expr, data_type],
            remaining,
        ))
    }

    /// Parses `VALUES (<expr>, ...) (, (<expr>, ...))*` into a bag of lists.
    fn parse_values<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let (rows, rest) = self.parse_comma_separated(tokens.tail(), |parser, tokens| {
            parser.parse_paren_list(tokens)
        })?;
        Ok(ParseNode::new(
            NodeKind::Bag,
            Some(tokens.head().clone()),
            rows,
            rest,
        ))
    }
}

/// Makes a string-literal token carrying a path component name, keeping the
/// component's span.
fn string_atom(tokens: Tokens<'_>, text: &str) -> partiql_core::Token {
    partiql_core::Token::new(
        TokenKind::Literal(partiql_core::Value::Text(text.to_string())),
        tokens.head().span,
    )
}

fn is_literal_atom(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && matches!(
            node.token.as_ref().map(|token| &token.kind),
            Some(TokenKind::Literal(_)) | Some(TokenKind::IonLiteral(_))
        )
}
