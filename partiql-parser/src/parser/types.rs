//! The SQL type parser: a closed name→arity table, unsigned-integer
//! parameters, and the `TIME ... WITH TIME ZONE` rewrite.

use std::collections::HashMap;

use lazy_static::lazy_static;
use partiql_core::{operator, Keyword, Token, TokenKind, Value};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_right_paren, Parser, PResult};
use crate::view::Tokens;

lazy_static! {
    /// Core type names and their permitted parameter counts.
    static ref CORE_TYPES: HashMap<Keyword, (usize, usize)> = {
        let mut map = HashMap::new();
        map.insert(Keyword::Boolean, (0, 0));
        map.insert(Keyword::Smallint, (0, 0));
        map.insert(Keyword::Int, (0, 0));
        map.insert(Keyword::Integer, (0, 0));
        map.insert(Keyword::Float, (0, 1));
        map.insert(Keyword::Real, (0, 0));
        map.insert(Keyword::DoublePrecision, (0, 0));
        map.insert(Keyword::Decimal, (0, 2));
        map.insert(Keyword::Numeric, (0, 2));
        map.insert(Keyword::Timestamp, (0, 1));
        map.insert(Keyword::Character, (0, 1));
        map.insert(Keyword::Char, (0, 1));
        map.insert(Keyword::Varchar, (0, 1));
        map.insert(Keyword::CharacterVarying, (0, 1));
        map.insert(Keyword::String, (0, 0));
        map.insert(Keyword::Symbol, (0, 0));
        map.insert(Keyword::Clob, (0, 0));
        map.insert(Keyword::Blob, (0, 0));
        map.insert(Keyword::Struct, (0, 0));
        map.insert(Keyword::Tuple, (0, 0));
        map.insert(Keyword::List, (0, 0));
        map.insert(Keyword::Sexp, (0, 0));
        map.insert(Keyword::Bag, (0, 0));
        map.insert(Keyword::Time, (0, 1));
        map.insert(Keyword::Date, (0, 0));
        map
    };
}

impl Parser {
    /// Parses a type name with optional parameters into a TYPE node.
    pub(crate) fn parse_type<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let (keyword, arity) = match tokens.kind() {
            TokenKind::Null => (None, (0, 0)),
            TokenKind::Missing => (None, (0, 0)),
            TokenKind::Keyword(keyword) => match CORE_TYPES.get(keyword) {
                Some(arity) => (Some(*keyword), *arity),
                None => return tokens.err(ErrorCode::ExpectedTypeName),
            },
            _ => return tokens.err(ErrorCode::ExpectedTypeName),
        };
        let mut type_token = tokens.head().clone();
        let mut rest = tokens.tail();

        let mut args = vec![];
        if matches!(rest.kind(), TokenKind::LeftParen) {
            let (parsed, after) =
                self.parse_comma_separated(rest.tail(), |parser, tokens| {
                    let arg = parser.parse_expression(tokens, operator::TOP_LEVEL)?;
                    if !is_unsigned_integer_atom(&arg) {
                        return tokens.err(ErrorCode::InvalidTypeParameter);
                    }
                    Ok(arg)
                })?;
            rest = expect_right_paren(after)?;
            args = parsed;
        }

        let (min, max) = arity;
        if args.len() < min || args.len() > max {
            return Err(tokens
                .error(ErrorCode::CastArityMismatch)
                .with("arity", format!("{}..{}", min, max))
                .with("actual_arity", args.len().to_string()));
        }

        if keyword == Some(Keyword::Time) {
            if let Some(precision) = args.first().and_then(argument_value) {
                if precision > 9 {
                    return tokens.err(ErrorCode::InvalidPrecisionForTime);
                }
            }
            // `WITH TIME ZONE` is exactly three keyword tokens; if present,
            // the type is rewritten to time_with_time_zone
            if rest.keyword() == Some(Keyword::With)
                && rest.peek(1).is_keyword(Keyword::Time)
                && rest.peek(2).is_keyword(Keyword::Zone)
            {
                rest = rest.tail().tail().tail();
                type_token = Token::new(
                    TokenKind::Keyword(Keyword::TimeWithTimeZone),
                    type_token.span,
                );
            }
        }

        Ok(ParseNode::new(
            NodeKind::Type,
            Some(type_token),
            args,
            rest,
        ))
    }
}

fn is_unsigned_integer_atom(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && node
            .token
            .as_ref()
            .and_then(|token| token.value())
            .map(|value| value.is_unsigned_integer())
            .unwrap_or(false)
}

fn argument_value(node: &ParseNode<'_>) -> Option<u64> {
    match node.token.as_ref().map(|token| &token.kind) {
        Some(TokenKind::Literal(Value::Integer(value))) if *value >= 0 => Some(*value as u64),
        _ => None,
    }
}
