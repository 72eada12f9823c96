//! Operator classification and the fixed precedence table.
//!
//! Precedence values are fixed per operator; higher binds tighter. The
//! sentinel [`TOP_LEVEL`] is below every operator, so a parse started there
//! consumes any infix chain.

use crate::keyword::Keyword;
use crate::token::{Operator, TokenKind};

/// The minimum-precedence sentinel used at the top of an expression parse.
pub const TOP_LEVEL: i32 = -1;

/// Set operators (query level).
pub const SET_PRECEDENCE: i32 = 5;
/// `OR`.
pub const OR_PRECEDENCE: i32 = 10;
/// `AND`.
pub const AND_PRECEDENCE: i32 = 20;
/// Boolean `NOT` (prefix).
pub const NOT_PRECEDENCE: i32 = 30;
/// `IS`, `IN`, `BETWEEN`, `LIKE` and their negated forms.
pub const PREDICATE_PRECEDENCE: i32 = 40;
/// `=`, `<>`, `<`, `<=`, `>`, `>=`.
pub const COMPARISON_PRECEDENCE: i32 = 50;
/// `||`.
pub const CONCAT_PRECEDENCE: i32 = 60;
/// Binary `+`, `-`.
pub const ADDITIVE_PRECEDENCE: i32 = 70;
/// `*`, `/`, `%`.
pub const MULTIPLICATIVE_PRECEDENCE: i32 = 80;
/// Unary sign `+`, `-`.
pub const UNARY_SIGN_PRECEDENCE: i32 = 90;

/// Returns the infix binding power of a token, or `None` when the token is
/// not an infix operator.
pub fn infix_precedence(kind: &TokenKind) -> Option<i32> {
    match kind {
        TokenKind::Operator(op) => match op {
            Operator::Plus | Operator::Minus => Some(ADDITIVE_PRECEDENCE),
            Operator::Slash | Operator::Percent => Some(MULTIPLICATIVE_PRECEDENCE),
            Operator::Concat => Some(CONCAT_PRECEDENCE),
            Operator::Eq
            | Operator::NotEq
            | Operator::Lt
            | Operator::LtEq
            | Operator::Gt
            | Operator::GtEq => Some(COMPARISON_PRECEDENCE),
            Operator::AtSign => None,
        },
        TokenKind::Star => Some(MULTIPLICATIVE_PRECEDENCE),
        TokenKind::Keyword(keyword) => match keyword {
            Keyword::Or => Some(OR_PRECEDENCE),
            Keyword::And => Some(AND_PRECEDENCE),
            Keyword::Is
            | Keyword::IsNot
            | Keyword::In
            | Keyword::NotIn
            | Keyword::Between
            | Keyword::NotBetween
            | Keyword::Like
            | Keyword::NotLike => Some(PREDICATE_PRECEDENCE),
            Keyword::Union
            | Keyword::UnionAll
            | Keyword::Intersect
            | Keyword::IntersectAll
            | Keyword::Except
            | Keyword::ExceptAll => Some(SET_PRECEDENCE),
            _ => None,
        },
        _ => None,
    }
}

/// Returns the prefix binding power of a token, or `None` when the token is
/// not a prefix operator.
pub fn prefix_precedence(kind: &TokenKind) -> Option<i32> {
    match kind {
        TokenKind::Operator(Operator::Plus) | TokenKind::Operator(Operator::Minus) => {
            Some(UNARY_SIGN_PRECEDENCE)
        }
        TokenKind::Keyword(Keyword::Not) => Some(NOT_PRECEDENCE),
        _ => None,
    }
}

/// Returns true if the token can start a unary expression.
///
/// `@` is included: it must prefix an identifier, which the term parser
/// checks separately.
pub fn is_unary_operator(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Operator(Operator::AtSign)) || prefix_precedence(kind).is_some()
}

/// Returns true if the token is a recognized infix operator.
pub fn is_binary_operator(kind: &TokenKind) -> bool {
    infix_precedence(kind).is_some()
}

/// Returns true if the token is one of the query-level set operators, the
/// only infix operators accepted by the query expression parser.
pub fn is_query_operator(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Keyword(
            Keyword::Union
                | Keyword::UnionAll
                | Keyword::Intersect
                | Keyword::IntersectAll
                | Keyword::Except
                | Keyword::ExceptAll
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_binding_powers() {
        let star = infix_precedence(&TokenKind::Star).unwrap();
        let plus = infix_precedence(&TokenKind::Operator(Operator::Plus)).unwrap();
        let concat = infix_precedence(&TokenKind::Operator(Operator::Concat)).unwrap();
        let eq = infix_precedence(&TokenKind::Operator(Operator::Eq)).unwrap();
        let between = infix_precedence(&TokenKind::Keyword(Keyword::Between)).unwrap();
        let and = infix_precedence(&TokenKind::Keyword(Keyword::And)).unwrap();
        let or = infix_precedence(&TokenKind::Keyword(Keyword::Or)).unwrap();
        let union = infix_precedence(&TokenKind::Keyword(Keyword::Union)).unwrap();

        assert!(star > plus);
        assert!(plus > concat);
        assert!(concat > eq);
        assert!(eq > between);
        assert!(between > and);
        assert!(and > or);
        assert!(or > union);
        assert!(union > TOP_LEVEL);
    }

    #[test]
    fn prefix_operators() {
        assert_eq!(
            prefix_precedence(&TokenKind::Operator(Operator::Minus)),
            Some(UNARY_SIGN_PRECEDENCE)
        );
        assert_eq!(
            prefix_precedence(&TokenKind::Keyword(Keyword::Not)),
            Some(NOT_PRECEDENCE)
        );
        assert!(is_unary_operator(&TokenKind::Operator(Operator::AtSign)));
        assert!(!is_unary_operator(&TokenKind::Star));
    }

    #[test]
    fn query_operators() {
        assert!(is_query_operator(&TokenKind::Keyword(Keyword::UnionAll)));
        assert!(!is_query_operator(&TokenKind::Keyword(Keyword::And)));
    }
}
