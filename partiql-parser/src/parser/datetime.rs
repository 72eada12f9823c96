//! `DATE` and `TIME` literal parsing and validation.
//!
//! The literal strings are validated twice over: a strict shape regex, then
//! a calendar/clock check through `chrono`.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use partiql_core::{Keyword, Span, Token, TokenKind, Value};

use crate::error::ErrorCode;
use crate::node::{NodeKind, ParseNode};
use crate::parser::{expect_right_paren, Parser, PResult};
use crate::view::Tokens;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex");
    static ref TIME_RE: Regex =
        Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(?:\.(\d+))?([+-]\d{2}:\d{2})?$")
            .expect("valid time regex");
}

/// The decomposed pieces of a valid time string.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct TimeParts {
    pub(crate) hour: u32,
    pub(crate) minute: u32,
    pub(crate) second: u32,
    pub(crate) nanos: u32,
    /// Number of fractional-second digits present in the source.
    pub(crate) frac_digits: u32,
    /// Zone offset in minutes east of UTC, when the string carries one.
    pub(crate) tz_minutes: Option<i32>,
}

/// Validates a `DATE` string and decomposes it, rejecting dates that do not
/// exist on the proleptic Gregorian calendar.
pub(crate) fn parse_date_parts(text: &str) -> Option<(i32, u32, u32)> {
    if !DATE_RE.is_match(text) {
        return None;
    }
    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[5..7].parse().ok()?;
    let day: u32 = text[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?;
    Some((year, month, day))
}

/// Validates a `TIME` string and decomposes it. Offsets must lie within
/// [-18:00, +18:00].
pub(crate) fn parse_time_parts(text: &str) -> Option<TimeParts> {
    let captures = TIME_RE.captures(text)?;
    let hour: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minute: u32 = captures.get(2)?.as_str().parse().ok()?;
    let second: u32 = captures.get(3)?.as_str().parse().ok()?;

    let (nanos, frac_digits) = match captures.get(4) {
        Some(frac) => {
            let digits = frac.as_str();
            let mut nanos: u32 = 0;
            for (index, ch) in digits.chars().take(9).enumerate() {
                nanos += ch.to_digit(10)? * 10u32.pow(8 - index as u32);
            }
            (nanos, digits.len() as u32)
        }
        None => (0, 0),
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;

    let tz_minutes = match captures.get(5) {
        Some(offset) => {
            let offset = offset.as_str();
            let sign = if offset.starts_with('-') { -1 } else { 1 };
            let hours: i32 = offset[1..3].parse().ok()?;
            let minutes: i32 = offset[4..6].parse().ok()?;
            if minutes > 59 {
                return None;
            }
            let total = hours * 60 + minutes;
            if total > 18 * 60 {
                return None;
            }
            Some(sign * total)
        }
        None => None,
    };

    Some(TimeParts {
        hour,
        minute,
        second,
        nanos,
        frac_digits,
        tz_minutes,
    })
}

impl Parser {
    /// Parses `DATE 'YYYY-MM-DD'`.
    pub(crate) fn parse_date_literal<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let date_token = tokens.head().clone();
        let rest = tokens.tail();
        match rest.kind() {
            TokenKind::Literal(Value::Text(text)) => {
                if parse_date_parts(text).is_none() {
                    return Err(rest
                        .error(ErrorCode::InvalidDateString)
                        .with("value", text.clone()));
                }
                let atom = ParseNode::atom(NodeKind::Atom, rest.head().clone(), rest.tail());
                let remaining = atom.remaining;
                Ok(ParseNode::new(
                    NodeKind::Date,
                    Some(date_token),
                    vec![atom],
                    remaining,
                ))
            }
            _ => Err(rest
                .error(ErrorCode::ExpectedTokenType)
                .with("expected", "date string")),
        }
    }

    /// Parses `TIME [(p)] [WITH TIME ZONE] 'HH:MM:SS[.fff][±HH:MM]'`.
    ///
    /// When the precision is omitted it derives from the fractional digits
    /// present in the string; either way it must lie in 0-9.
    pub(crate) fn parse_time_literal<'a>(&self, tokens: Tokens<'a>) -> PResult<'a> {
        let time_token = tokens.head().clone();
        let mut rest = tokens.tail();

        let mut given_precision = None;
        if matches!(rest.kind(), TokenKind::LeftParen) {
            let inner = rest.tail();
            match inner.kind() {
                TokenKind::Literal(Value::Integer(precision)) if (0..=9).contains(precision) => {
                    given_precision = Some((*precision as u32, inner.head().clone()));
                    rest = expect_right_paren(inner.tail())?;
                }
                _ => return inner.err(ErrorCode::InvalidPrecisionForTime),
            }
        }

        // `WITH TIME ZONE` is exactly three keyword tokens
        let with_time_zone = rest.keyword() == Some(Keyword::With)
            && rest.peek(1).is_keyword(Keyword::Time)
            && rest.peek(2).is_keyword(Keyword::Zone);
        if with_time_zone {
            rest = rest.tail().tail().tail();
        }

        let text = match rest.kind() {
            TokenKind::Literal(Value::Text(text)) => text,
            _ => {
                return Err(rest
                    .error(ErrorCode::ExpectedTokenType)
                    .with("expected", "time string"))
            }
        };
        let parts = match parse_time_parts(text) {
            Some(parts) => parts,
            None => {
                return Err(rest
                    .error(ErrorCode::InvalidTimeString)
                    .with("value", text.clone()))
            }
        };

        let (precision, precision_span) = match &given_precision {
            Some((precision, token)) => (*precision, token.span),
            None => (parts.frac_digits, rest.head().span),
        };
        if precision > 9 {
            return rest.err(ErrorCode::InvalidPrecisionForTime);
        }

        let atom = ParseNode::atom(NodeKind::Atom, rest.head().clone(), rest.tail());
        let remaining = atom.remaining;
        let precision_node = ParseNode::atom(
            NodeKind::Precision,
            precision_token(precision, precision_span),
            remaining,
        );
        let kind = if with_time_zone {
            NodeKind::TimeWithTimeZone
        } else {
            NodeKind::Time
        };
        Ok(ParseNode::new(
            kind,
            Some(time_token),
            vec![atom, precision_node],
            remaining,
        ))
    }
}

fn precision_token(precision: u32, span: Span) -> Token {
    Token::new(TokenKind::Literal(Value::Integer(precision as i64)), span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parts() {
        assert_eq!(parse_date_parts("2021-02-28"), Some((2021, 2, 28)));
        assert_eq!(parse_date_parts("2021-02-29"), None);
        assert_eq!(parse_date_parts("2020-02-29"), Some((2020, 2, 29)));
        assert_eq!(parse_date_parts("+99999-01-01"), None);
        assert_eq!(parse_date_parts("2021-1-1"), None);
    }

    #[test]
    fn time_parts() {
        let parts = parse_time_parts("23:59:59.125").unwrap();
        assert_eq!(parts.hour, 23);
        assert_eq!(parts.nanos, 125_000_000);
        assert_eq!(parts.frac_digits, 3);
        assert_eq!(parts.tz_minutes, None);

        let parts = parse_time_parts("10:00:00-05:30").unwrap();
        assert_eq!(parts.tz_minutes, Some(-330));

        assert_eq!(parse_time_parts("24:00:00"), None);
        assert_eq!(parse_time_parts("10:61:00"), None);
        assert_eq!(parse_time_parts("10:00:00+19:00"), None);
        assert_eq!(parse_time_parts("10:00"), None);
    }
}
