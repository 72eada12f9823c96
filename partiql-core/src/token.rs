use core::fmt;

use crate::keyword::Keyword;

/// A line/column pair, both 1-based.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// The 1-based line of the source code.
    pub line: u64,
    /// The 1-based column of the source code.
    pub column: u64,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The source region a token was scanned from.
///
/// A fused multi-word keyword carries the span of its first lexeme.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// The 1-based line the token starts on.
    pub line: u64,
    /// The 1-based column the token starts at.
    pub column: u64,
    /// The token length in characters.
    pub length: u64,
}

impl Span {
    /// Creates a new span.
    pub fn new(line: u64, column: u64, length: u64) -> Self {
        Self {
            line,
            column,
            length,
        }
    }

    /// Returns the start position of the span.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// A literal value carried by a `LITERAL` (or `NULL`/`MISSING`) token.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Untyped `NULL`.
    Null,
    /// The PartiQL `MISSING` value.
    Missing,
    /// `TRUE` or `FALSE`.
    Boolean(bool),
    /// An exact integer literal.
    Integer(i64),
    /// A non-integer (or integer-overflowing) numeric literal, kept textual.
    Decimal(String),
    /// A single-quoted string literal.
    Text(String),
    /// An opaque backtick-quoted Ion literal.
    Ion(String),
}

impl Value {
    /// Returns true if the value is a string.
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Returns true if the value is numeric.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    /// Returns true if the value is a non-negative integer.
    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self, Value::Integer(value) if *value >= 0)
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the arithmetic negation of a numeric value.
    ///
    /// Textual decimals negate by sign flipping so that no precision is lost.
    pub fn negate(&self) -> Option<Value> {
        match self {
            Value::Integer(value) => value.checked_neg().map(Value::Integer),
            Value::Decimal(text) => Some(match text.strip_prefix('-') {
                Some(rest) => Value::Decimal(rest.to_string()),
                None => Value::Decimal(format!("-{}", text)),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Missing => f.write_str("missing"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Decimal(text) => f.write_str(text),
            Value::Text(text) => write!(f, "'{}'", text),
            Value::Ion(text) => write!(f, "`{}`", text),
        }
    }
}

/// A trim specification, the first argument of `TRIM`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrimSpec {
    /// `LEADING`
    Leading,
    /// `TRAILING`
    Trailing,
    /// `BOTH`
    Both,
}

impl TrimSpec {
    /// Looks up a trim specification from its (already lowercased) text.
    pub fn from_word(word: &str) -> Option<TrimSpec> {
        match word {
            "leading" => Some(TrimSpec::Leading),
            "trailing" => Some(TrimSpec::Trailing),
            "both" => Some(TrimSpec::Both),
            _ => None,
        }
    }

    /// Returns the lowercase text.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimSpec::Leading => "leading",
            TrimSpec::Trailing => "trailing",
            TrimSpec::Both => "both",
        }
    }
}

/// A date part, used by `EXTRACT`, `DATE_ADD` and `DATE_DIFF`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    TimezoneHour,
    TimezoneMinute,
}

impl DatePart {
    /// Looks up a date part from its (already lowercased) text.
    pub fn from_word(word: &str) -> Option<DatePart> {
        match word {
            "year" => Some(DatePart::Year),
            "month" => Some(DatePart::Month),
            "day" => Some(DatePart::Day),
            "hour" => Some(DatePart::Hour),
            "minute" => Some(DatePart::Minute),
            "second" => Some(DatePart::Second),
            "timezone_hour" => Some(DatePart::TimezoneHour),
            "timezone_minute" => Some(DatePart::TimezoneMinute),
            _ => None,
        }
    }

    /// Returns the lowercase text.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
            DatePart::TimezoneHour => "timezone_hour",
            DatePart::TimezoneMinute => "timezone_minute",
        }
    }
}

/// A symbolic (non-keyword) operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// Plus `+`
    Plus,
    /// Minus `-`
    Minus,
    /// Slash `/`
    Slash,
    /// Percent `%`
    Percent,
    /// Concat `||`
    Concat,
    /// Equal `=`
    Eq,
    /// Not equal `<>` or `!=`
    NotEq,
    /// Less than `<`
    Lt,
    /// Less than or equal `<=`
    LtEq,
    /// Greater than `>`
    Gt,
    /// Greater than or equal `>=`
    GtEq,
    /// At sign `@`, the lexical scope qualifier
    AtSign,
}

impl Operator {
    /// Returns the operator symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Concat => "||",
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::AtSign => "@",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PartiQL token kind.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// A regular (case-insensitive) identifier.
    Ident(String),
    /// A double-quoted (case-sensitive) identifier.
    QuotedIdent(String),
    /// A keyword, possibly fused from several lexemes.
    Keyword(Keyword),
    /// A symbolic operator.
    Operator(Operator),
    /// A literal with its parsed value.
    Literal(Value),
    /// A backtick-quoted Ion literal, kept opaque.
    IonLiteral(String),
    /// The `NULL` keyword, lexed as its own kind.
    Null,
    /// The `MISSING` keyword, lexed as its own kind.
    Missing,
    /// `LEADING`, `TRAILING` or `BOTH`.
    TrimSpec(TrimSpec),
    /// `YEAR`, `MONTH`, ... `TIMEZONE_MINUTE`.
    DatePart(DatePart),

    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Left bracket `[`
    LeftBracket,
    /// Right bracket `]`
    RightBracket,
    /// Left curly brace `{`
    LeftCurly,
    /// Right curly brace `}`
    RightCurly,
    /// Bag opener `<<`
    LeftDoubleAngle,
    /// Bag closer `>>`
    RightDoubleAngle,

    /// Comma `,`
    Comma,
    /// Dot `.`
    Dot,
    /// Colon `:`
    Colon,
    /// Semicolon `;`
    Semicolon,
    /// Star `*`, wildcard or multiplication depending on position.
    Star,

    /// The `AS` alias keyword.
    As,
    /// The `AT` alias keyword.
    At,
    /// The `BY` keyword.
    By,
    /// The `ASC` ordering keyword.
    Asc,
    /// The `DESC` ordering keyword.
    Desc,
    /// The `FOR` keyword.
    For,

    /// A positional parameter `?` with its 1-based ordinal.
    QuestionMark(u32),
    /// End of the token stream.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(text) => f.write_str(text),
            TokenKind::QuotedIdent(text) => write!(f, "\"{}\"", text),
            TokenKind::Keyword(keyword) => f.write_str(keyword.as_str()),
            TokenKind::Operator(op) => f.write_str(op.as_str()),
            TokenKind::Literal(value) => write!(f, "{}", value),
            TokenKind::IonLiteral(text) => write!(f, "`{}`", text),
            TokenKind::Null => f.write_str("null"),
            TokenKind::Missing => f.write_str("missing"),
            TokenKind::TrimSpec(spec) => f.write_str(spec.as_str()),
            TokenKind::DatePart(part) => f.write_str(part.as_str()),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
            TokenKind::LeftBracket => f.write_str("["),
            TokenKind::RightBracket => f.write_str("]"),
            TokenKind::LeftCurly => f.write_str("{"),
            TokenKind::RightCurly => f.write_str("}"),
            TokenKind::LeftDoubleAngle => f.write_str("<<"),
            TokenKind::RightDoubleAngle => f.write_str(">>"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::As => f.write_str("as"),
            TokenKind::At => f.write_str("at"),
            TokenKind::By => f.write_str("by"),
            TokenKind::Asc => f.write_str("asc"),
            TokenKind::Desc => f.write_str("desc"),
            TokenKind::For => f.write_str("for"),
            TokenKind::QuestionMark(_) => f.write_str("?"),
            TokenKind::Eof => f.write_str("<EOF>"),
        }
    }
}

/// A lexed token: kind plus source span.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// The token kind, carrying any payload.
    pub kind: TokenKind,
    /// The source region the token was scanned from.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the keyword of a `KEYWORD` token.
    pub fn keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(keyword) => Some(*keyword),
            _ => None,
        }
    }

    /// Returns true if the token is the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    /// Returns the literal value of a `LITERAL` (or `NULL`/`MISSING`) token.
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            TokenKind::Literal(value) => Some(value.clone()),
            TokenKind::Null => Some(Value::Null),
            TokenKind::Missing => Some(Value::Missing),
            _ => None,
        }
    }

    /// Returns the identifier text of an identifier token.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(text) | TokenKind::QuotedIdent(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the start position of the token.
    pub fn position(&self) -> Position {
        self.span.position()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_queries() {
        assert!(Value::Text("a".into()).is_text());
        assert!(Value::Integer(3).is_number());
        assert!(Value::Decimal("1.5".into()).is_number());
        assert!(Value::Integer(0).is_unsigned_integer());
        assert!(!Value::Integer(-1).is_unsigned_integer());
        assert_eq!(Value::Integer(42).as_long(), Some(42));
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
    }

    #[test]
    fn value_negation() {
        assert_eq!(Value::Integer(5).negate(), Some(Value::Integer(-5)));
        assert_eq!(
            Value::Decimal("1.5".into()).negate(),
            Some(Value::Decimal("-1.5".into()))
        );
        assert_eq!(
            Value::Decimal("-2.25".into()).negate(),
            Some(Value::Decimal("2.25".into()))
        );
        assert_eq!(Value::Text("x".into()).negate(), None);
    }
}
