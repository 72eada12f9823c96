use core::fmt;
use std::collections::BTreeMap;

use partiql_core::Position;
use partiql_lexer::LexerError;

/// The closed set of parser error codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The input could not be tokenized.
    #[error("invalid token")]
    Lexical,
    /// A term was required and the head token cannot start one.
    #[error("expected expression")]
    ExpectedExpression,
    /// A type name was required.
    #[error("expected type name")]
    ExpectedTypeName,
    /// `(` was required.
    #[error("expected left parenthesis")]
    ExpectedLeftParen,
    /// `)` was required.
    #[error("expected right parenthesis")]
    ExpectedRightParen,
    /// `AS` was required.
    #[error("expected AS")]
    ExpectedAs,
    /// `WHEN` was required.
    #[error("expected WHEN")]
    ExpectedWhen,
    /// `WHERE` was required.
    #[error("expected WHERE")]
    ExpectedWhere,
    /// `DO NOTHING` was required after `ON CONFLICT WHERE <expr>`.
    #[error("expected conflict action")]
    ExpectedConflictAction,
    /// A `RETURNING` mapping was required.
    #[error("expected RETURNING mapping")]
    ExpectedReturningClause,
    /// A comma (or the closing delimiter) was required in an argument list.
    #[error("expected argument delimiter")]
    ExpectedArgumentDelimiter,
    /// A specific keyword was required; carried in the `keyword` property.
    #[error("expected keyword")]
    ExpectedKeyword,
    /// A specific token type was required; carried in the `expected` property.
    #[error("expected token")]
    ExpectedTokenType,
    /// An identifier was required after `AS`/`AT`/`BY`.
    #[error("expected identifier for alias")]
    ExpectedIdentifierForAlias,
    /// A path component was malformed for the current path mode.
    #[error("invalid path component")]
    InvalidPathComponent,
    /// `*` appeared in a select list alongside other items.
    #[error("asterisk is not alone in select list")]
    AsteriskIsNotAloneInSelectList,
    /// `[*]` (or a non-trailing `.*`) appeared in a select-list path.
    #[error("cannot mix [] and * in select list")]
    CannotMixWildcardsInSelectList,
    /// A literal appeared as a `GROUP BY` item.
    #[error("unsupported literal in GROUP BY")]
    UnsupportedLiteralsGroupBy,
    /// An aggregate was called with other than one argument.
    #[error("non-unary aggregate function call")]
    NonUnaryAggregateFunctionCall,
    /// `*` was passed to a call that does not accept it.
    #[error("unsupported call with *")]
    UnsupportedCallWithStar,
    /// A type was parameterized with the wrong number of arguments.
    #[error("cast arity mismatch")]
    CastArityMismatch,
    /// A type parameter was not an unsigned integer literal.
    #[error("invalid type parameter")]
    InvalidTypeParameter,
    /// A `TIME` precision was out of the 0-9 range.
    #[error("invalid precision for TIME")]
    InvalidPrecisionForTime,
    /// A `DATE` literal string failed validation.
    #[error("invalid DATE string")]
    InvalidDateString,
    /// A `TIME` literal string failed validation.
    #[error("invalid TIME string")]
    InvalidTimeString,
    /// `@` was not followed by an identifier.
    #[error("missing identifier after @")]
    MissingIdentifierAfterAt,
    /// A keyword appeared where it cannot.
    #[error("unexpected keyword")]
    UnexpectedKeyword,
    /// An operator appeared where it cannot.
    #[error("unexpected operator")]
    UnexpectedOperator,
    /// A statement-level construct appeared in a nested position.
    #[error("unexpected term")]
    UnexpectedTerm,
    /// A token appeared where it cannot.
    #[error("unexpected token")]
    UnexpectedToken,
    /// Tokens followed the statement-terminating semicolon.
    #[error("unexpected token after semicolon")]
    UnexpectedTokenAfterSemicolon,
    /// A join keyword sequence was malformed.
    #[error("malformed join")]
    MalformedJoin,
    /// Syntactically valid-looking input the parser does not support.
    #[error("unsupported syntax")]
    UnsupportedSyntax,
    /// `SET`/`UPDATE` without an assignment.
    #[error("missing SET assignment")]
    MissingSetAssignment,
    /// `EXEC` without a procedure name.
    #[error("no stored procedure provided")]
    NoStoredProcedureProvided,
    /// The parse tree violated an internal structural contract. This is a
    /// parser bug, never a user error.
    #[error("malformed parse tree")]
    MalformedParseTree,
    /// The caller-supplied cancellation token fired.
    #[error("interrupted")]
    Interrupted,
}

/// Parser error: a fixed code, the source position of the offending token
/// when one was available, and a property map with code-specific context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserError {
    /// The error code.
    pub code: ErrorCode,
    /// Where the parse failed.
    pub position: Option<Position>,
    /// Additional key/value context (`expected`, `actual`, `keyword`, ...).
    pub context: BTreeMap<&'static str, String>,
}

impl ParserError {
    /// Creates an error without a position.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            position: None,
            context: BTreeMap::new(),
        }
    }

    /// Creates an error at the given position.
    pub fn at(code: ErrorCode, position: Position) -> Self {
        Self {
            code,
            position: Some(position),
            context: BTreeMap::new(),
        }
    }

    /// Attaches a context property.
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.insert(key, value.into());
        self
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for (key, value) in &self.context {
            write!(f, ", {}: {}", key, value)?;
        }
        if let Some(position) = &self.position {
            write!(f, " at {}", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {}

impl From<LexerError> for ParserError {
    fn from(err: LexerError) -> Self {
        ParserError::at(ErrorCode::Lexical, err.position).with("message", err.message)
    }
}
