use partiql_core::Position;

/// Lexer error
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {position}")]
pub struct LexerError {
    /// What went wrong.
    pub message: String,
    /// Where the offending character sits.
    pub position: Position,
}

impl LexerError {
    pub(crate) fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}
