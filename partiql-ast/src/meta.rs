use partiql_core::{Position, Span};

/// The source location a node was parsed from.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    /// 1-based line.
    pub line: u64,
    /// 1-based column.
    pub column: u64,
}

impl SourceLocation {
    /// Creates a new source location.
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl From<Position> for SourceLocation {
    fn from(position: Position) -> Self {
        Self::new(position.line, position.column)
    }
}

impl From<Span> for SourceLocation {
    fn from(span: Span) -> Self {
        Self::new(span.line, span.column)
    }
}

/// Metadata attached to every AST node.
///
/// Besides the source location this carries the two flags that downstream
/// lowering passes need: `legacy_logical_not` marks a `NOT` that the parser
/// synthesized from a negated surface form (`x NOT LIKE y`, `x IS NOT y`, …)
/// rather than a literal `NOT` keyword, and `implicit_cross_join` marks a
/// join produced by a bare comma in the FROM clause.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metas {
    /// Where the node came from, when a token was available.
    pub location: Option<SourceLocation>,
    /// The node is a `NOT` rewritten from a negated operator form.
    pub legacy_logical_not: bool,
    /// The node is a join synthesized from a comma delimiter.
    pub implicit_cross_join: bool,
}

impl Metas {
    /// Metas with no information, for synthesized nodes.
    pub const NONE: Metas = Metas {
        location: None,
        legacy_logical_not: false,
        implicit_cross_join: false,
    };

    /// Creates metas carrying only a source location.
    pub fn at(location: impl Into<SourceLocation>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::NONE
        }
    }

    /// Returns a copy with the legacy-logical-not flag set.
    pub fn with_legacy_logical_not(mut self) -> Self {
        self.legacy_logical_not = true;
        self
    }

    /// Returns a copy with the implicit-cross-join flag set.
    pub fn with_implicit_cross_join(mut self) -> Self {
        self.implicit_cross_join = true;
        self
    }
}
