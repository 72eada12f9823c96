use partiql_core::{Position, Token};

use crate::error::{ErrorCode, ParserError};
use crate::view::Tokens;

/// The closed set of intermediate parse-tree node kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub(crate) enum NodeKind {
    Atom,
    CaseSensitiveAtom,
    CaseInsensitiveAtom,
    ProjectAll,
    PathWildcard,
    PathUnpivot,
    Let,
    SelectList,
    SelectValue,
    Pivot,
    Distinct,
    Recursive,
    Materialized,
    InnerJoin,
    LeftJoin,
    RightJoin,
    OuterJoin,
    From,
    FromClause,
    FromSourceJoin,
    Where,
    OrderBy,
    SortSpec,
    OrderingSpec,
    Group,
    GroupPartial,
    Having,
    Limit,
    Unpivot,
    Call,
    CallAgg,
    CallDistinctAgg,
    CallAggWildcard,
    Date,
    Time,
    TimeWithTimeZone,
    ArgList,
    AsAlias,
    AtAlias,
    ByAlias,
    Path,
    PathDot,
    PathSqb,
    Unary,
    Binary,
    Ternary,
    List,
    Bag,
    Struct,
    Member,
    Cast,
    Type,
    Case,
    When,
    Else,
    Insert,
    InsertValue,
    Remove,
    Set,
    Update,
    Delete,
    Assignment,
    Check,
    OnConflict,
    ConflictAction,
    DmlList,
    Returning,
    ReturningElem,
    ReturningMapping,
    ReturningWildcard,
    CreateTable,
    DropTable,
    DropIndex,
    CreateIndex,
    Parameter,
    Exec,
    Precision,
    With,
}

impl NodeKind {
    /// True for the join node kinds.
    pub(crate) fn is_join(&self) -> bool {
        matches!(
            self,
            NodeKind::InnerJoin | NodeKind::LeftJoin | NodeKind::RightJoin | NodeKind::OuterJoin
        )
    }

    /// True for node kinds that may only appear in statement position.
    pub(crate) fn is_top_level(&self) -> bool {
        matches!(
            self,
            NodeKind::Insert
                | NodeKind::InsertValue
                | NodeKind::Remove
                | NodeKind::Set
                | NodeKind::Update
                | NodeKind::Delete
                | NodeKind::DmlList
                | NodeKind::CreateTable
                | NodeKind::DropTable
                | NodeKind::CreateIndex
                | NodeKind::DropIndex
                | NodeKind::Exec
        )
    }

    /// True for the data-manipulation node kinds.
    pub(crate) fn is_dml(&self) -> bool {
        matches!(
            self,
            NodeKind::Insert
                | NodeKind::InsertValue
                | NodeKind::Remove
                | NodeKind::Set
                | NodeKind::Update
                | NodeKind::Delete
                | NodeKind::DmlList
        )
    }
}

/// An intermediate parse-tree node.
///
/// Nodes are immutable once produced: a sub-parser returns a new node whose
/// `remaining` view is a suffix of its input, never mutating what it was
/// given.
#[derive(Clone, Debug)]
pub(crate) struct ParseNode<'a> {
    /// The node kind.
    pub(crate) kind: NodeKind,
    /// The originating token, when one identifies the node.
    pub(crate) token: Option<Token>,
    /// Child nodes, in source order.
    pub(crate) children: Vec<ParseNode<'a>>,
    /// The unconsumed token suffix.
    pub(crate) remaining: Tokens<'a>,
}

impl<'a> ParseNode<'a> {
    pub(crate) fn new(
        kind: NodeKind,
        token: Option<Token>,
        children: Vec<ParseNode<'a>>,
        remaining: Tokens<'a>,
    ) -> Self {
        Self {
            kind,
            token,
            children,
            remaining,
        }
    }

    /// A childless node carrying one token.
    pub(crate) fn atom(kind: NodeKind, token: Token, remaining: Tokens<'a>) -> Self {
        Self::new(kind, Some(token), vec![], remaining)
    }

    /// Returns a copy-on-write node with a different remaining suffix.
    pub(crate) fn with_remaining(mut self, remaining: Tokens<'a>) -> Self {
        self.remaining = remaining;
        self
    }

    /// The position of the originating token, falling back to the first
    /// child that has one.
    pub(crate) fn position(&self) -> Option<Position> {
        match &self.token {
            Some(token) => Some(token.position()),
            None => self.children.iter().find_map(ParseNode::position),
        }
    }

    /// Builds a `malformed parse tree` error for this node.
    pub(crate) fn malformed(&self, detail: &str) -> ParserError {
        let error = match self.position() {
            Some(position) => ParserError::at(ErrorCode::MalformedParseTree, position),
            None => ParserError::new(ErrorCode::MalformedParseTree),
        };
        error.with("detail", detail)
    }
}
