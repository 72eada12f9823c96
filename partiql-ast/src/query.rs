use crate::expr::Expr;
use crate::meta::Metas;
use crate::types::{SetQuantifier, SymbolName};

/// A `SELECT` (or `PIVOT`) query with its clauses.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Select {
    /// `ALL` (default) or `DISTINCT`.
    pub quantifier: SetQuantifier,
    /// What the query projects.
    pub projection: Projection,
    /// The FROM source tree.
    pub from: Option<FromSource>,
    /// `LET` bindings.
    pub let_clause: Option<Let>,
    /// `WHERE` filter.
    pub where_clause: Option<Box<Expr>>,
    /// `GROUP BY` clause.
    pub group_by: Option<GroupBy>,
    /// `HAVING` filter.
    pub having: Option<Box<Expr>>,
    /// `ORDER BY` clause.
    pub order_by: Option<OrderBy>,
    /// `LIMIT` expression.
    pub limit: Option<Box<Expr>>,
    /// Node metadata.
    pub metas: Metas,
}

/// The projection of a query.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Projection {
    /// `SELECT <item>, ...`
    List(Vec<SelectItem>),
    /// `SELECT VALUE <expr>`
    Value(Box<Expr>),
    /// `PIVOT <value> AT <name>`
    Pivot {
        /// The pivoted value expression.
        value: Box<Expr>,
        /// The attribute-name expression.
        at: Box<Expr>,
    },
}

/// One item of a projection list.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectItem {
    /// An expression with an optional alias.
    Expr {
        /// The projected expression.
        expr: Expr,
        /// The `AS` alias.
        alias: Option<SymbolName>,
    },
    /// A `*` (expr `None`) or trailing `<path>.*` (expr `Some`).
    ProjectAll {
        /// The path the star projects from, absent for a bare `*`.
        expr: Option<Expr>,
    },
}

/// The `LET` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Let {
    /// The bindings, in source order.
    pub bindings: Vec<LetBinding>,
}

/// One `LET` binding, `<expr> AS <name>`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LetBinding {
    /// The bound expression.
    pub expr: Expr,
    /// The binding name.
    pub name: SymbolName,
}

/// The `AS` / `AT` / `BY` aliases a FROM source may carry.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aliases {
    /// The `AS` (or implicit) alias.
    pub as_alias: Option<SymbolName>,
    /// The `AT` alias.
    pub at_alias: Option<SymbolName>,
    /// The `BY` alias.
    pub by_alias: Option<SymbolName>,
}

/// A node of the FROM source tree.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FromSource {
    /// An expression source with its aliases.
    Expr {
        /// The source expression.
        expr: Box<Expr>,
        /// The source aliases.
        aliases: Aliases,
    },
    /// `UNPIVOT <expr>` with its aliases.
    Unpivot {
        /// The unpivoted expression.
        expr: Box<Expr>,
        /// The source aliases.
        aliases: Aliases,
    },
    /// A join of two sources.
    Join(Box<Join>),
}

/// Join kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

/// A join; cross joins carry a synthesized `TRUE` condition.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Join {
    /// The join kind.
    pub kind: JoinKind,
    /// The left source.
    pub left: FromSource,
    /// The right source.
    pub right: FromSource,
    /// The join condition.
    pub on: Expr,
    /// Node metadata; implicit comma joins set `implicit_cross_join`.
    pub metas: Metas,
}

/// `FULL` (the default) or `PARTIAL` grouping.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupingStrategy {
    /// `GROUP BY`
    Full,
    /// `GROUP PARTIAL BY`
    Partial,
}

/// One `GROUP BY` item with its optional alias.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupByItem {
    /// The grouping expression.
    pub expr: Expr,
    /// The `AS` alias.
    pub alias: Option<SymbolName>,
}

/// The `GROUP [PARTIAL] BY ... [GROUP AS <name>]` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupBy {
    /// Full or partial grouping.
    pub strategy: GroupingStrategy,
    /// The grouping items.
    pub items: Vec<GroupByItem>,
    /// The `GROUP AS` collection name.
    pub group_as: Option<SymbolName>,
}

/// `ASC` or `DESC`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum OrderingSpec {
    Asc,
    Desc,
}

/// One `ORDER BY` sort specification.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortSpec {
    /// The sort expression.
    pub expr: Expr,
    /// The explicit ordering, if any.
    pub ordering: Option<OrderingSpec>,
}

/// The `ORDER BY` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderBy {
    /// The sort specifications, in source order.
    pub specs: Vec<SortSpec>,
}

/// A `WITH [RECURSIVE]` query.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WithQuery {
    /// Whether `RECURSIVE` was given.
    pub recursive: bool,
    /// The bindings, in source order.
    pub bindings: Vec<WithBinding>,
    /// The final query the bindings scope over.
    pub query: Expr,
    /// Node metadata.
    pub metas: Metas,
}

/// One `WITH` binding, `<name> AS [NOT] MATERIALIZED (<query>)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WithBinding {
    /// The binding name.
    pub name: SymbolName,
    /// False only under explicit `NOT MATERIALIZED`.
    pub materialized: bool,
    /// The bound query.
    pub query: Expr,
}
