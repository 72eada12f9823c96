use partiql_core::Value;

use crate::dml::{DataManipulation, Ddl};
use crate::meta::Metas;
use crate::query::{Select, WithQuery};
use crate::types::{CaseSensitivity, DataType, ScopeQualifier, SetQuantifier, SymbolName};

/// PartiQL expression type.
///
/// Statements (SELECT, DML, DDL, EXEC, WITH) are expressions in this
/// language; the parser's top-level validation is what confines them to
/// statement position.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A literal value.
    Lit(Lit),
    /// A variable reference.
    VarRef(VarRef),
    /// A positional parameter `?`.
    Param(Param),
    /// Path navigation, e.g. `a.b[0].*`.
    Path(Path),
    /// An n-ary operator call, e.g. `a + b` or `NOT a`.
    NAry(NAry),
    /// A function call.
    Call(Call),
    /// An aggregate call with set quantifier.
    CallAgg(CallAgg),
    /// A typed operation: `CAST(e AS t)` or `e IS t`.
    Typed(Typed),
    /// A searched or simple `CASE`.
    Case(Case),
    /// A list, bag or s-expression constructor.
    Seq(Seq),
    /// A struct constructor `{k: v, ...}`.
    Struct(Struct),
    /// A `DATE 'YYYY-MM-DD'` literal.
    DateLit(DateLit),
    /// A `TIME [(p)] [WITH TIME ZONE] '...'` literal.
    TimeLit(TimeLit),
    /// A `SELECT` or `PIVOT` query.
    Select(Box<Select>),
    /// A `WITH [RECURSIVE]` query.
    With(Box<WithQuery>),
    /// A data-manipulation statement.
    Dml(Box<DataManipulation>),
    /// A data-definition statement.
    Ddl(Ddl),
    /// An `EXEC` statement.
    Exec(Exec),
}

impl Expr {
    /// Returns the metadata of the node.
    pub fn metas(&self) -> &Metas {
        match self {
            Expr::Lit(node) => &node.metas,
            Expr::VarRef(node) => &node.metas,
            Expr::Param(node) => &node.metas,
            Expr::Path(node) => &node.metas,
            Expr::NAry(node) => &node.metas,
            Expr::Call(node) => &node.metas,
            Expr::CallAgg(node) => &node.metas,
            Expr::Typed(node) => &node.metas,
            Expr::Case(node) => &node.metas,
            Expr::Seq(node) => &node.metas,
            Expr::Struct(node) => &node.metas,
            Expr::DateLit(node) => &node.metas,
            Expr::TimeLit(node) => &node.metas,
            Expr::Select(node) => &node.metas,
            Expr::With(node) => &node.metas,
            Expr::Dml(node) => &node.metas,
            Expr::Ddl(node) => &node.metas,
            Expr::Exec(node) => &node.metas,
        }
    }
}

/// A literal value with metadata.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lit {
    /// The literal value.
    pub value: Value,
    /// Node metadata.
    pub metas: Metas,
}

/// A variable reference.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarRef {
    /// The referenced name.
    pub name: String,
    /// Whether the name matches case-sensitively.
    pub case: CaseSensitivity,
    /// Whether the reference is `@`-qualified.
    pub qualifier: ScopeQualifier,
    /// Node metadata.
    pub metas: Metas,
}

/// A positional parameter with its 1-based ordinal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    /// The 1-based ordinal.
    pub index: u32,
    /// Node metadata.
    pub metas: Metas,
}

/// One step of path navigation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathComponent {
    /// `.field` or `[expr]`.
    Expr {
        /// The component expression; a dot component is a string literal.
        expr: Box<Expr>,
        /// Case sensitivity of a dot component.
        case: CaseSensitivity,
    },
    /// `[*]`
    Wildcard,
    /// `.*`
    Unpivot,
}

/// Path navigation from a root expression.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    /// The navigated expression.
    pub root: Box<Expr>,
    /// The navigation steps, in source order.
    pub components: Vec<PathComponent>,
    /// Node metadata.
    pub metas: Metas,
}

/// N-ary operators.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum NAryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Not,
    Concat,
    In,
    Between,
    Like,
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl NAryOp {
    /// Returns the operator text used by the s-expression form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NAryOp::Add => "+",
            NAryOp::Sub => "-",
            NAryOp::Mul => "*",
            NAryOp::Div => "/",
            NAryOp::Mod => "%",
            NAryOp::Eq => "=",
            NAryOp::NotEq => "<>",
            NAryOp::Lt => "<",
            NAryOp::LtEq => "<=",
            NAryOp::Gt => ">",
            NAryOp::GtEq => ">=",
            NAryOp::And => "and",
            NAryOp::Or => "or",
            NAryOp::Not => "not",
            NAryOp::Concat => "||",
            NAryOp::In => "in",
            NAryOp::Between => "between",
            NAryOp::Like => "like",
            NAryOp::Union => "union",
            NAryOp::UnionAll => "union_all",
            NAryOp::Intersect => "intersect",
            NAryOp::IntersectAll => "intersect_all",
            NAryOp::Except => "except",
            NAryOp::ExceptAll => "except_all",
        }
    }
}

/// An n-ary operator call.
///
/// Unary `+`/`-`/`NOT` carry one operand, `BETWEEN` three, `LIKE` two or
/// three (with `ESCAPE`), everything else two.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NAry {
    /// The operator.
    pub op: NAryOp,
    /// The operands, in source order.
    pub operands: Vec<Expr>,
    /// Node metadata.
    pub metas: Metas,
}

/// A function call.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    /// The called function.
    pub name: SymbolName,
    /// Call arguments.
    pub args: Vec<Expr>,
    /// Node metadata.
    pub metas: Metas,
}

/// An aggregate call.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallAgg {
    /// The aggregate function.
    pub name: SymbolName,
    /// `ALL` or `DISTINCT`.
    pub quantifier: SetQuantifier,
    /// The single argument; `None` only for `COUNT(*)`.
    pub arg: Option<Box<Expr>>,
    /// Node metadata.
    pub metas: Metas,
}

/// The two typed operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedOp {
    /// `CAST(e AS t)`
    Cast,
    /// `e IS t`
    Is,
}

/// A typed operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Typed {
    /// Which operation.
    pub op: TypedOp,
    /// The operand.
    pub expr: Box<Expr>,
    /// The target (or tested) type.
    pub data_type: DataType,
    /// Node metadata.
    pub metas: Metas,
}

/// A `WHEN ... THEN ...` arm.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhenClause {
    /// The condition (or comparand in a simple CASE).
    pub condition: Expr,
    /// The result.
    pub value: Expr,
}

/// A `CASE` expression; simple when `operand` is present, searched otherwise.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Case {
    /// The comparand of a simple CASE.
    pub operand: Option<Box<Expr>>,
    /// The WHEN arms, at least one.
    pub when_clauses: Vec<WhenClause>,
    /// The ELSE result.
    pub else_clause: Option<Box<Expr>>,
    /// Node metadata.
    pub metas: Metas,
}

/// Sequence constructor kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeqKind {
    /// `[...]` or `list(...)`
    List,
    /// `<< ... >>` or `bag(...)`
    Bag,
    /// `sexp(...)`
    Sexp,
}

/// A sequence constructor.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seq {
    /// Which sequence kind.
    pub kind: SeqKind,
    /// The element expressions.
    pub items: Vec<Expr>,
    /// Node metadata.
    pub metas: Metas,
}

/// One `key: value` member of a struct constructor.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructField {
    /// The member name expression.
    pub name: Expr,
    /// The member value expression.
    pub value: Expr,
}

/// A struct constructor.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Struct {
    /// The members, in source order.
    pub fields: Vec<StructField>,
    /// Node metadata.
    pub metas: Metas,
}

/// A calendar-checked `DATE` literal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateLit {
    /// Year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Node metadata.
    pub metas: Metas,
}

/// A `TIME` literal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeLit {
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
    /// Second, 0-59.
    pub second: u32,
    /// Nanoseconds within the second.
    pub nanos: u32,
    /// Fractional-second precision, 0-9; derived from the literal when the
    /// source omits it.
    pub precision: u32,
    /// Whether the literal was declared `WITH TIME ZONE`.
    pub with_time_zone: bool,
    /// Zone offset in minutes east of UTC; present iff `with_time_zone`.
    pub tz_minutes: Option<i32>,
    /// Node metadata.
    pub metas: Metas,
}

/// An `EXEC` statement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exec {
    /// The procedure name.
    pub name: SymbolName,
    /// The procedure arguments.
    pub args: Vec<Expr>,
    /// Node metadata.
    pub metas: Metas,
}
