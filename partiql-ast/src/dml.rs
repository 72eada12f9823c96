use crate::expr::Expr;
use crate::meta::Metas;
use crate::query::FromSource;
use crate::types::SymbolName;

/// A data-manipulation statement: an ordered list of operations plus the
/// optional FROM source, WHERE filter and RETURNING clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataManipulation {
    /// The operations, in source order.
    pub ops: Vec<DmlOp>,
    /// The target source of the legacy `UPDATE`/`FROM`/`DELETE` forms.
    pub from: Option<FromSource>,
    /// `WHERE` filter.
    pub where_clause: Option<Box<Expr>>,
    /// `RETURNING` clause.
    pub returning: Option<Returning>,
    /// Node metadata.
    pub metas: Metas,
}

/// One data-manipulation operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DmlOp {
    /// `INSERT INTO <target> <values>`
    Insert(Insert),
    /// `INSERT INTO <target> VALUE <expr> [AT <pos>] [ON CONFLICT ...]`
    InsertValue(InsertValue),
    /// One assignment of a `SET`/`UPDATE` list.
    Set(Assignment),
    /// `REMOVE <target>`
    Remove(Remove),
    /// `DELETE`
    Delete,
}

/// The `INSERT INTO <target> <values>` operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insert {
    /// The target path.
    pub target: Expr,
    /// The inserted collection.
    pub values: Expr,
}

/// The `INSERT INTO <target> VALUE <expr>` operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsertValue {
    /// The target path.
    pub target: Expr,
    /// The inserted value.
    pub value: Expr,
    /// The `AT` position.
    pub position: Option<Expr>,
    /// The `ON CONFLICT` clause.
    pub on_conflict: Option<OnConflict>,
}

/// One `<target> = <expr>` assignment.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// The assigned path.
    pub target: Expr,
    /// The assigned value.
    pub value: Expr,
}

/// The `REMOVE <target>` operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Remove {
    /// The removed path.
    pub target: Expr,
}

/// The `ON CONFLICT WHERE <expr> <action>` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OnConflict {
    /// The conflict condition.
    pub condition: Expr,
    /// What to do on conflict.
    pub action: ConflictAction,
}

/// Conflict actions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictAction {
    /// `DO NOTHING`
    DoNothing,
}

/// The `RETURNING` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Returning {
    /// The returned elements, in source order.
    pub elems: Vec<ReturningElem>,
}

/// One `RETURNING` element.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturningElem {
    /// Which rows and versions are returned.
    pub mapping: ReturningMapping,
    /// What is projected for each returned row.
    pub column: ColumnComponent,
}

/// `(MODIFIED | ALL) (OLD | NEW)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum ReturningMapping {
    ModifiedOld,
    ModifiedNew,
    AllOld,
    AllNew,
}

impl ReturningMapping {
    /// Returns the normalized keyword text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturningMapping::ModifiedOld => "modified_old",
            ReturningMapping::ModifiedNew => "modified_new",
            ReturningMapping::AllOld => "all_old",
            ReturningMapping::AllNew => "all_new",
        }
    }
}

/// The projected column of a `RETURNING` element.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnComponent {
    /// `*`
    Wildcard,
    /// A path of at most two components.
    Expr(Expr),
}

/// A data-definition statement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ddl {
    /// The operation.
    pub op: DdlOp,
    /// Node metadata.
    pub metas: Metas,
}

/// Data-definition operations.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DdlOp {
    /// `CREATE TABLE <name>`
    CreateTable {
        /// The table name.
        name: SymbolName,
    },
    /// `DROP TABLE <name>`
    DropTable {
        /// The table name.
        name: SymbolName,
    },
    /// `CREATE INDEX ON <table> (<key>, ...)`
    CreateIndex {
        /// The indexed table.
        table: SymbolName,
        /// The key paths.
        keys: Vec<Expr>,
    },
    /// `DROP INDEX <index> ON <table>`
    DropIndex {
        /// The index name.
        index: SymbolName,
        /// The indexed table.
        table: SymbolName,
    },
}
