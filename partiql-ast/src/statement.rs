use crate::dml::{DataManipulation, Ddl};
use crate::expr::{Exec, Expr};

/// A top-level statement, the public face of a parsed expression tree.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// A query (or any plain expression).
    Query(Expr),
    /// A data-manipulation statement.
    Dml(Box<DataManipulation>),
    /// A data-definition statement.
    Ddl(Ddl),
    /// A stored-procedure call.
    Exec(Exec),
}

impl From<Expr> for Statement {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Dml(dml) => Statement::Dml(dml),
            Expr::Ddl(ddl) => Statement::Ddl(ddl),
            Expr::Exec(exec) => Statement::Exec(exec),
            other => Statement::Query(other),
        }
    }
}
