//! # partiql-ast
//!
//! partiql-ast is the typed abstract syntax tree emitted by the PartiQL
//! parser, plus the fixed V0 s-expression serialization.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod dml;
mod expr;
mod meta;
mod query;
mod sexp;
mod statement;
mod types;

pub use self::{dml::*, expr::*, meta::*, query::*, sexp::*, statement::*, types::*};

// Literal payloads flow through the AST unchanged.
pub use partiql_core::Value;
