//! # partiql-core
//!
//! partiql-core is a core library with the token and operator types shared
//! between the PartiQL lexer and parser.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod keyword;
pub mod operator;
mod token;

pub use self::{
    keyword::Keyword,
    token::{DatePart, Operator, Position, Span, Token, TokenKind, TrimSpec, Value},
};
