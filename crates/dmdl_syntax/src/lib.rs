//! Syntax layer for DMDL.
//!
//! Lexing and parsing live outside this workspace; this crate only defines
//! the already-parsed model definitions the semantic analyzer consumes:
//! - `ast`: Abstract syntax tree types

pub mod ast;

pub use ast::*;
