//! Schema tooling for the NBT tag-typed tree format: a shared schema IR
//! with three consumers — a validation-schema backend, a type-declaration
//! backend, and a prose-markup parser that recovers schemas from wiki-style
//! documentation.

pub mod catalog;
pub mod cli;
pub mod decl;
pub mod error;
pub mod markup;
pub mod path_de;
pub mod resolve;
pub mod schema;
pub mod validator;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use schema::{Schema, SchemaNode, TagKind};
