//! Crate-wide error type.
//!
//! Recursive conversion helpers never catch; everything propagates with `?`
//! up to the backend entry points. The two backends intentionally disagree on
//! missing references: the validator backend is fatal, the declaration
//! backend degrades at its combinator sites (see `decl::shape`).

use crate::schema::TagKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `$ref` (or alias chain) named something the catalog does not contain.
    #[error("unresolved reference: no catalog entry named {0:?}")]
    MissingReference(String),

    /// An alias chain loops without ever reaching a named schema.
    #[error("alias chain starting at {0:?} never terminates")]
    AliasCycle(String),

    /// A `$ref` cycle between named schemas, detected by the visited set.
    #[error("reference cycle through catalog entry {0:?}")]
    ReferenceCycle(String),

    /// The validator dispatcher enumerates exactly the convertible kinds.
    #[error("unsupported tag kind {0:?} in validator conversion")]
    UnsupportedKind(TagKind),

    /// Non-fragment roots must be compounds; checked once before recursing.
    #[error("top-level schema {0:?} is not a compound and not marked as a fragment")]
    InvalidRoot(String),

    /// Catalog load/validation failures (bad JSON, required ∉ properties, …).
    #[error("catalog: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, Error>;
