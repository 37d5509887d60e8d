//! Type-declaration backend: IR → structural type-declaration text.
//!
//! The heavy lifting is split across submodules so the algorithmic core is
//! reusable regardless of the emitted syntax:
//! - [`shape`] — target-agnostic structural description;
//! - [`print`] — the concrete (TypeScript-flavored) printer;
//! - [`doc`]   — doc-comment synthesis.
//!
//! Unlike the validator backend, unresolvable references here degrade to an
//! unconstrained placeholder: declaration generation is exploratory and an
//! incomplete catalog should still produce usable output.

pub mod doc;
pub mod print;
pub mod shape;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::schema::{SchemaNode, TagKind};

#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Substitute referenced shapes in place; when false (the default),
    /// references stay symbolic names pointing at sibling declarations.
    pub inline_references: bool,
    /// Lift tagged-union branches into separately emitted helper
    /// declarations with a run-scoped numbering suffix.
    pub extract_helpers: bool,
    /// Append a permissive index signature to compounds that declare no
    /// extras policy of their own.
    pub permissive_extras: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            inline_references: false,
            extract_helpers: false,
            permissive_extras: false,
        }
    }
}

/// Generate the declaration for a named catalog root.
///
/// The invalid-top-level rule is checked here, once, before any recursive
/// work: non-fragment roots must be compounds.
pub fn generate(name: &str, catalog: &Catalog, opts: &Options) -> Result<String> {
    let named = catalog.resolve_name(name)?;
    if !named.fragment && named.node.single_kind() != Some(TagKind::Compound) {
        return Err(Error::InvalidRoot(named.id.clone()));
    }
    generate_node(&named.node, &named.id, catalog, opts)
}

/// Generate a declaration for an arbitrary node (markup-derived trees are
/// not in the catalog yet).
pub fn generate_node(
    node: &SchemaNode,
    name: &str,
    catalog: &Catalog,
    opts: &Options,
) -> Result<String> {
    let mut builder = shape::Builder::new(catalog, opts, name);
    let root = builder.root_shape(node)?;
    let mut out = print::declaration(name, &root, &doc::doc_lines(node));
    for helper in &builder.helpers {
        out.push_str("\n\n");
        out.push_str(&print::declaration(&helper.name, &helper.shape, &[]));
    }
    Ok(out)
}
