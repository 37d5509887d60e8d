//! Minimal CLI: catalog → (validator | declarations), markup → catalog
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::Catalog;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate validation schemas or type declarations from an NBT schema
/// catalog, or parse wiki-style markup into catalog entries
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit the JSON-schema-shaped validator for a catalog root
    Validator(ValidatorOut),
    /// emit type declarations for one or all catalog roots
    Declarations(DeclarationsOut),
    /// parse prose markup files into a schema catalog
    Parse(ParseOut),
}

#[derive(Args, Debug, Clone)]
struct CatalogSettings {
    /// schema catalog .json file
    #[arg(long, short)]
    catalog: PathBuf,

    /// named root to generate for (all non-fragment roots if omitted)
    #[arg(long, short)]
    root: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct ValidatorOut {
    #[command(flatten)]
    catalog_settings: CatalogSettings,

    /// keep references symbolic (`$ref` pointers) instead of inlining them
    #[arg(long, default_value_t = false)]
    symbolic_refs: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DeclarationsOut {
    #[command(flatten)]
    catalog_settings: CatalogSettings,

    /// substitute referenced shapes in place instead of naming them
    #[arg(long, default_value_t = false)]
    inline_refs: bool,

    /// lift tagged-union branches into numbered helper declarations
    #[arg(long, default_value_t = false)]
    extract_helpers: bool,

    /// append a permissive index signature to compounds with no extras policy
    #[arg(long, default_value_t = false)]
    permissive_extras: bool,

    /// output .d.ts file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    /// one or more markup inputs; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// category prefix for section keys (entity, block, item, component)
    #[arg(long)]
    category: Option<String>,

    /// output catalog .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CatalogSettings {
    fn load(&self) -> anyhow::Result<Catalog> {
        let source = std::fs::read_to_string(&self.catalog)
            .with_context(|| format!("failed to read catalog file {}", self.catalog.display()))?;
        let catalog = Catalog::from_json_str(&source)
            .with_context(|| format!("failed to parse catalog {}", self.catalog.display()))?;
        if let Err(violations) = catalog.validate() {
            for violation in violations {
                eprintln!("catalog warning: {violation}");
            }
        }
        Ok(catalog)
    }

    /// Roots to generate for: the requested one, or every non-fragment entry.
    fn roots<'a>(&'a self, catalog: &'a Catalog) -> Vec<String> {
        match &self.root {
            Some(root) => vec![root.clone()],
            None => catalog
                .names()
                .filter(|name| {
                    catalog
                        .resolve_name(name)
                        .map(|named| !named.fragment)
                        .unwrap_or(false)
                })
                .map(str::to_string)
                .collect(),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Validator(target) => {
                let catalog = target.catalog_settings.load()?;
                let opts = crate::validator::ValidatorOptions {
                    inline_references: !target.symbolic_refs,
                };
                let mut out = serde_json::Map::new();
                for root in target.catalog_settings.roots(&catalog) {
                    let schema = crate::validator::validator_for(&root, &catalog, opts)
                        .with_context(|| format!("validator generation failed for {root}"))?;
                    out.insert(root, schema);
                }
                // a single requested root prints bare, not keyed
                let value = if target.catalog_settings.root.is_some() {
                    out.into_iter().next().map(|(_, v)| v).unwrap_or_default()
                } else {
                    serde_json::Value::Object(out)
                };
                let source = serde_json::to_string_pretty(&value)?;
                write_output(target.out.as_deref(), &source)
            }
            Command::Declarations(target) => {
                let catalog = target.catalog_settings.load()?;
                let opts = crate::decl::Options {
                    inline_references: target.inline_refs,
                    extract_helpers: target.extract_helpers,
                    permissive_extras: target.permissive_extras,
                };
                let mut declarations = Vec::new();
                for root in target.catalog_settings.roots(&catalog) {
                    let decl = crate::decl::generate(&root, &catalog, &opts)
                        .with_context(|| format!("declaration generation failed for {root}"))?;
                    declarations.push(decl);
                }
                let mut source = declarations.join("\n\n");
                source.push('\n');
                write_output(target.out.as_deref(), &source)
            }
            Command::Parse(target) => {
                let source_paths = resolve_file_path_patterns(&target.input)
                    .map_err(|e| anyhow::anyhow!("failed to resolve input file paths: {e}"))?;
                let mut out = serde_json::Map::new();
                for source_path in source_paths {
                    let text = std::fs::read_to_string(&source_path).with_context(|| {
                        format!("failed to read markup file {}", source_path.display())
                    })?;
                    for section in
                        crate::markup::parse_sections(&text, target.category.as_deref())
                    {
                        let rendered = serde_json::to_value(&section.schema)?;
                        out.insert(section.key, crate::schema::canonicalize(&rendered));
                    }
                }
                let source = serde_json::to_string_pretty(&serde_json::Value::Object(out))?;
                write_output(target.out.as_deref(), &source)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&std::path::Path>, source: &str) -> anyhow::Result<()> {
    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(out, source)
            .with_context(|| format!("failed to write {}", out.display()))?;
    } else {
        println!("{source}");
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
