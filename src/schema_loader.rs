//! Published JSON Schemas for catalog documents.
//!
//! The repository ships one draft-07 schema per document type under
//! `schemas/`. They are the contract handed to third-party consumers, so the
//! validator can cross-check the typed decoding against them: a document the
//! typed view accepts but the published schema rejects (or the reverse) means
//! the two have drifted.

use crate::catalog::DocumentKind;
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Compiled schemas keyed by document kind.
pub struct PublishedSchemas {
    compiled: BTreeMap<DocumentKind, JSONSchema>,
}

impl PublishedSchemas {
    /// The `schemas/` directory shipped with the crate.
    pub fn bundled_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas")
    }

    /// Load and compile every `<kind>_schema.json` under `dir`.
    ///
    /// All six schemas must be present; a partial set would silently skip
    /// checks for the missing kinds.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut compiled = BTreeMap::new();
        for kind in DocumentKind::ALL {
            let path = dir.join(kind.schema_file());
            compiled.insert(kind, compile_schema(&path)?);
        }
        Ok(Self { compiled })
    }

    /// Validate `value` against the schema for `kind`.
    ///
    /// On failure returns one message per violation, prefixed with the JSON
    /// pointer of the offending instance.
    pub fn check(&self, kind: DocumentKind, value: &Value) -> Result<(), Vec<String>> {
        let Some(schema) = self.compiled.get(&kind) else {
            return Ok(());
        };
        match schema.validate(value) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|err| format!("{}: {}", pointer_label(&err.instance_path.to_string()), err))
                .collect()),
        }
    }
}

fn compile_schema(path: &Path) -> Result<JSONSchema> {
    let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
    let schema: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing schema {}", path.display()))?;
    if !schema.is_object() {
        bail!("schema {} must be a JSON object", path.display());
    }
    // Compile errors borrow the schema value, so render them before it drops.
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|err| anyhow!("compiling schema {}: {err}", path.display()))
}

fn pointer_label(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}
