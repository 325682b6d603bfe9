//! Per-level results and failures.

use crate::schema::ValidationErrors;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single document was left out.
#[derive(Clone, Debug, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    #[error("unreadable: {0}")]
    Read(String),
    #[error("malformed JSON: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("variant has no sizes.json")]
    MissingSizes,
    #[error("disagrees with published schema: {}", .0.join("; "))]
    Schema(Vec<String>),
    #[error("duplicate store id '{0}'")]
    DuplicateStore(String),
}

/// A document that was present but could not be accepted.
#[derive(Clone, Debug, Error, Serialize)]
#[error("{}: {kind}", .path.display())]
pub struct DocumentFailure {
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: FailureKind,
}

impl DocumentFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn read(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        Self::new(path, FailureKind::Read(err.to_string()))
    }
}

/// Errors that stop a catalog operation outright.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog id {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },
    #[error("listing {}: {source}", .path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Document(#[from] DocumentFailure),
    #[error("{}", render_failures(.0))]
    Documents(Vec<DocumentFailure>),
}

impl CatalogError {
    /// A single failure stays [`CatalogError::Document`]; several are kept together.
    pub(crate) fn from_failures(mut failures: Vec<DocumentFailure>) -> Self {
        if failures.len() == 1 {
            if let Some(failure) = failures.pop() {
                return Self::Document(failure);
            }
        }
        Self::Documents(failures)
    }
}

fn render_failures(failures: &[DocumentFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated entity and the directory it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    /// Directory name, the entity's identity in the tree.
    pub id: String,
    /// Path of the document the entity was decoded from.
    pub path: PathBuf,
    pub value: T,
}

/// Every entity of one catalog level that validated, plus the documents that
/// did not.
#[derive(Clone, Debug)]
pub struct Listing<T> {
    pub entries: Vec<Entry<T>>,
    pub failures: Vec<DocumentFailure>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Listing<T> {
    /// True when no document was omitted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.value)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.value)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }
}

impl<T: Serialize> Listing<T> {
    /// `{"<key>": [...]}` with the validated entities in directory order.
    ///
    /// Failures are not part of the payload; check [`Listing::is_complete`]
    /// and report [`Listing::failures`] alongside it.
    pub fn payload(&self, key: &str) -> serde_json::Result<Value> {
        let items = self
            .values()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let mut wrapper = Map::new();
        wrapper.insert(key.to_string(), Value::Array(items));
        Ok(Value::Object(wrapper))
    }
}
