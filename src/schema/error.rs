//! Validation error taxonomy.
//!
//! Errors are collected per document and never aggregated across the tree;
//! their order follows the order fields are read, so identical input always
//! yields the identical list.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Dot/bracket path to a field inside a document (`sizes[0].url`).
///
/// The empty path denotes the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// A root that already carries a name, e.g. `sizes` for `sizes.json`.
    pub fn named(root: &str) -> Self {
        Self(root.to_string())
    }

    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{idx}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<document>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The constraint a value violated.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    #[error("unknown field")]
    UnknownField,
    #[error("missing required field")]
    MissingField,
    #[error("must not be null")]
    NullNotAllowed,
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("longer than {max} characters ({len})")]
    TooLong { max: usize, len: usize },
    #[error("{value:?} is not a valid {what}")]
    Pattern { what: &'static str, value: String },
    #[error("matches no arm of {expected} (found {found})")]
    UnionMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("must contain at least one entry")]
    EmptyList,
    #[error("{name:?} is not a known trait")]
    UnknownTrait { name: String },
    #[error("{value:?} is not an http or https URL")]
    NotHttpUrl { value: String },
    #[error("{value} must be greater than zero")]
    NotPositive { value: f64 },
    #[error("{value} is not an integer")]
    NotInteger { value: String },
}

/// One violation at one field.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("{path}: {rule}")]
pub struct ValidationError {
    pub path: FieldPath,
    #[serde(flatten)]
    pub rule: Rule,
}

/// All violations found in a single document, in discovery order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Violations reported at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.0.iter().filter(move |err| err.path.as_str() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_render_keys_and_indices() {
        let path = FieldPath::named("sizes")
            .index(2)
            .key("purchase_links")
            .index(0)
            .key("url");
        assert_eq!(path.as_str(), "sizes[2].purchase_links[0].url");
        assert_eq!(FieldPath::root().key("name").as_str(), "name");
        assert_eq!(FieldPath::root().to_string(), "<document>");
    }

    #[test]
    fn errors_serialize_with_rule_tag() {
        let err = ValidationError {
            path: FieldPath::root().key("color_hex"),
            rule: Rule::Pattern {
                what: "hex color",
                value: "#GG0000".into(),
            },
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["path"], "color_hex");
        assert_eq!(json["rule"], "pattern");
        assert_eq!(json["value"], "#GG0000");
        assert_eq!(
            err.to_string(),
            "color_hex: \"#GG0000\" is not a valid hex color"
        );
    }
}
