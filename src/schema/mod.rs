//! Structural contract for every document in the catalog tree.
//!
//! Decoding walks a raw `serde_json::Value` and produces typed entities or a
//! complete list of violations, each tagged with the dot/bracket path of the
//! offending field (`sizes[2].purchase_links[0].url`). The same field list
//! serves two views: `Strict` for trusted catalog ingestion and `Permissive`
//! for interactive input, selected through [`SchemaView`].

pub mod entities;
pub mod error;
pub mod slicer;

pub use error::{FieldPath, Rule, ValidationError, ValidationErrors};

use crate::traits::TraitTaxonomy;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Which schema family a document is decoded against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaMode {
    /// Public read contract: closed objects, exact JSON types.
    #[default]
    Strict,
    /// Form-input contract: unknown keys dropped, numeric strings coerced,
    /// positive measurements, `false` defaults for flags.
    Permissive,
}

impl SchemaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaMode::Strict => "strict",
            SchemaMode::Permissive => "permissive",
        }
    }
}

impl fmt::Display for SchemaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "strict" => Ok(SchemaMode::Strict),
            "permissive" => Ok(SchemaMode::Permissive),
            other => Err(format!(
                "unknown schema mode '{other}' (expected strict|permissive)"
            )),
        }
    }
}

/// A schema mode paired with the trait vocabulary used to check `traits`.
#[derive(Clone, Copy, Debug)]
pub struct SchemaView<'t> {
    mode: SchemaMode,
    taxonomy: &'t TraitTaxonomy,
}

impl SchemaView<'static> {
    pub fn strict() -> Self {
        Self::new(SchemaMode::Strict, TraitTaxonomy::builtin())
    }

    pub fn permissive() -> Self {
        Self::new(SchemaMode::Permissive, TraitTaxonomy::builtin())
    }
}

impl<'t> SchemaView<'t> {
    pub fn new(mode: SchemaMode, taxonomy: &'t TraitTaxonomy) -> Self {
        Self { mode, taxonomy }
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    pub fn taxonomy(&self) -> &'t TraitTaxonomy {
        self.taxonomy
    }

    /// Decode a whole document rooted at the empty path.
    pub fn decode<T: Decode>(&self, value: &Value) -> Result<T, ValidationErrors> {
        self.decode_at(value, FieldPath::root())
    }

    /// Decode a value whose errors should be reported under `path`.
    pub fn decode_at<T: Decode>(&self, value: &Value, path: FieldPath) -> Result<T, ValidationErrors> {
        let mut cx = Context::new(*self);
        let decoded = T::decode(value, &path, &mut cx);
        cx.finish(decoded)
    }
}

/// Types that can be decoded from raw JSON through a [`SchemaView`].
///
/// Implementations report every violation into the context and return `None`
/// when at least one was reported for the value.
pub trait Decode: Sized {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self>;
}

/// Error sink and view settings threaded through one decode pass.
pub struct Context<'t> {
    view: SchemaView<'t>,
    errors: Vec<ValidationError>,
}

impl<'t> Context<'t> {
    fn new(view: SchemaView<'t>) -> Self {
        Self {
            view,
            errors: Vec::new(),
        }
    }

    pub fn mode(&self) -> SchemaMode {
        self.view.mode
    }

    pub fn permissive(&self) -> bool {
        self.view.mode == SchemaMode::Permissive
    }

    pub fn taxonomy(&self) -> &'t TraitTaxonomy {
        self.view.taxonomy
    }

    pub fn report(&mut self, path: &FieldPath, rule: Rule) {
        self.errors.push(ValidationError {
            path: path.clone(),
            rule,
        });
    }

    fn finish<T>(self, decoded: Option<T>) -> Result<T, ValidationErrors> {
        match decoded {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationErrors::new(self.errors)),
        }
    }
}

/// Whether an object tolerates keys outside its declared field list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extensibility {
    Closed,
    Open,
}

/// Field-by-field reader over one JSON object.
///
/// Every accessor records the key it consumed; [`ObjectReader::finish`] then
/// decides what happens to the rest according to the object's extensibility
/// and the view's mode.
pub struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: FieldPath,
    known: Vec<&'static str>,
}

impl<'a> ObjectReader<'a> {
    pub fn open(value: &'a Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                map,
                path: path.clone(),
                known: Vec::new(),
            }),
            other => {
                cx.report(
                    path,
                    Rule::WrongType {
                        expected: "object",
                        found: json_type(other),
                    },
                );
                None
            }
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// A field that must be present and non-null.
    pub fn required<T>(
        &mut self,
        key: &'static str,
        cx: &mut Context<'_>,
        decode: impl FnOnce(&'a Value, &FieldPath, &mut Context<'_>) -> Option<T>,
    ) -> Option<T> {
        self.known.push(key);
        let path = self.path.key(key);
        match self.map.get(key) {
            None => {
                cx.report(&path, Rule::MissingField);
                None
            }
            Some(Value::Null) => {
                cx.report(&path, Rule::NullNotAllowed);
                None
            }
            Some(value) => decode(value, &path, cx),
        }
    }

    /// A non-null field whose default applies only when the key is absent.
    pub fn defaulted<T>(
        &mut self,
        key: &'static str,
        cx: &mut Context<'_>,
        default: impl FnOnce() -> T,
        decode: impl FnOnce(&'a Value, &FieldPath, &mut Context<'_>) -> Option<T>,
    ) -> Option<T> {
        self.known.push(key);
        let path = self.path.key(key);
        match self.map.get(key) {
            None => Some(default()),
            Some(Value::Null) => {
                cx.report(&path, Rule::NullNotAllowed);
                None
            }
            Some(value) => decode(value, &path, cx),
        }
    }

    /// A nullable field; absence and `null` are kept apart for re-encoding.
    pub fn nullable<T>(
        &mut self,
        key: &'static str,
        cx: &mut Context<'_>,
        decode: impl FnOnce(&'a Value, &FieldPath, &mut Context<'_>) -> Option<T>,
    ) -> Option<Nullable<T>> {
        self.known.push(key);
        let path = self.path.key(key);
        match self.map.get(key) {
            None => Some(Nullable::Absent),
            Some(Value::Null) => Some(Nullable::Null),
            Some(value) => decode(value, &path, cx).map(Nullable::Present),
        }
    }

    /// Settle the keys no accessor consumed.
    ///
    /// Strict closed objects report each one as an unknown field; strict open
    /// objects hand them back so they survive re-encoding; permissive views
    /// drop them.
    pub fn finish(self, extensibility: Extensibility, cx: &mut Context<'_>) -> Map<String, Value> {
        let mut extra = Map::new();
        for (key, value) in self.map {
            if self.known.iter().any(|known| *known == key.as_str()) {
                continue;
            }
            match (cx.mode(), extensibility) {
                (SchemaMode::Permissive, _) => {}
                (SchemaMode::Strict, Extensibility::Closed) => {
                    cx.report(&self.path.key(key), Rule::UnknownField);
                }
                (SchemaMode::Strict, Extensibility::Open) => {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }
        extra
    }
}

/// JSON type label used in error messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a JSON array item by item, reporting each bad item at its index.
pub fn decode_list<'a, T>(
    value: &'a Value,
    path: &FieldPath,
    cx: &mut Context<'_>,
    mut item: impl FnMut(&'a Value, &FieldPath, &mut Context<'_>) -> Option<T>,
) -> Option<Vec<T>> {
    let Value::Array(items) = value else {
        cx.report(
            path,
            Rule::WrongType {
                expected: "array",
                found: json_type(value),
            },
        );
        return None;
    };
    let mut decoded = Vec::with_capacity(items.len());
    let mut failed = false;
    for (idx, raw) in items.iter().enumerate() {
        match item(raw, &path.index(idx), cx) {
            Some(value) => decoded.push(value),
            None => failed = true,
        }
    }
    if failed { None } else { Some(decoded) }
}

/// Like [`decode_list`] but rejects an empty array.
pub fn decode_non_empty_list<'a, T>(
    value: &'a Value,
    path: &FieldPath,
    cx: &mut Context<'_>,
    item: impl FnMut(&'a Value, &FieldPath, &mut Context<'_>) -> Option<T>,
) -> Option<Vec<T>> {
    if matches!(value, Value::Array(items) if items.is_empty()) {
        cx.report(path, Rule::EmptyList);
        return None;
    }
    decode_list(value, path, cx, item)
}

pub use crate::primitives::Nullable;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{LimitedString, decode_number};
    use serde_json::json;

    struct Pair {
        name: LimitedString,
        weight: f64,
        note: Nullable<LimitedString>,
    }

    impl Decode for Pair {
        fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
            let mut obj = ObjectReader::open(value, path, cx)?;
            let name = obj.required("name", cx, LimitedString::decode);
            let weight = obj.defaulted("weight", cx, || 1000.0, decode_number);
            let note = obj.nullable("note", cx, LimitedString::decode);
            obj.finish(Extensibility::Closed, cx);
            Some(Pair {
                name: name?,
                weight: weight?,
                note: note?,
            })
        }
    }

    #[test]
    fn defaults_apply_only_to_absent_keys() {
        let view = SchemaView::strict();
        let pair: Pair = view.decode(&json!({"name": "a"})).unwrap();
        assert_eq!(pair.weight, 1000.0);
        assert!(pair.note.is_absent());

        let errors = view
            .decode::<Pair>(&json!({"name": "a", "weight": null}))
            .err()
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().path.as_str(), "weight");
        assert_eq!(errors.first().unwrap().rule, Rule::NullNotAllowed);
    }

    #[test]
    fn null_and_absent_stay_distinct() {
        let view = SchemaView::strict();
        let pair: Pair = view.decode(&json!({"name": "a", "note": null})).unwrap();
        assert_eq!(pair.note, Nullable::Null);
        assert_eq!(pair.name.as_str(), "a");
    }

    #[test]
    fn closed_objects_collect_every_violation() {
        let view = SchemaView::strict();
        let errors = view
            .decode::<Pair>(&json!({"weight": "heavy", "extra": 1}))
            .err()
            .unwrap();
        let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "name: missing required field".to_string(),
                "weight: expected number, found string".to_string(),
                "extra: unknown field".to_string(),
            ]
        );
    }

    #[test]
    fn permissive_view_drops_unknown_keys() {
        let view = SchemaView::permissive();
        let pair: Pair = view
            .decode(&json!({"name": "a", "weight": "12.5", "extra": 1}))
            .unwrap();
        assert_eq!(pair.weight, 12.5);
    }

    #[test]
    fn identical_input_yields_identical_errors() {
        let view = SchemaView::strict();
        let input = json!({"name": 5, "zzz": true, "aaa": false});
        let first = view.decode::<Pair>(&input).err().unwrap();
        let second = view.decode::<Pair>(&input).err().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_empty_list_rejects_empty_arrays() {
        let view = SchemaView::strict();
        struct Names(Vec<LimitedString>);
        impl Decode for Names {
            fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
                decode_non_empty_list(value, path, cx, LimitedString::decode).map(Names)
            }
        }
        let errors = view
            .decode_at::<Names>(&json!([]), FieldPath::named("names"))
            .err()
            .unwrap();
        assert_eq!(errors.first().unwrap().path.as_str(), "names");
        assert_eq!(errors.first().unwrap().rule, Rule::EmptyList);
        let names = view.decode::<Names>(&json!(["a", "b"])).unwrap();
        assert_eq!(names.0.len(), 2);
    }

    #[test]
    fn schema_mode_parses_known_values() {
        assert_eq!("strict".parse::<SchemaMode>(), Ok(SchemaMode::Strict));
        assert_eq!(" permissive ".parse::<SchemaMode>(), Ok(SchemaMode::Permissive));
        assert!("lenient".parse::<SchemaMode>().is_err());
    }
}
