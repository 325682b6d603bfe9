//! Reusable value types shared by every entity schema.
//!
//! Each primitive exposes a `decode` function with the signature the
//! [`ObjectReader`](crate::schema::ObjectReader) accessors expect, so entity
//! decoders read as a flat list of `obj.required("field", cx, Type::decode)`
//! calls. Every failure names the exact constraint that was violated.

use crate::schema::{Context, FieldPath, Rule, json_type};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Upper bound for every free-form string, in UTF-16 code units.
pub const MAX_STRING_LENGTH: usize = 1000;

const COUNTRY_UNKNOWN: &str = "Unknown";

/// Tri-state optional field: the key may be missing, explicitly `null`, or
/// carry a value.
///
/// `Absent` and `Null` mean the same thing ("not specified") to every reader
/// of the catalog; they are kept apart only so a decoded document re-encodes
/// to the same JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Nullable<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Absent
    }
}

impl<T> Nullable<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Nullable::Present(value) => Some(value),
            Nullable::Absent | Nullable::Null => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Nullable::Present(value) => Some(value),
            Nullable::Absent | Nullable::Null => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Nullable::Present(_))
    }

    /// Replace a missing key with `value`; an explicit `null` is kept.
    pub fn fill_absent(self, value: T) -> Self {
        match self {
            Nullable::Absent => Nullable::Present(value),
            other => other,
        }
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Nullable::Present(value),
            None => Nullable::Null,
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Nullable::Present(value) => serializer.serialize_some(value),
            Nullable::Absent | Nullable::Null => serializer.serialize_none(),
        }
    }
}

/// A string capped at [`MAX_STRING_LENGTH`] UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LimitedString(String);

impl LimitedString {
    pub fn new(value: impl Into<String>) -> Result<Self, Rule> {
        let value = value.into();
        let len = value.encode_utf16().count();
        if len > MAX_STRING_LENGTH {
            return Err(Rule::TooLong {
                max: MAX_STRING_LENGTH,
                len,
            });
        }
        Ok(Self(value))
    }

    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let raw = expect_str(value, path, cx)?;
        match Self::new(raw) {
            Ok(limited) => Some(limited),
            Err(rule) => {
                cx.report(path, rule);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LimitedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A [`LimitedString`] that must use the `http` or `https` scheme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HttpUrl(LimitedString);

impl HttpUrl {
    pub fn parse(value: &str) -> Result<Self, Rule> {
        let limited = LimitedString::new(value)?;
        let rest = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"));
        match rest {
            Some(rest)
                if !rest.is_empty()
                    && !rest.starts_with('/')
                    && !value.chars().any(char::is_whitespace) =>
            {
                Ok(Self(limited))
            }
            _ => Err(Rule::NotHttpUrl {
                value: value.to_string(),
            }),
        }
    }

    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let raw = expect_str(value, path, cx)?;
        let raw = if cx.permissive() { raw.trim() } else { raw };
        match Self::parse(raw) {
            Ok(url) => Some(url),
            Err(rule) => {
                cx.report(path, rule);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO 3166-1 alpha-2 code, or the `"Unknown"` sentinel.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountryCode {
    Iso(String),
    Unknown,
}

impl CountryCode {
    pub fn parse(value: &str) -> Result<Self, Rule> {
        if value == COUNTRY_UNKNOWN {
            return Ok(CountryCode::Unknown);
        }
        if value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase()) {
            return Ok(CountryCode::Iso(value.to_string()));
        }
        Err(Rule::Pattern {
            what: "country code",
            value: value.to_string(),
        })
    }

    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let raw = expect_str(value, path, cx)?;
        let parsed = if cx.permissive() && raw.trim().len() == 2 {
            Self::parse(&raw.trim().to_ascii_uppercase())
        } else {
            Self::parse(raw)
        };
        match parsed {
            Ok(code) => Some(code),
            Err(rule) => {
                cx.report(path, rule);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CountryCode::Iso(code) => code,
            CountryCode::Unknown => COUNTRY_UNKNOWN,
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Hex color, stored as six upper-case digits without the leading `#`.
///
/// Input may carry the `#` or not and use either case; both spellings of the
/// same color compare equal. Letter case is not preserved: `#a1b2c3` is
/// emitted as `#A1B2C3`. Serialization always emits `#RRGGBB`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Result<Self, Rule> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(digits.to_ascii_uppercase()))
        } else {
            Err(Rule::Pattern {
                what: "hex color",
                value: value.to_string(),
            })
        }
    }

    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let raw = expect_str(value, path, cx)?;
        let raw = if cx.permissive() { raw.trim() } else { raw };
        match Self::parse(raw) {
            Ok(color) => Some(color),
            Err(rule) => {
                cx.report(path, rule);
                None
            }
        }
    }

    /// The six stored digits, e.g. `00FF00`.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// `#`-prefixed form used on output.
    pub fn hex(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A single value or a non-empty list of values of the same type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// `color_hex`: one color or a list of colors.
pub type Colors = OneOrMany<Color>;

/// `ships_from` / `ships_to`: one country code or a list of them.
pub type Locations = OneOrMany<CountryCode>;

impl<T> OneOrMany<T> {
    /// Decode the string-or-array-of-strings union.
    ///
    /// A string selects the single arm, an array the list arm; anything else
    /// matches neither and is reported as a union mismatch.
    pub fn decode_with(
        value: &Value,
        path: &FieldPath,
        cx: &mut Context<'_>,
        expected: &'static str,
        item: fn(&Value, &FieldPath, &mut Context<'_>) -> Option<T>,
    ) -> Option<Self> {
        match value {
            Value::String(_) => item(value, path, cx).map(OneOrMany::One),
            Value::Array(_) => {
                crate::schema::decode_non_empty_list(value, path, cx, item).map(OneOrMany::Many)
            }
            other => {
                cx.report(
                    path,
                    Rule::UnionMismatch {
                        expected,
                        found: json_type(other),
                    },
                );
                None
            }
        }
    }

    /// The values in order; the single arm reads as a one-element slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn is_single(&self) -> bool {
        matches!(self, OneOrMany::One(_))
    }
}

impl Colors {
    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        Self::decode_with(value, path, cx, "hex color or list of hex colors", Color::decode)
    }
}

impl Locations {
    pub fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        Self::decode_with(
            value,
            path,
            cx,
            "country code or list of country codes",
            CountryCode::decode,
        )
    }
}

pub fn decode_bool(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        other => {
            cx.report(
                path,
                Rule::WrongType {
                    expected: "boolean",
                    found: json_type(other),
                },
            );
            None
        }
    }
}

/// Whole number; temperatures are always integers when present.
pub fn decode_integer(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<i64> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => Some(int),
            None => {
                cx.report(
                    path,
                    Rule::NotInteger {
                        value: number.to_string(),
                    },
                );
                None
            }
        },
        Value::String(raw) if cx.permissive() => match raw.trim().parse::<i64>() {
            Ok(int) => Some(int),
            Err(_) => {
                cx.report(path, Rule::NotInteger { value: raw.clone() });
                None
            }
        },
        other => {
            cx.report(
                path,
                Rule::WrongType {
                    expected: "integer",
                    found: json_type(other),
                },
            );
            None
        }
    }
}

/// Floating-point measurement (density, weights, diameters).
///
/// Unconstrained in the strict view; the permissive view also accepts numeric
/// strings and requires the value to be strictly positive.
pub fn decode_number(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) if cx.permissive() => {
            raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    };
    let Some(number) = number else {
        cx.report(
            path,
            Rule::WrongType {
                expected: "number",
                found: json_type(value),
            },
        );
        return None;
    };
    if cx.permissive() && number <= 0.0 {
        cx.report(path, Rule::NotPositive { value: number });
        return None;
    }
    Some(number)
}

fn expect_str<'v>(value: &'v Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<&'v str> {
    match value {
        Value::String(raw) => Some(raw),
        other => {
            cx.report(
                path,
                Rule::WrongType {
                    expected: "string",
                    found: json_type(other),
                },
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Decode, SchemaView};
    use proptest::prelude::*;
    use serde_json::json;

    struct Probe<T>(T);

    macro_rules! probe_decode {
        ($ty:ty, $decode:expr) => {
            impl Decode for Probe<$ty> {
                fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
                    $decode(value, path, cx).map(Probe)
                }
            }
        };
    }

    probe_decode!(Color, Color::decode);
    probe_decode!(Colors, Colors::decode);
    probe_decode!(CountryCode, CountryCode::decode);
    probe_decode!(Locations, Locations::decode);
    probe_decode!(LimitedString, LimitedString::decode);
    probe_decode!(HttpUrl, HttpUrl::decode);
    probe_decode!(i64, decode_integer);
    probe_decode!(f64, decode_number);

    fn strict<T>(value: Value) -> Result<T, Rule>
    where
        Probe<T>: Decode,
    {
        SchemaView::strict()
            .decode::<Probe<T>>(&value)
            .map(|probe| probe.0)
            .map_err(|errors| errors.first().unwrap().rule.clone())
    }

    fn permissive<T>(value: Value) -> Result<T, Rule>
    where
        Probe<T>: Decode,
    {
        SchemaView::permissive()
            .decode::<Probe<T>>(&value)
            .map(|probe| probe.0)
            .map_err(|errors| errors.first().unwrap().rule.clone())
    }

    #[test]
    fn color_accepts_prefixed_and_bare_forms() {
        for (prefixed, bare) in [("#FF0000", "FF0000"), ("#a1B2c3", "A1b2C3"), ("#000000", "000000")] {
            let a: Color = strict(json!(prefixed)).unwrap();
            let b: Color = strict(json!(bare)).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.digits().len(), 6);
            assert!(!a.digits().starts_with('#'));
        }
    }

    #[test]
    fn color_rejects_malformed_values() {
        for bad in ["#FFF", "##FF0000", "FF00001", "#GG0000", "", " #FF0000"] {
            let rule = strict::<Color>(json!(bad)).unwrap_err();
            assert!(matches!(rule, Rule::Pattern { what: "hex color", .. }), "{bad}");
        }
        assert!(matches!(
            strict::<Color>(json!(16711680)).unwrap_err(),
            Rule::WrongType { expected: "string", found: "number" }
        ));
    }

    #[test]
    fn colors_union_keeps_arm_and_normalizes_entries() {
        let colors: Colors = strict(json!(["#FF0000", "00FF00"])).unwrap();
        assert!(!colors.is_single());
        let rendered: Vec<String> = colors.iter().map(Color::hex).collect();
        assert_eq!(rendered, vec!["#FF0000".to_string(), "#00FF00".to_string()]);

        let single: Colors = strict(json!("#123abc")).unwrap();
        assert!(single.is_single());
        assert_eq!(single.as_slice().len(), 1);
        assert_eq!(serde_json::to_value(&single).unwrap(), json!("#123ABC"));

        assert_eq!(strict::<Colors>(json!([])).unwrap_err(), Rule::EmptyList);
        assert!(matches!(
            strict::<Colors>(json!({"hex": "#FF0000"})).unwrap_err(),
            Rule::UnionMismatch { found: "object", .. }
        ));
    }

    #[test]
    fn colors_list_reports_bad_entry_by_index() {
        let errors = SchemaView::strict()
            .decode_at::<Probe<Colors>>(&json!(["#FF0000", 5]), FieldPath::named("color_hex"))
            .err()
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().path.as_str(), "color_hex[1]");
    }

    #[test]
    fn country_codes_accept_iso_and_sentinel() {
        assert_eq!(
            strict::<CountryCode>(json!("US")).unwrap(),
            CountryCode::Iso("US".into())
        );
        assert_eq!(strict::<CountryCode>(json!("Unknown")).unwrap(), CountryCode::Unknown);
        for bad in ["us", "USA", "U", "unknown", "U1"] {
            assert!(strict::<CountryCode>(json!(bad)).is_err(), "{bad}");
        }
        assert_eq!(
            permissive::<CountryCode>(json!("de")).unwrap(),
            CountryCode::Iso("DE".into())
        );
    }

    #[test]
    fn locations_union_accepts_single_or_list() {
        let one: Locations = strict(json!("US")).unwrap();
        assert!(one.is_single());
        let many: Locations = strict(json!(["US", "CA"])).unwrap();
        assert_eq!(serde_json::to_value(&many).unwrap(), json!(["US", "CA"]));
        assert!(strict::<Locations>(json!(["US", "usa"])).is_err());
    }

    #[test]
    fn limited_string_caps_utf16_length() {
        let ok = "a".repeat(MAX_STRING_LENGTH);
        assert!(strict::<LimitedString>(json!(ok)).is_ok());
        let long = "a".repeat(MAX_STRING_LENGTH + 1);
        assert_eq!(
            strict::<LimitedString>(json!(long)).unwrap_err(),
            Rule::TooLong {
                max: MAX_STRING_LENGTH,
                len: MAX_STRING_LENGTH + 1
            }
        );
        // Astral characters count as two code units each.
        let astral = "\u{1F9EA}".repeat(501);
        assert!(matches!(
            strict::<LimitedString>(json!(astral)).unwrap_err(),
            Rule::TooLong { len: 1002, .. }
        ));
    }

    #[test]
    fn urls_require_http_scheme() {
        assert!(strict::<HttpUrl>(json!("https://example.com/sds.pdf")).is_ok());
        assert!(strict::<HttpUrl>(json!("http://example.com")).is_ok());
        for bad in [
            "ftp://example.com",
            "example.com",
            "https://",
            "https://a b",
            "http:///path",
            "https:////example.com",
        ] {
            assert!(
                matches!(strict::<HttpUrl>(json!(bad)).unwrap_err(), Rule::NotHttpUrl { .. }),
                "{bad}"
            );
        }
    }

    #[test]
    fn integers_reject_fractions_and_strings_in_strict_view() {
        assert_eq!(strict::<i64>(json!(210)).unwrap(), 210);
        assert!(matches!(
            strict::<i64>(json!(210.5)).unwrap_err(),
            Rule::NotInteger { .. }
        ));
        assert!(matches!(
            strict::<i64>(json!("210")).unwrap_err(),
            Rule::WrongType { .. }
        ));
        assert_eq!(permissive::<i64>(json!("210")).unwrap(), 210);
    }

    #[test]
    fn numbers_are_positive_only_in_permissive_view() {
        assert_eq!(strict::<f64>(json!(0)).unwrap(), 0.0);
        assert_eq!(strict::<f64>(json!(-1.5)).unwrap(), -1.5);
        assert_eq!(
            permissive::<f64>(json!(0)).unwrap_err(),
            Rule::NotPositive { value: 0.0 }
        );
        assert_eq!(permissive::<f64>(json!("1.24")).unwrap(), 1.24);
        assert!(strict::<f64>(json!("1.24")).is_err());
    }

    #[test]
    fn nullable_serializes_null_and_fills_only_absent() {
        let null: Nullable<i64> = Nullable::Null;
        assert_eq!(serde_json::to_value(&null).unwrap(), Value::Null);
        assert_eq!(null.get(), None);
        let present = Nullable::Present(3).fill_absent(4);
        assert_eq!(present.get(), Some(&3));
        assert_eq!(Nullable::<i64>::Absent.fill_absent(4), Nullable::Present(4));
        assert_eq!(Nullable::<i64>::Null.fill_absent(4), Nullable::Null);
    }

    proptest! {
        #[test]
        fn any_six_digit_hex_is_accepted_and_normalized(
            digits in "[A-Fa-f0-9]{6}",
            prefixed in any::<bool>(),
        ) {
            let input = if prefixed { format!("#{digits}") } else { digits.clone() };
            let color: Color = strict(json!(input)).unwrap();
            prop_assert_eq!(color.digits(), digits.to_ascii_uppercase());
            prop_assert_eq!(color.hex(), format!("#{}", digits.to_ascii_uppercase()));
            let encoded = serde_json::to_value(&color).unwrap();
            prop_assert_eq!(strict::<Color>(encoded).unwrap(), color);
        }

        #[test]
        fn anything_else_is_rejected_as_a_color(input in "#?[ -~]{0,9}") {
            let digits = input.strip_prefix('#').unwrap_or(&input);
            prop_assume!(!(digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())));
            let is_pattern_error = matches!(
                strict::<Color>(json!(input)),
                Err(Rule::Pattern { what: "hex color", .. })
            );
            prop_assert!(is_pattern_error);
        }
    }
}
