//! Slicer settings blocks embedded in materials and filaments.

use crate::primitives::{LimitedString, Nullable, decode_integer};
use crate::schema::{
    Context, Decode, Extensibility, FieldPath, ObjectReader, Rule, decode_list, json_type,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Slicer applications that carry their own settings block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slicer {
    PrusaSlicer,
    BambuStudio,
    OrcaSlicer,
    Cura,
}

impl Slicer {
    pub const ALL: [Slicer; 4] = [
        Slicer::PrusaSlicer,
        Slicer::BambuStudio,
        Slicer::OrcaSlicer,
        Slicer::Cura,
    ];

    /// Document key for this slicer (`prusaslicer`, `bambustudio`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Slicer::PrusaSlicer => "prusaslicer",
            Slicer::BambuStudio => "bambustudio",
            Slicer::OrcaSlicer => "orcaslicer",
            Slicer::Cura => "cura",
        }
    }

    /// Name of the slicer's own config option for a generic setting.
    pub fn native_key(self, field: GenericField) -> &'static str {
        use GenericField::*;
        match (self, field) {
            (Slicer::PrusaSlicer, NozzleTemp) => "temperature",
            (Slicer::PrusaSlicer, FirstLayerNozzleTemp) => "first_layer_temperature",
            (Slicer::PrusaSlicer, BedTemp) => "bed_temperature",
            (Slicer::PrusaSlicer, FirstLayerBedTemp) => "first_layer_bed_temperature",
            (Slicer::BambuStudio | Slicer::OrcaSlicer, NozzleTemp) => "nozzle_temperature",
            (Slicer::BambuStudio | Slicer::OrcaSlicer, FirstLayerNozzleTemp) => {
                "nozzle_temperature_initial_layer"
            }
            (Slicer::BambuStudio | Slicer::OrcaSlicer, BedTemp) => "hot_plate_temp",
            (Slicer::BambuStudio | Slicer::OrcaSlicer, FirstLayerBedTemp) => {
                "hot_plate_temp_initial_layer"
            }
            (Slicer::Cura, NozzleTemp) => "material_print_temperature",
            (Slicer::Cura, FirstLayerNozzleTemp) => "material_print_temperature_layer_0",
            (Slicer::Cura, BedTemp) => "material_bed_temperature",
            (Slicer::Cura, FirstLayerBedTemp) => "material_bed_temperature_layer_0",
        }
    }
}

impl fmt::Display for Slicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Slicer {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Slicer::ALL
            .into_iter()
            .find(|slicer| slicer.key() == value.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                format!("unknown slicer '{value}' (expected prusaslicer|bambustudio|orcaslicer|cura)")
            })
    }
}

/// The temperature settings every slicer understands under some name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenericField {
    NozzleTemp,
    FirstLayerNozzleTemp,
    BedTemp,
    FirstLayerBedTemp,
}

impl GenericField {
    pub const ALL: [GenericField; 4] = [
        GenericField::NozzleTemp,
        GenericField::FirstLayerNozzleTemp,
        GenericField::BedTemp,
        GenericField::FirstLayerBedTemp,
    ];

    pub fn key(self) -> &'static str {
        match self {
            GenericField::NozzleTemp => "nozzle_temp",
            GenericField::FirstLayerNozzleTemp => "first_layer_nozzle_temp",
            GenericField::BedTemp => "bed_temp",
            GenericField::FirstLayerBedTemp => "first_layer_bed_temp",
        }
    }
}

/// Value of one entry in a slicer `overrides` map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Single(String),
    List(Vec<String>),
}

impl OverrideValue {
    /// The single value, or the first entry of a list.
    pub fn first(&self) -> Option<&str> {
        match self {
            OverrideValue::Single(value) => Some(value),
            OverrideValue::List(values) => values.first().map(String::as_str),
        }
    }
}

fn decode_override_scalar(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.clone()),
        // Form input often carries temperatures as bare numbers.
        Value::Number(number) if cx.permissive() => Some(number.to_string()),
        Value::Bool(flag) if cx.permissive() => Some(if *flag { "1" } else { "0" }.to_string()),
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

impl Decode for OverrideValue {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        match value {
            Value::Array(_) => {
                decode_list(value, path, cx, decode_override_scalar).map(OverrideValue::List)
            }
            Value::Object(_) | Value::Null => {
                cx.report(
                    path,
                    Rule::UnionMismatch {
                        expected: "string or array of strings",
                        found: json_type(value),
                    },
                );
                None
            }
            _ => decode_override_scalar(value, path, cx).map(OverrideValue::Single),
        }
    }
}

fn decode_overrides(
    value: &Value,
    path: &FieldPath,
    cx: &mut Context<'_>,
) -> Option<BTreeMap<String, OverrideValue>> {
    let Value::Object(map) = value else {
        cx.report(
            path,
            Rule::WrongType {
                expected: "object",
                found: json_type(value),
            },
        );
        return None;
    };
    let mut overrides = BTreeMap::new();
    let mut failed = false;
    for (key, raw) in map {
        match OverrideValue::decode(raw, &path.key(key), cx) {
            Some(decoded) => {
                overrides.insert(key.clone(), decoded);
            }
            None => failed = true,
        }
    }
    if failed { None } else { Some(overrides) }
}

/// Profile selection and raw option overrides for one slicer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpecificSlicerSettings {
    pub profile_name: LimitedString,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub overrides: Nullable<BTreeMap<String, OverrideValue>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Decode for SpecificSlicerSettings {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let profile_name = obj.required("profile_name", cx, LimitedString::decode);
        let overrides = obj.nullable("overrides", cx, decode_overrides);
        let extra = obj.finish(Extensibility::Open, cx);
        Some(Self {
            profile_name: profile_name?,
            overrides: overrides?,
            extra,
        })
    }
}

/// Temperatures shared across slicers; each is mapped to the slicer's own key
/// at resolution time.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenericSlicerSettings {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub first_layer_bed_temp: Nullable<i64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub first_layer_nozzle_temp: Nullable<i64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub bed_temp: Nullable<i64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub nozzle_temp: Nullable<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenericSlicerSettings {
    pub fn get(&self, field: GenericField) -> Option<i64> {
        self.field(field).get().copied()
    }

    pub fn field(&self, field: GenericField) -> &Nullable<i64> {
        match field {
            GenericField::NozzleTemp => &self.nozzle_temp,
            GenericField::FirstLayerNozzleTemp => &self.first_layer_nozzle_temp,
            GenericField::BedTemp => &self.bed_temp,
            GenericField::FirstLayerBedTemp => &self.first_layer_bed_temp,
        }
    }

    pub fn field_mut(&mut self, field: GenericField) -> &mut Nullable<i64> {
        match field {
            GenericField::NozzleTemp => &mut self.nozzle_temp,
            GenericField::FirstLayerNozzleTemp => &mut self.first_layer_nozzle_temp,
            GenericField::BedTemp => &mut self.bed_temp,
            GenericField::FirstLayerBedTemp => &mut self.first_layer_bed_temp,
        }
    }

    pub fn is_empty(&self) -> bool {
        GenericField::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

impl Decode for GenericSlicerSettings {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let first_layer_bed_temp = obj.nullable("first_layer_bed_temp", cx, decode_integer);
        let first_layer_nozzle_temp = obj.nullable("first_layer_nozzle_temp", cx, decode_integer);
        let bed_temp = obj.nullable("bed_temp", cx, decode_integer);
        let nozzle_temp = obj.nullable("nozzle_temp", cx, decode_integer);
        let extra = obj.finish(Extensibility::Open, cx);
        Some(Self {
            first_layer_bed_temp: first_layer_bed_temp?,
            first_layer_nozzle_temp: first_layer_nozzle_temp?,
            bed_temp: bed_temp?,
            nozzle_temp: nozzle_temp?,
            extra,
        })
    }
}

/// Per-slicer blocks plus the generic block, as stored on a material
/// (`default_slicer_settings`) or a filament (`slicer_settings`).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SlicerSettings {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub prusaslicer: Nullable<SpecificSlicerSettings>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub bambustudio: Nullable<SpecificSlicerSettings>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub orcaslicer: Nullable<SpecificSlicerSettings>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub cura: Nullable<SpecificSlicerSettings>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub generic: Nullable<GenericSlicerSettings>,
}

impl SlicerSettings {
    pub fn specific(&self, slicer: Slicer) -> &Nullable<SpecificSlicerSettings> {
        match slicer {
            Slicer::PrusaSlicer => &self.prusaslicer,
            Slicer::BambuStudio => &self.bambustudio,
            Slicer::OrcaSlicer => &self.orcaslicer,
            Slicer::Cura => &self.cura,
        }
    }
}

impl Decode for SlicerSettings {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let prusaslicer = obj.nullable("prusaslicer", cx, SpecificSlicerSettings::decode);
        let bambustudio = obj.nullable("bambustudio", cx, SpecificSlicerSettings::decode);
        let orcaslicer = obj.nullable("orcaslicer", cx, SpecificSlicerSettings::decode);
        let cura = obj.nullable("cura", cx, SpecificSlicerSettings::decode);
        let generic = obj.nullable("generic", cx, GenericSlicerSettings::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            prusaslicer: prusaslicer?,
            bambustudio: bambustudio?,
            orcaslicer: orcaslicer?,
            cura: cura?,
            generic: generic?,
        })
    }
}
