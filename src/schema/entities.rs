//! Document entities of the catalog tree.
//!
//! One canonical field list per entity; the [`SchemaView`](super::SchemaView)
//! decides how strictly it is read.

use crate::primitives::{
    Color, Colors, CountryCode, HttpUrl, LimitedString, Locations, Nullable, decode_bool,
    decode_integer, decode_number,
};
use crate::schema::slicer::{Slicer, SlicerSettings};
use crate::schema::{
    Context, Decode, Extensibility, FieldPath, ObjectReader, decode_list, decode_non_empty_list,
};
use crate::traits::Traits;
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_DENSITY: f64 = 1.24;
pub const DEFAULT_FILAMENT_WEIGHT: f64 = 1000.0;
pub const DEFAULT_DIAMETER: f64 = 1.75;

/// `discontinued` flags are nullable in the read contract; form input treats a
/// missing flag as `false`.
fn discontinued_flag(
    obj: &mut ObjectReader<'_>,
    cx: &mut Context<'_>,
) -> Option<Nullable<bool>> {
    let flag = obj.nullable("discontinued", cx, decode_bool)?;
    Some(if cx.permissive() {
        flag.fill_absent(false)
    } else {
        flag
    })
}

/// `stores/<store>/store.json`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Store {
    pub id: LimitedString,
    pub name: LimitedString,
    pub storefront_url: HttpUrl,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub storefront_affiliate_link: Nullable<HttpUrl>,
    pub logo: LimitedString,
    pub ships_from: Locations,
    pub ships_to: Locations,
}

impl Decode for Store {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let id = obj.required("id", cx, LimitedString::decode);
        let name = obj.required("name", cx, LimitedString::decode);
        let storefront_url = obj.required("storefront_url", cx, HttpUrl::decode);
        let storefront_affiliate_link = obj.nullable("storefront_affiliate_link", cx, HttpUrl::decode);
        let logo = obj.required("logo", cx, LimitedString::decode);
        let ships_from = obj.required("ships_from", cx, Locations::decode);
        let ships_to = obj.required("ships_to", cx, Locations::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            id: id?,
            name: name?,
            storefront_url: storefront_url?,
            storefront_affiliate_link: storefront_affiliate_link?,
            logo: logo?,
            ships_from: ships_from?,
            ships_to: ships_to?,
        })
    }
}

/// `<brand>/brand.json`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Brand {
    pub brand: LimitedString,
    pub website: HttpUrl,
    pub logo: LimitedString,
    pub origin: CountryCode,
}

impl Decode for Brand {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let brand = obj.required("brand", cx, LimitedString::decode);
        let website = obj.required("website", cx, HttpUrl::decode);
        let logo = obj.required("logo", cx, LimitedString::decode);
        let origin = obj.required("origin", cx, CountryCode::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            brand: brand?,
            website: website?,
            logo: logo?,
            origin: origin?,
        })
    }
}

/// `<brand>/<material>/material.json`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Material {
    pub material: LimitedString,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub default_max_dry_temperature: Nullable<i64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub default_slicer_settings: Nullable<SlicerSettings>,
}

impl Decode for Material {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let material = obj.required("material", cx, LimitedString::decode);
        let default_max_dry_temperature =
            obj.nullable("default_max_dry_temperature", cx, decode_integer);
        let default_slicer_settings =
            obj.nullable("default_slicer_settings", cx, SlicerSettings::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            material: material?,
            default_max_dry_temperature: default_max_dry_temperature?,
            default_slicer_settings: default_slicer_settings?,
        })
    }
}

/// Identifiers of this filament inside each slicer's bundled profile library.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SlicerIds {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub prusaslicer: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub bambustudio: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub orcaslicer: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub cura: Nullable<LimitedString>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlicerIds {
    pub fn get(&self, slicer: Slicer) -> Option<&LimitedString> {
        match slicer {
            Slicer::PrusaSlicer => self.prusaslicer.get(),
            Slicer::BambuStudio => self.bambustudio.get(),
            Slicer::OrcaSlicer => self.orcaslicer.get(),
            Slicer::Cura => self.cura.get(),
        }
    }
}

impl Decode for SlicerIds {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let prusaslicer = obj.nullable("prusaslicer", cx, LimitedString::decode);
        let bambustudio = obj.nullable("bambustudio", cx, LimitedString::decode);
        let orcaslicer = obj.nullable("orcaslicer", cx, LimitedString::decode);
        let cura = obj.nullable("cura", cx, LimitedString::decode);
        let extra = obj.finish(Extensibility::Open, cx);
        Some(Self {
            prusaslicer: prusaslicer?,
            bambustudio: bambustudio?,
            orcaslicer: orcaslicer?,
            cura: cura?,
            extra,
        })
    }
}

/// `<brand>/<material>/<filament>/filament.json`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filament {
    pub name: LimitedString,
    pub diameter_tolerance: f64,
    pub density: f64,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub max_dry_temperature: Nullable<i64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub data_sheet_url: Nullable<HttpUrl>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub safety_sheet_url: Nullable<HttpUrl>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub discontinued: Nullable<bool>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub slicer_ids: Nullable<SlicerIds>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub slicer_settings: Nullable<SlicerSettings>,
}

impl Decode for Filament {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let name = obj.required("name", cx, LimitedString::decode);
        let diameter_tolerance = obj.required("diameter_tolerance", cx, decode_number);
        let density = obj.defaulted("density", cx, || DEFAULT_DENSITY, decode_number);
        let max_dry_temperature = obj.nullable("max_dry_temperature", cx, decode_integer);
        let data_sheet_url = obj.nullable("data_sheet_url", cx, HttpUrl::decode);
        let safety_sheet_url = obj.nullable("safety_sheet_url", cx, HttpUrl::decode);
        let discontinued = discontinued_flag(&mut obj, cx);
        let slicer_ids = obj.nullable("slicer_ids", cx, SlicerIds::decode);
        let slicer_settings = obj.nullable("slicer_settings", cx, SlicerSettings::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            name: name?,
            diameter_tolerance: diameter_tolerance?,
            density: density?,
            max_dry_temperature: max_dry_temperature?,
            data_sheet_url: data_sheet_url?,
            safety_sheet_url: safety_sheet_url?,
            discontinued: discontinued?,
            slicer_ids: slicer_ids?,
            slicer_settings: slicer_settings?,
        })
    }
}

/// Identifiers of a color in published color systems.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ColorStandards {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub ral: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub ncs: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub pantone: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub bs: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub munsell: Nullable<LimitedString>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Decode for ColorStandards {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let ral = obj.nullable("ral", cx, LimitedString::decode);
        let ncs = obj.nullable("ncs", cx, LimitedString::decode);
        let pantone = obj.nullable("pantone", cx, LimitedString::decode);
        let bs = obj.nullable("bs", cx, LimitedString::decode);
        let munsell = obj.nullable("munsell", cx, LimitedString::decode);
        let extra = obj.finish(Extensibility::Open, cx);
        Some(Self {
            ral: ral?,
            ncs: ncs?,
            pantone: pantone?,
            bs: bs?,
            munsell: munsell?,
            extra,
        })
    }
}

/// `<brand>/<material>/<filament>/<color>/variant.json`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorVariant {
    pub color_name: LimitedString,
    pub color_hex: Colors,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub hex_variants: Nullable<Vec<Color>>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub discontinued: Nullable<bool>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub color_standards: Nullable<ColorStandards>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub traits: Nullable<Traits>,
}

impl Decode for ColorVariant {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let color_name = obj.required("color_name", cx, LimitedString::decode);
        let color_hex = obj.required("color_hex", cx, Colors::decode);
        let hex_variants = obj.nullable("hex_variants", cx, |value, path, cx| {
            decode_list(value, path, cx, Color::decode)
        });
        let discontinued = discontinued_flag(&mut obj, cx);
        let color_standards = obj.nullable("color_standards", cx, ColorStandards::decode);
        let traits = obj.nullable("traits", cx, Traits::decode);
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            color_name: color_name?,
            color_hex: color_hex?,
            hex_variants: hex_variants?,
            discontinued: discontinued?,
            color_standards: color_standards?,
            traits: traits?,
        })
    }
}

/// Where one size can be bought.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PurchaseLink {
    pub store_id: LimitedString,
    pub url: HttpUrl,
    pub affiliate: bool,
    pub spool_refill: bool,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub ships_from: Nullable<Locations>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub ships_to: Nullable<Locations>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Decode for PurchaseLink {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let store_id = obj.required("store_id", cx, LimitedString::decode);
        let url = obj.required("url", cx, HttpUrl::decode);
        let affiliate = if cx.permissive() {
            obj.defaulted("affiliate", cx, || false, decode_bool)
        } else {
            obj.required("affiliate", cx, decode_bool)
        };
        let spool_refill = obj.defaulted("spool_refill", cx, || false, decode_bool);
        let ships_from = obj.nullable("ships_from", cx, Locations::decode);
        let ships_to = obj.nullable("ships_to", cx, Locations::decode);
        let extra = obj.finish(Extensibility::Open, cx);
        Some(Self {
            store_id: store_id?,
            url: url?,
            affiliate: affiliate?,
            spool_refill: spool_refill?,
            ships_from: ships_from?,
            ships_to: ships_to?,
            extra,
        })
    }
}

/// One entry of `sizes.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilamentSize {
    pub filament_weight: f64,
    pub diameter: f64,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub empty_spool_weight: Nullable<f64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub spool_core_diameter: Nullable<f64>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub ean: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub article_number: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub barcode_identifier: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub nfc_identifier: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub qr_identifier: Nullable<LimitedString>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub discontinued: Nullable<bool>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub purchase_links: Nullable<Vec<PurchaseLink>>,
}

impl FilamentSize {
    /// Purchase links, treating null and absent as none.
    pub fn links(&self) -> &[PurchaseLink] {
        self.purchase_links.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Decode for FilamentSize {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        let mut obj = ObjectReader::open(value, path, cx)?;
        let filament_weight =
            obj.defaulted("filament_weight", cx, || DEFAULT_FILAMENT_WEIGHT, decode_number);
        let diameter = obj.defaulted("diameter", cx, || DEFAULT_DIAMETER, decode_number);
        let empty_spool_weight = obj.nullable("empty_spool_weight", cx, decode_number);
        let spool_core_diameter = obj.nullable("spool_core_diameter", cx, decode_number);
        let ean = obj.nullable("ean", cx, LimitedString::decode);
        let article_number = obj.nullable("article_number", cx, LimitedString::decode);
        let barcode_identifier = obj.nullable("barcode_identifier", cx, LimitedString::decode);
        let nfc_identifier = obj.nullable("nfc_identifier", cx, LimitedString::decode);
        let qr_identifier = obj.nullable("qr_identifier", cx, LimitedString::decode);
        let discontinued = discontinued_flag(&mut obj, cx);
        let purchase_links = obj.nullable("purchase_links", cx, |value, path, cx| {
            decode_list(value, path, cx, PurchaseLink::decode)
        });
        obj.finish(Extensibility::Closed, cx);
        Some(Self {
            filament_weight: filament_weight?,
            diameter: diameter?,
            empty_spool_weight: empty_spool_weight?,
            spool_core_diameter: spool_core_diameter?,
            ean: ean?,
            article_number: article_number?,
            barcode_identifier: barcode_identifier?,
            nfc_identifier: nfc_identifier?,
            qr_identifier: qr_identifier?,
            discontinued: discontinued?,
            purchase_links: purchase_links?,
        })
    }
}

/// The whole of `sizes.json`: at least one size.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilamentSizes(Vec<FilamentSize>);

impl FilamentSizes {
    pub fn as_slice(&self) -> &[FilamentSize] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilamentSize> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for FilamentSizes {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
        decode_non_empty_list(value, path, cx, FilamentSize::decode).map(Self)
    }
}
