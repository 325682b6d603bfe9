//! On-disk catalog wiring.
//!
//! The catalog is a directory tree with one JSON document per level:
//!
//! ```text
//! <data>/<brand>/brand.json
//! <data>/<brand>/<material>/material.json
//! <data>/<brand>/<material>/<filament>/filament.json
//! <data>/<brand>/<material>/<filament>/<variant>/variant.json
//! <data>/<brand>/<material>/<filament>/<variant>/sizes.json
//! <stores>/<store>/store.json
//! ```
//!
//! Storage is reached only through [`CatalogSource`]; [`CatalogLoader`] turns
//! each level into a [`Listing`] of validated entities plus per-document
//! failures. Missing directories and missing level documents are treated as a
//! sparse catalog, never as errors.

pub mod listing;
pub mod loader;
pub mod offers;
pub mod report;
pub mod source;
pub mod stores;

pub use listing::{CatalogError, DocumentFailure, Entry, FailureKind, Listing};
pub use loader::{CatalogLoader, VariantWithSizes};
pub use offers::{Offer, OfferSheet, ReferenceError, resolve_offers};
pub use report::CatalogReport;
pub use source::{CatalogSource, FsSource};
pub use stores::StoreDirectory;

use crate::schema::entities::{Brand, ColorVariant, Filament, FilamentSizes, Material, Store};
use crate::schema::{Decode, FieldPath};
use serde::Serialize;
use std::fmt;

/// The document types found in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Store,
    Brand,
    Material,
    Filament,
    Variant,
    Sizes,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::Store,
        DocumentKind::Brand,
        DocumentKind::Material,
        DocumentKind::Filament,
        DocumentKind::Variant,
        DocumentKind::Sizes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Store => "store",
            DocumentKind::Brand => "brand",
            DocumentKind::Material => "material",
            DocumentKind::Filament => "filament",
            DocumentKind::Variant => "variant",
            DocumentKind::Sizes => "sizes",
        }
    }

    /// File name of the document inside its directory.
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Store => "store.json",
            DocumentKind::Brand => "brand.json",
            DocumentKind::Material => "material.json",
            DocumentKind::Filament => "filament.json",
            DocumentKind::Variant => "variant.json",
            DocumentKind::Sizes => "sizes.json",
        }
    }

    /// File name of the published JSON Schema for this document.
    pub fn schema_file(self) -> &'static str {
        match self {
            DocumentKind::Store => "store_schema.json",
            DocumentKind::Brand => "brand_schema.json",
            DocumentKind::Material => "material_schema.json",
            DocumentKind::Filament => "filament_schema.json",
            DocumentKind::Variant => "variant_schema.json",
            DocumentKind::Sizes => "sizes_schema.json",
        }
    }

    /// Root path for validation errors. `sizes.json` is a bare array, so its
    /// errors read `sizes[2].purchase_links[0].url`.
    pub fn root_path(self) -> FieldPath {
        match self {
            DocumentKind::Sizes => FieldPath::named("sizes"),
            _ => FieldPath::root(),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity stored as one file per catalog directory.
pub trait Document: Decode + Serialize {
    const KIND: DocumentKind;
}

impl Document for Store {
    const KIND: DocumentKind = DocumentKind::Store;
}

impl Document for Brand {
    const KIND: DocumentKind = DocumentKind::Brand;
}

impl Document for Material {
    const KIND: DocumentKind = DocumentKind::Material;
}

impl Document for Filament {
    const KIND: DocumentKind = DocumentKind::Filament;
}

impl Document for ColorVariant {
    const KIND: DocumentKind = DocumentKind::Variant;
}

impl Document for FilamentSizes {
    const KIND: DocumentKind = DocumentKind::Sizes;
}
