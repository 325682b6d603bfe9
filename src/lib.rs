//! Schema validation and settings resolution for an on-disk filament catalog.
//!
//! The catalog is a tree of JSON documents (brand, material, filament, color
//! variant, sizes) plus a separate tree of stores. This crate defines the
//! structural contract of every document, decodes documents through a strict
//! or permissive [`SchemaView`], and resolves the layered settings that span
//! documents: slicer settings (material defaults, filament overrides, generic
//! temperatures) and shipping locations (store defaults, purchase-link
//! overrides).
//!
//! The `ofd` binary wraps [`CatalogLoader`] as a read-only lookup tool that
//! prints `{"<level>": [...]}` payloads.

pub mod catalog;
pub mod config;
pub mod primitives;
pub mod resolve;
pub mod schema;
pub mod schema_loader;
pub mod traits;

pub use catalog::{
    CatalogError, CatalogLoader, CatalogReport, CatalogSource, Document, DocumentFailure,
    DocumentKind, Entry, FailureKind, FsSource, Listing, Offer, OfferSheet, ReferenceError,
    StoreDirectory, VariantWithSizes,
};
pub use config::{CatalogConfig, ConfigOverrides};
pub use primitives::{
    Color, Colors, CountryCode, HttpUrl, LimitedString, Locations, Nullable, OneOrMany,
};
pub use resolve::{
    EffectiveSlicerSettings, ResolvedSlicerSettings, Shipping, Temperatures, resolve_all,
    resolve_shipping, resolve_slicer,
};
pub use schema::entities::{
    Brand, ColorStandards, ColorVariant, Filament, FilamentSize, FilamentSizes, Material,
    PurchaseLink, SlicerIds, Store,
};
pub use schema::slicer::{
    GenericField, GenericSlicerSettings, OverrideValue, Slicer, SlicerSettings,
    SpecificSlicerSettings,
};
pub use schema::{
    Decode, FieldPath, Rule, SchemaMode, SchemaView, ValidationError, ValidationErrors,
};
pub use schema_loader::PublishedSchemas;
pub use traits::{TraitCategory, TraitGroup, TraitState, TraitTaxonomy, Traits};
