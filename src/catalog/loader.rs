//! Loads catalog levels through a [`CatalogSource`].
//!
//! Each listing call reads one directory level: child directories become
//! entries when their level document validates, are skipped when the document
//! is missing, and become [`DocumentFailure`]s otherwise. A failing document
//! never hides its siblings. Caller-supplied ids are checked to be single
//! path components before anything touches storage.

use crate::catalog::listing::{CatalogError, DocumentFailure, Entry, FailureKind, Listing};
use crate::catalog::offers::{OfferSheet, resolve_offers};
use crate::catalog::report::CatalogReport;
use crate::catalog::source::{CatalogSource, FsSource};
use crate::catalog::stores::StoreDirectory;
use crate::catalog::{Document, DocumentKind};
use crate::config::CatalogConfig;
use crate::resolve::{ResolvedSlicerSettings, resolve_all};
use crate::schema::SchemaView;
use crate::schema::entities::{Brand, ColorVariant, Filament, FilamentSizes, Material, Store};
use crate::schema_loader::PublishedSchemas;
use crate::traits::TraitTaxonomy;
use serde::Serialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// A color variant together with its `sizes.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariantWithSizes {
    #[serde(flatten)]
    pub variant: ColorVariant,
    pub sizes: FilamentSizes,
}

/// Read-only view of one catalog tree and one stores tree.
pub struct CatalogLoader<'t, S = FsSource> {
    source: S,
    data_root: PathBuf,
    stores_root: PathBuf,
    view: SchemaView<'t>,
    published: Option<PublishedSchemas>,
}

impl<'t> CatalogLoader<'t, FsSource> {
    /// Filesystem loader for the roots and mode in `config`.
    pub fn from_config(config: &CatalogConfig, taxonomy: &'t TraitTaxonomy) -> Self {
        Self::new(
            FsSource,
            &config.data_root,
            &config.stores_root,
            SchemaView::new(config.mode, taxonomy),
        )
    }
}

impl<'t, S: CatalogSource> CatalogLoader<'t, S> {
    pub fn new(
        source: S,
        data_root: impl Into<PathBuf>,
        stores_root: impl Into<PathBuf>,
        view: SchemaView<'t>,
    ) -> Self {
        Self {
            source,
            data_root: data_root.into(),
            stores_root: stores_root.into(),
            view,
            published: None,
        }
    }

    /// Also check every document against the published JSON Schemas.
    pub fn with_published_schemas(mut self, schemas: PublishedSchemas) -> Self {
        self.published = Some(schemas);
        self
    }

    pub fn view(&self) -> SchemaView<'t> {
        self.view
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn stores_root(&self) -> &Path {
        &self.stores_root
    }

    pub fn brands(&self) -> Result<Listing<Brand>, CatalogError> {
        self.list(&self.data_root)
    }

    pub fn materials(&self, brand: &str) -> Result<Listing<Material>, CatalogError> {
        let dir = self.level_dir(&[brand])?;
        self.list(&dir)
    }

    pub fn filaments(&self, brand: &str, material: &str) -> Result<Listing<Filament>, CatalogError> {
        let dir = self.level_dir(&[brand, material])?;
        self.list(&dir)
    }

    /// Variants of a filament, each with its sizes.
    ///
    /// A variant whose `sizes.json` is missing or invalid is left out and
    /// reported, since a variant without sizes is not a valid entry.
    pub fn variants(
        &self,
        brand: &str,
        material: &str,
        filament: &str,
    ) -> Result<Listing<VariantWithSizes>, CatalogError> {
        let dir = self.level_dir(&[brand, material, filament])?;
        let mut listing = Listing::default();
        for child in self.children(&dir)? {
            match self.load_variant_dir(&child) {
                Ok(Some(entry)) => listing.entries.push(entry),
                Ok(None) => {}
                Err(failures) => listing.failures.extend(failures),
            }
        }
        Ok(listing)
    }

    pub fn stores(&self) -> Result<Listing<Store>, CatalogError> {
        self.list(&self.stores_root)
    }

    pub fn brand(&self, brand: &str) -> Result<Option<Brand>, CatalogError> {
        let dir = self.level_dir(&[brand])?;
        Ok(self.load::<Brand>(&dir)?)
    }

    pub fn material(&self, brand: &str, material: &str) -> Result<Option<Material>, CatalogError> {
        let dir = self.level_dir(&[brand, material])?;
        Ok(self.load::<Material>(&dir)?)
    }

    pub fn filament(
        &self,
        brand: &str,
        material: &str,
        filament: &str,
    ) -> Result<Option<Filament>, CatalogError> {
        let dir = self.level_dir(&[brand, material, filament])?;
        Ok(self.load::<Filament>(&dir)?)
    }

    /// One variant with its sizes.
    ///
    /// When both `variant.json` and `sizes.json` are rejected, both failures
    /// are returned.
    pub fn variant(
        &self,
        brand: &str,
        material: &str,
        filament: &str,
        variant: &str,
    ) -> Result<Option<VariantWithSizes>, CatalogError> {
        let dir = self.level_dir(&[brand, material, filament, variant])?;
        match self.load_variant_dir(&dir) {
            Ok(entry) => Ok(entry.map(|entry| entry.value)),
            Err(failures) => Err(CatalogError::from_failures(failures)),
        }
    }

    /// Effective slicer settings of a filament, layered over its material.
    ///
    /// `None` when either document is missing.
    pub fn slicer_settings(
        &self,
        brand: &str,
        material: &str,
        filament: &str,
    ) -> Result<Option<ResolvedSlicerSettings>, CatalogError> {
        let Some(material_doc) = self.material(brand, material)? else {
            return Ok(None);
        };
        let Some(filament_doc) = self.filament(brand, material, filament)? else {
            return Ok(None);
        };
        Ok(Some(resolve_all(&material_doc, &filament_doc)))
    }

    /// Purchase links of one variant joined with the stores directory.
    ///
    /// Returns `None` when the variant does not exist. Unknown store ids end
    /// up in [`OfferSheet::unresolved`]; store documents that failed to load
    /// are carried in [`OfferSheet::store_failures`].
    pub fn offers(
        &self,
        brand: &str,
        material: &str,
        filament: &str,
        variant: &str,
    ) -> Result<Option<OfferSheet>, CatalogError> {
        let dir = self.level_dir(&[brand, material, filament, variant])?;
        let Some(found) = self.variant(brand, material, filament, variant)? else {
            return Ok(None);
        };
        let stores = self.stores()?;
        let (directory, duplicates) = StoreDirectory::build(stores.entries);
        let mut sheet = resolve_offers(
            &dir.join(DocumentKind::Sizes.file_name()),
            &found.sizes,
            &directory,
        );
        sheet.store_failures = stores.failures;
        sheet.store_failures.extend(duplicates);
        for unresolved in &sheet.unresolved {
            warn!("{unresolved}");
        }
        Ok(Some(sheet))
    }

    /// Walk the whole tree and collect every failure and broken reference.
    pub fn validate_tree(&self) -> Result<CatalogReport, CatalogError> {
        let mut report = CatalogReport::default();

        let stores = self.stores()?;
        report.stores = stores.entries.len();
        report.failures.extend(stores.failures);
        let (directory, duplicates) = StoreDirectory::build(stores.entries);
        report.failures.extend(duplicates);

        // Descend into every directory, whether or not its own document
        // loaded, so a broken level never hides the levels below it.
        for brand_dir in self.children(&self.data_root)? {
            report.brands += self.check_document::<Brand>(&brand_dir, &mut report.failures);
            for material_dir in self.children(&brand_dir)? {
                report.materials +=
                    self.check_document::<Material>(&material_dir, &mut report.failures);
                for filament_dir in self.children(&material_dir)? {
                    report.filaments +=
                        self.check_document::<Filament>(&filament_dir, &mut report.failures);
                    for variant_dir in self.children(&filament_dir)? {
                        let variant = match self.load_variant_dir(&variant_dir) {
                            Ok(Some(variant)) => variant,
                            Ok(None) => continue,
                            Err(failures) => {
                                report.failures.extend(failures);
                                continue;
                            }
                        };
                        report.variants += 1;
                        let sizes_path = variant_dir.join(DocumentKind::Sizes.file_name());
                        let sheet = resolve_offers(&sizes_path, &variant.value.sizes, &directory);
                        report.offers += sheet.offers.len();
                        report.unresolved.extend(sheet.unresolved);
                    }
                }
            }
        }

        if report.is_clean() {
            info!(
                brands = report.brands,
                variants = report.variants,
                stores = report.stores,
                "catalog validated"
            );
        } else {
            warn!(
                failures = report.failures.len(),
                unresolved = report.unresolved.len(),
                "catalog has problems"
            );
        }
        Ok(report)
    }

    fn level_dir(&self, segments: &[&str]) -> Result<PathBuf, CatalogError> {
        let mut dir = self.data_root.clone();
        for segment in segments {
            dir.push(checked_segment(segment)?);
        }
        Ok(dir)
    }

    fn children(&self, dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
        self.source
            .list_child_directories(dir)
            .map_err(|source| CatalogError::Listing {
                path: dir.to_path_buf(),
                source,
            })
    }

    /// 1 if the level document of `dir` validates, 0 if it is missing or
    /// rejected; rejections are pushed onto `failures`.
    fn check_document<T: Document>(&self, dir: &Path, failures: &mut Vec<DocumentFailure>) -> usize {
        match self.load::<T>(dir) {
            Ok(Some(_)) => 1,
            Ok(None) => 0,
            Err(failure) => {
                failures.push(failure);
                0
            }
        }
    }

    fn list<T: Document>(&self, dir: &Path) -> Result<Listing<T>, CatalogError> {
        let mut listing = Listing::default();
        for child in self.children(dir)? {
            let path = child.join(T::KIND.file_name());
            match self.load::<T>(&child) {
                Ok(Some(value)) => listing.entries.push(Entry {
                    id: dir_name(&child),
                    path,
                    value,
                }),
                Ok(None) => {}
                Err(failure) => listing.failures.push(failure),
            }
        }
        Ok(listing)
    }

    fn load_variant_dir(
        &self,
        dir: &Path,
    ) -> Result<Option<Entry<VariantWithSizes>>, Vec<DocumentFailure>> {
        let variant = self.load::<ColorVariant>(dir);
        let sizes_path = dir.join(DocumentKind::Sizes.file_name());
        // sizes.json is read even without variant.json so a malformed one
        // is still reported.
        let sizes = match (&variant, self.load::<FilamentSizes>(dir)) {
            (Ok(None), Ok(_)) => return Ok(None),
            (_, Ok(Some(sizes))) => Ok(sizes),
            (_, Ok(None)) => {
                let failure = DocumentFailure::new(&sizes_path, FailureKind::MissingSizes);
                warn!("{failure}");
                Err(failure)
            }
            (_, Err(failure)) => Err(failure),
        };
        match (variant, sizes) {
            (Ok(Some(variant)), Ok(sizes)) => Ok(Some(Entry {
                id: dir_name(dir),
                path: dir.join(DocumentKind::Variant.file_name()),
                value: VariantWithSizes { variant, sizes },
            })),
            (variant, sizes) => Err(variant.err().into_iter().chain(sizes.err()).collect()),
        }
    }

    /// Read and decode the level document of `dir`; `None` if it is missing.
    fn load<T: Document>(&self, dir: &Path) -> Result<Option<T>, DocumentFailure> {
        let path = dir.join(T::KIND.file_name());
        let Some(value) = self.read_value(&path)? else {
            debug!(path = %path.display(), "no {} document, skipping", T::KIND);
            return Ok(None);
        };
        let result = self.check_published(T::KIND, &path, &value).and_then(|()| {
            self.view
                .decode_at::<T>(&value, T::KIND.root_path())
                .map_err(|errors| DocumentFailure::new(&path, FailureKind::Invalid(errors)))
        });
        match result {
            Ok(decoded) => Ok(Some(decoded)),
            Err(failure) => {
                warn!("{failure}");
                Err(failure)
            }
        }
    }

    fn read_value(&self, path: &Path) -> Result<Option<Value>, DocumentFailure> {
        let bytes = match self.source.read_document(path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(err) => {
                let failure = DocumentFailure::read(path, &err);
                warn!("{failure}");
                return Err(failure);
            }
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            let failure = DocumentFailure::new(path, FailureKind::Parse(err.to_string()));
            warn!("{failure}");
            failure
        })
    }

    fn check_published(
        &self,
        kind: DocumentKind,
        path: &Path,
        value: &Value,
    ) -> Result<(), DocumentFailure> {
        let Some(published) = &self.published else {
            return Ok(());
        };
        published
            .check(kind, value)
            .map_err(|messages| DocumentFailure::new(path, FailureKind::Schema(messages)))
    }
}

/// Accept an id only if it names exactly one normal path component.
fn checked_segment(segment: &str) -> Result<&str, CatalogError> {
    let reject = |reason| CatalogError::InvalidSegment {
        segment: segment.to_string(),
        reason,
    };
    if segment.trim().is_empty() {
        return Err(reject("empty id"));
    }
    if segment.contains(['/', '\\']) {
        return Err(reject("contains a path separator"));
    }
    if segment.starts_with('.') {
        return Err(reject("hidden or relative component"));
    }
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(segment),
        _ => Err(reject("not a single path component")),
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_guard_rejects_traversal() {
        for bad in ["", " ", "..", ".", "a/b", "a\\b", ".hidden", "/abs"] {
            assert!(
                matches!(checked_segment(bad), Err(CatalogError::InvalidSegment { .. })),
                "{bad:?}"
            );
        }
        for ok in ["prusament", "PLA", "Galaxy Black", "pla_basic-1.75"] {
            assert_eq!(checked_segment(ok).unwrap(), ok);
        }
    }
}
