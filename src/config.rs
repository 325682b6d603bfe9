//! Catalog location and schema view settings.
//!
//! Each setting is taken from the first layer that provides it: an explicit
//! override (CLI flag), then the environment, then the built-in default.
//! Empty environment values count as unset.

use crate::schema::SchemaMode;
use crate::traits::TraitTaxonomy;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;

pub const DATA_PATH_ENV: &str = "OFD_DATA_PATH";
pub const STORES_PATH_ENV: &str = "OFD_STORES_PATH";
pub const SCHEMA_MODE_ENV: &str = "OFD_SCHEMA_MODE";
pub const TRAIT_TAXONOMY_ENV: &str = "OFD_TRAIT_TAXONOMY";
/// Filter directives for the binary's log output.
pub const LOG_ENV: &str = "OFD_LOG";

const DEFAULT_DATA_PATH: &str = "data";
const DEFAULT_STORES_PATH: &str = "stores";

/// Resolved settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub data_root: PathBuf,
    pub stores_root: PathBuf,
    pub mode: SchemaMode,
    /// Replacement trait table; the built-in one is used when unset.
    pub taxonomy_path: Option<PathBuf>,
}

/// Values supplied explicitly by the caller; each wins over the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_root: Option<PathBuf>,
    pub stores_root: Option<PathBuf>,
    pub mode: Option<SchemaMode>,
    pub taxonomy_path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_root = overrides
            .data_root
            .or_else(|| var(DATA_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let stores_root = overrides
            .stores_root
            .or_else(|| var(STORES_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORES_PATH));
        let mode = match overrides.mode {
            Some(mode) => mode,
            None => match var(SCHEMA_MODE_ENV) {
                Some(raw) => raw
                    .parse::<SchemaMode>()
                    .map_err(|err| anyhow!("{SCHEMA_MODE_ENV}: {err}"))?,
                None => SchemaMode::default(),
            },
        };
        let taxonomy_path = overrides
            .taxonomy_path
            .or_else(|| var(TRAIT_TAXONOMY_ENV).map(PathBuf::from));

        Ok(Self {
            data_root,
            stores_root,
            mode,
            taxonomy_path,
        })
    }

    /// The configured trait table, or the built-in one.
    pub fn load_taxonomy(&self) -> Result<TraitTaxonomy> {
        match &self.taxonomy_path {
            Some(path) => TraitTaxonomy::load(path)
                .with_context(|| format!("loading {TRAIT_TAXONOMY_ENV} table")),
            None => Ok(TraitTaxonomy::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let config = CatalogConfig::resolve_with(ConfigOverrides::default(), lookup(&[])).unwrap();
        assert_eq!(config.data_root, PathBuf::from("data"));
        assert_eq!(config.stores_root, PathBuf::from("stores"));
        assert_eq!(config.mode, SchemaMode::Strict);
        assert_eq!(config.taxonomy_path, None);
    }

    #[test]
    fn flags_win_over_env_and_empty_env_is_ignored() {
        let env = lookup(&[
            (DATA_PATH_ENV, "/srv/catalog"),
            (STORES_PATH_ENV, "  "),
            (SCHEMA_MODE_ENV, "permissive"),
        ]);
        let overrides = ConfigOverrides {
            data_root: Some(PathBuf::from("/tmp/override")),
            ..Default::default()
        };
        let config = CatalogConfig::resolve_with(overrides, env).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/tmp/override"));
        assert_eq!(config.stores_root, PathBuf::from("stores"));
        assert_eq!(config.mode, SchemaMode::Permissive);
    }

    #[test]
    fn invalid_mode_in_env_is_an_error() {
        let err = CatalogConfig::resolve_with(
            ConfigOverrides::default(),
            lookup(&[(SCHEMA_MODE_ENV, "lenient")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(SCHEMA_MODE_ENV));
    }

    #[test]
    fn builtin_taxonomy_is_used_without_path() {
        let config = CatalogConfig::resolve_with(ConfigOverrides::default(), lookup(&[])).unwrap();
        assert!(config.load_taxonomy().unwrap().contains("glow"));
    }
}
