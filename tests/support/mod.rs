#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use filament_catalog::{CatalogLoader, FsSource, SchemaView};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A catalog tree and a stores tree inside one temporary directory.
pub struct CatalogFixture {
    _dir: TempDir,
    pub data: PathBuf,
    pub stores: PathBuf,
}

impl CatalogFixture {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("allocating catalog tempdir")?;
        let data = dir.path().join("data");
        let stores = dir.path().join("stores");
        fs::create_dir_all(&data)?;
        fs::create_dir_all(&stores)?;
        Ok(Self {
            _dir: dir,
            data,
            stores,
        })
    }

    pub fn loader(&self) -> CatalogLoader<'static, FsSource> {
        self.loader_with(SchemaView::strict())
    }

    pub fn loader_with(&self, view: SchemaView<'static>) -> CatalogLoader<'static, FsSource> {
        CatalogLoader::new(FsSource, &self.data, &self.stores, view)
    }

    /// Write `value` as JSON to `<data>/<rel>`, creating parent directories.
    pub fn write_json(&self, rel: &str, value: &Value) -> Result<PathBuf> {
        self.write_raw(rel, &serde_json::to_string_pretty(value)?)
    }

    pub fn write_raw(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        write_file(&self.data.join(rel), contents)
    }

    pub fn write_store(&self, dir: &str, value: &Value) -> Result<PathBuf> {
        write_file(
            &self.stores.join(dir).join("store.json"),
            &serde_json::to_string_pretty(value)?,
        )
    }

    pub fn mkdir(&self, rel: &str) -> Result<PathBuf> {
        let path = self.data.join(rel);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// brand, material, filament and one variant with `sizes`.
    pub fn seed_variant(&self, prefix: &str, color: &str, sizes: &Value) -> Result<()> {
        let mut parts = prefix.split('/');
        let (Some(brand), Some(material), Some(filament)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("prefix must be brand/material/filament, got {prefix}");
        };
        self.write_json(&format!("{brand}/brand.json"), &brand_json(brand))?;
        self.write_json(
            &format!("{brand}/{material}/material.json"),
            &material_json(material),
        )?;
        self.write_json(
            &format!("{brand}/{material}/{filament}/filament.json"),
            &filament_json(filament),
        )?;
        self.write_json(
            &format!("{prefix}/{color}/variant.json"),
            &variant_json(color, json!("#FF0000")),
        )?;
        self.write_json(&format!("{prefix}/{color}/sizes.json"), sizes)?;
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}

pub fn brand_json(name: &str) -> Value {
    json!({
        "brand": name,
        "website": format!("https://{name}.example"),
        "logo": "logo.png",
        "origin": "CZ"
    })
}

pub fn material_json(name: &str) -> Value {
    json!({
        "material": name.to_uppercase(),
        "default_max_dry_temperature": 55,
        "default_slicer_settings": null
    })
}

pub fn filament_json(name: &str) -> Value {
    json!({
        "name": name,
        "diameter_tolerance": 0.02,
        "data_sheet_url": null,
        "discontinued": false
    })
}

pub fn variant_json(color: &str, hex: Value) -> Value {
    json!({
        "color_name": color,
        "color_hex": hex,
        "traits": {"matte": true}
    })
}

pub fn store_json(id: &str, ships_from: Value) -> Value {
    json!({
        "id": id,
        "name": format!("Store {id}"),
        "storefront_url": format!("https://{id}.example"),
        "storefront_affiliate_link": null,
        "logo": "logo.png",
        "ships_from": ships_from,
        "ships_to": ["US", "CA", "MX"]
    })
}

/// Run the `ofd` binary against `fixture`, returning its output whatever the
/// exit status.
pub fn run_ofd(fixture: &CatalogFixture, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ofd"));
    cmd.arg("--data")
        .arg(&fixture.data)
        .arg("--stores")
        .arg(&fixture.stores)
        .args(args)
        .env_remove("OFD_SCHEMA_MODE")
        .env_remove("OFD_TRAIT_TAXONOMY")
        .env("OFD_LOG", "off");
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).with_context(|| {
        format!(
            "stdout was not JSON\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
