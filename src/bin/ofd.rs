//! Read-only lookups over a filament catalog.
//!
//! Usage:
//!   ofd brands
//!   ofd variants prusament pla prusament_pla
//!   ofd slicer prusament pla prusament_pla --slicer prusaslicer
//!   ofd --mode permissive validate --schemas schemas
//!
//! Payloads go to stdout as JSON. Rejected documents are logged to stderr
//! (`OFD_LOG` sets the filter, default `warn`) and make the command exit 2;
//! hard errors exit 1.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use filament_catalog::config::LOG_ENV;
use filament_catalog::{
    CatalogConfig, CatalogLoader, ConfigOverrides, Listing, PublishedSchemas, SchemaMode, Slicer,
};
use serde::Serialize;
use serde_json::Value;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ofd")]
#[command(about = "Query and validate an on-disk filament catalog")]
struct Cli {
    /// Catalog root (overrides OFD_DATA_PATH).
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Stores root (overrides OFD_STORES_PATH).
    #[arg(long, global = true)]
    stores: Option<PathBuf>,
    /// Schema view: strict or permissive (overrides OFD_SCHEMA_MODE).
    #[arg(long, global = true)]
    mode: Option<SchemaMode>,
    /// Trait taxonomy table (overrides OFD_TRAIT_TAXONOMY).
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List brands.
    Brands,
    /// List materials of a brand.
    Materials { brand: String },
    /// List filaments of a material.
    Filaments { brand: String, material: String },
    /// List color variants of a filament, with their sizes.
    Variants {
        brand: String,
        material: String,
        filament: String,
    },
    /// List stores.
    Stores,
    /// Effective slicer settings of a filament.
    Slicer {
        brand: String,
        material: String,
        filament: String,
        /// Only this slicer (prusaslicer, bambustudio, orcaslicer, cura).
        #[arg(long)]
        slicer: Option<Slicer>,
    },
    /// Purchase offers of a variant, joined with stores.
    Offers {
        brand: String,
        material: String,
        filament: String,
        variant: String,
    },
    /// Print the trait taxonomy.
    Traits,
    /// Validate the whole catalog and stores tree.
    Validate {
        /// Also check documents against the JSON Schemas in this directory.
        #[arg(long)]
        schemas: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ofd: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = CatalogConfig::resolve(ConfigOverrides {
        data_root: cli.data,
        stores_root: cli.stores,
        mode: cli.mode,
        taxonomy_path: cli.taxonomy,
    })?;
    let taxonomy = config.load_taxonomy()?;
    let mut loader = CatalogLoader::from_config(&config, &taxonomy);

    match cli.command {
        Command::Brands => emit_listing(loader.brands()?, "brands"),
        Command::Materials { brand } => emit_listing(loader.materials(&brand)?, "materials"),
        Command::Filaments { brand, material } => {
            emit_listing(loader.filaments(&brand, &material)?, "filaments")
        }
        Command::Variants {
            brand,
            material,
            filament,
        } => emit_listing(loader.variants(&brand, &material, &filament)?, "variants"),
        Command::Stores => emit_listing(loader.stores()?, "stores"),
        Command::Slicer {
            brand,
            material,
            filament,
            slicer,
        } => {
            let Some(resolved) = loader.slicer_settings(&brand, &material, &filament)? else {
                bail!("no filament {brand}/{material}/{filament} under {}", config.data_root.display());
            };
            match slicer {
                Some(slicer) => emit(&resolved.get(slicer))?,
                None => emit(&resolved)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Offers {
            brand,
            material,
            filament,
            variant,
        } => {
            let Some(sheet) = loader.offers(&brand, &material, &filament, &variant)? else {
                bail!(
                    "no variant {brand}/{material}/{filament}/{variant} under {}",
                    config.data_root.display()
                );
            };
            emit(&sheet)?;
            Ok(exit_for(sheet.is_complete()))
        }
        Command::Traits => {
            emit(&serde_json::json!({ "categories": taxonomy.categories() }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { schemas } => {
            if let Some(dir) = schemas {
                let published = PublishedSchemas::load(&dir)
                    .with_context(|| format!("loading published schemas from {}", dir.display()))?;
                loader = loader.with_published_schemas(published);
            }
            let report = loader.validate_tree()?;
            emit(&report)?;
            if !report.is_clean() {
                eprintln!("ofd: {} problem(s) found", report.problems().len());
            }
            Ok(exit_for(report.is_clean()))
        }
    }
}

fn emit_listing<T: Serialize>(listing: Listing<T>, key: &str) -> Result<ExitCode> {
    let payload: Value = listing
        .payload(key)
        .with_context(|| format!("serializing {key}"))?;
    emit(&payload)?;
    if !listing.is_complete() {
        eprintln!(
            "ofd: {} document(s) omitted from {key}",
            listing.failures.len()
        );
    }
    Ok(exit_for(listing.is_complete()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("writing JSON to stdout")?;
    writeln!(out).context("writing JSON to stdout")?;
    Ok(())
}

fn exit_for(complete: bool) -> ExitCode {
    if complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
