//! Trait vocabulary and the `traits` object on color variants.
//!
//! The taxonomy is a table of categories, each with a display name, an icon
//! and an ordered list of trait identifiers. The same table decides which keys
//! a `traits` object may carry and how asserted traits are grouped for
//! display. A replacement table can be loaded from JSON (see
//! [`TraitTaxonomy::load`]); otherwise the built-in table is used.

use crate::schema::{Context, Decode, FieldPath, Rule, json_type};
use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

const BUILTIN_CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Visual & Color",
        "\u{1F441}\u{FE0F}",
        &[
            "matte",
            "silk",
            "translucent",
            "transparent",
            "without_pigments",
            "iridescent",
            "pearlescent",
            "glitter",
            "glow",
            "neon",
            "illuminescent_color_change",
            "temperature_color_change",
            "gradual_color_change",
            "coextruded",
        ],
    ),
    (
        "Biological",
        "\u{1F9EC}",
        &[
            "filtration_recommended",
            "biocompatible",
            "antibacterial",
            "air_filtering",
            "home_compostable",
            "industrially_compostable",
            "bio_based",
            "biodegradable",
        ],
    ),
    (
        "Physical",
        "\u{2699}\u{FE0F}",
        &[
            "abrasive",
            "foaming",
            "castable",
            "self_extinguishing",
            "paramagnetic",
            "radiation_shielding",
            "high_temperature",
        ],
    ),
    ("Electrical", "\u{26A1}", &["esd_safe", "conductive", "emi_shielding"]),
    (
        "Chemical",
        "\u{1F9EA}",
        &[
            "blend",
            "water_soluble",
            "ipa_soluble",
            "limonene_soluble",
            "low_outgassing",
        ],
    ),
    (
        "Carbon",
        "\u{1F5A4}",
        &[
            "contains_carbon",
            "contains_carbon_fiber",
            "contains_carbon_nano_tubes",
        ],
    ),
    (
        "Glass & Kevlar",
        "\u{1F6E1}\u{FE0F}",
        &[
            "contains_glass",
            "contains_glass_fiber",
            "contains_kevlar",
            "contains_ptfe",
        ],
    ),
    ("Minerals", "\u{26F0}\u{FE0F}", &["contains_stone", "contains_magnetite"]),
    (
        "Organic Materials",
        "\u{1F33F}",
        &[
            "contains_organic_material",
            "contains_cork",
            "contains_wax",
            "contains_wood",
            "contains_bamboo",
            "contains_pine",
            "contains_algae",
        ],
    ),
    ("Ceramic", "\u{1F3FA}", &["contains_ceramic", "contains_boron_carbide"]),
    (
        "Metals",
        "\u{1F529}",
        &[
            "contains_metal",
            "contains_bronze",
            "contains_iron",
            "contains_steel",
            "contains_silver",
            "contains_copper",
            "contains_aluminium",
            "contains_brass",
            "contains_tungsten",
        ],
    ),
    (
        "Imitation",
        "\u{1F3AD}",
        &[
            "imitates_wood",
            "imitates_metal",
            "imitates_marble",
            "imitates_stone",
        ],
    ),
    (
        "Other",
        "\u{1F4E6}",
        &["lithophane", "recycled", "limited_edition", "recyclable"],
    ),
];

static BUILTIN: LazyLock<TraitTaxonomy> = LazyLock::new(|| {
    let categories = BUILTIN_CATEGORIES
        .iter()
        .map(|(name, icon, traits)| TraitCategory {
            name: name.to_string(),
            icon: icon.to_string(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
        })
        .collect();
    TraitTaxonomy::index_unchecked(categories)
});

/// One display group of traits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCategory {
    pub name: String,
    pub icon: String,
    pub traits: Vec<String>,
}

/// Ordered categories plus a trait-to-category index.
#[derive(Clone, Debug)]
pub struct TraitTaxonomy {
    categories: Vec<TraitCategory>,
    index: BTreeMap<String, usize>,
}

impl TraitTaxonomy {
    /// The vocabulary shipped with the crate.
    pub fn builtin() -> &'static TraitTaxonomy {
        &BUILTIN
    }

    /// Build a taxonomy from a category table.
    ///
    /// Trait identifiers must be unique across the whole table and neither
    /// category names nor identifiers may be blank.
    pub fn from_categories(categories: Vec<TraitCategory>) -> Result<Self> {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for category in &categories {
            if category.name.trim().is_empty() {
                bail!("trait category names must not be empty");
            }
            for name in &category.traits {
                if name.trim().is_empty() {
                    bail!("category '{}' contains an empty trait name", category.name);
                }
                if let Some(previous) = seen.insert(name.as_str(), category.name.as_str()) {
                    bail!(
                        "trait '{}' listed in both '{}' and '{}'",
                        name,
                        previous,
                        category.name
                    );
                }
            }
        }
        Ok(Self::index_unchecked(categories))
    }

    /// Load a JSON table `[{"name", "icon", "traits": [...]}, ...]`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening trait taxonomy {}", path.display()))?;
        let categories: Vec<TraitCategory> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing trait taxonomy {}", path.display()))?;
        Self::from_categories(categories)
            .with_context(|| format!("validating trait taxonomy {}", path.display()))
    }

    fn index_unchecked(categories: Vec<TraitCategory>) -> Self {
        let mut index = BTreeMap::new();
        for (idx, category) in categories.iter().enumerate() {
            for name in &category.traits {
                index.entry(name.clone()).or_insert(idx);
            }
        }
        Self { categories, index }
    }

    pub fn categories(&self) -> &[TraitCategory] {
        &self.categories
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn category_of(&self, name: &str) -> Option<&TraitCategory> {
        self.index.get(name).map(|idx| &self.categories[*idx])
    }

    /// Every legal trait identifier, in table order.
    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|category| category.traits.iter().map(String::as_str))
    }

    /// Group the asserted and denied traits of a variant by category.
    ///
    /// Categories keep table order and traits keep their order inside the
    /// category; unknown (`null`/absent) traits and empty categories are left
    /// out.
    pub fn group(&self, traits: &Traits) -> Vec<TraitGroup> {
        self.categories
            .iter()
            .filter_map(|category| {
                let entries: Vec<TraitEntry> = category
                    .traits
                    .iter()
                    .filter_map(|name| match traits.state(name) {
                        TraitState::Asserted => Some(TraitEntry {
                            name: name.clone(),
                            value: true,
                        }),
                        TraitState::Denied => Some(TraitEntry {
                            name: name.clone(),
                            value: false,
                        }),
                        TraitState::Unknown => None,
                    })
                    .collect();
                (!entries.is_empty()).then(|| TraitGroup {
                    name: category.name.clone(),
                    icon: category.icon.clone(),
                    traits: entries,
                })
            })
            .collect()
    }
}

/// What a variant says about one trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraitState {
    Asserted,
    Denied,
    Unknown,
}

/// `traits` object of a color variant: trait name to nullable flag.
///
/// A key mapped to `null` is kept so the object re-encodes unchanged; for
/// every reader it means the same as a missing key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Traits(BTreeMap<String, Option<bool>>);

impl Traits {
    pub fn state(&self, name: &str) -> TraitState {
        match self.0.get(name) {
            Some(Some(true)) => TraitState::Asserted,
            Some(Some(false)) => TraitState::Denied,
            Some(None) | None => TraitState::Unknown,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<bool>)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for Traits {
    fn decode(value: &Value, path: &FieldPath, cx: &mut Context<'_>) -> Option<Self> {
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
        let taxonomy = cx.taxonomy();
        let mut traits = BTreeMap::new();
        let mut failed = false;
        for (name, raw) in map {
            let field = path.key(name);
            if !taxonomy.contains(name) {
                cx.report(&field, Rule::UnknownTrait { name: name.clone() });
                failed = true;
                continue;
            }
            match raw {
                Value::Bool(flag) => {
                    traits.insert(name.clone(), Some(*flag));
                }
                Value::Null => {
                    traits.insert(name.clone(), None);
                }
                other => {
                    cx.report(
                        &field,
                        Rule::WrongType {
                            expected: "boolean or null",
                            found: json_type(other),
                        },
                    );
                    failed = true;
                }
            }
        }
        if failed { None } else { Some(Traits(traits)) }
    }
}

/// A trait with a definite value, as shown in a [`TraitGroup`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraitEntry {
    pub name: String,
    pub value: bool,
}

/// Display grouping of a variant's traits under one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraitGroup {
    pub name: String,
    pub icon: String,
    pub traits: Vec<TraitEntry>,
}
