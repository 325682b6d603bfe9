//! Settings resolution.
//!
//! Two override chains live here and nowhere else:
//!
//! * slicer settings: material defaults, then filament overrides, then the
//!   generic temperatures filling whatever a slicer-specific profile leaves
//!   open;
//! * shipping: store locations, replaced per purchase link.
//!
//! Every function is pure over borrowed, already-validated entities. Null and
//! absent are the same "not specified" case throughout.

use crate::primitives::{LimitedString, Locations, Nullable};
use crate::schema::entities::{Filament, Material, PurchaseLink, Store};
use crate::schema::slicer::{
    GenericField, GenericSlicerSettings, OverrideValue, Slicer, SlicerSettings,
    SpecificSlicerSettings,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// The four temperatures surfaced for a slicer after resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Temperatures {
    pub nozzle_temp: Option<i64>,
    pub first_layer_nozzle_temp: Option<i64>,
    pub bed_temp: Option<i64>,
    pub first_layer_bed_temp: Option<i64>,
}

impl Temperatures {
    fn set(&mut self, field: GenericField, value: Option<i64>) {
        let slot = match field {
            GenericField::NozzleTemp => &mut self.nozzle_temp,
            GenericField::FirstLayerNozzleTemp => &mut self.first_layer_nozzle_temp,
            GenericField::BedTemp => &mut self.bed_temp,
            GenericField::FirstLayerBedTemp => &mut self.first_layer_bed_temp,
        };
        *slot = value;
    }

    pub fn get(&self, field: GenericField) -> Option<i64> {
        match field {
            GenericField::NozzleTemp => self.nozzle_temp,
            GenericField::FirstLayerNozzleTemp => self.first_layer_nozzle_temp,
            GenericField::BedTemp => self.bed_temp,
            GenericField::FirstLayerBedTemp => self.first_layer_bed_temp,
        }
    }
}

/// Effective configuration of one filament for one slicer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectiveSlicerSettings {
    pub slicer: Slicer,
    pub profile_name: Option<LimitedString>,
    pub slicer_id: Option<LimitedString>,
    /// Native option overrides: the profile's own, plus generic values under
    /// the slicer's key wherever the profile left that key unset.
    pub overrides: BTreeMap<String, OverrideValue>,
    pub temperatures: Temperatures,
}

/// Effective settings for every slicer, `None` where nothing applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolvedSlicerSettings {
    pub prusaslicer: Option<EffectiveSlicerSettings>,
    pub bambustudio: Option<EffectiveSlicerSettings>,
    pub orcaslicer: Option<EffectiveSlicerSettings>,
    pub cura: Option<EffectiveSlicerSettings>,
}

impl ResolvedSlicerSettings {
    pub fn get(&self, slicer: Slicer) -> Option<&EffectiveSlicerSettings> {
        match slicer {
            Slicer::PrusaSlicer => self.prusaslicer.as_ref(),
            Slicer::BambuStudio => self.bambustudio.as_ref(),
            Slicer::OrcaSlicer => self.orcaslicer.as_ref(),
            Slicer::Cura => self.cura.as_ref(),
        }
    }

    fn slot(&mut self, slicer: Slicer) -> &mut Option<EffectiveSlicerSettings> {
        match slicer {
            Slicer::PrusaSlicer => &mut self.prusaslicer,
            Slicer::BambuStudio => &mut self.bambustudio,
            Slicer::OrcaSlicer => &mut self.orcaslicer,
            Slicer::Cura => &mut self.cura,
        }
    }
}

/// Layer two generic blocks field by field; a value in `top` wins.
pub fn layer_generic(
    base: Option<&GenericSlicerSettings>,
    top: Option<&GenericSlicerSettings>,
) -> GenericSlicerSettings {
    let mut merged = GenericSlicerSettings::default();
    for field in GenericField::ALL {
        let value = top
            .and_then(|block| block.get(field))
            .or_else(|| base.and_then(|block| block.get(field)));
        if let Some(value) = value {
            *merged.field_mut(field) = Nullable::Present(value);
        }
    }
    for block in [base, top].into_iter().flatten() {
        for (key, value) in &block.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Pick the specific block for one slicer: a filament block replaces the
/// material block outright, a null or missing one falls through.
pub fn layer_specific<'a>(
    base: Option<&'a SlicerSettings>,
    top: Option<&'a SlicerSettings>,
    slicer: Slicer,
) -> Option<&'a SpecificSlicerSettings> {
    top.and_then(|settings| settings.specific(slicer).get())
        .or_else(|| base.and_then(|settings| settings.specific(slicer).get()))
}

/// Fill the gaps of a slicer-specific profile with generic values.
///
/// Returns `None` when there is no profile, no generic value and no slicer id,
/// i.e. nothing at all is known for this slicer.
pub fn apply_generic(
    slicer: Slicer,
    specific: Option<&SpecificSlicerSettings>,
    generic: &GenericSlicerSettings,
    slicer_id: Option<&LimitedString>,
) -> Option<EffectiveSlicerSettings> {
    if specific.is_none() && generic.is_empty() && slicer_id.is_none() {
        return None;
    }

    let mut overrides = specific
        .and_then(|block| block.overrides.get())
        .cloned()
        .unwrap_or_default();
    let mut temperatures = Temperatures::default();
    for field in GenericField::ALL {
        let native = slicer.native_key(field);
        let from_profile = overrides
            .get(native)
            .and_then(OverrideValue::first)
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        let generic_value = generic.get(field);
        temperatures.set(field, from_profile.or(generic_value));
        if let Some(value) = generic_value {
            overrides
                .entry(native.to_string())
                .or_insert_with(|| OverrideValue::Single(value.to_string()));
        }
    }

    Some(EffectiveSlicerSettings {
        slicer,
        profile_name: specific.map(|block| block.profile_name.clone()),
        slicer_id: slicer_id.cloned(),
        overrides,
        temperatures,
    })
}

/// Effective settings of `filament` (under `material`) for one slicer.
pub fn resolve_slicer(
    material: &Material,
    filament: &Filament,
    slicer: Slicer,
) -> Option<EffectiveSlicerSettings> {
    let base = material.default_slicer_settings.get();
    let top = filament.slicer_settings.get();
    let generic = layer_generic(
        base.and_then(|settings| settings.generic.get()),
        top.and_then(|settings| settings.generic.get()),
    );
    let specific = layer_specific(base, top, slicer);
    let slicer_id = filament.slicer_ids.get().and_then(|ids| ids.get(slicer));
    apply_generic(slicer, specific, &generic, slicer_id)
}

/// [`resolve_slicer`] for every slicer.
pub fn resolve_all(material: &Material, filament: &Filament) -> ResolvedSlicerSettings {
    let mut resolved = ResolvedSlicerSettings::default();
    for slicer in Slicer::ALL {
        *resolved.slot(slicer) = resolve_slicer(material, filament, slicer);
    }
    resolved
}

/// Shipping locations that apply to one purchase link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Shipping {
    pub ships_from: Locations,
    pub ships_to: Locations,
}

/// A link's own `ships_from`/`ships_to` replace the store's, whole field.
pub fn resolve_shipping(store: &Store, link: &PurchaseLink) -> Shipping {
    Shipping {
        ships_from: link
            .ships_from
            .get()
            .unwrap_or(&store.ships_from)
            .clone(),
        ships_to: link.ships_to.get().unwrap_or(&store.ships_to).clone(),
    }
}
