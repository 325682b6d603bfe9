//! Purchase links joined with their stores.

use crate::catalog::listing::DocumentFailure;
use crate::catalog::stores::StoreDirectory;
use crate::primitives::{HttpUrl, LimitedString};
use crate::resolve::{Shipping, resolve_shipping};
use crate::schema::FieldPath;
use crate::schema::entities::FilamentSizes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A purchase link whose `store_id` names no known store.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("{}: {field}: unknown store '{store_id}'", .document.display())]
pub struct ReferenceError {
    pub document: PathBuf,
    pub field: FieldPath,
    pub store_id: String,
}

/// One place to buy one size, with shipping already resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Offer {
    pub size_index: usize,
    pub filament_weight: f64,
    pub diameter: f64,
    pub store_id: LimitedString,
    pub store_name: LimitedString,
    pub url: HttpUrl,
    pub affiliate: bool,
    pub spool_refill: bool,
    #[serde(flatten)]
    pub shipping: Shipping,
}

/// Offers of one variant and the links that could not be joined.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OfferSheet {
    pub offers: Vec<Offer>,
    pub unresolved: Vec<ReferenceError>,
    pub store_failures: Vec<DocumentFailure>,
}

impl OfferSheet {
    /// True when every link resolved and every store loaded.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && self.store_failures.is_empty()
    }
}

/// Join every purchase link in `sizes` with `stores`.
///
/// Links are visited in document order; each unknown `store_id` becomes a
/// [`ReferenceError`] pointing at `sizes[i].purchase_links[j].store_id`.
pub fn resolve_offers(document: &Path, sizes: &FilamentSizes, stores: &StoreDirectory) -> OfferSheet {
    let mut sheet = OfferSheet::default();
    let root = FieldPath::named("sizes");
    for (size_index, size) in sizes.iter().enumerate() {
        for (link_index, link) in size.links().iter().enumerate() {
            let Some(store) = stores.get(link.store_id.as_str()) else {
                sheet.unresolved.push(ReferenceError {
                    document: document.to_path_buf(),
                    field: root
                        .index(size_index)
                        .key("purchase_links")
                        .index(link_index)
                        .key("store_id"),
                    store_id: link.store_id.to_string(),
                });
                continue;
            };
            sheet.offers.push(Offer {
                size_index,
                filament_weight: size.filament_weight,
                diameter: size.diameter,
                store_id: link.store_id.clone(),
                store_name: store.name.clone(),
                url: link.url.clone(),
                affiliate: link.affiliate,
                spool_refill: link.spool_refill,
                shipping: resolve_shipping(store, link),
            });
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::listing::Entry;
    use crate::primitives::{CountryCode, OneOrMany};
    use crate::schema::SchemaView;
    use serde_json::json;

    fn stores() -> StoreDirectory {
        let store = SchemaView::strict()
            .decode(&json!({
                "id": "shop",
                "name": "Shop",
                "storefront_url": "https://shop.example",
                "logo": "logo.png",
                "ships_from": ["US", "CA"],
                "ships_to": ["US", "CA"]
            }))
            .unwrap();
        let (directory, _) = StoreDirectory::build(vec![Entry {
            id: "shop".into(),
            path: "stores/shop/store.json".into(),
            value: store,
        }]);
        directory
    }

    #[test]
    fn known_links_become_offers_and_unknown_ids_are_reported() {
        let sizes: FilamentSizes = SchemaView::strict()
            .decode_at(
                &json!([
                    {"purchase_links": []},
                    {
                        "filament_weight": 250,
                        "purchase_links": [
                            {"store_id": "shop", "url": "https://shop.example/a", "affiliate": false, "ships_from": "US"},
                            {"store_id": "ghost", "url": "https://ghost.example/a", "affiliate": true}
                        ]
                    }
                ]),
                FieldPath::named("sizes"),
            )
            .unwrap();
        let sheet = resolve_offers(Path::new("v/sizes.json"), &sizes, &stores());
        assert_eq!(sheet.offers.len(), 1);
        let offer = &sheet.offers[0];
        assert_eq!(offer.size_index, 1);
        assert_eq!(offer.filament_weight, 250.0);
        assert_eq!(offer.shipping.ships_from, OneOrMany::One(CountryCode::Iso("US".into())));
        assert_eq!(offer.shipping.ships_to.as_slice().len(), 2);

        assert_eq!(sheet.unresolved.len(), 1);
        assert_eq!(
            sheet.unresolved[0].to_string(),
            "v/sizes.json: sizes[1].purchase_links[1].store_id: unknown store 'ghost'"
        );
        assert!(!sheet.is_complete());
    }
}
