//! Read-side reconstruction of the ownership hierarchy.
//!
//! Only the most specific owner is stored. For presentation, the ancestors
//! are fetched through a nested join (appellation → region → country,
//! region → country) and folded back into the three ownership fields.
//! The output is never written back to storage.

use serde::{Deserialize, Serialize};

use crate::scope::{GeographicScope, OwnershipFields, present};

/// A joined region row: its id and owning country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLink {
    pub id: String,
    #[serde(default)]
    pub country_id: Option<String>,
}

/// A joined appellation row with its (optionally joined) region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppellationLink {
    pub id: String,
    #[serde(default)]
    pub region: Option<RegionLink>,
}

/// Ancestors fetched alongside a stored record.
///
/// `appellation` is joined on the record's `appellation_id`, `region` on its
/// `region_id`. Either is `None` when the field is unset or the referenced
/// row is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorChain {
    #[serde(default)]
    pub appellation: Option<AppellationLink>,
    #[serde(default)]
    pub region: Option<RegionLink>,
}

/// Overwrite `country_id`/`region_id` with the values implied by ancestors.
///
/// - country: appellation's region's country, else region's country, else stored
/// - region: appellation's region, else joined region, else stored
/// - appellation: unchanged
pub fn resolve_hierarchy(stored: &OwnershipFields, ancestors: &AncestorChain) -> OwnershipFields {
    let appellation_region = ancestors
        .appellation
        .as_ref()
        .and_then(|appellation| appellation.region.as_ref());

    let country_id = appellation_region
        .and_then(|region| present(&region.country_id))
        .or_else(|| {
            ancestors
                .region
                .as_ref()
                .and_then(|region| present(&region.country_id))
        })
        .map(str::to_string)
        .or_else(|| stored.country_id.clone());

    let region_id = appellation_region
        .or(ancestors.region.as_ref())
        .map(|region| region.id.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| stored.region_id.clone());

    OwnershipFields {
        country_id,
        region_id,
        appellation_id: stored.appellation_id.clone(),
    }
}

/// The canonical owner plus the reconstructed presentation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOwnership {
    pub scope: GeographicScope,
    #[serde(flatten)]
    pub fields: OwnershipFields,
}

impl ResolvedOwnership {
    pub fn resolve(stored: &OwnershipFields, ancestors: &AncestorChain) -> Self {
        Self {
            scope: GeographicScope::from_fields(stored),
            fields: resolve_hierarchy(stored, ancestors),
        }
    }
}
