//! The persistence seam the workflows are written against.

use vinotheca_kernel::{AncestorChain, AppellationLink, OwnershipFields, RegionLink};

use crate::records::{
    AppellationRecord, CountryRecord, DefinitionGrapeRecord, GrapeAppellationRecord,
    GrapeVarietyRecord, RegionRecord, WineDefinitionRecord,
};

/// A keyed record store: list, get-by-id, put (insert or update by id),
/// remove-by-id, plus the nested ancestor join used by read paths.
///
/// Implementations own conflict handling; workflows validate first and then
/// issue a single put or remove.
pub trait CatalogBackend {
    fn countries(&self) -> Vec<&CountryRecord>;
    fn country(&self, id: &str) -> Option<&CountryRecord>;
    fn put_country(&mut self, record: CountryRecord) -> Option<CountryRecord>;

    fn regions(&self) -> Vec<&RegionRecord>;
    fn region(&self, id: &str) -> Option<&RegionRecord>;
    fn put_region(&mut self, record: RegionRecord) -> Option<RegionRecord>;

    fn appellations(&self) -> Vec<&AppellationRecord>;
    fn appellation(&self, id: &str) -> Option<&AppellationRecord>;
    fn put_appellation(&mut self, record: AppellationRecord) -> Option<AppellationRecord>;

    fn grape_varieties(&self) -> Vec<&GrapeVarietyRecord>;
    fn grape_variety(&self, id: &str) -> Option<&GrapeVarietyRecord>;
    fn put_grape_variety(&mut self, record: GrapeVarietyRecord) -> Option<GrapeVarietyRecord>;

    fn wine_definitions(&self) -> Vec<&WineDefinitionRecord>;
    fn wine_definition(&self, id: &str) -> Option<&WineDefinitionRecord>;
    fn put_wine_definition(&mut self, record: WineDefinitionRecord) -> Option<WineDefinitionRecord>;
    fn remove_wine_definition(&mut self, id: &str) -> Option<WineDefinitionRecord>;

    fn grape_appellations(&self) -> Vec<&GrapeAppellationRecord>;
    fn grape_appellation(&self, id: &str) -> Option<&GrapeAppellationRecord>;
    fn put_grape_appellation(
        &mut self,
        record: GrapeAppellationRecord,
    ) -> Option<GrapeAppellationRecord>;
    fn remove_grape_appellation(&mut self, id: &str) -> Option<GrapeAppellationRecord>;

    fn definition_grapes(&self) -> Vec<&DefinitionGrapeRecord>;
    fn definition_grape(&self, id: &str) -> Option<&DefinitionGrapeRecord>;
    fn put_definition_grape(&mut self, record: DefinitionGrapeRecord)
    -> Option<DefinitionGrapeRecord>;
    fn remove_definition_grape(&mut self, id: &str) -> Option<DefinitionGrapeRecord>;

    /// Fetch the ancestors of a stored ownership (appellation → region →
    /// country, region → country). Dangling references join to `None`.
    fn ancestors(&self, ownership: &OwnershipFields) -> AncestorChain {
        let region_link = |id: &str| {
            self.region(id).map(|region| RegionLink {
                id: region.id.clone(),
                country_id: Some(region.country_id.clone()),
            })
        };

        let appellation = ownership
            .appellation_id
            .as_deref()
            .and_then(|id| self.appellation(id))
            .map(|appellation| AppellationLink {
                id: appellation.id.clone(),
                region: region_link(&appellation.region_id),
            });

        let region = ownership.region_id.as_deref().and_then(region_link);

        AncestorChain {
            appellation,
            region,
        }
    }
}
