//! Canonical in-memory representation of catalog state.
//!
//! This is the memory boundary for `vinotheca-store`:
//! - load/store JSONL
//! - keyed, deterministic record access per table
//! - the [`CatalogBackend`] implementation the workflows run against

use crate::backend::CatalogBackend;
use crate::jsonl::{JsonlError, read_entries_from_path, write_entries_to_path};
use crate::records::{
    AppellationRecord, CatalogEntry, CountryRecord, DefinitionGrapeRecord, GrapeAppellationRecord,
    GrapeVarietyRecord, RegionRecord, WineDefinitionRecord,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Canonical in-memory state, one ordered map per table.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    countries: BTreeMap<String, CountryRecord>,
    regions: BTreeMap<String, RegionRecord>,
    appellations: BTreeMap<String, AppellationRecord>,
    grape_varieties: BTreeMap<String, GrapeVarietyRecord>,
    wine_definitions: BTreeMap<String, WineDefinitionRecord>,
    grape_appellations: BTreeMap<String, GrapeAppellationRecord>,
    definition_grapes: BTreeMap<String, DefinitionGrapeRecord>,
}

impl MemoryCatalog {
    /// Build a catalog from fully-materialized entries.
    ///
    /// Duplicate ids within a table resolve last-write-wins, matching
    /// append/overlay behavior of the JSONL file.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.put_entry(entry);
        }
        catalog
    }

    /// Load catalog state from a JSONL file.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, JsonlError> {
        let entries = read_entries_from_path(path.as_ref())?;
        let catalog = Self::from_entries(entries);
        tracing::debug!(
            path = %path.as_ref().display(),
            records = catalog.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Load catalog state, treating a missing file as an empty catalog.
    pub fn load_jsonl_or_empty(path: impl AsRef<Path>) -> Result<Self, JsonlError> {
        if path.as_ref().exists() {
            Self::load_jsonl(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist catalog state to a JSONL file.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), JsonlError> {
        write_entries_to_path(path.as_ref(), &self.entries())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            records = self.len(),
            "saved catalog"
        );
        Ok(())
    }

    /// All records as entries, grouped by table in dependency order.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries = Vec::with_capacity(self.len());
        entries.extend(self.countries.values().cloned().map(CatalogEntry::Country));
        entries.extend(self.regions.values().cloned().map(CatalogEntry::Region));
        entries.extend(self.appellations.values().cloned().map(CatalogEntry::Appellation));
        entries.extend(self.grape_varieties.values().cloned().map(CatalogEntry::GrapeVariety));
        entries.extend(self.wine_definitions.values().cloned().map(CatalogEntry::WineDefinition));
        entries.extend(
            self.grape_appellations
                .values()
                .cloned()
                .map(CatalogEntry::GrapeAppellation),
        );
        entries.extend(self.definition_grapes.values().cloned().map(CatalogEntry::DefinitionGrape));
        entries
    }

    pub fn put_entry(&mut self, entry: CatalogEntry) {
        match entry {
            CatalogEntry::Country(record) => {
                self.countries.insert(record.id.clone(), record);
            }
            CatalogEntry::Region(record) => {
                self.regions.insert(record.id.clone(), record);
            }
            CatalogEntry::Appellation(record) => {
                self.appellations.insert(record.id.clone(), record);
            }
            CatalogEntry::GrapeVariety(record) => {
                self.grape_varieties.insert(record.id.clone(), record);
            }
            CatalogEntry::WineDefinition(record) => {
                self.wine_definitions.insert(record.id.clone(), record);
            }
            CatalogEntry::GrapeAppellation(record) => {
                self.grape_appellations.insert(record.id.clone(), record);
            }
            CatalogEntry::DefinitionGrape(record) => {
                self.definition_grapes.insert(record.id.clone(), record);
            }
        }
    }

    /// Total number of records across all tables.
    pub fn len(&self) -> usize {
        self.countries.len()
            + self.regions.len()
            + self.appellations.len()
            + self.grape_varieties.len()
            + self.wine_definitions.len()
            + self.grape_appellations.len()
            + self.definition_grapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogBackend for MemoryCatalog {
    fn countries(&self) -> Vec<&CountryRecord> {
        self.countries.values().collect()
    }

    fn country(&self, id: &str) -> Option<&CountryRecord> {
        self.countries.get(id)
    }

    fn put_country(&mut self, record: CountryRecord) -> Option<CountryRecord> {
        self.countries.insert(record.id.clone(), record)
    }

    fn regions(&self) -> Vec<&RegionRecord> {
        self.regions.values().collect()
    }

    fn region(&self, id: &str) -> Option<&RegionRecord> {
        self.regions.get(id)
    }

    fn put_region(&mut self, record: RegionRecord) -> Option<RegionRecord> {
        self.regions.insert(record.id.clone(), record)
    }

    fn appellations(&self) -> Vec<&AppellationRecord> {
        self.appellations.values().collect()
    }

    fn appellation(&self, id: &str) -> Option<&AppellationRecord> {
        self.appellations.get(id)
    }

    fn put_appellation(&mut self, record: AppellationRecord) -> Option<AppellationRecord> {
        self.appellations.insert(record.id.clone(), record)
    }

    fn grape_varieties(&self) -> Vec<&GrapeVarietyRecord> {
        self.grape_varieties.values().collect()
    }

    fn grape_variety(&self, id: &str) -> Option<&GrapeVarietyRecord> {
        self.grape_varieties.get(id)
    }

    fn put_grape_variety(&mut self, record: GrapeVarietyRecord) -> Option<GrapeVarietyRecord> {
        self.grape_varieties.insert(record.id.clone(), record)
    }

    fn wine_definitions(&self) -> Vec<&WineDefinitionRecord> {
        self.wine_definitions.values().collect()
    }

    fn wine_definition(&self, id: &str) -> Option<&WineDefinitionRecord> {
        self.wine_definitions.get(id)
    }

    fn put_wine_definition(&mut self, record: WineDefinitionRecord) -> Option<WineDefinitionRecord> {
        self.wine_definitions.insert(record.id.clone(), record)
    }

    fn remove_wine_definition(&mut self, id: &str) -> Option<WineDefinitionRecord> {
        self.wine_definitions.remove(id)
    }

    fn grape_appellations(&self) -> Vec<&GrapeAppellationRecord> {
        self.grape_appellations.values().collect()
    }

    fn grape_appellation(&self, id: &str) -> Option<&GrapeAppellationRecord> {
        self.grape_appellations.get(id)
    }

    fn put_grape_appellation(
        &mut self,
        record: GrapeAppellationRecord,
    ) -> Option<GrapeAppellationRecord> {
        self.grape_appellations.insert(record.id.clone(), record)
    }

    fn remove_grape_appellation(&mut self, id: &str) -> Option<GrapeAppellationRecord> {
        self.grape_appellations.remove(id)
    }

    fn definition_grapes(&self) -> Vec<&DefinitionGrapeRecord> {
        self.definition_grapes.values().collect()
    }

    fn definition_grape(&self, id: &str) -> Option<&DefinitionGrapeRecord> {
        self.definition_grapes.get(id)
    }

    fn put_definition_grape(
        &mut self,
        record: DefinitionGrapeRecord,
    ) -> Option<DefinitionGrapeRecord> {
        self.definition_grapes.insert(record.id.clone(), record)
    }

    fn remove_definition_grape(&mut self, id: &str) -> Option<DefinitionGrapeRecord> {
        self.definition_grapes.remove(id)
    }
}
