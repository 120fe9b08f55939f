//! # vinotheca-store
//!
//! Memory layer for the wine catalog.
//!
//! This crate provides:
//! - persisted record types, one per catalog table
//! - JSONL read/write with lock-scoped atomic mutation
//! - `MemoryCatalog` (canonical in-memory state) behind the `CatalogBackend` seam
//! - validated workflows for definitions, grape rules and composition rows
//! - TOML configuration
//!
//! Rule semantics live in `vinotheca-kernel`; this crate only decides where
//! the records come from and in what order they are checked.
//!
//! ## Data model
//!
//! ```text
//! JSONL (on disk, one line per record, tagged by table)
//!     ↕  load / save under <catalog>.lock
//! MemoryCatalog ── CatalogBackend ── workflows (normalize → validate → put)
//! ```

pub mod atomic_store;
pub mod backend;
pub mod composition;
pub mod config;
pub mod definitions;
pub mod error;
pub mod geography;
pub mod grape_rules;
pub mod jsonl;
pub mod memory;
pub mod records;

pub use atomic_store::{AtomicCatalogError, catalog_lock_path, mutate_catalog_jsonl};
pub use backend::CatalogBackend;
pub use composition::{
    CreateDefinitionGrape, add_definition_grape, delete_definition_grape, grapes_for_definition,
    update_definition_grape,
};
pub use config::{ConfigError, DEFAULT_CATALOG_PATH, DEFAULT_CONFIG_PATH, VinothecaConfig};
pub use definitions::{
    CreateWineDefinition, DEFINITION_CHECK_KIND, DefinitionCheckReport, DefinitionFinding,
    UpdateWineDefinition, WineDefinitionView, check_wine_definition, create_wine_definition,
    delete_wine_definition, get_wine_definition, list_wine_definitions, update_wine_definition,
};
pub use error::CatalogError;
pub use geography::{
    NewAppellation, NewCountry, NewGrapeVariety, NewRegion, add_appellation, add_country,
    add_grape_variety, add_region, list_appellations, list_countries, list_grape_varieties,
    list_regions,
};
pub use grape_rules::{
    CreateGrapeRule, check_appellation_rules, create_grape_rule, delete_grape_rule,
    rules_for_appellation, rules_for_grape, update_grape_rule,
};
pub use jsonl::{JsonlError, read_entries, read_entries_from_path, write_entries, write_entries_to_path};
pub use memory::MemoryCatalog;
pub use records::{
    AppellationRecord, CatalogEntry, CountryRecord, DefinitionGrapeRecord, GrapeAppellationRecord,
    GrapeColor, GrapeVarietyRecord, RegionRecord, WineDefinitionRecord,
};
