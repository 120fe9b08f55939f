//! Reference data: countries, regions, appellations and grape varieties.
//!
//! These rows only exist so that ownership joins and rule references have
//! something to point at.

use chrono::Utc;

use crate::backend::CatalogBackend;
use crate::error::CatalogError;
use crate::records::{
    AppellationRecord, CountryRecord, GrapeColor, GrapeVarietyRecord, RegionRecord,
    TABLE_APPELLATIONS, TABLE_COUNTRIES, TABLE_GRAPE_VARIETIES, TABLE_REGIONS, new_record_id,
};

#[derive(Debug, Clone, Default)]
pub struct NewCountry {
    pub id: Option<String>,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRegion {
    pub id: Option<String>,
    pub name: String,
    pub country_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewAppellation {
    pub id: Option<String>,
    pub name: String,
    pub region_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewGrapeVariety {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<GrapeColor>,
    pub description: Option<String>,
}

pub(crate) fn require_name(table: &'static str, name: String) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyName { table });
    }
    Ok(trimmed.to_string())
}

fn claim_id(
    table: &'static str,
    requested: Option<String>,
    exists: impl Fn(&str) -> bool,
) -> Result<String, CatalogError> {
    let id = requested.unwrap_or_else(new_record_id);
    if exists(&id) {
        return Err(CatalogError::AlreadyExists { table, id });
    }
    Ok(id)
}

pub fn add_country(catalog: &mut impl CatalogBackend, request: NewCountry) -> Result<CountryRecord, CatalogError> {
    let name = require_name(TABLE_COUNTRIES, request.name)?;
    let id = claim_id(TABLE_COUNTRIES, request.id, |id| catalog.country(id).is_some())?;
    let now = Utc::now();
    let record = CountryRecord {
        id,
        name,
        code: request.code.filter(|code| !code.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };
    catalog.put_country(record.clone());
    tracing::info!(country_id = %record.id, "added country");
    Ok(record)
}

pub fn add_region(catalog: &mut impl CatalogBackend, request: NewRegion) -> Result<RegionRecord, CatalogError> {
    let name = require_name(TABLE_REGIONS, request.name)?;
    if catalog.country(&request.country_id).is_none() {
        return Err(CatalogError::missing_reference(
            "country_id",
            TABLE_COUNTRIES,
            &request.country_id,
        ));
    }
    let id = claim_id(TABLE_REGIONS, request.id, |id| catalog.region(id).is_some())?;
    let now = Utc::now();
    let record = RegionRecord {
        id,
        name,
        country_id: request.country_id,
        created_at: now,
        updated_at: now,
    };
    catalog.put_region(record.clone());
    tracing::info!(region_id = %record.id, country_id = %record.country_id, "added region");
    Ok(record)
}

pub fn add_appellation(
    catalog: &mut impl CatalogBackend,
    request: NewAppellation,
) -> Result<AppellationRecord, CatalogError> {
    let name = require_name(TABLE_APPELLATIONS, request.name)?;
    if catalog.region(&request.region_id).is_none() {
        return Err(CatalogError::missing_reference(
            "region_id",
            TABLE_REGIONS,
            &request.region_id,
        ));
    }
    let id = claim_id(TABLE_APPELLATIONS, request.id, |id| catalog.appellation(id).is_some())?;
    let now = Utc::now();
    let record = AppellationRecord {
        id,
        name,
        region_id: request.region_id,
        created_at: now,
        updated_at: now,
    };
    catalog.put_appellation(record.clone());
    tracing::info!(appellation_id = %record.id, region_id = %record.region_id, "added appellation");
    Ok(record)
}

pub fn add_grape_variety(
    catalog: &mut impl CatalogBackend,
    request: NewGrapeVariety,
) -> Result<GrapeVarietyRecord, CatalogError> {
    let name = require_name(TABLE_GRAPE_VARIETIES, request.name)?;
    let id = claim_id(TABLE_GRAPE_VARIETIES, request.id, |id| {
        catalog.grape_variety(id).is_some()
    })?;
    let now = Utc::now();
    let record = GrapeVarietyRecord {
        id,
        name,
        color: request.color,
        description: request.description,
        created_at: now,
        updated_at: now,
    };
    catalog.put_grape_variety(record.clone());
    tracing::info!(grape_id = %record.id, "added grape variety");
    Ok(record)
}

fn sorted_by_name<'a, T>(mut rows: Vec<&'a T>, key: impl Fn(&T) -> (&str, &str)) -> Vec<&'a T> {
    rows.sort_by(|a, b| key(a).cmp(&key(b)));
    rows
}

pub fn list_countries(catalog: &impl CatalogBackend) -> Vec<&CountryRecord> {
    sorted_by_name(catalog.countries(), |r| (r.name.as_str(), r.id.as_str()))
}

pub fn list_regions(catalog: &impl CatalogBackend) -> Vec<&RegionRecord> {
    sorted_by_name(catalog.regions(), |r| (r.name.as_str(), r.id.as_str()))
}

pub fn list_appellations(catalog: &impl CatalogBackend) -> Vec<&AppellationRecord> {
    sorted_by_name(catalog.appellations(), |r| (r.name.as_str(), r.id.as_str()))
}

pub fn list_grape_varieties(catalog: &impl CatalogBackend) -> Vec<&GrapeVarietyRecord> {
    sorted_by_name(catalog.grape_varieties(), |r| (r.name.as_str(), r.id.as_str()))
}
