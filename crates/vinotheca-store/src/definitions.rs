//! Wine definition workflows.
//!
//! Writes normalize ownership to the single most specific owner before they
//! touch the backend. Reads join the ancestors back in with
//! [`resolve_hierarchy`] for presentation only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use vinotheca_kernel::{
    DuplicateGrapePolicy, GeographicScope, GrapeCompositionRule, OwnershipFields, OwnershipPatch,
    RuleSetReport, check_rule_set, normalize_ownership, resolve_hierarchy,
};

use crate::backend::CatalogBackend;
use crate::error::CatalogError;
use crate::geography::require_name;
use crate::grape_rules::rules_in_write_order;
use crate::records::{
    TABLE_APPELLATIONS, TABLE_COUNTRIES, TABLE_REGIONS, TABLE_WINE_DEFINITIONS,
    WineDefinitionRecord, new_record_id,
};

pub const INITIAL_VERSION: i64 = 1;
pub const DEFINITION_CHECK_KIND: &str = "vinotheca.wine_definition.check.v1";
pub const FAILURE_CLASS_OWNERSHIP_NOT_CANONICAL: &str = "wine_definition.ownership.not_canonical";
pub const FAILURE_CLASS_OWNERSHIP_MISSING_REFERENCE: &str =
    "wine_definition.ownership.missing_reference";

#[derive(Debug, Clone, Default)]
pub struct CreateWineDefinition {
    pub id: Option<String>,
    pub name: String,
    pub ownership: OwnershipFields,
    pub description: Option<String>,
    pub version: Option<i64>,
    pub rule_json: Option<Value>,
}

/// A partial update. `None` keeps the stored value throughout.
#[derive(Debug, Clone, Default)]
pub struct UpdateWineDefinition {
    pub name: Option<String>,
    pub ownership: OwnershipPatch,
    pub description: Option<Option<String>>,
    /// Explicit version; when absent the stored version is incremented.
    pub version: Option<i64>,
    pub rule_json: Option<Option<Value>>,
}

/// A definition as presented to callers: canonical owner plus the full
/// reconstructed country/region/appellation chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineDefinitionView {
    pub id: String,
    pub name: String,
    pub scope: GeographicScope,
    pub country_id: Option<String>,
    pub region_id: Option<String>,
    pub appellation_id: Option<String>,
    pub description: Option<String>,
    pub version: i64,
    pub rule_json: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn resolve_view(backend: &impl CatalogBackend, record: &WineDefinitionRecord) -> WineDefinitionView {
    let stored = record.ownership();
    let ancestors = backend.ancestors(&stored);
    tracing::debug!(definition_id = %record.id, ?ancestors, "joined ownership ancestors");
    let resolved = resolve_hierarchy(&stored, &ancestors);

    WineDefinitionView {
        id: record.id.clone(),
        name: record.name.clone(),
        scope: GeographicScope::from_fields(&stored),
        country_id: resolved.country_id,
        region_id: resolved.region_id,
        appellation_id: resolved.appellation_id,
        description: record.description.clone(),
        version: record.version,
        rule_json: record.rule_json.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn missing_scope_reference(backend: &impl CatalogBackend, scope: &GeographicScope) -> Option<CatalogError> {
    match scope {
        GeographicScope::Country(id) if backend.country(id).is_none() => {
            Some(CatalogError::missing_reference("country_id", TABLE_COUNTRIES, id))
        }
        GeographicScope::Region(id) if backend.region(id).is_none() => {
            Some(CatalogError::missing_reference("region_id", TABLE_REGIONS, id))
        }
        GeographicScope::Appellation(id) if backend.appellation(id).is_none() => Some(
            CatalogError::missing_reference("appellation_id", TABLE_APPELLATIONS, id),
        ),
        _ => None,
    }
}

fn check_version_floor(id: &str, version: i64) -> Result<i64, CatalogError> {
    if version < INITIAL_VERSION {
        tracing::warn!(definition_id = %id, version, "rejected version below the initial counter");
        return Err(CatalogError::VersionOutOfRange {
            id: id.to_string(),
            version,
        });
    }
    Ok(version)
}

fn check_scope_reference(backend: &impl CatalogBackend, ownership: &OwnershipFields) -> Result<(), CatalogError> {
    match missing_scope_reference(backend, &GeographicScope::from_fields(ownership)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn create_wine_definition(
    backend: &mut impl CatalogBackend,
    request: CreateWineDefinition,
) -> Result<WineDefinitionView, CatalogError> {
    let name = require_name(TABLE_WINE_DEFINITIONS, request.name)?;
    let ownership = normalize_ownership(request.ownership);
    check_scope_reference(&*backend, &ownership)?;

    let id = request.id.unwrap_or_else(new_record_id);
    if backend.wine_definition(&id).is_some() {
        return Err(CatalogError::AlreadyExists {
            table: TABLE_WINE_DEFINITIONS,
            id,
        });
    }
    let version = check_version_floor(&id, request.version.unwrap_or(INITIAL_VERSION))?;

    let now = Utc::now();
    let mut record = WineDefinitionRecord {
        id,
        name,
        country_id: None,
        region_id: None,
        appellation_id: None,
        description: request.description,
        version,
        rule_json: request.rule_json,
        created_at: now,
        updated_at: now,
    };
    record.set_ownership(ownership);

    backend.put_wine_definition(record.clone());
    tracing::info!(
        definition_id = %record.id,
        scope = %GeographicScope::from_fields(&record.ownership()),
        version = record.version,
        "created wine definition"
    );
    Ok(resolve_view(&*backend, &record))
}

pub fn update_wine_definition(
    backend: &mut impl CatalogBackend,
    id: &str,
    request: UpdateWineDefinition,
) -> Result<WineDefinitionView, CatalogError> {
    let existing = backend
        .wine_definition(id)
        .cloned()
        .ok_or_else(|| CatalogError::not_found(TABLE_WINE_DEFINITIONS, id))?;

    let ownership = normalize_ownership(request.ownership.merge_onto(&existing.ownership()));
    check_scope_reference(&*backend, &ownership)?;

    let version = match request.version {
        Some(requested) if requested < existing.version => {
            tracing::warn!(
                definition_id = %id,
                current = existing.version,
                requested,
                "rejected version regression"
            );
            return Err(CatalogError::VersionRegression {
                id: id.to_string(),
                current: existing.version,
                requested,
            });
        }
        Some(requested) => check_version_floor(id, requested)?,
        None => existing
            .version
            .checked_add(1)
            .ok_or_else(|| CatalogError::VersionExhausted {
                id: id.to_string(),
                current: existing.version,
            })?,
    };

    let mut record = existing;
    if let Some(name) = request.name {
        record.name = require_name(TABLE_WINE_DEFINITIONS, name)?;
    }
    if let Some(description) = request.description {
        record.description = description;
    }
    if let Some(rule_json) = request.rule_json {
        record.rule_json = rule_json;
    }
    record.set_ownership(ownership);
    record.version = version;
    record.updated_at = Utc::now();

    backend.put_wine_definition(record.clone());
    tracing::info!(
        definition_id = %record.id,
        scope = %GeographicScope::from_fields(&record.ownership()),
        version = record.version,
        "updated wine definition"
    );
    Ok(resolve_view(&*backend, &record))
}

pub fn get_wine_definition(
    backend: &impl CatalogBackend,
    id: &str,
) -> Result<WineDefinitionView, CatalogError> {
    backend
        .wine_definition(id)
        .map(|record| resolve_view(backend, record))
        .ok_or_else(|| CatalogError::not_found(TABLE_WINE_DEFINITIONS, id))
}

/// All definitions, resolved, ordered by name.
pub fn list_wine_definitions(backend: &impl CatalogBackend) -> Vec<WineDefinitionView> {
    let mut records = backend.wine_definitions();
    records.sort_by(|a, b| (a.name.as_str(), a.id.as_str()).cmp(&(b.name.as_str(), b.id.as_str())));
    records
        .into_iter()
        .map(|record| resolve_view(backend, record))
        .collect()
}

/// Delete a definition together with its composition rows.
pub fn delete_wine_definition(
    backend: &mut impl CatalogBackend,
    id: &str,
) -> Result<WineDefinitionRecord, CatalogError> {
    let removed = backend
        .remove_wine_definition(id)
        .ok_or_else(|| CatalogError::not_found(TABLE_WINE_DEFINITIONS, id))?;

    let composition_ids: Vec<String> = backend
        .definition_grapes()
        .into_iter()
        .filter(|row| row.wine_definition_id == id)
        .map(|row| row.id.clone())
        .collect();
    for row_id in &composition_ids {
        backend.remove_definition_grape(row_id);
    }

    tracing::info!(
        definition_id = %id,
        composition_rows = composition_ids.len(),
        "deleted wine definition"
    );
    Ok(removed)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionFinding {
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionCheckReport {
    pub check_kind: String,
    pub definition_id: String,
    pub result: String,
    pub scope: GeographicScope,
    pub failure_classes: Vec<String>,
    pub errors: Vec<DefinitionFinding>,
    /// Rule-set check of the owning appellation, when appellation scoped.
    pub rule_set: Option<RuleSetReport>,
}

impl DefinitionCheckReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

/// Decide whether a stored definition is valid as a whole.
pub fn check_wine_definition(
    backend: &impl CatalogBackend,
    id: &str,
    policy: DuplicateGrapePolicy,
) -> Result<DefinitionCheckReport, CatalogError> {
    let record = backend
        .wine_definition(id)
        .ok_or_else(|| CatalogError::not_found(TABLE_WINE_DEFINITIONS, id))?;
    let stored = record.ownership();
    let scope = GeographicScope::from_fields(&stored);
    let mut errors = Vec::new();

    if !stored.is_canonical() {
        errors.push(DefinitionFinding {
            class: FAILURE_CLASS_OWNERSHIP_NOT_CANONICAL.to_string(),
            message: format!(
                "stored ownership sets {} fields; only the most specific ({scope}) may be set",
                stored.populated_count()
            ),
        });
    }
    if let Some(err) = missing_scope_reference(backend, &scope) {
        errors.push(DefinitionFinding {
            class: FAILURE_CLASS_OWNERSHIP_MISSING_REFERENCE.to_string(),
            message: err.to_string(),
        });
    }

    let rule_set = match &scope {
        GeographicScope::Appellation(appellation_id) => {
            let rules: Vec<GrapeCompositionRule> = rules_in_write_order(backend, appellation_id)
                .into_iter()
                .map(|row| row.as_rule())
                .collect();
            Some(check_rule_set(&rules, policy))
        }
        _ => None,
    };
    if let Some(report) = &rule_set {
        errors.extend(report.errors.iter().map(|finding| DefinitionFinding {
            class: finding.class.clone(),
            message: finding.message.clone(),
        }));
    }

    let failure_classes = errors
        .iter()
        .map(|finding| finding.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok(DefinitionCheckReport {
        check_kind: DEFINITION_CHECK_KIND.to_string(),
        definition_id: id.to_string(),
        result: if errors.is_empty() { "accepted" } else { "rejected" }.to_string(),
        scope,
        failure_classes,
        errors,
        rule_set,
    })
}
