//! Definition-scoped grape composition rows.

use chrono::Utc;
use vinotheca_kernel::{DefinitionGrapeFields, DefinitionGrapePatch};

use crate::backend::CatalogBackend;
use crate::error::CatalogError;
use crate::records::{
    DefinitionGrapeRecord, TABLE_DEFINITION_GRAPES, TABLE_GRAPE_VARIETIES, TABLE_WINE_DEFINITIONS,
    new_record_id,
};

#[derive(Debug, Clone)]
pub struct CreateDefinitionGrape {
    pub id: Option<String>,
    pub wine_definition_id: String,
    pub grape_id: String,
    pub fields: DefinitionGrapeFields,
}

pub fn add_definition_grape(
    backend: &mut impl CatalogBackend,
    request: CreateDefinitionGrape,
) -> Result<DefinitionGrapeRecord, CatalogError> {
    if backend.wine_definition(&request.wine_definition_id).is_none() {
        return Err(CatalogError::missing_reference(
            "wine_definition_id",
            TABLE_WINE_DEFINITIONS,
            &request.wine_definition_id,
        ));
    }
    if backend.grape_variety(&request.grape_id).is_none() {
        return Err(CatalogError::missing_reference(
            "grape_id",
            TABLE_GRAPE_VARIETIES,
            &request.grape_id,
        ));
    }

    let id = request.id.unwrap_or_else(new_record_id);
    if backend.definition_grape(&id).is_some() {
        return Err(CatalogError::AlreadyExists {
            table: TABLE_DEFINITION_GRAPES,
            id,
        });
    }

    let now = Utc::now();
    let mut record = DefinitionGrapeRecord {
        id,
        wine_definition_id: request.wine_definition_id,
        grape_id: request.grape_id,
        min_pct: None,
        max_pct: None,
        required: false,
        created_at: now,
        updated_at: now,
    };
    record.set_fields(request.fields);

    backend.put_definition_grape(record.clone());
    tracing::info!(
        row_id = %record.id,
        definition_id = %record.wine_definition_id,
        grape_id = %record.grape_id,
        required = record.required,
        "added definition grape"
    );
    Ok(record)
}

pub fn update_definition_grape(
    backend: &mut impl CatalogBackend,
    id: &str,
    patch: DefinitionGrapePatch,
) -> Result<DefinitionGrapeRecord, CatalogError> {
    let mut record = backend
        .definition_grape(id)
        .cloned()
        .ok_or_else(|| CatalogError::not_found(TABLE_DEFINITION_GRAPES, id))?;

    record.set_fields(patch.merge_onto(&record.fields()));
    record.updated_at = Utc::now();

    backend.put_definition_grape(record.clone());
    tracing::info!(row_id = %record.id, "updated definition grape");
    Ok(record)
}

pub fn delete_definition_grape(
    backend: &mut impl CatalogBackend,
    id: &str,
) -> Result<DefinitionGrapeRecord, CatalogError> {
    let removed = backend
        .remove_definition_grape(id)
        .ok_or_else(|| CatalogError::not_found(TABLE_DEFINITION_GRAPES, id))?;
    tracing::info!(row_id = %id, definition_id = %removed.wine_definition_id, "deleted definition grape");
    Ok(removed)
}

/// Composition of one definition, oldest row first.
pub fn grapes_for_definition<'a>(
    backend: &'a impl CatalogBackend,
    wine_definition_id: &str,
) -> Vec<&'a DefinitionGrapeRecord> {
    let mut rows: Vec<_> = backend
        .definition_grapes()
        .into_iter()
        .filter(|row| row.wine_definition_id == wine_definition_id)
        .collect();
    rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{CreateWineDefinition, create_wine_definition};
    use crate::geography::{NewGrapeVariety, add_grape_variety};
    use crate::memory::MemoryCatalog;
    use vinotheca_kernel::Percentage;

    fn seeded() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::default();
        add_grape_variety(
            &mut catalog,
            NewGrapeVariety {
                id: Some("G1".to_string()),
                name: "Chardonnay".to_string(),
                ..NewGrapeVariety::default()
            },
        )
        .expect("grape should add");
        create_wine_definition(
            &mut catalog,
            CreateWineDefinition {
                id: Some("wd-1".to_string()),
                name: "House white".to_string(),
                ..CreateWineDefinition::default()
            },
        )
        .expect("definition should create");
        catalog
    }

    #[test]
    fn add_requires_definition_and_grape() {
        let mut catalog = seeded();
        let err = add_definition_grape(
            &mut catalog,
            CreateDefinitionGrape {
                id: None,
                wine_definition_id: "wd-404".to_string(),
                grape_id: "G1".to_string(),
                fields: DefinitionGrapeFields::default(),
            },
        )
        .expect_err("missing definition must fail");
        assert!(matches!(
            err,
            CatalogError::MissingReference { field: "wine_definition_id", .. }
        ));
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let mut catalog = seeded();
        add_definition_grape(
            &mut catalog,
            CreateDefinitionGrape {
                id: Some("dg-1".to_string()),
                wine_definition_id: "wd-1".to_string(),
                grape_id: "G1".to_string(),
                fields: DefinitionGrapeFields {
                    min_pct: Some(Percentage::new(85.0).expect("valid")),
                    max_pct: None,
                    required: true,
                },
            },
        )
        .expect("row should add");

        let updated = update_definition_grape(
            &mut catalog,
            "dg-1",
            DefinitionGrapePatch {
                max_pct: Some(Some(Percentage::new(100.0).expect("valid"))),
                ..DefinitionGrapePatch::default()
            },
        )
        .expect("update should succeed");
        assert!(updated.required);
        assert_eq!(updated.min_pct.map(Percentage::value), Some(85.0));
        assert_eq!(updated.max_pct.map(Percentage::value), Some(100.0));

        assert_eq!(grapes_for_definition(&catalog, "wd-1").len(), 1);
        delete_definition_grape(&mut catalog, "dg-1").expect("delete should succeed");
        assert!(grapes_for_definition(&catalog, "wd-1").is_empty());
    }
}
