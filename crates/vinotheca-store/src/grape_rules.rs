//! Appellation-scoped grape rule workflows.
//!
//! Every write validates the effective record (after merging an update onto
//! the stored row) before anything reaches the backend, so a rejected write
//! leaves the catalog exactly as it was.

use chrono::Utc;
use vinotheca_kernel::{
    DuplicateGrapePolicy, GrapeCompositionRule, GrapeRuleFields, GrapeRulePatch, RuleSetReport,
    admit_rule, check_rule_set, validate_rule,
};

use crate::backend::CatalogBackend;
use crate::error::CatalogError;
use crate::records::{
    GrapeAppellationRecord, TABLE_APPELLATIONS, TABLE_GRAPE_APPELLATIONS, TABLE_GRAPE_VARIETIES,
    new_record_id,
};

#[derive(Debug, Clone)]
pub struct CreateGrapeRule {
    pub id: Option<String>,
    pub appellation_id: String,
    pub grape_id: String,
    pub fields: GrapeRuleFields,
}

fn validate_fields(fields: &GrapeRuleFields, appellation_id: &str, grape_id: &str) -> Result<(), CatalogError> {
    validate_rule(fields).map_err(|err| {
        tracing::warn!(
            appellation_id,
            grape_id,
            class = err.class(),
            "rejected grape rule: {err}"
        );
        CatalogError::from(err)
    })
}

fn admit(
    backend: &impl CatalogBackend,
    candidate: &GrapeCompositionRule,
    skip_id: Option<&str>,
    policy: DuplicateGrapePolicy,
) -> Result<(), CatalogError> {
    let siblings: Vec<GrapeCompositionRule> = backend
        .grape_appellations()
        .into_iter()
        .filter(|row| row.appellation_id == candidate.owner_id)
        .filter(|row| Some(row.id.as_str()) != skip_id)
        .map(GrapeAppellationRecord::as_rule)
        .collect();
    let siblings: Vec<&GrapeCompositionRule> = siblings.iter().collect();

    admit_rule(&siblings, candidate, policy).map_err(|err| {
        tracing::warn!(
            appellation_id = %candidate.owner_id,
            grape_id = %candidate.grape_id,
            policy = %policy,
            class = err.class(),
            "rejected grape rule: {err}"
        );
        CatalogError::from(err)
    })
}

pub fn create_grape_rule(
    backend: &mut impl CatalogBackend,
    request: CreateGrapeRule,
    policy: DuplicateGrapePolicy,
) -> Result<GrapeAppellationRecord, CatalogError> {
    validate_fields(&request.fields, &request.appellation_id, &request.grape_id)?;

    if backend.appellation(&request.appellation_id).is_none() {
        return Err(CatalogError::missing_reference(
            "appellation_id",
            TABLE_APPELLATIONS,
            &request.appellation_id,
        ));
    }
    if backend.grape_variety(&request.grape_id).is_none() {
        return Err(CatalogError::missing_reference(
            "grape_id",
            TABLE_GRAPE_VARIETIES,
            &request.grape_id,
        ));
    }

    let candidate = GrapeCompositionRule::new(
        request.appellation_id.clone(),
        request.grape_id.clone(),
        request.fields,
    );
    admit(&*backend, &candidate, None, policy)?;

    let id = request.id.unwrap_or_else(new_record_id);
    if backend.grape_appellation(&id).is_some() {
        return Err(CatalogError::AlreadyExists {
            table: TABLE_GRAPE_APPELLATIONS,
            id,
        });
    }

    let now = Utc::now();
    let mut record = GrapeAppellationRecord {
        id,
        appellation_id: request.appellation_id,
        grape_id: request.grape_id,
        rule: request.fields.kind,
        min_pct: None,
        max_pct: None,
        created_at: now,
        updated_at: now,
    };
    record.set_fields(request.fields);

    backend.put_grape_appellation(record.clone());
    tracing::info!(
        rule_id = %record.id,
        appellation_id = %record.appellation_id,
        grape_id = %record.grape_id,
        rule = %record.rule,
        "created grape rule"
    );
    Ok(record)
}

/// Apply a partial update. The merged record is what gets validated, so a
/// kind-only change is checked against the stored percentages.
pub fn update_grape_rule(
    backend: &mut impl CatalogBackend,
    id: &str,
    patch: GrapeRulePatch,
    policy: DuplicateGrapePolicy,
) -> Result<GrapeAppellationRecord, CatalogError> {
    let existing = backend
        .grape_appellation(id)
        .cloned()
        .ok_or_else(|| CatalogError::not_found(TABLE_GRAPE_APPELLATIONS, id))?;

    let merged = patch.merge_onto(&existing.fields());
    validate_fields(&merged, &existing.appellation_id, &existing.grape_id)?;

    let candidate = GrapeCompositionRule::new(
        existing.appellation_id.clone(),
        existing.grape_id.clone(),
        merged,
    );
    admit(&*backend, &candidate, Some(id), policy)?;

    let mut record = existing;
    record.set_fields(merged);
    record.updated_at = Utc::now();

    backend.put_grape_appellation(record.clone());
    tracing::info!(
        rule_id = %record.id,
        appellation_id = %record.appellation_id,
        grape_id = %record.grape_id,
        rule = %record.rule,
        "updated grape rule"
    );
    Ok(record)
}

pub fn delete_grape_rule(
    backend: &mut impl CatalogBackend,
    id: &str,
) -> Result<GrapeAppellationRecord, CatalogError> {
    let removed = backend
        .remove_grape_appellation(id)
        .ok_or_else(|| CatalogError::not_found(TABLE_GRAPE_APPELLATIONS, id))?;
    tracing::info!(rule_id = %id, appellation_id = %removed.appellation_id, "deleted grape rule");
    Ok(removed)
}

/// Rules of one appellation, ordered by rule kind then grape.
pub fn rules_for_appellation<'a>(
    backend: &'a impl CatalogBackend,
    appellation_id: &str,
) -> Vec<&'a GrapeAppellationRecord> {
    let mut rows: Vec<_> = backend
        .grape_appellations()
        .into_iter()
        .filter(|row| row.appellation_id == appellation_id)
        .collect();
    rows.sort_by(|a, b| (a.rule, &a.grape_id, &a.id).cmp(&(b.rule, &b.grape_id, &b.id)));
    rows
}

/// Rules naming one grape, ordered by appellation.
pub fn rules_for_grape<'a>(
    backend: &'a impl CatalogBackend,
    grape_id: &str,
) -> Vec<&'a GrapeAppellationRecord> {
    let mut rows: Vec<_> = backend
        .grape_appellations()
        .into_iter()
        .filter(|row| row.grape_id == grape_id)
        .collect();
    rows.sort_by(|a, b| (&a.appellation_id, &a.id).cmp(&(&b.appellation_id, &b.id)));
    rows
}

/// Rules of one appellation in the order they were last written, so an
/// update moves a rule behind its untouched siblings.
pub(crate) fn rules_in_write_order<'a>(
    backend: &'a impl CatalogBackend,
    appellation_id: &str,
) -> Vec<&'a GrapeAppellationRecord> {
    let mut rows: Vec<_> = backend
        .grape_appellations()
        .into_iter()
        .filter(|row| row.appellation_id == appellation_id)
        .collect();
    rows.sort_by(|a, b| (a.updated_at, &a.id).cmp(&(b.updated_at, &b.id)));
    rows
}

/// Check the stored rule set of an appellation as a whole.
pub fn check_appellation_rules(
    backend: &impl CatalogBackend,
    appellation_id: &str,
    policy: DuplicateGrapePolicy,
) -> Result<RuleSetReport, CatalogError> {
    if backend.appellation(appellation_id).is_none() {
        return Err(CatalogError::not_found(TABLE_APPELLATIONS, appellation_id));
    }
    let rules: Vec<GrapeCompositionRule> = rules_in_write_order(backend, appellation_id)
        .into_iter()
        .map(GrapeAppellationRecord::as_rule)
        .collect();
    let report = check_rule_set(&rules, policy);
    if !report.accepted() {
        tracing::warn!(
            appellation_id,
            errors = report.summary.error_count,
            "appellation rule set rejected"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::{
        NewAppellation, NewCountry, NewGrapeVariety, NewRegion, add_appellation, add_country,
        add_grape_variety, add_region,
    };
    use crate::memory::MemoryCatalog;
    use vinotheca_kernel::{InvalidRuleError, Percentage, RuleKind, RuleSetError};

    fn pct(value: f64) -> Option<Percentage> {
        Some(Percentage::new(value).expect("percentage should be valid"))
    }

    fn seeded() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::default();
        add_country(
            &mut catalog,
            NewCountry {
                id: Some("C1".to_string()),
                name: "France".to_string(),
                ..NewCountry::default()
            },
        )
        .expect("country should add");
        add_region(
            &mut catalog,
            NewRegion {
                id: Some("R1".to_string()),
                name: "Rhône".to_string(),
                country_id: "C1".to_string(),
            },
        )
        .expect("region should add");
        add_appellation(
            &mut catalog,
            NewAppellation {
                id: Some("AP1".to_string()),
                name: "Côte-Rôtie".to_string(),
                region_id: "R1".to_string(),
            },
        )
        .expect("appellation should add");
        for (id, name) in [("G1", "Syrah"), ("G2", "Viognier")] {
            add_grape_variety(
                &mut catalog,
                NewGrapeVariety {
                    id: Some(id.to_string()),
                    name: name.to_string(),
                    ..NewGrapeVariety::default()
                },
            )
            .expect("grape should add");
        }
        catalog
    }

    fn rule(id: &str, grape_id: &str, fields: GrapeRuleFields) -> CreateGrapeRule {
        CreateGrapeRule {
            id: Some(id.to_string()),
            appellation_id: "AP1".to_string(),
            grape_id: grape_id.to_string(),
            fields,
        }
    }

    #[test]
    fn invalid_rule_is_rejected_before_reference_checks() {
        let mut catalog = MemoryCatalog::default();
        let err = create_grape_rule(
            &mut catalog,
            rule("ga-1", "G1", GrapeRuleFields::new(RuleKind::Required)),
            DuplicateGrapePolicy::Permissive,
        )
        .expect_err("required without minimum must fail");
        assert!(matches!(
            err,
            CatalogError::InvalidRule(InvalidRuleError::RequiredWithoutMinimum)
        ));
    }

    #[test]
    fn unknown_grape_is_a_missing_reference() {
        let mut catalog = seeded();
        let err = create_grape_rule(
            &mut catalog,
            rule("ga-1", "G404", GrapeRuleFields::new(RuleKind::Allowed)),
            DuplicateGrapePolicy::Permissive,
        )
        .expect_err("unknown grape must fail");
        assert!(matches!(err, CatalogError::MissingReference { field: "grape_id", .. }));
    }

    #[test]
    fn kind_only_update_is_checked_against_stored_range() {
        let mut catalog = seeded();
        create_grape_rule(
            &mut catalog,
            rule(
                "ga-1",
                "G1",
                GrapeRuleFields::new(RuleKind::Allowed).with_range(pct(10.0), pct(60.0)),
            ),
            DuplicateGrapePolicy::Permissive,
        )
        .expect("rule should create");

        let err = update_grape_rule(
            &mut catalog,
            "ga-1",
            GrapeRulePatch {
                kind: Some(RuleKind::Forbidden),
                ..GrapeRulePatch::default()
            },
            DuplicateGrapePolicy::Permissive,
        )
        .expect_err("forbidden with stored range must fail");
        assert!(matches!(
            err,
            CatalogError::InvalidRule(InvalidRuleError::ForbiddenWithRange)
        ));
        let stored = catalog.grape_appellation("ga-1").expect("rule stored");
        assert_eq!(stored.rule, RuleKind::Allowed);

        let cleared = update_grape_rule(
            &mut catalog,
            "ga-1",
            GrapeRulePatch {
                kind: Some(RuleKind::Forbidden),
                min_pct: Some(None),
                max_pct: Some(None),
            },
            DuplicateGrapePolicy::Permissive,
        )
        .expect("forbidden with cleared range should succeed");
        assert_eq!(cleared.rule, RuleKind::Forbidden);
        assert_eq!(cleared.min_pct, None);
    }

    #[test]
    fn updated_rule_becomes_the_effective_one() {
        let mut catalog = seeded();
        let policy = DuplicateGrapePolicy::Permissive;
        create_grape_rule(
            &mut catalog,
            rule("zz-first", "G1", GrapeRuleFields::new(RuleKind::Allowed)),
            policy,
        )
        .expect("first rule should create");
        create_grape_rule(
            &mut catalog,
            rule("aa-second", "G1", GrapeRuleFields::new(RuleKind::Forbidden)),
            policy,
        )
        .expect("second rule should create");

        update_grape_rule(
            &mut catalog,
            "zz-first",
            GrapeRulePatch {
                kind: Some(RuleKind::Required),
                min_pct: Some(pct(10.0)),
                ..GrapeRulePatch::default()
            },
            policy,
        )
        .expect("update should succeed");

        let rules: Vec<GrapeCompositionRule> = rules_in_write_order(&catalog, "AP1")
            .into_iter()
            .map(GrapeAppellationRecord::as_rule)
            .collect();
        let effective = vinotheca_kernel::effective_rules(&rules);
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].kind(), RuleKind::Required);
    }

    #[test]
    fn conflicting_policy_rejects_second_kind() {
        let mut catalog = seeded();
        let policy = DuplicateGrapePolicy::RejectConflicting;
        create_grape_rule(
            &mut catalog,
            rule("ga-1", "G1", GrapeRuleFields::new(RuleKind::Allowed)),
            policy,
        )
        .expect("first rule should create");
        create_grape_rule(
            &mut catalog,
            rule("ga-2", "G1", GrapeRuleFields::new(RuleKind::Allowed).with_range(None, pct(50.0))),
            policy,
        )
        .expect("same kind is tolerated");

        let err = create_grape_rule(
            &mut catalog,
            rule("ga-3", "G1", GrapeRuleFields::new(RuleKind::Forbidden)),
            policy,
        )
        .expect_err("conflicting kind must fail");
        assert!(matches!(
            err,
            CatalogError::RuleSet(RuleSetError::ConflictingKinds { .. })
        ));
        assert!(catalog.grape_appellation("ga-3").is_none());
    }

    #[test]
    fn update_does_not_conflict_with_itself() {
        let mut catalog = seeded();
        let policy = DuplicateGrapePolicy::RejectDuplicates;
        create_grape_rule(
            &mut catalog,
            rule("ga-1", "G1", GrapeRuleFields::new(RuleKind::Allowed)),
            policy,
        )
        .expect("rule should create");
        update_grape_rule(
            &mut catalog,
            "ga-1",
            GrapeRulePatch {
                kind: Some(RuleKind::Required),
                min_pct: Some(pct(20.0)),
                ..GrapeRulePatch::default()
            },
            policy,
        )
        .expect("updating the only rule should succeed");
    }

    #[test]
    fn listings_are_ordered() {
        let mut catalog = seeded();
        let policy = DuplicateGrapePolicy::Permissive;
        create_grape_rule(
            &mut catalog,
            rule("ga-1", "G2", GrapeRuleFields::new(RuleKind::Forbidden)),
            policy,
        )
        .expect("rule should create");
        create_grape_rule(
            &mut catalog,
            rule("ga-2", "G1", GrapeRuleFields::new(RuleKind::Required).with_range(pct(80.0), None)),
            policy,
        )
        .expect("rule should create");

        let kinds: Vec<RuleKind> = rules_for_appellation(&catalog, "AP1")
            .into_iter()
            .map(|row| row.rule)
            .collect();
        assert_eq!(kinds, vec![RuleKind::Required, RuleKind::Forbidden]);
        assert_eq!(rules_for_grape(&catalog, "G2").len(), 1);

        let report = check_appellation_rules(&catalog, "AP1", policy).expect("check should run");
        assert!(report.accepted());
        assert_eq!(report.summary.rule_count, 2);
    }
}
