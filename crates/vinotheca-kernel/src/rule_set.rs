//! Whole-set checks over the grape rules attached to one or more owners.
//!
//! Every rule must pass [`validate_rule`] on its own. What happens when two
//! rules name the same (owner, grape) pair is a policy choice; the default
//! is permissive, where the later rule simply wins.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::RuleSetError;
use crate::grape_rule::{GrapeCompositionRule, RuleKind, validate_rule};

pub const RULE_SET_CHECK_KIND: &str = "vinotheca.grape_rule_set.check.v1";

/// Treatment of several rules for the same (owner, grape) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateGrapePolicy {
    /// Last write wins; duplicates are never rejected.
    #[default]
    Permissive,
    /// Duplicates are fine as long as they agree on the rule kind.
    RejectConflicting,
    /// At most one rule per pair.
    RejectDuplicates,
}

impl DuplicateGrapePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::RejectConflicting => "reject_conflicting",
            Self::RejectDuplicates => "reject_duplicates",
        }
    }
}

impl std::fmt::Display for DuplicateGrapePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DuplicateGrapePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "permissive" => Ok(Self::Permissive),
            "reject_conflicting" => Ok(Self::RejectConflicting),
            "reject_duplicates" => Ok(Self::RejectDuplicates),
            _ => Err(format!("unknown duplicate grape policy: {s}")),
        }
    }
}

/// Check that `candidate` may sit next to `existing` under `policy`.
///
/// `existing` must not contain the candidate itself (filter it out on update).
/// Per-rule validation is not repeated here.
pub fn admit_rule(
    existing: &[&GrapeCompositionRule],
    candidate: &GrapeCompositionRule,
    policy: DuplicateGrapePolicy,
) -> Result<(), RuleSetError> {
    let same_pair = existing
        .iter()
        .filter(|rule| rule.owner_id == candidate.owner_id && rule.grape_id == candidate.grape_id);

    for rule in same_pair {
        if let Some(conflict) = pair_conflict(rule.kind(), candidate, policy) {
            return Err(conflict);
        }
    }
    Ok(())
}

fn pair_conflict(
    previous: RuleKind,
    incoming: &GrapeCompositionRule,
    policy: DuplicateGrapePolicy,
) -> Option<RuleSetError> {
    match policy {
        DuplicateGrapePolicy::Permissive => None,
        DuplicateGrapePolicy::RejectDuplicates => Some(RuleSetError::DuplicateGrape {
            owner_id: incoming.owner_id.clone(),
            grape_id: incoming.grape_id.clone(),
        }),
        DuplicateGrapePolicy::RejectConflicting if previous != incoming.kind() => {
            Some(RuleSetError::ConflictingKinds {
                owner_id: incoming.owner_id.clone(),
                grape_id: incoming.grape_id.clone(),
                existing: previous,
                incoming: incoming.kind(),
            })
        }
        DuplicateGrapePolicy::RejectConflicting => None,
    }
}

fn rule_set_errors(rules: &[GrapeCompositionRule], policy: DuplicateGrapePolicy) -> Vec<RuleSetError> {
    let mut errors = Vec::new();
    let mut latest: BTreeMap<(&str, &str), RuleKind> = BTreeMap::new();

    for (index, rule) in rules.iter().enumerate() {
        if let Err(source) = validate_rule(&rule.fields) {
            errors.push(RuleSetError::InvalidRule {
                index,
                owner_id: rule.owner_id.clone(),
                grape_id: rule.grape_id.clone(),
                source,
            });
        }

        let key = (rule.owner_id.as_str(), rule.grape_id.as_str());
        if let Some(previous) = latest.insert(key, rule.kind())
            && let Some(conflict) = pair_conflict(previous, rule, policy)
        {
            errors.push(conflict);
        }
    }

    errors
}

/// First failure of the rule set, if any.
pub fn validate_rule_set(
    rules: &[GrapeCompositionRule],
    policy: DuplicateGrapePolicy,
) -> Result<(), RuleSetError> {
    match rule_set_errors(rules, policy).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// The rule in force for each (owner, grape) pair, in pair order. `rules`
/// must be in write order; the last one for a pair wins.
pub fn effective_rules(rules: &[GrapeCompositionRule]) -> Vec<&GrapeCompositionRule> {
    let mut latest: BTreeMap<(&str, &str), &GrapeCompositionRule> = BTreeMap::new();
    for rule in rules {
        latest.insert((rule.owner_id.as_str(), rule.grape_id.as_str()), rule);
    }
    latest.into_values().collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetFinding {
    pub owner_id: String,
    pub grape_id: String,
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetSummary {
    pub rule_count: usize,
    pub effective_rule_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetReport {
    pub check_kind: String,
    pub result: String,
    pub policy: DuplicateGrapePolicy,
    pub failure_classes: Vec<String>,
    pub errors: Vec<RuleSetFinding>,
    pub summary: RuleSetSummary,
}

impl RuleSetReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

/// Collect every finding over `rules` instead of stopping at the first.
pub fn check_rule_set(rules: &[GrapeCompositionRule], policy: DuplicateGrapePolicy) -> RuleSetReport {
    let errors: Vec<RuleSetFinding> = rule_set_errors(rules, policy)
        .into_iter()
        .map(|err| {
            let (owner_id, grape_id) = match &err {
                RuleSetError::InvalidRule {
                    owner_id, grape_id, ..
                }
                | RuleSetError::DuplicateGrape { owner_id, grape_id }
                | RuleSetError::ConflictingKinds {
                    owner_id, grape_id, ..
                } => (owner_id.clone(), grape_id.clone()),
            };
            RuleSetFinding {
                owner_id,
                grape_id,
                class: err.class().to_string(),
                message: err.to_string(),
            }
        })
        .collect();

    let failure_classes = errors
        .iter()
        .map(|finding| finding.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    RuleSetReport {
        check_kind: RULE_SET_CHECK_KIND.to_string(),
        result: if errors.is_empty() { "accepted" } else { "rejected" }.to_string(),
        policy,
        failure_classes,
        summary: RuleSetSummary {
            rule_count: rules.len(),
            effective_rule_count: effective_rules(rules).len(),
            error_count: errors.len(),
        },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FAILURE_CLASS_CONFLICTING_KINDS, FAILURE_CLASS_FORBIDDEN_RANGE};
    use crate::grape_rule::{GrapeRuleFields, Percentage};

    fn rule(owner: &str, grape: &str, kind: RuleKind, min: Option<f64>) -> GrapeCompositionRule {
        let min_pct = min.map(|v| Percentage::new(v).expect("test percentage should be in range"));
        GrapeCompositionRule::new(owner, grape, GrapeRuleFields::new(kind).with_range(min_pct, None))
    }

    #[test]
    fn permissive_keeps_last_write() {
        let rules = vec![
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A1", "G1", RuleKind::Forbidden, None),
        ];
        validate_rule_set(&rules, DuplicateGrapePolicy::Permissive).expect("permissive accepts duplicates");

        let effective = effective_rules(&rules);
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].kind(), RuleKind::Forbidden);
    }

    #[test]
    fn reject_conflicting_allows_agreeing_duplicates() {
        let agreeing = vec![
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A1", "G1", RuleKind::Allowed, Some(5.0)),
        ];
        validate_rule_set(&agreeing, DuplicateGrapePolicy::RejectConflicting)
            .expect("same-kind duplicates should pass");

        let conflicting = vec![
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A1", "G1", RuleKind::Forbidden, None),
        ];
        let err = validate_rule_set(&conflicting, DuplicateGrapePolicy::RejectConflicting)
            .expect_err("conflicting kinds must fail");
        assert!(matches!(
            err,
            RuleSetError::ConflictingKinds {
                existing: RuleKind::Allowed,
                incoming: RuleKind::Forbidden,
                ..
            }
        ));
    }

    #[test]
    fn reject_duplicates_is_pairwise() {
        let rules = vec![
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A2", "G1", RuleKind::Allowed, None),
            rule("A1", "G2", RuleKind::Allowed, None),
        ];
        validate_rule_set(&rules, DuplicateGrapePolicy::RejectDuplicates).expect("distinct pairs pass");

        let mut dup = rules.clone();
        dup.push(rule("A2", "G1", RuleKind::Allowed, None));
        let err = validate_rule_set(&dup, DuplicateGrapePolicy::RejectDuplicates)
            .expect_err("duplicate pair must fail");
        assert_eq!(
            err,
            RuleSetError::DuplicateGrape {
                owner_id: "A2".to_string(),
                grape_id: "G1".to_string(),
            }
        );
    }

    #[test]
    fn every_rule_is_validated_individually() {
        let rules = vec![
            rule("A1", "G1", RuleKind::Required, Some(10.0)),
            rule("A1", "G2", RuleKind::Required, None),
        ];
        let err = validate_rule_set(&rules, DuplicateGrapePolicy::Permissive)
            .expect_err("invalid member must fail");
        assert!(matches!(err, RuleSetError::InvalidRule { index: 1, .. }));
    }

    #[test]
    fn admit_rule_checks_only_same_pair() {
        let existing = [
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A1", "G2", RuleKind::Forbidden, None),
        ];
        let existing: Vec<&GrapeCompositionRule> = existing.iter().collect();

        let candidate = rule("A1", "G2", RuleKind::Required, Some(5.0));
        admit_rule(&existing, &candidate, DuplicateGrapePolicy::Permissive).expect("permissive admits");
        assert!(matches!(
            admit_rule(&existing, &candidate, DuplicateGrapePolicy::RejectConflicting),
            Err(RuleSetError::ConflictingKinds { .. })
        ));

        let fresh = rule("A1", "G3", RuleKind::Allowed, None);
        admit_rule(&existing, &fresh, DuplicateGrapePolicy::RejectDuplicates).expect("new pair admits");
    }

    #[test]
    fn report_collects_all_findings() {
        let forbidden_with_min = rule("A1", "G3", RuleKind::Forbidden, Some(5.0));
        let rules = vec![
            rule("A1", "G1", RuleKind::Allowed, None),
            rule("A1", "G1", RuleKind::Forbidden, None),
            forbidden_with_min,
        ];
        let report = check_rule_set(&rules, DuplicateGrapePolicy::RejectConflicting);
        assert!(!report.accepted());
        assert_eq!(report.summary.error_count, 2);
        assert_eq!(report.summary.effective_rule_count, 2);
        assert_eq!(
            report.failure_classes,
            vec![
                FAILURE_CLASS_FORBIDDEN_RANGE.to_string(),
                FAILURE_CLASS_CONFLICTING_KINDS.to_string(),
            ]
        );
    }

    #[test]
    fn policy_parses_dashed_names() {
        assert_eq!(
            "reject-duplicates".parse::<DuplicateGrapePolicy>(),
            Ok(DuplicateGrapePolicy::RejectDuplicates)
        );
        assert!("strict".parse::<DuplicateGrapePolicy>().is_err());
    }
}
