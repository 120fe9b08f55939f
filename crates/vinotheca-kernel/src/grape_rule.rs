//! Grape-composition rules and their per-rule invariants.

use serde::{Deserialize, Serialize};

use crate::error::InvalidRuleError;

/// How a rule constrains one grape variety within a blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Allowed,
    Required,
    Forbidden,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Required => "required",
            Self::Forbidden => "forbidden",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allowed" => Ok(Self::Allowed),
            "required" => Ok(Self::Required),
            "forbidden" => Ok(Self::Forbidden),
            _ => Err(format!("unknown rule kind: {s}")),
        }
    }
}

/// A blend share in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self, InvalidRuleError> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidRuleError::PercentageOutOfRange(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Percentage {
    type Error = InvalidRuleError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl std::str::FromStr for Percentage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(|_| format!("invalid percentage: {s}"))?;
        Self::new(value).map_err(|e| e.to_string())
    }
}

/// The fields a rule's invariants are checked over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrapeRuleFields {
    #[serde(rename = "rule")]
    pub kind: RuleKind,
    #[serde(default)]
    pub min_pct: Option<Percentage>,
    #[serde(default)]
    pub max_pct: Option<Percentage>,
}

impl GrapeRuleFields {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            min_pct: None,
            max_pct: None,
        }
    }

    pub fn with_range(mut self, min_pct: Option<Percentage>, max_pct: Option<Percentage>) -> Self {
        self.min_pct = min_pct;
        self.max_pct = max_pct;
        self
    }

    pub fn validate(&self) -> Result<(), InvalidRuleError> {
        validate_rule(self)
    }
}

/// Check one rule's fields against each other.
///
/// Checks run in order: required needs a minimum, forbidden takes no range,
/// and a present minimum may not exceed a present maximum.
pub fn validate_rule(fields: &GrapeRuleFields) -> Result<(), InvalidRuleError> {
    if fields.kind == RuleKind::Required && fields.min_pct.is_none() {
        return Err(InvalidRuleError::RequiredWithoutMinimum);
    }

    if fields.kind == RuleKind::Forbidden && (fields.min_pct.is_some() || fields.max_pct.is_some())
    {
        return Err(InvalidRuleError::ForbiddenWithRange);
    }

    if let (Some(min_pct), Some(max_pct)) = (fields.min_pct, fields.max_pct)
        && min_pct > max_pct
    {
        return Err(InvalidRuleError::MinimumExceedsMaximum {
            min_pct: min_pct.value(),
            max_pct: max_pct.value(),
        });
    }

    Ok(())
}

/// A partial rule update.
///
/// Percentage fields are `None` to keep, `Some(None)` to clear, or
/// `Some(Some(pct))` to set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrapeRulePatch {
    pub kind: Option<RuleKind>,
    pub min_pct: Option<Option<Percentage>>,
    pub max_pct: Option<Option<Percentage>>,
}

impl GrapeRulePatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.min_pct.is_none() && self.max_pct.is_none()
    }

    /// The effective record an update must be validated against.
    pub fn merge_onto(&self, existing: &GrapeRuleFields) -> GrapeRuleFields {
        GrapeRuleFields {
            kind: self.kind.unwrap_or(existing.kind),
            min_pct: self.min_pct.unwrap_or(existing.min_pct),
            max_pct: self.max_pct.unwrap_or(existing.max_pct),
        }
    }
}

/// A rule attached to one owner (appellation) for one grape variety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrapeCompositionRule {
    pub owner_id: String,
    pub grape_id: String,
    #[serde(flatten)]
    pub fields: GrapeRuleFields,
}

impl GrapeCompositionRule {
    pub fn new(owner_id: impl Into<String>, grape_id: impl Into<String>, fields: GrapeRuleFields) -> Self {
        Self {
            owner_id: owner_id.into(),
            grape_id: grape_id.into(),
            fields,
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.fields.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(value: f64) -> Option<Percentage> {
        Some(Percentage::new(value).expect("test percentage should be in range"))
    }

    #[test]
    fn required_needs_minimum() {
        let err = validate_rule(&GrapeRuleFields::new(RuleKind::Required))
            .expect_err("required without min must fail");
        assert_eq!(err, InvalidRuleError::RequiredWithoutMinimum);
        assert_eq!(err.to_string(), "required rules must include a minimum percentage");

        validate_rule(&GrapeRuleFields::new(RuleKind::Required).with_range(pct(10.0), None))
            .expect("required with min should pass");
    }

    #[test]
    fn forbidden_rejects_any_bound() {
        for (min, max) in [(pct(5.0), None), (None, pct(5.0)), (pct(0.0), pct(0.0))] {
            let err = validate_rule(&GrapeRuleFields::new(RuleKind::Forbidden).with_range(min, max))
                .expect_err("forbidden with a bound must fail");
            assert_eq!(err.to_string(), "forbidden rules may not define percentage ranges");
        }
        validate_rule(&GrapeRuleFields::new(RuleKind::Forbidden)).expect("bare forbidden should pass");
    }

    #[test]
    fn inverted_range_rejected() {
        let err = validate_rule(&GrapeRuleFields::new(RuleKind::Allowed).with_range(pct(40.0), pct(20.0)))
            .expect_err("min > max must fail");
        assert!(matches!(
            err,
            InvalidRuleError::MinimumExceedsMaximum { min_pct, max_pct } if min_pct == 40.0 && max_pct == 20.0
        ));
        assert_eq!(err.to_string(), "minimum percentage cannot exceed maximum percentage");

        validate_rule(&GrapeRuleFields::new(RuleKind::Allowed).with_range(pct(10.0), pct(40.0)))
            .expect("ordered range should pass");
        validate_rule(&GrapeRuleFields::new(RuleKind::Allowed).with_range(pct(25.0), pct(25.0)))
            .expect("equal bounds should pass");
    }

    #[test]
    fn required_check_runs_before_range_check() {
        let err = validate_rule(&GrapeRuleFields::new(RuleKind::Required).with_range(None, pct(5.0)))
            .expect_err("required without min must fail");
        assert_eq!(err, InvalidRuleError::RequiredWithoutMinimum);
    }

    #[test]
    fn percentage_bounds() {
        assert!(Percentage::new(0.0).is_ok());
        assert!(Percentage::new(100.0).is_ok());
        assert!(matches!(
            Percentage::new(100.5),
            Err(InvalidRuleError::PercentageOutOfRange(v)) if v == 100.5
        ));
        assert!(Percentage::new(-1.0).is_err());
        assert!(Percentage::new(f64::NAN).is_err());
        assert_eq!("12.5%".parse::<Percentage>().map(Percentage::value), Ok(12.5));
        assert!("abc".parse::<Percentage>().is_err());
    }

    #[test]
    fn percentage_deserialization_enforces_range() {
        let parsed: Result<GrapeRuleFields, _> =
            serde_json::from_str(r#"{"rule":"allowed","min_pct":150}"#);
        assert!(parsed.is_err());

        let parsed: GrapeRuleFields = serde_json::from_str(r#"{"rule":"required","min_pct":15}"#)
            .expect("in-range rule should parse");
        assert_eq!(parsed.kind, RuleKind::Required);
        assert_eq!(parsed.min_pct, pct(15.0));
        assert_eq!(parsed.max_pct, None);
    }

    #[test]
    fn patch_keeps_stored_bounds() {
        let existing = GrapeRuleFields::new(RuleKind::Allowed).with_range(pct(10.0), pct(60.0));

        let kind_only = GrapeRulePatch {
            kind: Some(RuleKind::Forbidden),
            ..GrapeRulePatch::default()
        };
        let effective = kind_only.merge_onto(&existing);
        assert_eq!(effective.min_pct, pct(10.0));
        assert_eq!(effective.max_pct, pct(60.0));
        assert_eq!(validate_rule(&effective), Err(InvalidRuleError::ForbiddenWithRange));

        let clearing = GrapeRulePatch {
            kind: Some(RuleKind::Forbidden),
            min_pct: Some(None),
            max_pct: Some(None),
        };
        validate_rule(&clearing.merge_onto(&existing)).expect("cleared forbidden should pass");
    }

    #[test]
    fn rule_kind_parses_case_insensitively() {
        assert_eq!("Required".parse::<RuleKind>(), Ok(RuleKind::Required));
        assert_eq!(" forbidden ".parse::<RuleKind>(), Ok(RuleKind::Forbidden));
        assert!("maybe".parse::<RuleKind>().is_err());
    }
}
