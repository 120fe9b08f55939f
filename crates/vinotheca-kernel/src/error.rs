//! Error types for kernel validation.

use crate::grape_rule::RuleKind;

pub const FAILURE_CLASS_REQUIRED_MIN_MISSING: &str = "grape_rule.required.min_missing";
pub const FAILURE_CLASS_FORBIDDEN_RANGE: &str = "grape_rule.forbidden.range_defined";
pub const FAILURE_CLASS_RANGE_INVERTED: &str = "grape_rule.range.inverted";
pub const FAILURE_CLASS_PERCENTAGE_OUT_OF_RANGE: &str = "grape_rule.percentage.out_of_range";
pub const FAILURE_CLASS_DUPLICATE_GRAPE: &str = "grape_rule_set.grape.duplicate";
pub const FAILURE_CLASS_CONFLICTING_KINDS: &str = "grape_rule_set.grape.conflicting_kinds";

/// A grape-composition rule whose own fields are inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRuleError {
    /// A `required` rule with no lower bound.
    #[error("required rules must include a minimum percentage")]
    RequiredWithoutMinimum,

    /// A `forbidden` rule carrying a minimum or maximum.
    #[error("forbidden rules may not define percentage ranges")]
    ForbiddenWithRange,

    /// Both bounds present with the minimum above the maximum.
    #[error("minimum percentage cannot exceed maximum percentage")]
    MinimumExceedsMaximum { min_pct: f64, max_pct: f64 },

    /// Raised while typing a field, before rule validation runs.
    #[error("percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(f64),
}

impl InvalidRuleError {
    /// Stable machine-readable class for reports.
    pub fn class(&self) -> &'static str {
        match self {
            Self::RequiredWithoutMinimum => FAILURE_CLASS_REQUIRED_MIN_MISSING,
            Self::ForbiddenWithRange => FAILURE_CLASS_FORBIDDEN_RANGE,
            Self::MinimumExceedsMaximum { .. } => FAILURE_CLASS_RANGE_INVERTED,
            Self::PercentageOutOfRange(_) => FAILURE_CLASS_PERCENTAGE_OUT_OF_RANGE,
        }
    }
}

/// A rule set that fails validation as a whole.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleSetError {
    /// One rule in the set fails its own validation.
    #[error("rule #{index} (grape {grape_id} in {owner_id}): {source}")]
    InvalidRule {
        index: usize,
        owner_id: String,
        grape_id: String,
        #[source]
        source: InvalidRuleError,
    },

    /// A second rule for the same (owner, grape) pair.
    #[error("duplicate rule for grape {grape_id} in {owner_id}")]
    DuplicateGrape { owner_id: String, grape_id: String },

    /// Two rules for the same (owner, grape) pair with different kinds.
    #[error("conflicting rules for grape {grape_id} in {owner_id}: {existing} vs {incoming}")]
    ConflictingKinds {
        owner_id: String,
        grape_id: String,
        existing: RuleKind,
        incoming: RuleKind,
    },
}

impl RuleSetError {
    /// Stable machine-readable class for reports.
    pub fn class(&self) -> &'static str {
        match self {
            Self::InvalidRule { source, .. } => source.class(),
            Self::DuplicateGrape { .. } => FAILURE_CLASS_DUPLICATE_GRAPE,
            Self::ConflictingKinds { .. } => FAILURE_CLASS_CONFLICTING_KINDS,
        }
    }
}
