//! Definition-scoped grape composition entries.
//!
//! A narrower sibling of [`GrapeCompositionRule`](crate::GrapeCompositionRule):
//! a boolean `required` flag instead of a rule kind, and no cross-field
//! invariant. Percentages are still typed, so each bound is in `[0, 100]`.

use serde::{Deserialize, Serialize};

use crate::grape_rule::Percentage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionGrapeFields {
    #[serde(default)]
    pub min_pct: Option<Percentage>,
    #[serde(default)]
    pub max_pct: Option<Percentage>,
    #[serde(default)]
    pub required: bool,
}

/// A partial composition update; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefinitionGrapePatch {
    pub min_pct: Option<Option<Percentage>>,
    pub max_pct: Option<Option<Percentage>>,
    pub required: Option<bool>,
}

impl DefinitionGrapePatch {
    pub fn merge_onto(&self, existing: &DefinitionGrapeFields) -> DefinitionGrapeFields {
        DefinitionGrapeFields {
            min_pct: self.min_pct.unwrap_or(existing.min_pct),
            max_pct: self.max_pct.unwrap_or(existing.max_pct),
            required: self.required.unwrap_or(existing.required),
        }
    }
}
