//! # vinotheca-kernel
//!
//! Ownership and composition rules for wine definitions.
//!
//! This crate is stateless: every operation is a pure function over
//! request-scoped values. Persistence, joins and ids belong to
//! `vinotheca-store`.
//!
//! ## Architecture
//!
//! ```text
//! scope        ← OwnershipFields ⇄ GeographicScope (most specific wins)
//!     │
//! hierarchy    ← AncestorChain folds joined ancestors back for reads
//!
//! grape_rule   ← RuleKind, Percentage, validate_rule, patch merge
//!     │
//! rule_set     ← duplicate-pair policy, whole-set report
//!
//! composition  ← definition-scoped grape entries (typed, unvalidated)
//! ```

pub mod composition;
pub mod error;
pub mod grape_rule;
pub mod hierarchy;
pub mod rule_set;
pub mod scope;

pub use composition::{DefinitionGrapeFields, DefinitionGrapePatch};
pub use error::{InvalidRuleError, RuleSetError};
pub use grape_rule::{
    GrapeCompositionRule, GrapeRuleFields, GrapeRulePatch, Percentage, RuleKind, validate_rule,
};
pub use hierarchy::{AncestorChain, AppellationLink, RegionLink, ResolvedOwnership, resolve_hierarchy};
pub use rule_set::{
    DuplicateGrapePolicy, RULE_SET_CHECK_KIND, RuleSetFinding, RuleSetReport, RuleSetSummary,
    admit_rule, check_rule_set, effective_rules, validate_rule_set,
};
pub use scope::{GeographicScope, OwnershipFields, OwnershipPatch, normalize_ownership};
