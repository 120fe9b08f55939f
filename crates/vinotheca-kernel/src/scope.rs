//! Geographic ownership of a wine definition.
//!
//! Storage keeps three nullable columns (`country_id`, `region_id`,
//! `appellation_id`). The kernel works with [`GeographicScope`], which can
//! only ever name one owner. [`GeographicScope::from_fields`] and
//! [`GeographicScope::to_fields`] are the two mappings at the storage
//! boundary; everything between them is typed.
//!
//! ```text
//! OwnershipFields ──from_fields──▶ GeographicScope ──to_fields──▶ OwnershipFields
//!   (0..3 set)        appellation > region > country          (0..1 set)
//! ```

use serde::{Deserialize, Serialize};

/// The three-nullable-field storage representation of an owner.
///
/// Empty strings are treated as absent everywhere in the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnershipFields {
    #[serde(default)]
    pub country_id: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub appellation_id: Option<String>,
}

impl OwnershipFields {
    pub fn country(id: impl Into<String>) -> Self {
        Self {
            country_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn region(id: impl Into<String>) -> Self {
        Self {
            region_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn appellation(id: impl Into<String>) -> Self {
        Self {
            appellation_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Number of fields carrying a non-empty id.
    pub fn populated_count(&self) -> usize {
        [&self.country_id, &self.region_id, &self.appellation_id]
            .into_iter()
            .filter(|field| present(field).is_some())
            .count()
    }

    /// Whether these fields are already in normalized form.
    pub fn is_canonical(&self) -> bool {
        *self == normalize_ownership(self.clone())
    }
}

pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|id| !id.is_empty())
}

/// The single owning geography of a wine definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "snake_case")]
pub enum GeographicScope {
    Country(String),
    Region(String),
    Appellation(String),
    #[default]
    Unset,
}

impl GeographicScope {
    /// Collapse storage fields with most-specific-wins precedence.
    ///
    /// Total over every input shape: absent and empty fields are skipped.
    pub fn from_fields(fields: &OwnershipFields) -> Self {
        if let Some(id) = present(&fields.appellation_id) {
            Self::Appellation(id.to_string())
        } else if let Some(id) = present(&fields.region_id) {
            Self::Region(id.to_string())
        } else if let Some(id) = present(&fields.country_id) {
            Self::Country(id.to_string())
        } else {
            Self::Unset
        }
    }

    /// Storage fields with exactly the owning column set (or none).
    pub fn to_fields(&self) -> OwnershipFields {
        match self {
            Self::Country(id) => OwnershipFields::country(id.clone()),
            Self::Region(id) => OwnershipFields::region(id.clone()),
            Self::Appellation(id) => OwnershipFields::appellation(id.clone()),
            Self::Unset => OwnershipFields::default(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Country(id) | Self::Region(id) | Self::Appellation(id) => Some(id),
            Self::Unset => None,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            Self::Country(_) => "country",
            Self::Region(_) => "region",
            Self::Appellation(_) => "appellation",
            Self::Unset => "unset",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl std::fmt::Display for GeographicScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{id}", self.level()),
            None => f.write_str(self.level()),
        }
    }
}

/// Keep only the most specific owner of a write payload.
///
/// If `appellation_id` is set, `region_id` and `country_id` are cleared; else
/// if `region_id` is set, `country_id` is cleared; otherwise the payload is
/// returned as given (minus empty ids).
pub fn normalize_ownership(fields: OwnershipFields) -> OwnershipFields {
    GeographicScope::from_fields(&fields).to_fields()
}

/// A partial ownership update.
///
/// Each field is `None` to keep the stored value, `Some(None)` to clear it,
/// or `Some(Some(id))` to set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipPatch {
    pub country_id: Option<Option<String>>,
    pub region_id: Option<Option<String>>,
    pub appellation_id: Option<Option<String>>,
}

impl OwnershipPatch {
    pub fn is_empty(&self) -> bool {
        self.country_id.is_none() && self.region_id.is_none() && self.appellation_id.is_none()
    }

    /// Effective (not yet normalized) ownership after applying this patch.
    pub fn merge_onto(&self, stored: &OwnershipFields) -> OwnershipFields {
        OwnershipFields {
            country_id: merge_field(&self.country_id, &stored.country_id),
            region_id: merge_field(&self.region_id, &stored.region_id),
            appellation_id: merge_field(&self.appellation_id, &stored.appellation_id),
        }
    }
}

fn merge_field(patch: &Option<Option<String>>, stored: &Option<String>) -> Option<String> {
    match patch {
        Some(value) => value.clone(),
        None => stored.clone(),
    }
}
