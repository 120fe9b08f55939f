//! Catalog record types as they are persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vinotheca_kernel::{
    DefinitionGrapeFields, GrapeCompositionRule, GrapeRuleFields, OwnershipFields, Percentage,
    RuleKind,
};

pub const TABLE_COUNTRIES: &str = "wine_countries";
pub const TABLE_REGIONS: &str = "wine_regions";
pub const TABLE_APPELLATIONS: &str = "wine_appellations";
pub const TABLE_GRAPE_VARIETIES: &str = "grape_varieties";
pub const TABLE_WINE_DEFINITIONS: &str = "wine_definitions";
pub const TABLE_GRAPE_APPELLATIONS: &str = "grape_appellations";
pub const TABLE_DEFINITION_GRAPES: &str = "wine_definition_grapes";

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

fn default_version() -> i64 {
    1
}

/// Fresh record id.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    pub name: String,
    pub country_id: String,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppellationRecord {
    pub id: String,
    pub name: String,
    pub region_id: String,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrapeColor {
    Red,
    White,
    Rose,
}

impl GrapeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::White => "white",
            Self::Rose => "rose",
        }
    }
}

impl std::fmt::Display for GrapeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GrapeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "white" => Ok(Self::White),
            "rose" | "rosé" => Ok(Self::Rose),
            _ => Err(format!("unknown grape color: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrapeVarietyRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<GrapeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A stored wine definition.
///
/// Ownership columns hold only the most specific owner; see
/// [`vinotheca_kernel::normalize_ownership`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineDefinitionRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country_id: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub appellation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_json: Option<Value>,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl WineDefinitionRecord {
    pub fn ownership(&self) -> OwnershipFields {
        OwnershipFields {
            country_id: self.country_id.clone(),
            region_id: self.region_id.clone(),
            appellation_id: self.appellation_id.clone(),
        }
    }

    pub fn set_ownership(&mut self, fields: OwnershipFields) {
        self.country_id = fields.country_id;
        self.region_id = fields.region_id;
        self.appellation_id = fields.appellation_id;
    }
}

/// An appellation-scoped grape rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrapeAppellationRecord {
    pub id: String,
    pub appellation_id: String,
    pub grape_id: String,
    pub rule: RuleKind,
    #[serde(default)]
    pub min_pct: Option<Percentage>,
    #[serde(default)]
    pub max_pct: Option<Percentage>,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl GrapeAppellationRecord {
    pub fn fields(&self) -> GrapeRuleFields {
        GrapeRuleFields {
            kind: self.rule,
            min_pct: self.min_pct,
            max_pct: self.max_pct,
        }
    }

    pub fn set_fields(&mut self, fields: GrapeRuleFields) {
        self.rule = fields.kind;
        self.min_pct = fields.min_pct;
        self.max_pct = fields.max_pct;
    }

    pub fn as_rule(&self) -> GrapeCompositionRule {
        GrapeCompositionRule::new(self.appellation_id.clone(), self.grape_id.clone(), self.fields())
    }
}

/// A definition-scoped grape entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionGrapeRecord {
    pub id: String,
    pub wine_definition_id: String,
    pub grape_id: String,
    #[serde(default)]
    pub min_pct: Option<Percentage>,
    #[serde(default)]
    pub max_pct: Option<Percentage>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl DefinitionGrapeRecord {
    pub fn fields(&self) -> DefinitionGrapeFields {
        DefinitionGrapeFields {
            min_pct: self.min_pct,
            max_pct: self.max_pct,
            required: self.required,
        }
    }

    pub fn set_fields(&mut self, fields: DefinitionGrapeFields) {
        self.min_pct = fields.min_pct;
        self.max_pct = fields.max_pct;
        self.required = fields.required;
    }
}

/// One JSONL line: a record tagged with its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum CatalogEntry {
    Country(CountryRecord),
    Region(RegionRecord),
    Appellation(AppellationRecord),
    GrapeVariety(GrapeVarietyRecord),
    WineDefinition(WineDefinitionRecord),
    GrapeAppellation(GrapeAppellationRecord),
    DefinitionGrape(DefinitionGrapeRecord),
}
