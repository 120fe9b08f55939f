use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use vinotheca_kernel::{DuplicateGrapePolicy, OwnershipFields, Percentage, RuleKind};
use vinotheca_store::{DEFAULT_CONFIG_PATH, GrapeColor};

#[derive(Parser)]
#[command(
    name = "vinotheca",
    about = "Vinotheca: wine definitions, geographic ownership and grape composition rules",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to config TOML (missing file means defaults)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to catalog JSONL (overrides `[catalog] path`)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Duplicate grape policy (overrides `[rules] duplicate_grape_policy`)
    #[arg(long, global = true)]
    pub policy: Option<DuplicateGrapePolicy>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Countries, regions and appellations
    Place {
        #[command(subcommand)]
        command: PlaceCommands,
    },

    /// Grape varieties
    Grape {
        #[command(subcommand)]
        command: GrapeCommands,
    },

    /// Wine definitions
    Definition {
        #[command(subcommand)]
        command: DefinitionCommands,
    },

    /// Appellation-scoped grape rules
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Definition-scoped grape composition
    Composition {
        #[command(subcommand)]
        command: CompositionCommands,
    },

    /// Ownership helpers that do not touch the catalog
    Ownership {
        #[command(subcommand)]
        command: OwnershipCommands,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct OwnerArgs {
    /// Owning country ID
    #[arg(long)]
    pub country: Option<String>,

    /// Owning region ID
    #[arg(long)]
    pub region: Option<String>,

    /// Owning appellation ID
    #[arg(long)]
    pub appellation: Option<String>,
}

impl OwnerArgs {
    pub fn into_fields(self) -> OwnershipFields {
        OwnershipFields {
            country_id: self.country,
            region_id: self.region,
            appellation_id: self.appellation,
        }
    }
}

#[derive(Subcommand)]
pub enum PlaceCommands {
    /// Add a country
    AddCountry {
        /// Country name
        name: String,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,

        /// Country code (e.g. FR)
        #[arg(long)]
        code: Option<String>,
    },

    /// Add a region under a country
    AddRegion {
        /// Region name
        name: String,

        /// Parent country ID
        #[arg(long)]
        country: String,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Add an appellation under a region
    AddAppellation {
        /// Appellation name
        name: String,

        /// Parent region ID
        #[arg(long)]
        region: String,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,
    },

    /// List places, optionally one level only
    List {
        /// country, region, or appellation
        #[arg(long)]
        level: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GrapeCommands {
    /// Add a grape variety
    Add {
        /// Variety name
        name: String,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,

        /// red, white, or rose
        #[arg(long)]
        color: Option<GrapeColor>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },

    /// List grape varieties
    List,
}

#[derive(Subcommand)]
pub enum DefinitionCommands {
    /// Create a wine definition
    Add {
        /// Definition name
        name: String,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        owner: OwnerArgs,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Initial version (defaults to 1)
        #[arg(long)]
        version: Option<i64>,

        /// Opaque rule payload as JSON
        #[arg(long)]
        rule_json: Option<Value>,
    },

    /// Update a wine definition in place
    Update {
        /// Definition ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        owner: OwnerArgs,

        /// Clear the country owner
        #[arg(long, conflicts_with = "country")]
        clear_country: bool,

        /// Clear the region owner
        #[arg(long, conflicts_with = "region")]
        clear_region: bool,

        /// Clear the appellation owner
        #[arg(long, conflicts_with = "appellation")]
        clear_appellation: bool,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Clear the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,

        /// Explicit version (must not go below the stored one)
        #[arg(long)]
        version: Option<i64>,

        /// New rule payload as JSON
        #[arg(long)]
        rule_json: Option<Value>,

        /// Clear the rule payload
        #[arg(long, conflicts_with = "rule_json")]
        clear_rule_json: bool,
    },

    /// Show one definition with its resolved geography
    Show {
        /// Definition ID
        id: String,
    },

    /// List definitions
    List,

    /// Delete a definition and its composition rows
    Delete {
        /// Definition ID
        id: String,
    },

    /// Check ownership and the owning appellation's grape rules
    Check {
        /// Definition ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Add a grape rule to an appellation
    Add {
        /// Appellation ID
        #[arg(long)]
        appellation: String,

        /// Grape variety ID
        #[arg(long)]
        grape: String,

        /// allowed, required, or forbidden
        #[arg(long)]
        kind: RuleKind,

        /// Minimum percentage
        #[arg(long)]
        min: Option<Percentage>,

        /// Maximum percentage
        #[arg(long)]
        max: Option<Percentage>,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Update a grape rule; unspecified fields keep their stored value
    Update {
        /// Rule ID
        id: String,

        /// allowed, required, or forbidden
        #[arg(long)]
        kind: Option<RuleKind>,

        /// Minimum percentage
        #[arg(long)]
        min: Option<Percentage>,

        /// Maximum percentage
        #[arg(long)]
        max: Option<Percentage>,

        /// Clear the minimum
        #[arg(long, conflicts_with = "min")]
        clear_min: bool,

        /// Clear the maximum
        #[arg(long, conflicts_with = "max")]
        clear_max: bool,
    },

    /// List rules for an appellation or a grape
    List {
        /// Appellation ID
        #[arg(long, required_unless_present = "grape", conflicts_with = "grape")]
        appellation: Option<String>,

        /// Grape variety ID
        #[arg(long)]
        grape: Option<String>,
    },

    /// Delete a grape rule
    Delete {
        /// Rule ID
        id: String,
    },

    /// Check an appellation's rule set as a whole
    Check {
        /// Appellation ID
        #[arg(long)]
        appellation: String,
    },
}

#[derive(Subcommand)]
pub enum CompositionCommands {
    /// Add a grape to a definition's composition
    Add {
        /// Definition ID
        #[arg(long)]
        definition: String,

        /// Grape variety ID
        #[arg(long)]
        grape: String,

        /// Minimum percentage
        #[arg(long)]
        min: Option<Percentage>,

        /// Maximum percentage
        #[arg(long)]
        max: Option<Percentage>,

        /// Mark the grape as required
        #[arg(long)]
        required: bool,

        /// Optional explicit ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Update a composition row
    Update {
        /// Row ID
        id: String,

        /// Minimum percentage
        #[arg(long)]
        min: Option<Percentage>,

        /// Maximum percentage
        #[arg(long)]
        max: Option<Percentage>,

        /// Clear the minimum
        #[arg(long, conflicts_with = "min")]
        clear_min: bool,

        /// Clear the maximum
        #[arg(long, conflicts_with = "max")]
        clear_max: bool,

        /// Set the required flag
        #[arg(long)]
        required: Option<bool>,
    },

    /// List the composition of a definition
    List {
        /// Definition ID
        #[arg(long)]
        definition: String,
    },

    /// Delete a composition row
    Delete {
        /// Row ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum OwnershipCommands {
    /// Show which single owner a payload would be stored under
    Normalize {
        #[command(flatten)]
        owner: OwnerArgs,
    },
}
