use crate::cli::GlobalArgs;
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vinotheca_kernel::DuplicateGrapePolicy;
use vinotheca_store::{CatalogError, MemoryCatalog, VinothecaConfig, mutate_catalog_jsonl};

pub const LOG_ENV_VAR: &str = "VINOTHECA_LOG";

/// Settings resolved from config plus command-line overrides.
#[derive(Debug, Clone)]
pub struct Context {
    pub catalog_path: PathBuf,
    pub policy: DuplicateGrapePolicy,
    pub json: bool,
}

/// Install the stderr subscriber. `VINOTHECA_LOG` takes `EnvFilter`
/// directives; `--verbose` raises the floor to debug.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let mut filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();
    if verbose {
        filter = filter.add_directive(LevelFilter::DEBUG.into());
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn exit_with(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn load_context_or_exit(global: &GlobalArgs) -> Context {
    let config = VinothecaConfig::load(&global.config).unwrap_or_else(|e| exit_with(e));
    let context = Context {
        catalog_path: global
            .catalog
            .clone()
            .unwrap_or(config.catalog.path),
        policy: global
            .policy
            .unwrap_or(config.rules.duplicate_grape_policy),
        json: global.json,
    };
    tracing::debug!(
        catalog = %context.catalog_path.display(),
        policy = %context.policy,
        "resolved cli context"
    );
    context
}

/// Read-only view of the catalog; a missing file reads as empty.
pub fn load_catalog_or_exit(path: &Path) -> MemoryCatalog {
    MemoryCatalog::load_jsonl_or_empty(path)
        .unwrap_or_else(|e| exit_with(format!("failed to load {}: {e}", path.display())))
}

/// Run one workflow under the catalog lock and persist on success.
pub fn mutate_or_exit<T>(
    path: &Path,
    mutation: impl FnOnce(&mut MemoryCatalog) -> Result<T, CatalogError>,
) -> T {
    mutate_catalog_jsonl(path, |catalog| mutation(catalog).map(|value| (value, true)))
        .unwrap_or_else(|e| exit_with(e))
}

pub fn or_exit<T>(result: Result<T, CatalogError>) -> T {
    result.unwrap_or_else(|e| exit_with(e))
}

/// `--x` sets, `--clear-x` clears, neither keeps.
pub fn patch_field<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

pub fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => exit_with(format!("json serialization failed: {e}")),
    }
}

pub fn opt_display(value: Option<impl Display>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
