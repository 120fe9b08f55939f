use crate::cli::OwnershipCommands;
use crate::support::{Context, opt_display, print_json};
use serde_json::json;
use vinotheca_kernel::{GeographicScope, normalize_ownership};

pub fn run(context: &Context, command: OwnershipCommands) {
    match command {
        OwnershipCommands::Normalize { owner } => {
            let input = owner.into_fields();
            let stored = normalize_ownership(input.clone());
            let scope = GeographicScope::from_fields(&stored);

            if context.json {
                print_json(&json!({
                    "action": "ownership.normalize",
                    "input": input,
                    "stored": stored,
                    "scope": scope
                }));
                return;
            }
            println!(
                "vinotheca ownership normalize\n  Owner: {scope}\n  Country: {}\n  Region: {}\n  Appellation: {}",
                opt_display(stored.country_id.as_deref()),
                opt_display(stored.region_id.as_deref()),
                opt_display(stored.appellation_id.as_deref())
            );
        }
    }
}
