use crate::cli::GrapeCommands;
use crate::support::{Context, load_catalog_or_exit, mutate_or_exit, opt_display, print_json};
use serde_json::json;
use vinotheca_store::{NewGrapeVariety, add_grape_variety, list_grape_varieties};

pub fn run(context: &Context, command: GrapeCommands) {
    match command {
        GrapeCommands::Add {
            name,
            id,
            color,
            description,
        } => {
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                add_grape_variety(
                    catalog,
                    NewGrapeVariety {
                        id,
                        name,
                        color,
                        description,
                    },
                )
            });
            if context.json {
                print_json(&json!({ "action": "grape.add", "grape": record }));
            } else {
                println!(
                    "vinotheca grape add\n  Added: {} ({})\n  Path: {}",
                    record.id,
                    record.name,
                    context.catalog_path.display()
                );
            }
        }

        GrapeCommands::List => {
            let catalog = load_catalog_or_exit(&context.catalog_path);
            let grapes = list_grape_varieties(&catalog);
            if context.json {
                print_json(&json!({ "action": "grape.list", "count": grapes.len(), "items": grapes }));
                return;
            }
            println!("vinotheca grape list\n  Count: {}", grapes.len());
            for grape in grapes {
                println!("  {}  {}  [{}]", grape.id, grape.name, opt_display(grape.color));
            }
        }
    }
}
