use crate::cli::CompositionCommands;
use crate::support::{
    Context, load_catalog_or_exit, mutate_or_exit, opt_display, patch_field, print_json,
};
use serde_json::json;
use vinotheca_kernel::{DefinitionGrapeFields, DefinitionGrapePatch};
use vinotheca_store::{
    CreateDefinitionGrape, DefinitionGrapeRecord, add_definition_grape, delete_definition_grape,
    grapes_for_definition, update_definition_grape,
};

pub fn run(context: &Context, command: CompositionCommands) {
    match command {
        CompositionCommands::Add {
            definition,
            grape,
            min,
            max,
            required,
            id,
        } => {
            let request = CreateDefinitionGrape {
                id,
                wine_definition_id: definition,
                grape_id: grape,
                fields: DefinitionGrapeFields {
                    min_pct: min,
                    max_pct: max,
                    required,
                },
            };
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                add_definition_grape(catalog, request)
            });
            print_record("add", &record, context);
        }

        CompositionCommands::Update {
            id,
            min,
            max,
            clear_min,
            clear_max,
            required,
        } => {
            let patch = DefinitionGrapePatch {
                min_pct: patch_field(min, clear_min),
                max_pct: patch_field(max, clear_max),
                required,
            };
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                update_definition_grape(catalog, &id, patch)
            });
            print_record("update", &record, context);
        }

        CompositionCommands::List { definition } => {
            let catalog = load_catalog_or_exit(&context.catalog_path);
            let rows = grapes_for_definition(&catalog, &definition);
            if context.json {
                print_json(&json!({
                    "action": "composition.list",
                    "definitionId": definition,
                    "count": rows.len(),
                    "items": rows
                }));
                return;
            }
            println!(
                "vinotheca composition list\n  Definition: {definition}\n  Count: {}",
                rows.len()
            );
            for row in rows {
                println!("  {}", summary_line(row));
            }
        }

        CompositionCommands::Delete { id } => {
            let removed = mutate_or_exit(&context.catalog_path, |catalog| {
                delete_definition_grape(catalog, &id)
            });
            if context.json {
                print_json(&json!({ "action": "composition.delete", "id": removed.id }));
            } else {
                println!(
                    "vinotheca composition delete\n  Deleted: {}\n  Path: {}",
                    removed.id,
                    context.catalog_path.display()
                );
            }
        }
    }
}

fn summary_line(row: &DefinitionGrapeRecord) -> String {
    format!(
        "{}  grape {}  min {}  max {}  required {}",
        row.id,
        row.grape_id,
        opt_display(row.min_pct),
        opt_display(row.max_pct),
        row.required
    )
}

fn print_record(action: &str, record: &DefinitionGrapeRecord, context: &Context) {
    if context.json {
        print_json(&json!({ "action": format!("composition.{action}"), "row": record }));
    } else {
        println!(
            "vinotheca composition {action}\n  {}\n  Definition: {}\n  Path: {}",
            summary_line(record),
            record.wine_definition_id,
            context.catalog_path.display()
        );
    }
}
