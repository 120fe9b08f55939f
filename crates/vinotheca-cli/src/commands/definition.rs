use crate::cli::DefinitionCommands;
use crate::support::{
    Context, load_catalog_or_exit, mutate_or_exit, opt_display, or_exit, patch_field, print_json,
};
use serde_json::{Value, json};
use vinotheca_kernel::OwnershipPatch;
use vinotheca_store::{
    CreateWineDefinition, UpdateWineDefinition, WineDefinitionView, check_wine_definition,
    create_wine_definition, delete_wine_definition, get_wine_definition, grapes_for_definition,
    list_wine_definitions, update_wine_definition,
};

pub fn run(context: &Context, command: DefinitionCommands) {
    match command {
        DefinitionCommands::Add {
            name,
            id,
            owner,
            description,
            version,
            rule_json,
        } => run_add(
            context,
            CreateWineDefinition {
                id,
                name,
                ownership: owner.into_fields(),
                description,
                version,
                rule_json,
            },
        ),

        DefinitionCommands::Update {
            id,
            name,
            owner,
            clear_country,
            clear_region,
            clear_appellation,
            description,
            clear_description,
            version,
            rule_json,
            clear_rule_json,
        } => {
            let request = UpdateWineDefinition {
                name,
                ownership: OwnershipPatch {
                    country_id: patch_field(owner.country, clear_country),
                    region_id: patch_field(owner.region, clear_region),
                    appellation_id: patch_field(owner.appellation, clear_appellation),
                },
                description: patch_field(description, clear_description),
                version,
                rule_json: patch_field(rule_json, clear_rule_json),
            };
            run_update(context, &id, request);
        }

        DefinitionCommands::Show { id } => run_show(context, &id),
        DefinitionCommands::List => run_list(context),
        DefinitionCommands::Delete { id } => run_delete(context, &id),
        DefinitionCommands::Check { id } => run_check(context, &id),
    }
}

fn print_view(heading: &str, view: &WineDefinitionView, context: &Context) {
    println!(
        "vinotheca definition {heading}\n  ID: {}\n  Name: {}\n  Owner: {}\n  Country: {}\n  Region: {}\n  Appellation: {}\n  Version: {}\n  Path: {}",
        view.id,
        view.name,
        view.scope,
        opt_display(view.country_id.as_deref()),
        opt_display(view.region_id.as_deref()),
        opt_display(view.appellation_id.as_deref()),
        view.version,
        context.catalog_path.display()
    );
}

fn run_add(context: &Context, request: CreateWineDefinition) {
    let view = mutate_or_exit(&context.catalog_path, |catalog| {
        create_wine_definition(catalog, request)
    });
    if context.json {
        print_json(&json!({ "action": "definition.add", "definition": view }));
    } else {
        print_view("add", &view, context);
    }
}

fn run_update(context: &Context, id: &str, request: UpdateWineDefinition) {
    let view = mutate_or_exit(&context.catalog_path, |catalog| {
        update_wine_definition(catalog, id, request)
    });
    if context.json {
        print_json(&json!({ "action": "definition.update", "definition": view }));
    } else {
        print_view("update", &view, context);
    }
}

fn run_show(context: &Context, id: &str) {
    let catalog = load_catalog_or_exit(&context.catalog_path);
    let view = or_exit(get_wine_definition(&catalog, id));
    let grapes = grapes_for_definition(&catalog, id);
    if context.json {
        print_json(&json!({ "action": "definition.show", "definition": view, "grapes": grapes }));
        return;
    }
    print_view("show", &view, context);
    if let Some(description) = &view.description {
        println!("  Description: {description}");
    }
    if let Some(rule_json) = &view.rule_json {
        println!("  Rule JSON: {rule_json}");
    }
    println!("  Grapes: {}", grapes.len());
    for row in grapes {
        println!(
            "    {}  grape {}  min {}  max {}{}",
            row.id,
            row.grape_id,
            opt_display(row.min_pct),
            opt_display(row.max_pct),
            if row.required { "  required" } else { "" }
        );
    }
}

fn run_list(context: &Context) {
    let catalog = load_catalog_or_exit(&context.catalog_path);
    let views = list_wine_definitions(&catalog);
    if context.json {
        let items: Vec<Value> = views
            .iter()
            .map(|view| {
                json!({
                    "id": view.id,
                    "name": view.name,
                    "scope": view.scope,
                    "version": view.version
                })
            })
            .collect();
        print_json(&json!({ "action": "definition.list", "count": items.len(), "items": items }));
        return;
    }
    println!("vinotheca definition list\n  Count: {}", views.len());
    for view in views {
        println!("  {}  {}  [{}]  v{}", view.id, view.name, view.scope, view.version);
    }
}

fn run_delete(context: &Context, id: &str) {
    let removed = mutate_or_exit(&context.catalog_path, |catalog| {
        delete_wine_definition(catalog, id)
    });
    if context.json {
        print_json(&json!({ "action": "definition.delete", "id": removed.id }));
    } else {
        println!(
            "vinotheca definition delete\n  Deleted: {}\n  Path: {}",
            removed.id,
            context.catalog_path.display()
        );
    }
}

fn run_check(context: &Context, id: &str) {
    let catalog = load_catalog_or_exit(&context.catalog_path);
    let report = or_exit(check_wine_definition(&catalog, id, context.policy));

    if context.json {
        print_json(&report);
    } else {
        println!(
            "vinotheca definition check\n  Definition: {}\n  Owner: {}\n  Policy: {}\n  Result: {}",
            report.definition_id, report.scope, context.policy, report.result
        );
        for finding in &report.errors {
            println!("  - [{}] {}", finding.class, finding.message);
        }
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}
