use crate::cli::RuleCommands;
use crate::support::{
    Context, exit_with, load_catalog_or_exit, mutate_or_exit, opt_display, or_exit, patch_field,
    print_json,
};
use serde_json::json;
use vinotheca_kernel::{GrapeRuleFields, GrapeRulePatch};
use vinotheca_store::{
    CreateGrapeRule, GrapeAppellationRecord, check_appellation_rules, create_grape_rule,
    delete_grape_rule, rules_for_appellation, rules_for_grape, update_grape_rule,
};

pub fn run(context: &Context, command: RuleCommands) {
    match command {
        RuleCommands::Add {
            appellation,
            grape,
            kind,
            min,
            max,
            id,
        } => {
            let request = CreateGrapeRule {
                id,
                appellation_id: appellation,
                grape_id: grape,
                fields: GrapeRuleFields::new(kind).with_range(min, max),
            };
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                create_grape_rule(catalog, request, context.policy)
            });
            print_record("add", &record, context);
        }

        RuleCommands::Update {
            id,
            kind,
            min,
            max,
            clear_min,
            clear_max,
        } => {
            let patch = GrapeRulePatch {
                kind,
                min_pct: patch_field(min, clear_min),
                max_pct: patch_field(max, clear_max),
            };
            if patch.is_empty() {
                exit_with("rule update needs at least one of --kind, --min, --max, --clear-min, --clear-max");
            }
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                update_grape_rule(catalog, &id, patch, context.policy)
            });
            print_record("update", &record, context);
        }

        RuleCommands::List { appellation, grape } => {
            let catalog = load_catalog_or_exit(&context.catalog_path);
            let rows = match (appellation.as_deref(), grape.as_deref()) {
                (Some(appellation_id), _) => rules_for_appellation(&catalog, appellation_id),
                (None, Some(grape_id)) => rules_for_grape(&catalog, grape_id),
                (None, None) => exit_with("rule list needs --appellation or --grape"),
            };
            if context.json {
                print_json(&json!({ "action": "rule.list", "count": rows.len(), "items": rows }));
                return;
            }
            println!("vinotheca rule list\n  Count: {}", rows.len());
            for row in rows {
                println!("  {}", summary_line(row));
            }
        }

        RuleCommands::Delete { id } => {
            let removed = mutate_or_exit(&context.catalog_path, |catalog| {
                delete_grape_rule(catalog, &id)
            });
            if context.json {
                print_json(&json!({ "action": "rule.delete", "id": removed.id }));
            } else {
                println!(
                    "vinotheca rule delete\n  Deleted: {}\n  Path: {}",
                    removed.id,
                    context.catalog_path.display()
                );
            }
        }

        RuleCommands::Check { appellation } => {
            let catalog = load_catalog_or_exit(&context.catalog_path);
            let report = or_exit(check_appellation_rules(&catalog, &appellation, context.policy));
            if context.json {
                print_json(&report);
            } else {
                println!(
                    "vinotheca rule check\n  Appellation: {appellation}\n  Policy: {}\n  Rules: {} ({} effective)\n  Result: {}",
                    report.policy,
                    report.summary.rule_count,
                    report.summary.effective_rule_count,
                    report.result
                );
                for finding in &report.errors {
                    println!("  - [{}] {}", finding.class, finding.message);
                }
            }
            if !report.accepted() {
                std::process::exit(1);
            }
        }
    }
}

fn summary_line(row: &GrapeAppellationRecord) -> String {
    format!(
        "{}  {}  grape {}  {}  min {}  max {}",
        row.id,
        row.appellation_id,
        row.grape_id,
        row.rule,
        opt_display(row.min_pct),
        opt_display(row.max_pct)
    )
}

fn print_record(action: &str, record: &GrapeAppellationRecord, context: &Context) {
    if context.json {
        print_json(&json!({ "action": format!("rule.{action}"), "rule": record }));
    } else {
        println!(
            "vinotheca rule {action}\n  {}\n  Path: {}",
            summary_line(record),
            context.catalog_path.display()
        );
    }
}
