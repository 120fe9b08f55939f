use crate::cli::PlaceCommands;
use crate::support::{Context, exit_with, load_catalog_or_exit, mutate_or_exit, opt_display, print_json};
use serde_json::json;
use vinotheca_store::{
    NewAppellation, NewCountry, NewRegion, add_appellation, add_country, add_region,
    list_appellations, list_countries, list_regions,
};

const LEVELS: [&str; 3] = ["country", "region", "appellation"];

pub fn run(context: &Context, command: PlaceCommands) {
    match command {
        PlaceCommands::AddCountry { name, id, code } => {
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                add_country(catalog, NewCountry { id, name, code })
            });
            if context.json {
                print_json(&json!({ "action": "place.add_country", "country": record }));
            } else {
                println!(
                    "vinotheca place add-country\n  Added: {} ({})\n  Code: {}\n  Path: {}",
                    record.id,
                    record.name,
                    opt_display(record.code.as_deref()),
                    context.catalog_path.display()
                );
            }
        }

        PlaceCommands::AddRegion { name, country, id } => {
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                add_region(
                    catalog,
                    NewRegion {
                        id,
                        name,
                        country_id: country,
                    },
                )
            });
            if context.json {
                print_json(&json!({ "action": "place.add_region", "region": record }));
            } else {
                println!(
                    "vinotheca place add-region\n  Added: {} ({})\n  Country: {}\n  Path: {}",
                    record.id,
                    record.name,
                    record.country_id,
                    context.catalog_path.display()
                );
            }
        }

        PlaceCommands::AddAppellation { name, region, id } => {
            let record = mutate_or_exit(&context.catalog_path, |catalog| {
                add_appellation(
                    catalog,
                    NewAppellation {
                        id,
                        name,
                        region_id: region,
                    },
                )
            });
            if context.json {
                print_json(&json!({ "action": "place.add_appellation", "appellation": record }));
            } else {
                println!(
                    "vinotheca place add-appellation\n  Added: {} ({})\n  Region: {}\n  Path: {}",
                    record.id,
                    record.name,
                    record.region_id,
                    context.catalog_path.display()
                );
            }
        }

        PlaceCommands::List { level } => run_list(context, level),
    }
}

fn run_list(context: &Context, level: Option<String>) {
    if let Some(level) = level.as_deref()
        && !LEVELS.contains(&level)
    {
        exit_with(format!(
            "unknown place level `{level}`; expected one of {}",
            LEVELS.join(", ")
        ));
    }
    let wants = |candidate: &str| level.as_deref().is_none_or(|l| l == candidate);

    let catalog = load_catalog_or_exit(&context.catalog_path);
    let countries = if wants("country") { list_countries(&catalog) } else { Vec::new() };
    let regions = if wants("region") { list_regions(&catalog) } else { Vec::new() };
    let appellations = if wants("appellation") {
        list_appellations(&catalog)
    } else {
        Vec::new()
    };

    if context.json {
        print_json(&json!({
            "action": "place.list",
            "countries": countries,
            "regions": regions,
            "appellations": appellations
        }));
        return;
    }

    println!("vinotheca place list");
    for country in &countries {
        println!("  country     {}  {}", country.id, country.name);
    }
    for region in &regions {
        println!("  region      {}  {}  (country {})", region.id, region.name, region.country_id);
    }
    for appellation in &appellations {
        println!(
            "  appellation {}  {}  (region {})",
            appellation.id, appellation.name, appellation.region_id
        );
    }
    if countries.is_empty() && regions.is_empty() && appellations.is_empty() {
        println!("  (none)");
    }
}
