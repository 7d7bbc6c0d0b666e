use std::path::Path;

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::db::Database;
use larder_core::export::{ExportFormat, write_grocery_list};
use larder_core::grocery::generate_grocery_list;
use larder_core::models::{GroceryItem, format_quantity};
use larder_core::units::UnitRegistry;

use super::helpers::truncate;
use super::require_plan;

fn build_list(
    db: &Database,
    units: &UnitRegistry,
    deduct: bool,
    json: bool,
) -> Result<Vec<GroceryItem>> {
    let loaded = require_plan(db, json)?;
    if loaded.skipped_meals > 0 && !json {
        eprintln!(
            "Note: {} planned meal(s) reference deleted recipes and were skipped",
            loaded.skipped_meals
        );
    }
    let pantry = db.get_pantry_items()?;
    Ok(generate_grocery_list(&loaded.plan, &pantry, deduct, units))
}

pub(crate) fn cmd_grocery_generate(
    db: &Database,
    units: &UnitRegistry,
    deduct: bool,
    json: bool,
) -> Result<()> {
    let items = build_list(db, units, deduct, json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Nothing to buy. The pantry covers the whole plan.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct GroceryRow {
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Item")]
        name: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
    }

    let rows: Vec<GroceryRow> = items
        .iter()
        .map(|item| GroceryRow {
            category: item.category.clone(),
            name: truncate(&item.name, 35),
            quantity: format!("{} {}", format_quantity(item.quantity), item.unit),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("{} item(s) to buy", items.len());
    Ok(())
}

pub(crate) fn cmd_grocery_export(
    db: &Database,
    units: &UnitRegistry,
    format: &str,
    output: &Path,
    deduct: bool,
    json: bool,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let items = build_list(db, units, deduct, json)?;
    write_grocery_list(&items, format, output)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": output.display().to_string(),
                "items": items.len(),
            })
        );
    } else {
        println!("Wrote {} item(s) to {}", items.len(), output.display());
    }
    Ok(())
}
