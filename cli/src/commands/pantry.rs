use std::process;

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::db::Database;
use larder_core::models::{NewPantryItem, format_quantity};
use larder_core::units::UnitRegistry;

use super::helpers::{json_error, truncate};

pub(crate) fn cmd_pantry_add(
    db: &Database,
    units: &UnitRegistry,
    name: &str,
    quantity: f64,
    unit: &str,
    json: bool,
) -> Result<()> {
    let item = db.add_pantry_item(
        &NewPantryItem {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        },
        units,
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!(
            "Pantry: {} now at {} {}",
            item.name,
            format_quantity(item.quantity),
            item.unit
        );
    }
    Ok(())
}

pub(crate) fn cmd_pantry_list(db: &Database, json: bool) -> Result<()> {
    let items = db.get_pantry_items()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Pantry is empty. Add stock with: larder pantry add");
        return Ok(());
    }

    #[derive(Tabled)]
    struct PantryRow {
        #[tabled(rename = "Item")]
        name: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Updated")]
        updated: String,
    }

    let rows: Vec<PantryRow> = items
        .iter()
        .map(|item| PantryRow {
            name: truncate(&item.name, 35),
            quantity: format!("{} {}", format_quantity(item.quantity), item.unit),
            updated: truncate(&item.updated_at, 19),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_pantry_update(
    db: &Database,
    units: &UnitRegistry,
    name: &str,
    quantity: f64,
    unit: &str,
    json: bool,
) -> Result<()> {
    db.set_pantry_quantity(name, quantity, unit, units)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "item": name, "quantity": quantity, "unit": unit })
        );
    } else if quantity == 0.0 {
        println!("Removed {name} ({unit}) from the pantry");
    } else {
        println!("Pantry: {name} set to {} {unit}", format_quantity(quantity));
    }
    Ok(())
}

pub(crate) fn cmd_pantry_remove(db: &Database, name: &str, json: bool) -> Result<()> {
    if db.remove_pantry_item(name)? {
        if json {
            println!("{}", serde_json::json!({ "removed": name }));
        } else {
            println!("Removed {name} from the pantry");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("'{name}' is not in the pantry")));
        } else {
            eprintln!("'{name}' is not in the pantry");
        }
        process::exit(2);
    }
}

pub(crate) fn cmd_pantry_deduct(
    db: &Database,
    units: &UnitRegistry,
    name: &str,
    quantity: f64,
    unit: &str,
    json: bool,
) -> Result<()> {
    let unmet = db.deduct_from_pantry(name, quantity, unit, units)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "item": name, "deducted": quantity - unmet, "unmet": unmet, "unit": unit })
        );
    } else if unmet > 0.0 {
        println!(
            "Deducted what was there; still short {} {unit} of {name}",
            format_quantity(unmet)
        );
    } else {
        println!("Deducted {} {unit} of {name}", format_quantity(quantity));
    }
    Ok(())
}

pub(crate) fn cmd_pantry_clear(db: &Database, json: bool) -> Result<()> {
    let removed = db.clear_pantry()?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Cleared {removed} pantry item(s)");
    }
    Ok(())
}
