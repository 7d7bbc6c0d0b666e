use std::path::Path;
use std::process;

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::db::Database;
use larder_core::export::{export_recipes, import_recipes};
use larder_core::models::{MealType, NewRecipe, parse_ingredient};
use larder_core::units::UnitRegistry;

use super::helpers::{format_ingredient, json_error, truncate};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_recipe_add(
    db: &Database,
    units: &UnitRegistry,
    name: &str,
    meal: &str,
    servings: i64,
    ingredients: &[String],
    prep_time: i64,
    cook_time: i64,
    cuisine: &str,
    tags: &[String],
    instructions: &str,
    json: bool,
) -> Result<()> {
    let meal_type = MealType::parse(meal)?;
    let parsed = ingredients
        .iter()
        .map(|line| parse_ingredient(line, units))
        .collect::<Result<Vec<_>>>()?;

    let recipe = db.insert_recipe(
        &NewRecipe {
            name: name.to_string(),
            meal_type,
            servings,
            ingredients: parsed,
            prep_time,
            cook_time,
            cuisine: cuisine.to_string(),
            instructions: instructions.to_string(),
            dietary_tags: tags.to_vec(),
        },
        units,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let count = recipe.ingredients.len();
        println!(
            "Added recipe: {} (id: {}, {meal_type}, serves {servings}, {count} ingredients)",
            recipe.name, recipe.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_recipe_list(
    db: &Database,
    meal: Option<&str>,
    tags: &[String],
    json: bool,
) -> Result<()> {
    let meal_type = meal.map(MealType::parse).transpose()?;
    let recipes = db.list_recipes(meal_type, tags)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("No recipes found. Add one with: larder recipe add");
        return Ok(());
    }

    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Serves")]
        servings: i64,
        #[tabled(rename = "Time (min)")]
        time: i64,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            name: truncate(&r.name, 35),
            meal: r.meal_type.to_string(),
            servings: r.servings,
            time: r.total_time(),
            tags: truncate(&r.dietary_tags.join(", "), 25),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_view(db: &Database, name: &str, json: bool) -> Result<()> {
    let Some(recipe) = db.get_recipe_by_name(name)? else {
        if json {
            println!("{}", json_error(&format!("Recipe '{name}' not found")));
        } else {
            eprintln!("Recipe '{name}' not found");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    println!("{} ({})", recipe.name, recipe.meal_type);
    println!(
        "Serves {} | prep {} min | cook {} min",
        recipe.servings, recipe.prep_time, recipe.cook_time
    );
    if !recipe.cuisine.is_empty() {
        println!("Cuisine: {}", recipe.cuisine);
    }
    if !recipe.dietary_tags.is_empty() {
        println!("Tags: {}", recipe.dietary_tags.join(", "));
    }
    println!("\nIngredients:");
    for ing in &recipe.ingredients {
        println!("  - {}", format_ingredient(ing));
    }
    if !recipe.instructions.is_empty() {
        println!("\nInstructions:\n{}", recipe.instructions);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(db: &Database, name: &str, json: bool) -> Result<()> {
    let Some(recipe) = db.get_recipe_by_name(name)? else {
        if json {
            println!("{}", json_error(&format!("Recipe '{name}' not found")));
        } else {
            eprintln!("Recipe '{name}' not found");
        }
        process::exit(2);
    };
    db.delete_recipe(recipe.id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": recipe.name }));
    } else {
        println!("Deleted recipe: {}", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_import(
    db: &Database,
    units: &UnitRegistry,
    path: &Path,
    json: bool,
) -> Result<()> {
    let outcome = import_recipes(db, units, path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Imported {} recipes ({} skipped, {} failed)",
            outcome.imported, outcome.skipped, outcome.failed
        );
        for err in &outcome.errors {
            eprintln!("  {err}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_recipe_export(db: &Database, path: &Path, json: bool) -> Result<()> {
    let recipes = db.list_recipes(None, &[])?;
    export_recipes(&recipes, path)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": recipes.len(), "path": path.display().to_string() })
        );
    } else {
        println!("Exported {} recipes to {}", recipes.len(), path.display());
    }
    Ok(())
}
