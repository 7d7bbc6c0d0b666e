use std::process;

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::db::Database;
use larder_core::models::{MealPlan, MealType};
use larder_core::plan::generate_plan;

use super::helpers::{json_error, parse_meal_types, truncate};
use super::require_plan;

pub(crate) fn cmd_plan_generate(
    db: &Database,
    days: i64,
    meals: &str,
    servings: i64,
    tags: &[String],
    json: bool,
) -> Result<()> {
    let meal_types = parse_meal_types(meals)?;
    let recipes = db.list_recipes(None, tags)?;
    let mut rng = rand::rng();
    let plan = generate_plan(&recipes, days, &meal_types, servings, &mut rng)?;
    db.save_plan(&plan)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Generated a {days}-day plan ({} meals):\n", plan.meals.len());
        print_plan_table(&plan);
    }
    Ok(())
}

pub(crate) fn cmd_plan_view(db: &Database, json: bool) -> Result<()> {
    let loaded = require_plan(db, json)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.plan)?);
        return Ok(());
    }
    print_plan_table(&loaded.plan);
    if loaded.skipped_meals > 0 {
        eprintln!(
            "Note: {} planned meal(s) reference deleted recipes and were skipped",
            loaded.skipped_meals
        );
    }
    Ok(())
}

fn print_plan_table(plan: &MealPlan) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Recipe")]
        recipe: String,
        #[tabled(rename = "Servings")]
        servings: i64,
    }

    let rows: Vec<MealRow> = plan
        .meals
        .iter()
        .map(|m| MealRow {
            day: m.day_name(),
            meal: m.meal_type.to_string(),
            recipe: truncate(&m.recipe.name, 35),
            servings: m.servings,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_plan_swap(
    db: &Database,
    day: i64,
    meal: &str,
    recipe_name: &str,
    json: bool,
) -> Result<()> {
    let meal_type = MealType::parse(meal)?;
    let Some(recipe) = db.get_recipe_by_name(recipe_name)? else {
        if json {
            println!("{}", json_error(&format!("Recipe '{recipe_name}' not found")));
        } else {
            eprintln!("Recipe '{recipe_name}' not found");
        }
        process::exit(2);
    };
    db.swap_meal(day, meal_type, recipe.id)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "day": day, "meal": meal_type.as_str(), "recipe": recipe.name })
        );
    } else {
        println!("Day {day} {meal_type} is now: {}", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_plan_set_servings(
    db: &Database,
    day: i64,
    meal: &str,
    servings: i64,
    json: bool,
) -> Result<()> {
    let meal_type = MealType::parse(meal)?;
    db.set_meal_servings(day, meal_type, servings)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "day": day, "meal": meal_type.as_str(), "servings": servings })
        );
    } else {
        println!("Day {day} {meal_type} set to {servings} servings");
    }
    Ok(())
}

pub(crate) fn cmd_plan_clear(db: &Database, json: bool) -> Result<()> {
    let cleared = db.clear_plan()?;
    if json {
        println!("{}", serde_json::json!({ "cleared": cleared }));
    } else if cleared {
        println!("Cleared the meal plan");
    } else {
        println!("No meal plan to clear");
    }
    Ok(())
}
