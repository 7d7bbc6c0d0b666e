mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    cmd_grocery_export, cmd_grocery_generate, cmd_pantry_add, cmd_pantry_clear, cmd_pantry_deduct,
    cmd_pantry_list, cmd_pantry_remove, cmd_pantry_update, cmd_plan_clear, cmd_plan_generate,
    cmd_plan_set_servings, cmd_plan_swap, cmd_plan_view, cmd_recipe_add, cmd_recipe_delete,
    cmd_recipe_export, cmd_recipe_import, cmd_recipe_list, cmd_recipe_view,
};
use crate::config::Config;
use larder_core::db::Database;
use larder_core::units::UnitRegistry;

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "A simple meal planner and grocery list CLI",
    long_about = "\n\n  ██╗      █████╗ ██████╗ ██████╗ ███████╗██████╗
  ██║     ██╔══██╗██╔══██╗██╔══██╗██╔════╝██╔══██╗
  ██║     ███████║██████╔╝██║  ██║█████╗  ██████╔╝
  ██║     ██╔══██║██╔══██╗██║  ██║██╔══╝  ██╔══██╗
  ███████╗██║  ██║██║  ██║██████╔╝███████╗██║  ██║
  ╚══════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝  ╚═╝
        plan meals, shop once.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Generate and adjust the meal plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Build grocery lists from the current plan
    Grocery {
        #[command(subcommand)]
        command: GroceryCommands,
    },
    /// Track what's already on hand
    Pantry {
        #[command(subcommand)]
        command: PantryCommands,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Add a recipe
    Add {
        /// Recipe name
        name: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long)]
        meal: String,
        /// Number of servings the recipe makes
        #[arg(short, long, default_value = "4")]
        servings: i64,
        /// Ingredient line, repeatable (e.g. -i "2 cups flour, sifted" -i "3 eggs")
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
        /// Prep time in minutes
        #[arg(long, default_value = "0")]
        prep_time: i64,
        /// Cook time in minutes
        #[arg(long, default_value = "0")]
        cook_time: i64,
        /// Cuisine label (e.g. "Mexican")
        #[arg(long, default_value = "")]
        cuisine: String,
        /// Dietary tag, repeatable (e.g. --tag vegetarian --tag gluten-free)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Cooking instructions
        #[arg(long, default_value = "")]
        instructions: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes
    List {
        /// Only this meal type
        #[arg(short, long)]
        meal: Option<String>,
        /// Only recipes with this dietary tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe in full
    View {
        /// Recipe name (case-insensitive)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe by name
    Delete {
        /// Recipe name (case-insensitive)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import recipes from a JSON file
    Import {
        /// Path to the recipe file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all recipes to a JSON file
    Export {
        /// Destination path
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Generate a new plan, replacing the current one
    Generate {
        /// Number of days (1-14)
        #[arg(short, long, default_value = "7")]
        days: i64,
        /// Meal types to plan, comma-separated (e.g. "breakfast,dinner")
        #[arg(short, long, default_value = "dinner")]
        meals: String,
        /// Servings per meal
        #[arg(short, long, default_value = "2")]
        servings: i64,
        /// Only draw from recipes with this dietary tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current plan
    View {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace one planned meal with a different recipe
    Swap {
        /// Day number (1-based)
        #[arg(short, long)]
        day: i64,
        /// Meal type of the slot
        #[arg(short, long)]
        meal: String,
        /// Replacement recipe name
        #[arg(short, long)]
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change servings for one planned meal
    SetServings {
        /// Day number (1-based)
        #[arg(short, long)]
        day: i64,
        /// Meal type of the slot
        #[arg(short, long)]
        meal: String,
        /// New serving count
        #[arg(short, long)]
        servings: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard the current plan
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GroceryCommands {
    /// Print the grocery list for the current plan
    Generate {
        /// Skip pantry deduction and list everything
        #[arg(long)]
        no_deduct: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the grocery list to a file
    Export {
        /// Output format: txt, md, json
        #[arg(short, long, default_value = "txt")]
        format: String,
        /// Destination path
        #[arg(short, long)]
        output: PathBuf,
        /// Skip pantry deduction and list everything
        #[arg(long)]
        no_deduct: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PantryCommands {
    /// Add stock (merges with existing stock in the same unit)
    Add {
        /// Ingredient name
        name: String,
        /// Quantity on hand
        quantity: f64,
        /// Unit (e.g. cup, lb, whole)
        #[arg(short, long, default_value = "whole")]
        unit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List pantry stock
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Overwrite stock for an ingredient and unit (0 removes it)
    Update {
        /// Ingredient name
        name: String,
        /// New quantity
        quantity: f64,
        /// Unit of the stock row
        #[arg(short, long, default_value = "whole")]
        unit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an ingredient entirely, across units
    Remove {
        /// Ingredient name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Consume stock, e.g. after cooking ("larder pantry deduct flour 0.5 -u cup")
    Deduct {
        /// Ingredient name
        name: String,
        /// Quantity used
        quantity: f64,
        /// Unit of the quantity
        #[arg(short, long, default_value = "whole")]
        unit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove everything from the pantry
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;
    let units = UnitRegistry::default();

    match cli.command {
        Commands::Recipe { command } => match command {
            RecipeCommands::Add {
                name,
                meal,
                servings,
                ingredients,
                prep_time,
                cook_time,
                cuisine,
                tags,
                instructions,
                json,
            } => cmd_recipe_add(
                &db,
                &units,
                &name,
                &meal,
                servings,
                &ingredients,
                prep_time,
                cook_time,
                &cuisine,
                &tags,
                &instructions,
                json,
            ),
            RecipeCommands::List { meal, tags, json } => {
                cmd_recipe_list(&db, meal.as_deref(), &tags, json)
            }
            RecipeCommands::View { name, json } => cmd_recipe_view(&db, &name, json),
            RecipeCommands::Delete { name, json } => cmd_recipe_delete(&db, &name, json),
            RecipeCommands::Import { path, json } => cmd_recipe_import(&db, &units, &path, json),
            RecipeCommands::Export { path, json } => cmd_recipe_export(&db, &path, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Generate {
                days,
                meals,
                servings,
                tags,
                json,
            } => cmd_plan_generate(&db, days, &meals, servings, &tags, json),
            PlanCommands::View { json } => cmd_plan_view(&db, json),
            PlanCommands::Swap {
                day,
                meal,
                recipe,
                json,
            } => cmd_plan_swap(&db, day, &meal, &recipe, json),
            PlanCommands::SetServings {
                day,
                meal,
                servings,
                json,
            } => cmd_plan_set_servings(&db, day, &meal, servings, json),
            PlanCommands::Clear { json } => cmd_plan_clear(&db, json),
        },
        Commands::Grocery { command } => match command {
            GroceryCommands::Generate { no_deduct, json } => {
                cmd_grocery_generate(&db, &units, !no_deduct, json)
            }
            GroceryCommands::Export {
                format,
                output,
                no_deduct,
                json,
            } => cmd_grocery_export(&db, &units, &format, &output, !no_deduct, json),
        },
        Commands::Pantry { command } => match command {
            PantryCommands::Add {
                name,
                quantity,
                unit,
                json,
            } => cmd_pantry_add(&db, &units, &name, quantity, &unit, json),
            PantryCommands::List { json } => cmd_pantry_list(&db, json),
            PantryCommands::Update {
                name,
                quantity,
                unit,
                json,
            } => cmd_pantry_update(&db, &units, &name, quantity, &unit, json),
            PantryCommands::Remove { name, json } => cmd_pantry_remove(&db, &name, json),
            PantryCommands::Deduct {
                name,
                quantity,
                unit,
                json,
            } => cmd_pantry_deduct(&db, &units, &name, quantity, &unit, json),
            PantryCommands::Clear { json } => cmd_pantry_clear(&db, json),
        },
    }
}
