//! File output: grocery lists as text, Markdown, or JSON, and recipe
//! collections as JSON for backup and sharing.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::{
    GroceryItem, MealType, NewRecipe, Recipe, RecipeIngredient, format_quantity, validate_recipe,
};
use crate::units::UnitRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Markdown,
    Json,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            _ => bail!("Unknown format '{s}'. Must be one of: txt, md, json"),
        }
    }
}

#[derive(Serialize)]
struct GroceryListJson<'a> {
    items: Vec<GroceryLineJson<'a>>,
    total_items: usize,
}

#[derive(Serialize)]
struct GroceryLineJson<'a> {
    ingredient: &'a str,
    quantity: f64,
    unit: &'a str,
    category: &'a str,
}

fn group_by_category(items: &[GroceryItem]) -> Vec<(&str, Vec<&GroceryItem>)> {
    let mut sections: Vec<(&str, Vec<&GroceryItem>)> = Vec::new();
    for item in items {
        match sections.last_mut() {
            Some((category, rows)) if *category == item.category => rows.push(item),
            _ => sections.push((&item.category, vec![item])),
        }
    }
    sections
}

#[must_use]
pub fn render_grocery_txt(items: &[GroceryItem]) -> String {
    let mut out = String::from("GROCERY LIST\n============\n");
    for (category, rows) in group_by_category(items) {
        out.push_str(&format!("\n{category}\n"));
        out.push_str(&"-".repeat(category.len()));
        out.push('\n');
        for item in rows {
            out.push_str(&format!(
                "[ ] {} - {} {}\n",
                item.name,
                format_quantity(item.quantity),
                item.unit
            ));
        }
    }
    out.push_str(&format!("\nTotal items: {}\n", items.len()));
    out
}

#[must_use]
pub fn render_grocery_markdown(items: &[GroceryItem]) -> String {
    let mut out = String::from("# Grocery List\n");
    for (category, rows) in group_by_category(items) {
        out.push_str(&format!("\n## {category}\n\n"));
        for item in rows {
            out.push_str(&format!(
                "- [ ] {} - {} {}\n",
                item.name,
                format_quantity(item.quantity),
                item.unit
            ));
        }
    }
    out.push_str(&format!("\nTotal items: {}\n", items.len()));
    out
}

pub fn render_grocery_json(items: &[GroceryItem]) -> Result<String> {
    let doc = GroceryListJson {
        items: items
            .iter()
            .map(|item| GroceryLineJson {
                ingredient: &item.name,
                quantity: item.quantity,
                unit: &item.unit,
                category: &item.category,
            })
            .collect(),
        total_items: items.len(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn write_grocery_list(items: &[GroceryItem], format: ExportFormat, path: &Path) -> Result<()> {
    let content = match format {
        ExportFormat::Txt => render_grocery_txt(items),
        ExportFormat::Markdown => render_grocery_markdown(items),
        ExportFormat::Json => render_grocery_json(items)?,
    };
    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ----- recipe collections -----

#[derive(Serialize, Deserialize)]
struct RecipeFile {
    recipes: Vec<RecipeRecord>,
}

#[derive(Serialize, Deserialize)]
struct RecipeRecord {
    name: String,
    meal_type: String,
    #[serde(default)]
    prep_time: i64,
    #[serde(default)]
    cook_time: i64,
    servings: i64,
    #[serde(default)]
    cuisine: String,
    #[serde(default)]
    dietary_tags: Vec<String>,
    ingredients: Vec<IngredientRecord>,
    #[serde(default)]
    instructions: String,
}

#[derive(Serialize, Deserialize)]
struct IngredientRecord {
    item: String,
    quantity: f64,
    unit: String,
    #[serde(default)]
    preparation: String,
}

impl RecipeRecord {
    fn from_recipe(recipe: &Recipe) -> Self {
        RecipeRecord {
            name: recipe.name.clone(),
            meal_type: recipe.meal_type.to_string(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            cuisine: recipe.cuisine.clone(),
            dietary_tags: recipe.dietary_tags.clone(),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|ing| IngredientRecord {
                    item: ing.name.clone(),
                    quantity: ing.quantity,
                    unit: ing.unit.clone(),
                    preparation: ing.preparation.clone(),
                })
                .collect(),
            instructions: recipe.instructions.clone(),
        }
    }

    fn into_new_recipe(self) -> Result<NewRecipe> {
        let recipe = NewRecipe {
            name: self.name,
            meal_type: MealType::parse(&self.meal_type)?,
            servings: self.servings,
            ingredients: self
                .ingredients
                .into_iter()
                .map(|ing| RecipeIngredient {
                    name: ing.item,
                    quantity: ing.quantity,
                    unit: ing.unit,
                    preparation: ing.preparation,
                })
                .collect(),
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            cuisine: self.cuisine,
            instructions: self.instructions,
            dietary_tags: self.dietary_tags,
        };
        validate_recipe(&recipe)?;
        Ok(recipe)
    }
}

pub fn export_recipes(recipes: &[Recipe], path: &Path) -> Result<()> {
    let doc = RecipeFile {
        recipes: recipes.iter().map(RecipeRecord::from_recipe).collect(),
    };
    let content = serde_json::to_string_pretty(&doc)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Import recipes from a JSON file. Recipes whose name already exists
/// (case-insensitively) are skipped; invalid records are reported without
/// aborting the rest of the file.
pub fn import_recipes(db: &Database, units: &UnitRegistry, path: &Path) -> Result<ImportOutcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: RecipeFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid recipe file: {}", path.display()))?;

    let mut outcome = ImportOutcome::default();
    for record in file.recipes {
        let name = record.name.clone();
        if db.get_recipe_by_name(&name)?.is_some() {
            outcome.skipped += 1;
            continue;
        }
        match record.into_new_recipe().and_then(|r| db.insert_recipe(&r, units)) {
            Ok(_) => outcome.imported += 1,
            Err(e) => {
                outcome.failed += 1;
                outcome.errors.push(format!("{name}: {e}"));
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<GroceryItem> {
        vec![
            GroceryItem {
                name: "Apple".to_string(),
                quantity: 3.0,
                unit: "whole".to_string(),
                category: "Produce".to_string(),
            },
            GroceryItem {
                name: "spinach".to_string(),
                quantity: 1.0,
                unit: "bunch".to_string(),
                category: "Produce".to_string(),
            },
            GroceryItem {
                name: "flour".to_string(),
                quantity: 1.5,
                unit: "cup".to_string(),
                category: "Pantry".to_string(),
            },
        ]
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_render_txt() {
        let out = render_grocery_txt(&items());
        assert!(out.contains("GROCERY LIST"));
        assert!(out.contains("Produce\n-------\n"));
        assert!(out.contains("[ ] Apple - 3 whole"));
        assert!(out.contains("[ ] flour - 1 1/2 cup"));
        assert!(out.contains("Total items: 3"));
        // One section per category, not per item.
        assert_eq!(out.matches("Produce").count(), 1);
    }

    #[test]
    fn test_render_markdown() {
        let out = render_grocery_markdown(&items());
        assert!(out.starts_with("# Grocery List"));
        assert!(out.contains("## Produce"));
        assert!(out.contains("- [ ] spinach - 1 bunch"));
        assert!(out.contains("## Pantry"));
    }

    #[test]
    fn test_render_json() {
        let out = render_grocery_json(&items()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total_items"], 3);
        assert_eq!(parsed["items"][0]["ingredient"], "Apple");
        assert_eq!(parsed["items"][2]["category"], "Pantry");
    }

    #[test]
    fn test_write_grocery_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.md");
        write_grocery_list(&items(), ExportFormat::Markdown, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Grocery List"));
    }

    fn sample_recipe_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("recipes.json");
        let content = r#"{
            "recipes": [
                {
                    "name": "Pancakes",
                    "meal_type": "breakfast",
                    "servings": 4,
                    "ingredients": [
                        {"item": "flour", "quantity": 2.0, "unit": "cup"},
                        {"item": "eggs", "quantity": 2.0, "unit": "whole", "preparation": "beaten"}
                    ]
                },
                {
                    "name": "Broken",
                    "meal_type": "dinner",
                    "servings": 0,
                    "ingredients": [
                        {"item": "salt", "quantity": 1.0, "unit": "pinch"}
                    ]
                }
            ]
        }"#;
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let units = UnitRegistry::default();
        let path = sample_recipe_file(dir.path());

        let outcome = import_recipes(&db, &units, &path).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Broken:"));

        let recipe = db.get_recipe_by_name("Pancakes").unwrap().unwrap();
        assert_eq!(recipe.meal_type, MealType::Breakfast);
        assert_eq!(recipe.ingredients[1].preparation, "beaten");

        // Re-import skips the existing recipe.
        let again = import_recipes(&db, &units, &path).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 1);
        assert_eq!(again.failed, 1);
    }

    #[test]
    fn test_export_then_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = Database::open_in_memory().unwrap();
        let units = UnitRegistry::default();
        let recipe = source
            .insert_recipe(
                &crate::models::NewRecipe {
                    name: "Tacos".to_string(),
                    meal_type: MealType::Dinner,
                    servings: 4,
                    ingredients: vec![RecipeIngredient {
                        name: "ground beef".to_string(),
                        quantity: 1.0,
                        unit: "lb".to_string(),
                        preparation: String::new(),
                    }],
                    prep_time: 10,
                    cook_time: 15,
                    cuisine: "Mexican".to_string(),
                    instructions: "Brown the beef.".to_string(),
                    dietary_tags: vec!["gluten-free".to_string()],
                },
                &units,
            )
            .unwrap();

        let path = dir.path().join("backup.json");
        export_recipes(&[recipe], &path).unwrap();

        let target = Database::open_in_memory().unwrap();
        let outcome = import_recipes(&target, &units, &path).unwrap();
        assert_eq!(outcome.imported, 1);
        let restored = target.get_recipe_by_name("Tacos").unwrap().unwrap();
        assert_eq!(restored.cuisine, "Mexican");
        assert_eq!(restored.dietary_tags, vec!["gluten-free"]);
    }

    #[test]
    fn test_import_missing_file() {
        let db = Database::open_in_memory().unwrap();
        let units = UnitRegistry::default();
        assert!(import_recipes(&db, &units, Path::new("/nonexistent/r.json")).is_err());
    }
}
