use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::grocery::COVERAGE_EPSILON;
use crate::models::{
    MealPlan, MealType, NewPantryItem, NewRecipe, PantryItem, PlannedMeal, Recipe,
    RecipeIngredient, normalize_name, validate_recipe,
};
use crate::units::UnitRegistry;

/// A stored plan reloaded from disk. Meals whose recipe has since been
/// deleted are dropped and counted instead of failing the whole load.
pub struct LoadedPlan {
    pub plan: MealPlan,
    pub skipped_meals: usize,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    servings INTEGER NOT NULL,
                    prep_time INTEGER NOT NULL DEFAULT 0,
                    cook_time INTEGER NOT NULL DEFAULT 0,
                    cuisine TEXT NOT NULL DEFAULT '',
                    instructions TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    category TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    ingredient_id INTEGER NOT NULL REFERENCES ingredients(id),
                    name TEXT NOT NULL,
                    quantity REAL NOT NULL,
                    unit TEXT NOT NULL,
                    preparation TEXT NOT NULL DEFAULT ''
                );

                CREATE TABLE IF NOT EXISTS dietary_tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    tag TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS pantry (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ingredient_id INTEGER NOT NULL REFERENCES ingredients(id),
                    quantity REAL NOT NULL,
                    unit TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(ingredient_id, unit)
                );

                CREATE TABLE IF NOT EXISTS current_meal_plan (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    day_number INTEGER NOT NULL CHECK (day_number BETWEEN 1 AND 14),
                    meal_type TEXT NOT NULL,
                    recipe_id INTEGER NOT NULL,
                    servings INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE(day_number, meal_type)
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_name ON recipes(name);
                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe
                    ON recipe_ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_dietary_tags_recipe ON dietary_tags(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_pantry_ingredient ON pantry(ingredient_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Look up or create the normalized ingredient row, tagging new ones
    /// with their store category.
    fn ensure_ingredient(&self, name: &str, units: &UnitRegistry) -> Result<i64> {
        let normalized = normalize_name(name);
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM ingredients WHERE name = ?1")?;
        let mut rows = stmt.query(params![normalized])?;
        if let Some(row) = rows.next()? {
            return Ok(row.get(0)?);
        }
        let category = units.category_of(&normalized);
        self.conn.execute(
            "INSERT INTO ingredients (name, category) VALUES (?1, ?2)",
            params![normalized, category],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ----- recipes -----

    pub fn insert_recipe(&self, recipe: &NewRecipe, units: &UnitRegistry) -> Result<Recipe> {
        validate_recipe(recipe)?;
        if self.get_recipe_by_name(&recipe.name)?.is_some() {
            bail!("Recipe '{}' already exists", recipe.name);
        }
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO recipes (name, meal_type, servings, prep_time, cook_time, cuisine, instructions, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                recipe.name,
                recipe.meal_type.as_str(),
                recipe.servings,
                recipe.prep_time,
                recipe.cook_time,
                recipe.cuisine,
                recipe.instructions,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.write_recipe_children(id, recipe, units)?;
        tx.commit()?;
        self.get_recipe(id)?
            .context("Recipe vanished after insert")
    }

    fn write_recipe_children(&self, id: i64, recipe: &NewRecipe, units: &UnitRegistry) -> Result<()> {
        for ing in &recipe.ingredients {
            let ingredient_id = self.ensure_ingredient(&ing.name, units)?;
            self.conn.execute(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, name, quantity, unit, preparation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    ingredient_id,
                    ing.name.trim(),
                    ing.quantity,
                    ing.unit,
                    ing.preparation,
                ],
            )?;
        }
        for tag in &recipe.dietary_tags {
            self.conn.execute(
                "INSERT INTO dietary_tags (recipe_id, tag) VALUES (?1, ?2)",
                params![id, tag.trim().to_lowercase()],
            )?;
        }
        Ok(())
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, meal_type, servings, prep_time, cook_time, cuisine, instructions, created_at, updated_at
             FROM recipes WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let recipe = self.recipe_from_base_row(row)?;
        Ok(Some(recipe))
    }

    /// Case-insensitive name lookup.
    pub fn get_recipe_by_name(&self, name: &str) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, meal_type, servings, prep_time, cook_time, cuisine, instructions, created_at, updated_at
             FROM recipes WHERE LOWER(name) = LOWER(?1)",
        )?;
        let mut rows = stmt.query(params![name.trim()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let recipe = self.recipe_from_base_row(row)?;
        Ok(Some(recipe))
    }

    fn recipe_from_base_row(&self, row: &rusqlite::Row) -> Result<Recipe> {
        let id: i64 = row.get(0)?;
        let meal_type: String = row.get(2)?;
        Ok(Recipe {
            id,
            name: row.get(1)?,
            meal_type: MealType::parse(&meal_type)?,
            servings: row.get(3)?,
            ingredients: self.get_recipe_ingredients(id)?,
            prep_time: row.get(4)?,
            cook_time: row.get(5)?,
            cuisine: row.get(6)?,
            instructions: row.get(7)?,
            dietary_tags: self.get_dietary_tags(id)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn get_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, quantity, unit, preparation FROM recipe_ingredients
             WHERE recipe_id = ?1 ORDER BY id",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                Ok(RecipeIngredient {
                    name: row.get(0)?,
                    quantity: row.get(1)?,
                    unit: row.get(2)?,
                    preparation: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    fn get_dietary_tags(&self, recipe_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM dietary_tags WHERE recipe_id = ?1 ORDER BY tag")?;
        let tags = stmt
            .query_map(params![recipe_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// List recipes, optionally restricted to one meal type and to recipes
    /// carrying every given dietary tag.
    pub fn list_recipes(&self, meal_type: Option<MealType>, tags: &[String]) -> Result<Vec<Recipe>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM recipes ORDER BY LOWER(name)")?;
        let ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let wanted: Vec<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();
        let mut recipes = Vec::new();
        for id in ids {
            let Some(recipe) = self.get_recipe(id)? else {
                continue;
            };
            if let Some(mt) = meal_type {
                if recipe.meal_type != mt {
                    continue;
                }
            }
            if wanted.iter().all(|t| recipe.dietary_tags.contains(t)) {
                recipes.push(recipe);
            }
        }
        Ok(recipes)
    }

    pub fn update_recipe(&self, id: i64, recipe: &NewRecipe, units: &UnitRegistry) -> Result<Recipe> {
        validate_recipe(recipe)?;
        if let Some(existing) = self.get_recipe_by_name(&recipe.name)? {
            if existing.id != id {
                bail!("Recipe '{}' already exists", recipe.name);
            }
        }
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        let changed = self.conn.execute(
            "UPDATE recipes SET name = ?1, meal_type = ?2, servings = ?3, prep_time = ?4,
                cook_time = ?5, cuisine = ?6, instructions = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                recipe.name,
                recipe.meal_type.as_str(),
                recipe.servings,
                recipe.prep_time,
                recipe.cook_time,
                recipe.cuisine,
                recipe.instructions,
                now,
                id,
            ],
        )?;
        if changed == 0 {
            bail!("Recipe {id} not found");
        }
        self.conn.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM dietary_tags WHERE recipe_id = ?1", params![id])?;
        self.write_recipe_children(id, recipe, units)?;
        tx.commit()?;
        self.get_recipe(id)?
            .context("Recipe vanished after update")
    }

    /// Delete a recipe and its child rows. Stored plan rows that point at
    /// it are left behind and skipped on the next plan load.
    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM dietary_tags WHERE recipe_id = ?1", params![id])?;
        let deleted = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // ----- pantry -----

    fn pantry_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<PantryItem> {
        Ok(PantryItem {
            id: row.get(0)?,
            name: row.get(1)?,
            quantity: row.get(2)?,
            unit: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    /// Add stock. Quantities merge into an existing row with the same
    /// ingredient and unit; names and units are stored normalized.
    pub fn add_pantry_item(&self, item: &NewPantryItem, units: &UnitRegistry) -> Result<PantryItem> {
        if item.name.trim().is_empty() {
            bail!("Pantry item name cannot be empty");
        }
        if item.quantity <= 0.0 {
            bail!("Quantity must be positive");
        }
        let unit = units.normalize_unit(&item.unit);
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        let ingredient_id = self.ensure_ingredient(&item.name, units)?;
        self.conn.execute(
            "INSERT INTO pantry (ingredient_id, quantity, unit, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(ingredient_id, unit)
             DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at",
            params![ingredient_id, item.quantity, unit, now],
        )?;
        tx.commit()?;
        let mut stmt = self.conn.prepare(
            "SELECT p.id, i.name, p.quantity, p.unit, p.updated_at
             FROM pantry p JOIN ingredients i ON i.id = p.ingredient_id
             WHERE p.ingredient_id = ?1 AND p.unit = ?2",
        )?;
        let item = stmt.query_row(params![ingredient_id, unit], Self::pantry_item_from_row)?;
        Ok(item)
    }

    pub fn get_pantry_items(&self) -> Result<Vec<PantryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, i.name, p.quantity, p.unit, p.updated_at
             FROM pantry p JOIN ingredients i ON i.id = p.ingredient_id
             ORDER BY i.name, p.unit",
        )?;
        let items = stmt
            .query_map([], Self::pantry_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// All stock rows for one ingredient (one per unit).
    pub fn get_pantry_item(&self, name: &str) -> Result<Vec<PantryItem>> {
        let normalized = normalize_name(name);
        let mut stmt = self.conn.prepare(
            "SELECT p.id, i.name, p.quantity, p.unit, p.updated_at
             FROM pantry p JOIN ingredients i ON i.id = p.ingredient_id
             WHERE i.name = ?1 ORDER BY p.unit",
        )?;
        let items = stmt
            .query_map(params![normalized], Self::pantry_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Overwrite stock for one ingredient and unit. Zero removes the row.
    pub fn set_pantry_quantity(
        &self,
        name: &str,
        quantity: f64,
        unit: &str,
        units: &UnitRegistry,
    ) -> Result<()> {
        if quantity < 0.0 {
            bail!("Quantity cannot be negative");
        }
        let normalized = normalize_name(name);
        let unit = units.normalize_unit(unit);
        if quantity == 0.0 {
            let removed = self.conn.execute(
                "DELETE FROM pantry WHERE unit = ?1 AND ingredient_id IN
                   (SELECT id FROM ingredients WHERE name = ?2)",
                params![unit, normalized],
            )?;
            if removed == 0 {
                bail!("No pantry entry for '{normalized}' in {unit}");
            }
            return Ok(());
        }
        let now = Local::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE pantry SET quantity = ?1, updated_at = ?2
             WHERE unit = ?3 AND ingredient_id IN
               (SELECT id FROM ingredients WHERE name = ?4)",
            params![quantity, now, unit, normalized],
        )?;
        if changed == 0 {
            bail!("No pantry entry for '{normalized}' in {unit}");
        }
        Ok(())
    }

    /// Remove all stock rows for an ingredient, across units.
    pub fn remove_pantry_item(&self, name: &str) -> Result<bool> {
        let normalized = normalize_name(name);
        let removed = self.conn.execute(
            "DELETE FROM pantry WHERE ingredient_id IN
               (SELECT id FROM ingredients WHERE name = ?1)",
            params![normalized],
        )?;
        Ok(removed > 0)
    }

    pub fn clear_pantry(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM pantry", [])?;
        Ok(removed)
    }

    /// Consume stock after shopping or cooking. Draws down rows for the
    /// ingredient in any convertible unit until the requested amount is
    /// covered, deleting rows that hit zero. Returns the unmet remainder
    /// in the requested unit (0 when stock covered everything). The whole
    /// drawdown is one transaction.
    pub fn deduct_from_pantry(
        &self,
        name: &str,
        quantity: f64,
        unit: &str,
        units: &UnitRegistry,
    ) -> Result<f64> {
        if quantity <= 0.0 {
            bail!("Quantity must be positive");
        }
        let unit = units.normalize_unit(unit);
        let rows = self.get_pantry_item(name)?;
        let now = Local::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        let mut needed = quantity;
        for row in rows {
            if needed <= 0.0 {
                break;
            }
            let Ok(available) = units.convert(row.quantity, &row.unit, &unit) else {
                continue;
            };
            let take = needed.min(available);
            needed -= take;
            // Convert the drawdown back into the row's own unit.
            let take_in_row_unit = units.convert(take, &unit, &row.unit)?;
            let left = row.quantity - take_in_row_unit;
            if left <= COVERAGE_EPSILON {
                self.conn
                    .execute("DELETE FROM pantry WHERE id = ?1", params![row.id])?;
            } else {
                self.conn.execute(
                    "UPDATE pantry SET quantity = ?1, updated_at = ?2 WHERE id = ?3",
                    params![left, now, row.id],
                )?;
            }
        }
        tx.commit()?;
        // Residue within the epsilon is conversion float noise, not a shortfall.
        if needed <= COVERAGE_EPSILON {
            return Ok(0.0);
        }
        Ok(needed)
    }

    // ----- meal plan -----

    /// Replace the stored plan. One plan exists at a time.
    pub fn save_plan(&self, plan: &MealPlan) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute("DELETE FROM current_meal_plan", [])?;
        for meal in &plan.meals {
            self.conn.execute(
                "INSERT INTO current_meal_plan (day_number, meal_type, recipe_id, servings, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    meal.day_number,
                    meal.meal_type.as_str(),
                    meal.recipe.id,
                    meal.servings,
                    now,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_current_plan(&self) -> Result<Option<LoadedPlan>> {
        let mut stmt = self.conn.prepare(
            "SELECT day_number, meal_type, recipe_id, servings FROM current_meal_plan
             ORDER BY day_number, meal_type",
        )?;
        let rows: Vec<(i64, String, i64, i64)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut meals = Vec::new();
        let mut skipped_meals = 0;
        let mut days = 0;
        for (day_number, meal_type, recipe_id, servings) in rows {
            days = days.max(day_number);
            match self.get_recipe(recipe_id)? {
                Some(recipe) => meals.push(PlannedMeal {
                    day_number,
                    meal_type: MealType::parse(&meal_type)?,
                    recipe,
                    servings,
                }),
                None => skipped_meals += 1,
            }
        }
        Ok(Some(LoadedPlan {
            plan: MealPlan { meals, days },
            skipped_meals,
        }))
    }

    pub fn clear_plan(&self) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM current_meal_plan", [])?;
        Ok(removed > 0)
    }

    /// Replace one slot's recipe. The new recipe must exist and match the
    /// slot's meal type.
    pub fn swap_meal(&self, day_number: i64, meal_type: MealType, recipe_id: i64) -> Result<()> {
        let Some(recipe) = self.get_recipe(recipe_id)? else {
            bail!("Recipe {recipe_id} not found");
        };
        if recipe.meal_type != meal_type {
            bail!(
                "'{}' is a {} recipe, not {}",
                recipe.name,
                recipe.meal_type,
                meal_type
            );
        }
        let changed = self.conn.execute(
            "UPDATE current_meal_plan SET recipe_id = ?1
             WHERE day_number = ?2 AND meal_type = ?3",
            params![recipe_id, day_number, meal_type.as_str()],
        )?;
        if changed == 0 {
            bail!("No planned {meal_type} on day {day_number}");
        }
        Ok(())
    }

    pub fn set_meal_servings(
        &self,
        day_number: i64,
        meal_type: MealType,
        servings: i64,
    ) -> Result<()> {
        if servings < 1 {
            bail!("Servings must be at least 1");
        }
        let changed = self.conn.execute(
            "UPDATE current_meal_plan SET servings = ?1
             WHERE day_number = ?2 AND meal_type = ?3",
            params![servings, day_number, meal_type.as_str()],
        )?;
        if changed == 0 {
            bail!("No planned {meal_type} on day {day_number}");
        }
        Ok(())
    }
}
