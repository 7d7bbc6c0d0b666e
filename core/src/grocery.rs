//! Shopping-list computation: scale planned meals, consolidate duplicate
//! ingredients across recipes, subtract pantry stock, and sort by store
//! category. Everything here is pure; persistence stays in [`crate::db`].

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{GroceryItem, MealPlan, PantryItem, normalize_name};
use crate::units::{CATEGORY_ORDER, UnitRegistry};

/// Pantry coverage within this margin counts as fully stocked, so float
/// noise from unit conversion never produces a "buy 0.0000001 cup" line.
pub const COVERAGE_EPSILON: f64 = 0.01;

/// One scaled ingredient occurrence, before consolidation.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientEntry {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Expand a plan into raw ingredient entries, scaling each recipe's
/// quantities by planned servings over recipe servings.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scale_plan(plan: &MealPlan) -> Vec<IngredientEntry> {
    let mut entries = Vec::new();
    for meal in &plan.meals {
        if meal.recipe.servings <= 0 {
            continue;
        }
        let multiplier = meal.servings as f64 / meal.recipe.servings as f64;
        for ing in &meal.recipe.ingredients {
            entries.push(IngredientEntry {
                name: ing.name.clone(),
                quantity: ing.quantity * multiplier,
                unit: ing.unit.clone(),
            });
        }
    }
    entries
}

/// Merge entries that refer to the same ingredient. Quantities in
/// convertible units fold into the unit the ingredient was first seen
/// with; incompatible units (say "2 cups" and "1 bunch" of spinach) stay
/// as separate lines. Output preserves first-encounter order and the
/// first-seen display spelling of each name.
#[must_use]
pub fn consolidate(entries: &[IngredientEntry], units: &UnitRegistry) -> Vec<GroceryItem> {
    struct Group {
        display: String,
        // (normalized unit, summed quantity), in first-seen unit order
        sums: Vec<(String, f64)>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for entry in entries {
        let key = normalize_name(&entry.name);
        let unit = units.normalize_unit(&entry.unit);
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Group {
                display: entry.name.trim().to_string(),
                sums: Vec::new(),
            }
        });
        match group.sums.iter_mut().find(|(u, _)| *u == unit) {
            Some((_, total)) => *total += entry.quantity,
            None => group.sums.push((unit, entry.quantity)),
        }
    }

    let mut items = Vec::new();
    for key in &order {
        let Some(group) = groups.get(key) else {
            continue;
        };
        // The first unit seen is the fold base; anything convertible to it
        // merges in, anything else stays its own entry.
        let mut folded: Vec<(String, f64)> = Vec::new();
        for (unit, total) in &group.sums {
            if let Some((base_unit, base_total)) = folded.first_mut() {
                if units.can_convert(unit, base_unit) {
                    if let Ok(converted) = units.convert(*total, unit, base_unit) {
                        *base_total += converted;
                        continue;
                    }
                }
            }
            folded.push((unit.clone(), *total));
        }
        let category = units.category_of(key).to_string();
        for (unit, total) in folded {
            if total <= 0.0 {
                continue;
            }
            items.push(GroceryItem {
                name: group.display.clone(),
                quantity: total,
                unit,
                category: category.clone(),
            });
        }
    }
    items
}

/// Subtract on-hand pantry stock from a consolidated list. The pantry is
/// read only; rows whose remaining need is within [`COVERAGE_EPSILON`]
/// are dropped as covered. Pantry rows in units that cannot convert to
/// the list row's unit are ignored for that row.
#[must_use]
pub fn deduct_pantry(
    items: Vec<GroceryItem>,
    pantry: &[PantryItem],
    units: &UnitRegistry,
) -> Vec<GroceryItem> {
    let mut stock: HashMap<String, Vec<&PantryItem>> = HashMap::new();
    for item in pantry {
        stock
            .entry(normalize_name(&item.name))
            .or_default()
            .push(item);
    }

    let mut output = Vec::new();
    for mut item in items {
        let key = normalize_name(&item.name);
        let mut remaining = item.quantity;
        if let Some(rows) = stock.get(&key) {
            for row in rows {
                if remaining <= 0.0 {
                    break;
                }
                match units.convert(row.quantity, &row.unit, &item.unit) {
                    Ok(usable) => remaining -= usable.min(remaining),
                    Err(_) => continue,
                }
            }
        }
        if remaining > COVERAGE_EPSILON {
            item.quantity = remaining;
            output.push(item);
        }
    }
    output
}

/// Stable sort into the fixed store-walk category order; unknown
/// categories go last. Items within a category keep their relative order.
pub fn sort_by_category(items: &mut [GroceryItem]) {
    items.sort_by_key(|item| {
        CATEGORY_ORDER
            .iter()
            .position(|c| *c == item.category)
            .unwrap_or(CATEGORY_ORDER.len())
    });
}

/// Full pipeline: scale, consolidate, optionally deduct pantry stock,
/// then sort by category. Leaves both the plan and pantry untouched.
#[must_use]
pub fn generate_grocery_list(
    plan: &MealPlan,
    pantry: &[PantryItem],
    deduct: bool,
    units: &UnitRegistry,
) -> Vec<GroceryItem> {
    let entries = scale_plan(plan);
    let mut items = consolidate(&entries, units);
    if deduct {
        items = deduct_pantry(items, pantry, units);
    }
    sort_by_category(&mut items);
    items
}
