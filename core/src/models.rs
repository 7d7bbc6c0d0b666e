use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::units::UnitRegistry;

/// Inclusive upper bound on plan length, in days.
pub const MAX_PLAN_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => bail!("Invalid meal type '{s}'. Must be one of: breakfast, lunch, dinner, snack"),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    /// Display name as entered; matching uses [`normalize_name`].
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preparation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub meal_type: MealType,
    pub servings: i64,
    pub ingredients: Vec<RecipeIngredient>,
    pub prep_time: i64,
    pub cook_time: i64,
    pub cuisine: String,
    pub instructions: String,
    pub dietary_tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Recipe {
    #[must_use]
    pub fn total_time(&self) -> i64 {
        self.prep_time + self.cook_time
    }
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub meal_type: MealType,
    pub servings: i64,
    pub ingredients: Vec<RecipeIngredient>,
    pub prep_time: i64,
    pub cook_time: i64,
    pub cuisine: String,
    pub instructions: String,
    pub dietary_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PantryItem {
    pub id: i64,
    /// Stored normalized (case-folded, trimmed).
    pub name: String,
    pub quantity: f64,
    /// Stored normalized (alias-resolved abbreviation).
    pub unit: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPantryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedMeal {
    pub day_number: i64,
    pub meal_type: MealType,
    pub recipe: Recipe,
    pub servings: i64,
}

impl PlannedMeal {
    #[must_use]
    pub fn day_name(&self) -> String {
        const DAYS: [&str; 7] = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];
        match usize::try_from(self.day_number) {
            Ok(n) if (1..=7).contains(&n) => DAYS[n - 1].to_string(),
            _ => format!("Day {}", self.day_number),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealPlan {
    pub meals: Vec<PlannedMeal>,
    pub days: i64,
}

impl MealPlan {
    #[must_use]
    pub fn meals_for_day(&self, day_number: i64) -> Vec<&PlannedMeal> {
        self.meals
            .iter()
            .filter(|m| m.day_number == day_number)
            .collect()
    }

    #[must_use]
    pub fn meals_of_type(&self, meal_type: MealType) -> Vec<&PlannedMeal> {
        self.meals
            .iter()
            .filter(|m| m.meal_type == meal_type)
            .collect()
    }
}

/// Final, ephemeral output record of the shopping-list computation.
/// Never persisted; derived entirely from the plan and pantry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroceryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
}

/// Ingredient identity for consolidation and pantry matching: case-folded
/// and trimmed. Display names keep their first-seen original form.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn validate_recipe(recipe: &NewRecipe) -> Result<()> {
    if recipe.name.trim().is_empty() {
        bail!("Recipe name cannot be empty");
    }
    if recipe.servings <= 0 {
        bail!("Servings must be positive");
    }
    if recipe.ingredients.is_empty() {
        bail!("Recipe must have at least one ingredient");
    }
    for ing in &recipe.ingredients {
        if ing.name.trim().is_empty() {
            bail!("Ingredient name cannot be empty");
        }
        if ing.quantity <= 0.0 {
            bail!("Ingredient quantity must be positive (got {} for '{}')", ing.quantity, ing.name);
        }
    }
    Ok(())
}

pub fn validate_plan_days(days: i64) -> Result<()> {
    if !(1..=MAX_PLAN_DAYS).contains(&days) {
        bail!("Days must be between 1 and {MAX_PLAN_DAYS}");
    }
    Ok(())
}

pub fn validate_servings(servings: i64) -> Result<()> {
    if servings < 1 {
        bail!("Servings must be at least 1");
    }
    Ok(())
}

/// Parse a quantity that may include fractions: "1.5", "1/2", "1 1/2".
pub fn parse_quantity(s: &str) -> Result<f64> {
    fn simple(part: &str) -> Option<f64> {
        if let Some((num, den)) = part.split_once('/') {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            return Some(num / den);
        }
        part.trim().parse().ok()
    }

    let s = s.trim();
    // Mixed fraction like "1 1/2"
    if let Some((whole, frac)) = s.split_once(char::is_whitespace) {
        if frac.contains('/') {
            if let (Some(w), Some(f)) = (simple(whole), simple(frac)) {
                return Ok(w + f);
            }
        }
    }
    match simple(s) {
        Some(v) => Ok(v),
        None => bail!("Cannot parse quantity: {s}"),
    }
}

/// Tokenize an ingredient line like `"2 cups flour, sifted"` into a
/// [`RecipeIngredient`]. The leading numeric tokens form the quantity
/// (fractions allowed), the next one or two words form the unit when the
/// registry recognizes them (so "fl oz" parses as one unit), and anything
/// after the first comma becomes the preparation note. Lines with no
/// quantity ("salt") or no unit ("3 eggs") default to 1 / "whole".
pub fn parse_ingredient(text: &str, units: &UnitRegistry) -> Result<RecipeIngredient> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Ingredient cannot be empty");
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let qty_end = tokens
        .iter()
        .take_while(|t| t.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '/'))
        .count();

    let (quantity, rest) = if qty_end == 0 {
        (1.0, tokens.as_slice())
    } else {
        let qty = parse_quantity(&tokens[..qty_end].join(" "))?;
        (qty, &tokens[qty_end..])
    };

    if rest.is_empty() {
        bail!("Ingredient '{text}' has a quantity but no name");
    }

    let (unit, name_tokens) = if rest.len() >= 3 && is_known_unit(units, &rest[..2].join(" ")) {
        (rest[..2].join(" "), &rest[2..])
    } else if rest.len() >= 2 && is_known_unit(units, rest[0]) {
        (rest[0].to_string(), &rest[1..])
    } else {
        ("whole".to_string(), rest)
    };

    let full_name = name_tokens.join(" ");
    let (name, preparation) = match full_name.split_once(',') {
        Some((n, p)) => (n.trim().to_string(), p.trim().to_string()),
        None => (full_name, String::new()),
    };

    if name.is_empty() {
        bail!("Ingredient '{text}' has no name");
    }

    Ok(RecipeIngredient {
        name,
        quantity,
        unit,
        preparation,
    })
}

fn is_known_unit(units: &UnitRegistry, word: &str) -> bool {
    use crate::units::Dimension;
    const COUNT_UNITS: [&str; 18] = [
        "whole", "item", "items", "piece", "pieces", "clove", "cloves", "bunch", "bunches", "can",
        "cans", "package", "packages", "pkg", "dozen", "slice", "slices", "pinch",
    ];
    let normalized = units.normalize_unit(word);
    units.dimension(&normalized) != Dimension::Count || COUNT_UNITS.contains(&normalized.as_str())
}

/// Format a quantity for display: whole numbers plain, common fractions as
/// "1/2" or "1 1/2", everything else as a trimmed two-decimal value.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn format_quantity(quantity: f64) -> String {
    const FRACTIONS: [(f64, &str); 6] = [
        (0.125, "1/8"),
        (0.25, "1/4"),
        (0.333, "1/3"),
        (0.5, "1/2"),
        (0.667, "2/3"),
        (0.75, "3/4"),
    ];

    if (quantity - quantity.round()).abs() < 1e-9 {
        return format!("{}", quantity.round() as i64);
    }

    for (val, text) in FRACTIONS {
        if (quantity - val).abs() < 0.01 {
            return text.to_string();
        }
    }

    let whole = quantity.trunc() as i64;
    let remainder = quantity - quantity.trunc();
    if whole > 0 {
        for (val, text) in FRACTIONS {
            if (remainder - val).abs() < 0.01 {
                return format!("{whole} {text}");
            }
        }
    }

    let s = format!("{quantity:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parse() {
        assert_eq!(MealType::parse("breakfast").unwrap(), MealType::Breakfast);
        assert_eq!(MealType::parse("LUNCH").unwrap(), MealType::Lunch);
        assert_eq!(MealType::parse("Dinner").unwrap(), MealType::Dinner);
        assert!(MealType::parse("brunch").is_err());
        assert!(MealType::parse("").is_err());
    }

    #[test]
    fn test_meal_type_display_roundtrip() {
        for mt in MealType::ALL {
            assert_eq!(MealType::parse(mt.as_str()).unwrap(), mt);
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Chicken Breast "), "chicken breast");
        assert_eq!(normalize_name("FLOUR"), "flour");
    }

    #[test]
    fn test_parse_quantity_decimal() {
        assert!((parse_quantity("1.5").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!((parse_quantity("2").unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_quantity_fraction() {
        assert!((parse_quantity("1/2").unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((parse_quantity("3/4").unwrap() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_quantity_mixed() {
        assert!((parse_quantity("1 1/2").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!((parse_quantity("2 1/4").unwrap() - 2.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("1/0").is_err());
    }

    #[test]
    fn test_parse_ingredient_full() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("2 cups flour, sifted", &reg).unwrap();
        assert_eq!(ing.name, "flour");
        assert!((ing.quantity - 2.0).abs() < f64::EPSILON);
        assert_eq!(ing.unit, "cups");
        assert_eq!(ing.preparation, "sifted");
    }

    #[test]
    fn test_parse_ingredient_two_word_unit() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("4 fl oz milk", &reg).unwrap();
        assert_eq!(ing.unit, "fl oz");
        assert_eq!(ing.name, "milk");
    }

    #[test]
    fn test_parse_ingredient_no_unit() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("3 eggs", &reg).unwrap();
        assert_eq!(ing.unit, "whole");
        assert_eq!(ing.name, "eggs");
        assert!((ing.quantity - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_ingredient_modifier_is_not_a_unit() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("2 large eggs", &reg).unwrap();
        assert_eq!(ing.unit, "whole");
        assert_eq!(ing.name, "large eggs");
    }

    #[test]
    fn test_parse_ingredient_bare_name() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("salt", &reg).unwrap();
        assert!((ing.quantity - 1.0).abs() < f64::EPSILON);
        assert_eq!(ing.unit, "whole");
        assert_eq!(ing.name, "salt");
    }

    #[test]
    fn test_parse_ingredient_fraction_quantity() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("1 1/2 tbsp olive oil", &reg).unwrap();
        assert!((ing.quantity - 1.5).abs() < f64::EPSILON);
        assert_eq!(ing.unit, "tbsp");
        assert_eq!(ing.name, "olive oil");
    }

    #[test]
    fn test_parse_ingredient_count_unit() {
        let reg = UnitRegistry::default();
        let ing = parse_ingredient("2 cloves garlic, minced", &reg).unwrap();
        assert_eq!(ing.unit, "cloves");
        assert_eq!(ing.name, "garlic");
        assert_eq!(ing.preparation, "minced");
    }

    #[test]
    fn test_parse_ingredient_empty() {
        let reg = UnitRegistry::default();
        assert!(parse_ingredient("", &reg).is_err());
        assert!(parse_ingredient("   ", &reg).is_err());
    }

    #[test]
    fn test_format_quantity_whole() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(10.0), "10");
    }

    #[test]
    fn test_format_quantity_fractions() {
        assert_eq!(format_quantity(0.5), "1/2");
        assert_eq!(format_quantity(0.25), "1/4");
        assert_eq!(format_quantity(0.75), "3/4");
        assert_eq!(format_quantity(1.5), "1 1/2");
    }

    #[test]
    fn test_format_quantity_decimal_fallback() {
        assert_eq!(format_quantity(0.4), "0.4");
        assert_eq!(format_quantity(2.37), "2.37");
    }

    #[test]
    fn test_validate_recipe() {
        let good = NewRecipe {
            name: "Pancakes".to_string(),
            meal_type: MealType::Breakfast,
            servings: 4,
            ingredients: vec![RecipeIngredient {
                name: "flour".to_string(),
                quantity: 2.0,
                unit: "cup".to_string(),
                preparation: String::new(),
            }],
            prep_time: 10,
            cook_time: 15,
            cuisine: String::new(),
            instructions: String::new(),
            dietary_tags: vec![],
        };
        assert!(validate_recipe(&good).is_ok());

        let mut bad = good.clone();
        bad.name = "  ".to_string();
        assert!(validate_recipe(&bad).is_err());

        let mut bad = good.clone();
        bad.servings = 0;
        assert!(validate_recipe(&bad).is_err());

        let mut bad = good.clone();
        bad.ingredients.clear();
        assert!(validate_recipe(&bad).is_err());

        let mut bad = good;
        bad.ingredients[0].quantity = -1.0;
        assert!(validate_recipe(&bad).is_err());
    }

    #[test]
    fn test_validate_plan_days() {
        assert!(validate_plan_days(1).is_ok());
        assert!(validate_plan_days(14).is_ok());
        assert!(validate_plan_days(0).is_err());
        assert!(validate_plan_days(15).is_err());
    }

    #[test]
    fn test_day_name() {
        let recipe = sample_recipe();
        let meal = PlannedMeal {
            day_number: 1,
            meal_type: MealType::Dinner,
            recipe: recipe.clone(),
            servings: 2,
        };
        assert_eq!(meal.day_name(), "Monday");
        let meal = PlannedMeal {
            day_number: 9,
            meal_type: MealType::Dinner,
            recipe,
            servings: 2,
        };
        assert_eq!(meal.day_name(), "Day 9");
    }

    fn sample_recipe() -> Recipe {
        Recipe {
            id: 1,
            name: "Test".to_string(),
            meal_type: MealType::Dinner,
            servings: 4,
            ingredients: vec![],
            prep_time: 0,
            cook_time: 0,
            cuisine: String::new(),
            instructions: String::new(),
            dietary_tags: vec![],
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}
