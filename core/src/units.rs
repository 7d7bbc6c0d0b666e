use std::collections::HashMap;

use thiserror::Error;

/// Raised when `convert` is asked to cross dimensions (e.g. cups to grams).
/// Callers in the grocery engine treat this as "skip this fold/deduction
/// opportunity", not as a fatal failure.
#[derive(Debug, Error)]
#[error("cannot convert from '{from}' to '{to}': incompatible unit types")]
pub struct ConversionError {
    pub from: String,
    pub to: String,
}

/// The conversion family a unit belongs to. Count covers everything that is
/// neither volume nor weight ("whole", "clove", unknown strings); count units
/// never convert to anything but themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Volume,
    Weight,
    Count,
}

/// Store-walk order for grocery list presentation. Categories not listed
/// here sort after all named ones.
pub const CATEGORY_ORDER: [&str; 9] = [
    "Produce",
    "Meat & Seafood",
    "Dairy & Eggs",
    "Bakery",
    "Pantry",
    "Canned Goods",
    "Condiments",
    "Frozen",
    "Other",
];

/// Immutable lookup tables for unit conversion and ingredient categorization.
///
/// Conversion goes through a common base (milliliters for volume, grams for
/// weight). Category lookup is exact-match on the full normalized ingredient
/// name — no fuzzy or substring matching.
pub struct UnitRegistry {
    volume_ml: HashMap<String, f64>,
    weight_g: HashMap<String, f64>,
    aliases: HashMap<String, String>,
    categories: HashMap<String, String>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UnitRegistry {
    /// Registry with the built-in US-kitchen unit tables and category map.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn builtin() -> Self {
        let volume_ml: HashMap<String, f64> = [
            ("ml", 1.0),
            ("l", 1000.0),
            ("tsp", 4.929),
            ("tbsp", 14.787),
            ("cup", 236.588),
            ("fl oz", 29.574),
            ("pint", 473.176),
            ("quart", 946.353),
            ("gallon", 3785.41),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let weight_g: HashMap<String, f64> = [
            ("g", 1.0),
            ("kg", 1000.0),
            ("oz", 28.3495),
            ("lb", 453.592),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let aliases: HashMap<String, String> = [
            ("tablespoon", "tbsp"),
            ("tablespoons", "tbsp"),
            ("teaspoon", "tsp"),
            ("teaspoons", "tsp"),
            ("ounce", "oz"),
            ("ounces", "oz"),
            ("pound", "lb"),
            ("pounds", "lb"),
            ("lbs", "lb"),
            ("gram", "g"),
            ("grams", "g"),
            ("kilogram", "kg"),
            ("kilograms", "kg"),
            ("milliliter", "ml"),
            ("milliliters", "ml"),
            ("millilitre", "ml"),
            ("millilitres", "ml"),
            ("liter", "l"),
            ("liters", "l"),
            ("litre", "l"),
            ("litres", "l"),
            ("cups", "cup"),
            ("fluid ounce", "fl oz"),
            ("fluid ounces", "fl oz"),
            ("pints", "pint"),
            ("quarts", "quart"),
            ("gallons", "gallon"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let categories: HashMap<String, String> = [
            // Produce
            ("onion", "Produce"),
            ("onions", "Produce"),
            ("yellow onion", "Produce"),
            ("red onion", "Produce"),
            ("garlic", "Produce"),
            ("tomato", "Produce"),
            ("tomatoes", "Produce"),
            ("cherry tomatoes", "Produce"),
            ("bell pepper", "Produce"),
            ("red bell pepper", "Produce"),
            ("broccoli", "Produce"),
            ("cucumber", "Produce"),
            ("lettuce", "Produce"),
            ("romaine lettuce", "Produce"),
            ("spinach", "Produce"),
            ("carrot", "Produce"),
            ("carrots", "Produce"),
            ("celery", "Produce"),
            ("zucchini", "Produce"),
            ("potato", "Produce"),
            ("potatoes", "Produce"),
            ("lemon", "Produce"),
            ("lemons", "Produce"),
            ("lime", "Produce"),
            ("banana", "Produce"),
            ("bananas", "Produce"),
            ("apple", "Produce"),
            ("basil", "Produce"),
            ("cilantro", "Produce"),
            ("parsley", "Produce"),
            // Meat & Seafood
            ("chicken", "Meat & Seafood"),
            ("chicken breast", "Meat & Seafood"),
            ("chicken thighs", "Meat & Seafood"),
            ("beef", "Meat & Seafood"),
            ("ground beef", "Meat & Seafood"),
            ("pork", "Meat & Seafood"),
            ("salmon", "Meat & Seafood"),
            ("shrimp", "Meat & Seafood"),
            ("fish", "Meat & Seafood"),
            // Dairy & Eggs
            ("milk", "Dairy & Eggs"),
            ("eggs", "Dairy & Eggs"),
            ("egg", "Dairy & Eggs"),
            ("cheese", "Dairy & Eggs"),
            ("cheddar cheese", "Dairy & Eggs"),
            ("mozzarella", "Dairy & Eggs"),
            ("parmesan cheese", "Dairy & Eggs"),
            ("feta cheese", "Dairy & Eggs"),
            ("greek yogurt", "Dairy & Eggs"),
            ("yogurt", "Dairy & Eggs"),
            ("butter", "Dairy & Eggs"),
            ("cream", "Dairy & Eggs"),
            ("sour cream", "Dairy & Eggs"),
            // Bakery
            ("bread", "Bakery"),
            ("tortillas", "Bakery"),
            ("buns", "Bakery"),
            // Pantry
            ("rice", "Pantry"),
            ("pasta", "Pantry"),
            ("penne pasta", "Pantry"),
            ("spaghetti", "Pantry"),
            ("flour", "Pantry"),
            ("sugar", "Pantry"),
            ("salt", "Pantry"),
            ("black pepper", "Pantry"),
            ("pepper", "Pantry"),
            ("olive oil", "Pantry"),
            ("vegetable oil", "Pantry"),
            ("cooking oil", "Pantry"),
            ("honey", "Pantry"),
            ("oats", "Pantry"),
            ("rolled oats", "Pantry"),
            ("chia seeds", "Pantry"),
            // Condiments
            ("soy sauce", "Condiments"),
            ("ketchup", "Condiments"),
            ("mustard", "Condiments"),
            ("mayonnaise", "Condiments"),
            ("hot sauce", "Condiments"),
            // Canned Goods
            ("kalamata olives", "Canned Goods"),
            ("olives", "Canned Goods"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            volume_ml,
            weight_g,
            aliases,
            categories,
        }
    }

    /// Registry with caller-supplied tables, for tests and custom setups.
    #[must_use]
    pub fn with_tables(
        volume_ml: HashMap<String, f64>,
        weight_g: HashMap<String, f64>,
        aliases: HashMap<String, String>,
        categories: HashMap<String, String>,
    ) -> Self {
        Self {
            volume_ml,
            weight_g,
            aliases,
            categories,
        }
    }

    /// Case-fold, trim, and resolve aliases ("tablespoons" -> "tbsp").
    /// Unknown units pass through unchanged, lower-cased.
    #[must_use]
    pub fn normalize_unit(&self, unit: &str) -> String {
        let lower = unit.to_lowercase().trim().to_string();
        self.aliases.get(&lower).cloned().unwrap_or(lower)
    }

    #[must_use]
    pub fn dimension(&self, unit: &str) -> Dimension {
        let u = self.normalize_unit(unit);
        if self.volume_ml.contains_key(&u) {
            Dimension::Volume
        } else if self.weight_g.contains_key(&u) {
            Dimension::Weight
        } else {
            Dimension::Count
        }
    }

    /// Two units are convertible if they normalize to the same string or
    /// both belong to the same volume/weight table. Count units only match
    /// themselves exactly ("piece" and "whole" are NOT convertible).
    #[must_use]
    pub fn can_convert(&self, from_unit: &str, to_unit: &str) -> bool {
        let from = self.normalize_unit(from_unit);
        let to = self.normalize_unit(to_unit);
        if from == to {
            return true;
        }
        matches!(
            (self.dimension(&from), self.dimension(&to)),
            (Dimension::Volume, Dimension::Volume) | (Dimension::Weight, Dimension::Weight)
        )
    }

    /// Convert a quantity between compatible units via the dimension's base
    /// unit: `qty * factor[from] / factor[to]`.
    pub fn convert(&self, quantity: f64, from_unit: &str, to_unit: &str) -> Result<f64, ConversionError> {
        let from = self.normalize_unit(from_unit);
        let to = self.normalize_unit(to_unit);

        if from == to {
            return Ok(quantity);
        }
        if let (Some(f), Some(t)) = (self.volume_ml.get(&from), self.volume_ml.get(&to)) {
            return Ok(quantity * f / t);
        }
        if let (Some(f), Some(t)) = (self.weight_g.get(&from), self.weight_g.get(&to)) {
            return Ok(quantity * f / t);
        }
        Err(ConversionError { from, to })
    }

    /// Store category for a normalized ingredient name; "Other" when
    /// unrecognized.
    #[must_use]
    pub fn category_of(&self, normalized_name: &str) -> &str {
        self.categories
            .get(normalized_name)
            .map_or("Other", String::as_str)
    }
}
