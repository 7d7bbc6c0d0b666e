use anyhow::{Result, bail};
use serde::Serialize;

use larder_core::models::{MealType, RecipeIngredient, format_quantity};

/// Parse a comma-separated meal type list like "breakfast,dinner",
/// preserving order and dropping duplicates.
pub(crate) fn parse_meal_types(s: &str) -> Result<Vec<MealType>> {
    let mut types = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let mt = MealType::parse(part)?;
        if !types.contains(&mt) {
            types.push(mt);
        }
    }
    if types.is_empty() {
        bail!("No meal types given. Use e.g. --meals dinner or --meals breakfast,dinner");
    }
    Ok(types)
}

/// One-line display form: "2 cups flour, sifted".
pub(crate) fn format_ingredient(ing: &RecipeIngredient) -> String {
    let mut out = format!("{} {} {}", format_quantity(ing.quantity), ing.unit, ing.name);
    if !ing.preparation.is_empty() {
        out.push_str(", ");
        out.push_str(&ing.preparation);
    }
    out
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meal_types() {
        let types = parse_meal_types("breakfast,dinner").unwrap();
        assert_eq!(types, vec![MealType::Breakfast, MealType::Dinner]);
    }

    #[test]
    fn test_parse_meal_types_dedup_and_case() {
        let types = parse_meal_types("Dinner, dinner, LUNCH").unwrap();
        assert_eq!(types, vec![MealType::Dinner, MealType::Lunch]);
    }

    #[test]
    fn test_parse_meal_types_invalid() {
        assert!(parse_meal_types("brunch").is_err());
        assert!(parse_meal_types(" , ").is_err());
    }

    #[test]
    fn test_format_ingredient() {
        let ing = RecipeIngredient {
            name: "flour".to_string(),
            quantity: 1.5,
            unit: "cup".to_string(),
            preparation: "sifted".to_string(),
        };
        assert_eq!(format_ingredient(&ing), "1 1/2 cup flour, sifted");

        let plain = RecipeIngredient {
            name: "eggs".to_string(),
            quantity: 3.0,
            unit: "whole".to_string(),
            preparation: String::new(),
        };
        assert_eq!(format_ingredient(&plain), "3 whole eggs");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), "{\"error\":\"nope\"}");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }
}
