//! Meal plan generation. Picks recipes at random per day and meal type,
//! steering away from anything served in the last few selections so a
//! week's plan doesn't repeat itself when the recipe pool allows variety.

use std::collections::HashMap;

use anyhow::{Result, bail};
use rand::Rng;

use crate::models::{MealPlan, MealType, PlannedMeal, Recipe, validate_plan_days, validate_servings};

/// How many prior selections to avoid repeating, pool size permitting.
const LOOKBACK: usize = 7;

/// Build a plan covering `days` days with one meal per requested type per
/// day, all at `servings` servings. Fails if any requested type has no
/// recipes to draw from.
pub fn generate_plan(
    recipes: &[Recipe],
    days: i64,
    meal_types: &[MealType],
    servings: i64,
    rng: &mut impl Rng,
) -> Result<MealPlan> {
    validate_plan_days(days)?;
    validate_servings(servings)?;
    if meal_types.is_empty() {
        bail!("At least one meal type is required");
    }

    let mut pools: HashMap<MealType, Vec<&Recipe>> = HashMap::new();
    for recipe in recipes {
        pools.entry(recipe.meal_type).or_default().push(recipe);
    }
    for meal_type in meal_types {
        if pools.get(meal_type).is_none_or(Vec::is_empty) {
            bail!("No recipes available for meal type '{meal_type}'");
        }
    }

    let mut recent: Vec<i64> = Vec::new();
    let mut meals = Vec::new();
    for day_number in 1..=days {
        for &meal_type in meal_types {
            let pool = &pools[&meal_type];
            let lookback = LOOKBACK.min(pool.len().saturating_sub(1));
            let avoid: Vec<i64> = recent
                .iter()
                .rev()
                .filter(|id| pool.iter().any(|r| r.id == **id))
                .take(lookback)
                .copied()
                .collect();
            let candidates: Vec<&Recipe> = pool
                .iter()
                .filter(|r| !avoid.contains(&r.id))
                .copied()
                .collect();
            // Small pools cycle; fall back to anything of the right type.
            let candidates = if candidates.is_empty() {
                pool.as_slice()
            } else {
                candidates.as_slice()
            };
            let chosen = candidates[rng.random_range(0..candidates.len())];
            recent.push(chosen.id);
            meals.push(PlannedMeal {
                day_number,
                meal_type,
                recipe: chosen.clone(),
                servings,
            });
        }
    }

    Ok(MealPlan { meals, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn recipe(id: i64, name: &str, meal_type: MealType) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            meal_type,
            servings: 2,
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

    fn dinner_pool(count: i64) -> Vec<Recipe> {
        (1..=count)
            .map(|i| recipe(i, &format!("Dinner {i}"), MealType::Dinner))
            .collect()
    }

    #[test]
    fn test_generate_plan_shape() {
        let recipes = dinner_pool(10);
        let mut rng = StdRng::seed_from_u64(7);
        let plan = generate_plan(&recipes, 7, &[MealType::Dinner], 2, &mut rng).unwrap();
        assert_eq!(plan.days, 7);
        assert_eq!(plan.meals.len(), 7);
        for (i, meal) in plan.meals.iter().enumerate() {
            assert_eq!(meal.day_number, i as i64 + 1);
            assert_eq!(meal.meal_type, MealType::Dinner);
            assert_eq!(meal.servings, 2);
        }
    }

    #[test]
    fn test_generate_plan_multiple_meal_types() {
        let mut recipes = dinner_pool(5);
        recipes.push(recipe(100, "Oatmeal", MealType::Breakfast));
        recipes.push(recipe(101, "Omelette", MealType::Breakfast));
        let mut rng = StdRng::seed_from_u64(1);
        let plan = generate_plan(
            &recipes,
            3,
            &[MealType::Breakfast, MealType::Dinner],
            4,
            &mut rng,
        )
        .unwrap();
        assert_eq!(plan.meals.len(), 6);
        assert_eq!(plan.meals_of_type(MealType::Breakfast).len(), 3);
        assert_eq!(plan.meals_of_type(MealType::Dinner).len(), 3);
        assert_eq!(plan.meals_for_day(2).len(), 2);
    }

    #[test]
    fn test_generate_plan_avoids_recent_repeats() {
        // With 8 dinners over 7 days, no recipe should appear twice.
        let recipes = dinner_pool(8);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = generate_plan(&recipes, 7, &[MealType::Dinner], 2, &mut rng).unwrap();
            let mut ids: Vec<i64> = plan.meals.iter().map(|m| m.recipe.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 7, "seed {seed} produced a repeat");
        }
    }

    #[test]
    fn test_generate_plan_single_recipe_repeats() {
        let recipes = dinner_pool(1);
        let mut rng = StdRng::seed_from_u64(3);
        let plan = generate_plan(&recipes, 5, &[MealType::Dinner], 2, &mut rng).unwrap();
        assert_eq!(plan.meals.len(), 5);
        assert!(plan.meals.iter().all(|m| m.recipe.id == 1));
    }

    #[test]
    fn test_generate_plan_two_recipes_alternate() {
        let recipes = dinner_pool(2);
        let mut rng = StdRng::seed_from_u64(9);
        let plan = generate_plan(&recipes, 6, &[MealType::Dinner], 2, &mut rng).unwrap();
        // Lookback of one means consecutive days always differ.
        for pair in plan.meals.windows(2) {
            assert_ne!(pair[0].recipe.id, pair[1].recipe.id);
        }
    }

    #[test]
    fn test_generate_plan_missing_meal_type() {
        let recipes = dinner_pool(3);
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_plan(&recipes, 7, &[MealType::Breakfast], 2, &mut rng).unwrap_err();
        assert!(err.to_string().contains("breakfast"));
    }

    #[test]
    fn test_generate_plan_validates_inputs() {
        let recipes = dinner_pool(3);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate_plan(&recipes, 0, &[MealType::Dinner], 2, &mut rng).is_err());
        assert!(generate_plan(&recipes, 15, &[MealType::Dinner], 2, &mut rng).is_err());
        assert!(generate_plan(&recipes, 7, &[MealType::Dinner], 0, &mut rng).is_err());
        assert!(generate_plan(&recipes, 7, &[], 2, &mut rng).is_err());
    }

    #[test]
    fn test_generate_plan_deterministic_with_seed() {
        let recipes = dinner_pool(10);
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let pa = generate_plan(&recipes, 7, &[MealType::Dinner], 2, &mut a).unwrap();
        let pb = generate_plan(&recipes, 7, &[MealType::Dinner], 2, &mut b).unwrap();
        let ids_a: Vec<i64> = pa.meals.iter().map(|m| m.recipe.id).collect();
        let ids_b: Vec<i64> = pb.meals.iter().map(|m| m.recipe.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
