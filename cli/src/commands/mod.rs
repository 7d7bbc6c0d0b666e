mod grocery;
mod helpers;
mod pantry;
mod plan;
mod recipe;

use std::process;

use anyhow::Result;

use larder_core::db::{Database, LoadedPlan};

use helpers::json_error;

pub(crate) use grocery::{cmd_grocery_export, cmd_grocery_generate};
pub(crate) use pantry::{
    cmd_pantry_add, cmd_pantry_clear, cmd_pantry_deduct, cmd_pantry_list, cmd_pantry_remove,
    cmd_pantry_update,
};
pub(crate) use plan::{
    cmd_plan_clear, cmd_plan_generate, cmd_plan_set_servings, cmd_plan_swap, cmd_plan_view,
};
pub(crate) use recipe::{
    cmd_recipe_add, cmd_recipe_delete, cmd_recipe_export, cmd_recipe_import, cmd_recipe_list,
    cmd_recipe_view,
};

/// Load the stored plan or exit with status 2 when none exists.
pub(super) fn require_plan(db: &Database, json: bool) -> Result<LoadedPlan> {
    match db.get_current_plan()? {
        Some(loaded) => Ok(loaded),
        None => {
            let message = "No meal plan. Generate one with: larder plan generate";
            if json {
                println!("{}", json_error(message));
            } else {
                eprintln!("{message}");
            }
            process::exit(2);
        }
    }
}
