//! Plan data: recipes, weekly plans, validation, shopping lists.

pub mod shopping;
pub mod types;
pub mod validate;

pub use shopping::{ShoppingList, aggregate_embedded, aggregate_selected, find_recipe};
pub use types::{MealSlot, PlanDay, Recipe, WeeklyPlan, recipes_from_value};
pub use validate::{
    RecipeField, ValidationError, check_day_keys, is_valid_recipe, is_valid_weekly_plan,
    validate_recipe, validate_recipe_batch, validate_selection, validate_weekly_plan,
};
