//! Shopping-list aggregation.

use indexmap::IndexMap;

use super::types::{Recipe, WeeklyPlan};

/// Ingredient name -> number of occurrences across the week, in order of
/// first appearance. Names are counted verbatim (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    counts: IndexMap<String, usize>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every ingredient of `recipe` once per appearance.
    pub fn add_recipe(&mut self, recipe: &Recipe) {
        for ingredient in &recipe.ingredients {
            *self.counts.entry(ingredient.clone()).or_insert(0) += 1;
        }
    }

    pub fn count(&self, ingredient: &str) -> usize {
        self.counts.get(ingredient).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Tally both meals of every day of a plan with embedded recipes.
pub fn aggregate_embedded(plan: &WeeklyPlan<Recipe>) -> ShoppingList {
    let mut list = ShoppingList::new();
    for day in &plan.days {
        for recipe in &day.meals {
            list.add_recipe(recipe);
        }
    }
    list
}

/// Tally both meals of every day of a plan that selects recipes by name.
///
/// The first recipe in `recipes` with a matching name is used. Names with no
/// match are skipped without error.
pub fn aggregate_selected(plan: &WeeklyPlan<String>, recipes: &[Recipe]) -> ShoppingList {
    let mut list = ShoppingList::new();
    for day in &plan.days {
        for name in &day.meals {
            match find_recipe(recipes, name) {
                Some(recipe) => list.add_recipe(recipe),
                None => tracing::debug!(day = %day.day, recipe = %name, "selected recipe not found"),
            }
        }
    }
    list
}

/// First recipe in `recipes` named exactly `name`.
pub fn find_recipe<'a>(recipes: &'a [Recipe], name: &str) -> Option<&'a Recipe> {
    recipes.iter().find(|r| r.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::types::PlanDay;

    fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            name: name.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            preparation: "Cook.".to_string(),
        }
    }

    #[test]
    fn counts_are_additive_across_days() {
        let pancake = recipe("Pancake", &["egg", "egg", "milk"]);
        let plan = WeeklyPlan {
            days: vec![
                PlanDay {
                    day: "Monday".to_string(),
                    meals: ["Pancake".to_string(), "Nothing".to_string()],
                },
                PlanDay {
                    day: "Tuesday".to_string(),
                    meals: ["Missing".to_string(), "Pancake".to_string()],
                },
            ],
        };
        let list = aggregate_selected(&plan, &[pancake]);
        assert_eq!(list.count("egg"), 4);
        assert_eq!(list.count("milk"), 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn embedded_plan_counts_both_meals() {
        let plan = WeeklyPlan {
            days: vec![PlanDay {
                day: "Segunda".to_string(),
                meals: [recipe("A", &["arroz", "sal"]), recipe("B", &["sal", "Sal"])],
            }],
        };
        let list = aggregate_embedded(&plan);
        assert_eq!(list.count("sal"), 2);
        assert_eq!(list.count("Sal"), 1, "counting is case-sensitive");
        let order: Vec<&str> = list.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["arroz", "sal", "Sal"]);
    }

    #[test]
    fn order_of_days_does_not_change_counts() {
        let a = recipe("A", &["x", "y"]);
        let b = recipe("B", &["y", "z"]);
        let forward = WeeklyPlan {
            days: vec![
                PlanDay { day: "1".into(), meals: [a.clone(), b.clone()] },
                PlanDay { day: "2".into(), meals: [b.clone(), b.clone()] },
            ],
        };
        let backward = WeeklyPlan {
            days: forward.days.iter().rev().cloned().collect(),
        };
        let f = aggregate_embedded(&forward);
        let r = aggregate_embedded(&backward);
        for name in ["x", "y", "z"] {
            assert_eq!(f.count(name), r.count(name), "{name}");
        }
        assert_eq!(f.count("y"), 4);
    }

    #[test]
    fn duplicate_names_resolve_to_first_recipe() {
        let first = recipe("Soup", &["carrot"]);
        let second = recipe("Soup", &["potato"]);
        let recipes = [first, second];
        assert_eq!(find_recipe(&recipes, "Soup").unwrap().ingredients, vec!["carrot"]);
    }
}
