//! Typed views of validated plan data.
//!
//! Validation runs on the decoded [`serde_json::Value`] first (see
//! [`super::validate`]); these types are built only afterwards, through the
//! same field lookup the validator uses, so anything the validator accepts
//! also converts.

use serde_json::{Map, Value};

use super::validate::{RecipeField, ValidationError, recipe_field, validate_recipe};
use crate::locale::DayLocale;

/// A single recipe as produced by the model.
///
/// Built from either the English or the Portuguese field spellings; when an
/// object carries both, the English one wins. Unknown fields are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub preparation: String,
}

impl Recipe {
    /// Build a recipe from a model object.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        validate_recipe(value)?;
        let obj = value
            .as_object()
            .ok_or(ValidationError::NotAnObject { what: "a recipe" })?;

        let ingredients = recipe_field(obj, RecipeField::Ingredients)
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or(ValidationError::WrongFieldType {
                field: RecipeField::Ingredients,
                expected: RecipeField::Ingredients.expected(),
            })?;

        Ok(Self {
            name: text_field(obj, RecipeField::Name)?,
            ingredients,
            preparation: text_field(obj, RecipeField::Preparation)?,
        })
    }

    /// Render as a JSON object keyed in `locale`'s spelling.
    pub fn to_value(&self, locale: DayLocale) -> Value {
        let [name, ingredients, preparation] = locale.recipe_keys();
        let mut obj = Map::with_capacity(3);
        obj.insert(name.to_string(), Value::from(self.name.as_str()));
        obj.insert(ingredients.to_string(), Value::from(self.ingredients.clone()));
        obj.insert(preparation.to_string(), Value::from(self.preparation.as_str()));
        Value::Object(obj)
    }
}

fn text_field(obj: &Map<String, Value>, field: RecipeField) -> Result<String, ValidationError> {
    recipe_field(obj, field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ValidationError::WrongFieldType {
            field,
            expected: field.expected(),
        })
}

/// What a meal slot holds: an embedded [`Recipe`] or a recipe name.
pub trait MealSlot: Sized {
    fn from_entry(entry: &Value) -> Result<Self, ValidationError>;
}

impl MealSlot for Recipe {
    fn from_entry(entry: &Value) -> Result<Self, ValidationError> {
        Recipe::from_value(entry)
    }
}

impl MealSlot for String {
    fn from_entry(entry: &Value) -> Result<Self, ValidationError> {
        entry
            .as_str()
            .map(str::to_string)
            .ok_or(ValidationError::ExpectedRecipeName)
    }
}

/// One day of a plan: the day key and its two meal slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDay<S> {
    pub day: String,
    /// `[midday, evening]`.
    pub meals: [S; 2],
}

/// A weekly plan in input key order.
///
/// `S` is [`Recipe`] for ingredient-constrained plans (embedded recipes) and
/// `String` for batch plans (recipe names selected from a collection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPlan<S> {
    pub days: Vec<PlanDay<S>>,
}

impl<S: MealSlot> WeeklyPlan<S> {
    /// Build a typed plan from a validated plan object.
    ///
    /// Only the first two entries of each day are kept; extra entries are
    /// tolerated by validation and ignored here.
    pub fn from_map(plan: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut days = Vec::with_capacity(plan.len());
        for (day, meals) in plan {
            let entries = match meals.as_array() {
                Some(entries) if entries.len() >= 2 => entries,
                other => {
                    return Err(ValidationError::IncompleteDay {
                        day: day.clone(),
                        found: other.map_or(0, Vec::len),
                    });
                }
            };
            let lunch = decode_slot(day, 0, &entries[0])?;
            let dinner = decode_slot(day, 1, &entries[1])?;
            days.push(PlanDay {
                day: day.clone(),
                meals: [lunch, dinner],
            });
        }
        Ok(Self { days })
    }
}

impl<S> WeeklyPlan<S> {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl WeeklyPlan<Recipe> {
    /// Render as a day -> `[lunch, dinner]` object, recipes keyed in
    /// `locale`'s spelling, days in plan order.
    pub fn to_value(&self, locale: DayLocale) -> Value {
        let days = self
            .days
            .iter()
            .map(|day| {
                let meals = day.meals.iter().map(|r| r.to_value(locale)).collect();
                (day.day.clone(), Value::Array(meals))
            })
            .collect();
        Value::Object(days)
    }
}

fn decode_slot<S: MealSlot>(day: &str, slot: usize, entry: &Value) -> Result<S, ValidationError> {
    S::from_entry(entry).map_err(|e| ValidationError::InvalidMeal {
        day: day.to_string(),
        slot,
        entry: entry.to_string(),
        source: Box::new(e),
    })
}

/// Decode a validated recipe collection.
pub fn recipes_from_value(value: &Value) -> Result<Vec<Recipe>, ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotAnArray {
        what: "the recipe collection",
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Recipe::from_value(item).map_err(|e| ValidationError::InvalidBatchEntry {
                index,
                entry: item.to_string(),
                source: Box::new(e),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::validate::is_valid_weekly_plan;
    use serde_json::json;

    #[test]
    fn recipe_accepts_portuguese_keys() {
        let value = json!({
            "nome": "Arroz com feijão",
            "ingredientes": ["arroz", "feijão"],
            "modo_preparo": "Cozinhe tudo.",
            "tempo": "30 min"
        });
        let recipe = Recipe::from_value(&value).unwrap();
        assert_eq!(recipe.name, "Arroz com feijão");
        assert_eq!(recipe.ingredients, vec!["arroz", "feijão"]);
        assert_eq!(recipe.preparation, "Cozinhe tudo.");
    }

    #[test]
    fn recipe_with_both_spellings_prefers_english() {
        let value = json!({
            "name": "A",
            "nome": "B",
            "ingredients": ["x"],
            "modo_preparo": "p"
        });
        let recipe = Recipe::from_value(&value).unwrap();
        assert_eq!(recipe.name, "A");
        assert_eq!(recipe.ingredients, vec!["x"]);
        assert_eq!(recipe.preparation, "p");
    }

    #[test]
    fn recipe_renders_in_locale_spelling() {
        let recipe = Recipe {
            name: "Omelete".to_string(),
            ingredients: vec!["ovo".to_string()],
            preparation: "Bata e frite.".to_string(),
        };
        assert_eq!(
            recipe.to_value(DayLocale::Portuguese),
            json!({"nome": "Omelete", "ingredientes": ["ovo"], "modo_preparo": "Bata e frite."})
        );
        assert_eq!(
            recipe.to_value(DayLocale::English),
            json!({"name": "Omelete", "ingredients": ["ovo"], "preparation": "Bata e frite."})
        );
    }

    #[test]
    fn plan_accepted_by_validator_converts_with_dual_keys() {
        let dual = json!({"name": "A", "nome": "A", "ingredients": ["x"], "preparation": "p"});
        let value = json!({"Segunda": [dual.clone(), dual]});
        assert!(is_valid_weekly_plan(&value));

        let plan = WeeklyPlan::<Recipe>::from_map(value.as_object().unwrap()).unwrap();
        assert_eq!(plan.days[0].meals[1].name, "A");
        assert_eq!(
            plan.to_value(DayLocale::Portuguese),
            json!({"Segunda": [
                {"nome": "A", "ingredientes": ["x"], "modo_preparo": "p"},
                {"nome": "A", "ingredientes": ["x"], "modo_preparo": "p"}
            ]})
        );
    }

    #[test]
    fn selection_plan_keeps_day_order_and_first_two_slots() {
        let value = json!({
            "Sexta": ["Peixe", "Sopa", "Extra"],
            "Segunda": ["Arroz", "Omelete"]
        });
        let plan = WeeklyPlan::<String>::from_map(value.as_object().unwrap()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.days[0].day, "Sexta");
        assert_eq!(plan.days[0].meals, ["Peixe".to_string(), "Sopa".to_string()]);
        assert_eq!(plan.days[1].day, "Segunda");
    }

    #[test]
    fn short_day_is_rejected() {
        let value = json!({"Segunda": ["Arroz"]});
        let err = WeeklyPlan::<String>::from_map(value.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::IncompleteDay { found: 1, .. }));
    }

    #[test]
    fn recipe_collection_reports_bad_index() {
        let value = json!([
            {"name": "A", "ingredients": [], "preparation": "p"},
            {"name": "B", "ingredients": "x"}
        ]);
        assert!(matches!(
            recipes_from_value(&value),
            Err(ValidationError::InvalidBatchEntry { index: 1, .. })
        ));
    }
}
