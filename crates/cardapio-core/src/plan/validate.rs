//! Structural validation of decoded model output.
//!
//! Checks run on raw [`serde_json::Value`]s, before any typed conversion, so
//! a failure can point at the exact offending entry:
//! - [`validate_recipe`]: an object with `name`, `ingredients` and
//!   `preparation` (or `nome`, `ingredientes`, `modo_preparo`).
//! - [`validate_weekly_plan`]: every day holds at least two valid recipes.
//! - [`validate_recipe_batch`]: a non-empty array of valid recipes.
//! - [`validate_selection`]: every day holds at least two recipe names.
//! - [`check_day_keys`]: every key is a canonical day of the target locale.
//!
//! All checks are fail-fast: the first problem found is returned.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::locale::DayLocale;

/// The three required recipe fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeField {
    Name,
    Ingredients,
    Preparation,
}

impl RecipeField {
    pub const ALL: [RecipeField; 3] = [
        RecipeField::Name,
        RecipeField::Ingredients,
        RecipeField::Preparation,
    ];

    /// Accepted keys for this field, preferred spelling first.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            RecipeField::Name => &["name", "nome"],
            RecipeField::Ingredients => &["ingredients", "ingredientes"],
            RecipeField::Preparation => &["preparation", "modo_preparo"],
        }
    }

    pub(crate) fn expected(self) -> &'static str {
        match self {
            RecipeField::Ingredients => "an array of strings",
            _ => "a string",
        }
    }
}

impl std::fmt::Display for RecipeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keys()[0])
    }
}

/// Why a decoded value does not match the expected shape.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("expected a JSON object for {what}")]
    NotAnObject { what: &'static str },

    #[error("expected a JSON array for {what}")]
    NotAnArray { what: &'static str },

    #[error("missing required field `{field}`")]
    MissingField { field: RecipeField },

    #[error("field `{field}` must be {expected}")]
    WrongFieldType {
        field: RecipeField,
        expected: &'static str,
    },

    #[error("recipe name is empty")]
    EmptyName,

    #[error("expected a recipe name")]
    ExpectedRecipeName,

    #[error("day {day:?} is incomplete: expected at least 2 meals, found {found}")]
    IncompleteDay { day: String, found: usize },

    #[error("invalid {} on {day:?}: {source} (entry: {entry})", slot_name(*.slot))]
    InvalidMeal {
        day: String,
        slot: usize,
        entry: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("invalid recipe at index {index}: {source} (entry: {entry})")]
    InvalidBatchEntry {
        index: usize,
        entry: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("recipe collection is empty")]
    EmptyRecipeBatch,

    #[error("plan has no days")]
    EmptyPlan,

    #[error("unknown day {day:?} (expected one of: {expected})")]
    UnknownDay { day: String, expected: String },
}

fn slot_name(slot: usize) -> &'static str {
    match slot {
        0 => "lunch",
        1 => "dinner",
        _ => "meal",
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// Look up a recipe field under any of its accepted keys.
pub fn recipe_field<'a>(obj: &'a Map<String, Value>, field: RecipeField) -> Option<&'a Value> {
    field.keys().iter().find_map(|key| obj.get(*key))
}

/// Check that `value` is a recipe object. Extra fields are tolerated.
pub fn validate_recipe(value: &Value) -> Result<(), ValidationError> {
    let obj = value
        .as_object()
        .ok_or(ValidationError::NotAnObject { what: "a recipe" })?;

    for field in RecipeField::ALL {
        let found = recipe_field(obj, field).ok_or(ValidationError::MissingField { field })?;
        let well_typed = match field {
            RecipeField::Ingredients => found
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            RecipeField::Name | RecipeField::Preparation => found.is_string(),
        };
        if !well_typed {
            return Err(ValidationError::WrongFieldType {
                field,
                expected: field.expected(),
            });
        }
    }

    let name = recipe_field(obj, RecipeField::Name)
        .and_then(Value::as_str)
        .unwrap_or_default();
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    Ok(())
}

/// Boolean form of [`validate_recipe`]; logs the reason on failure.
pub fn is_valid_recipe(value: &Value) -> bool {
    match validate_recipe(value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "invalid recipe");
            false
        }
    }
}

/// Check a batch of generated recipes: a non-empty array of valid recipes.
pub fn validate_recipe_batch(value: &Value) -> Result<(), ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotAnArray {
        what: "the recipe collection",
    })?;
    if items.is_empty() {
        return Err(ValidationError::EmptyRecipeBatch);
    }
    for (index, item) in items.iter().enumerate() {
        validate_recipe(item).map_err(|e| ValidationError::InvalidBatchEntry {
            index,
            entry: item.to_string(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Check that every day of `value` holds at least two valid recipes.
///
/// Only the first two entries of a day are inspected; further entries are
/// ignored.
pub fn validate_weekly_plan(value: &Value) -> Result<(), ValidationError> {
    validate_days(value, "the weekly plan", validate_recipe)
}

/// Boolean form of [`validate_weekly_plan`]; logs the reason on failure.
pub fn is_valid_weekly_plan(value: &Value) -> bool {
    match validate_weekly_plan(value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "invalid weekly plan");
            false
        }
    }
}

/// Check a batch-mode selection: every day holds at least two recipe names.
pub fn validate_selection(value: &Value) -> Result<(), ValidationError> {
    validate_days(value, "the meal selection", |entry| match entry.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::ExpectedRecipeName),
    })
}

fn validate_days<F>(value: &Value, what: &'static str, check: F) -> Result<(), ValidationError>
where
    F: Fn(&Value) -> Result<(), ValidationError>,
{
    let days = value
        .as_object()
        .ok_or(ValidationError::NotAnObject { what })?;

    for (day, meals) in days {
        let entries = match meals.as_array() {
            Some(entries) if entries.len() >= 2 => entries,
            other => {
                return Err(ValidationError::IncompleteDay {
                    day: day.clone(),
                    found: other.map_or(0, Vec::len),
                });
            }
        };
        for (slot, entry) in entries.iter().take(2).enumerate() {
            check(entry).map_err(|e| ValidationError::InvalidMeal {
                day: day.clone(),
                slot,
                entry: entry.to_string(),
                source: Box::new(e),
            })?;
        }
    }
    Ok(())
}

/// Check that the plan has at least one day and that every key is the
/// canonical spelling of a weekday in `locale`.
pub fn check_day_keys(plan: &Map<String, Value>, locale: DayLocale) -> Result<(), ValidationError> {
    if plan.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }
    match plan.keys().find(|key| !locale.is_canonical(key)) {
        Some(day) => Err(ValidationError::UnknownDay {
            day: day.clone(),
            expected: locale.day_names().join(", "),
        }),
        None => Ok(()),
    }
}
