//! File emitters: the persisted artifacts of a run.
//!
//! Everything is written under one output directory (created on demand):
//!
//! | file | content |
//! |---|---|
//! | `<day>.txt` | the day's two meals, one file per day, name lower-cased |
//! | `lista_compras_semana.txt` | aggregated shopping list |
//! | `cardapio_final.json` | the validated plan, input key order, 2-space indent |
//! | `cardapio_raw.txt` | the sanitized model reply (ingredient mode) |
//! | `receitas.json` | the generated recipe collection (batch mode) |

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::locale::DayLocale;
use crate::plan::{PlanDay, Recipe, ShoppingList, WeeklyPlan, find_recipe};

pub const DEFAULT_OUTPUT_DIR: &str = "cardapio_semana";
pub const PLAN_JSON_FILE: &str = "cardapio_final.json";
pub const SHOPPING_LIST_FILE: &str = "lista_compras_semana.txt";
pub const RAW_RESPONSE_FILE: &str = "cardapio_raw.txt";
pub const RECIPES_JSON_FILE: &str = "receitas.json";

const RULE_WIDTH: usize = 40;

/// A failed write. Always fatal to the run.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Output directory plus the locale used for labels in text files.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
    locale: DayLocale,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>, locale: DayLocale) -> Self {
        Self {
            root: root.into(),
            locale,
        }
    }

    pub fn locale(&self) -> DayLocale {
        self.locale
    }

    /// Write the sanitized model reply verbatim.
    pub fn write_raw_response(&self, text: &str) -> Result<PathBuf, EmitError> {
        self.write_file(RAW_RESPONSE_FILE, text)
    }

    /// Write the validated plan as pretty JSON.
    pub fn write_plan_json<T: Serialize + ?Sized>(&self, plan: &T) -> Result<PathBuf, EmitError> {
        self.write_json(PLAN_JSON_FILE, plan)
    }

    /// Write the generated recipe collection as pretty JSON.
    pub fn write_recipes_json<T: Serialize + ?Sized>(
        &self,
        recipes: &T,
    ) -> Result<PathBuf, EmitError> {
        self.write_json(RECIPES_JSON_FILE, recipes)
    }

    /// Write one text file per day of a plan with embedded recipes.
    pub fn write_embedded_days(&self, plan: &WeeklyPlan<Recipe>) -> Result<Vec<PathBuf>, EmitError> {
        plan.days
            .iter()
            .map(|day| {
                self.write_file(
                    &day_file_name(&day.day),
                    &render_embedded_day(day, self.locale),
                )
            })
            .collect()
    }

    /// Write one text file per day of a plan selecting recipes by name.
    pub fn write_selected_days(
        &self,
        plan: &WeeklyPlan<String>,
        recipes: &[Recipe],
    ) -> Result<Vec<PathBuf>, EmitError> {
        plan.days
            .iter()
            .map(|day| {
                self.write_file(
                    &day_file_name(&day.day),
                    &render_selected_day(day, recipes, self.locale),
                )
            })
            .collect()
    }

    pub fn write_shopping_list(&self, list: &ShoppingList) -> Result<PathBuf, EmitError> {
        self.write_file(SHOPPING_LIST_FILE, &render_shopping_list(list, self.locale))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf, EmitError> {
        let contents = serde_json::to_string_pretty(value).map_err(|e| EmitError::Serialize {
            path: self.root.join(name),
            source: e,
        })?;
        self.write_file(name, &contents)
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf, EmitError> {
        std::fs::create_dir_all(&self.root).map_err(|e| EmitError::CreateDir {
            path: self.root.clone(),
            source: e,
        })?;
        let path = self.root.join(name);
        std::fs::write(&path, contents).map_err(|e| EmitError::Write {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "file written");
        Ok(path)
    }
}

/// File name for a day: the key lower-cased, path separators replaced.
pub fn day_file_name(day: &str) -> String {
    let stem: String = day
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{stem}.txt")
}

fn rule(c: char) -> String {
    std::iter::repeat_n(c, RULE_WIDTH).collect()
}

fn render_day_header(out: &mut String, day: &str) {
    out.push_str(&format!("📅 {day}\n"));
    out.push_str(&rule('='));
    out.push_str("\n\n");
}

fn render_recipe_block(out: &mut String, heading: &str, recipe: &Recipe, locale: DayLocale) {
    out.push_str(&format!("🍽️ {heading}\n"));
    out.push_str(locale.ingredients_label());
    out.push('\n');
    for ingredient in &recipe.ingredients {
        out.push_str(&format!(" - {ingredient}\n"));
    }
    out.push('\n');
    out.push_str(locale.preparation_label());
    out.push('\n');
    out.push_str(&recipe.preparation);
    out.push_str("\n\n");
    out.push_str(&rule('-'));
    out.push_str("\n\n");
}

/// Day file for an embedded plan: each meal is labelled lunch or dinner.
pub fn render_embedded_day(day: &PlanDay<Recipe>, locale: DayLocale) -> String {
    let mut out = String::new();
    render_day_header(&mut out, &day.day);
    for (label, recipe) in locale.meal_labels().iter().zip(&day.meals) {
        render_recipe_block(&mut out, &format!("{label}: {}", recipe.name), recipe, locale);
    }
    out
}

/// Day file for a selection plan: each resolved recipe under its own name.
/// Names with no matching recipe are left out.
pub fn render_selected_day(day: &PlanDay<String>, recipes: &[Recipe], locale: DayLocale) -> String {
    let mut out = String::new();
    render_day_header(&mut out, &day.day);
    for name in &day.meals {
        if let Some(recipe) = find_recipe(recipes, name) {
            render_recipe_block(&mut out, &recipe.name, recipe, locale);
        }
    }
    out
}

pub fn render_shopping_list(list: &ShoppingList, locale: DayLocale) -> String {
    let mut out = String::new();
    out.push_str(&format!("🛒 {}\n", locale.shopping_list_title()));
    out.push_str(&rule('='));
    out.push_str("\n\n");
    for (ingredient, count) in list.iter() {
        out.push_str(&format!("- {ingredient}: {count}\n"));
    }
    out
}
