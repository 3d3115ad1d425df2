//! Plan assembly: prompt, call, sanitize, decode, validate, aggregate, emit.
//!
//! Each flow walks a fixed sequence of [`Stage`]s and logs every transition
//! at `debug`. A failure in any stage ends the run; files already written by
//! earlier stages stay on disk.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::emit::{EmitError, OutputDir};
use crate::llm::ModelClient;
use crate::llm::ModelError;
use crate::locale::{DayLocale, normalize_plan_keys};
use crate::plan::{
    Recipe, ShoppingList, ValidationError, WeeklyPlan, aggregate_embedded, aggregate_selected,
    check_day_keys, recipes_from_value, validate_recipe_batch, validate_selection,
    validate_weekly_plan,
};
use crate::prompt::{ingredient_plan_prompt, recipe_batch_prompt, selection_prompt};
use crate::sanitize::sanitize;

/// Default size of the recipe collection generated in batch mode.
pub const DEFAULT_RECIPE_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Stages and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildingPrompt,
    AwaitingResponse,
    Sanitizing,
    Decoding,
    Normalizing,
    Validating,
    Aggregating,
    Emitting,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::BuildingPrompt => "building_prompt",
            Stage::AwaitingResponse => "awaiting_response",
            Stage::Sanitizing => "sanitizing",
            Stage::Decoding => "decoding",
            Stage::Normalizing => "normalizing",
            Stage::Validating => "validating",
            Stage::Aggregating => "aggregating",
            Stage::Emitting => "emitting",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("no ingredients supplied")]
    EmptyIngredients,

    #[error(transparent)]
    Transport(#[from] ModelError),

    /// The sanitized reply is not JSON. `text` is the reply as received.
    #[error("model reply is not valid JSON: {source}")]
    Decode {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{artifact} failed validation: {source}")]
    Schema {
        artifact: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl AssembleError {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            AssembleError::EmptyIngredients => Stage::BuildingPrompt,
            AssembleError::Transport(_) => Stage::AwaitingResponse,
            AssembleError::Decode { .. } => Stage::Decoding,
            AssembleError::Schema { .. } => Stage::Validating,
            AssembleError::Emit(_) => Stage::Emitting,
        }
    }

    /// Transport failures may succeed on a later run; the rest are terminal
    /// for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssembleError::Transport(_))
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// The plan exactly as written to `cardapio_final.json`. Embedded
    /// recipes are keyed in the output locale's spelling.
    pub plan: Value,
    pub shopping_list: ShoppingList,
    /// Every file written by the run, in write order.
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Drives both request flows against one model client and output directory.
#[derive(Debug, Clone)]
pub struct PlanAssembler {
    client: ModelClient,
    output: OutputDir,
}

/// Logs stage transitions for one flow.
struct Progress {
    flow: &'static str,
    stage: Stage,
}

impl Progress {
    fn start(flow: &'static str) -> Self {
        debug!(flow, stage = %Stage::BuildingPrompt, "stage");
        Self {
            flow,
            stage: Stage::BuildingPrompt,
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!(flow = self.flow, from = %self.stage, stage = %stage, "stage");
        self.stage = stage;
    }
}

impl PlanAssembler {
    pub fn new(client: ModelClient, output: OutputDir) -> Self {
        Self { client, output }
    }

    pub fn client(&self) -> &ModelClient {
        &self.client
    }

    pub fn locale(&self) -> DayLocale {
        self.output.locale()
    }

    /// Ingredient-constrained mode: one request for a full week of embedded
    /// recipes built from `ingredients`.
    ///
    /// Blank entries are dropped; an empty list fails before any request.
    pub async fn run_ingredient_plan(
        &self,
        ingredients: &[String],
        allow_extras: bool,
    ) -> Result<AssemblyReport, AssembleError> {
        self.ingredient_plan(ingredients, allow_extras)
            .await
            .inspect_err(|e| log_failure("ingredient_plan", e))
    }

    /// Batch mode: generate `count` recipes, then ask the model to assign
    /// them by name to every day of the week.
    ///
    /// `receitas.json` is written after the first stage and survives a
    /// failure of the second.
    pub async fn run_batch(&self, count: usize) -> Result<AssemblyReport, AssembleError> {
        self.batch(count)
            .await
            .inspect_err(|e| log_failure("batch", e))
    }

    async fn ingredient_plan(
        &self,
        ingredients: &[String],
        allow_extras: bool,
    ) -> Result<AssemblyReport, AssembleError> {
        let locale = self.locale();
        let ingredients: Vec<String> = ingredients
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if ingredients.is_empty() {
            return Err(AssembleError::EmptyIngredients);
        }

        let mut progress = Progress::start("ingredient_plan");
        let prompt = ingredient_plan_prompt(&ingredients, allow_extras, locale);
        let text = self.request(&mut progress, &prompt).await?;
        let mut files = vec![self.output.write_raw_response(&text)?];
        let value = decode(&mut progress, &text)?;

        progress.enter(Stage::Normalizing);
        let value = match value {
            Value::Object(map) => Value::Object(normalize_plan_keys(map, locale)),
            other => other,
        };

        progress.enter(Stage::Validating);
        let plan = validate_ingredient_plan(&value, locale).map_err(|source| {
            AssembleError::Schema {
                artifact: "weekly plan",
                source,
            }
        })?;

        progress.enter(Stage::Aggregating);
        let shopping_list = aggregate_embedded(&plan);

        progress.enter(Stage::Emitting);
        let plan_json = plan.to_value(locale);
        files.extend(self.output.write_embedded_days(&plan)?);
        files.push(self.output.write_plan_json(&plan_json)?);
        files.push(self.output.write_shopping_list(&shopping_list)?);

        progress.enter(Stage::Done);
        info!(
            days = plan.len(),
            ingredients = shopping_list.len(),
            files = files.len(),
            "weekly plan assembled"
        );
        Ok(AssemblyReport {
            plan: plan_json,
            shopping_list,
            files,
        })
    }

    async fn batch(&self, count: usize) -> Result<AssemblyReport, AssembleError> {
        let locale = self.locale();

        // Stage 1: the recipe collection.
        let mut progress = Progress::start("recipe_batch");
        let text = self
            .request(&mut progress, &recipe_batch_prompt(count, locale))
            .await?;
        let value = decode(&mut progress, &text)?;

        progress.enter(Stage::Validating);
        let recipes = validate_recipe_batch(&value)
            .and_then(|()| recipes_from_value(&value))
            .map_err(|source| AssembleError::Schema {
                artifact: "recipe collection",
                source,
            })?;

        progress.enter(Stage::Emitting);
        let mut files = vec![self.output.write_recipes_json(&value)?];
        progress.enter(Stage::Done);
        info!(recipes = recipes.len(), "recipe collection generated");

        // Stage 2: the weekly selection.
        let names: Vec<String> = recipes.iter().map(|r| r.name.clone()).collect();
        let mut progress = Progress::start("selection");
        let text = self
            .request(&mut progress, &selection_prompt(&names, locale))
            .await?;
        let selection = decode(&mut progress, &text)?;

        progress.enter(Stage::Validating);
        let plan = validate_selection_plan(&selection).map_err(|source| AssembleError::Schema {
            artifact: "meal selection",
            source,
        })?;

        progress.enter(Stage::Aggregating);
        let shopping_list = aggregate_selected(&plan, &recipes);

        progress.enter(Stage::Emitting);
        files.extend(self.output.write_selected_days(&plan, &recipes)?);
        files.push(self.output.write_plan_json(&selection)?);
        files.push(self.output.write_shopping_list(&shopping_list)?);

        progress.enter(Stage::Done);
        info!(
            days = plan.len(),
            ingredients = shopping_list.len(),
            files = files.len(),
            "weekly selection assembled"
        );
        Ok(AssemblyReport {
            plan: selection,
            shopping_list,
            files,
        })
    }

    /// Send `prompt` and return the sanitized reply.
    async fn request(&self, progress: &mut Progress, prompt: &str) -> Result<String, AssembleError> {
        progress.enter(Stage::AwaitingResponse);
        let reply = self.client.generate(prompt).await?;
        progress.enter(Stage::Sanitizing);
        Ok(sanitize(&reply))
    }
}

fn decode(progress: &mut Progress, text: &str) -> Result<Value, AssembleError> {
    progress.enter(Stage::Decoding);
    serde_json::from_str(text).map_err(|source| {
        error!(error = %source, text = %text, "model reply is not valid JSON");
        AssembleError::Decode {
            text: text.to_string(),
            source,
        }
    })
}

fn validate_ingredient_plan(
    value: &Value,
    locale: DayLocale,
) -> Result<WeeklyPlan<Recipe>, ValidationError> {
    validate_weekly_plan(value)?;
    let map = value.as_object().ok_or(ValidationError::NotAnObject {
        what: "the weekly plan",
    })?;
    check_day_keys(map, locale)?;
    WeeklyPlan::from_map(map)
}

fn validate_selection_plan(value: &Value) -> Result<WeeklyPlan<String>, ValidationError> {
    validate_selection(value)?;
    let map = value.as_object().ok_or(ValidationError::NotAnObject {
        what: "the meal selection",
    })?;
    if map.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }
    WeeklyPlan::from_map(map)
}

fn log_failure(flow: &'static str, err: &AssembleError) {
    error!(
        flow,
        stage = %err.stage(),
        retryable = err.is_retryable(),
        error = %err,
        "plan assembly failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TransportError;
    use serde_json::json;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::BuildingPrompt.to_string(), "building_prompt");
        assert_eq!(Stage::AwaitingResponse.to_string(), "awaiting_response");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn errors_report_their_stage() {
        let transport = AssembleError::Transport(ModelError {
            attempts: 3,
            last: TransportError::Http("down".to_string()),
        });
        assert_eq!(transport.stage(), Stage::AwaitingResponse);
        assert!(transport.is_retryable());

        let decode = AssembleError::Decode {
            text: "nope".to_string(),
            source: serde_json::from_str::<Value>("nope").unwrap_err(),
        };
        assert_eq!(decode.stage(), Stage::Decoding);
        assert!(!decode.is_retryable());

        let schema = AssembleError::Schema {
            artifact: "weekly plan",
            source: ValidationError::EmptyPlan,
        };
        assert_eq!(schema.stage(), Stage::Validating);
        assert_eq!(schema.to_string(), "weekly plan failed validation: plan has no days");

        assert_eq!(AssembleError::EmptyIngredients.stage(), Stage::BuildingPrompt);
    }

    fn recipe(name: &str) -> Value {
        json!({"name": name, "ingredients": ["a"], "preparation": "p"})
    }

    #[test]
    fn ingredient_plan_rejects_unknown_day() {
        let value = json!({"Segunda": [recipe("A"), recipe("B")], "Someday": [recipe("C"), recipe("D")]});
        let err = validate_ingredient_plan(&value, DayLocale::Portuguese).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownDay { ref day, .. } if day == "Someday"));
    }

    #[test]
    fn ingredient_plan_rejects_empty_object() {
        let err = validate_ingredient_plan(&json!({}), DayLocale::Portuguese).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyPlan));
    }

    #[test]
    fn ingredient_plan_builds_typed_days() {
        let value = json!({"Monday": [recipe("A"), recipe("B")]});
        let plan = validate_ingredient_plan(&value, DayLocale::English).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.days[0].meals[1].name, "B");
    }

    #[test]
    fn selection_plan_requires_days() {
        assert!(matches!(
            validate_selection_plan(&json!({})).unwrap_err(),
            ValidationError::EmptyPlan
        ));
        let plan = validate_selection_plan(&json!({"Segunda": ["A", "B", "C"]})).unwrap();
        assert_eq!(plan.days[0].meals, ["A".to_string(), "B".to_string()]);
    }
}
