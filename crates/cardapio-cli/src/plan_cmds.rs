//! CLI handlers for the two plan-generating commands.
//!
//! Implements:
//! - `cardapio recipes [--count N]`                      -- batch mode
//! - `cardapio ingredients [--items a,b] [--allow-extras|--no-extras]` -- ingredient mode

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

use cardapio_core::prompt::PANTRY_STAPLES;
use cardapio_core::{AssemblyReport, PlanAssembler};

// -----------------------------------------------------------------------
// cardapio recipes
// -----------------------------------------------------------------------

/// Generate a recipe collection, pick a week from it, and print a summary.
pub async fn run_recipes(assembler: &PlanAssembler, count: usize) -> Result<()> {
    println!(
        "Generating {count} recipes with {}...",
        assembler.client().model()
    );
    let report = assembler
        .run_batch(count)
        .await
        .context("failed to generate the weekly menu")?;
    print_report(&report, &mut std::io::stdout())?;
    Ok(())
}

// -----------------------------------------------------------------------
// cardapio ingredients
// -----------------------------------------------------------------------

/// Build a week from the user's ingredients.
///
/// Whatever was not given as a flag is asked for on stdin. An empty
/// ingredient list aborts before any request.
pub async fn run_ingredients(
    assembler: &PlanAssembler,
    items: Option<Vec<String>>,
    allow_extras: Option<bool>,
) -> Result<()> {
    let (ingredients, allow_extras) = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        collect_input(&mut input, &mut output, items, allow_extras)?
    };

    println!(
        "Building a weekly menu from {} ingredient(s)...",
        ingredients.len()
    );
    let report = assembler
        .run_ingredient_plan(&ingredients, allow_extras)
        .await
        .context("failed to generate the weekly menu")?;
    print_report(&report, &mut std::io::stdout())?;
    Ok(())
}

/// Resolve the ingredient list and the staples flag, asking for each one
/// that is `None`. The staples question is skipped when the list is empty.
pub fn collect_input<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    items: Option<Vec<String>>,
    allow_extras: Option<bool>,
) -> Result<(Vec<String>, bool)> {
    let ingredients = match items {
        Some(items) => clean_items(items),
        None => parse_ingredients(&ask(
            input,
            output,
            "Enter the available ingredients (comma-separated): ",
        )?),
    };
    if ingredients.is_empty() {
        bail!("no ingredients given; nothing to plan");
    }

    let allow_extras = match allow_extras {
        Some(flag) => flag,
        None => parse_yes(&ask(
            input,
            output,
            &format!(
                "Allow basic extra ingredients ({})? (y/n): ",
                PANTRY_STAPLES.join(", ")
            ),
        )?),
    };
    Ok((ingredients, allow_extras))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read from stdin")?;
    Ok(line)
}

/// Split a comma-separated line into trimmed, non-empty ingredients.
pub fn parse_ingredients(line: &str) -> Vec<String> {
    clean_items(line.split(',').map(str::to_string))
}

fn clean_items(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Whether an answer means yes: it starts with `s` (sim) or `y`.
pub fn parse_yes(answer: &str) -> bool {
    matches!(
        answer.trim().chars().next().map(|c| c.to_ascii_lowercase()),
        Some('s' | 'y')
    )
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

pub fn print_report<W: Write>(report: &AssemblyReport, out: &mut W) -> Result<()> {
    let days = report.plan.as_object().map_or(0, |plan| plan.len());
    writeln!(out, "Weekly menu ready: {days} day(s).")?;
    writeln!(out, "Files written:")?;
    for path in &report.files {
        writeln!(out, "  {}", path.display())?;
    }
    writeln!(out, "Shopping list:")?;
    for (ingredient, count) in report.shopping_list.iter() {
        writeln!(out, "  - {ingredient}: {count}")?;
    }
    Ok(())
}
