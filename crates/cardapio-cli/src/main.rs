mod config;
mod plan_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand};

use cardapio_core::assemble::DEFAULT_RECIPE_COUNT;
use cardapio_core::llm::{GeminiBackend, ModelClient};
use cardapio_core::{OutputDir, PlanAssembler};

use config::{AppConfig, CliOverrides};

#[derive(Parser)]
#[command(name = "cardapio", about = "Weekly meal plans generated by Gemini")]
struct Cli {
    /// Gemini API key (overrides GEMINI_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name (overrides CARDAPIO_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Output directory (overrides CARDAPIO_OUTPUT_DIR env var)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cardapio config file holding the API key (no network access)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a recipe collection and pick a week of meals from it
    Recipes {
        /// Number of recipes to generate
        #[arg(long, default_value_t = DEFAULT_RECIPE_COUNT)]
        count: usize,
    },
    /// Build a week of meals from the ingredients you have
    Ingredients {
        /// Comma-separated ingredients (asked on stdin when omitted)
        #[arg(long, value_delimiter = ',')]
        items: Option<Vec<String>>,
        /// Allow basic pantry staples besides the listed ingredients
        #[arg(long, overrides_with = "no_extras")]
        allow_extras: bool,
        /// Use only the listed ingredients
        #[arg(long, overrides_with = "allow_extras")]
        no_extras: bool,
    },
    /// Serve the ingredient flow over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },
    /// Print shell completions to stdout
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// The staples choice from the flag pair; `None` when neither was given.
fn extras_choice(allow_extras: bool, no_extras: bool) -> Option<bool> {
    match (allow_extras, no_extras) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Show the first and last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Execute the `cardapio init` command: write config file.
fn cmd_init(cli: &CliOverrides, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let Some(api_key) = cli.api_key.clone() else {
        bail!("`cardapio init` needs --api-key <KEY>");
    };

    let mut cfg = config::ConfigFile::default();
    cfg.gemini.api_key = Some(api_key.clone());
    cfg.gemini.model = cli.model.clone();
    cfg.output.dir = cli.output_dir.clone();

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  gemini.api_key = {}", mask_secret(&api_key));
    if let Some(model) = &cfg.gemini.model {
        println!("  gemini.model = {model}");
    }
    if let Some(dir) = &cfg.output.dir {
        println!("  output.dir = {}", dir.display());
    }
    println!();
    println!("Next: run `cardapio recipes` or `cardapio ingredients`.");

    Ok(())
}

/// Build the Gemini-backed assembler from resolved configuration.
fn build_assembler(config: &AppConfig) -> anyhow::Result<PlanAssembler> {
    let backend =
        GeminiBackend::new(config.gemini.clone()).context("failed to build the Gemini client")?;
    let client = ModelClient::new(Arc::new(backend), config.model.clone(), config.retry);
    Ok(PlanAssembler::new(
        client,
        OutputDir::new(&config.output_dir, config.locale),
    ))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        output_dir: cli.output_dir,
    };

    match cli.command {
        Commands::Init { force } => cmd_init(&overrides, force)?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cardapio",
                &mut std::io::stdout(),
            );
        }
        Commands::Recipes { count } => {
            let resolved = AppConfig::resolve(&overrides)?;
            let assembler = build_assembler(&resolved)?;
            plan_cmds::run_recipes(&assembler, count).await?;
        }
        Commands::Ingredients {
            items,
            allow_extras,
            no_extras,
        } => {
            let resolved = AppConfig::resolve(&overrides)?;
            let assembler = build_assembler(&resolved)?;
            let extras = extras_choice(allow_extras, no_extras);
            plan_cmds::run_ingredients(&assembler, items, extras).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = AppConfig::resolve(&overrides)?;
            let assembler = build_assembler(&resolved)?;
            serve_cmd::run_serve(assembler, &bind, port).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}
