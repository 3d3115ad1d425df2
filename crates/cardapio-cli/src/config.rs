//! Configuration file management for cardapio.
//!
//! Provides a TOML-based config file at `~/.config/cardapio/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use cardapio_core::DayLocale;
use cardapio_core::emit::DEFAULT_OUTPUT_DIR;
use cardapio_core::llm::{GeminiConfig, RetryPolicy};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "CARDAPIO_MODEL";
pub const ENDPOINT_ENV: &str = "CARDAPIO_ENDPOINT";
pub const OUTPUT_DIR_ENV: &str = "CARDAPIO_OUTPUT_DIR";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub gemini: GeminiSection,
    pub retry: RetrySection,
    pub output: OutputSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_backoff_secs: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<DayLocale>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the cardapio config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/cardapio` or `~/.config/cardapio`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("cardapio");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cardapio")
}

/// Return the path to the cardapio config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file holds the API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied as global CLI flags.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub model: String,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
    pub locale: DayLocale,
}

/// An environment variable, with empty values treated as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// A config file that exists but cannot be parsed is an error; a missing
    /// one is not. A missing API key is an error.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = if config_path().exists() {
            load_config()?
        } else {
            ConfigFile::default()
        };
        Self::resolve_with(cli, file)
    }

    pub fn resolve_with(cli: &CliOverrides, file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            gemini,
            retry,
            output,
        } = file;

        let Some(api_key) = cli
            .api_key
            .clone()
            .or_else(|| env_var(API_KEY_ENV))
            .or(gemini.api_key)
        else {
            bail!(
                "Gemini API key not found; set {API_KEY_ENV}, pass --api-key, or run `cardapio init --api-key <KEY>`"
            );
        };

        let model = cli
            .model
            .clone()
            .or_else(|| env_var(MODEL_ENV))
            .or(gemini.model)
            .unwrap_or_else(|| GeminiConfig::DEFAULT_MODEL.to_string());

        let mut gemini_config = GeminiConfig::new(api_key);
        if let Some(endpoint) = env_var(ENDPOINT_ENV).or(gemini.endpoint) {
            gemini_config.endpoint = endpoint;
        }
        if let Some(secs) = gemini.timeout_secs {
            gemini_config.timeout = Duration::from_secs(secs);
        }

        let mut policy = RetryPolicy::default();
        if let Some(attempts) = retry.max_attempts {
            policy.max_attempts = attempts;
        }
        if let Some(secs) = retry.base_backoff_secs {
            policy.base_backoff = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid retry.base_backoff_secs: {secs}"))?;
        }

        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| env_var(OUTPUT_DIR_ENV).map(PathBuf::from))
            .or(output.dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            gemini: gemini_config,
            model,
            retry: policy,
            output_dir,
            locale: output.locale.unwrap_or_default(),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
