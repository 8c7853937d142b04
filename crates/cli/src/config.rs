//! # CLI Configuration
//!
//! Loads `AppConfig` from built-in defaults, an optional `lumascan.yml` and the
//! environment. Later layers win:
//!
//! - Any field can be set with `LUMASCAN__<FIELD>` (e.g. `LUMASCAN__CALLBACK_PORT`).
//! - `LUMASCAN_API_URL`, `LUMASCAN_API_PREFIX`, `LUMASCAN_STATE_DIR`, `SUPABASE_URL` and
//!   `SUPABASE_ANON_KEY` are read by name and take precedence over everything else.
//! - `${VAR}` references inside the YAML file are expanded from the environment.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE_NAME: &str = "lumascan.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(String),
    /// A file passed with `--config` does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Base URL of the resume analysis service.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Route prefix of the upload and match endpoints: `""` or `"api"`.
    #[serde(default)]
    pub api_prefix: String,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Port of the local OAuth callback server.
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    /// Where the session and the last resume are kept between runs.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    lumascan::constants::DEFAULT_API_URL.to_string()
}

fn default_callback_port() -> u16 {
    5173
}

impl AppConfig {
    /// Both Supabase settings, when both are present and non-empty.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref().filter(|v| !v.is_empty())?;
        let key = self.supabase_anon_key.as_deref().filter(|v| !v.is_empty())?;
        Some((url, key))
    }

    /// The configured state directory, else `~/.lumascan`, else `./.lumascan`.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".lumascan")))
            .unwrap_or_else(|| PathBuf::from(".lumascan"))
    }

    /// The redirect target registered with the identity provider.
    pub fn callback_url(&self) -> String {
        format!("http://127.0.0.1:{}/auth/callback", self.callback_port)
    }
}

// Reads a file and expands `${VAR}` references. Ok(None) if the file does not exist.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded.to_string()))
}

/// Loads the configuration.
///
/// `config_path_override` must exist when given; otherwise `lumascan.yml` in the
/// working directory is used if present.
pub fn get_config(config_path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Built-in defaults.
        .set_default("api_url", default_api_url())?
        .set_default("api_prefix", "")?
        .set_default("callback_port", i64::from(default_callback_port()))?;

    // Layer 2: The YAML file, if any.
    let file_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{}'.", path.display()))
        })?),
        None => read_and_substitute(Path::new(CONFIG_FILE_NAME))?,
    };
    if let Some(content) = file_content {
        info!("Loaded configuration file.");
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    // Layer 4: Well-known variables, read by name. Overrides beat every source.
    for (var, key) in [
        ("LUMASCAN_API_URL", "api_url"),
        ("LUMASCAN_API_PREFIX", "api_prefix"),
        ("SUPABASE_URL", "supabase_url"),
        ("SUPABASE_ANON_KEY", "supabase_anon_key"),
        ("LUMASCAN_STATE_DIR", "state_dir"),
    ] {
        if let Ok(value) = env::var(var) {
            if !value.is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    let settings = builder
        // Layer 3: Prefixed variables for any field.
        .add_source(
            Environment::with_prefix("LUMASCAN")
                .prefix_separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
