//! Configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use parley_ai::{BackendProfile, ProfileRouter};

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV_VAR: &str = "PARLEY_CONFIG_PATH";

/// Starter configuration written by `--init-config`
pub const EXAMPLE_CONFIG: &str = r#"# parley configuration

# Profile used when none is named on the command line
default_profile = "default"

# API key for the backend; the PARLEY_API_KEY environment variable is used
# when this is absent
# api_key = "sk-..."

# Extra rule text appended to the system prompt on every turn
# rules = "Answer concisely."

[profiles.default]
endpoint = "https://api.openai.com/v1"
model = "gpt-4o-mini"
streaming = true

[profiles.grader]
endpoint = "https://api.openai.com/v1"
model = "gpt-4o"
temperature = 0.0
streaming = false
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Profile key used when the command line names none
    #[serde(default = "default_profile_key")]
    pub default_profile: String,

    /// API key; falls back to the environment when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Rule text appended to the system prompt on every turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    /// Named backend profiles
    #[serde(default)]
    pub profiles: HashMap<String, BackendProfile>,
}

fn default_profile_key() -> String {
    "default".to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("parley");
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            anyhow::bail!(
                "No config file at {}. Run with --init-config to create one.",
                path.display()
            );
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write the starter config, refusing to clobber an existing file
    pub fn init() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn router(&self) -> ProfileRouter {
        ProfileRouter::new(self.profiles.clone())
    }
}
