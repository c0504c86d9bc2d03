//! TOML configuration: API credentials, output paths and request settings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable that supplies the API key when the file does not.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PLACEHOLDER_KEYS: [&str; 2] = ["YOUR_API_KEY_HERE", "YOUR_GEMINI_API_KEY_HERE"];

/// A model offered in the model list, with a short trade-off note.
#[derive(Debug, Clone, Copy)]
pub struct KnownModel {
    pub name: &'static str,
    pub description: &'static str,
}

pub const KNOWN_MODELS: [KnownModel; 4] = [
    KnownModel {
        name: "gemini-2.5-pro",
        description: "Highest quality; slowest, most likely to hit 503 overload errors",
    },
    KnownModel {
        name: "gemini-2.0-flash-exp",
        description: "Fast experimental model; low chance of 503 errors",
    },
    KnownModel {
        name: "gemini-1.5-pro",
        description: "Balanced speed and quality",
    },
    KnownModel {
        name: "gemini-1.5-flash",
        description: "Fastest; lowest chance of 503 errors",
    },
];

impl KnownModel {
    pub fn find(name: &str) -> Option<&'static KnownModel> {
        KNOWN_MODELS.iter().find(|m| m.name == name)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            prompts_dir: PathBuf::from("./prompts"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub save_debug_artifacts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 65536,
            max_retries: 3,
            request_timeout_secs: 600,
            save_debug_artifacts: true,
        }
    }
}

impl Config {
    /// Load a configuration file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    /// The file contents only, without the environment override. Use this
    /// when the configuration is going to be saved back.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load a configuration file, falling back to defaults when it is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::ConfigNotFound(_)) => {
                tracing::debug!("No configuration at {}, using defaults", path.display());
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
            other => other,
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        self.override_api_key(env::var(API_KEY_ENV).ok().as_deref());
    }

    /// An environment key only fills in a missing or placeholder key.
    fn override_api_key(&mut self, from_env: Option<&str>) {
        if validate_api_key(&self.api.gemini_api_key) {
            return;
        }
        if let Some(key) = from_env.map(str::trim).filter(|k| !k.is_empty()) {
            tracing::debug!("Using API key from {API_KEY_ENV}");
            self.api.gemini_api_key = key.to_string();
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api.gemini_api_key
    }

    pub fn model(&self) -> &str {
        &self.api.gemini_model
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.paths.output_dir.join("pdfs")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.paths.output_dir.join("results")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.paths.output_dir.join("debug")
    }
}

/// True if the key is set, is not a template placeholder and is plausibly long.
pub fn validate_api_key(key: &str) -> bool {
    !key.is_empty() && !PLACEHOLDER_KEYS.contains(&key) && key.chars().count() > 10
}

/// Mask a key for display: `AIzaSyAB...wxyz`.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "••••••".to_string()
    }
}
