//! `reviai config ...` and `reviai models`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use reviai_core::{mask_api_key, validate_api_key, Config, Error, KnownModel, KNOWN_MODELS};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration (API key masked)
    Show,

    /// Store the Gemini API key in the configuration file
    SetKey { key: String },

    /// Store the default model in the configuration file
    SetModel { model: String },
}

pub fn run(path: &Path, config: &Config, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            show(path, config);
            Ok(())
        }
        ConfigCommand::SetKey { key } => {
            let key = key.trim();
            if !validate_api_key(key) {
                bail!("Invalid API key: it must be set and longer than 10 characters");
            }
            update(path, |c| c.api.gemini_api_key = key.to_string())?;
            println!("API key saved: {}", mask_api_key(key));
            Ok(())
        }
        ConfigCommand::SetModel { model } => {
            if KnownModel::find(model).is_none() {
                tracing::warn!("Unknown model '{}', saving it anyway", model);
            }
            update(path, |c| c.api.gemini_model = model.clone())?;
            println!("Model saved: {}", model);
            Ok(())
        }
    }
}

/// Change the file contents only; values from the environment are not persisted.
fn update(path: &Path, change: impl FnOnce(&mut Config)) -> Result<()> {
    let mut config = match Config::read(path) {
        Ok(config) => config,
        Err(Error::ConfigNotFound(_)) => Config::default(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read '{}'", path.display())),
    };
    change(&mut config);
    config
        .save(path)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    tracing::info!("Configuration saved to {}", path.display());
    Ok(())
}

fn show(path: &Path, config: &Config) {
    let key = config.api_key();
    let key_status = if key.is_empty() {
        "(not set)".to_string()
    } else if validate_api_key(key) {
        mask_api_key(key)
    } else {
        format!("{} (invalid)", mask_api_key(key))
    };

    println!("Config file:      {}", path.display());
    println!("API key:          {}", key_status);
    println!("Model:            {}", model_line(config.model()));
    println!("API base URL:     {}", config.api.base_url);
    println!("Output directory: {}", config.paths.output_dir.display());
    println!("Prompts:          {}", config.paths.prompts_dir.display());
    println!("Logs:             {}", config.paths.log_dir.display());
    println!("Temperature:      {}", config.settings.temperature);
    println!("Max output:       {} tokens", config.settings.max_output_tokens);
    println!("Max retries:      {}", config.settings.max_retries);
    println!("Request timeout:  {}s", config.settings.request_timeout_secs);
    println!("Debug artifacts:  {}", config.settings.save_debug_artifacts);
}

fn model_line(model: &str) -> String {
    match KnownModel::find(model) {
        Some(known) => format!("{} - {}", known.name, known.description),
        None => format!("{} (not in the model list)", model),
    }
}

pub fn list_models(current: &str) {
    for model in KNOWN_MODELS {
        let marker = if model.name == current { "*" } else { " " };
        println!("{} {:<22} {}", marker, model.name, model.description);
    }
}
