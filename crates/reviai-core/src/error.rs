//! Error types for reviai-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reviai-core
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Configuration file is not valid TOML
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// JSON error (review tables)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt name is empty or would escape the prompts directory
    #[error("Invalid prompt name: {0:?}")]
    InvalidPromptName(String),

    /// Prompt template not found by name
    #[error("Prompt template not found: {0}")]
    PromptNotFound(String),

    /// Prompt template already exists
    #[error("Prompt template already exists: {0}")]
    PromptExists(String),

    /// Refused to delete the only remaining template
    #[error("Cannot delete '{0}': at least one prompt template is required")]
    LastPrompt(String),
}
