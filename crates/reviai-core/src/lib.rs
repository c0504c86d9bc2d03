//! # reviai-core
//!
//! Shared building blocks for the ReviAI pipeline:
//!
//! - [`ReviewTable`] / [`ReviewRow`]: the structured review result and the
//!   JSON schema requested from the model
//! - [`Config`]: the TOML configuration file (API key, model, paths, settings)
//! - [`PromptLibrary`]: the directory of prompt templates
//! - [`naming`]: file naming conventions shared by all three steps

pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod prompt;

pub use config::{mask_api_key, validate_api_key, Config, KnownModel, KNOWN_MODELS};
pub use error::{Error, Result};
pub use model::{Evaluation, EvaluationSummary, ReviewRow, ReviewTable};
pub use prompt::PromptLibrary;
