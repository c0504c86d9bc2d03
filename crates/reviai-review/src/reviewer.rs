//! Review step: documents + prompt template → [`ReviewTable`].

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reviai_core::{validate_api_key, Config, ReviewTable};

use crate::debug::DebugArtifacts;
use crate::error::{ReviewError, ReviewResult};
use crate::gemini::{GeminiClient, GeminiOptions};
use crate::markdown::convert_files_to_markdown;

/// Delay before the first retry; doubled for each further attempt.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(3);

/// Full prompt sent to the model: template followed by the documents.
pub fn build_prompt(template: &str, markdown: &str) -> String {
    format!("{template}\n\n# PDF Content (Markdown format):\n\n{markdown}\n")
}

/// How often a failed review is attempted again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_RETRY_BASE,
        }
    }

    /// Wait after the failed attempt `attempt` (0-based): 3s, 6s, 12s, ...
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs reviews against Gemini.
pub struct Reviewer {
    client: GeminiClient,
    debug_dir: Option<PathBuf>,
    retry: RetryPolicy,
}

impl Reviewer {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            debug_dir: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Reviewer with client, retries and debug output taken from `config`.
    pub fn from_config(config: &Config) -> ReviewResult<Self> {
        let client = GeminiClient::new(GeminiOptions::from_config(config))?;
        let mut reviewer =
            Self::new(client).with_retry(RetryPolicy::new(config.settings.max_retries));
        if config.settings.save_debug_artifacts {
            reviewer = reviewer.with_debug_dir(config.debug_dir());
        }
        Ok(reviewer)
    }

    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Review the documents once.
    pub fn review(&self, files: &[PathBuf], template: &str) -> ReviewResult<ReviewTable> {
        self.review_attempt(files, template, 1)
    }

    fn review_attempt(
        &self,
        files: &[PathBuf],
        template: &str,
        attempt: u32,
    ) -> ReviewResult<ReviewTable> {
        if !validate_api_key(self.client.api_key()) {
            return Err(ReviewError::InvalidApiKey);
        }
        if let Some(missing) = files.iter().find(|f| !f.exists()) {
            return Err(ReviewError::NotFound(missing.clone()));
        }

        tracing::info!("Starting AI review with {} files", files.len());
        tracing::info!("Using model: {}", self.client.model());

        let markdown = convert_files_to_markdown(files)?;
        let prompt = build_prompt(template, &markdown);

        let artifacts = match &self.debug_dir {
            Some(dir) => Some(DebugArtifacts::create(dir)?.with_attempt(attempt)),
            None => None,
        };
        if let Some(artifacts) = &artifacts {
            artifacts.write_markdown(&markdown)?;
            artifacts.write_prompt(&prompt)?;
        }

        let review = self.client.review(&prompt, |raw| {
            if let Some(artifacts) = &artifacts {
                if let Err(e) = artifacts.write_raw_response(raw) {
                    tracing::warn!("Could not save raw response: {}", e);
                }
            }
        })?;

        if let Some(artifacts) = &artifacts {
            artifacts.write_parsed(&review.table)?;
            tracing::info!("Debug files saved to: {}", artifacts.dir().display());
        }

        tracing::info!(
            "AI review completed. Extracted {} rows ({})",
            review.table.len(),
            review.table.summary()
        );
        Ok(review.table)
    }

    /// Review with retries on transient failures.
    ///
    /// Errors that cannot go away on their own (bad key, missing or unreadable
    /// files, rejected requests) are returned immediately.
    pub fn review_with_retry(
        &self,
        files: &[PathBuf],
        template: &str,
    ) -> ReviewResult<ReviewTable> {
        let max = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            tracing::info!("Attempt {}/{}", attempt + 1, max);
            let err = match self.review_attempt(files, template, attempt + 1) {
                Ok(table) => return Ok(table),
                Err(e) => e,
            };

            tracing::warn!("Attempt {} failed: {}", attempt + 1, err);
            if !err.is_retryable() {
                return Err(err);
            }
            if attempt + 1 >= max {
                tracing::error!("All {} attempts failed", max);
                return Err(err);
            }

            let wait = self.retry.delay(attempt);
            tracing::info!("Retrying in {} seconds...", wait.as_secs_f32());
            thread::sleep(wait);
            attempt += 1;
        }
    }
}

/// Read a prompt template from an arbitrary file.
pub fn read_template_file(path: &Path) -> ReviewResult<String> {
    if !path.exists() {
        return Err(ReviewError::NotFound(path.to_path_buf()));
    }
    Ok(reviai_core::prompt::normalize_line_breaks(
        &std::fs::read_to_string(path)?,
    ))
}
