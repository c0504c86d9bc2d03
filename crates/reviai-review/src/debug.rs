//! Timestamped copies of every intermediate of a review run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReviewResult;

/// Writes `pdf_markdown_*.md`, `full_prompt_*.txt`, `api_response_raw_*.json`
/// and `parsed_result_*.json` for one review run. Retries of the same run
/// get an `_attempt{n}` suffix so they do not overwrite earlier attempts.
#[derive(Debug, Clone)]
pub struct DebugArtifacts {
    dir: PathBuf,
    timestamp: String,
    attempt: u32,
}

impl DebugArtifacts {
    /// Create the directory and fix the timestamp for this run.
    pub fn create(dir: &Path) -> ReviewResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
            attempt: 1,
        })
    }

    /// 1-based attempt number of the run these files belong to.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn write_markdown(&self, markdown: &str) -> ReviewResult<PathBuf> {
        self.write_text("pdf_markdown", "md", markdown)
    }

    pub fn write_prompt(&self, prompt: &str) -> ReviewResult<PathBuf> {
        self.write_text("full_prompt", "txt", prompt)
    }

    pub fn write_raw_response<T: Serialize>(&self, raw: &T) -> ReviewResult<PathBuf> {
        self.write_json("api_response_raw", raw)
    }

    pub fn write_parsed<T: Serialize>(&self, parsed: &T) -> ReviewResult<PathBuf> {
        self.write_json("parsed_result", parsed)
    }

    fn path(&self, prefix: &str, ext: &str) -> PathBuf {
        match self.attempt {
            0 | 1 => self.dir.join(format!("{}_{}.{}", prefix, self.timestamp, ext)),
            n => self
                .dir
                .join(format!("{}_{}_attempt{}.{}", prefix, self.timestamp, n, ext)),
        }
    }

    fn write_text(&self, prefix: &str, ext: &str, text: &str) -> ReviewResult<PathBuf> {
        let path = self.path(prefix, ext);
        fs::write(&path, text)?;
        tracing::debug!("Saved {}", path.display());
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, prefix: &str, value: &T) -> ReviewResult<PathBuf> {
        // serde_json leaves non-ASCII characters unescaped
        let text = serde_json::to_string_pretty(value)?;
        self.write_text(prefix, "json", &text)
    }
}
