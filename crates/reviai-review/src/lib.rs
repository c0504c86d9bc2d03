//! AI review step for ReviAI.
//!
//! Input documents (PDFs exported from the design workbook, or Markdown) are
//! converted to text, appended to a prompt template and sent to Gemini with a
//! response schema, yielding a [`reviai_core::ReviewTable`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use reviai_core::Config;
//! use reviai_review::Reviewer;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default("config.toml".as_ref())?;
//!     let reviewer = Reviewer::from_config(&config)?;
//!     let files = vec![PathBuf::from("output/pdfs/設計書_画面一覧_V7.pdf")];
//!     let table = reviewer.review_with_retry(&files, "# 設計書をレビューしてください")?;
//!     println!("{} rows: {}", table.len(), table.summary());
//!     Ok(())
//! }
//! ```

pub mod debug;
pub mod error;
pub mod gemini;
pub mod markdown;
mod reviewer;

pub use debug::DebugArtifacts;
pub use error::{ReviewError, ReviewResult};
pub use gemini::{GeminiClient, GeminiOptions, GeminiReview, UsageMetadata};
pub use markdown::{convert_files_to_markdown, document_text, DocumentKind};
pub use reviewer::{build_prompt, read_template_file, RetryPolicy, Reviewer, DEFAULT_RETRY_BASE};
