//! Review error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for review operations
pub type ReviewResult<T> = std::result::Result<T, ReviewError>;

/// Errors that can occur while preparing or running a review
#[derive(Debug, Error)]
pub enum ReviewError {
    /// API key missing or still the template placeholder
    #[error("Invalid API key. Configure your Gemini API key in the config file or GEMINI_API_KEY")]
    InvalidApiKey,

    /// Input document does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input document is neither PDF nor Markdown
    #[error("Unsupported document type: {}", .0.display())]
    UnsupportedDocument(PathBuf),

    /// No text could be extracted from the document
    #[error("Could not read text from {}: {reason}", .path.display())]
    UnreadableDocument { path: PathBuf, reason: String },

    /// Transport failure (connection, TLS, body read)
    #[error("Request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response carried no candidate text
    #[error("Gemini returned an empty response{}", .0.as_ref().map(|r| format!(" (blocked: {r})")).unwrap_or_default())]
    EmptyResponse(Option<String>),

    /// Output hit the token limit before the table was complete
    #[error("Gemini response was truncated at the output token limit")]
    Truncated,

    /// Candidate text is not a valid review table
    #[error("Failed to parse review table from response: {0}")]
    Parse(#[source] serde_json::Error),

    /// JSON error outside response parsing
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReviewError {
    /// True for failures that may succeed when the same request is sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReviewError::Http(_)
            | ReviewError::EmptyResponse(_)
            | ReviewError::Truncated
            | ReviewError::Parse(_) => true,
            ReviewError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(ReviewError::Truncated.is_retryable());
        assert!(ReviewError::EmptyResponse(None).is_retryable());
        assert!(ReviewError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(ReviewError::Api { status: 503, message: String::new() }.is_retryable());

        assert!(!ReviewError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!ReviewError::Api { status: 403, message: String::new() }.is_retryable());
        assert!(!ReviewError::InvalidApiKey.is_retryable());
        assert!(!ReviewError::NotFound(PathBuf::from("a.pdf")).is_retryable());
        assert!(!ReviewError::UnreadableDocument {
            path: PathBuf::from("a.pdf"),
            reason: "no text".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_empty_response_message() {
        assert_eq!(
            ReviewError::EmptyResponse(Some("SAFETY".into())).to_string(),
            "Gemini returned an empty response (blocked: SAFETY)"
        );
        assert_eq!(
            ReviewError::EmptyResponse(None).to_string(),
            "Gemini returned an empty response"
        );
    }
}
