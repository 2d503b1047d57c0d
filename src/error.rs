//! Error types for the screenshot judge.

use crate::rubric::ParseFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, JudgeError>;

/// Errors that can occur while judging screenshots.
///
/// Some variants only ever describe a single identifier and are skipped
/// by the evaluator; see [`JudgeError::is_recoverable`].
#[derive(Error, Debug)]
pub enum JudgeError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An image source path does not exist or cannot be used.
    #[error("Image source '{0}' does not exist or is not usable")]
    InvalidImageSource(PathBuf),

    /// A predicted screenshot has no ground-truth counterpart.
    #[error("No ground-truth image for '{0}'")]
    MissingCounterpart(String),

    /// An image could not be converted to its transport encoding.
    #[error("Failed to encode image '{path}': {message}")]
    Encoding { path: PathBuf, message: String },

    /// Every attempt to reach the scoring service failed.
    #[error("Scoring request failed after {attempts} attempt(s): {last_error}")]
    FetchExhausted {
        attempts: u32,
        #[source]
        last_error: Box<JudgeError>,
    },

    /// The scorer's output could not be read as a rubric.
    #[error("Unusable scores for '{image_id}': {source}")]
    Parse {
        image_id: String,
        #[source]
        source: ParseFailure,
    },

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JudgeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only affects one identifier, so a batch run can
    /// skip it and move on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            JudgeError::MissingCounterpart(_)
                | JudgeError::Encoding { .. }
                | JudgeError::FetchExhausted { .. }
                | JudgeError::Parse { .. }
        )
    }
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        JudgeError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for JudgeError {
    fn from(err: serde_json::Error) -> Self {
        JudgeError::LlmParse(err.to_string())
    }
}
