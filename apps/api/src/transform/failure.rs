//! Failure taxonomy for transformations and the one function that maps
//! transport failures into it.

use std::fmt;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Which public operation a failure came from. Only used to label messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AdaptDocument,
    CompanionLetter,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AdaptDocument => f.write_str("adapt CV"),
            Operation::CompanionLetter => f.write_str("generate cover letter"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Model session not initialized. Please provide an API key first.")]
    NotInitialized,

    #[error("No page content provided")]
    EmptyInput,

    #[error("Invalid API key. Please check your API key.")]
    InvalidCredential,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Content too long. Please try with a shorter page.")]
    ContentTooLarge,

    #[error("Model not found. Please check your API access.")]
    ModelUnavailable,

    #[error("Failed to {operation}: {message}")]
    Failed { operation: Operation, message: String },

    #[error("Failed to initialize model session: {0}")]
    Initialization(String),
}

/// The remote failure kinds that get their own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    InvalidCredential,
    RateLimited,
    ContentTooLarge,
    ModelUnavailable,
}

impl FailureKind {
    fn into_error(self) -> TransformError {
        match self {
            FailureKind::InvalidCredential => TransformError::InvalidCredential,
            FailureKind::RateLimited => TransformError::RateLimited,
            FailureKind::ContentTooLarge => TransformError::ContentTooLarge,
            FailureKind::ModelUnavailable => TransformError::ModelUnavailable,
        }
    }
}

/// Substring table for failures that carry nothing but text. Lowercase;
/// matched case-insensitively, first hit wins.
const MESSAGE_PATTERNS: &[(&str, FailureKind)] = &[
    ("api key", FailureKind::InvalidCredential),
    ("rate limit", FailureKind::RateLimited),
    ("token", FailureKind::ContentTooLarge),
    ("404", FailureKind::ModelUnavailable),
    ("not_found", FailureKind::ModelUnavailable),
];

/// Maps a transport failure from `operation` into the taxonomy.
///
/// Status code and error type win when the transport has them; otherwise the
/// failure's text is run through `MESSAGE_PATTERNS`. Anything unmatched is
/// wrapped as `Failed` with the original message.
pub fn classify(operation: Operation, err: &LlmError) -> TransformError {
    let structured = match err {
        LlmError::Api { status, kind, .. } => classify_status(*status, kind.as_deref()),
        _ => None,
    };

    let message = err.to_string();
    match structured.or_else(|| classify_message(&message)) {
        Some(kind) => kind.into_error(),
        None => TransformError::Failed { operation, message },
    }
}

fn classify_status(status: u16, kind: Option<&str>) -> Option<FailureKind> {
    match (status, kind) {
        (401 | 403, _) | (_, Some("authentication_error" | "permission_error")) => {
            Some(FailureKind::InvalidCredential)
        }
        (429, _) | (_, Some("rate_limit_error")) => Some(FailureKind::RateLimited),
        (413, _) | (_, Some("request_too_large")) => Some(FailureKind::ContentTooLarge),
        (404, _) | (_, Some("not_found_error")) => Some(FailureKind::ModelUnavailable),
        _ => None,
    }
}

fn classify_message(message: &str) -> Option<FailureKind> {
    let message = message.to_lowercase();
    MESSAGE_PATTERNS
        .iter()
        .find(|(pattern, _)| message.contains(pattern))
        .map(|(_, kind)| *kind)
}
