//! Error types for the rucaptcha-client library.

use crate::catalog;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

/// Main error type for rucaptcha-client operations.
///
/// The variants are deliberately distinct so callers can branch on
/// "permanently failed" ([`Service`](RucaptchaError::Service)) vs.
/// "timed out" ([`Timeout`](RucaptchaError::Timeout)) vs. "infrastructure
/// problem" ([`Transport`](RucaptchaError::Transport)).
#[derive(Error, Debug)]
pub enum RucaptchaError {
    /// Malformed input detected before any network call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The service explicitly reported a failure
    #[error("captcha service error: {message}")]
    Service {
        /// Catalog message for a recognized code, otherwise the raw body.
        message: String,
        /// Numeric code extracted from an `ERROR: <digits>` body, 0 when absent.
        code: u32,
    },

    /// The wait loop exceeded its configured maximum
    #[error("captcha waiting timeout after {waited:?}")]
    Timeout {
        /// How long the loop waited before giving up.
        waited: Duration,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Transport(#[from] rquest::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally unexpected response from the server
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for rucaptcha-client operations.
pub type Result<T> = std::result::Result<T, RucaptchaError>;

static ERROR_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ERROR:\s*(\d{1,4})").expect("static regex"));

impl RucaptchaError {
    /// Build a [`RucaptchaError::Service`] from a raw response body.
    ///
    /// The body is looked up in the error catalog; unmapped bodies are used
    /// verbatim as the message. A numeric code embedded as `ERROR: <digits>`
    /// is extracted when present.
    pub(crate) fn service(body: &str) -> Self {
        let message = catalog::message_for(body)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        RucaptchaError::Service {
            message,
            code: extract_error_code(body),
        }
    }

    /// Same as [`service`](Self::service), but unmapped bodies are quoted as
    /// an unknown error. Used for submissions, where the raw body alone reads
    /// like a result.
    pub(crate) fn service_unknown(body: &str) -> Self {
        match catalog::message_for(body) {
            Some(message) => RucaptchaError::Service {
                message: message.to_string(),
                code: extract_error_code(body),
            },
            None => RucaptchaError::Service {
                message: format!("Unknown error: `{body}`."),
                code: extract_error_code(body),
            },
        }
    }
}

/// Extract the numeric code from an `ERROR: <digits>` response variant.
fn extract_error_code(body: &str) -> u32 {
    ERROR_CODE_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
