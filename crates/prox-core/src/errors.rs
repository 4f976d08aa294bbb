//! Structured error types shared across prox crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code for a date field that fails to parse.
pub const MALFORMED_DATE: &str = "malformed_date";
/// Error code for a table lacking one of the required input columns.
pub const MISSING_REQUIRED_COLUMN: &str = "missing_required_column";
/// Error code for a missing or non-finite coordinate.
pub const INVALID_COORDINATE: &str = "invalid_coordinate";
/// Error code for a closure date earlier than the permit date.
pub const INVERTED_INTERVAL: &str = "inverted_interval";

/// Structured payload attached to every [`ProxError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (file names, rows, columns).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the proximity pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ProxError {
    /// Calendar date parsing errors.
    #[error("date error: {0}")]
    Date(ErrorInfo),
    /// Table shape and column contract errors.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// Record level validation errors.
    #[error("record error: {0}")]
    Record(ErrorInfo),
    /// Filesystem and CSV transport errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Configuration errors; fatal for a whole run.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization errors for reports and configuration.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Statistical fitting errors.
    #[error("stats error: {0}")]
    Stats(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ProxError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ProxError::Date(info)
            | ProxError::Schema(info)
            | ProxError::Record(info)
            | ProxError::Io(info)
            | ProxError::Config(info)
            | ProxError::Serde(info)
            | ProxError::Stats(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Builds an I/O error tagged with the offending path.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        ProxError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
