//! Error types for the measurement service.
//!
//! Every failure the orchestrator can observe is expressed as a
//! [`MeasurementError`] carrying an [`ErrorKind`], a user-facing message
//! and, where one exists, a suggestion and the underlying error.

use serde::Serialize;
use std::error::Error;
use std::fmt;

/// Categories of errors that can occur while measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider could not select a measurement server.
    NoServerFound,
    /// A download or upload probe failed.
    ProbeFailure,
    /// The run exceeded its wall-clock budget.
    Timeout,
    /// A measurement is already running; the start request was rejected.
    AlreadyInProgress,
    /// The server directory could not be listed.
    DirectoryUnavailable,
    /// Invalid configuration or arguments.
    Config,
}

impl ErrorKind {
    /// Get a user-friendly description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NoServerFound => "No server found",
            ErrorKind::ProbeFailure => "Probe failure",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::AlreadyInProgress => "Already in progress",
            ErrorKind::DirectoryUnavailable => "Server directory unavailable",
            ErrorKind::Config => "Configuration error",
        }
    }
}

/// A user-friendly error type for measurement operations.
#[derive(Debug)]
pub struct MeasurementError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// User-friendly error message.
    pub message: String,
    /// Optional suggestion for how to resolve the error.
    pub suggestion: Option<String>,
    /// The underlying error, if any.
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl MeasurementError {
    /// Create a new MeasurementError.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    /// Add a suggestion for how to resolve the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add the underlying error source.
    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn no_server_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoServerFound, message).with_suggestion(
            "Check your internet connection and try again.",
        )
    }

    pub fn probe_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProbeFailure, message)
            .with_suggestion("The measurement server may be overloaded. Try again later.")
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message).with_suggestion(
            "The server may be slow or unreachable. Try again later.",
        )
    }

    pub fn already_in_progress() -> Self {
        Self::new(
            ErrorKind::AlreadyInProgress,
            "Test already in progress. Please wait for the current test to complete.",
        )
    }

    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DirectoryUnavailable, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Prefix the message with the operation that failed.
    pub fn context(mut self, context: &str) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for MeasurementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Classify a transport error by its message.
///
/// Timeouts keep their own kind so that a slow endpoint reads as a timeout
/// rather than a generic probe failure; everything else becomes `fallback`.
pub fn classify_error(error: &dyn Error, fallback: ErrorKind) -> ErrorKind {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("timeout")
        || error_str.contains("timed out")
        || error_str.contains("deadline")
    {
        return ErrorKind::Timeout;
    }

    fallback
}

/// Convert a reqwest error into a MeasurementError for the given operation.
pub fn from_transport(
    error: reqwest::Error,
    context: &str,
    fallback: ErrorKind,
) -> MeasurementError {
    let kind = if error.is_timeout() {
        ErrorKind::Timeout
    } else {
        classify_error(&error, fallback)
    };
    let message = format!("{}: {}", context, error);

    let measurement_error = match kind {
        ErrorKind::Timeout => MeasurementError::timeout(message),
        ErrorKind::NoServerFound => MeasurementError::no_server_found(message),
        ErrorKind::DirectoryUnavailable => {
            MeasurementError::directory_unavailable(message)
        }
        _ => MeasurementError::probe_failure(message),
    };

    measurement_error.with_source(error)
}
