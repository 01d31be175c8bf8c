use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

/// Application-specific error types.
///
/// Remote failures keep the response body verbatim so operators can see
/// quota, auth or payload problems without re-running the batch.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The batch submission was answered with a non-success status.
    Submission {
        /// HTTP status of the submission response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// A status poll was answered with a non-success status, or the
    /// remote job reported that it failed.
    Polling {
        /// HTTP status of the poll response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// The poll budget (count or elapsed time) ran out before completion.
    PollingTimeout {
        /// Poll requests issued before giving up.
        polls: u32,
        /// Wall-clock time spent since submission.
        elapsed: Duration,
    },
    /// The caller raised the cancellation flag.
    Cancelled {
        /// Poll requests issued before the cancellation was observed.
        polls: u32,
    },
    /// The request could not be sent or its body could not be read.
    Transport(String),
    /// A success response was missing a required field or was not JSON.
    MalformedResponse {
        /// What was being parsed.
        context: String,
        /// Raw response body.
        body: String,
    },
    /// CSV parsing or writing failure.
    Csv(String),
    /// Filesystem failure.
    Io(String),
    /// Bad input data (e.g. a CRM row without an id).
    InvalidInput(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Submission { status, body } => write!(
                f,
                "Encountered a problem submitting contacts to Surfe ({}):\n{}",
                status, body
            ),
            AppError::Polling { status, body } => write!(
                f,
                "Encountered a problem getting results from Surfe ({}):\n{}",
                status, body
            ),
            AppError::PollingTimeout { polls, elapsed } => write!(
                f,
                "Enrichment did not complete after {} polls ({}s)",
                polls,
                elapsed.as_secs()
            ),
            AppError::Cancelled { polls } => {
                write!(f, "Enrichment cancelled after {} polls", polls)
            }
            AppError::Transport(msg) => write!(f, "HTTP transport error: {}", msg),
            AppError::MalformedResponse { context, body } => {
                write!(f, "Malformed {}:\n{}", context, body)
            }
            AppError::Csv(msg) => write!(f, "CSV error: {}", msg),
            AppError::Io(msg) => write!(f, "IO error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    /// Strips any context wrappers and returns the underlying error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            AppError::Io(err.to_string())
        } else {
            AppError::Csv(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
