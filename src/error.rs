//! Error types and fetch outcomes for the travel dashboard core

use thiserror::Error;

/// Main error type for the travel dashboard core
#[derive(Error, Debug)]
pub enum TravelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network-level failures (connection refused, timeout, DNS)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} from {service}: {message}")]
    Status {
        service: String,
        status: u16,
        message: String,
    },

    /// Upstream payload did not have the expected shape
    #[error("Malformed response: {message}")]
    Parse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl TravelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new status error
    pub fn status<S: Into<String>, M: Into<String>>(service: S, status: u16, message: M) -> Self {
        Self::Status {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TravelError::Transport { .. } | TravelError::Status { .. } => {
                "Unable to connect to external services. Please try again.".to_string()
            }
            TravelError::Parse { .. } => {
                "Received unexpected data from an external service.".to_string()
            }
            TravelError::Validation { message } => format!("Invalid input: {message}"),
            TravelError::Cache { .. } => "Cache operation failed.".to_string(),
        }
    }
}

impl From<serde_json::Error> for TravelError {
    fn from(err: serde_json::Error) -> Self {
        TravelError::parse(err.to_string())
    }
}

impl From<postcard::Error> for TravelError {
    fn from(err: postcard::Error) -> Self {
        TravelError::cache(err.to_string())
    }
}

/// Outcome of an optional-enrichment fetch.
///
/// Adapters for events, points of interest and geocoding never return an
/// error to their caller; they report what happened through this type and
/// leave it to the caller to surface or ignore a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Data was fetched and normalized
    Success(T),
    /// The upstream answered, but with nothing usable
    Empty,
    /// The fetch failed; the reason has already been logged
    Failed(String),
}

impl<T> FetchOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, FetchOutcome::Empty)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// Collapse to an option, dropping the distinction between empty and failed
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            FetchOutcome::Empty | FetchOutcome::Failed(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Success(value) => FetchOutcome::Success(f(value)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
        }
    }
}

impl<T: Default> FetchOutcome<T> {
    /// The fetched value, or the type's default for empty and failed outcomes
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }

    /// Empty becomes the default value; a failure becomes a transport error
    /// so callers that retry can see it.
    pub fn into_result(self) -> Result<T, TravelError> {
        match self {
            FetchOutcome::Success(value) => Ok(value),
            FetchOutcome::Empty => Ok(T::default()),
            FetchOutcome::Failed(reason) => Err(TravelError::transport(reason)),
        }
    }
}

impl<T> FetchOutcome<Vec<T>> {
    /// Treat an empty collection the same as an empty upstream answer
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Success(items)
        }
    }
}
