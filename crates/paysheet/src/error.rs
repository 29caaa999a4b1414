//! Errors

use thiserror::Error;

/// Error reported by an external collaborator (API client, link service, ...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// Machine readable error code, when the service supplies one
    pub code: Option<String>,
    /// Human readable message
    pub message: String,
}

impl ServiceError {
    /// Create a new [`ServiceError`] without a code
    pub fn new<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Attach an error code
    pub fn with_code<S>(mut self, code: S) -> Self
    where
        S: Into<String>,
    {
        self.code = Some(code.into());
        self
    }
}

/// Payment sheet error
///
/// `Clone` so a settled [`Promise`](crate::promise::Promise) can hand the same
/// failure to every observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Intent is already succeeded, canceled or (payment intents only) awaiting capture
    #[error("Payment sheet received a {kind} in a terminal state: {status}")]
    TerminalIntent {
        /// `PaymentIntent` or `SetupIntent`
        kind: &'static str,
        /// Status the intent was found in
        status: String,
    },
    /// Collaborator failure, propagated as-is
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// Collaborator reported failure without an error value
    #[error("Unknown error: {0}")]
    Unknown(String),
    /// Generic connection error
    #[error("There was an unexpected error -- try again in a few seconds")]
    GenericConnection,
    /// Host misconfiguration
    #[error("Precondition failed: {0}")]
    Precondition(String),
    /// A promise was settled twice
    #[error("Promise has already been settled")]
    PromiseAlreadySettled,
    /// The work driving a promise ended without settling it
    #[error("Promise was abandoned before it settled")]
    PromiseAbandoned,
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Return early with `$err` unless `$cond` holds
#[macro_export]
macro_rules! ensure_sheet {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
