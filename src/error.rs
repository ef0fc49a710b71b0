//! Error types for the verification harness

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving or inspecting the page under test
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start a page session
    #[error("Session initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// A selector could not be parsed
    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),

    /// A selector matched nothing in the current document
    #[error("No element matches `{0}`")]
    ElementNotFound(String),

    /// A selector matched more than one element
    #[error("Selector `{selector}` matched {count} elements, expected exactly one")]
    AmbiguousSelector { selector: String, count: usize },

    /// An action was attempted on an element that cannot receive it
    #[error("Cannot {action} `{selector}`: {reason}")]
    InvalidTarget {
        action: &'static str,
        selector: String,
        reason: String,
    },

    /// A check did not hold
    #[error("Assertion failed for {subject}: expected {expected}, got {actual}")]
    AssertionFailed {
        subject: String,
        expected: String,
        actual: String,
    },

    /// Fixture file could not be read
    #[error("Fixture `{name}` unavailable: {source}")]
    FixtureError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Page script evaluation failed
    #[error("Script evaluation failed: {0}")]
    ScriptError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an assertion failure from anything printable.
    pub fn assertion(
        subject: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Error::AssertionFailed {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True when the error is a failed check rather than a harness fault.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::AssertionFailed { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::ConfigError(format!("invalid pattern: {}", err))
    }
}
