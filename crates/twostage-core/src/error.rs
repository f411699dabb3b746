//! Unified lifecycle error types.
//!
//! Constructors, hook actions, and the wrappers all report failures through
//! [`LifecycleError`] so they compose with the `?` operator.

use std::fmt;
use thiserror::Error;

/// Categorization of lifecycle failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A layer constructor failed before the object was complete.
    Construction,
    /// A post-construct hook failed.
    PostConstruct,
    /// One or more pre-destruct hooks failed.
    Teardown,
    /// A configuration error occurred.
    Configuration,
    /// An I/O error occurred.
    Io,
    /// An unexpected internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => write!(f, "CONSTRUCTION"),
            Self::PostConstruct => write!(f, "POST_CONSTRUCT"),
            Self::Teardown => write!(f, "TEARDOWN"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Io => write!(f, "IO"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The error type shared by every lifecycle crate.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct LifecycleError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LifecycleError {
    /// Create a new lifecycle error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new lifecycle error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a construction error.
    pub fn construction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction, message)
    }

    /// Create a teardown error.
    pub fn teardown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Teardown, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for LifecycleError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for LifecycleError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
