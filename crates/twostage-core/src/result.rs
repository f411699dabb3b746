//! Convenience result type alias for lifecycle operations.

use crate::error::LifecycleError;

/// A specialized `Result` type for constructors and hook actions.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
