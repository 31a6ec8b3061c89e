//! Error types for pipeline units and combinators.
//!
//! This module provides [`PipelineError`], the error type every unit in a
//! pipeline returns. It distinguishes two cases:
//!
//! - a condition unit rejecting by evaluating to `false`, which the
//!   combinators synthesize into [`PipelineError::ConditionFailed`], and
//! - any error produced by a unit (or by the downstream continuation
//!   chain), which is carried through unchanged so callers can still
//!   inspect the original error via [`PipelineError::downcast_ref`].

use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Standard error type for pipeline units.
///
/// # Example
///
/// ```
/// use daedalus::PipelineError;
///
/// fn check_quota(remaining: u32) -> Result<(), PipelineError> {
///     if remaining == 0 {
///         return Err(PipelineError::message("quota exhausted"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A condition unit evaluated to `false`.
    ///
    /// Synthesized by the combinators; carries the name of the rejecting
    /// unit for logs and error messages.
    #[error("condition `{name}` evaluated to false")]
    ConditionFailed {
        /// Name of the condition that rejected.
        name: &'static str,
    },

    /// An error raised by a unit or by the downstream continuation chain.
    ///
    /// Passed through unchanged by the combinators; the original error's
    /// identity is preserved and can be recovered with
    /// [`downcast_ref`](Self::downcast_ref).
    #[error(transparent)]
    Unit(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wraps a concrete error raised by a unit.
    pub fn unit<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unit(anyhow::Error::new(err))
    }

    /// Creates a unit error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Unit(anyhow::anyhow!(message.into()))
    }

    /// Returns `true` if this error was synthesized from a condition
    /// evaluating to `false`.
    #[must_use]
    pub const fn is_condition_failure(&self) -> bool {
        matches!(self, Self::ConditionFailed { .. })
    }

    /// Attempts to recover the concrete error a unit raised.
    ///
    /// Returns `None` for condition failures or when the wrapped error is
    /// not of type `E`.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Unit(err) => err.downcast_ref::<E>(),
            Self::ConditionFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("backend unavailable: {reason}")]
    struct BackendError {
        reason: &'static str,
    }

    #[test]
    fn test_condition_failed_display() {
        let err = PipelineError::ConditionFailed { name: "is_admin" };
        assert_eq!(err.to_string(), "condition `is_admin` evaluated to false");
        assert!(err.is_condition_failure());
    }

    #[test]
    fn test_unit_error_preserves_identity() {
        let err = PipelineError::unit(BackendError { reason: "down" });
        assert!(!err.is_condition_failure());
        assert_eq!(
            err.downcast_ref::<BackendError>(),
            Some(&BackendError { reason: "down" })
        );
        assert_eq!(err.to_string(), "backend unavailable: down");
    }

    #[test]
    fn test_message_error() {
        let err = PipelineError::message("something broke");
        assert_eq!(err.to_string(), "something broke");
        assert!(err.downcast_ref::<BackendError>().is_none());
    }

    #[test]
    fn test_condition_failure_never_downcasts() {
        let err = PipelineError::ConditionFailed { name: "c" };
        assert!(err.downcast_ref::<BackendError>().is_none());
    }
}
