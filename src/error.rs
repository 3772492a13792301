//! Error types for the population manager.

/// Errors surfaced by [`Neat`](crate::Neat) and [`NeatConfig`](crate::NeatConfig).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeatError {
    /// A configuration field holds a value the engine cannot run with.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The population is empty, so there is nothing to report on.
    #[error("population not initialized; seed it with `Neat::new` or `Neat::reseed` first")]
    NotInitialized,
}

impl NeatError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = NeatError> = std::result::Result<T, E>;
