use thiserror::Error;

/// Error is returned by store, strategy and marshalling operations.
///
/// A disabled or unauthorized feature is never an error: those are ordinary `false` results from
/// [crate::FeatureToggle::is_enabled].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The operation targeted a feature id that is not present in the store.
    #[error("feature '{0}' does not exist")]
    FeatureNotFound(String),
    /// A feature with the same id is already present in the store.
    #[error("feature '{0}' already exists")]
    FeatureAlreadyExists(String),
    /// Strategy parameters or import input could not be turned into a valid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A strategy discriminator did not resolve to a built-in variant or a registered evaluator.
    #[error("unknown flipping strategy '{0}'")]
    UnknownStrategy(String),
    /// Features must have a non-empty id.
    #[error("feature id cannot be empty")]
    InvalidFeatureId,
    /// The input text is not a valid JSON encoding of a feature.
    #[error("malformed feature json: {0}")]
    Malformed(String),
    /// A backing store failed for a reason of its own.
    #[error("store failure: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
