use thiserror::Error;

/// The main error type for the `fibre_context` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Failed to load registry: {0}")]
  ConfigLoad(#[source] fibre_registry::Error),

  #[error("Failed to resolve a bean of type {type_name}: {source}")]
  TypeResolution {
    type_name: &'static str,
    #[source]
    source: fibre_registry::Error,
    /// Set when releasing the registry after the failed lookup failed as well.
    cleanup: Option<fibre_registry::Error>,
  },

  #[error("Failed to dispose registry: {0}")]
  Disposal(#[source] fibre_registry::Error),

  #[error("Context handle has already been disposed")]
  UseAfterDispose,
}

/// A specialized `Result` type for `fibre_context` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
