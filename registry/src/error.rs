use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by bean factories and destroy hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the `fibre_registry` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Failed to read configuration source {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse configuration source {path:?}: {reason}")]
  Parse { path: PathBuf, reason: String },

  #[error("Unsupported configuration format for {0:?}; expected .yaml, .yml or .json")]
  UnsupportedFormat(PathBuf),

  #[error("Invalid bean definition in '{source_name}': {message}")]
  InvalidDefinition { source_name: String, message: String },

  #[error("Bean '{id}' defined in '{source_name}' is already defined and overriding is disabled")]
  DuplicateBean { id: String, source_name: String },

  #[error("Bean '{id}' uses unknown kind '{kind}'")]
  UnknownKind { id: String, kind: String },

  #[error("No bean of type {type_name} is registered")]
  NoSuchBean { type_name: &'static str },

  #[error("Expected a single bean of type {type_name} but found {}: {candidates:?}", .candidates.len())]
  NotUnique {
    type_name: &'static str,
    candidates: Vec<String>,
  },

  #[error("No bean named '{0}' is registered")]
  NoSuchBeanId(String),

  #[error("Bean '{id}' is of type {actual}, not {requested}")]
  TypeMismatch {
    id: String,
    requested: &'static str,
    actual: &'static str,
  },

  #[error("Bean '{id}' is missing required property '{property}'")]
  MissingProperty { id: String, property: String },

  #[error("Bean '{id}' has an invalid value for property '{property}': {reason}")]
  InvalidProperty {
    id: String,
    property: String,
    reason: String,
  },

  #[error("Bean '{id}' declares no reference named '{reference}'")]
  MissingReference { id: String, reference: String },

  #[error("Circular dependency detected while resolving bean '{0}'")]
  CircularDependency(String),

  #[error("Failed to create bean '{id}': {source}")]
  Creation {
    id: String,
    #[source]
    source: BoxError,
  },

  #[error("Destroy hooks failed for beans {beans:?}: {source}")]
  Destroy {
    beans: Vec<String>,
    #[source]
    source: BoxError,
  },

  #[error("Registry has already been disposed")]
  Disposed,
}

/// A specialized `Result` type for `fibre_registry` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
