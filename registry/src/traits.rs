//! Contracts between a registry and the code that loads and consumes it.

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;

/// A loaded collection of beans that can be queried by type.
pub trait Registry {
  /// Returns the single bean registered as `T`.
  ///
  /// Fails when no bean or more than one bean of type `T` exists.
  fn get_unique<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>>;

  /// Returns the registry's disposal capability, if it owns releasable resources.
  fn disposer(&self) -> Option<&dyn Disposable> {
    None
  }
}

/// Something that holds resources which must be released explicitly.
pub trait Disposable {
  /// Releases held resources. Calling this more than once must be harmless.
  fn dispose(&self) -> Result<()>;
}

/// Builds a [`Registry`] from an ordered list of configuration locators.
///
/// Later locators may override definitions from earlier ones.
pub trait RegistryLoader {
  type Registry: Registry;

  fn load(&self, sources: &[String]) -> Result<Self::Registry>;
}

impl<L: RegistryLoader + ?Sized> RegistryLoader for &L {
  type Registry = L::Registry;

  fn load(&self, sources: &[String]) -> Result<Self::Registry> {
    (**self).load(sources)
  }
}
