//! The `ContextHandle` type and the one-shot `resolve_once` helper.

use crate::error::{Error, Result};

use fibre_registry::{Container, Registry, RegistryLoader};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Live,
  Disposed,
}

/// A loaded registry together with the one bean of type `T` resolved from it.
///
/// The handle owns the registry. Disposing the handle releases the registry's
/// resources when the registry offers a disposal capability. A handle dropped
/// while still live is disposed during drop; since `drop` cannot return an
/// error, call [`dispose`](Self::dispose) when the outcome matters.
///
/// Accessors borrow the handle shared and may be used from many threads at
/// once. Disposal needs exclusive access.
///
/// ```no_run
/// use fibre_context::ContextHandle;
/// use fibre_registry::{BeanCatalog, FileRegistryLoader};
///
/// struct Clock {
///   zone: String,
/// }
///
/// let loader = FileRegistryLoader::new(
///   BeanCatalog::new().register("clock", |ctx| Ok(Clock { zone: ctx.property("zone")? })),
/// );
///
/// let mut handle = ContextHandle::<Clock>::open(&loader, ["config/base.yaml", "config/local.yaml"])?;
/// println!("zone = {}", handle.bean()?.zone);
/// handle.dispose()?;
/// # Ok::<(), fibre_context::Error>(())
/// ```
pub struct ContextHandle<T: ?Sized, R: Registry = Container> {
  registry: R,
  bean: Arc<T>,
  state: State,
}

impl<T, R> ContextHandle<T, R>
where
  T: ?Sized + Any + Send + Sync,
  R: Registry,
{
  /// Loads a registry from `sources`, in order, and resolves the single bean of type `T`.
  ///
  /// The sources are checked before the loader runs: an empty list or a blank
  /// entry fails with [`Error::InvalidArgument`] and nothing is loaded. If the
  /// registry loads but `T` cannot be resolved, the registry is released before
  /// [`Error::TypeResolution`] is returned.
  pub fn open<L, I, S>(loader: L, sources: I) -> Result<Self>
  where
    L: RegistryLoader<Registry = R>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let sources = validate_sources(sources)?;
    debug!(?sources, bean_type = type_name::<T>(), "Opening context");

    let registry = loader.load(&sources).map_err(Error::ConfigLoad)?;

    match registry.get_unique::<T>() {
      Ok(bean) => Ok(Self {
        registry,
        bean,
        state: State::Live,
      }),
      Err(source) => {
        let cleanup = release(&registry).err();
        Err(Error::TypeResolution {
          type_name: type_name::<T>(),
          source,
          cleanup,
        })
      }
    }
  }

  /// Opens a handle, runs `body` with it, and disposes it afterwards.
  ///
  /// The registry is released on every exit path: explicitly after `body`
  /// returns, or by the handle's `Drop` if `body` panics.
  pub fn scoped<L, I, S, F, O>(loader: L, sources: I, body: F) -> Result<O>
  where
    L: RegistryLoader<Registry = R>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce(&Self) -> O,
  {
    let mut handle = Self::open(loader, sources)?;
    let output = body(&handle);
    handle.dispose()?;
    Ok(output)
  }
}

impl<T: ?Sized, R: Registry> ContextHandle<T, R> {
  /// The registry the bean was resolved from.
  pub fn registry(&self) -> Result<&R> {
    self.ensure_live()?;
    Ok(&self.registry)
  }

  /// The resolved bean. Always the same instance for the life of the handle.
  pub fn bean(&self) -> Result<&Arc<T>> {
    self.ensure_live()?;
    Ok(&self.bean)
  }

  pub fn is_disposed(&self) -> bool {
    self.state == State::Disposed
  }

  /// Releases the registry's resources.
  ///
  /// Registries without a disposal capability are left untouched. Only the
  /// first call does any work; later calls return `Ok(())`.
  pub fn dispose(&mut self) -> Result<()> {
    if self.state == State::Disposed {
      trace!("Context already disposed");
      return Ok(());
    }
    self.state = State::Disposed;
    debug!(bean_type = type_name::<T>(), "Disposing context");
    release(&self.registry).map_err(Error::Disposal)
  }

  fn ensure_live(&self) -> Result<()> {
    match self.state {
      State::Live => Ok(()),
      State::Disposed => Err(Error::UseAfterDispose),
    }
  }
}

impl<T: ?Sized, R: Registry> Drop for ContextHandle<T, R> {
  fn drop(&mut self) {
    if self.state == State::Live {
      if let Err(e) = self.dispose() {
        warn!(error = %e, bean_type = type_name::<T>(), "Failed to dispose context on drop");
      }
    }
  }
}

impl<T: ?Sized, R: Registry> fmt::Debug for ContextHandle<T, R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextHandle")
      .field("bean_type", &type_name::<T>())
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// Loads a registry, takes the single bean of type `T` out of it, and disposes
/// the registry before returning.
///
/// Every call loads the registry from scratch, so this suits one-off lookups.
/// Keep a [`ContextHandle`] around when the bean is needed repeatedly.
pub fn resolve_once<T, L, I, S>(loader: L, sources: I) -> Result<Arc<T>>
where
  T: ?Sized + Any + Send + Sync,
  L: RegistryLoader,
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  ContextHandle::<T, L::Registry>::scoped(loader, sources, |handle| Arc::clone(&handle.bean))
}

fn validate_sources<I, S>(sources: I) -> Result<Vec<String>>
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
  if sources.is_empty() {
    return Err(Error::InvalidArgument(
      "at least one configuration source is required".to_string(),
    ));
  }
  if let Some(position) = sources.iter().position(|source| source.trim().is_empty()) {
    return Err(Error::InvalidArgument(format!(
      "configuration source #{} is blank",
      position + 1
    )));
  }
  Ok(sources)
}

fn release<R: Registry>(registry: &R) -> fibre_registry::Result<()> {
  match registry.disposer() {
    Some(disposer) => disposer.dispose(),
    None => {
      trace!("Registry has no disposal capability; nothing to release");
      Ok(())
    }
  }
}
