//! The main `Container` struct and its associated methods.

use crate::config::Scope;
use crate::core::{
  erase_factory, BeanEntry, BeanType, DestroyHook, Factory, Instance, Provider, ResolutionGuard,
  ResolutionKey,
};
use crate::error::{BoxError, Error, Result};
use crate::traits::{Disposable, Registry};

use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A thread-safe bean registry.
///
/// Beans are registered under a unique id together with the type they resolve
/// as. Registration may happen at any time; a later registration under the
/// same id replaces the earlier one.
#[derive(Default)]
pub struct Container {
  beans: DashMap<String, BeanEntry>,
  // Ids of singletons in the order they finished construction.
  created: Mutex<Vec<String>>,
  disposed: AtomicBool,
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("beans", &self.beans.len())
      .field("created", &self.created.lock().len())
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn insert_entry(&self, id: &str, entry: BeanEntry) {
    trace!(bean = id, bean_type = ?entry.bean_type, singleton = entry.is_singleton(), "Registering bean");
    if self.beans.insert(id.to_owned(), entry).is_some() {
      debug!(bean = id, "Replaced existing bean registration");
    }
  }

  fn insert_factory<T: ?Sized + Any + Send + Sync>(&self, id: &str, scope: Scope, factory: Factory) {
    self.insert_entry(
      id,
      BeanEntry {
        bean_type: BeanType::of::<T>(),
        provider: Provider::new(scope, factory),
        destroy: None,
      },
    );
  }

  fn ensure_live(&self) -> Result<()> {
    if self.is_disposed() {
      return Err(Error::Disposed);
    }
    Ok(())
  }

  fn create(&self, id: &str, factory: &Factory) -> Result<Instance> {
    factory(self).map_err(|source| Error::Creation {
      id: id.to_owned(),
      source,
    })
  }

  fn singleton<'e>(
    &self,
    id: &str,
    entry: &'e BeanEntry,
    cell: &'e once_cell::sync::OnceCell<Instance>,
    factory: &Factory,
  ) -> Result<&'e Instance> {
    let mut fresh = false;
    let instance = cell.get_or_try_init(|| {
      let instance = self.create(id, factory)?;
      fresh = true;
      Ok::<_, Error>(instance)
    })?;
    if !fresh {
      return Ok(instance);
    }

    // The flag is read under the lock `dispose` takes the creation log with,
    // so a new bean is either recorded for teardown or torn down right here.
    let mut created = self.created.lock();
    if self.is_disposed() {
      drop(created);
      self.discard(id, entry.destroy.as_ref(), instance);
      return Err(Error::Disposed);
    }
    created.push(id.to_owned());
    debug!(bean = id, bean_type = ?entry.bean_type, "Instantiated singleton bean");
    Ok(instance)
  }

  /// Destroys a singleton that finished construction after the registry was disposed.
  fn discard(&self, id: &str, destroy: Option<&DestroyHook>, instance: &Instance) {
    debug!(bean = id, "Registry disposed during creation, discarding bean");
    if let Some(destroy) = destroy {
      if let Err(e) = destroy(instance) {
        warn!(bean = id, error = %e, "Destroy hook failed");
      }
    }
  }

  /// Creates the singleton registered under `id` if it does not exist yet.
  /// Prototypes are left alone.
  pub(crate) fn preinstantiate(&self, id: &str) -> Result<()> {
    self.ensure_live()?;
    let _guard = ResolutionGuard::enter(ResolutionKey::new(self, id))?;

    let entry = self
      .beans
      .get(id)
      .ok_or_else(|| Error::NoSuchBeanId(id.to_owned()))?;
    if let Provider::Singleton { cell, factory } = &entry.provider {
      self.singleton(id, entry.value(), cell, factory)?;
    }
    Ok(())
  }

  // --- PUBLIC API ---

  // --- Instance Registration ---
  pub fn add_instance<T: Any + Send + Sync>(&self, id: &str, instance: T) {
    let provider = Provider::Singleton {
      cell: once_cell::sync::OnceCell::with_value(Box::new(Arc::new(instance)) as Instance),
      factory: Arc::new(|_: &Container| -> std::result::Result<Instance, BoxError> {
        Err("pre-initialized singleton has no factory".into())
      }),
    };
    self.insert_entry(
      id,
      BeanEntry {
        bean_type: BeanType::of::<T>(),
        provider,
        destroy: None,
      },
    );
  }

  // --- Singleton Registration ---
  pub fn add_singleton<T: Any + Send + Sync>(
    &self,
    id: &str,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    let factory = erase_factory(move |container| Ok(Arc::new(factory(container))));
    self.insert_factory::<T>(id, Scope::Singleton, factory);
  }

  // --- Prototype Registration ---
  pub fn add_prototype<T: Any + Send + Sync>(
    &self,
    id: &str,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    let factory = erase_factory(move |container| Ok(Arc::new(factory(container))));
    self.insert_factory::<T>(id, Scope::Prototype, factory);
  }

  // --- Trait Registration ---
  pub fn add_singleton_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    id: &str,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    let factory = erase_factory(move |container| Ok(factory(container)));
    self.insert_factory::<I>(id, Scope::Singleton, factory);
  }

  // --- Inspection ---
  pub fn contains(&self, id: &str) -> bool {
    self.beans.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.beans.len()
  }

  pub fn is_empty(&self) -> bool {
    self.beans.is_empty()
  }

  /// Returns the ids of all registered beans, sorted.
  pub fn bean_ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.beans.iter().map(|entry| entry.key().clone()).collect();
    ids.sort();
    ids
  }

  /// Returns the ids of all beans registered as `T`, sorted.
  pub fn ids_of_type<T: ?Sized + Any>(&self) -> Vec<String> {
    let wanted = TypeId::of::<T>();
    let mut ids: Vec<String> = self
      .beans
      .iter()
      .filter(|entry| entry.value().bean_type.id == wanted)
      .map(|entry| entry.key().clone())
      .collect();
    ids.sort();
    ids
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire)
  }

  // --- Resolution ---
  /// Resolves the bean registered under `id` as a `T`.
  ///
  /// Singletons are created on first request and shared afterwards, prototypes
  /// are created on every request.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    self.ensure_live()?;

    // Fails on a circular dependency; cleans the stack up when `get` returns.
    let _guard = ResolutionGuard::enter(ResolutionKey::new(self, id))?;

    let entry_ref = self
      .beans
      .get(id)
      .ok_or_else(|| Error::NoSuchBeanId(id.to_owned()))?;
    let entry = entry_ref.value();

    let mismatch = || Error::TypeMismatch {
      id: id.to_owned(),
      requested: type_name::<T>(),
      actual: entry.bean_type.name,
    };
    if entry.bean_type.id != TypeId::of::<T>() {
      return Err(mismatch());
    }

    match &entry.provider {
      Provider::Singleton { cell, factory } => {
        let instance = self.singleton(id, entry, cell, factory)?;
        instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(mismatch)
      }
      Provider::Prototype { factory } => {
        let instance = self.create(id, factory)?;
        instance
          .downcast::<Arc<T>>()
          .map(|boxed| *boxed)
          .map_err(|_| mismatch())
      }
    }
  }

  /// Resolves the single bean registered as `T`.
  pub fn get_unique<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.ensure_live()?;

    let mut candidates = self.ids_of_type::<T>();
    match candidates.len() {
      0 => Err(Error::NoSuchBean {
        type_name: type_name::<T>(),
      }),
      1 => {
        let id = candidates.remove(0);
        trace!(bean = %id, bean_type = type_name::<T>(), "Resolved bean by type");
        self.get::<T>(&id)
      }
      _ => Err(Error::NotUnique {
        type_name: type_name::<T>(),
        candidates,
      }),
    }
  }
}

impl Registry for Container {
  fn get_unique<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    Container::get_unique::<T>(self)
  }

  fn disposer(&self) -> Option<&dyn Disposable> {
    Some(self)
  }
}

impl Disposable for Container {
  /// Runs destroy hooks of every created singleton, newest first.
  ///
  /// A failing hook does not stop the remaining ones; the first failure is
  /// returned along with the ids of all beans whose hooks failed.
  fn dispose(&self) -> Result<()> {
    if self.disposed.swap(true, Ordering::AcqRel) {
      trace!("Registry already disposed");
      return Ok(());
    }

    let created = std::mem::take(&mut *self.created.lock());
    info!(singletons = created.len(), "Disposing registry");

    let mut failed = Vec::new();
    let mut first_error = None;
    for id in created.iter().rev() {
      let Some(entry) = self.beans.get(id) else {
        continue;
      };
      let (Some(destroy), Provider::Singleton { cell, .. }) = (&entry.destroy, &entry.provider) else {
        continue;
      };
      let Some(instance) = cell.get() else {
        continue;
      };

      debug!(bean = %id, "Running destroy hook");
      if let Err(e) = destroy(instance) {
        warn!(bean = %id, error = %e, "Destroy hook failed");
        failed.push(id.clone());
        first_error.get_or_insert(e);
      }
    }

    match first_error {
      None => Ok(()),
      Some(source) => Err(Error::Destroy {
        beans: failed,
        source,
      }),
    }
  }
}
