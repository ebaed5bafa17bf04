//! Core, non-public data structures for the registry.

use crate::config::Scope;
use crate::container::Container;
use crate::error::{BoxError, Error, Result};

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

thread_local! {
  // Beans currently being created on this thread. A bean showing up twice means
  // its factory (directly or through other beans) asked for itself again.
  static RESOLVING_STACK: RefCell<HashSet<ResolutionKey>> = RefCell::new(HashSet::new());
}

/// Identifies one bean of one container on the resolution stack.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct ResolutionKey {
  owner: usize,
  id: String,
}

impl ResolutionKey {
  pub(crate) fn new(owner: &Container, id: &str) -> Self {
    Self {
      owner: owner as *const Container as usize,
      id: id.to_owned(),
    }
  }
}

impl fmt::Debug for ResolutionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key(Container({:#x}), Bean({}))", self.owner, self.id)
  }
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes the key onto the thread-local resolution stack and fails if
/// it is already there. Dropping the guard pops it again.
pub(crate) struct ResolutionGuard {
  key: ResolutionKey,
}

impl ResolutionGuard {
  pub(crate) fn enter(key: ResolutionKey) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      // `insert` returns `false` if the value was already present.
      if !stack.borrow_mut().insert(key.clone()) {
        return Err(Error::CircularDependency(key.id.clone()));
      }
      Ok(Self { key })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

/// The concrete (or trait object) type a bean is registered as.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct BeanType {
  pub(crate) id: TypeId,
  pub(crate) name: &'static str,
}

impl BeanType {
  pub(crate) fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
    }
  }
}

impl fmt::Debug for BeanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A type-erased bean. Always holds an `Arc<T>` for the bean's registered `T`.
pub(crate) type Instance = Box<dyn Any + Send + Sync>;

pub(crate) type Factory =
  Arc<dyn Fn(&Container) -> std::result::Result<Instance, BoxError> + Send + Sync>;

pub(crate) type DestroyHook = Arc<dyn Fn(&Instance) -> std::result::Result<(), BoxError> + Send + Sync>;

pub(crate) enum Provider {
  Singleton {
    cell: once_cell::sync::OnceCell<Instance>,
    factory: Factory,
  },
  Prototype {
    factory: Factory,
  },
}

impl Provider {
  pub(crate) fn new(scope: Scope, factory: Factory) -> Self {
    match scope {
      Scope::Singleton => Provider::Singleton {
        cell: once_cell::sync::OnceCell::new(),
        factory,
      },
      Scope::Prototype => Provider::Prototype { factory },
    }
  }
}

pub(crate) struct BeanEntry {
  pub(crate) bean_type: BeanType,
  pub(crate) provider: Provider,
  pub(crate) destroy: Option<DestroyHook>,
}

impl BeanEntry {
  pub(crate) fn is_singleton(&self) -> bool {
    matches!(self.provider, Provider::Singleton { .. })
  }
}

/// Wraps a typed factory so it produces type-erased instances.
pub(crate) fn erase_factory<T, F>(factory: F) -> Factory
where
  T: ?Sized + Any + Send + Sync,
  F: Fn(&Container) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
{
  Arc::new(move |container: &Container| factory(container).map(|bean| Box::new(bean) as Instance))
}

/// Wraps a typed destroy hook so it can run against a type-erased instance.
pub(crate) fn erase_destroy<T, D>(destroy: D) -> DestroyHook
where
  T: ?Sized + Any + Send + Sync,
  D: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
  Arc::new(move |instance: &Instance| match instance.downcast_ref::<Arc<T>>() {
    Some(bean) => destroy(bean),
    None => Err(format!("destroy hook expected an instance of {}", type_name::<T>()).into()),
  })
}
