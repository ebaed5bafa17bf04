//! Binds configuration `kind` names to the Rust factories that build them.

use crate::config::{BeanDefinition, Scope};
use crate::container::Container;
use crate::core::{erase_destroy, BeanEntry, BeanType, DestroyHook, Factory, Instance, Provider};
use crate::error::{BoxError, Error, Result};

use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type KindFactory =
  Arc<dyn Fn(&BeanContext<'_>) -> std::result::Result<Instance, BoxError> + Send + Sync>;

#[derive(Clone)]
struct BeanKind {
  bean_type: BeanType,
  factory: KindFactory,
  destroy: Option<DestroyHook>,
}

/// What a factory sees while building one bean.
pub struct BeanContext<'a> {
  container: &'a Container,
  definition: &'a BeanDefinition,
}

impl<'a> BeanContext<'a> {
  pub fn id(&self) -> &str {
    &self.definition.id
  }

  /// The configuration source the bean was defined in.
  pub fn source(&self) -> &str {
    &self.definition.source
  }

  pub fn container(&self) -> &'a Container {
    self.container
  }

  /// Deserializes a required property.
  pub fn property<V: DeserializeOwned>(&self, name: &str) -> Result<V> {
    self
      .optional_property(name)?
      .ok_or_else(|| Error::MissingProperty {
        id: self.definition.id.clone(),
        property: name.to_owned(),
      })
  }

  pub fn optional_property<V: DeserializeOwned>(&self, name: &str) -> Result<Option<V>> {
    match self.definition.properties.get(name) {
      None => Ok(None),
      Some(value) => serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|e| self.invalid_property(name, e)),
    }
  }

  /// Deserializes the whole property map into one typed struct.
  pub fn properties<V: DeserializeOwned>(&self) -> Result<V> {
    let map = serde_json::Value::Object(self.definition.properties.clone());
    serde_json::from_value(map).map_err(|e| self.invalid_property("*", e))
  }

  /// Resolves the bean that the named reference points at.
  pub fn reference<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let target = self
      .definition
      .refs
      .get(name)
      .ok_or_else(|| Error::MissingReference {
        id: self.definition.id.clone(),
        reference: name.to_owned(),
      })?;
    self.container.get::<T>(target)
  }

  fn invalid_property(&self, name: &str, e: serde_json::Error) -> Error {
    Error::InvalidProperty {
      id: self.definition.id.clone(),
      property: name.to_owned(),
      reason: e.to_string(),
    }
  }
}

/// The set of bean kinds a configuration source may refer to.
///
/// ```
/// use fibre_registry::BeanCatalog;
///
/// struct Greeting(String);
///
/// let catalog = BeanCatalog::new()
///   .register("greeting", |ctx| Ok(Greeting(ctx.property("text")?)));
/// assert!(catalog.contains("greeting"));
/// ```
#[derive(Clone, Default)]
pub struct BeanCatalog {
  kinds: HashMap<String, BeanKind>,
}

impl fmt::Debug for BeanCatalog {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BeanCatalog")
      .field("kinds", &self.kinds())
      .finish()
  }
}

impl BeanCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn insert<T: ?Sized + Any + Send + Sync>(
    mut self,
    kind: &str,
    factory: impl Fn(&BeanContext<'_>) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
    destroy: Option<DestroyHook>,
  ) -> Self {
    let factory: KindFactory =
      Arc::new(move |ctx: &BeanContext<'_>| factory(ctx).map(|bean| Box::new(bean) as Instance));
    self.kinds.insert(
      kind.to_owned(),
      BeanKind {
        bean_type: BeanType::of::<T>(),
        factory,
        destroy,
      },
    );
    self
  }

  // --- PUBLIC API ---

  /// Registers a kind producing beans of type `T`.
  pub fn register<T, F>(self, kind: &str, factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&BeanContext<'_>) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
  {
    self.insert::<T>(kind, move |ctx| factory(ctx).map(Arc::new), None)
  }

  /// Like [`register`](Self::register), with a hook run for each created
  /// singleton when the registry is disposed.
  pub fn register_with_destroy<T, F, D>(self, kind: &str, factory: F, destroy: D) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&BeanContext<'_>) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    D: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
  {
    self.insert::<T>(
      kind,
      move |ctx| factory(ctx).map(Arc::new),
      Some(erase_destroy::<T, _>(destroy)),
    )
  }

  /// Registers a kind whose beans resolve as the trait object `I`.
  pub fn register_trait<I, F>(self, kind: &str, factory: F) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&BeanContext<'_>) -> std::result::Result<Arc<I>, BoxError> + Send + Sync + 'static,
  {
    self.insert::<I>(kind, factory, None)
  }

  pub fn register_trait_with_destroy<I, F, D>(self, kind: &str, factory: F, destroy: D) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&BeanContext<'_>) -> std::result::Result<Arc<I>, BoxError> + Send + Sync + 'static,
    D: Fn(&I) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
  {
    self.insert::<I>(kind, factory, Some(erase_destroy::<I, _>(destroy)))
  }

  pub fn contains(&self, kind: &str) -> bool {
    self.kinds.contains_key(kind)
  }

  /// Returns the registered kind names, sorted.
  pub fn kinds(&self) -> Vec<&str> {
    let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
    kinds.sort_unstable();
    kinds
  }

  /// Registers `definition` in `container` using the factory of its kind.
  pub(crate) fn bind(&self, container: &Container, definition: BeanDefinition) -> Result<()> {
    let kind = self
      .kinds
      .get(&definition.kind)
      .ok_or_else(|| Error::UnknownKind {
        id: definition.id.clone(),
        kind: definition.kind.clone(),
      })?;

    let id = definition.id.clone();
    let scope = definition.scope;
    let build = kind.factory.clone();
    let factory: Factory = Arc::new(move |container: &Container| {
      build(&BeanContext {
        container,
        definition: &definition,
      })
    });

    container.insert_entry(
      &id,
      BeanEntry {
        bean_type: kind.bean_type,
        provider: Provider::new(scope, factory),
        // Prototypes are handed out and forgotten; only singletons get torn down.
        destroy: match scope {
          Scope::Singleton => kind.destroy.clone(),
          Scope::Prototype => None,
        },
      },
    );
    Ok(())
  }
}
