//! Loads a `Container` from YAML/JSON configuration files.

use crate::catalog::BeanCatalog;
use crate::config::{process_raw_config, read_source, BeanDefinition};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::traits::{Disposable, RegistryLoader};

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options controlling how configuration sources are located and merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
  /// Directory that relative locators are resolved against.
  pub base_dir: Option<PathBuf>,
  /// Whether a later source may redefine a bean id from an earlier one.
  pub allow_override: bool,
}

impl Default for LoaderOptions {
  fn default() -> Self {
    Self {
      base_dir: None,
      allow_override: true,
    }
  }
}

impl LoaderOptions {
  /// Environment variable naming the base directory for relative locators.
  pub const BASE_DIR_ENV: &'static str = "FIBRE_CONTEXT_DIR";

  /// Default options, with `base_dir` taken from `FIBRE_CONTEXT_DIR` when set.
  pub fn from_env() -> Self {
    let base_dir = env::var_os(Self::BASE_DIR_ENV)
      .filter(|dir| !dir.is_empty())
      .map(PathBuf::from);
    Self {
      base_dir,
      ..Self::default()
    }
  }

  pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.base_dir = Some(dir.into());
    self
  }

  pub fn allow_override(mut self, allow: bool) -> Self {
    self.allow_override = allow;
    self
  }
}

/// A [`RegistryLoader`] reading bean definitions from files.
///
/// Sources are read in order and merged by bean id. Every bean's `kind` must be
/// registered in the loader's [`BeanCatalog`]. Non-lazy singletons are created
/// before `load` returns, so a broken factory fails the load rather than the
/// first lookup.
#[derive(Debug, Clone)]
pub struct FileRegistryLoader {
  catalog: BeanCatalog,
  options: LoaderOptions,
}

impl FileRegistryLoader {
  pub fn new(catalog: BeanCatalog) -> Self {
    Self::with_options(catalog, LoaderOptions::default())
  }

  pub fn with_options(catalog: BeanCatalog, options: LoaderOptions) -> Self {
    Self { catalog, options }
  }

  pub fn catalog(&self) -> &BeanCatalog {
    &self.catalog
  }

  pub fn options(&self) -> &LoaderOptions {
    &self.options
  }

  /// Maps a locator to a filesystem path, honouring `base_dir`.
  pub fn resolve_path(&self, locator: &str) -> PathBuf {
    let path = Path::new(locator);
    match &self.options.base_dir {
      Some(base) if path.is_relative() => base.join(path),
      _ => path.to_path_buf(),
    }
  }

  /// Reads every source and merges the definitions by id.
  ///
  /// A redefinition keeps the position of the first definition so creation
  /// order follows the order ids were first introduced.
  pub fn read_definitions(&self, sources: &[String]) -> Result<Vec<BeanDefinition>> {
    let mut merged: Vec<BeanDefinition> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for locator in sources {
      let path = self.resolve_path(locator);
      debug!(source = %path.display(), "Reading configuration source");
      let raw = read_source(&path)?;

      for definition in process_raw_config(raw, locator)? {
        match positions.get(&definition.id) {
          Some(&position) if self.options.allow_override => {
            debug!(
              bean = %definition.id,
              previous = %merged[position].source,
              source = %definition.source,
              "Overriding bean definition"
            );
            merged[position] = definition;
          }
          Some(_) => {
            return Err(Error::DuplicateBean {
              id: definition.id,
              source_name: definition.source,
            });
          }
          None => {
            positions.insert(definition.id.clone(), merged.len());
            merged.push(definition);
          }
        }
      }
    }
    Ok(merged)
  }
}

impl RegistryLoader for FileRegistryLoader {
  type Registry = Container;

  fn load(&self, sources: &[String]) -> Result<Container> {
    let definitions = self.read_definitions(sources)?;

    // Reject unknown kinds before anything gets created.
    if let Some(definition) = definitions
      .iter()
      .find(|definition| !self.catalog.contains(&definition.kind))
    {
      return Err(Error::UnknownKind {
        id: definition.id.clone(),
        kind: definition.kind.clone(),
      });
    }

    let eager: Vec<String> = definitions
      .iter()
      .filter(|definition| definition.is_eager())
      .map(|definition| definition.id.clone())
      .collect();

    let container = Container::new();
    let bean_count = definitions.len();
    for definition in definitions {
      self.catalog.bind(&container, definition)?;
    }

    for id in &eager {
      if let Err(e) = container.preinstantiate(id) {
        // Tear down whatever was already built before reporting the failure.
        if let Err(cleanup) = container.dispose() {
          warn!(error = %cleanup, "Failed to dispose partially loaded registry");
        }
        return Err(e);
      }
    }

    info!(
      sources = sources.len(),
      beans = bean_count,
      eager = eager.len(),
      "Registry loaded"
    );
    Ok(container)
  }
}
