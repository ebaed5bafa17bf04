// This module handles configuration source parsing and validation.

pub mod raw;

use crate::error::{Error, Result};
use raw::{BeanDefinitionRaw, ConfigRaw};

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// How many instances a bean definition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
  /// One shared instance, created once and destroyed with the registry.
  #[default]
  Singleton,
  /// A fresh instance on every lookup. Never destroyed by the registry.
  Prototype,
}

/// A validated bean definition, tagged with the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BeanDefinition {
  pub id: String,
  pub kind: String,
  pub scope: Scope,
  pub lazy: bool,
  pub properties: serde_json::Map<String, serde_json::Value>,
  pub refs: HashMap<String, String>,
  pub source: String,
}

impl BeanDefinition {
  /// Whether the bean is created while the registry loads.
  pub fn is_eager(&self) -> bool {
    self.scope == Scope::Singleton && !self.lazy
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceFormat {
  Yaml,
  Json,
}

impl SourceFormat {
  pub(crate) fn from_path(path: &Path) -> Result<Self> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
        Ok(SourceFormat::Yaml)
      }
      Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SourceFormat::Json),
      _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
  }
}

/// Reads and parses one configuration source.
pub(crate) fn read_source(path: &Path) -> Result<ConfigRaw> {
  let format = SourceFormat::from_path(path)?;
  let file = File::open(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let reader = BufReader::new(file);
  let parse_error = |reason: String| Error::Parse {
    path: PathBuf::from(path),
    reason,
  };

  match format {
    SourceFormat::Yaml => serde_yaml::from_reader(reader).map_err(|e| parse_error(e.to_string())),
    SourceFormat::Json => serde_json::from_reader(reader).map_err(|e| parse_error(e.to_string())),
  }
}

/// Validates a parsed source and turns it into bean definitions.
pub(crate) fn process_raw_config(raw: ConfigRaw, source_name: &str) -> Result<Vec<BeanDefinition>> {
  let invalid = |message: String| Error::InvalidDefinition {
    source_name: source_name.to_owned(),
    message,
  };

  let mut seen = HashSet::new();
  let mut definitions = Vec::with_capacity(raw.beans.len());
  for (position, bean) in raw.beans.into_iter().enumerate() {
    let BeanDefinitionRaw {
      id,
      kind,
      scope,
      lazy,
      properties,
      refs,
    } = bean;

    let id = id.trim().to_owned();
    let kind = kind.trim().to_owned();
    if id.is_empty() {
      return Err(invalid(format!("bean #{} has an empty id", position + 1)));
    }
    if kind.is_empty() {
      return Err(invalid(format!("bean '{}' has an empty kind", id)));
    }
    if !seen.insert(id.clone()) {
      return Err(invalid(format!("bean '{}' is defined more than once", id)));
    }
    let refs: HashMap<String, String> = refs
      .into_iter()
      .map(|(name, target)| (name, target.trim().to_owned()))
      .collect();
    if let Some((name, _)) = refs.iter().find(|(_, target)| target.is_empty()) {
      return Err(invalid(format!("bean '{}' has an empty target for reference '{}'", id, name)));
    }

    definitions.push(BeanDefinition {
      id,
      kind,
      scope,
      lazy,
      properties,
      refs,
      source: source_name.to_owned(),
    });
  }
  Ok(definitions)
}
