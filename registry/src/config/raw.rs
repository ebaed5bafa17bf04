// Structs directly mapping to the YAML/JSON source layout.

use serde::Deserialize;
use std::collections::HashMap;

use super::Scope;

// --- Top Level Source ---
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigRaw {
  #[serde(default)] // A source may define no beans at all
  pub beans: Vec<BeanDefinitionRaw>,
}

// --- Bean Definition ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BeanDefinitionRaw {
  pub id: String,
  /// Name of the catalog entry that builds this bean.
  pub kind: String,
  #[serde(default)]
  pub scope: Scope,
  /// Singletons are created while loading unless marked lazy.
  #[serde(default)]
  pub lazy: bool,
  #[serde(default)]
  pub properties: serde_json::Map<String, serde_json::Value>,
  /// Reference name -> id of another bean.
  #[serde(default)]
  pub refs: HashMap<String, String>,
}
