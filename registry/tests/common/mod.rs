#![allow(dead_code)]

use fibre_registry::{BeanCatalog, BoxError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// A stand-in for something that owns a real resource, such as a connection pool.
#[derive(Debug, Deserialize, PartialEq)]
pub struct PoolSettings {
  pub url: String,
  #[serde(default = "default_max_size")]
  pub max_size: u32,
}

fn default_max_size() -> u32 {
  4
}

#[derive(Debug)]
pub struct Pool {
  pub name: String,
  pub settings: PoolSettings,
}

#[derive(Debug)]
pub struct Repository {
  pub table: String,
  pub pool: Arc<Pool>,
}

pub trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct PrefixGreeter {
  prefix: String,
}

impl Greeter for PrefixGreeter {
  fn greet(&self) -> String {
    format!("{}, world", self.prefix)
  }
}

/// Records the names of pools in the order their destroy hooks ran.
pub type ClosedLog = Arc<Mutex<Vec<String>>>;

pub fn catalog(closed: &ClosedLog) -> BeanCatalog {
  let closed = closed.clone();
  BeanCatalog::new()
    .register_with_destroy(
      "pool",
      |ctx| {
        Ok(Pool {
          name: ctx.id().to_string(),
          settings: ctx.properties()?,
        })
      },
      move |pool: &Pool| {
        closed.lock().unwrap().push(pool.name.clone());
        Ok(())
      },
    )
    .register("repository", |ctx| {
      Ok(Repository {
        table: ctx.property("table")?,
        pool: ctx.reference("pool")?,
      })
    })
    .register_trait::<dyn Greeter, _>("greeter", |ctx| {
      let prefix: Option<String> = ctx.optional_property("prefix")?;
      Ok(Arc::new(PrefixGreeter {
        prefix: prefix.unwrap_or_else(|| "Hello".to_string()),
      }) as Arc<dyn Greeter>)
    })
    .register("broken", |ctx| -> Result<Pool, BoxError> {
      Err(format!("bean '{}' refuses to start", ctx.id()).into())
    })
}

pub fn write(dir: &TempDir, name: &str, contents: &str) -> String {
  let path = dir.path().join(name);
  fs::write(&path, contents).unwrap();
  path_string(&path)
}

pub fn path_string(path: &Path) -> String {
  path.to_str().unwrap().to_string()
}

pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}
