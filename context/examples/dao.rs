use fibre_context::{resolve_once, ContextHandle};
use fibre_registry::{BeanCatalog, FileRegistryLoader};
use std::sync::Arc;

// Stands in for a pooled database connection that must be closed explicitly.
struct ConnectionPool {
  url: String,
  max_size: u32,
}

struct MonsterDao {
  pool: Arc<ConnectionPool>,
}

impl MonsterDao {
  fn describe(&self) -> String {
    format!("MonsterDao over {} (max {})", self.pool.url, self.pool.max_size)
  }
}

fn catalog() -> BeanCatalog {
  BeanCatalog::new()
    .register_with_destroy(
      "pool",
      |ctx| {
        Ok(ConnectionPool {
          url: ctx.property("url")?,
          max_size: ctx.optional_property("max_size")?.unwrap_or(8),
        })
      },
      |pool: &ConnectionPool| {
        println!("Closing pool {}", pool.url);
        Ok(())
      },
    )
    .register("monster_dao", |ctx| Ok(MonsterDao { pool: ctx.reference("pool")? }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let dir = tempfile::tempdir()?;
  let jdbc = dir.path().join("jdbc.yaml");
  let service = dir.path().join("service.yaml");
  std::fs::write(
    &jdbc,
    "beans:\n  - id: pool\n    kind: pool\n    properties:\n      url: mysql://localhost/spring\n",
  )?;
  std::fs::write(
    &service,
    "beans:\n  - id: monsterDao\n    kind: monster_dao\n    refs:\n      pool: pool\n",
  )?;
  let sources = [jdbc.display().to_string(), service.display().to_string()];

  let loader = FileRegistryLoader::new(catalog());

  // Long-lived handle: the registry stays open until disposed.
  let mut handle = ContextHandle::<MonsterDao>::open(&loader, sources.clone())?;
  println!("{}", handle.bean()?.describe());
  println!("Registry holds {:?}", handle.registry()?.bean_ids());
  handle.dispose()?;

  // One-shot lookup: loads, resolves and closes in a single call.
  let dao = resolve_once::<MonsterDao, _, _, _>(&loader, sources)?;
  println!("{}", dao.describe());

  Ok(())
}
