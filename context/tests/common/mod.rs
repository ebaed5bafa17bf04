#![allow(dead_code)]

use fibre_registry::{Disposable, Error, Registry, RegistryLoader, Result};
use std::any::Any;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port(pub u16);

pub type StubBean = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Wraps a value so every load hands out a fresh `Arc` of it.
pub fn bean<T: Any + Clone + Send + Sync>(value: T) -> StubBean {
  Arc::new(move || -> Box<dyn Any + Send + Sync> { Box::new(Arc::new(value.clone())) })
}

/// Shared counters observing what the stubs were asked to do.
#[derive(Clone, Default)]
pub struct Probe {
  loads: Arc<AtomicUsize>,
  disposals: Arc<AtomicUsize>,
  received: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Probe {
  pub fn loads(&self) -> usize {
    self.loads.load(Ordering::SeqCst)
  }

  pub fn disposals(&self) -> usize {
    self.disposals.load(Ordering::SeqCst)
  }

  /// The source lists passed to `load`, one entry per call.
  pub fn received(&self) -> Vec<Vec<String>> {
    self.received.lock().unwrap().clone()
  }
}

pub struct StubRegistry {
  beans: Vec<(String, Box<dyn Any + Send + Sync>)>,
  disposable: bool,
  fail_dispose: bool,
  probe: Probe,
}

impl Registry for StubRegistry {
  fn get_unique<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let matches: Vec<(&String, &Arc<T>)> = self
      .beans
      .iter()
      .filter_map(|(id, bean)| bean.downcast_ref::<Arc<T>>().map(|bean| (id, bean)))
      .collect();
    match matches.as_slice() {
      [] => Err(Error::NoSuchBean {
        type_name: std::any::type_name::<T>(),
      }),
      [(_, bean)] => Ok(Arc::clone(bean)),
      several => Err(Error::NotUnique {
        type_name: std::any::type_name::<T>(),
        candidates: several.iter().map(|(id, _)| (*id).clone()).collect(),
      }),
    }
  }

  fn disposer(&self) -> Option<&dyn Disposable> {
    if self.disposable {
      Some(self)
    } else {
      None
    }
  }
}

impl Disposable for StubRegistry {
  fn dispose(&self) -> Result<()> {
    self.probe.disposals.fetch_add(1, Ordering::SeqCst);
    if self.fail_dispose {
      return Err(Error::Destroy {
        beans: vec!["stub".to_string()],
        source: "stub refused to close".into(),
      });
    }
    Ok(())
  }
}

/// A loader serving canned sources. Later sources replace beans with the same id.
pub struct StubLoader {
  sources: HashMap<String, Vec<(String, StubBean)>>,
  disposable: bool,
  fail_dispose: bool,
  probe: Probe,
}

impl StubLoader {
  pub fn new(probe: &Probe) -> Self {
    Self {
      sources: HashMap::new(),
      disposable: true,
      fail_dispose: false,
      probe: probe.clone(),
    }
  }

  pub fn source(mut self, name: &str, beans: Vec<(&str, StubBean)>) -> Self {
    let beans = beans
      .into_iter()
      .map(|(id, bean)| (id.to_string(), bean))
      .collect();
    self.sources.insert(name.to_string(), beans);
    self
  }

  pub fn without_disposal(mut self) -> Self {
    self.disposable = false;
    self
  }

  pub fn failing_disposal(mut self) -> Self {
    self.fail_dispose = true;
    self
  }
}

impl RegistryLoader for StubLoader {
  type Registry = StubRegistry;

  fn load(&self, sources: &[String]) -> Result<StubRegistry> {
    self.probe.loads.fetch_add(1, Ordering::SeqCst);
    self.probe.received.lock().unwrap().push(sources.to_vec());

    let mut merged: Vec<(String, StubBean)> = Vec::new();
    for name in sources {
      let beans = self.sources.get(name).ok_or_else(|| Error::Io {
        path: PathBuf::from(name),
        source: io::Error::new(io::ErrorKind::NotFound, "no such stub source"),
      })?;
      for (id, bean) in beans {
        match merged.iter_mut().find(|(existing, _)| existing == id) {
          Some(slot) => slot.1 = bean.clone(),
          None => merged.push((id.clone(), bean.clone())),
        }
      }
    }

    Ok(StubRegistry {
      beans: merged.into_iter().map(|(id, make)| (id, make())).collect(),
      disposable: self.disposable,
      fail_dispose: self.fail_dispose,
      probe: self.probe.clone(),
    })
  }
}
