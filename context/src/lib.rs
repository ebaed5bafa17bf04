//! # Fibre Context
//!
//! Typed handles to a single bean resolved from a configuration-backed registry.
//!
//! A [`ContextHandle<T>`] loads a registry through a [`RegistryLoader`], pulls
//! out the one bean of type `T`, and owns the registry until it is disposed.
//! [`resolve_once`] does all of that in a single call and releases the registry
//! before returning the bean.
//!
//! The loader and registry are pluggable. [`fibre_registry::FileRegistryLoader`]
//! reads YAML/JSON bean definitions; anything implementing the
//! [`RegistryLoader`] and [`Registry`] traits works the same way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fibre_context::resolve_once;
//! use fibre_registry::{BeanCatalog, FileRegistryLoader};
//!
//! struct Mailer {
//!   host: String,
//!   port: u16,
//! }
//!
//! let catalog = BeanCatalog::new().register("mailer", |ctx| {
//!   Ok(Mailer {
//!     host: ctx.property("host")?,
//!     port: ctx.optional_property("port")?.unwrap_or(25),
//!   })
//! });
//! let loader = FileRegistryLoader::new(catalog);
//!
//! let mailer = resolve_once::<Mailer, _, _, _>(&loader, ["mail.yaml"])?;
//! println!("{}:{}", mailer.host, mailer.port);
//! # Ok::<(), fibre_context::Error>(())
//! ```

mod error;
mod handle;

pub use error::{Error, Result};
pub use handle::{resolve_once, ContextHandle};

pub use fibre_registry::{Disposable, Registry, RegistryLoader};
