//! # Fibre Registry
//!
//! A thread-safe bean registry that can be populated from YAML or JSON
//! configuration files.
//!
//! ## Core Concepts
//!
//! - **Container**: holds beans under unique ids. Beans are singletons (created
//!   once, torn down with the container) or prototypes (created per lookup).
//! - **Catalog**: maps the `kind` names used in configuration files to Rust
//!   factories.
//! - **Loader**: reads configuration sources in order, lets later sources
//!   override earlier ones, and builds a `Container`.
//! - **Lookup by type**: `get_unique::<T>()` returns the one bean of type `T`
//!   and fails on zero or several candidates.
//! - **Disposal**: containers expose the [`Disposable`] capability, which runs
//!   destroy hooks in reverse creation order.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_registry::{Container, Disposable};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     (*self.message).clone()
//!   }
//! }
//!
//! let container = Container::new();
//! container.add_instance("greeting_message", String::from("Hello, World!"));
//! container.add_singleton_trait::<dyn Greeter>("greeter", |c| {
//!   let message = c.get::<String>("greeting_message").unwrap();
//!   Arc::new(EnglishGreeter { message })
//! });
//!
//! let greeter = container.get_unique::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//!
//! container.dispose().unwrap();
//! assert!(container.get_unique::<dyn Greeter>().is_err());
//! ```

mod catalog;
pub mod config;
mod container;
mod core;
mod error;
mod loader;
mod traits;

pub use catalog::{BeanCatalog, BeanContext};
pub use config::{BeanDefinition, Scope};
pub use container::Container;
pub use error::{BoxError, Error, Result};
pub use loader::{FileRegistryLoader, LoaderOptions};
pub use traits::{Disposable, Registry, RegistryLoader};
