use fibre_registry::{Container, Disposable};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> Result<(), fibre_registry::Error> {
  let container = Container::new();

  // The container stores Arc<ConsoleLogger> but serves it as Arc<dyn Logger>.
  container.add_singleton_trait::<dyn Logger>("logger", |_| Arc::new(ConsoleLogger));

  // The factory receives the container and pulls its own dependency out of it.
  container.add_singleton("reports", |c| ReportService {
    logger: c
      .get_unique::<dyn Logger>()
      .unwrap_or_else(|e| panic!("logger missing: {e}")),
  });

  println!("Resolving the high-level service...");
  let report_service = container.get_unique::<ReportService>()?;
  report_service.generate_report();

  // Lookups for a type nobody registered fail instead of panicking.
  match container.get_unique::<String>() {
    Ok(_) => println!("Unexpectedly found a String bean"),
    Err(e) => println!("As expected: {e}"),
  }

  container.dispose()
}
