mod common;

use common::{bean, Greeting, Port, Probe, StubLoader, StubRegistry};
use fibre_context::{resolve_once, ContextHandle, Error};
use pretty_assertions::assert_eq;
use std::panic::{self, AssertUnwindSafe};

fn greeting_loader(probe: &Probe) -> StubLoader {
  StubLoader::new(probe).source("app", vec![("greeting", bean(Greeting("hello".into())))])
}

type GreetingHandle = ContextHandle<Greeting, StubRegistry>;

// --- Construction ---

#[test]
fn test_open_resolves_the_single_matching_bean() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let handle = GreetingHandle::open(&loader, ["app"]).unwrap();

  assert_eq!(**handle.bean().unwrap(), Greeting("hello".into()));
  assert_eq!(probe.loads(), 1);
  assert_eq!(probe.disposals(), 0);
}

#[test]
fn test_empty_sources_fail_before_loading() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let err = GreetingHandle::open(&loader, Vec::<String>::new()).unwrap_err();

  assert!(matches!(err, Error::InvalidArgument(_)));
  assert_eq!(probe.loads(), 0);
}

#[test]
fn test_blank_source_fails_before_loading() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let err = GreetingHandle::open(&loader, ["app", "  "]).unwrap_err();

  match err {
    Error::InvalidArgument(message) => assert_eq!(message, "configuration source #2 is blank"),
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(probe.loads(), 0);
}

#[test]
fn test_load_failure_is_reported_without_disposal() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let err = GreetingHandle::open(&loader, ["missing"]).unwrap_err();

  assert!(matches!(err, Error::ConfigLoad(fibre_registry::Error::Io { .. })));
  assert_eq!(probe.loads(), 1);
  assert_eq!(probe.disposals(), 0);
}

#[test]
fn test_zero_matches_release_the_registry() {
  let probe = Probe::default();
  let loader = StubLoader::new(&probe).source("ports", vec![("http", bean(Port(80)))]);

  let err = GreetingHandle::open(&loader, ["ports"]).unwrap_err();

  match err {
    Error::TypeResolution { source, cleanup, .. } => {
      assert!(matches!(source, fibre_registry::Error::NoSuchBean { .. }));
      assert!(cleanup.is_none());
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_several_matches_release_the_registry() {
  let probe = Probe::default();
  let loader = StubLoader::new(&probe).source(
    "app",
    vec![
      ("english", bean(Greeting("hello".into()))),
      ("french", bean(Greeting("bonjour".into()))),
    ],
  );

  let err = GreetingHandle::open(&loader, ["app"]).unwrap_err();

  match err {
    Error::TypeResolution { source, .. } => match source {
      fibre_registry::Error::NotUnique { candidates, .. } => {
        assert_eq!(candidates, vec!["english", "french"])
      }
      other => panic!("unexpected source: {other}"),
    },
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_failed_cleanup_is_attached_to_resolution_error() {
  let probe = Probe::default();
  let loader = StubLoader::new(&probe)
    .source("empty", vec![])
    .failing_disposal();

  let err = GreetingHandle::open(&loader, ["empty"]).unwrap_err();

  match err {
    Error::TypeResolution { cleanup, .. } => {
      assert!(matches!(cleanup, Some(fibre_registry::Error::Destroy { .. })))
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_later_source_overrides_earlier_one() {
  let probe = Probe::default();
  let loader = StubLoader::new(&probe)
    .source("first", vec![("greeting", bean(Greeting("hello".into())))])
    .source("second", vec![("greeting", bean(Greeting("howdy".into())))]);

  let handle = GreetingHandle::open(&loader, ["first", "second"]).unwrap();

  assert_eq!(handle.bean().unwrap().0, "howdy");
  assert_eq!(probe.received(), vec![vec!["first".to_string(), "second".to_string()]]);
}

// --- Accessors & Disposal ---

#[test]
fn test_registry_accessor_passes_through() {
  let probe = Probe::default();
  let loader = StubLoader::new(&probe).source(
    "app",
    vec![
      ("greeting", bean(Greeting("hello".into()))),
      ("http", bean(Port(8080))),
    ],
  );

  let handle = GreetingHandle::open(&loader, ["app"]).unwrap();
  let registry = handle.registry().unwrap();

  use fibre_registry::Registry;
  assert_eq!(*registry.get_unique::<Port>().unwrap(), Port(8080));
  assert!(std::ptr::eq(registry, handle.registry().unwrap()));
}

#[test]
fn test_accessors_fail_after_dispose() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);
  let mut handle = GreetingHandle::open(&loader, ["app"]).unwrap();

  handle.dispose().unwrap();

  assert!(handle.is_disposed());
  assert!(matches!(handle.bean(), Err(Error::UseAfterDispose)));
  assert!(matches!(handle.registry(), Err(Error::UseAfterDispose)));
}

#[test]
fn test_dispose_is_idempotent() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);
  let mut handle = GreetingHandle::open(&loader, ["app"]).unwrap();

  handle.dispose().unwrap();
  handle.dispose().unwrap();
  drop(handle);

  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_dispose_without_capability_is_a_no_op() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe).without_disposal();
  let mut handle = GreetingHandle::open(&loader, ["app"]).unwrap();

  handle.dispose().unwrap();

  assert_eq!(probe.disposals(), 0);
}

#[test]
fn test_dispose_failure_is_surfaced() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe).failing_disposal();
  let mut handle = GreetingHandle::open(&loader, ["app"]).unwrap();

  let err = handle.dispose().unwrap_err();

  assert!(matches!(err, Error::Disposal(_)));
  assert!(handle.is_disposed());
}

#[test]
fn test_dropping_a_live_handle_disposes_it() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  {
    let _handle = GreetingHandle::open(&loader, ["app"]).unwrap();
  }

  assert_eq!(probe.disposals(), 1);
}

// --- One-shot Resolution ---

#[test]
fn test_resolve_once_matches_open_and_disposes() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let expected = GreetingHandle::open(&loader, ["app"]).unwrap().bean().unwrap().clone();
  assert_eq!(probe.disposals(), 1);

  let greeting = resolve_once::<Greeting, _, _, _>(&loader, ["app"]).unwrap();

  assert_eq!(greeting, expected);
  assert_eq!(probe.loads(), 2);
  assert_eq!(probe.disposals(), 2);
}

#[test]
fn test_resolve_once_wraps_disposal_failure() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe).failing_disposal();

  let err = resolve_once::<Greeting, _, _, _>(&loader, ["app"]).unwrap_err();

  assert!(matches!(err, Error::Disposal(_)));
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_resolve_once_propagates_construction_failure() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let err = resolve_once::<Port, _, _, _>(&loader, ["app"]).unwrap_err();

  assert!(matches!(err, Error::TypeResolution { .. }));
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_scoped_releases_registry_when_body_panics() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let result = panic::catch_unwind(AssertUnwindSafe(|| {
    let _ = GreetingHandle::scoped(&loader, ["app"], |_handle| -> () {
      panic!("body failed");
    });
  }));

  assert!(result.is_err());
  assert_eq!(probe.disposals(), 1);
}

#[test]
fn test_scoped_returns_body_output() {
  let probe = Probe::default();
  let loader = greeting_loader(&probe);

  let length = GreetingHandle::scoped(&loader, ["app"], |handle| {
    handle.bean().map(|greeting| greeting.0.len())
  })
  .unwrap()
  .unwrap();

  assert_eq!(length, 5);
  assert_eq!(probe.disposals(), 1);
}
