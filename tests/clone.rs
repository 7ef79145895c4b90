use ferrous_injector::{Injector, InjectorOptions, Invoker, LifecycleObserver, Scope};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_clone_tree_resets_lazy_services() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let injector = Injector::new();
    let tenant = injector.create_child("tenant").unwrap();
    tenant
        .provide_lazy("session", move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
        .unwrap();
    tenant.provide_value("config", "eu-west".to_string()).unwrap();
    tenant.create_child("request").unwrap();

    let original = tenant.invoke::<usize>("session").unwrap();
    let copy = tenant.clone_tree();

    assert_ne!(copy.id(), tenant.id());
    assert_eq!(copy.name(), "tenant");
    assert!(copy.list_invoked().is_empty());

    let copied = copy.invoke::<usize>("session").unwrap();
    assert_eq!((*original, *copied), (0, 1));
    assert!(Arc::ptr_eq(
        &tenant.invoke::<String>("config").unwrap(),
        &copy.invoke::<String>("config").unwrap()
    ));

    // The copy keeps its parent for lookups but is not one of its children
    assert_eq!(copy.parent().unwrap(), injector.root().clone());
    assert_eq!(injector.children(), vec![tenant.clone()]);
    assert_eq!(copy.children().len(), 1);
    assert_ne!(copy.children()[0].id(), tenant.children()[0].id());
}

#[test]
fn test_clone_is_independent_of_original_shutdown() {
    let injector = Injector::new();
    injector.provide_lazy("conn", |_| Ok(String::from("open"))).unwrap();
    injector.invoke::<String>("conn").unwrap();

    let copy = injector.clone_injector();
    assert!(injector.shutdown().is_ok());
    assert!(injector.invoke::<String>("conn").unwrap_err().is_not_found());
    assert_eq!(*copy.invoke::<String>("conn").unwrap(), "open");
}

#[derive(Default)]
struct Registrations(Mutex<Vec<String>>);

impl LifecycleObserver for Registrations {
    fn after_registration(&self, scope: &Scope, service: &str) {
        self.0.lock().unwrap().push(format!("{}:{}", scope.id(), service));
    }
}

#[test]
fn test_clone_notifies_registrations() {
    let observer = Arc::new(Registrations::default());
    let injector = Injector::with_options(InjectorOptions::new().with_observer(observer.clone()));
    injector.provide_value("a", 1u8).unwrap();
    injector.provide_value("b", 2u8).unwrap();

    let copy = injector.clone_injector();
    let seen = observer.0.lock().unwrap().clone();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[2], format!("{}:a", copy.id()));
    assert_eq!(seen[3], format!("{}:b", copy.id()));
}
