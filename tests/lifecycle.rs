use ferrous_injector::{
    BoxError, CancellationToken, DiError, HealthCheck, Injector, InjectorOptions, Invoker,
    LifecycleObserver, Scope, Shutdown,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

struct Tracked {
    name: String,
    log: Log,
    fail_shutdown: bool,
}

impl Shutdown for Tracked {
    fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(self.name.clone());
        if self.fail_shutdown {
            Err(format!("{} refused to stop", self.name).into())
        } else {
            Ok(())
        }
    }
}

fn tracked(scope: &Scope, name: &str, log: &Log, fail_shutdown: bool) {
    let log = log.clone();
    let service = name.to_string();
    scope
        .lazy(name, move |_| {
            Ok(Tracked {
                name: service.clone(),
                log: log.clone(),
                fail_shutdown,
            })
        })
        .with_shutdown()
        .provide()
        .unwrap();
}

#[test]
fn test_shutdown_in_reverse_invocation_order() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "x", &log, false);
    tracked(&injector, "y", &log, false);

    injector.invoke::<Tracked>("x").unwrap();
    injector.invoke::<Tracked>("y").unwrap();

    let report = injector.shutdown();
    assert!(report.is_ok());
    assert_eq!(*log.lock().unwrap(), ["y", "x"]);
}

#[test]
fn test_dependency_shut_down_after_dependent() {
    // `db` is built (and ledgered) before `repo` finishes
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "db", &log, false);
    let repo_log = log.clone();
    injector
        .lazy("repo", move |ctx| {
            ctx.invoke::<Tracked>("db")?;
            Ok(Tracked {
                name: "repo".into(),
                log: repo_log.clone(),
                fail_shutdown: false,
            })
        })
        .with_shutdown()
        .provide()
        .unwrap();

    injector.invoke::<Tracked>("repo").unwrap();
    assert!(injector.shutdown().is_ok());
    assert_eq!(*log.lock().unwrap(), ["repo", "db"]);
}

#[test]
fn test_children_shut_down_before_parent() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "root-svc", &log, false);
    let child = injector.create_child("child").unwrap();
    tracked(&child, "child-svc", &log, false);
    let grandchild = child.create_child("grandchild").unwrap();
    tracked(&grandchild, "grandchild-svc", &log, false);

    injector.invoke::<Tracked>("root-svc").unwrap();
    child.invoke::<Tracked>("child-svc").unwrap();
    grandchild.invoke::<Tracked>("grandchild-svc").unwrap();

    let report = injector.shutdown();
    assert!(report.is_ok());
    assert_eq!(*log.lock().unwrap(), ["grandchild-svc", "child-svc", "root-svc"]);
    assert_eq!(report.services.len(), 3);
    assert!(injector.children().is_empty());
}

#[test]
fn test_never_invoked_services_are_skipped() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "used", &log, false);
    tracked(&injector, "idle", &log, false);
    injector.invoke::<Tracked>("used").unwrap();

    let report = injector.shutdown();
    assert_eq!(report.services.len(), 1);
    assert_eq!(*log.lock().unwrap(), ["used"]);
    assert!(injector.has_service("idle"));
    assert!(!injector.has_service("used"));
}

#[test]
fn test_invoke_after_shutdown_is_not_found() {
    let injector = Injector::new();
    injector.provide_value("eager", 1u8).unwrap();
    injector.provide_lazy("lazy", |_| Ok(2u8)).unwrap();
    injector.provide_transient("transient", |_| Ok(3u8)).unwrap();
    injector.invoke::<u8>("eager").unwrap();
    injector.invoke::<u8>("lazy").unwrap();
    injector.invoke::<u8>("transient").unwrap();

    assert!(injector.shutdown().is_ok());

    assert!(injector.invoke::<u8>("eager").unwrap_err().is_not_found());
    assert!(injector.invoke::<u8>("lazy").unwrap_err().is_not_found());
    // Transients hold nothing and stay available
    assert_eq!(*injector.invoke::<u8>("transient").unwrap(), 3);
}

#[test]
fn test_failures_are_aggregated() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "first", &log, true);
    tracked(&injector, "second", &log, false);
    tracked(&injector, "third", &log, true);
    let child = injector.create_child("worker").unwrap();
    tracked(&child, "job", &log, true);

    for name in ["first", "second", "third"] {
        injector.invoke::<Tracked>(name).unwrap();
    }
    child.invoke::<Tracked>("job").unwrap();

    let report = injector.shutdown();
    assert_eq!(*log.lock().unwrap(), ["job", "third", "second", "first"]);
    assert_eq!(report.services.len(), 4);
    assert_eq!(report.errors.len(), 3);
    for (edge, err) in &report.errors {
        assert!(matches!(err, DiError::ShutdownFailure { service, .. } if *service == edge.service));
    }

    // The failing child stays attached
    assert_eq!(injector.children().len(), 1);

    let errors = report.into_result().unwrap_err();
    let message = errors.to_string();
    assert!(message.starts_with("DI: shutdown errors:"));
    assert!(message.contains("worker > job"));
    assert!(message.contains("[root] > first"));
    assert!(!message.contains("second"));
}

#[test]
fn test_shutdown_hook_panic_is_contained() {
    struct Explosive;
    impl Shutdown for Explosive {
        fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
            panic!("kaboom")
        }
    }

    let injector = Injector::new();
    injector.value("explosive", Explosive).with_shutdown().provide().unwrap();
    injector.invoke::<Explosive>("explosive").unwrap();

    let report = injector.shutdown();
    let err = report.errors.values().next().unwrap();
    assert!(err.to_string().contains("kaboom"));
}

#[test]
fn test_shutdown_service_runs_hook_without_invocation() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    injector
        .value(
            "cache",
            Tracked {
                name: "cache".into(),
                log: log.clone(),
                fail_shutdown: false,
            },
        )
        .with_shutdown()
        .provide()
        .unwrap();

    injector.shutdown_service("cache").unwrap();
    assert_eq!(*log.lock().unwrap(), ["cache"]);
    assert!(!injector.has_service("cache"));
    assert!(injector.shutdown_service("cache").unwrap_err().is_not_found());
}

#[test]
fn test_alias_shutdown_delegates_once() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "impl", &log, false);
    injector
        .provide_alias("facade", "impl", |t: Arc<Tracked>| t)
        .unwrap();

    injector.invoke_as::<Tracked>("facade").unwrap();
    let report = injector.shutdown();
    assert!(report.is_ok());
    assert_eq!(*log.lock().unwrap(), ["impl"]);
}

trait Named: Send + Sync {
    fn name(&self) -> &str;
}

impl Named for Tracked {
    fn name(&self) -> &str {
        &self.name
    }
}

#[test]
fn test_child_alias_leaves_ancestor_target_running() {
    let log: Log = Arc::default();
    let injector = Injector::new();
    tracked(&injector, "conn", &log, false);
    let request = injector.create_child("req").unwrap();
    request
        .provide_alias("db", "conn", |t: Arc<Tracked>| t as Arc<dyn Named>)
        .unwrap();

    assert_eq!(request.invoke_as::<dyn Named>("db").unwrap().name(), "conn");
    let before = injector.invoke::<Tracked>("conn").unwrap();

    let report = request.shutdown();
    assert!(report.is_ok());
    let services: Vec<String> = report.services.iter().map(|e| e.to_string()).collect();
    assert_eq!(services, ["req/db"]);
    assert!(log.lock().unwrap().is_empty());

    // The root singleton is still the same instance
    let after = injector.invoke::<Tracked>("conn").unwrap();
    assert!(Arc::ptr_eq(&before, &after));

    assert!(injector.shutdown().is_ok());
    assert_eq!(*log.lock().unwrap(), ["conn"]);
}

struct Pinger {
    healthy: bool,
    delay: Duration,
    checks: Arc<AtomicUsize>,
}

impl HealthCheck for Pinger {
    fn health_check(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        token.throw_if_cancelled()?;
        if self.healthy {
            Ok(())
        } else {
            Err("ping failed".into())
        }
    }
}

fn pinger(scope: &Scope, name: &str, healthy: bool, delay: Duration, checks: &Arc<AtomicUsize>) {
    scope
        .value(
            name,
            Pinger {
                healthy,
                delay,
                checks: checks.clone(),
            },
        )
        .with_health_check()
        .provide()
        .unwrap();
}

#[test]
fn test_health_check_reports_each_service() {
    let checks = Arc::new(AtomicUsize::new(0));
    let injector = Injector::new();
    pinger(&injector, "db", true, Duration::ZERO, &checks);
    pinger(&injector, "cache", false, Duration::ZERO, &checks);
    injector.provide_value("plain", 1u8).unwrap();

    let report = injector.health_check();
    assert_eq!(report.len(), 3);
    assert!(!report.is_healthy());
    assert!(report.get("db").unwrap().is_ok());
    assert!(report.get("plain").unwrap().is_ok());
    assert!(matches!(
        report.get("cache"),
        Some(Err(DiError::HealthCheckFailure { .. }))
    ));
    assert_eq!(report.errors().count(), 1);
    assert_eq!(checks.load(Ordering::SeqCst), 2);
}

#[test]
fn test_health_check_merges_ancestors_with_local_shadowing() {
    let checks = Arc::new(AtomicUsize::new(0));
    let injector = Injector::new();
    pinger(&injector, "db", false, Duration::ZERO, &checks);
    pinger(&injector, "queue", true, Duration::ZERO, &checks);
    let child = injector.create_child("child").unwrap();
    pinger(&child, "db", true, Duration::ZERO, &checks);

    let report = child.health_check();
    assert_eq!(report.len(), 2);
    assert!(report.is_healthy());
    assert_eq!(checks.load(Ordering::SeqCst), 2);

    assert!(child.health_check_service("queue").is_ok());
    assert!(injector.health_check_service("db").is_err());
    assert!(injector.health_check_service("nope").unwrap_err().is_not_found());
}

#[test]
fn test_health_check_never_builds_lazy_services() {
    let built = Arc::new(AtomicBool::new(false));
    let flag = built.clone();
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = checks.clone();

    let injector = Injector::new();
    injector
        .lazy("lazy-pinger", move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(Pinger {
                healthy: false,
                delay: Duration::ZERO,
                checks: counter.clone(),
            })
        })
        .with_health_check()
        .provide()
        .unwrap();

    let report = injector.health_check();
    assert!(report.is_healthy());
    assert!(!built.load(Ordering::SeqCst));

    injector.invoke::<Pinger>("lazy-pinger").unwrap();
    assert!(!injector.health_check().is_healthy());
    assert_eq!(checks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_health_check_timeout() {
    let checks = Arc::new(AtomicUsize::new(0));
    let injector = Injector::with_options(
        InjectorOptions::new().with_health_check_timeout(Duration::from_millis(50)),
    );
    pinger(&injector, "slow", true, Duration::from_millis(500), &checks);
    pinger(&injector, "fast", true, Duration::ZERO, &checks);

    let report = injector.health_check();
    assert!(report.get("fast").unwrap().is_ok());
    match report.get("slow") {
        Some(Err(DiError::HealthCheckTimeout { service, timeout })) => {
            assert_eq!(service, "slow");
            assert!(timeout.is_some());
        }
        other => panic!("expected HealthCheckTimeout, got {:?}", other),
    }
}

#[test]
fn test_health_check_with_cancelled_token() {
    let checks = Arc::new(AtomicUsize::new(0));
    let injector = Injector::new();
    pinger(&injector, "db", true, Duration::ZERO, &checks);

    let token = CancellationToken::new();
    token.cancel();
    let report = injector.health_check_with(&token);
    assert!(matches!(report.get("db"), Some(Err(DiError::Cancelled { .. }))));
    assert_eq!(checks.load(Ordering::SeqCst), 0);
}

#[test]
fn test_health_check_parallelism_bound() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    struct Gauge {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl HealthCheck for Gauge {
        fn health_check(&self, _token: &CancellationToken) -> Result<(), BoxError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let injector = Injector::with_options(InjectorOptions::new().with_health_check_parallelism(2));
    for i in 0..8 {
        injector
            .value(
                format!("gauge-{}", i),
                Gauge {
                    active: active.clone(),
                    peak: peak.clone(),
                },
            )
            .with_health_check()
            .provide()
            .unwrap();
    }

    assert!(injector.health_check().is_healthy());
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[derive(Default)]
struct Events {
    seen: Mutex<Vec<String>>,
}

impl LifecycleObserver for Events {
    fn before_registration(&self, scope: &Scope, service: &str) {
        // Not visible until the insert happens
        let status = if scope.has_service(service) { "replacing" } else { "registering" };
        self.seen.lock().unwrap().push(format!("{}:{}", status, service));
    }

    fn after_registration(&self, _scope: &Scope, service: &str) {
        self.seen.lock().unwrap().push(format!("registered:{}", service));
    }

    fn after_invocation(
        &self,
        _scope: &Scope,
        service: &str,
        result: Result<(), &DiError>,
        _elapsed: Duration,
    ) {
        let status = if result.is_ok() { "ok" } else { "err" };
        self.seen.lock().unwrap().push(format!("invoked:{}:{}", service, status));
    }

    fn before_shutdown(&self, _scope: &Scope, service: &str) {
        self.seen.lock().unwrap().push(format!("stopping:{}", service));
    }

    fn after_shutdown(&self, scope: &Scope, service: &str, _result: Result<(), &DiError>) {
        // Observers run outside registry locks
        assert!(!scope.has_service(service));
        self.seen.lock().unwrap().push(format!("stopped:{}", service));
    }
}

#[test]
fn test_observer_sees_lifecycle() {
    let events = Arc::new(Events::default());
    let injector = Injector::with_options(InjectorOptions::new().with_observer(events.clone()));
    injector.provide_value("svc", 1u8).unwrap();
    injector.invoke::<u8>("svc").unwrap();
    injector.invoke::<u8>("missing").unwrap_err();
    injector.shutdown();

    assert_eq!(
        *events.seen.lock().unwrap(),
        [
            "registering:svc",
            "registered:svc",
            "invoked:svc:ok",
            "stopping:svc",
            "stopped:svc"
        ]
    );
}

#[test]
fn test_observer_sees_registrations_before_insert() {
    let events = Arc::new(Events::default());
    let injector = Injector::with_options(InjectorOptions::new().with_observer(events.clone()));
    injector.provide_value("svc", 1u8).unwrap();
    assert!(injector.provide_value("svc", 2u8).is_err());
    injector.override_value("svc", 3u8);

    assert_eq!(
        *events.seen.lock().unwrap(),
        [
            "registering:svc",
            "registered:svc",
            "replacing:svc",
            "registered:svc"
        ]
    );
    assert_eq!(*injector.invoke::<u8>("svc").unwrap(), 3);
}

#[test]
fn test_tracing_observer_under_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("ferrous_injector=trace"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let injector = Injector::with_options(
            InjectorOptions::new().with_observer(Arc::new(ferrous_injector::TracingObserver::new())),
        );
        injector.provide_lazy("svc", |_| Ok(1u8)).unwrap();
        injector.invoke::<u8>("svc").unwrap();
        assert!(injector.health_check().is_healthy());
        assert!(injector.shutdown().is_ok());
        assert!(!injector.has_service("svc"));
    });
}
