#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_injector::{DiError, Injector, Invoker, ServiceKind};

// Each pair of bytes is one registration: (kind and override flag, name).
fuzz_target!(|data: &[u8]| {
    let injector = Injector::new();

    for chunk in data.chunks_exact(2) {
        let op = chunk[0];
        let name = format!("svc-{}", chunk[1] % 16);
        let value = u32::from(chunk[1]);
        let replace = op & 0x80 != 0;
        let existed = injector.has_service(&name);

        let result = match (op % 3, replace) {
            (0, false) => injector.provide_value(name.clone(), value),
            (1, false) => injector.provide_lazy(name.clone(), move |_| Ok(value)),
            (2, false) => injector.provide_transient(name.clone(), move |_| Ok(value)),
            (0, true) => {
                injector.override_value(name.clone(), value);
                Ok(())
            }
            (1, true) => {
                injector.override_lazy(name.clone(), move |_| Ok(value));
                Ok(())
            }
            _ => {
                injector.override_transient(name.clone(), move |_| Ok(value));
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                assert!(replace || !existed);
                assert_eq!(*injector.invoke::<u32>(&name).unwrap(), value);
            }
            Err(DiError::AlreadyDeclared { service, .. }) => {
                assert!(existed);
                assert_eq!(service, name);
            }
            Err(other) => panic!("unexpected registration error: {}", other),
        }
        assert!(matches!(
            injector.service_kind(&name),
            Some(ServiceKind::Eager | ServiceKind::Lazy | ServiceKind::Transient)
        ));
    }

    assert!(injector.list_provided().len() <= 16);
    assert!(injector.shutdown().is_ok());
});
