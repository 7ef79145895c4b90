#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_injector::{DiError, Injector, Invoker};

const SERVICES: usize = 8;

// Byte `i` picks the dependency of `svc-i` (or none). Invoking every service
// must either succeed with the length of its chain or report a cycle that
// starts and ends with the same name.
fuzz_target!(|data: &[u8]| {
    let injector = Injector::new();
    let edges: Vec<Option<usize>> = (0..SERVICES)
        .map(|i| {
            let byte = data.get(i).copied().unwrap_or(0xff);
            if byte & 0x80 != 0 {
                None
            } else {
                Some(usize::from(byte) % SERVICES)
            }
        })
        .collect();

    for (i, dependency) in edges.iter().enumerate() {
        let dependency = dependency.map(|d| format!("svc-{}", d));
        injector
            .provide_lazy(format!("svc-{}", i), move |ctx| match &dependency {
                Some(name) => Ok(*ctx.invoke::<usize>(name)? + 1),
                None => Ok(0usize),
            })
            .unwrap();
    }

    for i in 0..SERVICES {
        // Follow the edges by hand to know what to expect
        let mut seen = vec![i];
        let mut current = i;
        let mut cyclic = false;
        while let Some(next) = edges[current] {
            if seen.contains(&next) {
                cyclic = true;
                break;
            }
            seen.push(next);
            current = next;
        }

        match injector.invoke::<usize>(&format!("svc-{}", i)) {
            Ok(depth) => {
                assert!(!cyclic);
                assert_eq!(*depth, seen.len() - 1);
            }
            Err(DiError::Circular(chain)) => {
                assert!(cyclic);
                assert!(chain.len() >= 2);
                assert!(chain.iter().filter(|n| *n == chain.last().unwrap()).count() >= 2);
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert!(injector.shutdown().is_ok());
});
