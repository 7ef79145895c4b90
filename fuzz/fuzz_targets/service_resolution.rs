#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_injector::{Injector, Invoker, Scope};

// Builds a random scope tree, registers a marker in a few scopes and checks
// that every scope resolves it from its nearest registered ancestor.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (shape, marks) = data.split_at(data.len() / 2);

    let injector = Injector::new();
    let mut scopes: Vec<Scope> = vec![injector.root().clone()];
    let mut parents: Vec<Option<usize>> = vec![None];
    for (i, byte) in shape.iter().take(32).enumerate() {
        let parent = usize::from(*byte) % scopes.len();
        let child = scopes[parent].create_child(format!("scope-{}", i)).unwrap();
        scopes.push(child);
        parents.push(Some(parent));
    }

    let mut owners = Vec::new();
    for byte in marks.iter().take(8) {
        let owner = usize::from(*byte) % scopes.len();
        if scopes[owner].provide_value("marker", owner).is_ok() {
            owners.push(owner);
        }
    }

    for (node, scope) in scopes.iter().enumerate() {
        let mut expected = None;
        let mut current = Some(node);
        while let Some(n) = current {
            if owners.contains(&n) {
                expected = Some(n);
                break;
            }
            current = parents[n];
        }

        match (scope.invoke::<usize>("marker"), expected) {
            (Ok(found), Some(owner)) => assert_eq!(*found, owner),
            (Err(err), None) => assert!(err.is_not_found()),
            (got, want) => panic!("scope {} resolved {:?}, expected {:?}", node, got.ok(), want),
        }
    }
});
