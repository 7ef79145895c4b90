//! Property-based tests for scope visibility and cycle detection
//!
//! These tests verify that resolution follows the scope tree for arbitrary
//! tree shapes and that any provider ring is reported as a cycle.

use ferrous_injector::{DiError, Injector, Invoker, Scope};
use proptest::prelude::*;

/// Random tree: node `i + 1` hangs under `parents[i] % (i + 1)`.
fn build_tree(injector: &Injector, parents: &[usize]) -> (Vec<Scope>, Vec<Option<usize>>) {
    let mut scopes = vec![injector.root().clone()];
    let mut parent_of = vec![None];
    for (i, raw) in parents.iter().enumerate() {
        let parent = raw % (i + 1);
        let child = scopes[parent].create_child(format!("node-{}", i + 1)).unwrap();
        scopes.push(child);
        parent_of.push(Some(parent));
    }
    (scopes, parent_of)
}

fn is_ancestor_or_self(parent_of: &[Option<usize>], ancestor: usize, mut node: usize) -> bool {
    loop {
        if node == ancestor {
            return true;
        }
        match parent_of[node] {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}

proptest! {
    #[test]
    fn visibility_follows_ancestry(
        parents in prop::collection::vec(any::<usize>(), 0..12),
        owner_seed in any::<usize>(),
    ) {
        let injector = Injector::new();
        let (scopes, parent_of) = build_tree(&injector, &parents);
        let owner = owner_seed % scopes.len();
        scopes[owner].provide_value("marker", owner).unwrap();

        for (node, scope) in scopes.iter().enumerate() {
            let visible = is_ancestor_or_self(&parent_of, owner, node);
            prop_assert_eq!(scope.can_resolve("marker"), visible);
            match scope.invoke::<usize>("marker") {
                Ok(value) => {
                    prop_assert!(visible);
                    prop_assert_eq!(*value, owner);
                }
                Err(err) => {
                    prop_assert!(!visible);
                    prop_assert!(err.is_not_found());
                }
            }
        }
    }

    #[test]
    fn nearest_registration_wins(
        parents in prop::collection::vec(any::<usize>(), 1..12),
        seeds in prop::collection::vec(any::<usize>(), 1..4),
    ) {
        let injector = Injector::new();
        let (scopes, parent_of) = build_tree(&injector, &parents);
        let mut owners: Vec<usize> = seeds.iter().map(|s| s % scopes.len()).collect();
        owners.sort();
        owners.dedup();
        for &owner in &owners {
            scopes[owner].provide_value("value", owner).unwrap();
        }

        for (node, scope) in scopes.iter().enumerate() {
            // Walk up from `node` to the first registered owner
            let mut expected = None;
            let mut current = Some(node);
            while let Some(n) = current {
                if owners.contains(&n) {
                    expected = Some(n);
                    break;
                }
                current = parent_of[n];
            }
            let resolved = scope.invoke::<usize>("value").ok().map(|v| *v);
            prop_assert_eq!(resolved, expected);
        }
    }

    #[test]
    fn provider_ring_is_circular(len in 1usize..6, start in any::<usize>()) {
        let injector = Injector::new();
        for i in 0..len {
            let next = format!("svc-{}", (i + 1) % len);
            injector
                .provide_lazy(format!("svc-{}", i), move |ctx| Ok(*ctx.invoke::<u8>(&next)?))
                .unwrap();
        }

        let first = start % len;
        match injector.invoke::<u8>(&format!("svc-{}", first)) {
            Err(DiError::Circular(chain)) => {
                prop_assert_eq!(chain.len(), len + 1);
                prop_assert_eq!(chain.first(), chain.last());
                prop_assert_eq!(&chain[0], &format!("svc-{}", first));
            }
            other => prop_assert!(false, "expected Circular, got {:?}", other),
        }
        prop_assert!(injector.list_invoked().is_empty());
    }
}
