mod common;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use common::{ManifestBuilder, WorkspaceBuilder};
use monorun::scheduler::{topological_order, visit_in_order_parallel};
use monorun::workspace::Workspace;
use proptest::prelude::*;

// Acyclic by construction: unit N may only depend on units 0..N-1.
fn dag_strategy(max_units: usize) -> impl Strategy<Value = Workspace> {
    (1..=max_units).prop_flat_map(|count| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..count),
            count,
        );
        let order = Just((0..count).collect::<Vec<_>>()).prop_shuffle();

        (deps, order).prop_map(move |(raw_deps, order)| {
            let mut builder = WorkspaceBuilder::new();
            // Declare units in shuffled order so discovery order is not a
            // topological order already.
            for i in order {
                let mut manifest = ManifestBuilder::new(&format!("unit_{i}"));
                let valid: HashSet<usize> = raw_deps[i]
                    .iter()
                    .filter(|_| i > 0)
                    .map(|d| d % i.max(1))
                    .collect();
                for dep in valid {
                    manifest = manifest.dep(&format!("unit_{dep}"));
                }
                builder = builder.unit(manifest);
            }
            builder.build()
        })
    })
}

proptest! {
    #[test]
    fn order_respects_every_dependency(ws in dag_strategy(12)) {
        let order = topological_order(&ws);
        prop_assert_eq!(order.len(), ws.len());

        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, u)| (u.name.as_str(), i))
            .collect();

        for unit in ws.units() {
            for dep in ws.dependencies_of(unit) {
                prop_assert!(
                    position[dep] < position[unit.name.as_str()],
                    "{} must come after {}", unit.name, dep
                );
            }
        }
    }

    #[test]
    fn parallel_visitors_start_after_dependencies_finish(
        ws in dag_strategy(10),
        yields in proptest::collection::vec(0..4usize, 10),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&events);
        let yields = Arc::new(yields);
        runtime
            .block_on(visit_in_order_parallel(&ws, None, move |unit, _node| {
                let log = Arc::clone(&log);
                let yields = Arc::clone(&yields);
                async move {
                    log.lock().unwrap().push(format!("start:{}", unit.name));
                    let index: usize = unit.name["unit_".len()..].parse().unwrap();
                    for _ in 0..yields[index % yields.len()] {
                        tokio::task::yield_now().await;
                    }
                    log.lock().unwrap().push(format!("end:{}", unit.name));
                    Ok(())
                }
            }))
            .unwrap();

        let events = events.lock().unwrap().clone();
        prop_assert_eq!(events.len(), ws.len() * 2);
        let position = |event: String| events.iter().position(|e| *e == event).unwrap();

        for unit in ws.units() {
            let start = position(format!("start:{}", unit.name));
            for dep in ws.dependencies_of(unit) {
                prop_assert!(
                    position(format!("end:{dep}")) < start,
                    "{} started before {} finished: {:?}", unit.name, dep, events
                );
            }
        }
    }
}
