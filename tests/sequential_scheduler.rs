mod common;

use std::sync::{Arc, Mutex};

use common::{ManifestBuilder, WorkspaceBuilder};
use monorun::errors::MonorunError;
use monorun::scheduler::{
    Flow, topological_order, visit_dependents, visit_in_order, visit_in_reverse_order,
};
use monorun::workspace::Workspace;

/// c -> b -> a, declared out of order.
fn chain() -> Workspace {
    WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("c").dep("b"))
        .unit(ManifestBuilder::new("a"))
        .unit(ManifestBuilder::new("b").dep("a"))
        .build()
}

async fn collect_in_order(ws: &Workspace) -> Vec<String> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    visit_in_order(ws, move |unit| {
        sink.lock().unwrap().push(unit.name.clone());
        async { Ok(Flow::Continue) }
    })
    .await
    .unwrap();
    let out = seen.lock().unwrap().clone();
    out
}

#[tokio::test]
async fn dependencies_are_visited_first() {
    let ws = chain();
    assert_eq!(collect_in_order(&ws).await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn reverse_order_visits_dependents_first() {
    let ws = chain();
    let mut seen = Vec::new();
    let flow = visit_in_reverse_order(&ws, |unit| {
        seen.push(unit.name.clone());
        async { Ok(Flow::Continue) }
    })
    .await
    .unwrap();

    assert_eq!(flow, Flow::Continue);
    assert_eq!(seen, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn stop_ends_the_walk() {
    let ws = chain();
    let mut seen = Vec::new();
    let flow = visit_in_order(&ws, |unit| {
        seen.push(unit.name.clone());
        let flow = if unit.name == "b" { Flow::Stop } else { Flow::Continue };
        async move { Ok(flow) }
    })
    .await
    .unwrap();

    assert_eq!(flow, Flow::Stop);
    assert_eq!(seen, vec!["a", "b"]);
}

#[tokio::test]
async fn visitor_error_names_the_unit() {
    let ws = chain();
    let err = visit_in_order(&ws, |unit| async move {
        if unit.name == "b" {
            anyhow::bail!("boom");
        }
        Ok(Flow::Continue)
    })
    .await
    .unwrap_err();

    match err {
        MonorunError::VisitFailed { unit, source } => {
            assert_eq!(unit, "b");
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn peer_and_dev_dependencies_also_order_units() {
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("app").peer("ui").dev("tooling", "*"))
        .unit(ManifestBuilder::new("ui"))
        .unit(ManifestBuilder::new("tooling"))
        .build();

    let order = collect_in_order(&ws).await;
    assert_eq!(order.last().map(String::as_str), Some("app"));
}

#[tokio::test]
async fn cycles_are_cut_instead_of_failing() {
    common::init_tracing();
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("a").dep("b"))
        .unit(ManifestBuilder::new("b").dep("a"))
        .unit(ManifestBuilder::new("c"))
        .build();

    let order: Vec<_> = topological_order(&ws).iter().map(|u| u.name.clone()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn visit_dependents_visits_direct_dependents_only() {
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("core"))
        .unit(ManifestBuilder::new("lib").dep("core"))
        .unit(ManifestBuilder::new("app").dep("lib"))
        .unit(ManifestBuilder::new("cli").dep("core"))
        .unit(ManifestBuilder::new("plugin").peer("core"))
        .build();

    let core = Arc::clone(ws.get("core").unwrap());
    let mut seen = Vec::new();
    visit_dependents(&ws, &core, |unit| {
        seen.push(unit.name.clone());
        async { Ok(Flow::Continue) }
    })
    .await
    .unwrap();

    assert_eq!(seen, vec!["lib", "cli"]);
}
