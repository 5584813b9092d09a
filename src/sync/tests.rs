// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::geometry::{Bounds, Point, Waypoints};
use crate::model::fixtures;
use crate::model::{ChartKind, Element, ElementId, ElementKind, Graph, NotationId};
use crate::ops::{OpContext, OpKind};
use crate::semantic::{ChildRole, Registry, SemanticTree};

use super::{Interceptor, LifecyclePhase, SyncEngine, SyncError};

fn eid(value: &str) -> ElementId {
    ElementId::new(value).expect("element id")
}

fn ctx(kind: OpKind, ids: &[&str]) -> OpContext {
    let mut context = OpContext::new(kind, eid(ids[0]));
    for id in &ids[1..] {
        context.push_affected(eid(id));
    }
    context
}

fn synced_engine(graph: &Graph, context: &OpContext) -> SyncEngine {
    let mut engine = SyncEngine::new();
    engine
        .apply(LifecyclePhase::Executed, context, graph)
        .expect("sync");
    engine
}

fn insert_connection(graph: &mut Graph, id: &str, kind: ChartKind, source: &str, target: &str) {
    insert_connection_with(graph, id, kind, source, target, Waypoints::new());
}

fn insert_connection_with(
    graph: &mut Graph,
    id: &str,
    kind: ChartKind,
    source: &str,
    target: &str,
    waypoints: Waypoints,
) {
    let mut conn = Element::connection(
        eid(id),
        ElementKind::Chart(kind),
        eid(source),
        eid(target),
        waypoints,
    );
    conn.set_parent(Some(graph.root().clone()));
    graph.insert(conn).expect("insert connection");
}

#[test]
fn executed_attaches_shapes_to_tree_and_registry() {
    let graph = fixtures::chart_nodes_graph();
    let context = ctx(OpKind::ShapeCreate, &["gen"]);
    let engine = synced_engine(&graph, &context);

    let object = engine.tree().get(&eid("gen")).expect("object");
    assert_eq!(object.kind(), ElementKind::Chart(ChartKind::Generic));
    assert_eq!(object.parent(), Some(&eid("root")));
    assert_eq!(object.position(), Some((200.0, 0.0)));
    assert!(engine.registry().contains(&eid("gen")));

    let root = engine.tree().get(&eid("root")).expect("root object");
    assert_eq!(root.children(ChildRole::Flow), Some(&[eid("gen")][..]));
    assert!(engine.tree().is_consistent());
}

#[test]
fn executed_twice_is_byte_identical() {
    let mut graph = fixtures::chart_nodes_graph();
    insert_connection(&mut graph, "line", ChartKind::SolidLine, "pos", "hist");

    let context = ctx(
        OpKind::ShapeCreate,
        &["gen", "pos", "hist", "line"],
    );
    let mut engine = synced_engine(&graph, &context);

    let tree_after_first = engine.tree().clone();
    let registry_after_first = engine.registry().clone();

    let delta = engine
        .apply(LifecyclePhase::Executed, &context, &graph)
        .expect("second sync");

    assert_eq!(engine.tree(), &tree_after_first);
    assert_eq!(engine.registry(), &registry_after_first);
    assert!(delta.added.is_empty());
    assert!(delta.removed.is_empty());
}

#[test]
fn reverted_runs_the_same_recomputation() {
    let graph = fixtures::chart_nodes_graph();
    let context = ctx(OpKind::ShapeCreate, &["gen"]);
    let mut engine = synced_engine(&graph, &context);

    let snapshot = engine.tree().clone();
    engine
        .apply(LifecyclePhase::Reverted, &context, &graph)
        .expect("reverted pass");
    assert_eq!(engine.tree(), &snapshot);
}

#[test]
fn connection_sync_persists_endpoints_and_sanitized_waypoints() {
    let mut graph = fixtures::chart_nodes_graph();
    let route: Waypoints = [
        Point::new(50.0, 240.0),
        Point::new(f64::NAN, 10.0),
        Point::new(250.0, 240.0),
    ]
    .into_iter()
    .collect();
    insert_connection_with(&mut graph, "line", ChartKind::SolidLine, "pos", "hist", route);

    let context = ctx(OpKind::ConnectionCreate, &["line"]);
    let engine = synced_engine(&graph, &context);

    let object = engine.tree().get(&eid("line")).expect("object");
    assert_eq!(object.source(), Some(&eid("pos")));
    assert_eq!(object.target(), Some(&eid("hist")));
    assert_eq!(
        object.waypoints(),
        Some(&[Point::new(50.0, 240.0), Point::new(250.0, 240.0)][..])
    );
}

#[test]
fn connection_sync_synthesizes_a_route_when_too_few_points_survive() {
    let mut graph = fixtures::chart_nodes_graph();
    let route: Waypoints = [Point::new(f64::INFINITY, 0.0), Point::new(1.0, f64::NAN)]
        .into_iter()
        .collect();
    insert_connection_with(&mut graph, "line", ChartKind::SolidLine, "pos", "hist", route);

    let context = ctx(OpKind::ConnectionCreate, &["line"]);
    let engine = synced_engine(&graph, &context);

    // Straight line between the endpoint centers.
    let object = engine.tree().get(&eid("line")).expect("object");
    assert_eq!(
        object.waypoints(),
        Some(&[Point::new(50.0, 240.0), Point::new(250.0, 240.0)][..])
    );
}

#[test]
fn duplicate_connection_create_is_vetoed() {
    let mut graph = fixtures::chart_nodes_graph();
    insert_connection(&mut graph, "e1", ChartKind::DashedLine, "gen", "gen2");

    let mut engine = synced_engine(&graph, &ctx(OpKind::ConnectionCreate, &["e1"]));

    insert_connection(&mut graph, "e2", ChartKind::DashedLine, "gen", "gen2");
    let result = engine.apply(
        LifecyclePhase::Executed,
        &ctx(OpKind::ConnectionCreate, &["e2"]),
        &graph,
    );

    assert_eq!(
        result,
        Err(SyncError::DuplicateConnection {
            kind: ElementKind::Chart(ChartKind::DashedLine),
            source: eid("gen"),
            target: eid("gen2"),
        })
    );
}

#[test]
fn duplicate_veto_keys_on_the_exact_triple() {
    let mut graph = fixtures::chart_nodes_graph();
    insert_connection(&mut graph, "e1", ChartKind::DashedLine, "gen", "gen2");
    let mut engine = synced_engine(&graph, &ctx(OpKind::ConnectionCreate, &["e1"]));

    // Same pair, different kind: allowed.
    insert_connection(&mut graph, "e2", ChartKind::SolidLine, "gen", "gen2");
    engine
        .apply(
            LifecyclePhase::Executed,
            &ctx(OpKind::ConnectionCreate, &["e2"]),
            &graph,
        )
        .expect("different kind passes");

    // Reversed direction: allowed.
    insert_connection(&mut graph, "e3", ChartKind::DashedLine, "gen2", "gen");
    engine
        .apply(
            LifecyclePhase::Executed,
            &ctx(OpKind::ConnectionCreate, &["e3"]),
            &graph,
        )
        .expect("reversed direction passes");
}

#[test]
fn reverted_phase_never_vetoes_duplicates() {
    let mut graph = fixtures::chart_nodes_graph();
    insert_connection(&mut graph, "e1", ChartKind::DashedLine, "gen", "gen2");
    let mut engine = synced_engine(&graph, &ctx(OpKind::ConnectionCreate, &["e1"]));

    // Replaying the same context as reverted must recompute, not veto.
    engine
        .apply(
            LifecyclePhase::Reverted,
            &ctx(OpKind::ConnectionCreate, &["e1"]),
            &graph,
        )
        .expect("reverted replay");
    assert!(engine.registry().contains(&eid("e1")));
}

#[test]
fn vanished_elements_are_dropped_from_tree_and_registry() {
    let mut graph = fixtures::chart_nodes_graph();
    let context = ctx(OpKind::ShapeCreate, &["gen"]);
    let mut engine = synced_engine(&graph, &context);
    assert!(engine.registry().contains(&eid("gen")));

    graph.remove(&eid("gen")).expect("remove from graph");
    let delta = engine
        .apply(LifecyclePhase::Reverted, &context, &graph)
        .expect("sync removal");

    assert!(!engine.tree().contains(&eid("gen")));
    assert!(!engine.registry().contains(&eid("gen")));
    assert_eq!(delta.removed, vec![eid("gen")]);
    assert!(engine.tree().is_consistent());
}

#[test]
fn reparenting_migrates_between_child_collections() {
    let mut graph = fixtures::chart_nodes_graph();
    let mut region = Element::shape(
        eid("region"),
        ElementKind::Chart(ChartKind::Region),
        Bounds::new(0.0, 600.0, 400.0, 300.0),
    );
    region.set_parent(Some(graph.root().clone()));
    graph.insert(region).expect("insert region");

    let mut engine = synced_engine(&graph, &ctx(OpKind::ShapeCreate, &["region", "gen"]));
    assert_eq!(
        engine
            .tree()
            .get(&eid("root"))
            .expect("root")
            .children(ChildRole::Flow)
            .map(<[ElementId]>::len),
        Some(2)
    );

    // The region's own child array does not exist until something files into
    // it.
    assert_eq!(
        engine
            .tree()
            .get(&eid("region"))
            .expect("region")
            .children(ChildRole::Flow),
        None
    );

    graph
        .set_parent(&eid("gen"), Some(&eid("region")), None)
        .expect("reparent");
    engine
        .apply(
            LifecyclePhase::Executed,
            &ctx(OpKind::UpdateParent, &["gen"]),
            &graph,
        )
        .expect("sync reparent");

    let root = engine.tree().get(&eid("root")).expect("root");
    assert_eq!(root.children(ChildRole::Flow), Some(&[eid("region")][..]));
    let region = engine.tree().get(&eid("region")).expect("region");
    assert_eq!(region.children(ChildRole::Flow), Some(&[eid("gen")][..]));
    assert_eq!(
        engine.tree().get(&eid("gen")).expect("gen").parent(),
        Some(&eid("region"))
    );
    assert!(engine.tree().is_consistent());
}

#[test]
fn plain_host_elements_never_acquire_business_objects() {
    let graph = fixtures::mixed_notation_graph();
    let engine = synced_engine(&graph, &ctx(OpKind::ShapeCreate, &["plain"]));

    assert!(!engine.tree().contains(&eid("plain")));
    assert!(!engine.registry().contains(&eid("plain")));
}

#[test]
fn overlay_elements_file_under_artifact_children() {
    let graph = fixtures::mixed_notation_graph();
    let engine = synced_engine(&graph, &ctx(OpKind::ShapeCreate, &["marker", "gen"]));

    let root = engine.tree().get(&eid("root")).expect("root");
    assert_eq!(root.children(ChildRole::Artifact), Some(&[eid("marker")][..]));
    assert_eq!(root.children(ChildRole::Flow), Some(&[eid("gen")][..]));
}

#[test]
fn label_text_persists_onto_the_targets_name() {
    let mut graph = fixtures::chart_nodes_graph();
    let mut label = Element::new_label(eid("gen_label"), eid("gen"), Bounds::default(), "Orders");
    label.set_parent(Some(graph.root().clone()));
    graph.insert(label).expect("insert label");

    let engine = synced_engine(&graph, &ctx(OpKind::ShapeCreate, &["gen", "gen_label"]));

    let object = engine.tree().get(&eid("gen")).expect("object");
    assert_eq!(object.name(), Some("Orders"));
    // Labels are proxies: no business object, no registry entry.
    assert!(!engine.tree().contains(&eid("gen_label")));
    assert!(!engine.registry().contains(&eid("gen_label")));
}

#[test]
fn embedded_text_persists_as_short_text() {
    let mut graph = fixtures::chart_nodes_graph();
    graph
        .set_embedded_text(&eid("pos"), Some("P-1".to_owned()))
        .expect("set embedded text");

    let engine = synced_engine(&graph, &ctx(OpKind::SetEmbeddedText, &["pos"]));
    let object = engine.tree().get(&eid("pos")).expect("object");
    assert_eq!(object.short_text(), Some("P-1"));
    assert_eq!(object.name(), None);
}

struct CountingInterceptor {
    calls: std::rc::Rc<std::cell::RefCell<Vec<LifecyclePhase>>>,
}

impl Interceptor for CountingInterceptor {
    fn on_op(
        &mut self,
        phase: LifecyclePhase,
        _context: &OpContext,
        _graph: &Graph,
        _tree: &mut SemanticTree,
        _registry: &mut Registry,
    ) -> Result<(), SyncError> {
        self.calls.borrow_mut().push(phase);
        Ok(())
    }
}

struct FailingInterceptor;

impl Interceptor for FailingInterceptor {
    fn on_op(
        &mut self,
        _phase: LifecyclePhase,
        _context: &OpContext,
        _graph: &Graph,
        _tree: &mut SemanticTree,
        _registry: &mut Registry,
    ) -> Result<(), SyncError> {
        Err(SyncError::Interceptor {
            notation: String::new(),
            message: "boom".to_owned(),
        })
    }
}

#[test]
fn registered_interceptors_see_both_phases() {
    let graph = fixtures::chart_nodes_graph();
    let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

    let mut engine = SyncEngine::new();
    engine.register_interceptor(
        NotationId::new("chart").expect("notation id"),
        Box::new(CountingInterceptor {
            calls: calls.clone(),
        }),
    );

    let context = ctx(OpKind::ShapeCreate, &["gen"]);
    engine
        .apply(LifecyclePhase::Executed, &context, &graph)
        .expect("executed");
    engine
        .apply(LifecyclePhase::Reverted, &context, &graph)
        .expect("reverted");

    assert_eq!(
        calls.borrow().as_slice(),
        &[LifecyclePhase::Executed, LifecyclePhase::Reverted]
    );
    // The interceptor ran without disturbing the recomputation.
    assert!(engine.tree().contains(&eid("gen")));
}

#[test]
fn interceptor_failures_carry_the_notation_id() {
    let graph = fixtures::chart_nodes_graph();
    let mut engine = SyncEngine::new();
    engine.register_interceptor(
        NotationId::new("custom").expect("notation id"),
        Box::new(FailingInterceptor),
    );

    let result = engine.apply(
        LifecyclePhase::Executed,
        &ctx(OpKind::ShapeCreate, &["gen"]),
        &graph,
    );
    assert_eq!(
        result,
        Err(SyncError::Interceptor {
            notation: "custom".to_owned(),
            message: "boom".to_owned(),
        })
    );
}
