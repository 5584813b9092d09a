// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::geometry::Bounds;

use super::element::Element;
use super::graph::Graph;
use super::ids::ElementId;
use super::kind::{ChartKind, CoreKind, ElementKind, OverlayKind};

pub(crate) fn eid(value: &str) -> ElementId {
    ElementId::new(value).expect("element id")
}

pub(crate) fn root_graph() -> Graph {
    Graph::new(eid("root"), ElementKind::Core(CoreKind::Root))
}

fn insert_shape(graph: &mut Graph, id: &str, kind: ElementKind, bounds: Bounds) {
    let root = graph.root().clone();
    let mut shape = Element::shape(eid(id), kind, bounds);
    shape.set_parent(Some(root));
    graph.insert(shape).expect("insert fixture shape");
}

/// One chart node per category, at well-spread positions.
pub(crate) fn chart_nodes_graph() -> Graph {
    let mut graph = root_graph();
    insert_shape(
        &mut graph,
        "agg",
        ElementKind::Chart(ChartKind::Aggregator),
        Bounds::new(0.0, 0.0, 100.0, 80.0),
    );
    insert_shape(
        &mut graph,
        "gen",
        ElementKind::Chart(ChartKind::Generic),
        Bounds::new(200.0, 0.0, 100.0, 80.0),
    );
    insert_shape(
        &mut graph,
        "gen2",
        ElementKind::Chart(ChartKind::Generic),
        Bounds::new(400.0, 0.0, 100.0, 80.0),
    );
    insert_shape(
        &mut graph,
        "pos",
        ElementKind::Chart(ChartKind::Position),
        Bounds::new(0.0, 200.0, 100.0, 80.0),
    );
    insert_shape(
        &mut graph,
        "hist",
        ElementKind::Chart(ChartKind::History),
        Bounds::new(200.0, 200.0, 100.0, 80.0),
    );
    insert_shape(
        &mut graph,
        "hist2",
        ElementKind::Chart(ChartKind::History),
        Bounds::new(400.0, 200.0, 100.0, 80.0),
    );
    graph
}

/// Chart nodes plus overlay markers sharing the same canvas.
pub(crate) fn mixed_notation_graph() -> Graph {
    let mut graph = chart_nodes_graph();
    insert_shape(
        &mut graph,
        "marker",
        ElementKind::Overlay(OverlayKind::Marker),
        Bounds::new(0.0, 400.0, 60.0, 60.0),
    );
    insert_shape(
        &mut graph,
        "marker2",
        ElementKind::Overlay(OverlayKind::Marker),
        Bounds::new(200.0, 400.0, 60.0, 60.0),
    );
    insert_shape(
        &mut graph,
        "callout",
        ElementKind::Overlay(OverlayKind::Callout),
        Bounds::new(400.0, 400.0, 80.0, 40.0),
    );
    insert_shape(
        &mut graph,
        "plain",
        ElementKind::Core(CoreKind::Shape),
        Bounds::new(600.0, 400.0, 80.0, 40.0),
    );
    graph
}
