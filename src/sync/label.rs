// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Label lifecycle.
//!
//! Every notation-owned element gets exactly one external label on first
//! successful attach, at a deterministically computed anchor. A small closed
//! set of kinds additionally carries an embedded label, persisted separately
//! under the target's short text. Label elements are created as part of the
//! triggering op, so undoing the op removes them again.

use crate::geometry::{
    connection_label_anchor, sanitize_waypoints, shape_label_anchor, Bounds, Point,
};
use crate::model::{ChartKind, Element, ElementId, ElementKind, Graph, LabelPlacement};
use crate::ops::GraphPatch;

/// How often a replace op re-attempts writing the carried-over label text
/// before giving up. Exhaustion is logged, never fatal; the element stays
/// usable without its label text.
pub const LABEL_REATTACH_ATTEMPTS: usize = 5;

/// Gap between a shape's bounding box and its external label.
pub const LABEL_MARGIN: f64 = 10.0;

pub const EXTERNAL_LABEL_WIDTH: f64 = 90.0;
pub const EXTERNAL_LABEL_HEIGHT: f64 = 20.0;

#[derive(Debug, Default)]
pub struct LabelLifecycleManager;

impl LabelLifecycleManager {
    pub fn new() -> Self {
        Self
    }

    /// The derived id of an element's external label.
    pub fn label_id_for(target: &ElementId) -> ElementId {
        ElementId::new(format!("{target}_label"))
            .expect("a valid element id stays valid with the label suffix")
    }

    /// Default text for freshly-created, unlabeled connections. Never applied
    /// over existing text.
    pub fn default_text(kind: ElementKind) -> Option<&'static str> {
        match kind {
            ElementKind::Chart(ChartKind::SolidLine) => Some("from"),
            ElementKind::Chart(ChartKind::DashedLine) => Some("to"),
            _ => None,
        }
    }

    /// Patches creating missing external labels for every affected element
    /// that wants one. Idempotent: elements that already carry a label, label
    /// proxies, detached elements, and unknown ids produce nothing.
    pub fn ensure_patches(&self, graph: &Graph, affected: &[ElementId]) -> Vec<GraphPatch> {
        let mut patches = Vec::new();

        for id in affected {
            let Some(element) = graph.get(id) else {
                continue;
            };
            if element.is_label()
                || !element.kind().wants_external_label()
                || element.label().is_some()
                || element.parent().is_none()
            {
                continue;
            }

            let label_id = Self::label_id_for(id);
            if graph.contains(&label_id) {
                continue;
            }

            let anchor = Self::anchor_for(graph, element);
            let text = if element.is_connection() {
                Self::default_text(element.kind()).unwrap_or_default()
            } else {
                ""
            };

            let mut label = Element::new_label(
                label_id,
                id.clone(),
                Bounds::new(
                    anchor.x(),
                    anchor.y(),
                    EXTERNAL_LABEL_WIDTH,
                    EXTERNAL_LABEL_HEIGHT,
                ),
                text,
            );
            label.set_parent(element.parent().cloned());
            patches.push(GraphPatch::Insert(label));
        }

        patches
    }

    fn anchor_for(graph: &Graph, element: &Element) -> Point {
        if let Some(connection) = element.as_connection() {
            let mut route: Vec<_> = sanitize_waypoints(connection.waypoints())
                .into_iter()
                .collect();
            if route.len() < 2 {
                let center = |endpoint: &ElementId| {
                    graph
                        .get(endpoint)
                        .and_then(Element::bounds)
                        .unwrap_or_default()
                        .center()
                };
                route = vec![center(connection.source()), center(connection.target())];
            }
            return connection_label_anchor(
                &route,
                LABEL_MARGIN,
                EXTERNAL_LABEL_WIDTH,
                EXTERNAL_LABEL_HEIGHT,
            );
        }

        let bounds = element.bounds().unwrap_or_default();
        let above = element.kind().external_label_placement() == LabelPlacement::Above;
        shape_label_anchor(
            bounds,
            above,
            LABEL_MARGIN,
            EXTERNAL_LABEL_WIDTH,
            EXTERNAL_LABEL_HEIGHT,
        )
    }
}
