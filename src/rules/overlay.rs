// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connection rules of the overlay (annotation) notation.
//!
//! Marker-to-marker pairs match both `Link` and `Tether`, so inference without
//! an explicit kind is ambiguous by design and rejects; interactive tooling
//! always passes the kind it is dragging.

use crate::model::{Element, ElementKind, Graph, OverlayKind, OVERLAY_NAMESPACE};

use super::{AcceptedConnection, ConnectionEvaluator, ConnectionOutcome, RouteShape};

#[derive(Debug, Clone, Copy)]
struct EdgeSpec {
    kind: OverlayKind,
    source: OverlayKind,
    target: OverlayKind,
}

const EDGE_SPECS: &[EdgeSpec] = &[
    EdgeSpec {
        kind: OverlayKind::Link,
        source: OverlayKind::Marker,
        target: OverlayKind::Callout,
    },
    EdgeSpec {
        kind: OverlayKind::Link,
        source: OverlayKind::Marker,
        target: OverlayKind::Marker,
    },
    EdgeSpec {
        kind: OverlayKind::Tether,
        source: OverlayKind::Marker,
        target: OverlayKind::Marker,
    },
];

#[derive(Debug, Default)]
pub struct OverlayEvaluator;

impl OverlayEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn accept(spec: &EdgeSpec, source: &Element, target: &Element) -> ConnectionOutcome {
        let route = RouteShape::Straight.synthesize(
            source.bounds().unwrap_or_default(),
            target.bounds().unwrap_or_default(),
        );
        ConnectionOutcome::Accepted(AcceptedConnection::new(
            ElementKind::Overlay(spec.kind),
            route,
        ))
    }
}

impl ConnectionEvaluator for OverlayEvaluator {
    fn namespace(&self) -> &'static str {
        OVERLAY_NAMESPACE
    }

    fn evaluate(
        &self,
        _graph: &Graph,
        source: &Element,
        target: &Element,
        hint: Option<ElementKind>,
    ) -> ConnectionOutcome {
        if source.is_label() || target.is_label() {
            return ConnectionOutcome::NotApplicable;
        }

        let source_overlay = source.kind().overlay();
        let target_overlay = target.kind().overlay();
        if source_overlay.is_none() && target_overlay.is_none() {
            return ConnectionOutcome::NotApplicable;
        }

        let (Some(source_kind), Some(target_kind)) = (
            source_overlay.filter(|kind| !kind.is_connection()),
            target_overlay.filter(|kind| !kind.is_connection()),
        ) else {
            return ConnectionOutcome::Rejected;
        };

        if let Some(hinted) = hint {
            let Some(hinted_kind) = hinted.overlay().filter(|kind| kind.is_connection()) else {
                return ConnectionOutcome::Rejected;
            };
            let Some(spec) = EDGE_SPECS.iter().find(|spec| {
                spec.kind == hinted_kind
                    && spec.source == source_kind
                    && spec.target == target_kind
            }) else {
                return ConnectionOutcome::Rejected;
            };
            return Self::accept(spec, source, target);
        }

        let mut matched: Option<&EdgeSpec> = None;
        for spec in EDGE_SPECS {
            if spec.source != source_kind || spec.target != target_kind {
                continue;
            }
            if let Some(previous) = matched {
                if previous.kind != spec.kind {
                    return ConnectionOutcome::Rejected;
                }
            }
            matched = Some(spec);
        }

        match matched {
            Some(spec) => Self::accept(spec, source, target),
            None => ConnectionOutcome::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::fixtures;
    use crate::model::{ElementId, ElementKind, Graph, OverlayKind};
    use crate::rules::{ConnectionEvaluator, ConnectionOutcome};

    use super::OverlayEvaluator;

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    fn evaluate(
        graph: &Graph,
        source: &str,
        target: &str,
        hint: Option<ElementKind>,
    ) -> ConnectionOutcome {
        let source = graph.get(&eid(source)).expect("source");
        let target = graph.get(&eid(target)).expect("target");
        OverlayEvaluator::new().evaluate(graph, source, target, hint)
    }

    #[test]
    fn marker_to_callout_infers_a_link() {
        let graph = fixtures::mixed_notation_graph();
        let outcome = evaluate(&graph, "marker", "callout", None);
        assert_eq!(
            outcome.accepted().expect("accepted").kind(),
            ElementKind::Overlay(OverlayKind::Link)
        );
    }

    #[test]
    fn marker_to_marker_without_a_hint_is_ambiguous_and_rejects() {
        let graph = fixtures::mixed_notation_graph();
        let outcome = evaluate(&graph, "marker", "marker2", None);
        assert_eq!(outcome, ConnectionOutcome::Rejected);
    }

    #[test]
    fn marker_to_marker_resolves_with_an_explicit_hint() {
        let graph = fixtures::mixed_notation_graph();

        for kind in [OverlayKind::Link, OverlayKind::Tether] {
            let outcome = evaluate(
                &graph,
                "marker",
                "marker2",
                Some(ElementKind::Overlay(kind)),
            );
            assert_eq!(
                outcome.accepted().expect("accepted").kind(),
                ElementKind::Overlay(kind)
            );
        }
    }

    #[test]
    fn callout_cannot_source_anything() {
        let graph = fixtures::mixed_notation_graph();
        assert_eq!(
            evaluate(&graph, "callout", "marker", None),
            ConnectionOutcome::Rejected
        );
    }

    #[test]
    fn chart_endpoints_are_not_this_notations_business() {
        let graph = fixtures::mixed_notation_graph();
        assert_eq!(
            evaluate(&graph, "gen", "gen2", None),
            ConnectionOutcome::NotApplicable
        );
    }
}
