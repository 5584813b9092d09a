// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Host-default connection rules for base (non-notation) element kinds.

use crate::model::{CoreKind, Element, ElementKind, Graph, CORE_NAMESPACE};

use super::{AcceptedConnection, ConnectionEvaluator, ConnectionOutcome, RouteShape};

/// Fallback evaluator consulted when no registered notation claims either
/// endpoint: plain shapes connect with a generic wire, everything else stays
/// undecided.
#[derive(Debug, Default)]
pub struct HostEvaluator;

impl HostEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionEvaluator for HostEvaluator {
    fn namespace(&self) -> &'static str {
        CORE_NAMESPACE
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

        let wire = ElementKind::Core(CoreKind::Wire);
        if source.kind() != ElementKind::Core(CoreKind::Shape)
            || target.kind() != ElementKind::Core(CoreKind::Shape)
        {
            return ConnectionOutcome::NotApplicable;
        }
        if hint.is_some_and(|hinted| hinted != wire) {
            return ConnectionOutcome::Rejected;
        }

        let route = RouteShape::Straight.synthesize(
            source.bounds().unwrap_or_default(),
            target.bounds().unwrap_or_default(),
        );
        ConnectionOutcome::Accepted(AcceptedConnection::new(wire, route))
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::Bounds;
    use crate::model::fixtures;
    use crate::model::{CoreKind, Element, ElementId, ElementKind};
    use crate::rules::{ConnectionEvaluator, ConnectionOutcome};

    use super::HostEvaluator;

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    #[test]
    fn plain_shapes_connect_with_a_wire() {
        let mut graph = fixtures::root_graph();
        for id in ["s1", "s2"] {
            let mut shape = Element::shape(
                eid(id),
                ElementKind::Core(CoreKind::Shape),
                Bounds::new(0.0, 0.0, 10.0, 10.0),
            );
            shape.set_parent(Some(graph.root().clone()));
            graph.insert(shape).expect("insert shape");
        }

        let source = graph.get(&eid("s1")).expect("s1");
        let target = graph.get(&eid("s2")).expect("s2");
        let outcome = HostEvaluator::new().evaluate(&graph, source, target, None);
        assert_eq!(
            outcome.accepted().expect("accepted").kind(),
            ElementKind::Core(CoreKind::Wire)
        );
    }

    #[test]
    fn notation_elements_stay_undecided() {
        let graph = fixtures::mixed_notation_graph();
        let source = graph.get(&eid("gen")).expect("gen");
        let target = graph.get(&eid("plain")).expect("plain");
        let outcome = HostEvaluator::new().evaluate(&graph, source, target, None);
        assert_eq!(outcome, ConnectionOutcome::NotApplicable);
    }
}
