// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Multi-notation rule dispatch.
//!
//! The dispatcher holds an ordered list of registered evaluators plus the
//! host-default evaluator. Connect queries go to the evaluator owning the
//! source's namespace first, then the target's, then the rest in registration
//! order; an evaluator answering `NotApplicable` cedes to the next one.

use crate::model::{Element, ElementId, ElementKind, Graph};

use super::{ConnectionEvaluator, ConnectionOutcome, HostEvaluator, RuleVerdict};

pub struct RuleDispatcher {
    evaluators: Vec<Box<dyn ConnectionEvaluator>>,
    host: HostEvaluator,
}

impl RuleDispatcher {
    /// A dispatcher with no notations registered; only host defaults apply.
    pub fn new() -> Self {
        Self {
            evaluators: Vec::new(),
            host: HostEvaluator::new(),
        }
    }

    /// The stock dispatcher with the chart and overlay notations.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register_evaluator(Box::new(super::ChartEvaluator::new()));
        dispatcher.register_evaluator(Box::new(super::OverlayEvaluator::new()));
        dispatcher
    }

    /// Appends a notation's evaluator. Later registrations are consulted
    /// after earlier ones; existing notations are never modified.
    pub fn register_evaluator(&mut self, evaluator: Box<dyn ConnectionEvaluator>) {
        self.evaluators.push(evaluator);
    }

    pub fn evaluator_for(&self, namespace: &str) -> Option<&dyn ConnectionEvaluator> {
        self.evaluators
            .iter()
            .map(Box::as_ref)
            .find(|evaluator| evaluator.namespace() == namespace)
    }

    /// Read-only connect query backing hover previews, creation, and both
    /// reconnect variants. Unknown ids answer `NotApplicable` so previews
    /// over half-built interactions never error.
    pub fn can_connect(
        &self,
        graph: &Graph,
        source: &ElementId,
        target: &ElementId,
        hint: Option<ElementKind>,
    ) -> ConnectionOutcome {
        let (Some(source_el), Some(target_el)) = (graph.get(source), graph.get(target)) else {
            return ConnectionOutcome::NotApplicable;
        };

        let preferred = [
            source_el.kind().notation(),
            target_el.kind().notation(),
        ];

        let mut tried: Vec<&str> = Vec::new();
        for namespace in preferred.into_iter().flatten() {
            if tried.contains(&namespace) {
                continue;
            }
            tried.push(namespace);
            if let Some(evaluator) = self.evaluator_for(namespace) {
                match evaluator.evaluate(graph, source_el, target_el, hint) {
                    ConnectionOutcome::NotApplicable => {}
                    outcome => return outcome,
                }
            }
        }

        for evaluator in &self.evaluators {
            if tried.contains(&evaluator.namespace()) {
                continue;
            }
            match evaluator.evaluate(graph, source_el, target_el, hint) {
                ConnectionOutcome::NotApplicable => {}
                outcome => return outcome,
            }
        }

        self.host.evaluate(graph, source_el, target_el, hint)
    }

    /// Whether an element of `kind` may be created inside a container of
    /// `container` kind. Notation elements are confined to the host roots
    /// plus any composite containers their own notation defines.
    pub fn can_create_in(&self, kind: ElementKind, container: ElementKind) -> RuleVerdict {
        if kind.is_label() {
            return RuleVerdict::Allowed;
        }
        let Some(namespace) = kind.notation() else {
            return RuleVerdict::NoOpinion;
        };
        if container.is_root() {
            return RuleVerdict::Allowed;
        }
        let allowed = self
            .evaluator_for(namespace)
            .map(|evaluator| evaluator.composite_containers().contains(&container))
            .unwrap_or(false);
        if allowed {
            RuleVerdict::Allowed
        } else {
            RuleVerdict::Rejected
        }
    }

    /// All-or-nothing group move: the selection must be uniformly owned by one
    /// notation, or uniformly unowned. Labels whose target is notation-owned
    /// are exempt from the uniformity check.
    pub fn can_move_group(&self, graph: &Graph, ids: &[ElementId]) -> RuleVerdict {
        let mut seen: Option<Option<&'static str>> = None;

        for id in ids {
            let Some(element) = graph.get(id) else {
                continue;
            };

            if let Some(label) = element.as_label() {
                let target_owned = graph
                    .get(label.target())
                    .and_then(|target| target.kind().notation())
                    .is_some();
                if target_owned {
                    continue;
                }
            }

            let notation = element.kind().notation();
            match seen {
                None => seen = Some(notation),
                Some(previous) if previous == notation => {}
                Some(_) => return RuleVerdict::Rejected,
            }
        }

        match seen {
            Some(Some(_)) => RuleVerdict::Allowed,
            _ => RuleVerdict::NoOpinion,
        }
    }

    /// Notation-owned elements are always resizable; for anything else the
    /// dispatcher has no opinion and host defaults decide.
    pub fn can_resize(&self, element: &Element) -> RuleVerdict {
        if element.kind().notation().is_some() {
            RuleVerdict::Allowed
        } else {
            RuleVerdict::NoOpinion
        }
    }
}

impl Default for RuleDispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::Bounds;
    use crate::model::fixtures;
    use crate::model::{
        ChartKind, CoreKind, Element, ElementId, ElementKind, OverlayKind,
    };
    use crate::rules::{ConnectionOutcome, RuleVerdict};

    use super::RuleDispatcher;

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    #[test]
    fn connect_dispatches_by_source_namespace() {
        let graph = fixtures::mixed_notation_graph();
        let dispatcher = RuleDispatcher::with_defaults();

        let outcome = dispatcher.can_connect(&graph, &eid("agg"), &eid("gen"), None);
        assert_eq!(
            outcome.accepted().expect("accepted").kind(),
            ElementKind::Chart(ChartKind::AggregatedConnection)
        );
    }

    #[test]
    fn connect_across_notations_is_rejected_by_the_owner() {
        let graph = fixtures::mixed_notation_graph();
        let dispatcher = RuleDispatcher::with_defaults();

        assert_eq!(
            dispatcher.can_connect(&graph, &eid("gen"), &eid("marker"), None),
            ConnectionOutcome::Rejected
        );
        assert_eq!(
            dispatcher.can_connect(&graph, &eid("marker"), &eid("gen"), None),
            ConnectionOutcome::Rejected
        );
    }

    #[test]
    fn connect_with_no_owned_endpoint_defers_to_the_host() {
        let mut graph = fixtures::mixed_notation_graph();
        let mut other = Element::shape(
            eid("plain2"),
            ElementKind::Core(CoreKind::Shape),
            Bounds::new(700.0, 400.0, 80.0, 40.0),
        );
        other.set_parent(Some(graph.root().clone()));
        graph.insert(other).expect("insert shape");

        let dispatcher = RuleDispatcher::with_defaults();
        let outcome = dispatcher.can_connect(&graph, &eid("plain"), &eid("plain2"), None);
        assert_eq!(
            outcome.accepted().expect("accepted").kind(),
            ElementKind::Core(CoreKind::Wire)
        );
    }

    #[test]
    fn label_endpoints_leave_every_evaluator_undecided() {
        let mut graph = fixtures::mixed_notation_graph();
        let mut label = Element::new_label(eid("gen_label"), eid("gen"), Bounds::default(), "");
        label.set_parent(Some(graph.root().clone()));
        graph.insert(label).expect("insert label");

        let dispatcher = RuleDispatcher::with_defaults();
        assert_eq!(
            dispatcher.can_connect(&graph, &eid("gen_label"), &eid("gen2"), None),
            ConnectionOutcome::NotApplicable
        );
    }

    #[test]
    fn creation_is_confined_to_roots_plus_own_composites() {
        let dispatcher = RuleDispatcher::with_defaults();

        let generic = ElementKind::Chart(ChartKind::Generic);
        let marker = ElementKind::Overlay(OverlayKind::Marker);
        let region = ElementKind::Chart(ChartKind::Region);

        assert_eq!(
            dispatcher.can_create_in(generic, ElementKind::Core(CoreKind::Root)),
            RuleVerdict::Allowed
        );
        assert_eq!(
            dispatcher.can_create_in(generic, ElementKind::Core(CoreKind::Board)),
            RuleVerdict::Allowed
        );
        // Only the chart notation declared the region composite.
        assert_eq!(dispatcher.can_create_in(generic, region), RuleVerdict::Allowed);
        assert_eq!(dispatcher.can_create_in(marker, region), RuleVerdict::Rejected);
        assert_eq!(
            dispatcher.can_create_in(generic, ElementKind::Chart(ChartKind::Generic)),
            RuleVerdict::Rejected
        );
        assert_eq!(
            dispatcher.can_create_in(
                ElementKind::Core(CoreKind::Shape),
                ElementKind::Core(CoreKind::Root)
            ),
            RuleVerdict::NoOpinion
        );
    }

    #[test]
    fn group_moves_must_be_notation_uniform() {
        let graph = fixtures::mixed_notation_graph();
        let dispatcher = RuleDispatcher::with_defaults();

        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("gen"), eid("gen2")]),
            RuleVerdict::Allowed
        );
        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("gen"), eid("marker")]),
            RuleVerdict::Rejected
        );
        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("gen"), eid("plain")]),
            RuleVerdict::Rejected
        );
        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("plain")]),
            RuleVerdict::NoOpinion
        );
    }

    #[test]
    fn labels_of_owned_targets_ride_along_in_group_moves() {
        let mut graph = fixtures::mixed_notation_graph();
        let mut label = Element::new_label(eid("gen_label"), eid("gen"), Bounds::default(), "");
        label.set_parent(Some(graph.root().clone()));
        graph.insert(label).expect("insert label");

        let dispatcher = RuleDispatcher::with_defaults();
        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("gen"), eid("gen_label"), eid("gen2")]),
            RuleVerdict::Allowed
        );
        // The label alone is no reason to reject either.
        assert_eq!(
            dispatcher.can_move_group(&graph, &[eid("gen_label")]),
            RuleVerdict::NoOpinion
        );
    }

    #[test]
    fn resize_always_permits_notation_elements() {
        let graph = fixtures::mixed_notation_graph();
        let dispatcher = RuleDispatcher::with_defaults();

        let gen = graph.get(&eid("gen")).expect("gen");
        assert_eq!(dispatcher.can_resize(gen), RuleVerdict::Allowed);

        let plain = graph.get(&eid("plain")).expect("plain");
        assert_eq!(dispatcher.can_resize(plain), RuleVerdict::NoOpinion);
    }
}
