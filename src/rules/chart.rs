// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connection rules of the chart notation.

use crate::model::{
    ChartCategory, ChartKind, Element, ElementKind, Graph, CHART_NAMESPACE,
};

use super::{AcceptedConnection, ConnectionEvaluator, ConnectionOutcome, RouteShape};

/// One row of the compatibility table: a concrete edge kind applies to exactly
/// this (source category, target category) pair. `exclusive` caps a source at
/// one outgoing connection of the kind.
#[derive(Debug, Clone, Copy)]
struct EdgeSpec {
    kind: ChartKind,
    source: ChartCategory,
    target: ChartCategory,
    route: RouteShape,
    exclusive: bool,
}

const EDGE_SPECS: &[EdgeSpec] = &[
    EdgeSpec {
        kind: ChartKind::AggregatedConnection,
        source: ChartCategory::Aggregator,
        target: ChartCategory::Generic,
        route: RouteShape::LShaped,
        exclusive: false,
    },
    EdgeSpec {
        kind: ChartKind::SolidLine,
        source: ChartCategory::Position,
        target: ChartCategory::History,
        route: RouteShape::ZShaped,
        exclusive: true,
    },
    EdgeSpec {
        kind: ChartKind::DashedLine,
        source: ChartCategory::Generic,
        target: ChartCategory::Generic,
        route: RouteShape::Straight,
        exclusive: false,
    },
    EdgeSpec {
        kind: ChartKind::DashedLine,
        source: ChartCategory::Generic,
        target: ChartCategory::History,
        route: RouteShape::Straight,
        exclusive: false,
    },
];

const COMPOSITE_CONTAINERS: &[ElementKind] = &[ElementKind::Chart(ChartKind::Region)];

#[derive(Debug, Default)]
pub struct ChartEvaluator;

impl ChartEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn accept(spec: &EdgeSpec, source: &Element, target: &Element) -> ConnectionOutcome {
        let route = spec.route.synthesize(
            source.bounds().unwrap_or_default(),
            target.bounds().unwrap_or_default(),
        );
        ConnectionOutcome::Accepted(AcceptedConnection::new(
            ElementKind::Chart(spec.kind),
            route,
        ))
    }

    /// An exclusive-style kind is exhausted once the source already has one
    /// outgoing connection of it. Reads only the source's outgoing list.
    fn cardinality_exceeded(spec: &EdgeSpec, graph: &Graph, source: &Element) -> bool {
        spec.exclusive
            && graph.outgoing(source.id()).iter().any(|conn| {
                graph
                    .get(conn)
                    .map(|el| el.kind() == ElementKind::Chart(spec.kind))
                    .unwrap_or(false)
            })
    }
}

impl ConnectionEvaluator for ChartEvaluator {
    fn namespace(&self) -> &'static str {
        CHART_NAMESPACE
    }

    fn evaluate(
        &self,
        graph: &Graph,
        source: &Element,
        target: &Element,
        hint: Option<ElementKind>,
    ) -> ConnectionOutcome {
        if source.is_label() || target.is_label() {
            return ConnectionOutcome::NotApplicable;
        }

        let source_chart = source.kind().chart();
        let target_chart = target.kind().chart();
        if source_chart.is_none() && target_chart.is_none() {
            return ConnectionOutcome::NotApplicable;
        }

        // At least one endpoint is ours, so from here on this evaluator is
        // authoritative: anything that does not fit the table is a rejection,
        // including cross-notation pairs.
        let (Some(source_category), Some(target_category)) = (
            source_chart.and_then(ChartKind::category),
            target_chart.and_then(ChartKind::category),
        ) else {
            return ConnectionOutcome::Rejected;
        };

        if let Some(hinted) = hint {
            let Some(hinted_kind) = hinted.chart().filter(|kind| kind.is_connection()) else {
                return ConnectionOutcome::Rejected;
            };
            let Some(spec) = EDGE_SPECS.iter().find(|spec| {
                spec.kind == hinted_kind
                    && spec.source == source_category
                    && spec.target == target_category
            }) else {
                return ConnectionOutcome::Rejected;
            };
            if Self::cardinality_exceeded(spec, graph, source) {
                return ConnectionOutcome::Rejected;
            }
            return Self::accept(spec, source, target);
        }

        let mut matched: Option<&EdgeSpec> = None;
        for spec in EDGE_SPECS {
            if spec.source != source_category || spec.target != target_category {
                continue;
            }
            if let Some(previous) = matched {
                if previous.kind != spec.kind {
                    // Two kinds claim the same pair: an authoring error,
                    // treated as no match.
                    return ConnectionOutcome::Rejected;
                }
            }
            matched = Some(spec);
        }

        let Some(spec) = matched else {
            return ConnectionOutcome::Rejected;
        };
        if Self::cardinality_exceeded(spec, graph, source) {
            return ConnectionOutcome::Rejected;
        }
        Self::accept(spec, source, target)
    }

    fn composite_containers(&self) -> &'static [ElementKind] {
        COMPOSITE_CONTAINERS
    }
}
