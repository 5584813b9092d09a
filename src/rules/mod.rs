// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connection-rule evaluation.
//!
//! Every notation contributes one evaluator; the dispatcher routes queries to
//! the right one by kind namespace. Evaluation is pure and reads only the
//! incoming/outgoing lists of the two candidate endpoints, so a single
//! evaluator call is O(degree) and can back live hover previews as well as
//! commits.

pub mod chart;
pub mod dispatcher;
pub mod host;
pub mod overlay;

use crate::geometry::{l_route, straight_route, z_route, Bounds, Waypoints};
use crate::model::{Element, ElementKind, Graph};

pub use chart::ChartEvaluator;
pub use dispatcher::RuleDispatcher;
pub use host::HostEvaluator;
pub use overlay::OverlayEvaluator;

/// Shape of a synthesized default route between two bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteShape {
    Straight,
    LShaped,
    ZShaped,
}

impl RouteShape {
    pub fn synthesize(self, source: Bounds, target: Bounds) -> Waypoints {
        match self {
            Self::Straight => straight_route(source, target),
            Self::LShaped => l_route(source, target),
            Self::ZShaped => z_route(source, target),
        }
    }
}

/// A connection request the rules accepted: the resolved concrete kind plus a
/// default route so auto-created connections draw sanely without a router.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedConnection {
    kind: ElementKind,
    waypoints: Waypoints,
}

impl AcceptedConnection {
    pub fn new(kind: ElementKind, waypoints: Waypoints) -> Self {
        Self { kind, waypoints }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }
}

/// Outcome of one evaluator call.
///
/// `NotApplicable` means "this evaluator has no say here" (for example a label
/// proxy endpoint, or endpoints owned by another notation) and must never be
/// treated as a rejection; the dispatcher keeps asking further evaluators.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionOutcome {
    Accepted(AcceptedConnection),
    Rejected,
    NotApplicable,
}

impl ConnectionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&AcceptedConnection> {
        match self {
            Self::Accepted(accepted) => Some(accepted),
            _ => None,
        }
    }
}

/// Verdict for creation, move, and resize queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleVerdict {
    Allowed,
    Rejected,
    /// The dispatcher has no rule covering the element; host defaults apply.
    NoOpinion,
}

impl RuleVerdict {
    /// Rejection is the only blocking verdict; no-opinion defers to host
    /// defaults, which allow.
    pub fn permits(self) -> bool {
        self != Self::Rejected
    }
}

/// One notation's connection rules.
pub trait ConnectionEvaluator {
    /// The kind namespace this evaluator owns (`"chart"`, `"overlay"`, ...).
    fn namespace(&self) -> &'static str;

    /// Pure compatibility check. Must behave identically for hover previews,
    /// `connection.create`, and both reconnect variants.
    fn evaluate(
        &self,
        graph: &Graph,
        source: &Element,
        target: &Element,
        hint: Option<ElementKind>,
    ) -> ConnectionOutcome;

    /// Extra composite container kinds this notation defines beyond the host
    /// allow-list.
    fn composite_containers(&self) -> &'static [ElementKind] {
        &[]
    }
}
