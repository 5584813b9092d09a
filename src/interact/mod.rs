// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pointer-event gesture state machines.
//!
//! Every gesture runs `start -> hover* -> end | cancel`, synchronously and
//! without touching the graph. Hovering re-evaluates the rule dispatcher for
//! live feedback; only `finish` on an accepted preview yields an op request,
//! and a cancelled gesture never reaches the op stack at all. Preview and
//! commit share one dispatcher entry point, so they cannot disagree.

use crate::geometry::Point;
use crate::model::{ElementId, ElementKind, Graph};
use crate::ops::Op;
use crate::rules::{ConnectionOutcome, RuleDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GesturePhase {
    Active,
    Ended,
    Cancelled,
}

/// Drag-to-connect. The preview outcome is recomputed on every hover.
#[derive(Debug)]
pub struct ConnectGesture {
    source: ElementId,
    hint: Option<ElementKind>,
    phase: GesturePhase,
    preview: Option<(ElementId, ConnectionOutcome)>,
}

/// The op request a finished connect gesture resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRequest {
    pub source: ElementId,
    pub target: ElementId,
    pub kind: ElementKind,
}

impl ConnectRequest {
    pub fn into_op(self, id: ElementId) -> Op {
        Op::CreateConnection {
            id,
            kind: Some(self.kind),
            source: self.source,
            target: self.target,
            waypoints: None,
        }
    }
}

impl ConnectGesture {
    pub fn start(source: ElementId, hint: Option<ElementKind>) -> Self {
        Self {
            source,
            hint,
            phase: GesturePhase::Active,
            preview: None,
        }
    }

    pub fn source(&self) -> &ElementId {
        &self.source
    }

    pub fn is_active(&self) -> bool {
        self.phase == GesturePhase::Active
    }

    /// Re-evaluates the rules for the hovered target and remembers the
    /// outcome as the live preview.
    pub fn hover(
        &mut self,
        rules: &RuleDispatcher,
        graph: &Graph,
        target: &ElementId,
    ) -> ConnectionOutcome {
        if self.phase != GesturePhase::Active {
            self.preview = None;
            return ConnectionOutcome::NotApplicable;
        }
        let outcome = rules.can_connect(graph, &self.source, target, self.hint);
        self.preview = Some((target.clone(), outcome.clone()));
        outcome
    }

    /// The pointer left all valid targets; the preview is gone but the
    /// gesture stays active.
    pub fn leave(&mut self) {
        self.preview = None;
    }

    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Cancelled;
        self.preview = None;
    }

    /// Ends the gesture. Yields a request only when the last hover was
    /// accepted; everything else (no hover, rejection, cancelled) yields
    /// nothing and therefore never reaches the op stack.
    pub fn finish(&mut self) -> Option<ConnectRequest> {
        if self.phase != GesturePhase::Active {
            return None;
        }
        self.phase = GesturePhase::Ended;
        let (target, outcome) = self.preview.take()?;
        let accepted = outcome.accepted()?;
        Some(ConnectRequest {
            source: self.source.clone(),
            target,
            kind: accepted.kind(),
        })
    }
}

/// Which end of a connection a reconnect drag picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectEndpoint {
    Source,
    Target,
}

/// Drag one endpoint of an existing connection to a new shape. Evaluation
/// substitutes the hovered shape into the existing pair, with the existing
/// kind as the explicit hint.
#[derive(Debug)]
pub struct ReconnectGesture {
    connection: ElementId,
    endpoint: ReconnectEndpoint,
    phase: GesturePhase,
    preview: Option<(ElementId, ConnectionOutcome)>,
}

impl ReconnectGesture {
    pub fn start(connection: ElementId, endpoint: ReconnectEndpoint) -> Self {
        Self {
            connection,
            endpoint,
            phase: GesturePhase::Active,
            preview: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == GesturePhase::Active
    }

    pub fn hover(
        &mut self,
        rules: &RuleDispatcher,
        graph: &Graph,
        candidate: &ElementId,
    ) -> ConnectionOutcome {
        if self.phase != GesturePhase::Active {
            self.preview = None;
            return ConnectionOutcome::NotApplicable;
        }

        let outcome = match graph.get(&self.connection).and_then(|el| {
            el.as_connection()
                .map(|body| (el.kind(), body.source().clone(), body.target().clone()))
        }) {
            Some((kind, source, target)) => match self.endpoint {
                ReconnectEndpoint::Source => {
                    rules.can_connect(graph, candidate, &target, Some(kind))
                }
                ReconnectEndpoint::Target => {
                    rules.can_connect(graph, &source, candidate, Some(kind))
                }
            },
            None => ConnectionOutcome::NotApplicable,
        };

        self.preview = Some((candidate.clone(), outcome.clone()));
        outcome
    }

    pub fn leave(&mut self) {
        self.preview = None;
    }

    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Cancelled;
        self.preview = None;
    }

    pub fn finish(&mut self) -> Option<Op> {
        if self.phase != GesturePhase::Active {
            return None;
        }
        self.phase = GesturePhase::Ended;
        let (candidate, outcome) = self.preview.take()?;
        outcome.accepted()?;
        Some(match self.endpoint {
            ReconnectEndpoint::Source => Op::ReconnectStart {
                id: self.connection.clone(),
                new_source: candidate,
            },
            ReconnectEndpoint::Target => Op::ReconnectEnd {
                id: self.connection.clone(),
                new_target: candidate,
            },
        })
    }
}

/// Drag a single waypoint of a connection. Non-finite drag positions are
/// ignored so a malformed pointer sample can never reach the graph.
#[derive(Debug)]
pub struct BendpointGesture {
    connection: ElementId,
    index: usize,
    phase: GesturePhase,
    route: Vec<Point>,
}

impl BendpointGesture {
    /// Picks up the waypoint at `index`; `None` if the connection or index
    /// does not exist.
    pub fn start(graph: &Graph, connection: ElementId, index: usize) -> Option<Self> {
        let route: Vec<Point> = graph
            .get(&connection)?
            .as_connection()?
            .waypoints()
            .iter()
            .copied()
            .collect();
        if index >= route.len() {
            return None;
        }
        Some(Self {
            connection,
            index,
            phase: GesturePhase::Active,
            route,
        })
    }

    pub fn is_active(&self) -> bool {
        self.phase == GesturePhase::Active
    }

    pub fn hover(&mut self, position: Point) {
        if self.phase != GesturePhase::Active || !position.is_finite() {
            return;
        }
        self.route[self.index] = position;
    }

    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Cancelled;
    }

    pub fn finish(&mut self) -> Option<Op> {
        if self.phase != GesturePhase::Active {
            return None;
        }
        self.phase = GesturePhase::Ended;
        Some(Op::UpdateWaypoints {
            id: self.connection.clone(),
            waypoints: self.route.clone(),
        })
    }
}
