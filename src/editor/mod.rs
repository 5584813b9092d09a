// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The editor facade: one op in, one committed (or rejected) change out.
//!
//! `execute` drives a single op to full completion before returning: the rule
//! gate, the recorded graph patches, the label phase, and the sync lifecycle
//! all run inside it. If anything fails, graph and semantic state roll back to
//! the pre-op checkpoint; a command is never partially applied. Undo and redo
//! replay recorded patches and re-enter the same sync lifecycle.

use crate::geometry::{straight_route, Waypoints};
use crate::model::{
    Element, ElementId, ElementKind, Graph, GraphError, NotationId,
};
use crate::ops::{
    AppliedOp, ApplyResult, Delta, GraphPatch, Op, OpContext, OpError, OpStack, Outcome,
    RejectReason,
};
use crate::rules::{
    AcceptedConnection, ConnectionEvaluator, ConnectionOutcome, RuleDispatcher, RuleVerdict,
};
use crate::semantic::{Registry, SemanticTree};
use crate::sync::{
    Interceptor, LabelLifecycleManager, LifecyclePhase, SyncEngine, SyncError,
    LABEL_REATTACH_ATTEMPTS,
};

enum Gate {
    Allow(Option<AcceptedConnection>),
    Reject(RejectReason),
}

pub struct Editor {
    graph: Graph,
    rules: RuleDispatcher,
    sync: SyncEngine,
    labels: LabelLifecycleManager,
    stack: OpStack,
    rev: u64,
}

impl Editor {
    /// An editor with the stock notations registered.
    pub fn new(root_id: ElementId, root_kind: ElementKind) -> Self {
        Self::with_dispatcher(root_id, root_kind, RuleDispatcher::with_defaults())
    }

    /// An editor with no notations; host defaults only. Notations join later
    /// through [`Editor::register_evaluator`] / [`Editor::register_interceptor`].
    pub fn bare(root_id: ElementId, root_kind: ElementKind) -> Self {
        Self::with_dispatcher(root_id, root_kind, RuleDispatcher::new())
    }

    fn with_dispatcher(root_id: ElementId, root_kind: ElementKind, rules: RuleDispatcher) -> Self {
        Self {
            graph: Graph::new(root_id, root_kind),
            rules,
            sync: SyncEngine::new(),
            labels: LabelLifecycleManager::new(),
            stack: OpStack::new(),
            rev: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn tree(&self) -> &SemanticTree {
        self.sync.tree()
    }

    pub fn registry(&self) -> &Registry {
        self.sync.registry()
    }

    pub fn rules(&self) -> &RuleDispatcher {
        &self.rules
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    pub fn export(&self) -> crate::semantic::ExportDocument {
        self.sync.registry().export(self.sync.tree())
    }

    /// Adds a notation's rule evaluator without touching existing notations.
    pub fn register_evaluator(&mut self, evaluator: Box<dyn ConnectionEvaluator>) {
        self.rules.register_evaluator(evaluator);
    }

    /// Adds a notation's lifecycle interceptor without touching existing
    /// notations.
    pub fn register_interceptor(
        &mut self,
        notation: NotationId,
        interceptor: Box<dyn Interceptor>,
    ) {
        self.sync.register_interceptor(notation, interceptor);
    }

    /// Executes one op to full completion: rule gate, graph patches, label
    /// phase, sync lifecycle, commit. Rejections are routine outcomes;
    /// structural failures roll everything back and surface as errors.
    pub fn execute(&mut self, op: Op) -> Result<Outcome, OpError> {
        let accepted = match self.gate(&op)? {
            Gate::Reject(reason) => return Ok(Outcome::Rejected(reason)),
            Gate::Allow(accepted) => accepted,
        };

        let graph_checkpoint = self.graph.clone();
        let sync_checkpoint = self.sync.checkpoint();

        let mut patches = Vec::new();
        let mut context = OpContext::new(op.kind(), self.primary_of(&op));

        let carry = match self.plan(&op, accepted, &mut patches, &mut context) {
            Ok(carry) => carry,
            Err(err) => {
                self.graph = graph_checkpoint;
                return Err(err);
            }
        };

        // Label phase: freshly-attached elements get their external label as
        // part of this same op, so one undo removes both.
        for patch in self.labels.ensure_patches(&self.graph, context.affected()) {
            if let Err(err) = patch.apply(&mut self.graph) {
                self.graph = graph_checkpoint;
                return Err(err.into());
            }
            context.push_affected(patch.touched().clone());
            patches.push(patch);
        }

        // Replace carries the old label text onto the fresh label before the
        // lifecycle pass persists names.
        if let Some((new_id, text)) = &carry {
            if let Err(err) = self.write_label_text(new_id, text, &mut patches, &mut context) {
                self.graph = graph_checkpoint;
                return Err(err);
            }
        }

        let mut delta = match self.sync.apply(LifecyclePhase::Executed, &context, &self.graph) {
            Ok(delta) => delta,
            Err(SyncError::DuplicateConnection { .. }) => {
                self.graph = graph_checkpoint;
                self.sync.restore(sync_checkpoint);
                return Ok(Outcome::Rejected(RejectReason::DuplicateConnection));
            }
            Err(err) => {
                self.graph = graph_checkpoint;
                self.sync.restore(sync_checkpoint);
                return Err(err.into());
            }
        };

        // The replace op is complete only once the carried text is observed
        // on the replacement's business object; re-attempts are bounded.
        if let Some((new_id, text)) = &carry {
            let mut attempt = 1;
            while !self.label_text_settled(new_id, text) && attempt < LABEL_REATTACH_ATTEMPTS {
                attempt += 1;
                if let Err(err) = self.write_label_text(new_id, text, &mut patches, &mut context) {
                    self.graph = graph_checkpoint;
                    self.sync.restore(sync_checkpoint);
                    return Err(err);
                }
                match self.sync.apply(LifecyclePhase::Executed, &context, &self.graph) {
                    Ok(extra) => merge_delta(&mut delta, extra),
                    Err(err) => {
                        self.graph = graph_checkpoint;
                        self.sync.restore(sync_checkpoint);
                        return Err(err.into());
                    }
                }
            }
            if !self.label_text_settled(new_id, text) {
                log::warn!(
                    "giving up on label text for '{new_id}' after {LABEL_REATTACH_ATTEMPTS} attempts"
                );
            }
        }

        debug_assert!(self.sync.tree().is_consistent());

        self.rev += 1;
        self.stack.push(AppliedOp::new(op, context, patches));
        Ok(Outcome::Applied(ApplyResult {
            new_rev: self.rev,
            delta,
        }))
    }

    /// Replays the newest applied op backwards and re-enters the reverted
    /// lifecycle. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<ApplyResult>, OpError> {
        let Some(entry) = self.stack.peek_undo().cloned() else {
            return Ok(None);
        };

        let graph_checkpoint = self.graph.clone();
        let sync_checkpoint = self.sync.checkpoint();

        for patch in entry.patches().iter().rev() {
            if let Err(err) = patch.revert(&mut self.graph) {
                self.graph = graph_checkpoint;
                return Err(err.into());
            }
        }

        match self
            .sync
            .apply(LifecyclePhase::Reverted, entry.context(), &self.graph)
        {
            Ok(delta) => {
                debug_assert!(self.sync.tree().is_consistent());
                self.stack.commit_undo();
                self.rev += 1;
                Ok(Some(ApplyResult {
                    new_rev: self.rev,
                    delta,
                }))
            }
            Err(err) => {
                self.graph = graph_checkpoint;
                self.sync.restore(sync_checkpoint);
                Err(err.into())
            }
        }
    }

    /// Replays the next undone op forwards and re-enters the executed
    /// lifecycle. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<ApplyResult>, OpError> {
        let Some(entry) = self.stack.peek_redo().cloned() else {
            return Ok(None);
        };

        let graph_checkpoint = self.graph.clone();
        let sync_checkpoint = self.sync.checkpoint();

        for patch in entry.patches() {
            if let Err(err) = patch.apply(&mut self.graph) {
                self.graph = graph_checkpoint;
                return Err(err.into());
            }
        }

        match self
            .sync
            .apply(LifecyclePhase::Executed, entry.context(), &self.graph)
        {
            Ok(delta) => {
                debug_assert!(self.sync.tree().is_consistent());
                self.stack.commit_redo();
                self.rev += 1;
                Ok(Some(ApplyResult {
                    new_rev: self.rev,
                    delta,
                }))
            }
            Err(err) => {
                self.graph = graph_checkpoint;
                self.sync.restore(sync_checkpoint);
                Err(err.into())
            }
        }
    }

    fn primary_of(&self, op: &Op) -> ElementId {
        match op {
            Op::CreateShape { id, .. }
            | Op::ResizeShape { id, .. }
            | Op::DeleteShape { id }
            | Op::CreateConnection { id, .. }
            | Op::ReconnectStart { id, .. }
            | Op::ReconnectEnd { id, .. }
            | Op::UpdateWaypoints { id, .. }
            | Op::MoveConnection { id, .. }
            | Op::LayoutConnection { id }
            | Op::DeleteConnection { id }
            | Op::UpdateParent { id, .. }
            | Op::SetLabelText { id, .. }
            | Op::SetEmbeddedText { id, .. } => id.clone(),
            Op::ReplaceShape { new_id, .. } => new_id.clone(),
            Op::UpdateRoot { new_root_id, .. } => new_root_id.clone(),
            Op::MoveShapes { ids, .. } => ids
                .first()
                .cloned()
                .unwrap_or_else(|| self.graph.root().clone()),
        }
    }

    fn gate(&self, op: &Op) -> Result<Gate, OpError> {
        match op {
            Op::CreateShape { kind, parent, .. } => {
                let container = self.require(parent)?.kind();
                match self.rules.can_create_in(*kind, container) {
                    RuleVerdict::Rejected => Ok(Gate::Reject(RejectReason::Containment {
                        kind: *kind,
                        container,
                    })),
                    _ => Ok(Gate::Allow(None)),
                }
            }
            Op::MoveShapes {
                ids, new_parent, ..
            } => {
                if self.rules.can_move_group(&self.graph, ids) == RuleVerdict::Rejected {
                    return Ok(Gate::Reject(RejectReason::MixedSelection));
                }
                if let Some(new_parent) = new_parent {
                    let container = self.require(new_parent)?.kind();
                    for id in ids {
                        let element = self.require(id)?;
                        if element.is_label() {
                            continue;
                        }
                        if self.rules.can_create_in(element.kind(), container)
                            == RuleVerdict::Rejected
                        {
                            return Ok(Gate::Reject(RejectReason::Containment {
                                kind: element.kind(),
                                container,
                            }));
                        }
                    }
                }
                Ok(Gate::Allow(None))
            }
            Op::ResizeShape { id, .. } => {
                let element = self.require(id)?;
                if self.rules.can_resize(element).permits() {
                    Ok(Gate::Allow(None))
                } else {
                    Ok(Gate::Reject(RejectReason::Rule))
                }
            }
            Op::CreateConnection {
                source,
                target,
                kind,
                ..
            } => Ok(Self::gate_connection(self.rules.can_connect(
                &self.graph,
                source,
                target,
                *kind,
            ))),
            Op::ReconnectStart { id, new_source } => {
                let element = self.require(id)?;
                let connection = element
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
                Ok(Self::gate_connection(self.rules.can_connect(
                    &self.graph,
                    new_source,
                    connection.target(),
                    Some(element.kind()),
                )))
            }
            Op::ReconnectEnd { id, new_target } => {
                let element = self.require(id)?;
                let connection = element
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
                Ok(Self::gate_connection(self.rules.can_connect(
                    &self.graph,
                    connection.source(),
                    new_target,
                    Some(element.kind()),
                )))
            }
            Op::ReplaceShape { id, new_kind, .. } => {
                let element = self.require(id)?;
                let parent = element.parent().cloned().unwrap_or_else(|| {
                    self.graph.root().clone()
                });
                let container = self.require(&parent)?.kind();
                match self.rules.can_create_in(*new_kind, container) {
                    RuleVerdict::Rejected => Ok(Gate::Reject(RejectReason::Containment {
                        kind: *new_kind,
                        container,
                    })),
                    _ => Ok(Gate::Allow(None)),
                }
            }
            Op::UpdateParent { id, new_parent } => {
                let element = self.require(id)?;
                let container = self.require(new_parent)?.kind();
                match self.rules.can_create_in(element.kind(), container) {
                    RuleVerdict::Rejected => Ok(Gate::Reject(RejectReason::Containment {
                        kind: element.kind(),
                        container,
                    })),
                    _ => Ok(Gate::Allow(None)),
                }
            }
            _ => Ok(Gate::Allow(None)),
        }
    }

    fn gate_connection(outcome: ConnectionOutcome) -> Gate {
        match outcome {
            ConnectionOutcome::Accepted(accepted) => Gate::Allow(Some(accepted)),
            ConnectionOutcome::Rejected => Gate::Reject(RejectReason::Rule),
            ConnectionOutcome::NotApplicable => Gate::Reject(RejectReason::NotApplicable),
        }
    }

    fn require(&self, id: &ElementId) -> Result<&Element, GraphError> {
        self.graph
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// Builds and applies the op's graph patches, recording them in order.
    /// Returns the label text carried by a replace, if any.
    fn plan(
        &mut self,
        op: &Op,
        accepted: Option<AcceptedConnection>,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<Option<(ElementId, String)>, OpError> {
        match op {
            Op::CreateShape {
                id,
                kind,
                parent,
                bounds,
            } => {
                let mut element = Element::shape(id.clone(), *kind, *bounds);
                if kind.is_dual_label() {
                    if let Some(shape) = element.as_shape_mut() {
                        shape.set_embedded_text(Some(""));
                    }
                }
                element.set_parent(Some(parent.clone()));
                self.push_applied(GraphPatch::Insert(element), patches)?;
                context.set_parents(None, Some(parent.clone()));
            }

            Op::MoveShapes {
                ids,
                dx,
                dy,
                new_parent,
            } => {
                self.plan_move(ids, *dx, *dy, new_parent.as_ref(), patches, context)?;
            }

            Op::ResizeShape { id, bounds } => {
                let old = self
                    .require(id)?
                    .bounds()
                    .ok_or_else(|| GraphError::NotAShape(id.clone()))?;
                self.push_applied(
                    GraphPatch::SetBounds {
                        id: id.clone(),
                        old,
                        new: *bounds,
                    },
                    patches,
                )?;
            }

            Op::DeleteShape { id } => {
                self.plan_delete_shape(id, patches, context)?;
            }

            Op::ReplaceShape {
                id,
                new_id,
                new_kind,
            } => {
                return self.plan_replace(id, new_id, *new_kind, patches, context);
            }

            Op::CreateConnection {
                id,
                source,
                target,
                waypoints,
                ..
            } => {
                let accepted =
                    accepted.expect("connection ops resolve their rules in the gate");
                let route: Waypoints = match waypoints {
                    Some(points) => points.iter().copied().collect(),
                    None => accepted.waypoints().clone(),
                };
                let parent = self
                    .require(source)?
                    .parent()
                    .cloned()
                    .unwrap_or_else(|| self.graph.root().clone());
                let mut element = Element::connection(
                    id.clone(),
                    accepted.kind(),
                    source.clone(),
                    target.clone(),
                    route,
                );
                element.set_parent(Some(parent.clone()));
                self.push_applied(GraphPatch::Insert(element), patches)?;
                context.set_parents(None, Some(parent));
            }

            Op::ReconnectStart { id, new_source } => {
                let connection = self
                    .require(id)?
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
                let old = connection.source().clone();
                self.push_applied(
                    GraphPatch::SetSource {
                        id: id.clone(),
                        old,
                        new: new_source.clone(),
                    },
                    patches,
                )?;
            }

            Op::ReconnectEnd { id, new_target } => {
                let connection = self
                    .require(id)?
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
                let old = connection.target().clone();
                self.push_applied(
                    GraphPatch::SetTarget {
                        id: id.clone(),
                        old,
                        new: new_target.clone(),
                    },
                    patches,
                )?;
            }

            Op::UpdateWaypoints { id, waypoints } => {
                let old = self
                    .require(id)?
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?
                    .waypoints()
                    .clone();
                self.push_applied(
                    GraphPatch::SetWaypoints {
                        id: id.clone(),
                        old,
                        new: waypoints.iter().copied().collect(),
                    },
                    patches,
                )?;
            }

            Op::MoveConnection { id, dx, dy } => {
                let old = self
                    .require(id)?
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?
                    .waypoints()
                    .clone();
                let new = old.iter().map(|p| p.translated(*dx, *dy)).collect();
                self.push_applied(
                    GraphPatch::SetWaypoints {
                        id: id.clone(),
                        old,
                        new,
                    },
                    patches,
                )?;
            }

            Op::LayoutConnection { id } => {
                let connection = self
                    .require(id)?
                    .as_connection()
                    .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
                let source = connection.source().clone();
                let target = connection.target().clone();
                let old = connection.waypoints().clone();
                let source_bounds = self.require(&source)?.bounds().unwrap_or_default();
                let target_bounds = self.require(&target)?.bounds().unwrap_or_default();
                self.push_applied(
                    GraphPatch::SetWaypoints {
                        id: id.clone(),
                        old,
                        new: straight_route(source_bounds, target_bounds),
                    },
                    patches,
                )?;
            }

            Op::DeleteConnection { id } => {
                self.require(id)?;
                self.remove_with_label(id, patches, context)?;
            }

            Op::UpdateParent { id, new_parent } => {
                let old_parent = self.require(id)?.parent().cloned();
                self.reparent(id, Some(new_parent), patches)?;
                context.set_parents(old_parent, Some(new_parent.clone()));
            }

            Op::SetLabelText { id, text } => {
                let label_id = self
                    .require(id)?
                    .label()
                    .cloned()
                    .ok_or_else(|| OpError::MissingLabel(id.clone()))?;
                let old = self
                    .require(&label_id)?
                    .as_label()
                    .map(|body| body.text().to_owned())
                    .unwrap_or_default();
                self.push_applied(
                    GraphPatch::SetLabelText {
                        id: label_id.clone(),
                        old,
                        new: text.clone(),
                    },
                    patches,
                )?;
                context.push_affected(label_id);
            }

            Op::SetEmbeddedText { id, text } => {
                let old = self
                    .require(id)?
                    .as_shape()
                    .ok_or_else(|| GraphError::NotAShape(id.clone()))?
                    .embedded_text()
                    .map(str::to_owned);
                self.push_applied(
                    GraphPatch::SetEmbeddedText {
                        id: id.clone(),
                        old,
                        new: Some(text.clone()),
                    },
                    patches,
                )?;
            }

            Op::UpdateRoot {
                new_root_id,
                new_root_kind,
            } => {
                self.plan_update_root(new_root_id, *new_root_kind, patches, context)?;
            }
        }
        Ok(None)
    }

    fn plan_move(
        &mut self,
        ids: &[ElementId],
        dx: f64,
        dy: f64,
        new_parent: Option<&ElementId>,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<(), OpError> {
        // Selection plus everything nested under it, in order, once.
        let mut closure: Vec<ElementId> = Vec::new();
        for id in ids {
            self.require(id)?;
            if !closure.contains(id) {
                closure.push(id.clone());
            }
            for descendant in self.graph.descendants(id) {
                if !closure.contains(&descendant) {
                    closure.push(descendant);
                }
            }
        }

        if let Some(new_parent) = new_parent {
            let old_parent = ids
                .first()
                .and_then(|id| self.graph.get(id))
                .and_then(|el| el.parent().cloned());
            context.set_parents(old_parent, Some(new_parent.clone()));
            for id in ids {
                if self.graph.get(id).map(|el| el.parent() == Some(new_parent)) == Some(true) {
                    continue;
                }
                self.reparent(id, Some(new_parent), patches)?;
            }
        }

        // External labels ride along with their targets.
        let mut moved = closure.clone();
        for id in &closure {
            if let Some(label) = self.graph.get(id).and_then(|el| el.label().cloned()) {
                if !moved.contains(&label) {
                    moved.push(label);
                }
            }
        }

        for id in &moved {
            let Some(element) = self.graph.get(id) else {
                continue;
            };
            if element.is_connection() {
                continue;
            }
            let Some(old) = element.position() else {
                continue;
            };
            self.push_applied(
                GraphPatch::SetPosition {
                    id: id.clone(),
                    old,
                    new: old.translated(dx, dy),
                },
                patches,
            )?;
        }

        // Connections wholly inside the moved set keep their shape: translate
        // their routes instead of re-routing.
        let mut inner_connections: Vec<ElementId> = Vec::new();
        for id in &closure {
            for conn in self.graph.outgoing(id).to_vec() {
                if inner_connections.contains(&conn) {
                    continue;
                }
                let target_inside = self
                    .graph
                    .get(&conn)
                    .and_then(Element::as_connection)
                    .map(|body| closure.contains(body.target()))
                    .unwrap_or(false);
                if target_inside {
                    inner_connections.push(conn);
                }
            }
        }
        for conn in &inner_connections {
            let old = self
                .require(conn)?
                .as_connection()
                .ok_or_else(|| GraphError::NotAConnection(conn.clone()))?
                .waypoints()
                .clone();
            let new = old.iter().map(|p| p.translated(dx, dy)).collect();
            self.push_applied(
                GraphPatch::SetWaypoints {
                    id: conn.clone(),
                    old,
                    new,
                },
                patches,
            )?;
        }

        for id in moved {
            context.push_affected(id);
        }
        for conn in inner_connections {
            context.push_affected(conn);
        }
        Ok(())
    }

    fn plan_delete_shape(
        &mut self,
        id: &ElementId,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<(), OpError> {
        self.require(id)?;

        let mut scope = vec![id.clone()];
        scope.extend(self.graph.descendants(id));

        // Connections touching any shape in scope go first; their endpoints
        // stay valid until the moment they detach (and never dangle after).
        let mut connections: Vec<ElementId> = Vec::new();
        for member in &scope {
            let Some(element) = self.graph.get(member) else {
                continue;
            };
            if element.is_connection() && !connections.contains(member) {
                connections.push(member.clone());
            }
            if let Some(shape) = element.as_shape() {
                for conn in shape.incoming().iter().chain(shape.outgoing()) {
                    if !connections.contains(conn) {
                        connections.push(conn.clone());
                    }
                }
            }
        }
        for conn in &connections {
            if self.graph.contains(conn) {
                self.remove_with_label(conn, patches, context)?;
            }
        }

        // Then everything else, deepest first.
        for member in scope.iter().rev() {
            if !self.graph.contains(member) {
                context.push_affected(member.clone());
                continue;
            }
            self.remove_with_label(member, patches, context)?;
        }
        Ok(())
    }

    fn plan_replace(
        &mut self,
        id: &ElementId,
        new_id: &ElementId,
        new_kind: ElementKind,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<Option<(ElementId, String)>, OpError> {
        let old_element = self.require(id)?.clone();
        let old_shape = old_element
            .as_shape()
            .ok_or_else(|| GraphError::NotAShape(id.clone()))?;
        let bounds = old_shape.bounds();
        let parent = old_element.parent().cloned();
        let captured = old_element
            .label()
            .and_then(|label| self.graph.get(label))
            .and_then(Element::as_label)
            .map(|body| body.text().to_owned());

        let mut replacement = Element::shape(new_id.clone(), new_kind, bounds);
        if new_kind.is_dual_label() {
            if let Some(shape) = replacement.as_shape_mut() {
                shape.set_embedded_text(Some(""));
            }
        }
        replacement.set_parent(parent.clone());
        self.push_applied(GraphPatch::Insert(replacement), patches)?;
        context.set_parents(parent.clone(), parent);

        for child in old_element.children().to_vec() {
            self.reparent(&child, Some(new_id), patches)?;
            context.push_affected(child);
        }

        // Incident connections survive only if the rules still accept them
        // with the replacement substituted in.
        for conn in old_shape.outgoing().to_vec() {
            let Some(element) = self.graph.get(&conn) else {
                continue;
            };
            let kind = element.kind();
            let Some(target) = element.as_connection().map(|body| body.target().clone())
            else {
                continue;
            };
            let outcome = self
                .rules
                .can_connect(&self.graph, new_id, &target, Some(kind));
            if outcome.is_accepted() {
                self.push_applied(
                    GraphPatch::SetSource {
                        id: conn.clone(),
                        old: id.clone(),
                        new: new_id.clone(),
                    },
                    patches,
                )?;
                context.push_affected(conn);
            } else {
                self.remove_with_label(&conn, patches, context)?;
            }
        }
        for conn in old_shape.incoming().to_vec() {
            let Some(element) = self.graph.get(&conn) else {
                continue;
            };
            let kind = element.kind();
            let Some(source) = element.as_connection().map(|body| body.source().clone())
            else {
                continue;
            };
            let outcome = self
                .rules
                .can_connect(&self.graph, &source, new_id, Some(kind));
            if outcome.is_accepted() {
                self.push_applied(
                    GraphPatch::SetTarget {
                        id: conn.clone(),
                        old: id.clone(),
                        new: new_id.clone(),
                    },
                    patches,
                )?;
                context.push_affected(conn);
            } else {
                self.remove_with_label(&conn, patches, context)?;
            }
        }

        if let Some(label) = self.graph.get(id).and_then(|el| el.label().cloned()) {
            context.push_affected(label.clone());
            self.remove_recorded(&label, patches)?;
        }
        context.push_affected(id.clone());
        self.remove_recorded(id, patches)?;

        Ok(captured.map(|text| (new_id.clone(), text)))
    }

    fn plan_update_root(
        &mut self,
        new_root_id: &ElementId,
        new_root_kind: ElementKind,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<(), OpError> {
        let old_root_id = self.graph.root().clone();
        let old_root = self.require(&old_root_id)?.clone();

        let new_root = Element::shape(
            new_root_id.clone(),
            new_root_kind,
            old_root.bounds().unwrap_or_default(),
        );
        self.push_applied(GraphPatch::Insert(new_root), patches)?;

        // Zero-offset bulk relocation: positions stay untouched, only the
        // containment edges move.
        for child in old_root.children().to_vec() {
            self.reparent(&child, Some(new_root_id), patches)?;
            context.push_affected(child);
        }

        self.push_applied(
            GraphPatch::SetRoot {
                old: old_root_id.clone(),
                new: new_root_id.clone(),
            },
            patches,
        )?;

        context.push_affected(old_root_id.clone());
        self.remove_recorded(&old_root_id, patches)?;
        context.set_parents(Some(old_root_id), None);
        Ok(())
    }

    fn push_applied(
        &mut self,
        patch: GraphPatch,
        patches: &mut Vec<GraphPatch>,
    ) -> Result<(), OpError> {
        patch.apply(&mut self.graph)?;
        patches.push(patch);
        Ok(())
    }

    /// Reparents immediately and records the patch with both exact indices,
    /// so undo restores child order.
    fn reparent(
        &mut self,
        id: &ElementId,
        new_parent: Option<&ElementId>,
        patches: &mut Vec<GraphPatch>,
    ) -> Result<(), OpError> {
        let (old_parent, old_index) = self.graph.set_parent(id, new_parent, None)?;
        let new_index = new_parent
            .and_then(|parent| self.graph.get(parent))
            .and_then(|el| el.children().iter().position(|child| child == id))
            .unwrap_or(0);
        patches.push(GraphPatch::SetParent {
            id: id.clone(),
            old_parent,
            old_index,
            new_parent: new_parent.cloned(),
            new_index,
        });
        Ok(())
    }

    fn remove_recorded(
        &mut self,
        id: &ElementId,
        patches: &mut Vec<GraphPatch>,
    ) -> Result<(), OpError> {
        let element = self
            .graph
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        let index = element
            .parent()
            .and_then(|parent| self.graph.get(parent))
            .and_then(|el| el.children().iter().position(|child| child == id))
            .unwrap_or(0);
        let patch = GraphPatch::Remove { element, index };
        patch.apply(&mut self.graph)?;
        patches.push(patch);
        Ok(())
    }

    fn remove_with_label(
        &mut self,
        id: &ElementId,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<(), OpError> {
        if let Some(label) = self.graph.get(id).and_then(|el| el.label().cloned()) {
            context.push_affected(label.clone());
            self.remove_recorded(&label, patches)?;
        }
        context.push_affected(id.clone());
        self.remove_recorded(id, patches)
    }

    fn write_label_text(
        &mut self,
        target: &ElementId,
        text: &str,
        patches: &mut Vec<GraphPatch>,
        context: &mut OpContext,
    ) -> Result<(), OpError> {
        let Some(label_id) = self.graph.get(target).and_then(|el| el.label().cloned()) else {
            return Ok(());
        };
        let old = self
            .graph
            .get(&label_id)
            .and_then(Element::as_label)
            .map(|body| body.text().to_owned())
            .unwrap_or_default();
        if old == text {
            return Ok(());
        }
        self.push_applied(
            GraphPatch::SetLabelText {
                id: label_id.clone(),
                old,
                new: text.to_owned(),
            },
            patches,
        )?;
        context.push_affected(label_id);
        Ok(())
    }

    fn label_text_settled(&self, target: &ElementId, text: &str) -> bool {
        self.sync
            .tree()
            .get(target)
            .and_then(|object| object.name())
            == Some(text)
    }
}

fn merge_delta(base: &mut Delta, extra: Delta) {
    for id in extra.added {
        if !base.added.contains(&id) && !base.removed.contains(&id) {
            base.added.push(id);
        }
    }
    for id in extra.removed {
        base.added.retain(|existing| *existing != id);
        base.updated.retain(|existing| *existing != id);
        if !base.removed.contains(&id) {
            base.removed.push(id);
        }
    }
    for id in extra.updated {
        if !base.added.contains(&id)
            && !base.removed.contains(&id)
            && !base.updated.contains(&id)
        {
            base.updated.push(id);
        }
    }
    base.added.sort();
    base.removed.sort();
    base.updated.sort();
}
