// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Semantic synchronization.
//!
//! The engine owns the semantic tree and the flat registry and recomputes both
//! from current graph state on every op lifecycle pass. Executed and reverted
//! run the *same* recomputation, so replaying either handler on an
//! already-consistent tree is a no-op; undo/redo can re-enter this code
//! arbitrarily often.

pub mod label;

use std::fmt;

use crate::model::{Element, ElementId, ElementKind, Graph, NotationId};
use crate::ops::{Delta, DeltaBuilder, OpContext, OpKind};
use crate::semantic::containment;
use crate::semantic::{ChildRole, ContainmentError, Registry, SemanticObject, SemanticTree};

pub use label::{
    LabelLifecycleManager, EXTERNAL_LABEL_HEIGHT, EXTERNAL_LABEL_WIDTH, LABEL_MARGIN,
    LABEL_REATTACH_ATTEMPTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Executed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// `connection.create` would insert a second copy of an existing
    /// (kind, source, target) connection. Surfaced to the editor as a veto,
    /// not as a user-visible error.
    DuplicateConnection {
        kind: ElementKind,
        source: ElementId,
        target: ElementId,
    },
    Containment(ContainmentError),
    /// A registered interceptor failed.
    Interceptor { notation: String, message: String },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateConnection {
                kind,
                source,
                target,
            } => write!(
                f,
                "a '{kind}' connection from '{source}' to '{target}' already exists"
            ),
            Self::Containment(err) => write!(f, "containment error: {err}"),
            Self::Interceptor { notation, message } => {
                write!(f, "interceptor of notation '{notation}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Containment(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContainmentError> for SyncError {
    fn from(err: ContainmentError) -> Self {
        Self::Containment(err)
    }
}

/// Extension hook: a notation can observe the same executed/reverted lifecycle
/// the engine itself runs on, after the built-in recomputation.
pub trait Interceptor {
    fn on_op(
        &mut self,
        phase: LifecyclePhase,
        context: &OpContext,
        graph: &Graph,
        tree: &mut SemanticTree,
        registry: &mut Registry,
    ) -> Result<(), SyncError>;
}

pub struct SyncEngine {
    tree: SemanticTree,
    registry: Registry,
    interceptors: Vec<(NotationId, Box<dyn Interceptor>)>,
}

#[derive(Debug, Clone)]
pub(crate) struct SyncCheckpoint {
    tree: SemanticTree,
    registry: Registry,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            tree: SemanticTree::new(),
            registry: Registry::new(),
            interceptors: Vec::new(),
        }
    }

    pub fn tree(&self) -> &SemanticTree {
        &self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Appends a notation's lifecycle interceptor. Existing notations are
    /// never modified by a registration.
    pub fn register_interceptor(&mut self, notation: NotationId, interceptor: Box<dyn Interceptor>) {
        self.interceptors.push((notation, interceptor));
    }

    /// Snapshot of the owned state, taken before an op commits so a failing
    /// lifecycle pass rolls the whole op back (one op is the atomicity
    /// boundary).
    pub(crate) fn checkpoint(&self) -> SyncCheckpoint {
        SyncCheckpoint {
            tree: self.tree.clone(),
            registry: self.registry.clone(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: SyncCheckpoint) {
        self.tree = checkpoint.tree;
        self.registry = checkpoint.registry;
    }

    /// One lifecycle pass. The recomputation is identical for both phases;
    /// only the duplicate-connection veto is phase-specific, because it
    /// guards first-time creation and must not fire when a replayed undo has
    /// already removed the original.
    pub fn apply(
        &mut self,
        phase: LifecyclePhase,
        context: &OpContext,
        graph: &Graph,
    ) -> Result<Delta, SyncError> {
        if phase == LifecyclePhase::Executed && context.kind() == OpKind::ConnectionCreate {
            self.check_duplicate(context.primary(), graph)?;
        }

        let mut delta = DeltaBuilder::default();
        self.ensure_root_object(graph, &mut delta);

        // First pass: materialize semantic objects for every attached
        // notation element, so containment below never races the order of the
        // affected list (children may precede their ancestors).
        for id in context.affected() {
            let Some(element) = graph.get(id) else {
                continue;
            };
            if element.is_label() || element.kind().notation().is_none() {
                continue;
            }
            if element.parent().is_some() && !self.tree.contains(id) {
                self.tree
                    .insert(SemanticObject::new(id.clone(), element.kind()));
                delta.record_added(id.clone());
            }
        }

        for id in context.affected() {
            self.sync_element(graph, id, &mut delta)?;
        }

        for (notation, interceptor) in self.interceptors.iter_mut() {
            interceptor
                .on_op(phase, context, graph, &mut self.tree, &mut self.registry)
                .map_err(|err| match err {
                    err @ SyncError::DuplicateConnection { .. }
                    | err @ SyncError::Containment(_) => err,
                    SyncError::Interceptor { message, .. } => SyncError::Interceptor {
                        notation: notation.as_str().to_owned(),
                        message,
                    },
                })?;
        }

        Ok(delta.finish())
    }

    fn check_duplicate(&self, id: &ElementId, graph: &Graph) -> Result<(), SyncError> {
        let Some(element) = graph.get(id) else {
            return Ok(());
        };
        let Some(connection) = element.as_connection() else {
            return Ok(());
        };
        let kind = element.kind();
        if self
            .registry
            .find_connection(&self.tree, kind, connection.source(), connection.target(), id)
            .is_some()
        {
            return Err(SyncError::DuplicateConnection {
                kind,
                source: connection.source().clone(),
                target: connection.target().clone(),
            });
        }
        Ok(())
    }

    /// The current graph root always has a semantic object; both root morphs
    /// and their undos rely on it existing before any child files under it.
    fn ensure_root_object(&mut self, graph: &Graph, delta: &mut DeltaBuilder) {
        let root_id = graph.root().clone();
        let Some(root_el) = graph.get(&root_id) else {
            return;
        };
        match self.tree.get_mut(&root_id) {
            Some(object) => {
                if object.kind() != root_el.kind() {
                    object.set_kind(root_el.kind());
                    delta.record_updated(root_id);
                }
            }
            None => {
                self.tree
                    .insert(SemanticObject::new(root_id.clone(), root_el.kind()));
                delta.record_added(root_id);
            }
        }
    }

    /// Recomputes one element's semantic state from the graph. Deterministic
    /// in current graph state only, so running it twice changes nothing.
    fn sync_element(
        &mut self,
        graph: &Graph,
        id: &ElementId,
        delta: &mut DeltaBuilder,
    ) -> Result<(), SyncError> {
        let Some(element) = graph.get(id) else {
            // Element gone: drop the business object and registry entry.
            let mut removed = self.registry.remove(id);
            if self.tree.contains(id) {
                containment::detach(&mut self.tree, id);
                self.tree.remove(id);
                removed = true;
            }
            if removed {
                delta.record_removed(id.clone());
            }
            return Ok(());
        };

        if element.is_label() {
            self.persist_label_text(element, delta);
            return Ok(());
        }

        if *id == *graph.root() {
            // Handled by ensure_root_object.
            return Ok(());
        }

        if element.kind().notation().is_none() {
            // Plain host elements never acquire business objects.
            return Ok(());
        }

        if element.parent().is_none() {
            // Detached: out of the registry, parent cleared, object kept.
            containment::detach(&mut self.tree, id);
            if self.registry.remove(id) {
                delta.record_updated(id.clone());
            }
            return Ok(());
        }

        debug_assert!(
            self.tree.contains(id),
            "first pass materializes attached notation objects"
        );
        self.persist_payload(graph, element, delta);

        if let Some(host) = self.nearest_semantic_host(graph, element) {
            containment::attach(
                &mut self.tree,
                &host,
                ChildRole::for_kind(element.kind()),
                id,
            )?;
        }

        if self.registry.ensure(id) {
            delta.record_added(id.clone());
        } else {
            delta.record_updated(id.clone());
        }
        Ok(())
    }

    fn persist_label_text(&mut self, label_el: &Element, delta: &mut DeltaBuilder) {
        let Some(body) = label_el.as_label() else {
            return;
        };
        let Some(object) = self.tree.get_mut(body.target()) else {
            return;
        };
        if object.name() != Some(body.text()) {
            object.set_name(Some(body.text()));
            delta.record_updated(body.target().clone());
        }
    }

    fn persist_payload(&mut self, graph: &Graph, element: &Element, delta: &mut DeltaBuilder) {
        let id = element.id().clone();
        let mut changed = false;
        {
            let object = self
                .tree
                .get_mut(&id)
                .expect("object materialized in first pass");

            if object.kind() != element.kind() {
                object.set_kind(element.kind());
                changed = true;
            }

            if let Some(shape) = element.as_shape() {
                let origin = shape.bounds().origin();
                if object.position() != Some((origin.x(), origin.y())) {
                    object.set_position(origin.x(), origin.y());
                    changed = true;
                }
                let embedded = shape.embedded_text();
                if object.short_text() != embedded {
                    object.set_short_text(embedded.map(str::to_owned));
                    changed = true;
                }
            }
        }

        if let Some(connection) = element.as_connection() {
            let source = connection.source().clone();
            let target = connection.target().clone();

            let mut route: Vec<_> = crate::geometry::sanitize_waypoints(connection.waypoints())
                .into_iter()
                .collect();
            if route.len() < 2 {
                // Too few valid points to draw: fall back to a straight line
                // between the current endpoint anchor centers.
                let anchor = |endpoint: &ElementId| {
                    graph
                        .get(endpoint)
                        .and_then(Element::bounds)
                        .unwrap_or_default()
                        .center()
                };
                route = vec![anchor(&source), anchor(&target)];
            }

            let object = self
                .tree
                .get_mut(&id)
                .expect("object materialized in first pass");
            if object.source() != Some(&source) || object.target() != Some(&target) {
                object.set_endpoints(source, target);
                changed = true;
            }
            if object.waypoints() != Some(route.as_slice()) {
                object.set_waypoints(Some(route));
                changed = true;
            }
        }

        if changed {
            delta.record_updated(id);
        }
    }

    /// Walks the visual parent chain to the nearest element that has a
    /// semantic object (ultimately the root).
    fn nearest_semantic_host(&self, graph: &Graph, element: &Element) -> Option<ElementId> {
        let mut current = element.parent().cloned();
        while let Some(parent) = current {
            if self.tree.contains(&parent) {
                return Some(parent);
            }
            current = graph.get(&parent).and_then(|el| el.parent().cloned());
        }
        None
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
