// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The mutation vocabulary of the editor.
//!
//! Every user- or tool-issued change is one [`Op`]. Executing an op records an
//! ordered list of reversible [`GraphPatch`]es; undo replays them backwards,
//! redo forwards, and both paths re-enter the same sync lifecycle with the
//! same [`OpContext`].

pub mod stack;

use std::collections::BTreeSet;
use std::fmt;

use crate::geometry::{Bounds, Point, Waypoints};
use crate::model::{Element, ElementId, ElementKind, Graph, GraphError};
use crate::sync::SyncError;

pub use stack::{AppliedOp, OpStack};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    CreateShape {
        id: ElementId,
        kind: ElementKind,
        parent: ElementId,
        bounds: Bounds,
    },
    /// Group move; a single-element move is a one-element group. The whole
    /// selection moves or none of it does.
    MoveShapes {
        ids: Vec<ElementId>,
        dx: f64,
        dy: f64,
        new_parent: Option<ElementId>,
    },
    ResizeShape {
        id: ElementId,
        bounds: Bounds,
    },
    DeleteShape {
        id: ElementId,
    },
    /// Replace a shape by a compatible kind in place, carrying the label text
    /// over and re-attaching still-valid connections.
    ReplaceShape {
        id: ElementId,
        new_id: ElementId,
        new_kind: ElementKind,
    },
    CreateConnection {
        id: ElementId,
        /// Explicit requested kind; `None` infers from the endpoint pair.
        kind: Option<ElementKind>,
        source: ElementId,
        target: ElementId,
        /// Explicit route; `None` uses the rule-synthesized default.
        waypoints: Option<Vec<Point>>,
    },
    ReconnectStart {
        id: ElementId,
        new_source: ElementId,
    },
    ReconnectEnd {
        id: ElementId,
        new_target: ElementId,
    },
    UpdateWaypoints {
        id: ElementId,
        waypoints: Vec<Point>,
    },
    MoveConnection {
        id: ElementId,
        dx: f64,
        dy: f64,
    },
    /// Re-route as a straight line between the current endpoint centers.
    LayoutConnection {
        id: ElementId,
    },
    DeleteConnection {
        id: ElementId,
    },
    UpdateParent {
        id: ElementId,
        new_parent: ElementId,
    },
    SetLabelText {
        id: ElementId,
        text: String,
    },
    SetEmbeddedText {
        id: ElementId,
        text: String,
    },
    /// Morph the canvas root; every child of the old root is bulk-relocated
    /// into the new root at zero offset.
    UpdateRoot {
        new_root_id: ElementId,
        new_root_kind: ElementKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    ShapeCreate,
    ShapeMove,
    ShapeResize,
    ShapeDelete,
    ShapeReplace,
    ConnectionCreate,
    ReconnectStart,
    ReconnectEnd,
    UpdateWaypoints,
    ConnectionMove,
    ConnectionLayout,
    ConnectionDelete,
    UpdateParent,
    SetLabelText,
    SetEmbeddedText,
    UpdateRoot,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ShapeCreate => "shape.create",
            Self::ShapeMove => "shape.move",
            Self::ShapeResize => "shape.resize",
            Self::ShapeDelete => "shape.delete",
            Self::ShapeReplace => "shape.replace",
            Self::ConnectionCreate => "connection.create",
            Self::ReconnectStart => "connection.reconnectStart",
            Self::ReconnectEnd => "connection.reconnectEnd",
            Self::UpdateWaypoints => "connection.updateWaypoints",
            Self::ConnectionMove => "connection.move",
            Self::ConnectionLayout => "connection.layout",
            Self::ConnectionDelete => "connection.delete",
            Self::UpdateParent => "element.updateParent",
            Self::SetLabelText => "element.setLabelText",
            Self::SetEmbeddedText => "element.setEmbeddedText",
            Self::UpdateRoot => "canvas.updateRoot",
        }
    }
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::CreateShape { .. } => OpKind::ShapeCreate,
            Self::MoveShapes { .. } => OpKind::ShapeMove,
            Self::ResizeShape { .. } => OpKind::ShapeResize,
            Self::DeleteShape { .. } => OpKind::ShapeDelete,
            Self::ReplaceShape { .. } => OpKind::ShapeReplace,
            Self::CreateConnection { .. } => OpKind::ConnectionCreate,
            Self::ReconnectStart { .. } => OpKind::ReconnectStart,
            Self::ReconnectEnd { .. } => OpKind::ReconnectEnd,
            Self::UpdateWaypoints { .. } => OpKind::UpdateWaypoints,
            Self::MoveConnection { .. } => OpKind::ConnectionMove,
            Self::LayoutConnection { .. } => OpKind::ConnectionLayout,
            Self::DeleteConnection { .. } => OpKind::ConnectionDelete,
            Self::UpdateParent { .. } => OpKind::UpdateParent,
            Self::SetLabelText { .. } => OpKind::SetLabelText,
            Self::SetEmbeddedText { .. } => OpKind::SetEmbeddedText,
            Self::UpdateRoot { .. } => OpKind::UpdateRoot,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// One reversible primitive graph mutation. Patches carry both the old and
/// the new value, so applying and reverting are symmetric and can be replayed
/// arbitrarily often by undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphPatch {
    Insert(Element),
    Remove {
        element: Element,
        /// The element's position in its parent's child list at removal time,
        /// restored exactly on revert.
        index: usize,
    },
    SetParent {
        id: ElementId,
        old_parent: Option<ElementId>,
        old_index: usize,
        new_parent: Option<ElementId>,
        new_index: usize,
    },
    SetPosition {
        id: ElementId,
        old: Point,
        new: Point,
    },
    SetBounds {
        id: ElementId,
        old: Bounds,
        new: Bounds,
    },
    SetWaypoints {
        id: ElementId,
        old: Waypoints,
        new: Waypoints,
    },
    SetSource {
        id: ElementId,
        old: ElementId,
        new: ElementId,
    },
    SetTarget {
        id: ElementId,
        old: ElementId,
        new: ElementId,
    },
    SetEmbeddedText {
        id: ElementId,
        old: Option<String>,
        new: Option<String>,
    },
    SetLabelText {
        id: ElementId,
        old: String,
        new: String,
    },
    SetRoot {
        old: ElementId,
        new: ElementId,
    },
}

impl GraphPatch {
    pub fn apply(&self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            Self::Insert(element) => graph.insert(element.clone()),
            Self::Remove { element, .. } => graph.remove(element.id()).map(drop),
            Self::SetParent {
                id,
                new_parent,
                new_index,
                ..
            } => graph
                .set_parent(id, new_parent.as_ref(), Some(*new_index))
                .map(drop),
            Self::SetPosition { id, new, .. } => graph.set_position(id, *new).map(drop),
            Self::SetBounds { id, new, .. } => graph.set_bounds(id, *new).map(drop),
            Self::SetWaypoints { id, new, .. } => {
                graph.set_waypoints(id, new.clone()).map(drop)
            }
            Self::SetSource { id, new, .. } => graph.set_source(id, new).map(drop),
            Self::SetTarget { id, new, .. } => graph.set_target(id, new).map(drop),
            Self::SetEmbeddedText { id, new, .. } => {
                graph.set_embedded_text(id, new.clone()).map(drop)
            }
            Self::SetLabelText { id, new, .. } => {
                graph.set_label_text(id, new.clone()).map(drop)
            }
            Self::SetRoot { new, .. } => graph.set_root(new).map(drop),
        }
    }

    pub fn revert(&self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            Self::Insert(element) => graph.remove(element.id()).map(drop),
            Self::Remove { element, index } => {
                graph.insert(element.clone())?;
                if let Some(parent) = element.parent() {
                    let parent = parent.clone();
                    graph
                        .set_parent(element.id(), Some(&parent), Some(*index))
                        .map(drop)?;
                }
                Ok(())
            }
            Self::SetParent {
                id,
                old_parent,
                old_index,
                ..
            } => graph
                .set_parent(id, old_parent.as_ref(), Some(*old_index))
                .map(drop),
            Self::SetPosition { id, old, .. } => graph.set_position(id, *old).map(drop),
            Self::SetBounds { id, old, .. } => graph.set_bounds(id, *old).map(drop),
            Self::SetWaypoints { id, old, .. } => {
                graph.set_waypoints(id, old.clone()).map(drop)
            }
            Self::SetSource { id, old, .. } => graph.set_source(id, old).map(drop),
            Self::SetTarget { id, old, .. } => graph.set_target(id, old).map(drop),
            Self::SetEmbeddedText { id, old, .. } => {
                graph.set_embedded_text(id, old.clone()).map(drop)
            }
            Self::SetLabelText { id, old, .. } => {
                graph.set_label_text(id, old.clone()).map(drop)
            }
            Self::SetRoot { old, .. } => graph.set_root(old).map(drop),
        }
    }

    /// The element this patch touches (for context bookkeeping).
    pub fn touched(&self) -> &ElementId {
        match self {
            Self::Insert(element) | Self::Remove { element, .. } => element.id(),
            Self::SetParent { id, .. }
            | Self::SetPosition { id, .. }
            | Self::SetBounds { id, .. }
            | Self::SetWaypoints { id, .. }
            | Self::SetSource { id, .. }
            | Self::SetTarget { id, .. }
            | Self::SetEmbeddedText { id, .. }
            | Self::SetLabelText { id, .. } => id,
            Self::SetRoot { new, .. } => new,
        }
    }
}

/// The transient record handed to interceptors on executed and reverted.
/// Carries the op kind and every element whose tree/registry membership may
/// have changed, in sync order (parents before members).
#[derive(Debug, Clone, PartialEq)]
pub struct OpContext {
    kind: OpKind,
    primary: ElementId,
    affected: Vec<ElementId>,
    old_parent: Option<ElementId>,
    new_parent: Option<ElementId>,
}

impl OpContext {
    pub fn new(kind: OpKind, primary: ElementId) -> Self {
        let affected = vec![primary.clone()];
        Self {
            kind,
            primary,
            affected,
            old_parent: None,
            new_parent: None,
        }
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn primary(&self) -> &ElementId {
        &self.primary
    }

    pub fn affected(&self) -> &[ElementId] {
        &self.affected
    }

    pub fn old_parent(&self) -> Option<&ElementId> {
        self.old_parent.as_ref()
    }

    pub fn new_parent(&self) -> Option<&ElementId> {
        self.new_parent.as_ref()
    }

    pub(crate) fn set_parents(
        &mut self,
        old_parent: Option<ElementId>,
        new_parent: Option<ElementId>,
    ) {
        self.old_parent = old_parent;
        self.new_parent = new_parent;
    }

    pub(crate) fn push_affected(&mut self, id: ElementId) {
        if !self.affected.contains(&id) {
            self.affected.push(id);
        }
    }
}

/// Minimal delta describing which semantic objects changed as the result of
/// one op.
///
/// This is intentionally coarse: it reports only added/removed/updated ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
    pub updated: Vec<ElementId>,
}

#[derive(Debug, Default)]
pub(crate) struct DeltaBuilder {
    added: BTreeSet<ElementId>,
    removed: BTreeSet<ElementId>,
    updated: BTreeSet<ElementId>,
}

impl DeltaBuilder {
    pub(crate) fn record_added(&mut self, id: ElementId) {
        self.removed.remove(&id);
        self.updated.remove(&id);
        self.added.insert(id);
    }

    pub(crate) fn record_removed(&mut self, id: ElementId) {
        self.added.remove(&id);
        self.updated.remove(&id);
        self.removed.insert(id);
    }

    pub(crate) fn record_updated(&mut self, id: ElementId) {
        if self.added.contains(&id) || self.removed.contains(&id) {
            return;
        }
        self.updated.insert(id);
    }

    pub(crate) fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub delta: Delta,
}

/// Why an op was turned down. Rejections are routine interactive outcomes,
/// not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The connection rules said no.
    Rule,
    /// No evaluator had an opinion (e.g. a label-proxy endpoint).
    NotApplicable,
    /// The element may not be created inside the requested container.
    Containment {
        kind: ElementKind,
        container: ElementKind,
    },
    /// The selection mixed elements of different notations.
    MixedSelection,
    /// An identical (kind, source, target) connection already exists.
    DuplicateConnection,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule => f.write_str("rejected by connection rules"),
            Self::NotApplicable => f.write_str("no rule applies to these elements"),
            Self::Containment { kind, container } => {
                write!(f, "'{kind}' may not be created inside '{container}'")
            }
            Self::MixedSelection => f.write_str("selection mixes elements of different notations"),
            Self::DuplicateConnection => {
                f.write_str("an identical connection already exists between these elements")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(ApplyResult),
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(&self) -> Option<&ApplyResult> {
        match self {
            Self::Applied(result) => Some(result),
            _ => None,
        }
    }

    pub fn rejected(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpError {
    Graph(GraphError),
    Sync(SyncError),
    /// `element.setLabelText` addressed an element without an external label.
    MissingLabel(ElementId),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "graph error: {err}"),
            Self::Sync(err) => write!(f, "sync error: {err}"),
            Self::MissingLabel(id) => {
                write!(f, "element '{id}' has no external label to write to")
            }
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::MissingLabel(_) => None,
        }
    }
}

impl From<GraphError> for OpError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<SyncError> for OpError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}
