// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The semantic object tree mirrored from the visual graph.
//!
//! Objects are kept in an id-keyed arena with explicit parent references; a
//! parent holds its members in one of three role-keyed child collections. A
//! collection is `None` until the containment maintainer materializes it, so
//! "never created" stays distinct from "empty".

pub mod containment;
pub mod registry;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::Point;
use crate::model::{ElementId, ElementKind};

pub use containment::ContainmentError;
pub use registry::{ExportDocument, Registry};

/// Which child collection of a parent a member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChildRole {
    Flow,
    Artifact,
    Generic,
}

impl ChildRole {
    /// Chart elements are flow members, overlay elements are artifacts, and
    /// anything else that acquires a semantic object files under generic.
    pub fn for_kind(kind: ElementKind) -> Self {
        match kind.notation() {
            Some(crate::model::CHART_NAMESPACE) => Self::Flow,
            Some(crate::model::OVERLAY_NAMESPACE) => Self::Artifact,
            _ => Self::Generic,
        }
    }
}

/// One business object. Geometry and endpoint fields are persisted snapshots
/// of the visual element, refreshed by the sync engine on every lifecycle
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticObject {
    id: ElementId,
    kind: ElementKind,
    parent: Option<ElementId>,
    name: Option<String>,
    short_text: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    source: Option<ElementId>,
    target: Option<ElementId>,
    waypoints: Option<Vec<Point>>,
    flow_children: Option<Vec<ElementId>>,
    artifact_children: Option<Vec<ElementId>>,
    generic_children: Option<Vec<ElementId>>,
}

impl SemanticObject {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            name: None,
            short_text: None,
            x: None,
            y: None,
            source: None,
            target: None,
            waypoints: None,
            flow_children: None,
            artifact_children: None,
            generic_children: None,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ElementKind) {
        self.kind = kind;
    }

    pub fn parent(&self) -> Option<&ElementId> {
        self.parent.as_ref()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ElementId>) {
        self.parent = parent;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name<T: Into<String>>(&mut self, name: Option<T>) {
        self.name = name.map(Into::into);
    }

    pub fn short_text(&self) -> Option<&str> {
        self.short_text.as_deref()
    }

    pub fn set_short_text<T: Into<String>>(&mut self, text: Option<T>) {
        self.short_text = text.map(Into::into);
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = Some(x);
        self.y = Some(y);
    }

    pub fn source(&self) -> Option<&ElementId> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&ElementId> {
        self.target.as_ref()
    }

    pub fn set_endpoints(&mut self, source: ElementId, target: ElementId) {
        self.source = Some(source);
        self.target = Some(target);
    }

    pub fn waypoints(&self) -> Option<&[Point]> {
        self.waypoints.as_deref()
    }

    pub fn set_waypoints(&mut self, waypoints: Option<Vec<Point>>) {
        self.waypoints = waypoints;
    }

    pub fn children(&self, role: ChildRole) -> Option<&[ElementId]> {
        self.collection(role).map(Vec::as_slice)
    }

    pub(crate) fn collection(&self, role: ChildRole) -> Option<&Vec<ElementId>> {
        match role {
            ChildRole::Flow => self.flow_children.as_ref(),
            ChildRole::Artifact => self.artifact_children.as_ref(),
            ChildRole::Generic => self.generic_children.as_ref(),
        }
    }

    pub(crate) fn collection_mut(&mut self, role: ChildRole) -> &mut Option<Vec<ElementId>> {
        match role {
            ChildRole::Flow => &mut self.flow_children,
            ChildRole::Artifact => &mut self.artifact_children,
            ChildRole::Generic => &mut self.generic_children,
        }
    }

    /// The role collection holding `child`, if any.
    pub fn role_of(&self, child: &ElementId) -> Option<ChildRole> {
        for role in [ChildRole::Flow, ChildRole::Artifact, ChildRole::Generic] {
            if let Some(members) = self.collection(role) {
                if members.contains(child) {
                    return Some(role);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemanticTree {
    objects: BTreeMap<ElementId, SemanticObject>,
}

impl SemanticTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ElementId) -> Option<&SemanticObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut SemanticObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn insert(&mut self, object: SemanticObject) {
        self.objects.insert(object.id().clone(), object);
    }

    pub fn remove(&mut self, id: &ElementId) -> Option<SemanticObject> {
        self.objects.remove(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SemanticObject> {
        self.objects.values()
    }

    /// Bidirectional containment check: a collection holds a member iff that
    /// member's parent is the collection's owner, and nothing is a member of
    /// two collections at once.
    pub fn is_consistent(&self) -> bool {
        for object in self.objects.values() {
            if let Some(parent_id) = object.parent() {
                let Some(parent) = self.objects.get(parent_id) else {
                    return false;
                };
                let memberships: usize = [ChildRole::Flow, ChildRole::Artifact, ChildRole::Generic]
                    .into_iter()
                    .filter_map(|role| parent.collection(role))
                    .map(|members| members.iter().filter(|m| *m == object.id()).count())
                    .sum();
                if memberships != 1 {
                    return false;
                }
            }

            for role in [ChildRole::Flow, ChildRole::Artifact, ChildRole::Generic] {
                let Some(members) = object.collection(role) else {
                    continue;
                };
                for member in members {
                    match self.objects.get(member) {
                        Some(child) if child.parent() == Some(object.id()) => {}
                        _ => return false,
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ChartKind, CoreKind, ElementId, ElementKind, OverlayKind};

    use super::{ChildRole, SemanticObject, SemanticTree};

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    #[test]
    fn child_role_follows_the_owning_notation() {
        assert_eq!(
            ChildRole::for_kind(ElementKind::Chart(ChartKind::Generic)),
            ChildRole::Flow
        );
        assert_eq!(
            ChildRole::for_kind(ElementKind::Overlay(OverlayKind::Marker)),
            ChildRole::Artifact
        );
        assert_eq!(
            ChildRole::for_kind(ElementKind::Core(CoreKind::Shape)),
            ChildRole::Generic
        );
    }

    #[test]
    fn consistency_detects_one_directional_membership() {
        let mut tree = SemanticTree::new();
        let mut root = SemanticObject::new(eid("root"), ElementKind::Core(CoreKind::Root));
        *root.collection_mut(ChildRole::Flow) = Some(vec![eid("a")]);
        tree.insert(root);

        // Member recorded on the parent but the child's parent pointer is
        // missing: inconsistent.
        let child = SemanticObject::new(eid("a"), ElementKind::Chart(ChartKind::Generic));
        tree.insert(child);
        assert!(!tree.is_consistent());

        tree.get_mut(&eid("a"))
            .expect("child")
            .set_parent(Some(eid("root")));
        assert!(tree.is_consistent());
    }

    #[test]
    fn consistency_rejects_double_membership() {
        let mut tree = SemanticTree::new();
        let mut root = SemanticObject::new(eid("root"), ElementKind::Core(CoreKind::Root));
        *root.collection_mut(ChildRole::Flow) = Some(vec![eid("a")]);
        *root.collection_mut(ChildRole::Generic) = Some(vec![eid("a")]);
        tree.insert(root);

        let mut child = SemanticObject::new(eid("a"), ElementKind::Chart(ChartKind::Generic));
        child.set_parent(Some(eid("root")));
        tree.insert(child);

        assert!(!tree.is_consistent());
    }
}
