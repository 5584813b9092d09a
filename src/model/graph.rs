// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The visual-graph arena.
//!
//! Elements are keyed by id with explicit parent references; the graph owns
//! every cross-reference (parent/children, connection endpoints, label
//! back-references) and keeps both sides consistent on every mutation.
//! Structural violations such as an element becoming its own ancestor are hard
//! errors, not recoverable outcomes.

use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::{Bounds, Point, Waypoints};

use super::element::{Element, ElementPayload};
use super::ids::ElementId;
use super::kind::ElementKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateId(ElementId),
    NotFound(ElementId),
    NotAShape(ElementId),
    NotAConnection(ElementId),
    NotALabel(ElementId),
    EndpointNotAShape {
        connection: ElementId,
        endpoint: ElementId,
    },
    AlreadyLabeled {
        target: ElementId,
    },
    StillReferenced(ElementId),
    RootRemoval(ElementId),
    ParentCycle {
        element: ElementId,
        parent: ElementId,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "element id '{id}' already exists"),
            Self::NotFound(id) => write!(f, "element '{id}' not found"),
            Self::NotAShape(id) => write!(f, "element '{id}' is not a shape"),
            Self::NotAConnection(id) => write!(f, "element '{id}' is not a connection"),
            Self::NotALabel(id) => write!(f, "element '{id}' is not a label"),
            Self::EndpointNotAShape {
                connection,
                endpoint,
            } => write!(
                f,
                "connection '{connection}' endpoint '{endpoint}' is not a shape"
            ),
            Self::AlreadyLabeled { target } => {
                write!(f, "element '{target}' already has an external label")
            }
            Self::StillReferenced(id) => write!(
                f,
                "element '{id}' still has children, connections, or a label attached"
            ),
            Self::RootRemoval(id) => write!(f, "element '{id}' is the root and cannot be removed"),
            Self::ParentCycle { element, parent } => write!(
                f,
                "making '{parent}' the parent of '{element}' would create a containment cycle"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    root: ElementId,
    elements: BTreeMap<ElementId, Element>,
}

impl Graph {
    pub fn new(root_id: ElementId, root_kind: ElementKind) -> Self {
        let root = Element::shape(root_id.clone(), root_kind, Bounds::default());
        let mut elements = BTreeMap::new();
        elements.insert(root_id.clone(), root);
        Self {
            root: root_id,
            elements,
        }
    }

    pub fn root(&self) -> &ElementId {
        &self.root
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    fn get_mut(&mut self, id: &ElementId) -> Result<&mut Element, GraphError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    fn require(&self, id: &ElementId) -> Result<&Element, GraphError> {
        self.elements
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// Inserts a fully-built element and wires every cross-reference: parent
    /// children list, endpoint incoming/outgoing lists, label back-reference.
    /// The element's `parent` field decides where it attaches.
    pub fn insert(&mut self, element: Element) -> Result<(), GraphError> {
        let id = element.id().clone();
        if self.elements.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }

        if let Some(parent) = element.parent() {
            self.require(parent)?;
        }

        match element.payload() {
            ElementPayload::Shape(_) => {}
            ElementPayload::Connection(body) => {
                for endpoint in [body.source(), body.target()] {
                    let endpoint_el = self.require(endpoint)?;
                    if !endpoint_el.is_shape() {
                        return Err(GraphError::EndpointNotAShape {
                            connection: id.clone(),
                            endpoint: endpoint.clone(),
                        });
                    }
                }
            }
            ElementPayload::Label(body) => {
                let target = self.require(body.target())?;
                if target.is_label() {
                    return Err(GraphError::NotALabel(body.target().clone()));
                }
                if target.label().is_some() {
                    return Err(GraphError::AlreadyLabeled {
                        target: body.target().clone(),
                    });
                }
            }
        }

        if let Some(parent) = element.parent().cloned() {
            self.get_mut(&parent)?.children_mut().push(id.clone());
        }

        match element.payload() {
            ElementPayload::Connection(body) => {
                let source = body.source().clone();
                let target = body.target().clone();
                self.get_mut(&source)?
                    .as_shape_mut()
                    .expect("endpoint checked as shape")
                    .outgoing_mut()
                    .push(id.clone());
                self.get_mut(&target)?
                    .as_shape_mut()
                    .expect("endpoint checked as shape")
                    .incoming_mut()
                    .push(id.clone());
            }
            ElementPayload::Label(body) => {
                let target = body.target().clone();
                let target_el = self.get_mut(&target)?;
                match target_el {
                    el if el.is_shape() => el
                        .as_shape_mut()
                        .expect("shape payload")
                        .set_label(Some(id.clone())),
                    el if el.is_connection() => el
                        .as_connection_mut()
                        .expect("connection payload")
                        .set_label(Some(id.clone())),
                    _ => unreachable!("label targets are shapes or connections"),
                }
            }
            ElementPayload::Shape(_) => {}
        }

        self.elements.insert(id, element);
        Ok(())
    }

    /// Removes a leaf element and unwires it. Refuses to remove the root, an
    /// element with children, a shape with incident connections or a label
    /// still attached, or a connection that still has a label. The returned
    /// element keeps its `parent` field so a symmetric re-insert restores it.
    pub fn remove(&mut self, id: &ElementId) -> Result<Element, GraphError> {
        let element = self.require(id)?;
        if *id == self.root {
            return Err(GraphError::RootRemoval(id.clone()));
        }
        if !element.children().is_empty() {
            return Err(GraphError::StillReferenced(id.clone()));
        }

        match element.payload() {
            ElementPayload::Shape(body) => {
                if !body.incoming().is_empty()
                    || !body.outgoing().is_empty()
                    || body.label().is_some()
                {
                    return Err(GraphError::StillReferenced(id.clone()));
                }
            }
            ElementPayload::Connection(body) => {
                if body.label().is_some() {
                    return Err(GraphError::StillReferenced(id.clone()));
                }
            }
            ElementPayload::Label(_) => {}
        }

        let parent = element.parent().cloned();
        let payload_refs = match element.payload() {
            ElementPayload::Connection(body) => {
                Some((body.source().clone(), body.target().clone()))
            }
            _ => None,
        };
        let label_target = element.as_label().map(|body| body.target().clone());

        if let Some(parent) = parent {
            self.get_mut(&parent)?
                .children_mut()
                .retain(|child| child != id);
        }

        if let Some((source, target)) = payload_refs {
            if let Some(shape) = self.get_mut(&source)?.as_shape_mut() {
                shape.outgoing_mut().retain(|conn| conn != id);
            }
            if let Some(shape) = self.get_mut(&target)?.as_shape_mut() {
                shape.incoming_mut().retain(|conn| conn != id);
            }
        }

        if let Some(target) = label_target {
            let target_el = self.get_mut(&target)?;
            if let Some(shape) = target_el.as_shape_mut() {
                shape.set_label(None);
            } else if let Some(connection) = target_el.as_connection_mut() {
                connection.set_label(None);
            }
        }

        Ok(self
            .elements
            .remove(id)
            .expect("element existence checked above"))
    }

    /// Reparents an element, optionally at a fixed child index. Returns the
    /// previous `(parent, index)` so the move can be reverted exactly.
    pub fn set_parent(
        &mut self,
        id: &ElementId,
        new_parent: Option<&ElementId>,
        index: Option<usize>,
    ) -> Result<(Option<ElementId>, usize), GraphError> {
        self.require(id)?;

        if let Some(parent) = new_parent {
            self.require(parent)?;
            if parent == id || self.is_ancestor(id, parent) {
                return Err(GraphError::ParentCycle {
                    element: id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let old_parent = self.require(id)?.parent().cloned();
        let old_index = match &old_parent {
            Some(parent) => {
                let children = self.require(parent)?.children();
                children.iter().position(|child| child == id).unwrap_or(0)
            }
            None => 0,
        };

        if let Some(parent) = &old_parent {
            self.get_mut(parent)?
                .children_mut()
                .retain(|child| child != id);
        }

        if let Some(parent) = new_parent {
            let children = self.get_mut(parent)?.children_mut();
            let at = index.unwrap_or(children.len()).min(children.len());
            children.insert(at, id.clone());
        }

        self.get_mut(id)?.set_parent(new_parent.cloned());
        Ok((old_parent, old_index))
    }

    /// True when `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &ElementId, id: &ElementId) -> bool {
        let mut current = self.get(id).and_then(|el| el.parent());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|el| el.parent());
        }
        false
    }

    /// True when the element's parent chain reaches the root (the root itself
    /// counts as attached).
    pub fn is_attached(&self, id: &ElementId) -> bool {
        if *id == self.root {
            return true;
        }
        let mut current = self.get(id).and_then(|el| el.parent());
        while let Some(parent) = current {
            if *parent == self.root {
                return true;
            }
            current = self.get(parent).and_then(|el| el.parent());
        }
        false
    }

    /// All transitive children of `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: &ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = match self.get(id) {
            Some(el) => el.children().iter().rev().cloned().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            if let Some(el) = self.get(&current) {
                stack.extend(el.children().iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Switches the root pointer to an already-inserted, parentless element.
    /// Returns the previous root id.
    pub fn set_root(&mut self, new_root: &ElementId) -> Result<ElementId, GraphError> {
        let element = self.require(new_root)?;
        if element.parent().is_some() {
            return Err(GraphError::ParentCycle {
                element: new_root.clone(),
                parent: element.parent().cloned().expect("parent checked above"),
            });
        }
        Ok(std::mem::replace(&mut self.root, new_root.clone()))
    }

    pub fn set_position(&mut self, id: &ElementId, origin: Point) -> Result<Point, GraphError> {
        let element = self.get_mut(id)?;
        if let Some(shape) = element.as_shape_mut() {
            let old = shape.bounds().origin();
            shape.set_bounds(shape.bounds().with_origin(origin));
            return Ok(old);
        }
        if let Some(label) = element.as_label_mut() {
            let old = label.bounds().origin();
            label.set_bounds(label.bounds().with_origin(origin));
            return Ok(old);
        }
        Err(GraphError::NotAShape(id.clone()))
    }

    pub fn set_bounds(&mut self, id: &ElementId, bounds: Bounds) -> Result<Bounds, GraphError> {
        let element = self.get_mut(id)?;
        if let Some(shape) = element.as_shape_mut() {
            let old = shape.bounds();
            shape.set_bounds(bounds);
            return Ok(old);
        }
        if let Some(label) = element.as_label_mut() {
            let old = label.bounds();
            label.set_bounds(bounds);
            return Ok(old);
        }
        Err(GraphError::NotAShape(id.clone()))
    }

    pub fn set_waypoints(
        &mut self,
        id: &ElementId,
        waypoints: Waypoints,
    ) -> Result<Waypoints, GraphError> {
        let connection = self
            .get_mut(id)?
            .as_connection_mut()
            .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
        let old = connection.waypoints().clone();
        connection.set_waypoints(waypoints);
        Ok(old)
    }

    pub fn set_source(
        &mut self,
        id: &ElementId,
        new_source: &ElementId,
    ) -> Result<ElementId, GraphError> {
        self.rewire_endpoint(id, new_source, true)
    }

    pub fn set_target(
        &mut self,
        id: &ElementId,
        new_target: &ElementId,
    ) -> Result<ElementId, GraphError> {
        self.rewire_endpoint(id, new_target, false)
    }

    fn rewire_endpoint(
        &mut self,
        id: &ElementId,
        new_endpoint: &ElementId,
        is_source: bool,
    ) -> Result<ElementId, GraphError> {
        let endpoint_el = self.require(new_endpoint)?;
        if !endpoint_el.is_shape() {
            return Err(GraphError::EndpointNotAShape {
                connection: id.clone(),
                endpoint: new_endpoint.clone(),
            });
        }

        let connection = self
            .get_mut(id)?
            .as_connection_mut()
            .ok_or_else(|| GraphError::NotAConnection(id.clone()))?;
        let old = if is_source {
            let old = connection.source().clone();
            connection.set_source(new_endpoint.clone());
            old
        } else {
            let old = connection.target().clone();
            connection.set_target(new_endpoint.clone());
            old
        };

        if let Some(shape) = self.get_mut(&old)?.as_shape_mut() {
            if is_source {
                shape.outgoing_mut().retain(|conn| conn != id);
            } else {
                shape.incoming_mut().retain(|conn| conn != id);
            }
        }
        let shape = self
            .get_mut(new_endpoint)?
            .as_shape_mut()
            .expect("endpoint checked as shape");
        if is_source {
            shape.outgoing_mut().push(id.clone());
        } else {
            shape.incoming_mut().push(id.clone());
        }
        Ok(old)
    }

    pub fn set_embedded_text(
        &mut self,
        id: &ElementId,
        text: Option<String>,
    ) -> Result<Option<String>, GraphError> {
        let shape = self
            .get_mut(id)?
            .as_shape_mut()
            .ok_or_else(|| GraphError::NotAShape(id.clone()))?;
        let old = shape.embedded_text().map(str::to_owned);
        shape.set_embedded_text(text);
        Ok(old)
    }

    pub fn set_label_text(
        &mut self,
        id: &ElementId,
        text: String,
    ) -> Result<String, GraphError> {
        let label = self
            .get_mut(id)?
            .as_label_mut()
            .ok_or_else(|| GraphError::NotALabel(id.clone()))?;
        let old = label.text().to_owned();
        label.set_text(text);
        Ok(old)
    }

    pub fn outgoing(&self, id: &ElementId) -> &[ElementId] {
        self.get(id)
            .and_then(Element::as_shape)
            .map(|shape| shape.outgoing())
            .unwrap_or(&[])
    }

    pub fn incoming(&self, id: &ElementId) -> &[ElementId] {
        self.get(id)
            .and_then(Element::as_shape)
            .map(|shape| shape.incoming())
            .unwrap_or(&[])
    }
}
