// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::geometry::{Bounds, Point, Waypoints};

use super::ids::ElementId;
use super::kind::{CoreKind, ElementKind};

/// A shape on the canvas. Incoming/outgoing lists are ordered and maintained
/// by the graph when connections are inserted, removed, or reconnected.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBody {
    bounds: Bounds,
    embedded_text: Option<String>,
    label: Option<ElementId>,
    incoming: Vec<ElementId>,
    outgoing: Vec<ElementId>,
}

impl ShapeBody {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            embedded_text: None,
            label: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn embedded_text(&self) -> Option<&str> {
        self.embedded_text.as_deref()
    }

    pub fn set_embedded_text<T: Into<String>>(&mut self, text: Option<T>) {
        self.embedded_text = text.map(Into::into);
    }

    pub fn label(&self) -> Option<&ElementId> {
        self.label.as_ref()
    }

    pub(crate) fn set_label(&mut self, label: Option<ElementId>) {
        self.label = label;
    }

    pub fn incoming(&self) -> &[ElementId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[ElementId] {
        &self.outgoing
    }

    pub(crate) fn incoming_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.incoming
    }

    pub(crate) fn outgoing_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.outgoing
    }
}

/// A typed link between two shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionBody {
    source: ElementId,
    target: ElementId,
    waypoints: Waypoints,
    label: Option<ElementId>,
}

impl ConnectionBody {
    pub fn new(source: ElementId, target: ElementId, waypoints: Waypoints) -> Self {
        Self {
            source,
            target,
            waypoints,
            label: None,
        }
    }

    pub fn source(&self) -> &ElementId {
        &self.source
    }

    pub fn target(&self) -> &ElementId {
        &self.target
    }

    pub(crate) fn set_source(&mut self, source: ElementId) {
        self.source = source;
    }

    pub(crate) fn set_target(&mut self, target: ElementId) {
        self.target = target;
    }

    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }

    pub fn set_waypoints(&mut self, waypoints: Waypoints) {
        self.waypoints = waypoints;
    }

    pub fn label(&self) -> Option<&ElementId> {
        self.label.as_ref()
    }

    pub(crate) fn set_label(&mut self, label: Option<ElementId>) {
        self.label = label;
    }
}

/// An external text annotation bound to exactly one target element.
///
/// Labels are visual proxies: their text is persisted onto the target's
/// semantic object, never as a business object of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBody {
    bounds: Bounds,
    text: String,
    target: ElementId,
}

impl LabelBody {
    pub fn new(target: ElementId, bounds: Bounds, text: impl Into<String>) -> Self {
        Self {
            bounds,
            text: text.into(),
            target,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn target(&self) -> &ElementId {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementPayload {
    Shape(ShapeBody),
    Connection(ConnectionBody),
    Label(LabelBody),
}

/// One entry of the visual-graph arena. Containment is expressed through
/// `parent` plus the parent's ordered `children` list; both sides are
/// maintained by the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    payload: ElementPayload,
}

impl Element {
    pub fn shape(id: ElementId, kind: ElementKind, bounds: Bounds) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            payload: ElementPayload::Shape(ShapeBody::new(bounds)),
        }
    }

    pub fn connection(
        id: ElementId,
        kind: ElementKind,
        source: ElementId,
        target: ElementId,
        waypoints: Waypoints,
    ) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            payload: ElementPayload::Connection(ConnectionBody::new(source, target, waypoints)),
        }
    }

    pub fn new_label(
        id: ElementId,
        target: ElementId,
        bounds: Bounds,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: ElementKind::Core(CoreKind::Label),
            parent: None,
            children: Vec::new(),
            payload: ElementPayload::Label(LabelBody::new(target, bounds, text)),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&ElementId> {
        self.parent.as_ref()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ElementId>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.children
    }

    pub fn payload(&self) -> &ElementPayload {
        &self.payload
    }

    pub fn as_shape(&self) -> Option<&ShapeBody> {
        match &self.payload {
            ElementPayload::Shape(body) => Some(body),
            _ => None,
        }
    }

    pub(crate) fn as_shape_mut(&mut self) -> Option<&mut ShapeBody> {
        match &mut self.payload {
            ElementPayload::Shape(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionBody> {
        match &self.payload {
            ElementPayload::Connection(body) => Some(body),
            _ => None,
        }
    }

    pub(crate) fn as_connection_mut(&mut self) -> Option<&mut ConnectionBody> {
        match &mut self.payload {
            ElementPayload::Connection(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&LabelBody> {
        match &self.payload {
            ElementPayload::Label(body) => Some(body),
            _ => None,
        }
    }

    pub(crate) fn as_label_mut(&mut self) -> Option<&mut LabelBody> {
        match &mut self.payload {
            ElementPayload::Label(body) => Some(body),
            _ => None,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self.payload, ElementPayload::Shape(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self.payload, ElementPayload::Connection(_))
    }

    pub fn is_label(&self) -> bool {
        matches!(self.payload, ElementPayload::Label(_))
    }

    /// The external label attached to this element, if any.
    pub fn label(&self) -> Option<&ElementId> {
        match &self.payload {
            ElementPayload::Shape(body) => body.label(),
            ElementPayload::Connection(body) => body.label(),
            ElementPayload::Label(_) => None,
        }
    }

    /// Bounding box for shapes and labels; connections have none.
    pub fn bounds(&self) -> Option<Bounds> {
        match &self.payload {
            ElementPayload::Shape(body) => Some(body.bounds()),
            ElementPayload::Label(body) => Some(body.bounds()),
            ElementPayload::Connection(_) => None,
        }
    }

    pub fn position(&self) -> Option<Point> {
        self.bounds().map(Bounds::origin)
    }
}
