// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The flat, insertion-ordered registry of notation-owned business objects.
//!
//! The registry is owned and exclusively mutated by the sync engine; readers
//! get it by reference. Membership tracks attachment: an object is added when
//! it attaches to any parent and removed when it detaches.

use serde::Serialize;

use crate::model::{ElementId, ElementKind};

use super::{SemanticObject, SemanticTree};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Registry {
    order: Vec<ElementId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.order.iter().any(|member| member == id)
    }

    /// Adds `id` unless present. Returns whether it was added.
    pub(crate) fn ensure(&mut self, id: &ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.order.push(id.clone());
        true
    }

    /// Removes `id` if present. Returns whether it was removed.
    pub(crate) fn remove(&mut self, id: &ElementId) -> bool {
        let before = self.order.len();
        self.order.retain(|member| member != id);
        self.order.len() != before
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.order.iter()
    }

    /// Finds a registered connection object with the exact
    /// (kind, source, target) triple, skipping `excluding`.
    pub fn find_connection(
        &self,
        tree: &SemanticTree,
        kind: ElementKind,
        source: &ElementId,
        target: &ElementId,
        excluding: &ElementId,
    ) -> Option<ElementId> {
        self.order
            .iter()
            .filter(|member| *member != excluding)
            .find(|member| {
                tree.get(member).is_some_and(|object| {
                    object.kind() == kind
                        && object.source() == Some(source)
                        && object.target() == Some(target)
                })
            })
            .cloned()
    }

    /// Snapshot of the registry in registration order, for export.
    pub fn export(&self, tree: &SemanticTree) -> ExportDocument {
        let objects = self
            .order
            .iter()
            .filter_map(|id| tree.get(id))
            .cloned()
            .collect();
        ExportDocument { objects }
    }
}

/// Serializable view of every registered business object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    objects: Vec<SemanticObject>,
}

impl ExportDocument {
    pub fn objects(&self) -> &[SemanticObject] {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ChartKind, ElementId, ElementKind};
    use crate::semantic::{SemanticObject, SemanticTree};

    use super::Registry;

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    #[test]
    fn ensure_is_idempotent_and_preserves_order() {
        let mut registry = Registry::new();
        assert!(registry.ensure(&eid("b")));
        assert!(registry.ensure(&eid("a")));
        assert!(!registry.ensure(&eid("b")));

        let order: Vec<_> = registry.iter().cloned().collect();
        assert_eq!(order, vec![eid("b"), eid("a")]);
    }

    #[test]
    fn find_connection_matches_the_exact_triple_only() {
        let mut tree = SemanticTree::new();
        let mut conn = SemanticObject::new(eid("e1"), ElementKind::Chart(ChartKind::SolidLine));
        conn.set_endpoints(eid("pos"), eid("hist"));
        tree.insert(conn);

        let mut registry = Registry::new();
        registry.ensure(&eid("e1"));

        assert_eq!(
            registry.find_connection(
                &tree,
                ElementKind::Chart(ChartKind::SolidLine),
                &eid("pos"),
                &eid("hist"),
                &eid("e2"),
            ),
            Some(eid("e1"))
        );
        // Same pair, different kind: no match.
        assert_eq!(
            registry.find_connection(
                &tree,
                ElementKind::Chart(ChartKind::DashedLine),
                &eid("pos"),
                &eid("hist"),
                &eid("e2"),
            ),
            None
        );
        // The element itself is excluded, so replays do not see themselves.
        assert_eq!(
            registry.find_connection(
                &tree,
                ElementKind::Chart(ChartKind::SolidLine),
                &eid("pos"),
                &eid("hist"),
                &eid("e1"),
            ),
            None
        );
    }

    #[test]
    fn export_serializes_in_registration_order() {
        let mut tree = SemanticTree::new();
        tree.insert(SemanticObject::new(
            eid("z"),
            ElementKind::Chart(ChartKind::Generic),
        ));
        tree.insert(SemanticObject::new(
            eid("a"),
            ElementKind::Chart(ChartKind::Generic),
        ));

        let mut registry = Registry::new();
        registry.ensure(&eid("z"));
        registry.ensure(&eid("a"));

        let document = registry.export(&tree);
        let ids: Vec<_> = document
            .objects()
            .iter()
            .map(|object| object.id().clone())
            .collect();
        assert_eq!(ids, vec![eid("z"), eid("a")]);

        let json = serde_json::to_value(&document).expect("serialize");
        assert_eq!(json["objects"][0]["id"], "z");
        assert_eq!(json["objects"][0]["kind"], "chart:Generic");
    }
}
