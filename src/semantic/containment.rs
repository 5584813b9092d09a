// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Containment maintenance for the semantic tree.
//!
//! Attach/detach keep invariant: a parent's collection contains a member iff
//! the member's parent pointer names that parent. Collections are created
//! lazily the first time something files into them.

use std::fmt;

use crate::model::ElementId;

use super::{ChildRole, SemanticTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainmentError {
    UnknownParent(ElementId),
    UnknownChild(ElementId),
}

impl fmt::Display for ContainmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParent(id) => write!(f, "semantic parent '{id}' does not exist"),
            Self::UnknownChild(id) => write!(f, "semantic object '{id}' does not exist"),
        }
    }
}

impl std::error::Error for ContainmentError {}

/// Materializes the `role` collection on `parent` if it was never created.
pub fn ensure_collection(
    tree: &mut SemanticTree,
    parent: &ElementId,
    role: ChildRole,
) -> Result<(), ContainmentError> {
    let object = tree
        .get_mut(parent)
        .ok_or_else(|| ContainmentError::UnknownParent(parent.clone()))?;
    let collection = object.collection_mut(role);
    if collection.is_none() {
        *collection = Some(Vec::new());
    }
    Ok(())
}

/// Files `child` into `parent`'s `role` collection, migrating it out of any
/// previous parent or role first. Calling this again with the same arguments
/// is a no-op.
pub fn attach(
    tree: &mut SemanticTree,
    parent: &ElementId,
    role: ChildRole,
    child: &ElementId,
) -> Result<(), ContainmentError> {
    if !tree.contains(child) {
        return Err(ContainmentError::UnknownChild(child.clone()));
    }
    if !tree.contains(parent) {
        return Err(ContainmentError::UnknownParent(parent.clone()));
    }

    let previous_parent = tree
        .get(child)
        .expect("child existence checked above")
        .parent()
        .cloned();

    if let Some(previous) = &previous_parent {
        let same_home = previous == parent
            && tree
                .get(previous)
                .and_then(|object| object.role_of(child))
                == Some(role);
        if same_home {
            return Ok(());
        }
        remove_membership(tree, previous, child);
    }

    ensure_collection(tree, parent, role)?;
    let members = tree
        .get_mut(parent)
        .expect("parent existence checked above")
        .collection_mut(role)
        .as_mut()
        .expect("collection ensured above");
    if !members.iter().any(|member| member == child) {
        members.push(child.clone());
    }

    tree.get_mut(child)
        .expect("child existence checked above")
        .set_parent(Some(parent.clone()));
    Ok(())
}

/// Unfiles `child` from its parent's collections and clears its parent
/// pointer. Safe to call when the child is already detached.
pub fn detach(tree: &mut SemanticTree, child: &ElementId) {
    let Some(parent) = tree.get(child).and_then(|object| object.parent().cloned()) else {
        return;
    };
    remove_membership(tree, &parent, child);
    if let Some(object) = tree.get_mut(child) {
        object.set_parent(None);
    }
}

fn remove_membership(tree: &mut SemanticTree, parent: &ElementId, child: &ElementId) {
    let Some(object) = tree.get_mut(parent) else {
        return;
    };
    for role in [ChildRole::Flow, ChildRole::Artifact, ChildRole::Generic] {
        if let Some(members) = object.collection_mut(role).as_mut() {
            members.retain(|member| member != child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ChartKind, CoreKind, ElementId, ElementKind};
    use crate::semantic::{ChildRole, SemanticObject, SemanticTree};

    use super::{attach, detach, ensure_collection, ContainmentError};

    fn eid(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    fn tree_with_root() -> SemanticTree {
        let mut tree = SemanticTree::new();
        tree.insert(SemanticObject::new(
            eid("root"),
            ElementKind::Core(CoreKind::Root),
        ));
        tree
    }

    #[test]
    fn ensure_collection_materializes_missing_arrays_once() {
        let mut tree = tree_with_root();
        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            None
        );

        ensure_collection(&mut tree, &eid("root"), ChildRole::Flow).expect("ensure");
        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            Some(&[][..])
        );

        // A second ensure never resets an existing collection.
        tree.get_mut(&eid("root"))
            .expect("root")
            .collection_mut(ChildRole::Flow)
            .as_mut()
            .expect("collection")
            .push(eid("a"));
        ensure_collection(&mut tree, &eid("root"), ChildRole::Flow).expect("ensure again");
        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            Some(&[eid("a")][..])
        );
    }

    #[test]
    fn attach_is_idempotent() {
        let mut tree = tree_with_root();
        tree.insert(SemanticObject::new(
            eid("a"),
            ElementKind::Chart(ChartKind::Generic),
        ));

        attach(&mut tree, &eid("root"), ChildRole::Flow, &eid("a")).expect("attach");
        attach(&mut tree, &eid("root"), ChildRole::Flow, &eid("a")).expect("attach again");

        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            Some(&[eid("a")][..])
        );
        assert!(tree.is_consistent());
    }

    #[test]
    fn attach_migrates_between_parents() {
        let mut tree = tree_with_root();
        tree.insert(SemanticObject::new(
            eid("region"),
            ElementKind::Chart(ChartKind::Region),
        ));
        tree.insert(SemanticObject::new(
            eid("a"),
            ElementKind::Chart(ChartKind::Generic),
        ));

        attach(&mut tree, &eid("root"), ChildRole::Flow, &eid("a")).expect("attach to root");
        attach(&mut tree, &eid("region"), ChildRole::Flow, &eid("a")).expect("attach to region");

        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            Some(&[][..])
        );
        assert_eq!(
            tree.get(&eid("region"))
                .expect("region")
                .children(ChildRole::Flow),
            Some(&[eid("a")][..])
        );
        assert_eq!(
            tree.get(&eid("a")).expect("a").parent(),
            Some(&eid("region"))
        );
        assert!(tree.is_consistent());
    }

    #[test]
    fn attach_requires_both_objects() {
        let mut tree = tree_with_root();
        assert_eq!(
            attach(&mut tree, &eid("root"), ChildRole::Flow, &eid("ghost")),
            Err(ContainmentError::UnknownChild(eid("ghost")))
        );

        tree.insert(SemanticObject::new(
            eid("a"),
            ElementKind::Chart(ChartKind::Generic),
        ));
        assert_eq!(
            attach(&mut tree, &eid("ghost"), ChildRole::Flow, &eid("a")),
            Err(ContainmentError::UnknownParent(eid("ghost")))
        );
    }

    #[test]
    fn detach_clears_both_sides_and_tolerates_repeats() {
        let mut tree = tree_with_root();
        tree.insert(SemanticObject::new(
            eid("a"),
            ElementKind::Chart(ChartKind::Generic),
        ));
        attach(&mut tree, &eid("root"), ChildRole::Flow, &eid("a")).expect("attach");

        detach(&mut tree, &eid("a"));
        detach(&mut tree, &eid("a"));

        assert_eq!(
            tree.get(&eid("root")).expect("root").children(ChildRole::Flow),
            Some(&[][..])
        );
        assert_eq!(tree.get(&eid("a")).expect("a").parent(), None);
        assert!(tree.is_consistent());
    }
}
