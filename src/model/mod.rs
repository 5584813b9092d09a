// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Visual-graph data model.
//!
//! Elements live in an id-keyed arena with explicit parent references; kinds
//! form a closed, namespaced vocabulary shared by the rule dispatcher and the
//! sync engine.

pub mod element;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod kind;

pub use element::{ConnectionBody, Element, ElementPayload, LabelBody, ShapeBody};
pub use graph::{Graph, GraphError};
pub use ids::{ElementId, Id, IdError, NotationId};
pub use kind::{
    ChartCategory, ChartKind, CoreKind, ElementKind, LabelPlacement, OverlayKind, ParseKindError,
    CHART_NAMESPACE, CORE_NAMESPACE, OVERLAY_NAMESPACE,
};
