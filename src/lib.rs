// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus — connection-rule evaluation and semantic-model sync for
//! multi-notation diagram editing.
//!
//! The crate keeps a semantic object tree and a flat export registry
//! consistent with a freely-mutable visual graph across create, move, resize,
//! reconnect, replace, delete, and undo/redo, while independently-typed
//! notations share one graph without crossing each other's rules.

pub mod editor;
pub mod geometry;
pub mod interact;
pub mod model;
pub mod ops;
pub mod rules;
pub mod semantic;
pub mod sync;
