// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use proteus::editor::Editor;
use proteus::geometry::Bounds;
use proteus::model::{ChartKind, CoreKind, ElementId, ElementKind};
use proteus::ops::Op;

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn node_count(self) -> usize {
        match self {
            Self::Small => 8,
            Self::Medium => 64,
            Self::Large => 256,
        }
    }
}

pub fn eid(value: &str) -> ElementId {
    ElementId::new(value).expect("element id")
}

/// An editor holding a chain of generic nodes connected by dashed lines.
pub fn chain_editor(case: Case) -> Editor {
    let nodes = case.node_count();
    let mut editor = Editor::new(eid("root"), ElementKind::Core(CoreKind::Root));

    for i in 0..nodes {
        let outcome = editor
            .execute(Op::CreateShape {
                id: eid(&format!("n{i}")),
                kind: ElementKind::Chart(ChartKind::Generic),
                parent: eid("root"),
                bounds: Bounds::new((i as f64) * 160.0, 0.0, 100.0, 80.0),
            })
            .expect("create shape");
        assert!(outcome.is_applied());
    }

    for i in 0..nodes.saturating_sub(1) {
        let outcome = editor
            .execute(Op::CreateConnection {
                id: eid(&format!("e{i}")),
                kind: None,
                source: eid(&format!("n{i}")),
                target: eid(&format!("n{}", i + 1)),
                waypoints: None,
            })
            .expect("create connection");
        assert!(outcome.is_applied());
    }

    editor
}
