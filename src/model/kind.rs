// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Closed element-kind vocabulary.
//!
//! Every element carries a kind qualified by a namespace token
//! (`core:Shape`, `chart:Position`, `overlay:Marker`). The namespace decides
//! which notation's rules apply; `core` kinds belong to the host editor and to
//! no notation.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Host kinds owned by the editor itself rather than a notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoreKind {
    /// The single-canvas root element.
    Root,
    /// The partitioned root the canvas can morph into.
    Board,
    Shape,
    Label,
    Wire,
}

impl CoreKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Board => "Board",
            Self::Shape => "Shape",
            Self::Label => "Label",
            Self::Wire => "Wire",
        }
    }

    pub fn is_connection(self) -> bool {
        self == Self::Wire
    }
}

/// Node categories of the chart notation. `Stage` folds into `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartCategory {
    Aggregator,
    Generic,
    Position,
    History,
    Region,
}

/// Kinds of the primary flow notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    Aggregator,
    Generic,
    Stage,
    Position,
    History,
    Region,
    AggregatedConnection,
    SolidLine,
    DashedLine,
}

impl ChartKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Aggregator => "Aggregator",
            Self::Generic => "Generic",
            Self::Stage => "Stage",
            Self::Position => "Position",
            Self::History => "History",
            Self::Region => "Region",
            Self::AggregatedConnection => "AggregatedConnection",
            Self::SolidLine => "SolidLine",
            Self::DashedLine => "DashedLine",
        }
    }

    pub fn is_connection(self) -> bool {
        matches!(
            self,
            Self::AggregatedConnection | Self::SolidLine | Self::DashedLine
        )
    }

    /// The rule category of a node kind; `None` for connection kinds.
    pub fn category(self) -> Option<ChartCategory> {
        match self {
            Self::Aggregator => Some(ChartCategory::Aggregator),
            Self::Generic | Self::Stage => Some(ChartCategory::Generic),
            Self::Position => Some(ChartCategory::Position),
            Self::History => Some(ChartCategory::History),
            Self::Region => Some(ChartCategory::Region),
            Self::AggregatedConnection | Self::SolidLine | Self::DashedLine => None,
        }
    }
}

/// Kinds of the annotation notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    Marker,
    Callout,
    Link,
    Tether,
}

impl OverlayKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Marker => "Marker",
            Self::Callout => "Callout",
            Self::Link => "Link",
            Self::Tether => "Tether",
        }
    }

    pub fn is_connection(self) -> bool {
        matches!(self, Self::Link | Self::Tether)
    }
}

/// Where an external label sits relative to its target shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Core(CoreKind),
    Chart(ChartKind),
    Overlay(OverlayKind),
}

pub const CORE_NAMESPACE: &str = "core";
pub const CHART_NAMESPACE: &str = "chart";
pub const OVERLAY_NAMESPACE: &str = "overlay";

impl ElementKind {
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Core(_) => CORE_NAMESPACE,
            Self::Chart(_) => CHART_NAMESPACE,
            Self::Overlay(_) => OVERLAY_NAMESPACE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Core(kind) => kind.name(),
            Self::Chart(kind) => kind.name(),
            Self::Overlay(kind) => kind.name(),
        }
    }

    /// The namespace token of the owning notation; `None` for host kinds.
    pub fn notation(self) -> Option<&'static str> {
        match self {
            Self::Core(_) => None,
            Self::Chart(_) => Some(CHART_NAMESPACE),
            Self::Overlay(_) => Some(OVERLAY_NAMESPACE),
        }
    }

    pub fn is_connection(self) -> bool {
        match self {
            Self::Core(kind) => kind.is_connection(),
            Self::Chart(kind) => kind.is_connection(),
            Self::Overlay(kind) => kind.is_connection(),
        }
    }

    pub fn is_label(self) -> bool {
        self == Self::Core(CoreKind::Label)
    }

    pub fn is_root(self) -> bool {
        matches!(self, Self::Core(CoreKind::Root) | Self::Core(CoreKind::Board))
    }

    /// Kinds that may hold children on the canvas.
    pub fn is_container(self) -> bool {
        self.is_root() || self == Self::Chart(ChartKind::Region)
    }

    /// Notation-owned, non-connection-endpoint-proxy kinds get one external
    /// label on first attach.
    pub fn wants_external_label(self) -> bool {
        self.notation().is_some()
    }

    /// The closed set of kinds carrying one embedded plus one external label.
    pub fn is_dual_label(self) -> bool {
        matches!(
            self,
            Self::Chart(ChartKind::Position) | Self::Chart(ChartKind::Aggregator)
        )
    }

    pub fn external_label_placement(self) -> LabelPlacement {
        match self {
            Self::Chart(ChartKind::Position) => LabelPlacement::Above,
            _ => LabelPlacement::Below,
        }
    }

    pub fn chart(self) -> Option<ChartKind> {
        match self {
            Self::Chart(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn overlay(self) -> Option<OverlayKind> {
        match self {
            Self::Overlay(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseKindError {
    MissingSeparator { value: String },
    UnknownNamespace { namespace: String },
    UnknownKind { namespace: String, name: String },
}

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator { value } => {
                write!(f, "kind '{value}' is missing the ':' separator")
            }
            Self::UnknownNamespace { namespace } => {
                write!(f, "unknown kind namespace '{namespace}'")
            }
            Self::UnknownKind { namespace, name } => {
                write!(f, "unknown kind '{name}' in namespace '{namespace}'")
            }
        }
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for ElementKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, name)) = s.split_once(':') else {
            return Err(ParseKindError::MissingSeparator {
                value: s.to_owned(),
            });
        };

        let unknown = || ParseKindError::UnknownKind {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        };

        match namespace {
            CORE_NAMESPACE => match name {
                "Root" => Ok(Self::Core(CoreKind::Root)),
                "Board" => Ok(Self::Core(CoreKind::Board)),
                "Shape" => Ok(Self::Core(CoreKind::Shape)),
                "Label" => Ok(Self::Core(CoreKind::Label)),
                "Wire" => Ok(Self::Core(CoreKind::Wire)),
                _ => Err(unknown()),
            },
            CHART_NAMESPACE => match name {
                "Aggregator" => Ok(Self::Chart(ChartKind::Aggregator)),
                "Generic" => Ok(Self::Chart(ChartKind::Generic)),
                "Stage" => Ok(Self::Chart(ChartKind::Stage)),
                "Position" => Ok(Self::Chart(ChartKind::Position)),
                "History" => Ok(Self::Chart(ChartKind::History)),
                "Region" => Ok(Self::Chart(ChartKind::Region)),
                "AggregatedConnection" => Ok(Self::Chart(ChartKind::AggregatedConnection)),
                "SolidLine" => Ok(Self::Chart(ChartKind::SolidLine)),
                "DashedLine" => Ok(Self::Chart(ChartKind::DashedLine)),
                _ => Err(unknown()),
            },
            OVERLAY_NAMESPACE => match name {
                "Marker" => Ok(Self::Overlay(OverlayKind::Marker)),
                "Callout" => Ok(Self::Overlay(OverlayKind::Callout)),
                "Link" => Ok(Self::Overlay(OverlayKind::Link)),
                "Tether" => Ok(Self::Overlay(OverlayKind::Tether)),
                _ => Err(unknown()),
            },
            _ => Err(ParseKindError::UnknownNamespace {
                namespace: namespace.to_owned(),
            }),
        }
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl Visitor<'_> for KindVisitor {
            type Value = ElementKind;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a qualified kind name like 'chart:Position'")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}
