// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Plain 2D geometry for shapes, waypoints, and synthesized routes.
//!
//! Route synthesis is deliberately dumb: auto-created connections get a sane
//! straight, L-shaped, or Z-shaped path between bounding-box anchors without
//! invoking a routing algorithm.

use serde::Serialize;
use smallvec::SmallVec;

/// Ordered waypoint list of a connection.
pub type Waypoints = SmallVec<[Point; 4]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn width(self) -> f64 {
        self.width
    }

    pub fn height(self) -> f64 {
        self.height
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top(self) -> f64 {
        self.y
    }

    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn with_origin(self, origin: Point) -> Self {
        Self::new(origin.x(), origin.y(), self.width, self.height)
    }
}

/// Drops malformed (non-finite) waypoints. The result may be shorter than the
/// input; callers needing a drawable route must fall back to a synthesized one
/// when fewer than two points survive.
pub fn sanitize_waypoints(points: &[Point]) -> Waypoints {
    points.iter().copied().filter(|p| p.is_finite()).collect()
}

/// Straight center-to-center route.
pub fn straight_route(source: Bounds, target: Bounds) -> Waypoints {
    let mut route = Waypoints::new();
    route.push(source.center());
    route.push(target.center());
    route
}

/// Two-segment route: horizontal from the source center, then vertical into
/// the target center.
pub fn l_route(source: Bounds, target: Bounds) -> Waypoints {
    let from = source.center();
    let to = target.center();
    let mut route = Waypoints::new();
    route.push(from);
    route.push(Point::new(to.x(), from.y()));
    route.push(to);
    route
}

/// Three-segment route bending twice at the horizontal midpoint between the
/// two centers.
pub fn z_route(source: Bounds, target: Bounds) -> Waypoints {
    let from = source.center();
    let to = target.center();
    let mid_x = (from.x() + to.x()) / 2.0;
    let mut route = Waypoints::new();
    route.push(from);
    route.push(Point::new(mid_x, from.y()));
    route.push(Point::new(mid_x, to.y()));
    route.push(to);
    route
}

/// Anchor (top-left corner) for an external label below or above a shape,
/// horizontally centered on it.
pub fn shape_label_anchor(
    target: Bounds,
    above: bool,
    margin: f64,
    label_width: f64,
    label_height: f64,
) -> Point {
    let x = target.center().x() - label_width / 2.0;
    let y = if above {
        target.top() - margin - label_height
    } else {
        target.bottom() + margin
    };
    Point::new(x, y)
}

/// Anchor (top-left corner) for a connection label: the midpoint of the middle
/// waypoint segment, pushed out perpendicular to it by `margin`.
///
/// Degenerate inputs (fewer than two points, zero-length segment) fall back to
/// an offset straight above the first available point.
pub fn connection_label_anchor(
    waypoints: &[Point],
    margin: f64,
    label_width: f64,
    label_height: f64,
) -> Point {
    let centered = |anchor: Point| {
        Point::new(anchor.x() - label_width / 2.0, anchor.y() - label_height / 2.0)
    };

    if waypoints.len() < 2 {
        let base = waypoints.first().copied().unwrap_or(Point::new(0.0, 0.0));
        return centered(base.translated(0.0, -margin));
    }

    let seg = (waypoints.len() - 1) / 2;
    let a = waypoints[seg];
    let b = waypoints[seg + 1];
    let mid = Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0);

    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return centered(mid.translated(0.0, -margin));
    }

    // Rotate the segment direction by a quarter turn to get the offset.
    let off_x = -dy / len * margin;
    let off_y = dx / len * margin;
    centered(mid.translated(off_x, off_y))
}
