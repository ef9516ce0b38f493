//! Placement of the keyboard relative to the focused input.

use crate::eligible::InputKind;
use core_types::{Rect, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Layout family the placement calls for. Shift is a sub-mode of `Default`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutFamily {
    Default,
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub side: Side,
    pub layout: LayoutFamily,
}

impl Placement {
    pub const INITIAL: Placement = Placement {
        side: Side::Bottom,
        layout: LayoutFamily::Default,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputGeometry {
    /// Bounding box in viewport coordinates.
    pub rect: Rect,
    pub kind: InputKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositioningPolicy {
    pub numeric_edge_margin: f32,
}

impl PositioningPolicy {
    pub fn new(numeric_edge_margin: f32) -> Self {
        Self {
            numeric_edge_margin,
        }
    }

    /// Numeric fields get the numeric pad beside them, on the right unless that
    /// would leave less than the margin to the viewport edge. Everything else
    /// gets the full layout above inputs in the lower half, below otherwise.
    pub fn decide(&self, geometry: &InputGeometry, viewport: Viewport) -> Placement {
        let rect = geometry.rect;
        if geometry.kind.is_numeric() {
            let side = if viewport.width - rect.right() < self.numeric_edge_margin {
                Side::Left
            } else {
                Side::Right
            };
            return Placement {
                side,
                layout: LayoutFamily::Numeric,
            };
        }

        let side = if rect.top() > viewport.height / 2.0 {
            Side::Top
        } else {
            Side::Bottom
        };
        Placement {
            side,
            layout: LayoutFamily::Default,
        }
    }
}
