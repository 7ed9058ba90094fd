//! Viewport geometry for the floating trigger and the expanded panel.
//!
//! All positions are offsets in logical pixels from the viewport's
//! bottom-right corner, the same anchoring the trigger is rendered with.
//! Every function here is total: inputs are clamped, nothing fails.

pub mod drag;

use serde::{Deserialize, Serialize};

/// Gap between the trigger's anchor and the panel when the panel opens.
pub const PANEL_GAP: f64 = 10.0;

/// Minimum distance kept from the viewport edge when the panel is centred.
pub const EDGE_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub right: f64,
    pub bottom: f64,
}

impl Position {
    pub const fn new(right: f64, bottom: f64) -> Self {
        Self { right, bottom }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(20.0, 20.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The visible area the widget lives in.
pub type Viewport = Size;

/// Largest offset that still keeps an element of `element` extent inside
/// `viewport` extent. Never negative.
fn max_offset(viewport: f64, element: f64) -> f64 {
    (viewport - element).max(0.0)
}

fn clamp_axis(offset: f64, element: f64, viewport: f64) -> f64 {
    offset.max(0.0).min(max_offset(viewport, element))
}

/// Clamps `position` so an element of `element` size stays fully inside
/// `viewport`.
pub fn clamp_to_viewport(position: Position, element: Size, viewport: Viewport) -> Position {
    Position {
        right: clamp_axis(position.right, element.width, viewport.width),
        bottom: clamp_axis(position.bottom, element.height, viewport.height),
    }
}

/// One axis of the panel placement. `offset` is the trigger's distance
/// from the anchoring edge.
fn place_axis(offset: f64, trigger: f64, panel: f64, viewport: f64) -> f64 {
    let placed = if offset + trigger + panel <= viewport {
        // room to grow away from the edge
        offset + PANEL_GAP
    } else if offset >= panel {
        // pull back towards the edge
        offset + PANEL_GAP - panel
    } else {
        ((viewport - panel) / 2.0)
            .min(viewport - panel - EDGE_MARGIN)
            .max(EDGE_MARGIN)
    };
    clamp_axis(placed, panel, viewport)
}

/// Computes where the panel opens relative to the trigger.
///
/// Horizontal and vertical axes are solved independently. The result is
/// always inside `[0, viewport - panel]` on both axes; when the panel is
/// larger than the viewport the offset collapses to 0.
pub fn place_panel(trigger: Position, trigger_size: Size, panel: Size, viewport: Viewport) -> Position {
    Position {
        right: place_axis(trigger.right, trigger_size.width, panel.width, viewport.width),
        bottom: place_axis(trigger.bottom, trigger_size.height, panel.height, viewport.height),
    }
}
