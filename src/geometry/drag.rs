use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{clamp_to_viewport, Position, Size, Viewport};

/// A gesture that moved less than this (in px) may still be a click.
pub const CLICK_MAX_DISTANCE: f64 = 5.0;

/// A gesture that lasted at least this long is never a click.
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: &PointerPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    Click,
    Drag,
}

/// State of a single pointer-down → pointer-up sequence on the trigger.
/// Created on pointer-down and consumed by [`DragGesture::finish`].
#[derive(Debug, Clone)]
pub struct DragGesture {
    start_pointer: PointerPoint,
    start_offsets: Position,
    started_at: Instant,
    max_displacement: f64,
}

impl DragGesture {
    pub fn begin(pointer: PointerPoint, offsets: Position, at: Instant) -> Self {
        Self {
            start_pointer: pointer,
            start_offsets: offsets,
            started_at: at,
            max_displacement: 0.0,
        }
    }

    pub fn start_offsets(&self) -> Position {
        self.start_offsets
    }

    /// Offsets for the element with the pointer at `pointer`.
    ///
    /// Offsets grow towards the top-left, so a pointer moving right/down by
    /// `(dx, dy)` reduces `right`/`bottom` by the same amount before clamping.
    pub fn track(&mut self, pointer: PointerPoint, element: Size, viewport: Viewport) -> Position {
        self.max_displacement = self.max_displacement.max(self.start_pointer.distance_to(&pointer));
        let dx = pointer.x - self.start_pointer.x;
        let dy = pointer.y - self.start_pointer.y;
        clamp_to_viewport(
            Position::new(self.start_offsets.right - dx, self.start_offsets.bottom - dy),
            element,
            viewport,
        )
    }

    /// Ends the gesture and decides whether it was a click or a drag.
    pub fn finish(mut self, pointer: PointerPoint, at: Instant) -> GestureKind {
        self.max_displacement = self.max_displacement.max(self.start_pointer.distance_to(&pointer));
        let elapsed = at.saturating_duration_since(self.started_at);
        if self.max_displacement < CLICK_MAX_DISTANCE && elapsed < CLICK_MAX_DURATION {
            GestureKind::Click
        } else {
            GestureKind::Drag
        }
    }
}
