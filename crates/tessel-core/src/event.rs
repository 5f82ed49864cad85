#![forbid(unsafe_code)]

//! Host-agnostic pointer input.
//!
//! Host adapters translate raw mouse/touch input into these events and deliver
//! them one at a time, in arrival order. Only one pointer stream is modelled.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// One abstract pointer event consumed by the drag controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Explicit cancel (escape key or an interrupt-equivalent).
    Cancel,
    /// The host lost pointer capture (window blur, capture stolen).
    CaptureLost,
}

impl PointerEvent {
    /// Position carried by the event, if any.
    #[must_use]
    pub const fn position(&self) -> Option<Point> {
        match self {
            Self::Down(point) | Self::Move(point) | Self::Up(point) => Some(*point),
            Self::Cancel | Self::CaptureLost => None,
        }
    }
}
