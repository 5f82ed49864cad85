//! Scripted pointer gestures.
//!
//! A [`GestureScript`] is a mock pointer device: build the event sequence
//! once, then play it against any workspace.

use tessel_core::{Point, PointerEvent, Rect};
use tessel_layout::{DragOutcome, Workspace};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureScript {
    events: Vec<PointerEvent>,
    cursor: Point,
}

impl GestureScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move without a button held (hover).
    #[must_use]
    pub fn hover(mut self, point: Point) -> Self {
        self.cursor = point;
        self.events.push(PointerEvent::Move(point));
        self
    }

    #[must_use]
    pub fn press(mut self, point: Point) -> Self {
        self.cursor = point;
        self.events.push(PointerEvent::Down(point));
        self
    }

    /// Move to `point` in `steps` evenly spaced events (at least one).
    #[must_use]
    pub fn drag_to(mut self, point: Point, steps: u16) -> Self {
        let steps = i32::from(steps.max(1));
        let (dx, dy) = point.delta_from(self.cursor);
        let start = self.cursor;
        for step in 1..=steps {
            let next = Point::new(start.x + dx * step / steps, start.y + dy * step / steps);
            self.events.push(PointerEvent::Move(next));
        }
        self.cursor = point;
        self
    }

    /// Release at the current position.
    #[must_use]
    pub fn release(mut self) -> Self {
        self.events.push(PointerEvent::Up(self.cursor));
        self
    }

    #[must_use]
    pub fn cancel(mut self) -> Self {
        self.events.push(PointerEvent::Cancel);
        self
    }

    #[must_use]
    pub fn capture_lost(mut self) -> Self {
        self.events.push(PointerEvent::CaptureLost);
        self
    }

    /// Press at the centre of `from`, drag to `to`, release.
    #[must_use]
    pub fn drag_between(from: Rect, to: Point, steps: u16) -> Self {
        Self::new().press(from.center()).drag_to(to, steps).release()
    }

    #[must_use]
    pub fn events(&self) -> &[PointerEvent] {
        &self.events
    }

    /// Feed every event to `workspace`, returning each outcome.
    pub fn play(&self, workspace: &mut Workspace) -> Vec<DragOutcome> {
        self.events
            .iter()
            .map(|event| workspace.handle_pointer(*event))
            .collect()
    }

    /// Outcome of the last event, the one that usually ends the gesture.
    pub fn play_last(&self, workspace: &mut Workspace) -> Option<DragOutcome> {
        self.play(workspace).pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_interpolates_to_the_exact_target() {
        let script = GestureScript::new()
            .press(Point::new(0, 0))
            .drag_to(Point::new(10, -5), 5)
            .release();
        let events = script.events();
        assert_eq!(events.len(), 7);
        assert_eq!(events[1], PointerEvent::Move(Point::new(2, -1)));
        assert_eq!(events[5], PointerEvent::Move(Point::new(10, -5)));
        assert_eq!(events[6], PointerEvent::Up(Point::new(10, -5)));
    }

    #[test]
    fn zero_steps_still_moves_once() {
        let script = GestureScript::new()
            .press(Point::new(3, 3))
            .drag_to(Point::new(4, 3), 0);
        assert_eq!(script.events().len(), 2);
    }
}
