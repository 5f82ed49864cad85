//! Seeded random gesture sessions.
//!
//! Used by `tessel-trace demo` to produce traces, and by tests as a cheap
//! source of realistic committed-mutation streams.

use serde::Serialize;
use tessel_core::{Point, Rect, Size, View};
use tessel_layout::{
    DragOutcome, LayoutError, Orientation, PaneTree, Workspace, WorkspaceConfig,
};

use crate::determinism::Lcg;
use crate::error::Result;
use crate::gesture::GestureScript;

/// Outcome tally for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemoStats {
    pub gestures: usize,
    pub committed: usize,
    pub cancelled: usize,
    pub other: usize,
}

/// Tab stack of three views beside a notes page stacked over a status label.
pub fn build_demo(area: Rect, config: WorkspaceConfig) -> Result<Workspace> {
    let tree = PaneTree::tabbed([
        View::page(1, "Readme"),
        View::field(2, "Search"),
        View::image(3, "logo.png", Size::new(16, 6)),
    ])
    .map_err(LayoutError::from)?;
    let tabs = tree.root();
    let mut ws = Workspace::new(tree, area, config)?;
    let split = ws.split(tabs, Orientation::Horizontal, View::page(4, "Notes"), false)?;
    let notes = ws.tree().split(split).map_or(tabs, |node| node.second);
    let _ = ws.split(notes, Orientation::Vertical, View::label(5, "Status"), false)?;
    Ok(ws)
}

/// Grab points for everything currently draggable.
fn grab_points(ws: &Workspace) -> Vec<Point> {
    let layout = ws.geometry();
    let mut points: Vec<Point> = layout
        .dividers()
        .map(|(_, divider)| divider.rect.center())
        .collect();
    for (_, strip) in layout.tab_strips() {
        points.extend(strip.handles.iter().map(|handle| handle.rect.center()));
        let right = i32::from(strip.rect.right()) - 1;
        if strip.handle_at(Point::new(right, i32::from(strip.rect.y))).is_none() {
            points.push(Point::new(right, i32::from(strip.rect.y)));
        }
    }
    points.extend(layout.titles().map(|(_, title)| title.center()));
    points
}

fn random_point(rng: &mut Lcg, area: Rect) -> Point {
    Point::new(
        rng.next_i32_range(i32::from(area.x) - 2, i32::from(area.right()) + 1),
        rng.next_i32_range(i32::from(area.y) - 2, i32::from(area.bottom()) + 1),
    )
}

/// One random gesture against the current geometry.
pub fn random_gesture(ws: &Workspace, rng: &mut Lcg) -> GestureScript {
    let area = ws.geometry().area();
    let grabs = grab_points(ws);
    let start = if grabs.is_empty() || rng.chance(10) {
        random_point(rng, area)
    } else {
        grabs[rng.choose_index(grabs.len())]
    };
    let target = if rng.chance(15) {
        start
    } else {
        random_point(rng, area)
    };
    let steps = rng.next_i32_range(1, 6) as u16;
    let script = GestureScript::new()
        .hover(start)
        .press(start)
        .drag_to(target, steps);
    match rng.next_u64() % 10 {
        0 => script.cancel(),
        1 => script.capture_lost(),
        _ => script.release(),
    }
}

/// Play `gestures` random gestures.
pub fn drive(ws: &mut Workspace, rng: &mut Lcg, gestures: usize) -> DemoStats {
    let mut stats = DemoStats::default();
    for _ in 0..gestures {
        let script = random_gesture(ws, rng);
        stats.gestures += 1;
        match script.play_last(ws) {
            Some(DragOutcome::Committed(_)) => stats.committed += 1,
            Some(DragOutcome::Cancelled(_)) => stats.cancelled += 1,
            _ => stats.other += 1,
        }
    }
    tracing::debug!(
        gestures = stats.gestures,
        committed = stats.committed,
        cancelled = stats.cancelled,
        "demo.done"
    );
    stats
}
