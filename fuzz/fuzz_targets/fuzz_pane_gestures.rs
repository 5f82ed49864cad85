#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessel_core::{Point, PointerEvent, Rect, View};
use tessel_layout::{Orientation, PaneTree, Workspace, WorkspaceConfig};

#[derive(Debug, Arbitrary)]
enum Step {
    Down(i8, i8),
    Move(i8, i8),
    Up(i8, i8),
    Cancel,
    CaptureLost,
    /// Programmatic edit while a gesture may be in flight.
    Remove(u8),
    Split(u8, bool),
}

#[derive(Debug, Arbitrary)]
struct Input {
    width: u8,
    height: u8,
    steps: Vec<Step>,
}

fn point(x: i8, y: i8) -> Point {
    Point::new(i32::from(x), i32::from(y))
}

fuzz_target!(|input: Input| {
    let area = Rect::from_size(u16::from(input.width % 120), u16::from(input.height % 60));
    let Ok(tree) = PaneTree::tabbed([View::page(1, "a"), View::field(2, "b"), View::label(3, "c")])
    else {
        return;
    };
    let tabs = tree.root();
    let Ok(mut ws) = Workspace::new(tree, area, WorkspaceConfig::default()) else {
        return;
    };
    let _ = ws.split(tabs, Orientation::Horizontal, View::page(4, "d"), false);

    let mut next_view = 10;
    for step in input.steps.into_iter().take(256) {
        let before = ws.tree_snapshot();
        let event = match step {
            Step::Down(x, y) => PointerEvent::Down(point(x, y)),
            Step::Move(x, y) => PointerEvent::Move(point(x, y)),
            Step::Up(x, y) => PointerEvent::Up(point(x, y)),
            Step::Cancel => PointerEvent::Cancel,
            Step::CaptureLost => PointerEvent::CaptureLost,
            Step::Remove(n) => {
                let leaves = ws.tree().leaf_ids();
                let _ = ws.remove_leaf(leaves[usize::from(n) % leaves.len()]);
                continue;
            }
            Step::Split(n, vertical) => {
                let leaves = ws.tree().leaf_ids();
                let orientation = if vertical {
                    Orientation::Vertical
                } else {
                    Orientation::Horizontal
                };
                next_view += 1;
                let _ = ws.split(
                    leaves[usize::from(n) % leaves.len()],
                    orientation,
                    View::label(next_view, "x"),
                    false,
                );
                continue;
            }
        };

        let _ = ws.handle_pointer(event);
        if !matches!(event, PointerEvent::Up(_)) {
            assert_eq!(ws.tree_snapshot(), before, "only a release may mutate the tree");
        }
        ws.tree().validate().expect("tree stays valid");
        for command in ws.render() {
            assert!(!command.rect.is_empty());
        }
        let _ = ws.drag_preview();
    }
});
