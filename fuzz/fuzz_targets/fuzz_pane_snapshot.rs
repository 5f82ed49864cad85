#![no_main]

use libfuzzer_sys::fuzz_target;
use tessel_core::Rect;
use tessel_layout::{LayoutMetrics, PaneTree, PaneTreeSnapshot, compute_geometry};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let area = Rect::from_size(u16::from(data[0]), u16::from(data[1]));
    let Ok(snapshot) = serde_json::from_slice::<PaneTreeSnapshot>(&data[2..]) else {
        return;
    };
    // Decoding must reject anything that would not validate.
    let Ok(tree) = PaneTree::from_snapshot(snapshot) else {
        return;
    };
    tree.validate().expect("accepted snapshot validates");
    let layout = compute_geometry(&tree, area, &LayoutMetrics::default())
        .expect("valid tree always lays out");
    for id in tree.leaf_ids() {
        let rect = layout.rect(id).expect("every leaf has a rect");
        assert!(rect.right() <= area.right() && rect.bottom() <= area.bottom());
    }
});
