//! Property/fuzz-style invariants for layout engine mutations.
//!
//! Random mutation streams run against the public `LayoutEngine` API. After
//! every step the tree must validate, the solved geometry must tile the root
//! exactly, and a rejected mutation must leave the engine untouched. Replaying
//! the committed stream on a fresh engine must land on the same snapshot.

use proptest::prelude::*;
use tessel_core::{Rect, View};
use tessel_layout::{
    DockEdge, LayoutEngine, LayoutMetrics, Mutation, Orientation, PaneId, PaneLayout,
    PaneNodeKind, PaneTree,
};

const AREA: Rect = Rect::new(0, 0, 160, 48);

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn next_ratio(&mut self) -> f64 {
        (self.next_u64() % 1001) as f64 / 1000.0
    }
}

fn ids_of(tree: &PaneTree, pick: fn(&PaneNodeKind) -> bool) -> Vec<PaneId> {
    tree.nodes()
        .filter(|node| pick(&node.kind))
        .map(|node| node.id)
        .collect()
}

fn random_orientation(rng: &mut Lcg) -> Orientation {
    if rng.choose_bool() {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

fn random_edge(rng: &mut Lcg) -> DockEdge {
    [DockEdge::Left, DockEdge::Right, DockEdge::Top, DockEdge::Bottom][rng.choose_index(4)]
}

fn random_view(rng: &mut Lcg, sequence: usize) -> View {
    let id = sequence as u64 + 100;
    match rng.choose_index(3) {
        0 => View::field(id, format!("field-{sequence}")),
        1 => View::label(id, format!("l{sequence}")),
        _ => View::page(id, format!("page-{sequence}")),
    }
}

/// A mutation over ids that exist; it may still be rejected (moving a pane
/// into its own subtree, removing the last pane).
fn random_mutation(tree: &PaneTree, rng: &mut Lcg, sequence: usize) -> Mutation {
    let leaves = tree.leaf_ids();
    let splits = ids_of(tree, |kind| matches!(kind, PaneNodeKind::Split(_)));
    let tabs = ids_of(tree, |kind| matches!(kind, PaneNodeKind::Tab(_)));
    let all = ids_of(tree, |_| true);

    let mut candidates = vec![0usize, 4, 6, 7];
    if !splits.is_empty() {
        candidates.push(1);
    }
    if !tabs.is_empty() {
        candidates.extend([2, 3, 5]);
    }

    match candidates[rng.choose_index(candidates.len())] {
        1 => Mutation::Resize {
            split: splits[rng.choose_index(splits.len())],
            ratio: rng.next_ratio(),
        },
        2 => {
            let tab = tabs[rng.choose_index(tabs.len())];
            let len = tree.tabs(tab).map_or(1, |tabs| tabs.children.len());
            Mutation::MoveToTab {
                source: all[rng.choose_index(all.len())],
                tab,
                index: rng.choose_index(len + 1),
            }
        }
        3 => {
            let tab = tabs[rng.choose_index(tabs.len())];
            let len = tree.tabs(tab).map_or(1, |tabs| tabs.children.len());
            Mutation::ReorderTab {
                tab,
                from: rng.choose_index(len),
                to: rng.choose_index(len),
            }
        }
        4 => Mutation::RemoveLeaf {
            leaf: leaves[rng.choose_index(leaves.len())],
        },
        5 => {
            let tab = tabs[rng.choose_index(tabs.len())];
            let len = tree.tabs(tab).map_or(1, |tabs| tabs.children.len());
            Mutation::SetActiveTab {
                tab,
                index: rng.choose_index(len),
            }
        }
        6 => Mutation::Dock {
            source: all[rng.choose_index(all.len())],
            target: all[rng.choose_index(all.len())],
            edge: random_edge(rng),
        },
        7 => Mutation::Stack {
            source: all[rng.choose_index(all.len())],
            target: all[rng.choose_index(all.len())],
        },
        _ => Mutation::Split {
            target: all[rng.choose_index(all.len())],
            orientation: random_orientation(rng),
            view: random_view(rng, sequence),
            insert_before: rng.choose_bool(),
        },
    }
}

fn assert_tiles_root(tree: &PaneTree, layout: &PaneLayout) {
    let mut pieces = Vec::new();
    for leaf in tree.leaf_ids() {
        let rect = layout.rect(leaf).expect("every leaf has a rect");
        if !rect.is_empty() {
            pieces.push(rect);
        }
    }
    pieces.extend(layout.dividers().map(|(_, divider)| divider.rect));
    pieces.extend(layout.tab_strips().map(|(_, strip)| strip.rect));
    pieces.retain(|rect| !rect.is_empty());

    let area = layout.area();
    let covered: u32 = pieces.iter().map(Rect::area).sum();
    assert_eq!(covered, area.area(), "pieces must cover the root exactly");
    for (index, rect) in pieces.iter().enumerate() {
        assert!(rect.x >= area.x && rect.right() <= area.right());
        assert!(rect.y >= area.y && rect.bottom() <= area.bottom());
        for other in &pieces[index + 1..] {
            assert!(
                rect.intersection_opt(other).is_none(),
                "{rect:?} overlaps {other:?}"
            );
        }
    }
}

fn assert_engine_invariants(engine: &LayoutEngine) {
    engine
        .tree()
        .validate()
        .expect("tree should remain structurally valid");
    let report = engine.tree().invariant_report();
    assert!(report.is_clean(), "invariant issues: {:?}", report.issues);
    assert_tiles_root(engine.tree(), engine.layout());
}

fn fresh_engine() -> LayoutEngine {
    LayoutEngine::new(
        PaneTree::singleton(View::page(1, "root")),
        AREA,
        LayoutMetrics::default(),
    )
    .expect("singleton engine")
}

fn run_sequence(seed: u64, steps: usize) -> (LayoutEngine, Vec<Mutation>) {
    let mut engine = fresh_engine();
    let mut rng = Lcg::new(seed);
    let mut committed = Vec::with_capacity(steps);

    for step in 0..steps {
        let mutation = random_mutation(engine.tree(), &mut rng, step);
        let before = engine.snapshot();
        let before_layout = engine.layout().clone();
        match engine.apply(&mutation) {
            Ok(outcome) => committed.push(outcome.mutation),
            Err(_) => {
                assert_eq!(engine.snapshot(), before, "rejected {mutation:?} leaked");
                assert_eq!(engine.layout(), &before_layout);
            }
        }
        assert_engine_invariants(&engine);
    }

    (engine, committed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_mutation_streams_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..120,
    ) {
        let (engine, _) = run_sequence(seed, steps);
        assert_engine_invariants(&engine);
    }

    #[test]
    fn committed_streams_replay_to_the_same_snapshot(
        seed in any::<u64>(),
        steps in 20usize..80,
    ) {
        let (engine, committed) = run_sequence(seed, steps);

        let mut replay = fresh_engine();
        for mutation in &committed {
            replay
                .apply(mutation)
                .expect("committed mutation should replay");
        }

        prop_assert_eq!(replay.tree().state_hash(), engine.tree().state_hash());
        prop_assert_eq!(replay.snapshot(), engine.snapshot());
    }

    #[test]
    fn snapshots_survive_json(seed in any::<u64>()) {
        let (engine, _) = run_sequence(seed, 40);
        let json = serde_json::to_string(&engine.snapshot()).expect("serialize");
        let restored = LayoutEngine::from_snapshot(
            serde_json::from_str(&json).expect("deserialize"),
            AREA,
            LayoutMetrics::default(),
        )
        .expect("restore");
        prop_assert_eq!(restored.layout(), engine.layout());
    }
}

#[test]
fn seed_corpus_preserves_invariants() {
    let seeds = [
        0_u64,
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        u32::MAX as u64,
        (u32::MAX as u64) + 1,
        u64::MAX - 1,
        u64::MAX,
    ];

    for seed in seeds {
        let (engine, _) = run_sequence(seed, 180);
        assert_engine_invariants(&engine);
    }
}

#[test]
fn tiny_areas_still_tile() {
    let (mut engine, _) = run_sequence(7, 60);
    for (width, height) in [(0, 0), (1, 1), (3, 2), (9, 4)] {
        engine
            .set_area(Rect::new(2, 1, width, height))
            .expect("resolve");
        assert_tiles_root(engine.tree(), engine.layout());
    }
}
