//! Canonical pane tree schema and validation.
//!
//! The tree is an arena of [`PaneNodeRecord`]s keyed by [`PaneId`]. Parent
//! relations are a non-owning index (`parent` on each record) kept in sync by
//! every mutation; ownership flows strictly root → children. This module
//! focuses on:
//!
//! - Deterministic node identifiers suitable for replay/diff.
//! - Three node kinds: leaves (own one [`View`]), binary splits, tab stacks.
//! - Canonical serialization snapshots with a host-owned extension bag.
//! - Strict validation that rejects malformed trees.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tessel_core::geometry::{Rect, Size};
use tessel_core::view::{View, ViewId};
use thiserror::Error;

/// Current pane tree schema version.
pub const PANE_TREE_SCHEMA_VERSION: u16 = 1;

/// Stable identifier for pane nodes.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PaneId(u64);

impl PaneId {
    /// Lowest valid pane ID.
    pub const MIN: Self = Self(1);

    /// Create a new pane ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, PaneModelError> {
        if raw == 0 {
            return Err(PaneModelError::ZeroPaneId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, PaneModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(PaneModelError::PaneIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for PaneId {
    type Error = PaneModelError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PaneId> for u64 {
    fn from(id: PaneId) -> Self {
        id.0
    }
}

/// Orientation of a split node.
///
/// `Horizontal` lays children out left → right (the split axis is x);
/// `Vertical` stacks them top → bottom (the split axis is y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Extent of `rect` along this axis.
    #[must_use]
    pub const fn extent(self, rect: Rect) -> u16 {
        match self {
            Self::Horizontal => rect.width,
            Self::Vertical => rect.height,
        }
    }

    /// Component of `size` along this axis.
    #[must_use]
    pub const fn size_along(self, size: Size) -> u16 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Pointer delta along this axis.
    #[must_use]
    pub const fn delta_along(self, delta: (i32, i32)) -> i32 {
        match self {
            Self::Horizontal => delta.0,
            Self::Vertical => delta.1,
        }
    }
}

/// Side of a pane a detached pane can be docked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl DockEdge {
    /// Orientation of the split created by docking on this edge.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Horizontal,
            Self::Top | Self::Bottom => Orientation::Vertical,
        }
    }

    /// Whether the docked pane becomes the split's first child.
    #[must_use]
    pub const fn is_leading(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    /// Leading edge for a split axis.
    #[must_use]
    pub const fn leading(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::Left,
            Orientation::Vertical => Self::Top,
        }
    }
}

/// Fraction of a split's extent given to its first child.
///
/// Always finite and strictly inside `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SplitRatio(f64);

impl SplitRatio {
    /// Even split.
    pub const HALF: Self = Self(0.5);

    /// Validate a ratio.
    pub fn new(value: f64) -> Result<Self, PaneModelError> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(PaneModelError::InvalidSplitRatio { value });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::HALF
    }
}

impl TryFrom<f64> for SplitRatio {
    type Error = PaneModelError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SplitRatio> for f64 {
    fn from(ratio: SplitRatio) -> Self {
        ratio.0
    }
}

/// Leaf payload: exclusive owner of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneLeaf {
    pub view: View,
}

/// Split payload with child references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSplit {
    pub orientation: Orientation,
    pub ratio: SplitRatio,
    pub first: PaneId,
    pub second: PaneId,
}

impl PaneSplit {
    #[must_use]
    pub const fn children(&self) -> [PaneId; 2] {
        [self.first, self.second]
    }

    /// The child that is not `child`, if `child` belongs to this split.
    #[must_use]
    pub fn sibling_of(&self, child: PaneId) -> Option<PaneId> {
        if self.first == child {
            Some(self.second)
        } else if self.second == child {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Tab stack payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneTabs {
    pub children: Vec<PaneId>,
    pub active: usize,
}

impl PaneTabs {
    /// The visible child.
    #[must_use]
    pub fn active_child(&self) -> Option<PaneId> {
        self.children.get(self.active).copied()
    }

    #[must_use]
    pub fn position(&self, child: PaneId) -> Option<usize> {
        self.children.iter().position(|candidate| *candidate == child)
    }
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaneNodeKind {
    Leaf(PaneLeaf),
    Split(PaneSplit),
    Tab(PaneTabs),
}

impl PaneNodeKind {
    /// Direct children in layout order.
    #[must_use]
    pub fn children(&self) -> Vec<PaneId> {
        match self {
            Self::Leaf(_) => Vec::new(),
            Self::Split(split) => split.children().to_vec(),
            Self::Tab(tabs) => tabs.children.clone(),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Split(_) => "split",
            Self::Tab(_) => "tab",
        }
    }
}

/// Serializable node record in the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneNodeRecord {
    pub id: PaneId,
    #[serde(default)]
    pub parent: Option<PaneId>,
    #[serde(flatten)]
    pub kind: PaneNodeKind,
}

impl PaneNodeRecord {
    #[must_use]
    pub fn leaf(id: PaneId, parent: Option<PaneId>, view: View) -> Self {
        Self {
            id,
            parent,
            kind: PaneNodeKind::Leaf(PaneLeaf { view }),
        }
    }

    #[must_use]
    pub fn split(id: PaneId, parent: Option<PaneId>, split: PaneSplit) -> Self {
        Self {
            id,
            parent,
            kind: PaneNodeKind::Split(split),
        }
    }

    #[must_use]
    pub fn tab(id: PaneId, parent: Option<PaneId>, tabs: PaneTabs) -> Self {
        Self {
            id,
            parent,
            kind: PaneNodeKind::Tab(tabs),
        }
    }
}

/// Canonical serialized pane tree shape.
///
/// `extensions` is an opaque key/value bag owned by the host (window title,
/// persistence hints); the layout engine never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneTreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub root: PaneId,
    pub next_id: PaneId,
    pub nodes: Vec<PaneNodeRecord>,
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    PANE_TREE_SCHEMA_VERSION
}

impl PaneTreeSnapshot {
    /// Canonicalize node ordering by ID for deterministic serialization.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by_key(|node| node.id);
    }

    /// Leaf → view bindings in canonical node order.
    #[must_use]
    pub fn view_bindings(&self) -> Vec<(PaneId, ViewId)> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                PaneNodeKind::Leaf(leaf) => Some((node.id, leaf.view.id())),
                PaneNodeKind::Split(_) | PaneNodeKind::Tab(_) => None,
            })
            .collect()
    }
}

/// Structured invariant report over a pane tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneInvariantReport {
    pub state_hash: u64,
    pub issues: Vec<PaneModelError>,
}

impl PaneInvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validated pane tree model for runtime usage.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneTree {
    schema_version: u16,
    pub(crate) root: PaneId,
    pub(crate) next_id: PaneId,
    pub(crate) nodes: BTreeMap<PaneId, PaneNodeRecord>,
    extensions: BTreeMap<String, String>,
}

impl PaneTree {
    /// Build a singleton tree with one root leaf.
    #[must_use]
    pub fn singleton(view: View) -> Self {
        let root = PaneId::MIN;
        let mut nodes = BTreeMap::new();
        let _ = nodes.insert(root, PaneNodeRecord::leaf(root, None, view));
        Self {
            schema_version: PANE_TREE_SCHEMA_VERSION,
            root,
            next_id: PaneId(root.0 + 1),
            nodes,
            extensions: BTreeMap::new(),
        }
    }

    /// Build a tree whose root is a tab stack of the given views, first tab active.
    pub fn tabbed(views: impl IntoIterator<Item = View>) -> Result<Self, PaneModelError> {
        let root = PaneId::MIN;
        let mut nodes = BTreeMap::new();
        let mut children = Vec::new();
        let mut next = root.checked_next()?;
        for view in views {
            let _ = nodes.insert(next, PaneNodeRecord::leaf(next, Some(root), view));
            children.push(next);
            next = next.checked_next()?;
        }
        if children.is_empty() {
            return Err(PaneModelError::EmptyTab { node_id: root });
        }
        let _ = nodes.insert(
            root,
            PaneNodeRecord::tab(
                root,
                None,
                PaneTabs {
                    children,
                    active: 0,
                },
            ),
        );
        Ok(Self {
            schema_version: PANE_TREE_SCHEMA_VERSION,
            root,
            next_id: next,
            nodes,
            extensions: BTreeMap::new(),
        })
    }

    /// Construct and validate from a serial snapshot.
    pub fn from_snapshot(mut snapshot: PaneTreeSnapshot) -> Result<Self, PaneModelError> {
        if snapshot.schema_version != PANE_TREE_SCHEMA_VERSION {
            return Err(PaneModelError::UnsupportedSchemaVersion {
                version: snapshot.schema_version,
            });
        }
        snapshot.canonicalize();
        let mut nodes = BTreeMap::new();
        for node in snapshot.nodes {
            let node_id = node.id;
            if nodes.insert(node_id, node).is_some() {
                return Err(PaneModelError::DuplicateNodeId { node_id });
            }
        }
        validate_tree(snapshot.root, snapshot.next_id, &nodes)?;
        Ok(Self {
            schema_version: snapshot.schema_version,
            root: snapshot.root,
            next_id: snapshot.next_id,
            nodes,
            extensions: snapshot.extensions,
        })
    }

    /// Export to canonical snapshot form.
    #[must_use]
    pub fn to_snapshot(&self) -> PaneTreeSnapshot {
        let mut snapshot = PaneTreeSnapshot {
            schema_version: self.schema_version,
            root: self.root,
            next_id: self.next_id,
            nodes: self.nodes.values().cloned().collect(),
            extensions: self.extensions.clone(),
        };
        snapshot.canonicalize();
        snapshot
    }

    /// Root node ID.
    #[must_use]
    pub const fn root(&self) -> PaneId {
        self.root
    }

    /// Next deterministic ID value.
    #[must_use]
    pub const fn next_id(&self) -> PaneId {
        self.next_id
    }

    /// Host-owned metadata carried through snapshots.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.extensions
    }

    /// Lookup a node by ID.
    #[must_use]
    pub fn node(&self, id: PaneId) -> Option<&PaneNodeRecord> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: PaneId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate nodes in canonical ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &PaneNodeRecord> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn parent(&self, id: PaneId) -> Option<PaneId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn split(&self, id: PaneId) -> Option<&PaneSplit> {
        match self.nodes.get(&id).map(|node| &node.kind) {
            Some(PaneNodeKind::Split(split)) => Some(split),
            _ => None,
        }
    }

    #[must_use]
    pub fn tabs(&self, id: PaneId) -> Option<&PaneTabs> {
        match self.nodes.get(&id).map(|node| &node.kind) {
            Some(PaneNodeKind::Tab(tabs)) => Some(tabs),
            _ => None,
        }
    }

    /// The view owned by a leaf.
    #[must_use]
    pub fn view(&self, id: PaneId) -> Option<&View> {
        match self.nodes.get(&id).map(|node| &node.kind) {
            Some(PaneNodeKind::Leaf(leaf)) => Some(&leaf.view),
            _ => None,
        }
    }

    /// Leaf currently owning `view`.
    #[must_use]
    pub fn leaf_for_view(&self, view: ViewId) -> Option<PaneId> {
        self.nodes.values().find_map(|node| match &node.kind {
            PaneNodeKind::Leaf(leaf) if leaf.view.id() == view => Some(node.id),
            _ => None,
        })
    }

    /// Direct children of a node (empty for leaves and unknown IDs).
    #[must_use]
    pub fn children(&self, id: PaneId) -> Vec<PaneId> {
        self.nodes
            .get(&id)
            .map(|node| node.kind.children())
            .unwrap_or_default()
    }

    /// True when `node` is `ancestor` or lies inside its subtree.
    #[must_use]
    pub fn is_within(&self, ancestor: PaneId, node: PaneId) -> bool {
        let mut cursor = Some(node);
        let mut hops = 0usize;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.nodes.len() {
                return false;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Pre-order IDs of the subtree rooted at `id`.
    #[must_use]
    pub fn subtree_ids(&self, id: PaneId) -> Vec<PaneId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if !self.nodes.contains_key(&node_id) {
                continue;
            }
            out.push(node_id);
            let mut children = self.children(node_id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Leaf IDs in layout (pre-order) order.
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<PaneId> {
        self.subtree_ids(self.root)
            .into_iter()
            .filter(|id| self.view(*id).is_some())
            .collect()
    }

    /// Validate internal invariants.
    pub fn validate(&self) -> Result<(), PaneModelError> {
        validate_tree(self.root, self.next_id, &self.nodes)
    }

    /// Structured invariant diagnostics: every finding, not just the first.
    #[must_use]
    pub fn invariant_report(&self) -> PaneInvariantReport {
        PaneInvariantReport {
            state_hash: self.state_hash(),
            issues: collect_issues(self.root, self.next_id, &self.nodes),
        }
    }

    /// Deterministic structural hash of the current tree state.
    ///
    /// This is intended for operation logs and replay diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u16(hash: &mut u64, value: u16) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_u64(hash, value.len() as u64);
            mix_bytes(hash, value.as_bytes());
        }

        fn mix_opt_pane_id(hash: &mut u64, value: Option<PaneId>) {
            match value {
                Some(value) => {
                    mix(hash, 1);
                    mix_u64(hash, value.get());
                }
                None => mix(hash, 0),
            }
        }

        fn mix_view(hash: &mut u64, view: &View) {
            let (min, preferred) = view.measure();
            mix_u64(hash, view.id().0);
            mix_str(hash, view.title());
            mix_u16(hash, min.width);
            mix_u16(hash, min.height);
            mix_u16(hash, preferred.width);
            mix_u16(hash, preferred.height);
            mix(hash, view.capabilities().bits());
        }

        let mut hash = OFFSET_BASIS;
        mix_u16(&mut hash, self.schema_version);
        mix_u64(&mut hash, self.root.get());
        mix_u64(&mut hash, self.next_id.get());
        mix_u64(&mut hash, self.extensions.len() as u64);
        for (key, value) in &self.extensions {
            mix_str(&mut hash, key);
            mix_str(&mut hash, value);
        }
        mix_u64(&mut hash, self.nodes.len() as u64);

        for node in self.nodes.values() {
            mix_u64(&mut hash, node.id.get());
            mix_opt_pane_id(&mut hash, node.parent);
            match &node.kind {
                PaneNodeKind::Leaf(leaf) => {
                    mix(&mut hash, 1);
                    mix_view(&mut hash, &leaf.view);
                }
                PaneNodeKind::Split(split) => {
                    mix(&mut hash, 2);
                    let axis_byte = match split.orientation {
                        Orientation::Horizontal => 1,
                        Orientation::Vertical => 2,
                    };
                    mix(&mut hash, axis_byte);
                    mix_u64(&mut hash, split.ratio.get().to_bits());
                    mix_u64(&mut hash, split.first.get());
                    mix_u64(&mut hash, split.second.get());
                }
                PaneNodeKind::Tab(tabs) => {
                    mix(&mut hash, 3);
                    mix_u64(&mut hash, tabs.active as u64);
                    mix_u64(&mut hash, tabs.children.len() as u64);
                    for child in &tabs.children {
                        mix_u64(&mut hash, child.get());
                    }
                }
            }
        }

        hash
    }

    pub(crate) fn node_mut(&mut self, id: PaneId) -> Option<&mut PaneNodeRecord> {
        self.nodes.get_mut(&id)
    }
}

/// Validation errors for pane schema construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaneModelError {
    #[error("pane id 0 is invalid")]
    ZeroPaneId,
    #[error("unsupported pane schema version {version} (expected {PANE_TREE_SCHEMA_VERSION})")]
    UnsupportedSchemaVersion { version: u16 },
    #[error("duplicate pane node id {node_id}")]
    DuplicateNodeId { node_id: PaneId },
    #[error("root pane node {root} not found")]
    MissingRoot { root: PaneId },
    #[error("root pane node {root} must not have parent {parent}")]
    RootHasParent { root: PaneId, parent: PaneId },
    #[error("node {node_id} references missing parent {parent}")]
    MissingParent { node_id: PaneId, parent: PaneId },
    #[error("node {parent} references missing child {child}")]
    MissingChild { parent: PaneId, child: PaneId },
    #[error("node {child} has multiple parents: {first_parent} and {second_parent}")]
    MultipleParents {
        child: PaneId,
        first_parent: PaneId,
        second_parent: PaneId,
    },
    #[error("node {node_id} parent mismatch: expected {expected:?}, got {actual:?}")]
    ParentMismatch {
        node_id: PaneId,
        expected: Option<PaneId>,
        actual: Option<PaneId>,
    },
    #[error("node {node_id} cannot reference itself")]
    SelfReferential { node_id: PaneId },
    #[error("node {node_id} references child {child} twice")]
    DuplicateChild { node_id: PaneId, child: PaneId },
    #[error("invalid split ratio {value}: must be finite and strictly between 0 and 1")]
    InvalidSplitRatio { value: f64 },
    #[error("tab node {node_id} has no children")]
    EmptyTab { node_id: PaneId },
    #[error("tab node {node_id} active index {active} out of range for {len} children")]
    ActiveTabOutOfRange {
        node_id: PaneId,
        active: usize,
        len: usize,
    },
    #[error("cycle detected at node {node_id}")]
    CycleDetected { node_id: PaneId },
    #[error("node {node_id} is unreachable from root")]
    UnreachableNode { node_id: PaneId },
    #[error("next_id {next_id} must be greater than max existing id {max_existing}")]
    NextIdNotGreaterThanExisting {
        next_id: PaneId,
        max_existing: PaneId,
    },
    #[error("pane id overflow after {current}")]
    PaneIdOverflow { current: PaneId },
}

fn validate_tree(
    root: PaneId,
    next_id: PaneId,
    nodes: &BTreeMap<PaneId, PaneNodeRecord>,
) -> Result<(), PaneModelError> {
    match collect_issues(root, next_id, nodes).into_iter().next() {
        Some(issue) => Err(issue),
        None => Ok(()),
    }
}

fn collect_issues(
    root: PaneId,
    next_id: PaneId,
    nodes: &BTreeMap<PaneId, PaneNodeRecord>,
) -> Vec<PaneModelError> {
    let mut issues = Vec::new();
    if !nodes.contains_key(&root) {
        issues.push(PaneModelError::MissingRoot { root });
        return issues;
    }

    let max_existing = nodes.keys().next_back().copied().unwrap_or(root);
    if next_id <= max_existing {
        issues.push(PaneModelError::NextIdNotGreaterThanExisting {
            next_id,
            max_existing,
        });
    }

    let mut expected_parents: BTreeMap<PaneId, PaneId> = BTreeMap::new();

    for node in nodes.values() {
        if let Some(parent) = node.parent
            && !nodes.contains_key(&parent)
        {
            issues.push(PaneModelError::MissingParent {
                node_id: node.id,
                parent,
            });
        }

        match &node.kind {
            PaneNodeKind::Leaf(_) => {}
            PaneNodeKind::Split(split) => {
                if split.first == split.second {
                    issues.push(PaneModelError::DuplicateChild {
                        node_id: node.id,
                        child: split.first,
                    });
                }
            }
            PaneNodeKind::Tab(tabs) => {
                if tabs.children.is_empty() {
                    issues.push(PaneModelError::EmptyTab { node_id: node.id });
                } else if tabs.active >= tabs.children.len() {
                    issues.push(PaneModelError::ActiveTabOutOfRange {
                        node_id: node.id,
                        active: tabs.active,
                        len: tabs.children.len(),
                    });
                }
                let mut seen = BTreeSet::new();
                for child in &tabs.children {
                    if !seen.insert(*child) {
                        issues.push(PaneModelError::DuplicateChild {
                            node_id: node.id,
                            child: *child,
                        });
                    }
                }
            }
        }

        let mut seen = BTreeSet::new();
        for child in node.kind.children() {
            if !seen.insert(child) {
                continue;
            }
            if child == node.id {
                issues.push(PaneModelError::SelfReferential { node_id: node.id });
                continue;
            }
            if !nodes.contains_key(&child) {
                issues.push(PaneModelError::MissingChild {
                    parent: node.id,
                    child,
                });
                continue;
            }
            if let Some(first_parent) = expected_parents.insert(child, node.id)
                && first_parent != node.id
            {
                issues.push(PaneModelError::MultipleParents {
                    child,
                    first_parent,
                    second_parent: node.id,
                });
            }
        }
    }

    if let Some(parent) = nodes.get(&root).and_then(|node| node.parent) {
        issues.push(PaneModelError::RootHasParent { root, parent });
    }

    for node in nodes.values() {
        let expected = if node.id == root {
            None
        } else {
            expected_parents.get(&node.id).copied()
        };
        if node.parent != expected {
            issues.push(PaneModelError::ParentMismatch {
                node_id: node.id,
                expected,
                actual: node.parent,
            });
        }
    }

    let mut visiting = BTreeSet::new();
    let mut visited = BTreeSet::new();
    dfs_collect(root, nodes, &mut visiting, &mut visited, &mut issues);

    for node_id in nodes.keys() {
        if !visited.contains(node_id) {
            issues.push(PaneModelError::UnreachableNode { node_id: *node_id });
        }
    }

    issues
}

fn dfs_collect(
    node_id: PaneId,
    nodes: &BTreeMap<PaneId, PaneNodeRecord>,
    visiting: &mut BTreeSet<PaneId>,
    visited: &mut BTreeSet<PaneId>,
    issues: &mut Vec<PaneModelError>,
) {
    if visiting.contains(&node_id) {
        issues.push(PaneModelError::CycleDetected { node_id });
        return;
    }
    if !visited.insert(node_id) {
        return;
    }

    let _ = visiting.insert(node_id);
    if let Some(node) = nodes.get(&node_id) {
        for child in node.kind.children() {
            if nodes.contains_key(&child) {
                dfs_collect(child, nodes, visiting, visited, issues);
            }
        }
    }
    let _ = visiting.remove(&node_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(raw: u64) -> PaneId {
        PaneId::new(raw).expect("test ID must be non-zero")
    }

    fn make_valid_snapshot() -> PaneTreeSnapshot {
        let root = id(1);
        let left = id(2);
        let right = id(3);

        PaneTreeSnapshot {
            schema_version: PANE_TREE_SCHEMA_VERSION,
            root,
            next_id: id(4),
            nodes: vec![
                PaneNodeRecord::leaf(right, Some(root), View::field(30, "right")),
                PaneNodeRecord::split(
                    root,
                    None,
                    PaneSplit {
                        orientation: Orientation::Horizontal,
                        ratio: SplitRatio::new(0.6).expect("valid ratio"),
                        first: left,
                        second: right,
                    },
                ),
                PaneNodeRecord::leaf(left, Some(root), View::page(20, "left")),
            ],
            extensions: BTreeMap::new(),
        }
    }

    #[test]
    fn ratio_rejects_bounds_and_non_finite() {
        for value in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert!(SplitRatio::new(value).is_err(), "{value} must be rejected");
        }
        assert_eq!(SplitRatio::new(0.25).expect("valid").get(), 0.25);
    }

    #[test]
    fn snapshot_round_trip_preserves_canonical_order() {
        let tree =
            PaneTree::from_snapshot(make_valid_snapshot()).expect("snapshot should validate");
        let snapshot = tree.to_snapshot();
        let ids = snapshot
            .nodes
            .iter()
            .map(|node| node.id.get())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            snapshot.view_bindings(),
            vec![(id(2), ViewId(20)), (id(3), ViewId(30))]
        );
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut snapshot = make_valid_snapshot();
        snapshot
            .nodes
            .push(PaneNodeRecord::leaf(id(2), Some(id(1)), View::label(9, "dup")));
        let err = PaneTree::from_snapshot(snapshot).expect_err("duplicate ID should fail");
        assert_eq!(err, PaneModelError::DuplicateNodeId { node_id: id(2) });
    }

    #[test]
    fn missing_child_is_rejected() {
        let mut snapshot = make_valid_snapshot();
        snapshot.nodes.retain(|node| node.id != id(3));
        let err = PaneTree::from_snapshot(snapshot).expect_err("missing child should fail");
        assert_eq!(
            err,
            PaneModelError::MissingChild {
                parent: id(1),
                child: id(3),
            }
        );
    }

    #[test]
    fn unreachable_node_is_rejected() {
        let mut snapshot = make_valid_snapshot();
        snapshot
            .nodes
            .push(PaneNodeRecord::leaf(id(10), None, View::label(1, "orphan")));
        snapshot.next_id = id(11);
        let err = PaneTree::from_snapshot(snapshot).expect_err("orphan should fail");
        assert_eq!(err, PaneModelError::UnreachableNode { node_id: id(10) });
    }

    #[test]
    fn next_id_must_be_greater_than_existing_ids() {
        let mut snapshot = make_valid_snapshot();
        snapshot.next_id = id(3);
        let err = PaneTree::from_snapshot(snapshot).expect_err("next_id should be > max ID");
        assert_eq!(
            err,
            PaneModelError::NextIdNotGreaterThanExisting {
                next_id: id(3),
                max_existing: id(3),
            }
        );
    }

    #[test]
    fn empty_tab_and_bad_active_index_are_reported() {
        let root = id(1);
        let snapshot = PaneTreeSnapshot {
            schema_version: PANE_TREE_SCHEMA_VERSION,
            root,
            next_id: id(3),
            nodes: vec![
                PaneNodeRecord::tab(
                    root,
                    None,
                    PaneTabs {
                        children: vec![id(2)],
                        active: 4,
                    },
                ),
                PaneNodeRecord::leaf(id(2), Some(root), View::label(1, "a")),
            ],
            extensions: BTreeMap::new(),
        };
        let err = PaneTree::from_snapshot(snapshot).expect_err("bad active index");
        assert_eq!(
            err,
            PaneModelError::ActiveTabOutOfRange {
                node_id: root,
                active: 4,
                len: 1,
            }
        );
        assert_eq!(
            PaneTree::tabbed(Vec::new()).expect_err("empty tab"),
            PaneModelError::EmptyTab { node_id: root }
        );
    }

    #[test]
    fn invariant_report_lists_every_issue() {
        let mut tree = PaneTree::from_snapshot(make_valid_snapshot()).expect("valid tree");
        tree.next_id = id(2);
        if let Some(node) = tree.node_mut(id(3)) {
            node.parent = None;
        }
        let report = tree.invariant_report();
        assert!(!report.is_clean());
        assert!(
            report
                .issues
                .contains(&PaneModelError::NextIdNotGreaterThanExisting {
                    next_id: id(2),
                    max_existing: id(3),
                })
        );
        assert!(report.issues.contains(&PaneModelError::ParentMismatch {
            node_id: id(3),
            expected: Some(id(1)),
            actual: None,
        }));
    }

    #[test]
    fn tabbed_constructor_assigns_sequential_ids() {
        let tree = PaneTree::tabbed([View::page(1, "a"), View::page(2, "b")]).expect("valid tabs");
        let tabs = tree.tabs(tree.root()).expect("root is a tab");
        assert_eq!(tabs.children, vec![id(2), id(3)]);
        assert_eq!(tabs.active, 0);
        assert_eq!(tree.next_id(), id(4));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn subtree_and_ancestry_queries() {
        let tree = PaneTree::from_snapshot(make_valid_snapshot()).expect("valid tree");
        assert_eq!(tree.subtree_ids(id(1)), vec![id(1), id(2), id(3)]);
        assert_eq!(tree.leaf_ids(), vec![id(2), id(3)]);
        assert!(tree.is_within(id(1), id(3)));
        assert!(tree.is_within(id(3), id(3)));
        assert!(!tree.is_within(id(2), id(3)));
        assert_eq!(tree.leaf_for_view(ViewId(30)), Some(id(3)));
    }

    #[test]
    fn state_hash_tracks_structural_changes() {
        let tree = PaneTree::from_snapshot(make_valid_snapshot()).expect("valid tree");
        let mut changed = tree.clone();
        if let Some(PaneNodeRecord {
            kind: PaneNodeKind::Split(split),
            ..
        }) = changed.node_mut(id(1))
        {
            split.ratio = SplitRatio::new(0.3).expect("valid ratio");
        }
        assert_eq!(tree.state_hash(), tree.clone().state_hash());
        assert_ne!(tree.state_hash(), changed.state_hash());
    }

    #[test]
    fn snapshot_json_shape_is_tagged() {
        let tree = PaneTree::from_snapshot(make_valid_snapshot()).expect("valid tree");
        let json = serde_json::to_value(tree.to_snapshot()).expect("snapshot should serialize");
        assert_eq!(json["schema_version"], serde_json::json!(1));
        assert_eq!(json["nodes"][0]["kind"], serde_json::json!("split"));
        assert_eq!(json["nodes"][0]["ratio"], serde_json::json!(0.6));
        let back: PaneTreeSnapshot =
            serde_json::from_value(json).expect("snapshot should deserialize");
        assert_eq!(back, tree.to_snapshot());
    }

    #[test]
    fn zero_id_and_out_of_range_ratio_fail_to_deserialize() {
        let bad_id = serde_json::from_str::<PaneId>("0");
        assert!(bad_id.is_err());
        let bad_ratio = serde_json::from_str::<SplitRatio>("1.0");
        assert!(bad_ratio.is_err());
    }

    proptest! {
        #[test]
        fn ratio_accepts_open_interval(value in 0.000_1f64..0.999_9) {
            let ratio = SplitRatio::new(value).expect("open-interval ratio must be valid");
            prop_assert_eq!(ratio.get(), value);
        }
    }
}
