#![forbid(unsafe_code)]

//! Tessel Layout
//!
//! The pane tree, the layout engine that positions it, and the drag
//! controller that rearranges it.
//!
//! # Key Components
//!
//! - [`PaneTree`] - Arena of Leaf, Split, and Tab records with parent back-links
//! - [`LayoutEngine`] - Geometry solve plus atomic tree mutations
//! - [`DragController`] - Pointer gesture state machine with live previews
//! - [`DebugSink`] - Ordered stream of transitions and mutations
//! - [`Workspace`] - Facade tying the three together for a host
//!
//! # Role in Tessel
//! `tessel-layout` consumes [`tessel_core::PointerEvent`]s and
//! [`tessel_core::View`]s and produces solved rectangles and render commands.
//! Hosts own the event loop and the drawing; the harness crate records and
//! replays the debug stream.

pub mod config;
pub mod drag;
pub mod engine;
pub mod geometry;
pub mod hit;
mod ops;
pub mod pane;
pub mod preview;
pub mod sink;
pub mod workspace;

pub use config::{ConfigError, DragTuning, LayoutMetrics, WorkspaceConfig};
pub use drag::{ActiveDrag, DragController, DragMode, DragOutcome, DragState};
pub use engine::{LayoutEngine, LayoutError, Mutation, MutationOutcome};
pub use geometry::{
    DividerLayout, PaneLayout, TabHandleLayout, TabStripLayout, compute_geometry,
    compute_geometry_with,
};
pub use hit::{DropTarget, HitTarget, hit_test, resolve_drop};
pub use pane::{
    DockEdge, Orientation, PANE_TREE_SCHEMA_VERSION, PaneId, PaneInvariantReport, PaneLeaf,
    PaneModelError, PaneNodeKind, PaneNodeRecord, PaneSplit, PaneTabs, PaneTree,
    PaneTreeSnapshot, SplitRatio,
};
pub use preview::PreviewOverlay;
pub use sink::{
    CancelReason, DebugEmitter, DebugEvent, DebugEventKind, DebugSink, DragPhase, NullSink,
};
pub use workspace::{Workspace, WorkspaceError};
