#![forbid(unsafe_code)]

//! Core: geometry, pointer input, and leaf view primitives.
//!
//! # Role in Tessel
//! `tessel-core` holds the host-agnostic vocabulary shared by the layout
//! engine and any host adapter:
//!
//! - **Geometry**: cell-addressed [`Rect`], [`Point`], and [`Size`].
//! - **Input**: abstract [`PointerEvent`]s, decoupled from any host input API.
//! - **Views**: the closed [`View`] variant set (field, image, label, page)
//!   that leaf panes own and render.
//!
//! The layout crate (`tessel-layout`) positions views; it never looks inside
//! their content.

pub mod event;
pub mod geometry;
pub mod view;

pub use event::PointerEvent;
pub use geometry::{Point, Rect, Size};
pub use view::{RenderCommand, View, ViewCapabilities, ViewContent, ViewId, ViewKind};
