#![forbid(unsafe_code)]

//! Leaf view contract.
//!
//! A [`View`] is the renderable unit a leaf pane owns. The variant set is
//! closed ([`ViewContent`]) and dispatched with `match`; variants differ only
//! in what they draw, never in how the layout engine treats them. The engine
//! consumes three things from a view: [`View::measure`], [`View::render`], and
//! [`View::capabilities`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};

/// Host-assigned view identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u64);

bitflags! {
    /// Layout-relevant capabilities of a view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ViewCapabilities: u8 {
        /// The view may be shrunk below its preferred size (down to its minimum).
        const RESIZABLE = 1;
        /// The owning leaf's title region acts as a drag handle.
        const DRAG_HANDLE = 1 << 1;
    }
}

impl Default for ViewCapabilities {
    fn default() -> Self {
        Self::RESIZABLE | Self::DRAG_HANDLE
    }
}

/// Content discriminator used in logs and render commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Field,
    Image,
    Label,
    Page,
}

/// Closed set of leaf content variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewContent {
    /// Editable single-line text field.
    Field { text: String },
    /// Raster image with its natural size in cells.
    Image { source: String, natural: Size },
    /// Static one-line label.
    Label { text: String },
    /// Scrollable document page.
    Page { title: String },
}

impl ViewContent {
    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        match self {
            Self::Field { .. } => ViewKind::Field,
            Self::Image { .. } => ViewKind::Image,
            Self::Label { .. } => ViewKind::Label,
            Self::Page { .. } => ViewKind::Page,
        }
    }

    fn default_hints(&self) -> (Size, Size) {
        match self {
            Self::Field { text } => (Size::new(4, 1), Size::new(text_width(text).max(20), 1)),
            Self::Image { natural, .. } => (Size::new(2, 2), *natural),
            Self::Label { text } => (Size::new(1, 1), Size::new(text_width(text).max(1), 1)),
            Self::Page { .. } => (Size::new(8, 3), Size::new(80, 24)),
        }
    }

    fn default_capabilities(&self) -> ViewCapabilities {
        match self {
            Self::Label { .. } => ViewCapabilities::DRAG_HANDLE,
            Self::Field { .. } | Self::Image { .. } | Self::Page { .. } => {
                ViewCapabilities::default()
            }
        }
    }

    fn title(&self) -> &str {
        match self {
            Self::Field { text } | Self::Label { text } => text,
            Self::Image { source, .. } => source,
            Self::Page { title } => title,
        }
    }
}

fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

/// A leaf's renderable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    id: ViewId,
    content: ViewContent,
    min_size: Size,
    preferred_size: Size,
    capabilities: ViewCapabilities,
}

impl View {
    /// Build a view with the default hints and capabilities for its variant.
    #[must_use]
    pub fn new(id: ViewId, content: ViewContent) -> Self {
        let (min_size, preferred_size) = content.default_hints();
        let capabilities = content.default_capabilities();
        Self {
            id,
            content,
            min_size,
            preferred_size,
            capabilities,
        }
    }

    #[must_use]
    pub fn field(id: u64, text: impl Into<String>) -> Self {
        Self::new(ViewId(id), ViewContent::Field { text: text.into() })
    }

    #[must_use]
    pub fn image(id: u64, source: impl Into<String>, natural: Size) -> Self {
        Self::new(
            ViewId(id),
            ViewContent::Image {
                source: source.into(),
                natural,
            },
        )
    }

    #[must_use]
    pub fn label(id: u64, text: impl Into<String>) -> Self {
        Self::new(ViewId(id), ViewContent::Label { text: text.into() })
    }

    #[must_use]
    pub fn page(id: u64, title: impl Into<String>) -> Self {
        Self::new(
            ViewId(id),
            ViewContent::Page {
                title: title.into(),
            },
        )
    }

    /// Override the minimum size hint.
    #[must_use]
    pub fn with_min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self.preferred_size = self.preferred_size.max(min_size);
        self
    }

    /// Override the capability set.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ViewCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ViewId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        self.content.kind()
    }

    #[must_use]
    pub const fn content(&self) -> &ViewContent {
        &self.content
    }

    #[must_use]
    pub const fn capabilities(&self) -> ViewCapabilities {
        self.capabilities
    }

    /// Short title shown in title bars and tab handles.
    #[must_use]
    pub fn title(&self) -> &str {
        self.content.title()
    }

    /// `(minimum, preferred)` size hints.
    #[must_use]
    pub const fn measure(&self) -> (Size, Size) {
        (self.min_size, self.preferred_size)
    }

    /// Smallest size the layout engine may give this view.
    ///
    /// Views without [`ViewCapabilities::RESIZABLE`] never shrink below their
    /// preferred size.
    #[must_use]
    pub fn layout_floor(&self) -> Size {
        if self.capabilities.contains(ViewCapabilities::RESIZABLE) {
            self.min_size
        } else {
            self.preferred_size.max(self.min_size)
        }
    }

    /// Produce the draw command for this view at `rect`.
    #[must_use]
    pub fn render(&self, rect: Rect) -> RenderCommand {
        let body = match &self.content {
            ViewContent::Field { text } => format!("[{text}]"),
            ViewContent::Image { source, natural } => {
                format!("<img {source} {}x{}>", natural.width, natural.height)
            }
            ViewContent::Label { text } => text.clone(),
            ViewContent::Page { title } => format!("# {title}"),
        };
        RenderCommand {
            view: self.id,
            kind: self.kind(),
            rect,
            body,
        }
    }
}

/// One draw request produced by [`View::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCommand {
    pub view: ViewId,
    pub kind: ViewKind,
    pub rect: Rect,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_carry_distinct_default_hints() {
        let field = View::field(1, "name");
        let page = View::page(2, "Readme");
        assert_eq!(field.measure(), (Size::new(4, 1), Size::new(20, 1)));
        assert_eq!(page.measure(), (Size::new(8, 3), Size::new(80, 24)));
        assert_eq!(field.kind(), ViewKind::Field);
        assert_eq!(page.kind(), ViewKind::Page);
    }

    #[test]
    fn labels_are_not_resizable_by_default() {
        let label = View::label(3, "status");
        assert!(!label.capabilities().contains(ViewCapabilities::RESIZABLE));
        assert_eq!(label.layout_floor(), Size::new(6, 1));
    }

    #[test]
    fn resizable_floor_is_min_size() {
        let image = View::image(4, "logo.png", Size::new(30, 10));
        assert_eq!(image.layout_floor(), Size::new(2, 2));
    }

    #[test]
    fn min_size_override_lifts_preferred() {
        let view = View::label(5, "x").with_min_size(Size::new(4, 2));
        assert_eq!(view.measure(), (Size::new(4, 2), Size::new(4, 2)));
    }

    #[test]
    fn render_tags_command_with_identity_and_rect() {
        let rect = Rect::new(1, 2, 10, 3);
        let command = View::page(9, "Notes").render(rect);
        assert_eq!(command.view, ViewId(9));
        assert_eq!(command.kind, ViewKind::Page);
        assert_eq!(command.rect, rect);
        assert_eq!(command.body, "# Notes");
    }

    #[test]
    fn view_round_trips_through_json() {
        let view = View::image(7, "a.png", Size::new(3, 3))
            .with_capabilities(ViewCapabilities::DRAG_HANDLE);
        let json = serde_json::to_string(&view).expect("view should serialize");
        let back: View = serde_json::from_str(&json).expect("view should parse");
        assert_eq!(back, view);
    }
}
