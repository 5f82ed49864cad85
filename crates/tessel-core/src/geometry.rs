#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A pointer or anchor position in workspace cells.
///
/// Signed so that positions outside the workspace (a pointer dragged past the
/// window edge) stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    #[must_use]
    pub const fn delta_from(self, origin: Point) -> (i32, i32) {
        (
            self.x.saturating_sub(origin.x),
            self.y.saturating_sub(origin.y),
        )
    }
}

/// Width/height pair in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// A rectangle for layout bounds and hit testing.
///
/// Uses cell coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Zero-area rectangle anchored at this rectangle's origin.
    #[inline]
    pub const fn collapsed(&self) -> Self {
        Self::new(self.x, self.y, 0, 0)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= i32::from(self.x)
            && point.x < i32::from(self.right())
            && point.y >= i32::from(self.y)
            && point.y < i32::from(self.bottom())
    }

    /// Check if a point is inside the rectangle grown by `slop` cells on every side.
    #[inline]
    pub fn contains_with_slop(&self, point: Point, slop: u16) -> bool {
        if self.is_empty() {
            return false;
        }
        let slop = i32::from(slop);
        point.x >= i32::from(self.x) - slop
            && point.x < i32::from(self.right()) + slop
            && point.y >= i32::from(self.y) - slop
            && point.y < i32::from(self.bottom()) + slop
    }

    /// Chebyshev distance from the point to the rectangle (0 when inside).
    #[must_use]
    pub fn distance_outside(&self, point: Point) -> u32 {
        let dx = if point.x < i32::from(self.x) {
            i32::from(self.x) - point.x
        } else if point.x >= i32::from(self.right()) {
            point.x - i32::from(self.right()) + 1
        } else {
            0
        };
        let dy = if point.y < i32::from(self.y) {
            i32::from(self.y) - point.y
        } else if point.y >= i32::from(self.bottom()) {
            point.y - i32::from(self.bottom()) + 1
        } else {
            0
        };
        dx.max(dy).unsigned_abs()
    }

    /// Center point (rounded toward the origin).
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            i32::from(self.x) + i32::from(self.width) / 2,
            i32::from(self.y) + i32::from(self.height) / 2,
        )
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Split off the top `height` rows, returning `(top, rest)`.
    ///
    /// `height` is clamped to the rectangle's height.
    #[must_use]
    pub fn take_top(&self, height: u16) -> (Rect, Rect) {
        let height = height.min(self.height);
        (
            Rect::new(self.x, self.y, self.width, height),
            Rect::new(
                self.x,
                self.y.saturating_add(height),
                self.width,
                self.height - height,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Size};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(Point::new(2, 3)));
        assert!(rect.contains(Point::new(5, 7)));
        assert!(!rect.contains(Point::new(6, 3)));
        assert!(!rect.contains(Point::new(2, 8)));
        assert!(!rect.contains(Point::new(-1, 3)));
    }

    #[test]
    fn empty_rect_contains_nothing() {
        let rect = Rect::new(4, 4, 0, 3);
        assert!(!rect.contains(Point::new(4, 4)));
        assert!(!rect.contains_with_slop(Point::new(4, 4), 2));
    }

    #[test]
    fn slop_grows_hit_area() {
        let divider = Rect::new(10, 0, 1, 20);
        assert!(!divider.contains(Point::new(11, 5)));
        assert!(divider.contains_with_slop(Point::new(11, 5), 1));
        assert!(!divider.contains_with_slop(Point::new(12, 5), 1));
    }

    #[test]
    fn distance_outside_is_chebyshev() {
        let rect = Rect::new(10, 10, 5, 5);
        assert_eq!(rect.distance_outside(Point::new(12, 12)), 0);
        assert_eq!(rect.distance_outside(Point::new(7, 12)), 3);
        assert_eq!(rect.distance_outside(Point::new(15, 12)), 1);
        assert_eq!(rect.distance_outside(Point::new(20, 30)), 16);
    }

    #[test]
    fn intersection_no_overlap_is_none() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(3, 3, 2, 2);
        assert_eq!(a.intersection_opt(&b), None);
        assert_eq!(
            Rect::new(0, 0, 4, 4).intersection_opt(&Rect::new(2, 2, 4, 4)),
            Some(Rect::new(2, 2, 2, 2))
        );
    }

    #[test]
    fn take_top_clamps() {
        let rect = Rect::new(1, 1, 8, 3);
        assert_eq!(
            rect.take_top(1),
            (Rect::new(1, 1, 8, 1), Rect::new(1, 2, 8, 2))
        );
        assert_eq!(
            rect.take_top(9),
            (Rect::new(1, 1, 8, 3), Rect::new(1, 4, 8, 0))
        );
    }

    #[test]
    fn size_max_is_componentwise() {
        assert_eq!(Size::new(3, 9).max(Size::new(5, 2)), Size::new(5, 9));
    }
}
