//! Geometric primitives for glyph analysis.
//!
//! Glyphs live on the pixel grid, so points and rectangles use integer
//! coordinates. Only derived values such as centroids use floating point.

use serde::{Deserialize, Serialize};

/// A pixel location in image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (abscissa)
    pub x: i32,
    /// Y coordinate (ordinate)
    pub y: i32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Point;
    ///
    /// let point = Point::new(10, 20);
    /// assert_eq!(point.x, 10);
    /// assert_eq!(point.y, 20);
    /// ```
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A sub-pixel location, used for centroids.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl PointF {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle of pixels.
///
/// `x`/`y` address the top-left pixel. Right and bottom edges are exclusive,
/// so a rectangle with a zero width or height contains no pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of top-left pixel
    pub x: i32,
    /// Y coordinate of top-left pixel
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Rect;
    ///
    /// let rect = Rect::new(0, 0, 100, 50);
    /// assert_eq!(rect.width, 100);
    /// assert_eq!(rect.height, 50);
    /// ```
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create the rectangle spanning two inclusive corner pixels.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Rect;
    ///
    /// let rect = Rect::from_corners(10, 20, 19, 24);
    /// assert_eq!(rect.width, 10);
    /// assert_eq!(rect.height, 5);
    /// ```
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> i32 {
        self.x
    }

    /// Get the right edge x-coordinate (exclusive).
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> i32 {
        self.y
    }

    /// Get the bottom edge y-coordinate (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Report whether the rectangle contains no pixel.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Get the center point of the rectangle.
    pub fn center(&self) -> PointF {
        PointF {
            x: self.x as f64 + self.width as f64 / 2.0,
            y: self.y as f64 + self.height as f64 / 2.0,
        }
    }

    /// Check if this rectangle shares at least one pixel with another.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Rect;
    ///
    /// let r1 = Rect::new(0, 0, 10, 10);
    /// let r2 = Rect::new(9, 9, 10, 10);
    /// let r3 = Rect::new(10, 0, 10, 10);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Check if this rectangle contains a pixel.
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Compute the smallest rectangle containing both rectangles.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Rect;
    ///
    /// let r1 = Rect::new(0, 0, 5, 5);
    /// let r2 = Rect::new(3, 3, 5, 5);
    /// let union = r1.union(&r2);
    ///
    /// assert_eq!(union, Rect::new(0, 0, 8, 8));
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Return a copy grown by `dx` on the left and right, `dy` on top and bottom.
    ///
    /// Coordinates saturate at the `i32` range.
    pub fn grown(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_sub(dx),
            self.y.saturating_sub(dy),
            self.width.saturating_add(dx.saturating_mul(2)),
            self.height.saturating_add(dy.saturating_mul(2)),
        )
    }

    /// Return a copy shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Compute the area of the rectangle in pixels.
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }
}
