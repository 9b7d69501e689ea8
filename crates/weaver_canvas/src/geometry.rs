// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grid and geometry helpers shared by nodes, the router and the canvas.

use serde::{Deserialize, Serialize};

/// A point in canvas space (pixels, y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Return this point moved by a delta
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Width and height of a box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// Create a new size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner
    pub min: Point,
    /// Extent
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size
    pub const fn new(min: Point, size: Size) -> Self {
        Self { min, size }
    }

    /// Left edge
    pub fn left(&self) -> f32 {
        self.min.x
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.min.x + self.size.width
    }

    /// Top edge
    pub fn top(&self) -> f32 {
        self.min.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.height
    }

    /// Whether a point lies inside (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Callers keep `min <= max`; if they don't, `min` wins.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Round to the nearest multiple of `cell_size`, ties rounding up.
pub fn snap_to_grid(value: f32, cell_size: f32) -> f32 {
    (value / cell_size + 0.5).floor() * cell_size
}

/// Which sides of a node have ports sticking out of its body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overhang {
    /// Input ports overhang the left edge
    pub left: bool,
    /// Output ports overhang the right edge
    pub right: bool,
}

/// The bounded, grid-addressed drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Side of one grid cell
    pub cell_size: f32,
    /// Canvas width
    pub width: f32,
    /// Canvas height
    pub height: f32,
    /// How far a port sticks out of its node's body
    pub port_overhang: f32,
}

impl Grid {
    /// Length of `cells` grid cells
    pub fn cells(&self, cells: f32) -> f32 {
        cells * self.cell_size
    }

    /// Top-left corner of grid cell `(column, row)`
    pub fn cell_origin(&self, column: u32, row: u32) -> Point {
        Point::new(self.cells(column as f32), self.cells(row as f32))
    }

    /// Adjust a candidate top-left position for a box of `size`.
    ///
    /// The result is grid-aligned and keeps the box one cell away from the canvas
    /// border, leaving extra room on each side where ports overhang.
    pub fn adjust_position(&self, position: Point, size: Size, overhang: Overhang) -> Point {
        let cell = self.cell_size;
        let left = if overhang.left { self.port_overhang } else { 0.0 };
        let right = if overhang.right { self.port_overhang } else { 0.0 };

        let x = self.snap_within(position.x, cell + left, self.width - size.width - cell - right);
        let y = self.snap_within(position.y, cell, self.height - size.height - cell);
        Point::new(x, y)
    }

    fn snap_within(&self, value: f32, min: f32, max: f32) -> f32 {
        let cell = self.cell_size;
        let low = (min / cell).ceil() * cell;
        let high = ((max / cell).floor() * cell).max(low);
        clamp(snap_to_grid(value, cell), low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid {
            cell_size: 24.0,
            width: 960.0,
            height: 480.0,
            port_overhang: 12.0,
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_snap_to_grid_rounds_to_nearest() {
        assert_eq!(snap_to_grid(0.0, 24.0), 0.0);
        assert_eq!(snap_to_grid(11.0, 24.0), 0.0);
        assert_eq!(snap_to_grid(13.0, 24.0), 24.0);
        assert_eq!(snap_to_grid(50.0, 24.0), 48.0);
    }

    #[test]
    fn test_snap_to_grid_ties_round_up() {
        assert_eq!(snap_to_grid(12.0, 24.0), 24.0);
        assert_eq!(snap_to_grid(36.0, 24.0), 48.0);
    }

    #[test]
    fn test_adjust_position_snaps_and_keeps_margin() {
        let grid = grid();
        let size = Size::new(192.0, 96.0);

        let p = grid.adjust_position(Point::new(100.0, 61.0), size, Overhang::default());
        assert_eq!(p, Point::new(96.0, 72.0));

        let p = grid.adjust_position(Point::new(-50.0, -50.0), size, Overhang::default());
        assert_eq!(p, Point::new(24.0, 24.0));

        let p = grid.adjust_position(Point::new(5000.0, 5000.0), size, Overhang::default());
        assert_eq!(p, Point::new(960.0 - 192.0 - 24.0, 480.0 - 96.0 - 24.0));
    }

    #[test]
    fn test_adjust_position_leaves_room_for_overhang() {
        let grid = grid();
        let size = Size::new(192.0, 96.0);
        let overhang = Overhang { left: true, right: true };

        let p = grid.adjust_position(Point::new(0.0, 0.0), size, overhang);
        // Input ports stick out 12px to the left, so the body cannot sit at x = 24
        assert_eq!(p.x, 48.0);
        assert!(p.x - grid.port_overhang >= grid.cell_size);

        let p = grid.adjust_position(Point::new(5000.0, 0.0), size, overhang);
        assert!(p.x + size.width + grid.port_overhang <= grid.width - grid.cell_size);
        assert_eq!(p.x % 24.0, 0.0);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(Point::new(10.0, 10.0), Size::new(20.0, 10.0));
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 20.0)));
        assert!(!rect.contains(Point::new(31.0, 15.0)));
        assert_eq!(rect.right(), 30.0);
        assert_eq!(rect.bottom(), 20.0);
    }
}
