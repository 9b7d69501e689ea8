// SPDX-License-Identifier: MIT OR Apache-2.0
//! Orthogonal connector routing.
//!
//! A connector leaves an output port to the right and enters an input port from the
//! left. Depending on where the two ports sit relative to each other the path takes
//! one of three shapes:
//!
//! - [`Regime::Forward`]: the target is to the right. Two bends: right, up/down, right.
//! - [`Regime::BackwardClear`]: the target is to the left and the two node bodies are
//!   vertically apart. Four bends, crossing back along a midline between the bodies.
//! - [`Regime::BackwardOverlap`]: the target is to the left and the bodies overlap
//!   vertically. Four bends, looping over the top of both bodies.
//!
//! Corners are rounded with quadratic curves whose radius is half a grid cell.

use crate::geometry::{clamp, Point};
use crate::port::{Clearance, Port};

/// Number of line pieces a corner curve is flattened into
const CURVE_STEPS: usize = 8;

/// One end of a connector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Endpoint {
    /// Where the path starts or ends
    pub anchor: Point,
    /// Distance from the anchor to the owning body's top/bottom edges
    pub clearance: Clearance,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(anchor: Point, clearance: Clearance) -> Self {
        Self { anchor, clearance }
    }

    /// An endpoint not attached to any body (e.g. the pointer)
    pub fn free(anchor: Point) -> Self {
        Self {
            anchor,
            clearance: Clearance::default(),
        }
    }
}

impl From<&Port> for Endpoint {
    fn from(port: &Port) -> Self {
        Self::new(port.anchor_point(), port.clearance())
    }
}

/// Which routing shape was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Target at or right of the source
    Forward,
    /// Target left of the source, bodies vertically apart
    BackwardClear,
    /// Target left of the source, bodies vertically overlapping
    BackwardOverlap,
}

/// A piece of a routed path, continuing from the previous piece's end point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Straight horizontal run to `x`
    Horizontal(f32),
    /// Straight vertical run to `y`
    Vertical(f32),
    /// Quadratic corner through `control` ending at `to`
    Curve {
        /// Control point
        control: Point,
        /// End point
        to: Point,
    },
}

/// The geometry of a connector
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    /// Shape that was chosen
    pub regime: Regime,
    /// First point
    pub start: Point,
    /// Pieces following `start`
    pub segments: Vec<PathSegment>,
}

impl RoutedPath {
    /// A path that has not been routed yet (just its start point)
    pub fn empty(start: Point) -> Self {
        Self {
            regime: Regime::Forward,
            start,
            segments: Vec::new(),
        }
    }

    /// Start point followed by the end point of every segment
    pub fn waypoints(&self) -> Vec<Point> {
        let mut current = self.start;
        let mut points = Vec::with_capacity(self.segments.len() + 1);
        points.push(current);
        for segment in &self.segments {
            current = segment_end(current, segment);
            points.push(current);
        }
        points
    }

    /// Last point of the path
    pub fn end(&self) -> Point {
        self.segments
            .iter()
            .fold(self.start, |current, segment| segment_end(current, segment))
    }

    /// Polyline approximation, curves split into short straight pieces
    pub fn flatten(&self) -> Vec<Point> {
        let mut current = self.start;
        let mut points = vec![current];
        for segment in &self.segments {
            match *segment {
                PathSegment::Curve { control, to } => {
                    for step in 1..=CURVE_STEPS {
                        let t = step as f32 / CURVE_STEPS as f32;
                        points.push(quadratic_point(current, control, to, t));
                    }
                    current = to;
                }
                _ => {
                    current = segment_end(current, segment);
                    points.push(current);
                }
            }
        }
        points
    }

    /// Shortest distance from `point` to the path
    pub fn distance_to(&self, point: Point) -> f32 {
        let points = self.flatten();
        if points.len() == 1 {
            return points[0].distance(point);
        }
        points
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// SVG path data (`M`, `H`, `V`, `Q` commands)
    pub fn to_svg(&self) -> String {
        let mut data = format!("M {} {}", self.start.x, self.start.y);
        for segment in &self.segments {
            let command = match segment {
                PathSegment::Horizontal(x) => format!(" H {x}"),
                PathSegment::Vertical(y) => format!(" V {y}"),
                PathSegment::Curve { control, to } => {
                    format!(" Q {} {} {} {}", control.x, control.y, to.x, to.y)
                }
            };
            data.push_str(&command);
        }
        data
    }
}

fn segment_end(current: Point, segment: &PathSegment) -> Point {
    match *segment {
        PathSegment::Horizontal(x) => Point::new(x, current.y),
        PathSegment::Vertical(y) => Point::new(current.x, y),
        PathSegment::Curve { to, .. } => to,
    }
}

fn quadratic_point(p0: Point, control: Point, p1: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * control.x + t * t * p1.x,
        mt * mt * p0.y + 2.0 * mt * t * control.y + t * t * p1.y,
    )
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let t = clamp(((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq, 0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Sign of `value`, treating zero as positive so flat paths stay deterministic
fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

struct PathBuilder {
    start: Point,
    segments: Vec<PathSegment>,
}

impl PathBuilder {
    fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::with_capacity(9),
        }
    }

    fn horizontal(&mut self, x: f32) -> &mut Self {
        self.segments.push(PathSegment::Horizontal(x));
        self
    }

    fn vertical(&mut self, y: f32) -> &mut Self {
        self.segments.push(PathSegment::Vertical(y));
        self
    }

    fn curve(&mut self, control: Point, to: Point) -> &mut Self {
        self.segments.push(PathSegment::Curve { control, to });
        self
    }

    fn finish(&mut self, regime: Regime) -> RoutedPath {
        RoutedPath {
            regime,
            start: self.start,
            segments: std::mem::take(&mut self.segments),
        }
    }
}

/// Computes connector paths. Pure: the same endpoints always give the same path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Router {
    /// Side of one grid cell
    pub cell_size: f32,
    /// Visible stroke width
    pub stroke_width: f32,
    /// Width of the invisible hit-test stroke
    pub overlay_width: f32,
}

impl Router {
    /// Pick the routing shape for a pair of endpoints
    pub fn regime(&self, start: &Endpoint, end: &Endpoint) -> Regime {
        let cell = self.cell_size;
        let (s, e) = (start.anchor, end.anchor);

        if e.x >= s.x {
            return Regime::Forward;
        }

        let start_above_end = s.y + start.clearance.below + cell <= e.y - end.clearance.above - cell;
        let start_below_end = s.y - start.clearance.above - cell >= e.y + end.clearance.below + cell;
        if start_above_end || start_below_end {
            Regime::BackwardClear
        } else {
            Regime::BackwardOverlap
        }
    }

    /// Route a connector from an output anchor to an input anchor
    pub fn route(&self, start: &Endpoint, end: &Endpoint) -> RoutedPath {
        match self.regime(start, end) {
            Regime::Forward => self.route_forward(start.anchor, end.anchor),
            Regime::BackwardClear => self.route_backward_clear(start, end),
            Regime::BackwardOverlap => self.route_backward_overlap(start, end),
        }
    }

    fn route_forward(&self, s: Point, e: Point) -> RoutedPath {
        let (dx, dy) = (e.x - s.x, e.y - s.y);
        let curve = clamp(self.cell_size / 2.0, 0.0, dx.abs() / 2.0);
        let curve = clamp(curve, 0.0, dy.abs() / 2.0);
        let dir = sign(dy);
        let mid_x = s.x + dx * 0.5;

        PathBuilder::new(s)
            .horizontal(mid_x - curve)
            .curve(Point::new(mid_x, s.y), Point::new(mid_x, s.y + curve * dir))
            .vertical(e.y - curve * dir)
            .curve(Point::new(mid_x, e.y), Point::new(mid_x + curve, e.y))
            .horizontal(e.x)
            .finish(Regime::Forward)
    }

    fn route_backward_clear(&self, start: &Endpoint, end: &Endpoint) -> RoutedPath {
        let cell = self.cell_size;
        let curve = cell / 2.0;
        let (s, e) = (start.anchor, end.anchor);
        let dir = sign(e.y - s.y);

        // Cross back halfway between the facing body edges
        let mid_y = if s.y + start.clearance.below + cell * 2.0 <= e.y {
            ((e.y - end.clearance.above) + (s.y + start.clearance.below)) / 2.0
        } else {
            ((s.y - start.clearance.above) + (e.y + end.clearance.below)) / 2.0
        };

        let out_x = s.x + 2.0 * curve;
        let in_x = e.x - 2.0 * curve;
        PathBuilder::new(s)
            .horizontal(s.x + curve)
            .curve(Point::new(out_x, s.y), Point::new(out_x, s.y + curve * dir))
            .vertical(mid_y - curve * dir)
            .curve(Point::new(out_x, mid_y), Point::new(s.x + curve, mid_y))
            .horizontal(e.x - curve)
            .curve(Point::new(in_x, mid_y), Point::new(in_x, mid_y + curve * dir))
            .vertical(e.y - curve * dir)
            .curve(Point::new(in_x, e.y), Point::new(e.x - curve, e.y))
            .horizontal(e.x)
            .finish(Regime::BackwardClear)
    }

    fn route_backward_overlap(&self, start: &Endpoint, end: &Endpoint) -> RoutedPath {
        let curve = self.cell_size / 2.0;
        let (s, e) = (start.anchor, end.anchor);
        let top = (s.y - start.clearance.above).min(e.y - end.clearance.above);
        let loop_y = top - 2.0 * curve;

        let out_x = s.x + 2.0 * curve;
        let in_x = e.x - 2.0 * curve;
        PathBuilder::new(s)
            .horizontal(s.x + curve)
            .curve(Point::new(out_x, s.y), Point::new(out_x, s.y - curve))
            .vertical(top - curve)
            .curve(Point::new(out_x, loop_y), Point::new(s.x + curve, loop_y))
            .horizontal(e.x - curve)
            .curve(Point::new(in_x, loop_y), Point::new(in_x, top - curve))
            .vertical(e.y - curve)
            .curve(Point::new(in_x, e.y), Point::new(e.x - curve, e.y))
            .horizontal(e.x)
            .finish(Regime::BackwardOverlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};

    const OVERHANG: f32 = 12.0;
    const BODY_WIDTH: f32 = 30.0;

    fn router() -> Router {
        Router {
            cell_size: 24.0,
            stroke_width: 1.0,
            overlay_width: 13.0,
        }
    }

    fn endpoint(x: f32, y: f32, above: f32, below: f32) -> Endpoint {
        Endpoint::new(Point::new(x, y), Clearance { above, below })
    }

    /// Body of the node owning an output anchor
    fn source_body(e: &Endpoint) -> Rect {
        let right = e.anchor.x - OVERHANG;
        Rect::new(
            Point::new(right - BODY_WIDTH, e.anchor.y - e.clearance.above),
            Size::new(BODY_WIDTH, e.clearance.above + e.clearance.below),
        )
    }

    /// Body of the node owning an input anchor
    fn target_body(e: &Endpoint) -> Rect {
        Rect::new(
            Point::new(e.anchor.x + OVERHANG, e.anchor.y - e.clearance.above),
            Size::new(BODY_WIDTH, e.clearance.above + e.clearance.below),
        )
    }

    fn strictly_inside(rect: &Rect, p: Point) -> bool {
        p.x > rect.left() && p.x < rect.right() && p.y > rect.top() && p.y < rect.bottom()
    }

    fn assert_avoids_bodies(path: &RoutedPath, start: &Endpoint, end: &Endpoint) {
        let bodies = [source_body(start), target_body(end)];
        for p in path.flatten() {
            for body in &bodies {
                assert!(!strictly_inside(body, p), "{p:?} crosses {body:?}");
            }
        }
    }

    #[test]
    fn test_forward_same_row() {
        let path = router().route(
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(100.0, 0.0)),
        );
        assert_eq!(path.regime, Regime::Forward);
        assert!(matches!(
            path.segments.as_slice(),
            [
                PathSegment::Horizontal(_),
                PathSegment::Curve { .. },
                PathSegment::Vertical(_),
                PathSegment::Curve { .. },
                PathSegment::Horizontal(_),
            ]
        ));
        assert!(path.waypoints().iter().all(|p| p.y == 0.0));
        assert_eq!(path.end(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_forward_two_bends() {
        let path = router().route(
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(200.0, 100.0)),
        );
        let points = path.waypoints();
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(88.0, 0.0),
                Point::new(100.0, 12.0),
                Point::new(100.0, 88.0),
                Point::new(112.0, 100.0),
                Point::new(200.0, 100.0),
            ]
        );
    }

    #[test]
    fn test_forward_curve_clamped_on_short_spans() {
        let path = router().route(
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(10.0, -6.0)),
        );
        let points = path.waypoints();
        // Radius limited to half of |dy| = 3, direction upwards
        assert_eq!(points[1], Point::new(2.0, 0.0));
        assert_eq!(points[2], Point::new(5.0, -3.0));
        assert_eq!(points[3], Point::new(5.0, -3.0));
        assert_eq!(points[4], Point::new(8.0, -6.0));
    }

    #[test]
    fn test_backward_clear_goes_between_bodies() {
        let start = endpoint(100.0, 0.0, 60.0, 36.0);
        let end = endpoint(0.0, 200.0, 60.0, 36.0);
        let path = router().route(&start, &end);
        assert_eq!(path.regime, Regime::BackwardClear);

        // Midline halfway between the source bottom (36) and the target top (140)
        let points = path.waypoints();
        assert_eq!(points[4], Point::new(112.0, 88.0));
        assert_eq!(points[5], Point::new(-12.0, 88.0));
        assert_eq!(path.end(), end.anchor);
        assert_avoids_bodies(&path, &start, &end);
    }

    #[test]
    fn test_backward_clear_going_up() {
        let start = endpoint(100.0, 300.0, 60.0, 36.0);
        let end = endpoint(0.0, 0.0, 60.0, 36.0);
        let path = router().route(&start, &end);
        assert_eq!(path.regime, Regime::BackwardClear);
        // Midline between target bottom (36) and source top (240)
        assert_eq!(path.waypoints()[4].y, 138.0);
        assert_avoids_bodies(&path, &start, &end);
    }

    #[test]
    fn test_backward_overlap_loops_over() {
        let start = endpoint(100.0, 0.0, 60.0, 300.0);
        let end = endpoint(0.0, 200.0, 60.0, 36.0);
        let path = router().route(&start, &end);
        assert_eq!(path.regime, Regime::BackwardOverlap);

        let top = path
            .waypoints()
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min);
        // One cell above the higher body top (-60)
        assert_eq!(top, -84.0);
        assert_eq!(path.end(), end.anchor);
        assert_avoids_bodies(&path, &start, &end);
    }

    #[test]
    fn test_regime_boundary_needs_one_cell_gap() {
        let r = router();
        // Bodies exactly two cells apart: clear
        let start = endpoint(100.0, 0.0, 12.0, 12.0);
        let end = endpoint(0.0, 72.0, 12.0, 12.0);
        assert_eq!(r.regime(&start, &end), Regime::BackwardClear);

        // One pixel closer: overlap
        let end = endpoint(0.0, 71.0, 12.0, 12.0);
        assert_eq!(r.regime(&start, &end), Regime::BackwardOverlap);
    }

    #[test]
    fn test_route_is_idempotent() {
        let r = router();
        let start = endpoint(300.0, 120.0, 60.0, 36.0);
        let end = endpoint(40.0, 130.0, 36.0, 60.0);
        assert_eq!(r.route(&start, &end), r.route(&start, &end));
    }

    #[test]
    fn test_svg_output() {
        let path = router().route(
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(100.0, 0.0)),
        );
        assert_eq!(path.to_svg(), "M 0 0 H 50 Q 50 0 50 0 V 0 Q 50 0 50 0 H 100");
    }

    #[test]
    fn test_distance_to_path() {
        let path = router().route(
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(100.0, 0.0)),
        );
        assert_eq!(path.distance_to(Point::new(30.0, 5.0)), 5.0);
        assert!(path.distance_to(Point::new(30.0, 50.0)) > 6.5);
    }
}
