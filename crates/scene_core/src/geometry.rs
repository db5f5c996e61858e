//! Thin adapter over the `geo` crate.
//!
//! Everything else in the crate goes through [`Footprint`] and the free
//! helpers here; no other module constructs `geo` types directly.

use geo::{
    Area, BooleanOps, Centroid, Coord, EuclideanDistance, Intersects, LineString, MultiPolygon,
    Point, Polygon, Relate, Rotate, Translate,
};

use crate::error::SceneError;

/// Planar extent of an entity: a point for extent-less things (drivers,
/// markers), a simple polygon for everything with a physical outline.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
}

/// The four sides of a rectangular footprint, as produced by
/// [`Footprint::split_boundaries`].
#[derive(Debug, Clone, PartialEq)]
pub struct RectBoundaries {
    pub left: LineString<f64>,
    pub right: LineString<f64>,
    pub front: LineString<f64>,
    pub back: LineString<f64>,
}

impl Footprint {
    pub fn point(x: f64, y: f64) -> Self {
        Footprint::Point(Point::new(x, y))
    }

    /// Axis-aligned rectangle centered at `(cx, cy)`. The corner ring starts
    /// on the right side of the longer axis so that [`split_boundaries`]
    /// assigns sides consistently.
    ///
    /// [`split_boundaries`]: Footprint::split_boundaries
    pub fn rect(cx: f64, cy: f64, length: f64, width: f64) -> Self {
        let (hl, hw) = (length / 2.0, width / 2.0);
        let ring = if length >= width {
            vec![
                (cx - hl, cy - hw),
                (cx + hl, cy - hw),
                (cx + hl, cy + hw),
                (cx - hl, cy + hw),
            ]
        } else {
            vec![
                (cx + hl, cy - hw),
                (cx + hl, cy + hw),
                (cx - hl, cy + hw),
                (cx - hl, cy - hw),
            ]
        };
        Footprint::Polygon(Polygon::new(LineString::from(ring), vec![]))
    }

    /// Rectangle rotated by `yaw_deg` (counter-clockwise) about its center.
    pub fn oriented_rect(cx: f64, cy: f64, length: f64, width: f64, yaw_deg: f64) -> Self {
        Footprint::rect(cx, cy, length, width).rotate_around(yaw_deg, Point::new(cx, cy))
    }

    pub fn centroid(&self) -> Point<f64> {
        match self {
            Footprint::Point(p) => *p,
            Footprint::Polygon(poly) => poly
                .centroid()
                .unwrap_or_else(|| first_exterior_point(poly)),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Footprint::Point(_) => 0.0,
            Footprint::Polygon(poly) => poly.unsigned_area(),
        }
    }

    pub fn distance(&self, other: &Footprint) -> f64 {
        match (self, other) {
            (Footprint::Point(a), Footprint::Point(b)) => a.euclidean_distance(b),
            (Footprint::Point(a), Footprint::Polygon(b)) => a.euclidean_distance(b),
            (Footprint::Polygon(a), Footprint::Point(b)) => a.euclidean_distance(b),
            (Footprint::Polygon(a), Footprint::Polygon(b)) => a.euclidean_distance(b),
        }
    }

    pub fn intersects(&self, other: &Footprint) -> bool {
        match (self, other) {
            (Footprint::Point(a), Footprint::Point(b)) => a.intersects(b),
            (Footprint::Point(a), Footprint::Polygon(b)) => a.intersects(b),
            (Footprint::Polygon(a), Footprint::Point(b)) => a.intersects(b),
            (Footprint::Polygon(a), Footprint::Polygon(b)) => a.intersects(b),
        }
    }

    pub fn disjoint(&self, other: &Footprint) -> bool {
        !self.intersects(other)
    }

    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.de9im(other, |m| m.is_overlaps(), |_, _| false)
    }

    pub fn touches(&self, other: &Footprint) -> bool {
        self.de9im(other, |m| m.is_touches(), |_, _| false)
    }

    pub fn crosses(&self, other: &Footprint) -> bool {
        self.de9im(other, |m| m.is_crosses(), |_, _| false)
    }

    pub fn within(&self, other: &Footprint) -> bool {
        self.de9im(other, |m| m.is_within(), |a, b| a == b)
    }

    pub fn contains(&self, other: &Footprint) -> bool {
        self.de9im(other, |m| m.is_contains(), |a, b| a == b)
    }

    /// DE-9IM predicate dispatch; point-point pairs have a trivial matrix and
    /// are answered by `point_case` directly.
    fn de9im<F, P>(&self, other: &Footprint, pred: F, point_case: P) -> bool
    where
        F: Fn(&geo::relate::IntersectionMatrix) -> bool,
        P: Fn(&Point<f64>, &Point<f64>) -> bool,
    {
        match (self, other) {
            (Footprint::Point(a), Footprint::Point(b)) => point_case(a, b),
            (Footprint::Point(a), Footprint::Polygon(b)) => pred(&a.relate(b)),
            (Footprint::Polygon(a), Footprint::Point(b)) => pred(&a.relate(b)),
            (Footprint::Polygon(a), Footprint::Polygon(b)) => pred(&a.relate(b)),
        }
    }

    /// Centroid of the positive-area overlap region, if any. Pairs involving
    /// a point footprint never overlap with positive area.
    pub fn overlap_centroid(&self, other: &Footprint) -> Option<Point<f64>> {
        match (self, other) {
            (Footprint::Polygon(a), Footprint::Polygon(b)) => {
                let region = a.intersection(b);
                if region.unsigned_area() > 0.0 {
                    region.centroid()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Polygonal content as a multi-polygon; point footprints are empty.
    pub fn to_multi(&self) -> MultiPolygon<f64> {
        match self {
            Footprint::Point(_) => MultiPolygon::new(vec![]),
            Footprint::Polygon(poly) => MultiPolygon::new(vec![poly.clone()]),
        }
    }

    pub fn rotate_around(&self, degrees: f64, pivot: Point<f64>) -> Self {
        match self {
            Footprint::Point(p) => Footprint::Point(p.rotate_around_point(degrees, pivot)),
            Footprint::Polygon(poly) => {
                Footprint::Polygon(poly.rotate_around_point(degrees, pivot))
            }
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        match self {
            Footprint::Point(p) => Footprint::Point(p.translate(dx, dy)),
            Footprint::Polygon(poly) => Footprint::Polygon(poly.translate(dx, dy)),
        }
    }

    /// Splits a rectangular-ish polygon into its left, right, front, and back
    /// sides. The ring (closing coordinate dropped) must hold an even number
    /// of at least four points with the same count on each long side and
    /// two-point ends: the right side runs over the first half, the front
    /// joins the two halves, the left side is the reversed second half, and
    /// the back connects the ring's first and last points.
    pub fn split_boundaries(&self) -> Result<RectBoundaries, SceneError> {
        let ring = match self {
            Footprint::Polygon(poly) => {
                let coords = &poly.exterior().0;
                // closed ring repeats the first coordinate at the end
                coords[..coords.len().saturating_sub(1)].to_vec()
            }
            Footprint::Point(_) => {
                return Err(SceneError::InvalidGeometry {
                    reason: "cannot split a point footprint into boundaries".into(),
                })
            }
        };
        if ring.len() < 4 || ring.len() % 2 != 0 {
            return Err(SceneError::InvalidGeometry {
                reason: format!(
                    "boundary split needs an even ring of at least 4 points, got {}",
                    ring.len()
                ),
            });
        }
        let half = ring.len() / 2;
        let right = LineString::new(ring[..half].to_vec());
        let front = LineString::new(vec![ring[half - 1], ring[half]]);
        let left = LineString::new(ring[half..].iter().rev().copied().collect());
        let back = LineString::new(vec![ring[0], ring[ring.len() - 1]]);
        Ok(RectBoundaries {
            left,
            right,
            front,
            back,
        })
    }

    /// First boundary point whose bearing from the centroid, relative to
    /// `yaw`, falls inside `[lo, hi)` degrees; the centroid itself when no
    /// point qualifies (point footprints, degenerate rings). The quadrants
    /// `[270,360)`, `[0,90)`, `[180,270)`, `[90,180)` select the left-front,
    /// right-front, left-back, and right-back corners of a rectangle.
    pub fn corner_toward(&self, yaw: f64, lo: f64, hi: f64) -> Point<f64> {
        let centroid = self.centroid();
        self.boundary_coords()
            .iter()
            .map(|c| Point::new(c.x, c.y))
            .find(|p| {
                let angle = relative_bearing_deg(yaw, centroid, *p);
                angle >= lo && angle < hi
            })
            .unwrap_or(centroid)
    }

    /// Exterior ring coordinates without the closing duplicate; a point
    /// footprint yields its single coordinate.
    pub fn boundary_coords(&self) -> Vec<Coord<f64>> {
        match self {
            Footprint::Point(p) => vec![p.0],
            Footprint::Polygon(poly) => {
                let coords = &poly.exterior().0;
                coords[..coords.len().saturating_sub(1)].to_vec()
            }
        }
    }
}

fn first_exterior_point(poly: &Polygon<f64>) -> Point<f64> {
    poly.exterior()
        .0
        .first()
        .map(|c| Point::new(c.x, c.y))
        .unwrap_or_else(|| Point::new(0.0, 0.0))
}

/// Circle approximated by sampling every `step_deg` degrees.
pub fn disc(center: Point<f64>, radius: f64, step_deg: f64) -> Polygon<f64> {
    let step = step_deg.max(0.1);
    let mut ring = Vec::with_capacity((360.0 / step) as usize + 1);
    let mut angle: f64 = 0.0;
    while angle < 360.0 {
        let rad = angle.to_radians();
        ring.push(Coord {
            x: center.x() + radius * rad.cos(),
            y: center.y() + radius * rad.sin(),
        });
        angle += step;
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Bearing of `to` as seen from `from`, in degrees within `[0, 360)`,
/// measured counter-clockwise from the positive x axis.
pub fn bearing_deg(from: Point<f64>, to: Point<f64>) -> f64 {
    (to.y() - from.y())
        .atan2(to.x() - from.x())
        .to_degrees()
        .rem_euclid(360.0)
}

/// Bearing of `to` from `from` relative to a heading of `yaw_deg`, in
/// `[0, 360)`. Zero means dead ahead.
pub fn relative_bearing_deg(yaw_deg: f64, from: Point<f64>, to: Point<f64>) -> f64 {
    (bearing_deg(from, to) - yaw_deg).rem_euclid(360.0)
}

/// Unit direction vector for a heading in degrees.
pub fn heading_vec(yaw_deg: f64) -> (f64, f64) {
    let rad = yaw_deg.to_radians();
    (rad.cos(), rad.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rect_centroid_and_area() {
        let fp = Footprint::rect(5.0, 10.0, 4.0, 2.0);
        let c = fp.centroid();
        assert_relative_eq!(c.x(), 5.0);
        assert_relative_eq!(c.y(), 10.0);
        assert_relative_eq!(fp.area(), 8.0);
    }

    #[test]
    fn oriented_rect_keeps_center_and_area() {
        let fp = Footprint::oriented_rect(1.0, 2.0, 4.0, 2.0, 37.0);
        let c = fp.centroid();
        assert_relative_eq!(c.x(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.y(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(fp.area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn distance_between_separated_rects() {
        let a = Footprint::rect(0.0, 0.0, 2.0, 2.0);
        let b = Footprint::rect(5.0, 0.0, 2.0, 2.0);
        assert_relative_eq!(a.distance(&b), 3.0);
        assert!(a.disjoint(&b));
    }

    #[test]
    fn overlap_centroid_of_crossing_rects() {
        let a = Footprint::rect(0.0, 0.0, 4.0, 4.0);
        let b = Footprint::rect(2.0, 2.0, 4.0, 4.0);
        let c = a.overlap_centroid(&b).expect("rects overlap");
        assert_relative_eq!(c.x(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.y(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn overlap_centroid_absent_for_point_pairs() {
        let a = Footprint::point(1.0, 1.0);
        let b = Footprint::rect(1.0, 1.0, 2.0, 2.0);
        assert!(a.overlap_centroid(&b).is_none());
        assert!(a.intersects(&b));
    }

    #[test]
    fn topological_predicates() {
        let outer = Footprint::rect(0.0, 0.0, 10.0, 10.0);
        let inner = Footprint::rect(0.0, 0.0, 2.0, 2.0);
        let shifted = Footprint::rect(9.0, 0.0, 10.0, 10.0);
        assert!(inner.within(&outer));
        assert!(outer.contains(&inner));
        assert!(outer.overlaps(&shifted));
        assert!(!outer.overlaps(&inner));
    }

    #[test]
    fn split_boundaries_of_a_rect() {
        let fp = Footprint::rect(0.0, 0.0, 4.0, 2.0);
        let sides = fp.split_boundaries().expect("even ring");
        assert_eq!(sides.right.0.len(), 2);
        assert_eq!(sides.front.0.len(), 2);
        // right side of an x-aligned rect lies below the centroid
        assert!(sides.right.0.iter().all(|c| c.y < 0.0));
        assert!(sides.left.0.iter().all(|c| c.y > 0.0));
        assert!(sides.front.0.iter().all(|c| c.x > 0.0));
        assert!(sides.back.0.iter().all(|c| c.x < 0.0));
    }

    #[test]
    fn split_boundaries_rejects_points() {
        let fp = Footprint::point(0.0, 0.0);
        assert!(matches!(
            fp.split_boundaries(),
            Err(SceneError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn bearing_quadrants() {
        let o = Point::new(0.0, 0.0);
        assert_relative_eq!(bearing_deg(o, Point::new(1.0, 0.0)), 0.0);
        assert_relative_eq!(bearing_deg(o, Point::new(0.0, 1.0)), 90.0);
        assert_relative_eq!(bearing_deg(o, Point::new(-1.0, 0.0)), 180.0);
        assert_relative_eq!(bearing_deg(o, Point::new(0.0, -1.0)), 270.0);
    }

    #[test]
    fn relative_bearing_subtracts_heading() {
        let o = Point::new(0.0, 0.0);
        let t = Point::new(0.0, 1.0);
        assert_relative_eq!(relative_bearing_deg(90.0, o, t), 0.0);
        assert_relative_eq!(relative_bearing_deg(180.0, o, t), 270.0);
    }

    #[test]
    fn disc_area_approaches_circle() {
        let d = disc(Point::new(0.0, 0.0), 10.0, 1.0);
        let expected = std::f64::consts::PI * 100.0;
        assert!((d.unsigned_area() - expected).abs() / expected < 0.01);
    }
}
