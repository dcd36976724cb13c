use super::{direction, rot90, Line, Point2d, Vector2d};
use cgmath::prelude::*;

/// A straight line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start: Point2d,
    pub end: Point2d,
}

impl Segment {
    /// Creates a segment from its end points.
    pub const fn new(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }

    /// The length of the segment.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// A unit vector pointing from `start` to `end`.
    pub fn direction(&self) -> Vector2d {
        direction(self.start, self.end)
    }

    /// The point at `ratio` of the way from `start` to `end`.
    pub fn lerp(&self, ratio: f64) -> Point2d {
        self.start + (self.end - self.start) * ratio
    }

    /// The point half way along the segment.
    pub fn midpoint(&self) -> Point2d {
        self.lerp(0.5)
    }

    /// Splits the segment in two at `ratio`.
    pub fn split(&self, ratio: f64) -> [Segment; 2] {
        let mid = self.lerp(ratio);
        [Segment::new(self.start, mid), Segment::new(mid, self.end)]
    }

    /// Translates the segment sideways by `dist`; positive values move it to the left.
    pub fn offset(&self, dist: f64) -> Segment {
        let delta = rot90(self.direction()) * dist;
        Segment::new(self.start + delta, self.end + delta)
    }

    /// The distance from `start` of the orthogonal projection of `point`,
    /// clamped to the segment.
    pub fn project_distance(&self, point: Point2d) -> f64 {
        let dist = (point - self.start).dot(self.direction());
        dist.clamp(0.0, self.length())
    }

    /// The infinite line through the segment, or `None` if the segment is degenerate.
    pub fn line(&self) -> Option<Line> {
        Line::through(self.start, self.end)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn length_and_midpoint() {
        let seg = Segment::new(Point2d::new(1.0, 1.0), Point2d::new(4.0, 5.0));
        assert_approx_eq!(seg.length(), 5.0);
        assert_eq!(seg.midpoint(), Point2d::new(2.5, 3.0));
    }

    #[test]
    fn split_at_ratio() {
        let seg = Segment::new(Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0));
        let [a, b] = seg.split(0.3);
        assert_approx_eq!(a.length(), 3.0);
        assert_approx_eq!(b.length(), 7.0);
        assert_eq!(a.end, b.start);
    }

    #[test]
    fn offset_is_to_the_left() {
        let seg = Segment::new(Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0));
        let left = seg.offset(2.0);
        assert_approx_eq!(left.start.y, 2.0);
        assert_approx_eq!(left.end.y, 2.0);
        assert_approx_eq!(left.length(), 10.0);
    }

    #[test]
    fn projected_distance_is_clamped() {
        let seg = Segment::new(Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0));
        assert_approx_eq!(seg.project_distance(Point2d::new(4.0, 3.0)), 4.0);
        assert_approx_eq!(seg.project_distance(Point2d::new(-4.0, 3.0)), 0.0);
        assert_approx_eq!(seg.project_distance(Point2d::new(14.0, 3.0)), 10.0);
    }
}
