use super::{Point2d, Segment};
use cgmath::prelude::*;

/// Below this ratio of horizontal run to length, a line is treated as vertical.
const VERTICAL_EPSILON: f64 = 1e-9;

/// Slopes closer than this (relative to their magnitude) are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// An infinite line in slope-intercept form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Line {
    /// The line `x = x`.
    Vertical { x: f64 },
    /// The line `y = slope * x + intercept`.
    Sloped { slope: f64, intercept: f64 },
}

impl Line {
    /// The line through two points, or `None` if the points coincide.
    pub fn through(a: Point2d, b: Point2d) -> Option<Line> {
        let len = a.distance(b);
        if len <= f64::EPSILON {
            return None;
        }
        let dx = b.x - a.x;
        if dx.abs() <= VERTICAL_EPSILON * len {
            return Some(Line::Vertical { x: a.x });
        }
        let slope = (b.y - a.y) / dx;
        Some(Line::Sloped {
            slope,
            intercept: a.y - slope * a.x,
        })
    }

    /// The line through `point` at right angles to this one.
    pub fn perpendicular_through(&self, point: Point2d) -> Line {
        match *self {
            Line::Vertical { .. } => Line::Sloped {
                slope: 0.0,
                intercept: point.y,
            },
            Line::Sloped { slope, .. } if slope.abs() <= VERTICAL_EPSILON => {
                Line::Vertical { x: point.x }
            }
            Line::Sloped { slope, .. } => {
                let slope = -1.0 / slope;
                Line::Sloped {
                    slope,
                    intercept: point.y - slope * point.x,
                }
            }
        }
    }

    /// The point where two lines cross. Parallel (or nearly parallel) lines have no solution.
    pub fn intersect(&self, other: &Line) -> Option<Point2d> {
        use Line::*;
        let point = match (*self, *other) {
            (Vertical { .. }, Vertical { .. }) => return None,
            (Vertical { x }, Sloped { slope, intercept })
            | (Sloped { slope, intercept }, Vertical { x }) => {
                Point2d::new(x, slope * x + intercept)
            }
            (
                Sloped {
                    slope: m1,
                    intercept: k1,
                },
                Sloped {
                    slope: m2,
                    intercept: k2,
                },
            ) => {
                let scale = 1.0 + f64::max(m1.abs(), m2.abs());
                if (m1 - m2).abs() <= PARALLEL_EPSILON * scale {
                    return None;
                }
                let x = (k2 - k1) / (m1 - m2);
                Point2d::new(x, m1 * x + k1)
            }
        };
        (point.x.is_finite() && point.y.is_finite()).then_some(point)
    }
}

/// Carries `point`, which lies on (or near) `from`, across to the line through `onto`
/// along the perpendicular of `from`.
pub fn project_across(point: Point2d, from: &Segment, onto: &Segment) -> Option<Point2d> {
    let normal = from.line()?.perpendicular_through(point);
    normal.intersect(&onto.line()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point2d::new(x1, y1), Point2d::new(x2, y2))
    }

    #[test]
    fn degenerate_segment_has_no_line() {
        assert_eq!(seg(1.0, 1.0, 1.0, 1.0).line(), None);
    }

    #[test]
    fn vertical_line() {
        assert_eq!(seg(3.0, 0.0, 3.0, 8.0).line(), Some(Line::Vertical { x: 3.0 }));
    }

    #[test]
    fn horizontal_lanes() {
        let from = seg(0.0, 0.0, 10.0, 0.0);
        let onto = seg(0.0, 3.5, 10.0, 3.5);
        let p = project_across(Point2d::new(4.0, 0.0), &from, &onto).unwrap();
        assert_approx_eq!(p.x, 4.0);
        assert_approx_eq!(p.y, 3.5);
    }

    #[test]
    fn vertical_lanes() {
        let from = seg(0.0, 0.0, 0.0, 10.0);
        let onto = seg(-3.5, 0.0, -3.5, 10.0);
        let p = project_across(Point2d::new(0.0, 6.0), &from, &onto).unwrap();
        assert_approx_eq!(p.x, -3.5);
        assert_approx_eq!(p.y, 6.0);
    }

    #[test]
    fn diagonal_lanes() {
        let from = seg(0.0, 0.0, 10.0, 10.0);
        let onto = seg(0.0, 2.0, 10.0, 12.0);
        let p = project_across(Point2d::new(5.0, 5.0), &from, &onto).unwrap();
        assert_approx_eq!(p.x, 4.0);
        assert_approx_eq!(p.y, 6.0);
    }

    #[test]
    fn perpendicular_target() {
        // The normal of a horizontal lane is vertical and meets a sloped lane.
        let from = seg(0.0, 0.0, 10.0, 0.0);
        let onto = seg(0.0, 1.0, 10.0, 6.0);
        let p = project_across(Point2d::new(4.0, 0.0), &from, &onto).unwrap();
        assert_approx_eq!(p.x, 4.0);
        assert_approx_eq!(p.y, 3.0);
    }

    #[test]
    fn target_parallel_to_normal_has_no_solution() {
        let from = seg(0.0, 0.0, 10.0, 0.0);
        let onto = seg(5.0, 1.0, 5.0, 9.0);
        assert_eq!(project_across(Point2d::new(4.0, 0.0), &from, &onto), None);

        let from = seg(0.0, 0.0, 10.0, 10.0);
        let onto = seg(0.0, 10.0, 10.0, 0.0);
        assert_eq!(project_across(Point2d::new(4.0, 4.0), &from, &onto), None);
    }

    #[test]
    fn nearly_vertical_is_vertical() {
        let line = Line::through(Point2d::new(1.0, 0.0), Point2d::new(1.0 + 1e-12, 100.0));
        assert_eq!(line, Some(Line::Vertical { x: 1.0 }));
    }

    #[test]
    fn nearly_parallel_has_no_solution() {
        let a = Line::Sloped {
            slope: 2.0,
            intercept: 0.0,
        };
        let b = Line::Sloped {
            slope: 2.0 + 1e-12,
            intercept: 5.0,
        };
        assert_eq!(a.intersect(&b), None);
    }
}
