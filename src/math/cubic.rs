/// A cubic polynomial in `x - x0`, used to ease a car sideways during a lane change.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CubicFn {
    /// Coefficients from the constant term upwards.
    terms: [f64; 4],
    x0: f64,
}

impl CubicFn {
    /// The Hermite cubic through `(x1, y1)` and `(x2, y2)`,
    /// with slopes `m1` and `m2` at those points.
    pub fn fit(x1: f64, y1: f64, m1: f64, x2: f64, y2: f64, m2: f64) -> Self {
        let w = x2 - x1;
        let rise = y2 - y1;
        let quad = (3.0 * rise / w - 2.0 * m1 - m2) / w;
        let cube = (m1 + m2 - 2.0 * rise / w) / (w * w);
        Self {
            terms: [y1, m1, quad, cube],
            x0: x1,
        }
    }

    /// A cubic which is flat at both ends, moving from `y1` at `x1` to `y2` at `x2`.
    pub fn ease(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::fit(x1, y1, 0.0, x2, y2, 0.0)
    }

    pub fn y(&self, x: f64) -> f64 {
        self.y_and_dy(x).0
    }

    /// The value and slope at `x`.
    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        let [c0, c1, c2, c3] = self.terms;
        let t = x - self.x0;
        let y = c0 + t * (c1 + t * (c2 + t * c3));
        let dy = c1 + t * (2.0 * c2 + t * 3.0 * c3);
        (y, dy)
    }
}
