//! The car following and stopping model.
//!
//! Everything here is a pure function of a car's [Motion], which lets a car
//! predict where the car ahead of it will be at the end of the tick without
//! touching the rest of the world.

/// The closest two cars may be, centre to centre, in m.
pub const JAM_GAP: f64 = 6.0;

/// The desired time gap to the car ahead, in ticks.
pub const HEADWAY: f64 = 2.0;

/// Cars slower than this, in m/tick, count as stopped.
pub const STOPPED_SPEED: f64 = 0.01;

/// A car closer than this to its stop line, in m, is at the line.
const STOP_EPSILON: f64 = 1e-9;

/// Stopped cars further than this from a stop line creep towards it, in m.
const CREEP_DISTANCE: f64 = 0.5;

/// A car's longitudinal state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// The position along the lane, in m.
    pub pos: f64,
    /// The speed, in m/tick.
    pub speed: f64,
    /// The change in speed over the last tick, in m/tick<sup>2</sup>.
    pub acc: f64,
}

/// The bounds within which a car may change its speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// The lesser of the car's and the road's maximum speed.
    pub speed_cap: f64,
    /// The largest change in speed per tick.
    pub max_change: f64,
}

impl Motion {
    /// Applies `acc` for one tick.
    ///
    /// The new speed is clamped to `[0, speed_cap]` and the distance travelled
    /// (the mean of the old and new speeds) never carries the car past `barrier`.
    pub fn step(self, acc: f64, speed_cap: f64, barrier: Option<f64>) -> Motion {
        let mut speed = (self.speed + acc).clamp(0.0, speed_cap.max(0.0));
        let mut advance = 0.5 * (self.speed + speed);
        if let Some(barrier) = barrier {
            let room = f64::max(barrier - self.pos, 0.0);
            if advance > room {
                advance = room;
                speed = speed.min(room);
            }
        }
        Motion {
            pos: self.pos + advance,
            speed,
            acc: speed - self.speed,
        }
    }
}

/// The distance needed to stop from `speed` when decelerating at `decel`.
pub fn braking_distance(speed: f64, decel: f64) -> f64 {
    speed * speed / (2.0 * decel)
}

/// The acceleration towards the speed cap with nothing in the way.
pub fn free_acc(speed: f64, limits: Limits) -> f64 {
    (limits.speed_cap - speed).clamp(-limits.max_change, limits.max_change)
}

/// The acceleration for a car `dist` from a line it has to stop at.
/// Returns the acceleration and whether the car is braking for the line.
///
/// The car keeps accelerating for as long as it could still stop at full
/// braking afterwards. Otherwise it follows `a = -v^2 / 2d`, which brings it
/// to rest exactly on the line.
pub fn stop_line_acc(speed: f64, dist: f64, limits: Limits) -> (f64, bool) {
    let acc = free_acc(speed, limits);
    let next = f64::max(speed + acc, 0.0);
    let rest = dist - 0.5 * (speed + next);
    if rest > 0.0 && braking_distance(next, limits.max_change) <= rest {
        return (acc, false);
    }
    if dist <= STOP_EPSILON {
        return (-speed, speed > 0.0);
    }
    if speed <= STOPPED_SPEED && dist > CREEP_DISTANCE {
        return (f64::min(limits.max_change, dist), false);
    }
    (-speed * speed / (2.0 * dist), true)
}

/// The gap a car tries to keep to the car ahead, given its speed and the lane's length.
pub fn desired_gap(speed: f64, lane_length: f64) -> f64 {
    let cap = f64::max(JAM_GAP, 0.5 * lane_length);
    f64::min(JAM_GAP + HEADWAY * speed, cap)
}

/// The acceleration for following a car which will be `gap` ahead at the end of the tick.
pub fn follow_acc(speed: f64, gap: f64, desired: f64, limits: Limits) -> f64 {
    let room = f64::max(gap - desired, 0.0);
    let target = (2.0 * limits.max_change * room).sqrt().min(limits.speed_cap);
    (target - speed).clamp(-limits.max_change, limits.max_change)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const LIMITS: Limits = Limits {
        speed_cap: 1.5,
        max_change: 0.2,
    };

    #[test]
    fn free_acceleration_respects_the_cap() {
        assert_approx_eq!(free_acc(0.0, LIMITS), 0.2);
        assert_approx_eq!(free_acc(1.4, LIMITS), 0.1);
        assert_approx_eq!(free_acc(2.0, LIMITS), -0.2);
    }

    #[test]
    fn step_never_reverses() {
        let motion = Motion {
            pos: 10.0,
            speed: 0.3,
            acc: 0.0,
        };
        let next = motion.step(-1.0, 1.5, None);
        assert_eq!(next.speed, 0.0);
        assert_approx_eq!(next.pos, 10.15);
        assert_approx_eq!(next.acc, -0.3);
    }

    #[test]
    fn step_stops_at_barrier() {
        let motion = Motion {
            pos: 10.0,
            speed: 1.0,
            acc: 0.0,
        };
        let next = motion.step(0.2, 1.5, Some(10.5));
        assert_approx_eq!(next.pos, 10.5);
        assert!(next.speed <= 0.5);
    }

    #[test]
    fn far_from_the_line_keeps_accelerating() {
        let (acc, braking) = stop_line_acc(1.0, 100.0, LIMITS);
        assert_approx_eq!(acc, 0.2);
        assert!(!braking);
    }

    #[test]
    fn braking_profile() {
        let (acc, braking) = stop_line_acc(1.0, 4.0, LIMITS);
        assert_approx_eq!(acc, -0.125);
        assert!(braking);
    }

    #[test]
    fn braking_stops_exactly_on_the_line() {
        let line = 40.0;
        let mut motion = Motion {
            pos: 0.0,
            speed: 1.5,
            acc: 0.0,
        };
        for _ in 0..500 {
            let (acc, _) = stop_line_acc(motion.speed, line - motion.pos, LIMITS);
            motion = motion.step(acc, LIMITS.speed_cap, Some(line));
            assert!(motion.pos <= line + 1e-9);
            assert!(motion.speed >= 0.0);
        }
        assert_approx_eq!(motion.pos, line, 1e-6);
        assert_eq!(motion.speed, 0.0);
    }

    #[test]
    fn following_slows_down_when_close() {
        let far = follow_acc(1.0, 100.0, desired_gap(1.0, 200.0), LIMITS);
        let near = follow_acc(1.0, 8.0, desired_gap(1.0, 200.0), LIMITS);
        assert_approx_eq!(far, 0.2);
        assert_approx_eq!(near, -0.2);
    }

    #[test]
    fn desired_gap_shrinks_on_short_lanes() {
        assert_approx_eq!(desired_gap(1.0, 200.0), JAM_GAP + HEADWAY);
        assert_approx_eq!(desired_gap(5.0, 20.0), 10.0);
        assert_approx_eq!(desired_gap(5.0, 4.0), JAM_GAP);
    }
}
