use self::kinematics::{Limits, Motion};
use crate::math::CubicFn;
use crate::{CarId, LaneId, RoadId};
pub use state::CarState;

pub(crate) mod kinematics;
mod state;

/// The distance over which a car eases across into its new lane, in m.
pub(crate) const LANE_CHANGE_LENGTH: f64 = 20.0;

/// A simulated car.
#[derive(Clone, Debug)]
pub struct Car {
    /// The car's ID.
    id: CarId,
    /// The car's own limits.
    attributes: CarAttributes,
    /// The road sections the car travels along, in order.
    path: Vec<RoadId>,
    /// The index into `path` of the road the car is on.
    leg: usize,
    /// The lane the car is in.
    lane: LaneId,
    /// The index of the lane segment the car is on.
    segment: usize,
    /// The distance travelled along the current segment, in m.
    offset: f64,
    /// The speed in m/tick.
    speed: f64,
    /// The change of speed over the last tick, in m/tick<sup>2</sup>.
    acc: f64,
    /// The negotiation flags.
    state: CarState,
    /// The in-progress lane change, if there is one.
    lane_change: Option<LaneChange>,
    /// The car this one is letting in, while yielding.
    yield_to: Option<CarId>,
    /// The number of ticks the car has completed; equal to the simulation
    /// tick plus one once the car has moved in the current tick.
    iteration: u64,
}

/// The attributes of a simulated car.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarAttributes {
    /// The car's top speed in m/tick.
    pub max_speed: f64,
    /// The most the car's speed can change in one tick, in m/tick<sup>2</sup>.
    pub max_speed_change: f64,
}

/// Represents an in-progress lane change.
#[derive(Clone, Copy, Debug)]
pub struct LaneChange {
    /// The longitudinal position at which the lane change is complete.
    pub end_pos: f64,
    /// The car's lateral offset from the lane's centre line during the lane change.
    pub offset: CubicFn,
}

impl Car {
    /// Creates a new car at the start of its path.
    pub(crate) fn new(
        id: CarId,
        attributes: &CarAttributes,
        path: Vec<RoadId>,
        lane: LaneId,
        iteration: u64,
    ) -> Self {
        Self {
            id,
            attributes: *attributes,
            path,
            leg: 0,
            lane,
            segment: 0,
            offset: 0.0,
            speed: 0.0,
            acc: 0.0,
            state: CarState::default(),
            lane_change: None,
            yield_to: None,
            iteration,
        }
    }

    /// Gets the car's ID.
    pub fn id(&self) -> CarId {
        self.id
    }

    /// The car's own limits.
    pub fn attributes(&self) -> &CarAttributes {
        &self.attributes
    }

    /// The road sections the car travels along.
    pub fn path(&self) -> &[RoadId] {
        &self.path
    }

    /// The index into [Car::path] of the road the car is on.
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// The road the car is on.
    pub fn road(&self) -> RoadId {
        self.path[self.leg]
    }

    /// The road the car will move onto next, if its path continues.
    pub fn next_road(&self) -> Option<RoadId> {
        self.path.get(self.leg + 1).copied()
    }

    /// The lane the car is in.
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// The index of the lane segment the car is on.
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// The distance travelled along the current segment, in m.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The speed in m/tick.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The change of speed over the last tick.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// The negotiation flags.
    pub fn state(&self) -> CarState {
        self.state
    }

    /// The car this one is letting in, while yielding.
    pub fn yield_to(&self) -> Option<CarId> {
        self.yield_to
    }

    /// The in-progress lane change, if there is one.
    pub fn lane_change(&self) -> Option<&LaneChange> {
        self.lane_change.as_ref()
    }

    /// The car's iteration counter.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Whether the car has already moved during simulation tick `tick`.
    pub fn has_moved(&self, tick: u64) -> bool {
        self.iteration == tick + 1
    }

    /// The car's lateral offset from the centre line at `pos`.
    pub fn lateral_offset(&self, pos: f64) -> (f64, f64) {
        self.lane_change
            .filter(|lc| lc.end_pos > pos)
            .map(|lc| lc.offset.y_and_dy(pos))
            .unwrap_or((0.0, 0.0))
    }

    /// The car's longitudinal state, given its position along the lane.
    pub(crate) fn motion(&self, pos: f64) -> Motion {
        Motion {
            pos,
            speed: self.speed,
            acc: self.acc,
        }
    }

    /// The car's limits on the given road.
    pub(crate) fn limits(&self, road_max_speed: f64) -> Limits {
        Limits {
            speed_cap: f64::min(self.attributes.max_speed, road_max_speed),
            max_change: self.attributes.max_speed_change,
        }
    }

    pub(crate) fn state_mut(&mut self) -> &mut CarState {
        &mut self.state
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Records the result of moving for one tick.
    pub(crate) fn apply_motion(&mut self, motion: &Motion, tick: u64) {
        self.speed = motion.speed;
        self.acc = motion.acc;
        self.iteration = tick + 1;
    }

    /// Places the car on a lane.
    pub(crate) fn set_location(&mut self, lane: LaneId, leg: usize, segment: usize, offset: f64) {
        if lane != self.lane {
            self.lane_change = None;
        }
        self.lane = lane;
        self.leg = leg;
        self.segment = segment;
        self.offset = offset;
    }

    pub(crate) fn begin_lane_change(&mut self, lane_change: LaneChange) {
        self.lane_change = Some(lane_change);
        self.state.changing_lane = true;
    }

    pub(crate) fn finish_lane_change(&mut self) {
        self.lane_change = None;
        self.state.changing_lane = false;
    }

    pub(crate) fn start_yielding(&mut self, to: CarId) {
        self.yield_to = Some(to);
        self.state.yielding = true;
    }

    pub(crate) fn stop_yielding(&mut self) {
        self.yield_to = None;
        self.state.yielding = false;
    }
}
