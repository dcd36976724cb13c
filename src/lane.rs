use crate::math::{Point2d, Segment, Vector2d};
use crate::util::Interval;
use crate::{Car, CarId, CarSet, JunctionId, LaneId, LightSet, RoadId, TrafficLightId};
use std::collections::VecDeque;

/// A single lane of traffic: a polyline centre line and the cars travelling along it.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// The road section the lane belongs to.
    road: RoadId,
    /// The index of the lane within its road, counted from the left.
    index: usize,
    /// The parts of the centre line, in the direction of travel.
    segments: Vec<Segment>,
    /// The distance from the start of the lane to the start of each segment.
    starts: Vec<f64>,
    /// The length of the lane in m.
    length: f64,
    /// The cars on the lane, front to back.
    cars: VecDeque<CarId>,
    /// The traffic light gating the end of the lane.
    light: Option<TrafficLightId>,
    /// The lanes that succeed this one.
    goes_to: Vec<LaneId>,
    /// The lanes that precede this one.
    comes_from: Vec<LaneId>,
    /// The junction this lane leaves from.
    upstream: Option<JunctionId>,
}

impl Lane {
    /// Creates a new lane from its centre line.
    pub(crate) fn new(id: LaneId, road: RoadId, index: usize, segments: Vec<Segment>) -> Self {
        let mut starts = Vec::with_capacity(segments.len());
        let mut length = 0.0;
        for segment in &segments {
            starts.push(length);
            length += segment.length();
        }
        Self {
            id,
            road,
            index,
            segments,
            starts,
            length,
            cars: VecDeque::new(),
            light: None,
            goes_to: vec![],
            comes_from: vec![],
            upstream: None,
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// The road section the lane belongs to.
    pub fn road(&self) -> RoadId {
        self.road
    }

    /// The index of the lane within its road, counted from the left.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Gets the length of the lane in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The parts of the lane's centre line.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The distance from the start of the lane to the start of the given segment.
    pub fn segment_start(&self, segment: usize) -> f64 {
        self.starts[segment]
    }

    /// The traffic light at the end of the lane, if there is one.
    pub fn light(&self) -> Option<TrafficLightId> {
        self.light
    }

    /// The lanes this lane feeds into.
    pub fn goes_to(&self) -> &[LaneId] {
        &self.goes_to
    }

    /// The lanes that feed into this one.
    pub fn comes_from(&self) -> &[LaneId] {
        &self.comes_from
    }

    /// The junction this lane leaves from.
    pub fn upstream(&self) -> Option<JunctionId> {
        self.upstream
    }

    /// Whether cars may currently leave the end of the lane.
    pub fn permits_exit(&self, lights: &LightSet) -> bool {
        self.light.map_or(true, |id| lights[id].can_pass())
    }

    /// Finds the segment containing the longitudinal position `pos`,
    /// returning its index and the offset within it.
    pub fn locate(&self, pos: f64) -> (usize, f64) {
        let idx = self
            .starts
            .iter()
            .rposition(|start| *start <= pos)
            .unwrap_or(0);
        let offset = (pos - self.starts[idx]).clamp(0.0, self.segments[idx].length());
        (idx, offset)
    }

    /// Samples the centre line at `pos`, returning the point and the direction of travel.
    pub fn sample(&self, pos: f64) -> (Point2d, Vector2d) {
        let (idx, offset) = self.locate(pos);
        let segment = &self.segments[idx];
        let len = segment.length();
        let ratio = if len > 0.0 { offset / len } else { 0.0 };
        (segment.lerp(ratio), segment.direction())
    }

    /// The longitudinal position of a car on this lane.
    pub fn position_of(&self, car: &Car) -> f64 {
        self.starts[car.segment()] + car.offset()
    }

    /// The cars on the lane, from the front of the queue to the back.
    pub fn cars(&self) -> impl DoubleEndedIterator<Item = CarId> + ExactSizeIterator + '_ {
        self.cars.iter().copied()
    }

    /// The number of cars on the lane.
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// The car closest to the end of the lane.
    pub fn first_car(&self) -> Option<CarId> {
        self.cars.front().copied()
    }

    /// The car closest to the start of the lane.
    pub fn last_car(&self) -> Option<CarId> {
        self.cars.back().copied()
    }

    /// The car immediately ahead of `car` in the direction of travel.
    pub fn car_ahead_of(&self, car: CarId) -> Option<CarId> {
        let idx = self.cars.iter().position(|id| *id == car)?;
        idx.checked_sub(1).map(|idx| self.cars[idx])
    }

    /// The car immediately behind `car`.
    pub fn car_behind(&self, car: CarId) -> Option<CarId> {
        let idx = self.cars.iter().position(|id| *id == car)?;
        self.cars.get(idx + 1).copied()
    }

    /// The cars within `dist` of the end of the lane, front to back.
    pub fn cars_within<'a>(
        &'a self,
        dist: f64,
        cars: &'a CarSet,
    ) -> impl Iterator<Item = CarId> + 'a {
        let range = Interval::new(self.length - dist, self.length);
        self.cars
            .iter()
            .copied()
            .take_while(move |id| range.contains(self.position_of(&cars[*id])))
    }

    /// Inserts a car which is at position `pos`, keeping the cars ordered.
    /// Returns the car now directly behind it.
    pub(crate) fn insert_car(&mut self, id: CarId, pos: f64, cars: &CarSet) -> Option<CarId> {
        let idx = self
            .cars
            .iter()
            .rposition(|other| self.position_of(&cars[*other]) >= pos)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.cars.insert(idx, id);
        self.cars.get(idx + 1).copied()
    }

    /// Removes the car with the given ID from the lane.
    pub(crate) fn remove_car(&mut self, id: CarId) -> bool {
        if self.cars.front() == Some(&id) {
            self.cars.pop_front();
            return true;
        }
        if let Some(idx) = self.cars.iter().rposition(|v| *v == id) {
            self.cars.remove(idx);
            return true;
        }
        false
    }

    /// Checks that the cars are ordered by decreasing position.
    pub fn is_ordered(&self, cars: &CarSet) -> bool {
        let positions = self
            .cars
            .iter()
            .map(|id| self.position_of(&cars[*id]))
            .collect::<Vec<_>>();
        positions.windows(2).all(|w| w[0] >= w[1])
    }

    pub(crate) fn set_light(&mut self, light: TrafficLightId) {
        self.light = Some(light);
    }

    pub(crate) fn add_goes_to(&mut self, lane: LaneId) {
        if !self.goes_to.contains(&lane) {
            self.goes_to.push(lane);
        }
    }

    pub(crate) fn add_comes_from(&mut self, lane: LaneId) {
        if !self.comes_from.contains(&lane) {
            self.comes_from.push(lane);
        }
    }

    pub(crate) fn set_upstream(&mut self, junction: JunctionId) {
        self.upstream = Some(junction);
    }
}
