use crate::math::Segment;
use crate::{LaneId, RoadId};

/// The width of every lane, in m.
pub const LANE_WIDTH: f64 = 3.5;

/// A fixed-width corridor of parallel lanes all travelling in the same direction.
#[derive(Clone, Debug)]
pub struct RoadSection {
    /// The road ID.
    id: RoadId,
    /// The ID the road was given in the map data.
    external_id: u32,
    /// The lanes, ordered left to right.
    lanes: Vec<LaneId>,
    /// The speed limit in m/tick.
    max_speed: f64,
}

impl RoadSection {
    pub(crate) fn new(id: RoadId, external_id: u32, lanes: Vec<LaneId>, max_speed: f64) -> Self {
        Self {
            id,
            external_id,
            lanes,
            max_speed,
        }
    }

    /// Gets the road's ID.
    pub fn id(&self) -> RoadId {
        self.id
    }

    /// The ID the road was given in the map data.
    pub fn external_id(&self) -> u32 {
        self.external_id
    }

    /// The speed limit in m/tick.
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// The total width of the road in m.
    pub fn width(&self) -> f64 {
        LANE_WIDTH * self.lanes.len() as f64
    }

    /// The lanes, ordered left to right.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    /// The lane with the given index, counted from the left.
    pub fn lane(&self, index: usize) -> Option<LaneId> {
        self.lanes.get(index).copied()
    }

    /// The lane to the left of the lane with the given index.
    pub fn left_of(&self, index: usize) -> Option<LaneId> {
        index.checked_sub(1).and_then(|idx| self.lane(idx))
    }

    /// The lane to the right of the lane with the given index.
    pub fn right_of(&self, index: usize) -> Option<LaneId> {
        self.lane(index + 1)
    }
}

/// Builds the centre lines of `lane_count` parallel lanes from the centre line of a road.
/// Lane 0 is the leftmost in the direction of travel.
pub(crate) fn lane_centre_lines(polyline: &[Segment], lane_count: usize) -> Vec<Vec<Segment>> {
    let mid = 0.5 * (lane_count as f64 - 1.0);
    (0..lane_count)
        .map(|idx| {
            let offset = (mid - idx as f64) * LANE_WIDTH;
            polyline.iter().map(|seg| seg.offset(offset)).collect()
        })
        .collect()
}
