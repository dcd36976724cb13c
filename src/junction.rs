use crate::math::Point2d;
use crate::{JunctionId, RoadId, TrafficLightId};

/// A road junction: the traffic lights on its approaches and the roads meeting at it.
#[derive(Clone, Debug)]
pub struct Junction {
    id: JunctionId,
    /// The ID the junction was given in the map data.
    external_id: u32,
    /// The outline of the junction.
    polygon: Vec<Point2d>,
    /// One light per approach, in the order they were defined.
    lights: Vec<TrafficLightId>,
    /// Roads ending at the junction.
    incoming: Vec<RoadId>,
    /// Roads starting at the junction.
    outgoing: Vec<RoadId>,
}

impl Junction {
    pub(crate) fn new(id: JunctionId, external_id: u32, polygon: Vec<Point2d>) -> Self {
        Self {
            id,
            external_id,
            polygon,
            lights: vec![],
            incoming: vec![],
            outgoing: vec![],
        }
    }

    /// Gets the junction's ID.
    pub fn id(&self) -> JunctionId {
        self.id
    }

    /// The ID the junction was given in the map data.
    pub fn external_id(&self) -> u32 {
        self.external_id
    }

    /// The outline of the junction.
    pub fn polygon(&self) -> &[Point2d] {
        &self.polygon
    }

    /// The traffic lights, one per approach.
    pub fn lights(&self) -> &[TrafficLightId] {
        &self.lights
    }

    /// Roads ending at the junction.
    pub fn incoming(&self) -> &[RoadId] {
        &self.incoming
    }

    /// Roads starting at the junction.
    pub fn outgoing(&self) -> &[RoadId] {
        &self.outgoing
    }

    pub(crate) fn add_light(&mut self, light: TrafficLightId) {
        self.lights.push(light);
    }

    pub(crate) fn add_incoming(&mut self, road: RoadId) {
        if !self.incoming.contains(&road) {
            self.incoming.push(road);
        }
    }

    pub(crate) fn add_outgoing(&mut self, road: RoadId) {
        if !self.outgoing.contains(&road) {
            self.outgoing.push(road);
        }
    }
}
