//! Map data consumed by [crate::Simulation::load_map], and construction of the lane graph from it.

use crate::error::{Error, Result};
use crate::math::{Point2d, Segment};
use crate::road::lane_centre_lines;
use crate::{Junction, Lane, LaneId, RoadId, RoadSection, TrafficLight, World};
use log::info;
use std::collections::HashMap;

pub use grid::grid;

mod grid;

/// A road section, as described by a map.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSectionData {
    /// The map's identifier for the road.
    pub id: u32,
    /// The centre line of the road, in the direction of travel.
    pub polyline: Vec<Segment>,
    /// The number of lanes.
    pub lane_count: usize,
    /// The speed limit in m/tick.
    pub max_speed: f64,
}

/// A lane, identified by its road's map identifier and its index counted from the left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadLane {
    pub road: u32,
    pub lane: usize,
}

impl RoadLane {
    pub const fn new(road: u32, lane: usize) -> Self {
        Self { road, lane }
    }
}

/// The lanes controlled by one traffic light.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightGroup {
    pub lanes: Vec<RoadLane>,
    /// Where the light is drawn.
    pub position: Point2d,
}

/// A junction, as described by a map.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionData {
    /// The map's identifier for the junction.
    pub id: u32,
    /// The outline of the junction.
    pub polygon: Vec<Point2d>,
    /// Pairs of lanes where the first lane continues into the second.
    pub connections: Vec<(RoadLane, RoadLane)>,
    /// The traffic lights, in the order the scheduler cycles through them.
    pub light_groups: Vec<LightGroup>,
}

/// Builds a world from map data.
///
/// Returns the world and the mapping from the map's road identifiers to road IDs.
/// Fails on the first inconsistency found, in which case nothing is built.
pub(crate) fn build_world(
    roads: &[RoadSectionData],
    junctions: &[JunctionData],
) -> Result<(World, HashMap<u32, RoadId>)> {
    let mut world = World::default();
    let mut road_ids = HashMap::new();

    for data in roads {
        validate_road(data)?;
        if road_ids.contains_key(&data.id) {
            return Err(Error::DuplicateRoad(data.id));
        }
        let road_id = world.roads.insert_with_key(|id| {
            RoadSection::new(id, data.id, Vec::new(), data.max_speed)
        });
        let lanes = lane_centre_lines(&data.polyline, data.lane_count)
            .into_iter()
            .enumerate()
            .map(|(idx, segments)| {
                world
                    .lanes
                    .insert_with_key(|id| Lane::new(id, road_id, idx, segments))
            })
            .collect();
        world.roads[road_id] = RoadSection::new(road_id, data.id, lanes, data.max_speed);
        road_ids.insert(data.id, road_id);
    }

    let lookup = |world: &World, lane: &RoadLane| -> Result<LaneId> {
        let road = road_ids
            .get(&lane.road)
            .ok_or(Error::UnknownRoad(lane.road))?;
        world.roads[*road]
            .lane(lane.lane)
            .ok_or(Error::UnknownLane {
                road: lane.road,
                lane: lane.lane,
            })
    };

    let mut junction_ids = HashMap::new();
    for data in junctions {
        if junction_ids.contains_key(&data.id) {
            return Err(Error::DuplicateJunction(data.id));
        }
        let junction_id = world
            .junctions
            .insert_with_key(|id| Junction::new(id, data.id, data.polygon.clone()));
        junction_ids.insert(data.id, junction_id);

        for (from, to) in &data.connections {
            let from = lookup(&world, from)?;
            let to = lookup(&world, to)?;
            world.lanes[from].add_goes_to(to);
            world.lanes[to].add_comes_from(from);
            world.lanes[to].set_upstream(junction_id);
            let (from_road, to_road) = (world.lanes[from].road(), world.lanes[to].road());
            let junction = &mut world.junctions[junction_id];
            junction.add_incoming(from_road);
            junction.add_outgoing(to_road);
        }

        for (group_idx, group) in data.light_groups.iter().enumerate() {
            if group.lanes.is_empty() {
                return Err(Error::EmptyLightGroup {
                    junction: data.id,
                    group: group_idx,
                });
            }
            let mut lanes = Vec::with_capacity(group.lanes.len());
            for road_lane in &group.lanes {
                let lane = lookup(&world, road_lane)?;
                if world.lanes[lane].light().is_some() || lanes.contains(&lane) {
                    return Err(Error::LaneAlreadyControlled {
                        road: road_lane.road,
                        lane: road_lane.lane,
                    });
                }
                lanes.push(lane);
            }
            let light_id = world.lights.insert_with_key(|id| {
                TrafficLight::new(id, junction_id, &lanes, group.position)
            });
            for lane in lanes {
                world.lanes[lane].set_light(light_id);
            }
            world.junctions[junction_id].add_light(light_id);
        }
    }

    info!(
        "loaded map: {} roads, {} lanes, {} junctions, {} lights",
        world.roads.len(),
        world.lanes.len(),
        world.junctions.len(),
        world.lights.len()
    );
    Ok((world, road_ids))
}

fn validate_road(data: &RoadSectionData) -> Result<()> {
    let invalid = |reason| Err(Error::InvalidRoad {
        id: data.id,
        reason,
    });
    if data.polyline.is_empty() {
        return invalid("no centre line");
    }
    if data.lane_count == 0 {
        return invalid("no lanes");
    }
    if data.max_speed.is_nan() || data.max_speed <= 0.0 {
        return invalid("speed limit must be positive");
    }
    if data.polyline.iter().map(Segment::length).sum::<f64>() <= 0.0 {
        return invalid("zero length");
    }
    Ok(())
}
