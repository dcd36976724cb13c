use super::{approach_lanes, first_max_by_key, Context, Strategy, StrategyKind};
use crate::{Junction, Lane, TrafficLightId, World};

/// How per-lane occupancy is combined into the load of an approach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadAggregate {
    /// Total cars over total lane length.
    Total,
    /// Mean over the lanes of cars per unit of lane length.
    Average,
}

/// Relative longest queue: green for the approach with the most cars relative
/// to the length of its lanes.
pub struct RelativeLongestQueue {
    aggregate: LoadAggregate,
    time_limit: Option<u64>,
}

impl RelativeLongestQueue {
    pub fn new(aggregate: LoadAggregate, time_limit: Option<u64>) -> Self {
        Self {
            aggregate,
            time_limit,
        }
    }

    /// The load of the approach controlled by `light`.
    pub fn load(&self, world: &World, light: TrafficLightId) -> f64 {
        let lanes: Vec<&Lane> = approach_lanes(world, light).collect();
        if lanes.is_empty() {
            return 0.0;
        }
        match self.aggregate {
            LoadAggregate::Total => {
                let cars: usize = lanes.iter().map(|lane| lane.car_count()).sum();
                let length: f64 = lanes.iter().map(|lane| lane.length()).sum();
                cars as f64 / length
            }
            LoadAggregate::Average => {
                let total: f64 = lanes
                    .iter()
                    .map(|lane| lane.car_count() as f64 / lane.length())
                    .sum();
                total / lanes.len() as f64
            }
        }
    }
}

impl Strategy for RelativeLongestQueue {
    fn kind(&self) -> StrategyKind {
        match self.aggregate {
            LoadAggregate::Total => StrategyKind::RlqTotal,
            LoadAggregate::Average => StrategyKind::RlqAverage,
        }
    }

    fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    fn select(
        &mut self,
        ctx: &Context<'_>,
        junction: &Junction,
        current: TrafficLightId,
    ) -> TrafficLightId {
        first_max_by_key(junction.lights().iter().copied(), |id| {
            self.load(ctx.world, *id)
        })
        .unwrap_or(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{build_world, LightGroup, RoadLane, RoadSectionData};
    use crate::math::{Point2d, Segment};
    use crate::{JunctionData, JunctionId};
    use assert_approx_eq::assert_approx_eq;
    use slotmap::SecondaryMap;

    fn road(id: u32, length: f64) -> RoadSectionData {
        let y = 10.0 * id as f64;
        RoadSectionData {
            id,
            polyline: vec![Segment::new(Point2d::new(0.0, y), Point2d::new(length, y))],
            lane_count: 1,
            max_speed: 1.5,
        }
    }

    /// One approach over a 10 m and a 100 m lane, with a car on the short one,
    /// and another approach over a 100 m lane holding three cars.
    fn uneven_lanes() -> (World, JunctionId) {
        let roads = [road(1, 10.0), road(2, 100.0), road(3, 100.0)];
        let junction = JunctionData {
            id: 1,
            polygon: vec![],
            connections: vec![],
            light_groups: vec![
                LightGroup {
                    lanes: vec![RoadLane::new(1, 0), RoadLane::new(2, 0)],
                    position: Point2d::new(0.0, 0.0),
                },
                LightGroup {
                    lanes: vec![RoadLane::new(3, 0)],
                    position: Point2d::new(0.0, 0.0),
                },
            ],
        };
        let (mut world, ids) = build_world(&roads, &[junction]).unwrap();
        world.place_car(world.road(ids[&1]).lanes()[0], 5.0, 0.0);
        let busy = world.road(ids[&3]).lanes()[0];
        for pos in [10.0, 20.0, 30.0] {
            world.place_car(busy, pos, 0.0);
        }
        let junction = world.iter_junctions().next().unwrap().id();
        (world, junction)
    }

    #[test]
    fn aggregates_differ() {
        let (world, junction) = uneven_lanes();
        let lights = world.junction(junction).lights().to_vec();
        let total = RelativeLongestQueue::new(LoadAggregate::Total, None);
        let average = RelativeLongestQueue::new(LoadAggregate::Average, None);
        assert_approx_eq!(total.load(&world, lights[0]), 1.0 / 110.0);
        assert_approx_eq!(average.load(&world, lights[0]), 0.05);
        assert_approx_eq!(total.load(&world, lights[1]), 0.03);
        assert_approx_eq!(average.load(&world, lights[1]), 0.03);
    }

    #[test]
    fn selects_the_heaviest_load() {
        let (world, junction) = uneven_lanes();
        let lights = world.junction(junction).lights().to_vec();
        let strategies = SecondaryMap::new();
        let ctx = Context {
            world: &world,
            tick: 0,
            strategies: &strategies,
        };
        let junction = world.junction(junction);
        let mut total = RelativeLongestQueue::new(LoadAggregate::Total, None);
        let mut average = RelativeLongestQueue::new(LoadAggregate::Average, None);
        assert_eq!(total.select(&ctx, junction, lights[0]), lights[1]);
        assert_eq!(average.select(&ctx, junction, lights[1]), lights[0]);
        assert_eq!(total.kind(), StrategyKind::RlqTotal);
        assert_eq!(average.kind(), StrategyKind::RlqAverage);
    }
}
