use crate::car::kinematics::{
    braking_distance, desired_gap, follow_acc, free_acc, stop_line_acc, Motion, JAM_GAP,
    STOPPED_SPEED,
};
use crate::car::{LaneChange, LANE_CHANGE_LENGTH};
#[cfg(feature = "debug")]
use crate::debug::debug_line;
use crate::error::{Error, Result};
use crate::math::{project_across, rot90, CubicFn, Point2d, Vector2d};
use crate::road::LANE_WIDTH;
use crate::{
    Car, CarId, CarSet, Junction, JunctionId, JunctionSet, Lane, LaneId, LaneSet, LightSet,
    RoadId, RoadSection, RoadSet, TrafficLight, TrafficLightId,
};
use cgmath::InnerSpace;
use log::trace;

/// How many cars deep a car looks when predicting the cars ahead of it.
/// Beyond this, the car ahead is assumed to stay where it is.
const MAX_PREDICTION_DEPTH: usize = 32;

/// All the entities of a simulation, with cross references held as IDs.
#[derive(Default)]
pub struct World {
    pub(crate) roads: RoadSet,
    pub(crate) lanes: LaneSet,
    pub(crate) junctions: JunctionSet,
    pub(crate) lights: LightSet,
    pub(crate) cars: CarSet,
}

/// What lies beyond the end of a car's lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LaneExit {
    /// The car continues into this lane.
    Into(LaneId),
    /// The car has reached the end of its path.
    Leave,
    /// The lane does not lead to the car's next road.
    Blocked,
}

/// The outcome of planning one car's move.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Plan {
    /// The car's motion at the end of the tick, relative to the start of its current lane.
    pub motion: Motion,
    /// Whether the car is braking for a light or another car.
    pub braking: bool,
}

impl World {
    /// Gets a reference to the road with the given ID.
    pub fn road(&self, id: RoadId) -> &RoadSection {
        &self.roads[id]
    }

    /// Gets a reference to the lane with the given ID.
    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id]
    }

    /// Gets a reference to the junction with the given ID.
    pub fn junction(&self, id: JunctionId) -> &Junction {
        &self.junctions[id]
    }

    /// Gets a reference to the traffic light with the given ID.
    pub fn light(&self, id: TrafficLightId) -> &TrafficLight {
        &self.lights[id]
    }

    /// Gets a reference to the car with the given ID, if it is still in the simulation.
    pub fn car(&self, id: CarId) -> Option<&Car> {
        self.cars.get(id)
    }

    /// Returns an iterator over all the roads.
    pub fn iter_roads(&self) -> impl Iterator<Item = &RoadSection> {
        self.roads.values()
    }

    /// Returns an iterator over all the lanes.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Returns an iterator over all the junctions.
    pub fn iter_junctions(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    /// Returns an iterator over all the traffic lights.
    pub fn iter_lights(&self) -> impl Iterator<Item = &TrafficLight> {
        self.lights.values()
    }

    /// Returns an iterator over all the cars.
    pub fn iter_cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    /// The position of a car along its lane, in m.
    pub fn position(&self, car: CarId) -> f64 {
        let car = &self.cars[car];
        self.lanes[car.lane()].position_of(car)
    }

    /// The world coordinates and heading of a car.
    pub fn car_coords(&self, car: CarId) -> (Point2d, Vector2d) {
        let car = &self.cars[car];
        let lane = &self.lanes[car.lane()];
        let pos = lane.position_of(car);
        let (centre, tan) = lane.sample(pos);
        let (offset, slope) = car.lateral_offset(pos);
        let perp = rot90(tan);
        let heading = tan + perp * slope;
        let heading = if heading.magnitude2() > 0.0 {
            heading.normalize()
        } else {
            tan
        };
        (centre + perp * offset, heading)
    }

    /// The number of cars waiting behind a traffic light.
    pub fn approach_car_count(&self, light: TrafficLightId) -> usize {
        self.lights[light]
            .lanes()
            .iter()
            .map(|id| self.lanes[*id].car_count())
            .sum()
    }

    /// The length of a road, measured along its first lane.
    pub fn road_length(&self, road: RoadId) -> f64 {
        self.roads[road]
            .lanes()
            .first()
            .map_or(0.0, |lane| self.lanes[*lane].length())
    }

    /// The roads reachable directly from the end of a road.
    pub fn successors(&self, road: RoadId) -> impl Iterator<Item = RoadId> + '_ {
        let mut out: Vec<RoadId> = vec![];
        for lane in self.roads[road].lanes() {
            for next in self.lanes[*lane].goes_to() {
                let next_road = self.lanes[*next].road();
                if !out.contains(&next_road) {
                    out.push(next_road);
                }
            }
        }
        out.into_iter()
    }

    /// Determines what lies past the end of `lane` for a car on leg `leg` of `path`.
    pub(crate) fn lane_exit(&self, lane: LaneId, path: &[RoadId], leg: usize) -> LaneExit {
        match path.get(leg + 1) {
            None => LaneExit::Leave,
            Some(next_road) => self.lanes[lane]
                .goes_to()
                .iter()
                .copied()
                .find(|id| self.lanes[*id].road() == *next_road)
                .map(LaneExit::Into)
                .unwrap_or(LaneExit::Blocked),
        }
    }

    /// The distance from a car to the first point on its path it may not pass
    /// (a red light, or the end of a lane it cannot leave), if one lies within braking range.
    pub(crate) fn stop_distance(&self, id: CarId) -> Option<f64> {
        let car = &self.cars[id];
        let mut lane_id = car.lane();
        let mut leg = car.leg();
        let lane = &self.lanes[lane_id];
        let limits = car.limits(self.roads[lane.road()].max_speed());
        let horizon =
            braking_distance(limits.speed_cap, limits.max_change) + 2.0 * limits.speed_cap;
        let mut dist = lane.length() - lane.position_of(car);

        loop {
            let lane = &self.lanes[lane_id];
            if !lane.permits_exit(&self.lights) {
                return Some(dist);
            }
            match self.lane_exit(lane_id, car.path(), leg) {
                LaneExit::Leave => return None,
                LaneExit::Blocked => return Some(dist),
                LaneExit::Into(next) => {
                    if dist > horizon {
                        return None;
                    }
                    lane_id = next;
                    leg += 1;
                    dist += self.lanes[next].length();
                }
            }
        }
    }

    /// Finds the car ahead of `id` and where it will be at the end of the tick,
    /// relative to the start of `id`'s lane.
    ///
    /// A car ahead which has not moved yet this tick is not read as it stands:
    /// its move is planned on the spot, so the result does not depend on the
    /// order in which cars are processed.
    fn leader(&self, id: CarId, tick: u64, depth: usize) -> Option<(CarId, f64)> {
        let car = &self.cars[id];
        let lane = &self.lanes[car.lane()];
        let (leader, base) = match lane.car_ahead_of(id) {
            Some(leader) => (leader, 0.0),
            None => match self.lane_exit(car.lane(), car.path(), car.leg()) {
                LaneExit::Into(next) => (self.lanes[next].last_car()?, lane.length()),
                _ => return None,
            },
        };
        if leader == id {
            return None;
        }

        let leader_car = &self.cars[leader];
        let pos = if leader_car.has_moved(tick) || depth == 0 {
            self.lanes[leader_car.lane()].position_of(leader_car)
        } else {
            let planned = self.plan(leader, tick, depth - 1).motion.pos;
            let lane = &self.lanes[leader_car.lane()];
            if planned <= lane.length() {
                // As stored once the leader moves
                let (segment, offset) = lane.locate(planned);
                lane.segment_start(segment) + offset
            } else {
                planned
            }
        };
        Some((leader, base + pos))
    }

    /// Plans one tick of a car's movement without changing anything.
    pub(crate) fn plan(&self, id: CarId, tick: u64, depth: usize) -> Plan {
        let car = &self.cars[id];
        let lane = &self.lanes[car.lane()];
        let pos = lane.position_of(car);
        let speed = car.speed();
        let limits = car.limits(self.roads[lane.road()].max_speed());

        let mut acc = free_acc(speed, limits);
        let mut barrier: Option<f64> = None;
        let mut braking = false;
        let mut hold = |a: f64, limit: f64| {
            if a < acc {
                acc = a;
            }
            barrier = Some(barrier.map_or(limit, |b| f64::min(b, limit)));
        };

        if let Some(dist) = self.stop_distance(id) {
            let (a, brake) = stop_line_acc(speed, dist, limits);
            braking |= brake;
            hold(a, pos + dist);
        }

        if let Some((leader, leader_pos)) = self.leader(id, tick, depth) {
            let gap = leader_pos - pos;
            let a = follow_acc(speed, gap, desired_gap(speed, lane.length()), limits);
            braking |= a < 0.0;
            hold(a, leader_pos - JAM_GAP);

            // Yielding to the merger ahead: be ready to stop behind it
            if car.yield_to() == Some(leader) {
                let dist = f64::max(gap - JAM_GAP, 0.0);
                let (a, brake) = stop_line_acc(speed, dist, limits);
                braking |= brake;
                hold(a, pos + dist);
            }
        }

        Plan {
            motion: car.motion(pos).step(acc, limits.speed_cap, barrier),
            braking,
        }
    }

    /// Brings the listed cars' negotiation flags up to date, then moves every car
    /// whose lane does not lead to the next road on its path into one that does.
    ///
    /// Lane changes are applied in ID order and each car then yields to the merger
    /// directly ahead of it, so the outcome is the same for any order of `cars`.
    pub(crate) fn negotiate(&mut self, cars: &[CarId]) -> Result<()> {
        let mut changing: Vec<CarId> = cars
            .iter()
            .copied()
            .filter(|id| self.update_flags(*id))
            .collect();
        changing.sort_unstable();

        for id in &changing {
            self.change_lane(*id)?;
        }
        for id in changing {
            let lane = self.cars[id].lane();
            if let Some(behind) = self.lanes[lane].car_behind(id) {
                self.cars[behind].start_yielding(id);
            }
        }
        Ok(())
    }

    /// Brings a car's negotiation flags up to date.
    /// Returns `true` if its lane does not lead to the next road on its path.
    fn update_flags(&mut self, id: CarId) -> bool {
        let car = &self.cars[id];
        let lane = &self.lanes[car.lane()];
        let pos = lane.position_of(car);

        let lane_change_done = car.lane_change().map_or(true, |lc| pos >= lc.end_pos);
        let stop_done = car.speed() <= STOPPED_SPEED || lane.permits_exit(&self.lights);
        let yield_done = match car.yield_to().and_then(|other| self.cars.get(other)) {
            Some(other) if other.lane() == car.lane() => {
                lane.position_of(other) - pos >= desired_gap(car.speed(), lane.length())
            }
            _ => true,
        };
        let blocked = self.lane_exit(car.lane(), car.path(), car.leg()) == LaneExit::Blocked;

        let car = &mut self.cars[id];
        if car.state().changing_lane && lane_change_done {
            car.finish_lane_change();
        }
        if car.state().stopping && stop_done {
            car.state_mut().stopping = false;
        }
        if car.state().yielding && yield_done {
            car.stop_yielding();
        }
        blocked
    }

    /// Moves a car into a lane of its current road which leads to the next road on its path.
    fn change_lane(&mut self, id: CarId) -> Result<()> {
        let car = &self.cars[id];
        let lane = &self.lanes[car.lane()];
        let road = &self.roads[lane.road()];
        let next_road = car.next_road().ok_or(Error::NoLaneChangeTarget { car: id })?;

        let target = road
            .lanes()
            .iter()
            .copied()
            .filter(|lane_id| {
                self.lanes[*lane_id]
                    .goes_to()
                    .iter()
                    .any(|next| self.lanes[*next].road() == next_road)
            })
            .min_by_key(|lane_id| self.lanes[*lane_id].index().abs_diff(lane.index()))
            .ok_or(Error::NoLaneChangeTarget { car: id })?;
        let dst = &self.lanes[target];

        // Carry the car across onto the corresponding segment of the new lane
        let pos = lane.position_of(car);
        let (point, _) = lane.sample(pos);
        let segment = car.segment();
        let projected = dst.segments().get(segment).and_then(|dst_seg| {
            let hit = project_across(point, &lane.segments()[segment], dst_seg)?;
            #[cfg(feature = "debug")]
            debug_line("lane change", point, hit);
            Some(dst.segment_start(segment) + dst_seg.project_distance(hit))
        });
        let new_pos = projected.unwrap_or_else(|| pos / lane.length() * dst.length());
        let lateral = (dst.index() as f64 - lane.index() as f64) * LANE_WIDTH;
        let (new_segment, new_offset) = dst.locate(new_pos);
        let old_lane = car.lane();
        let leg = car.leg();

        trace!("car {:?} changes lane {:?} -> {:?}", id, old_lane, target);

        self.lanes[old_lane].remove_car(id);
        let car = &mut self.cars[id];
        car.set_location(target, leg, new_segment, new_offset);
        let end_pos = new_pos + LANE_CHANGE_LENGTH;
        car.begin_lane_change(LaneChange {
            end_pos,
            offset: CubicFn::ease(new_pos, lateral, end_pos, 0.0),
        });

        self.lanes[target].insert_car(id, new_pos, &self.cars);
        Ok(())
    }

    /// Moves a car for one tick. Returns `true` if the car reached the end of its path
    /// and has been removed.
    pub(crate) fn drive(&mut self, id: CarId, tick: u64) -> bool {
        let plan = self.plan(id, tick, MAX_PREDICTION_DEPTH);
        let car = &self.cars[id];
        let start_lane = car.lane();

        // Walk forwards across lane ends
        let mut lane_id = start_lane;
        let mut leg = car.leg();
        let mut pos = plan.motion.pos;
        let mut arrived = false;
        loop {
            let lane = &self.lanes[lane_id];
            if pos <= lane.length() {
                break;
            }
            if !lane.permits_exit(&self.lights) {
                pos = lane.length();
                break;
            }
            match self.lane_exit(lane_id, car.path(), leg) {
                LaneExit::Into(next) => {
                    pos -= lane.length();
                    lane_id = next;
                    leg += 1;
                }
                LaneExit::Leave => {
                    arrived = true;
                    break;
                }
                LaneExit::Blocked => {
                    pos = lane.length();
                    break;
                }
            }
        }

        if arrived {
            trace!("car {:?} arrived", id);
            self.lanes[start_lane].remove_car(id);
            self.cars.remove(id);
            return true;
        }

        // Never pass the car ahead, whatever happened earlier in the tick
        let ahead = if lane_id == start_lane {
            self.lanes[lane_id].car_ahead_of(id)
        } else {
            self.lanes[lane_id].last_car()
        };
        if let Some(ahead) = ahead {
            pos = f64::min(pos, self.position(ahead));
        }

        let (segment, offset) = self.lanes[lane_id].locate(pos);
        let car = &mut self.cars[id];
        car.apply_motion(&plan.motion, tick);
        if plan.braking {
            car.state_mut().stopping = true;
        }
        car.set_location(lane_id, leg, segment, offset);
        if lane_id != start_lane {
            self.lanes[start_lane].remove_car(id);
            self.lanes[lane_id].insert_car(id, pos, &self.cars);
        }
        false
    }
}

#[cfg(test)]
impl World {
    /// Places a car at `pos` along `lane`, with a path covering just the lane's road.
    pub(crate) fn place_car(&mut self, lane: LaneId, pos: f64, speed: f64) -> CarId {
        let attributes = crate::CarAttributes {
            max_speed: 1.5,
            max_speed_change: 0.2,
        };
        let road = self.lanes[lane].road();
        let (segment, offset) = self.lanes[lane].locate(pos);
        let id = self.cars.insert_with_key(|id| {
            let mut car = Car::new(id, &attributes, vec![road], lane, 0);
            car.set_location(lane, 0, segment, offset);
            car.set_speed(speed);
            car
        });
        self.lanes[lane].insert_car(id, pos, &self.cars);
        id
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{build_world, RoadSectionData};
    use crate::math::Segment;
    use assert_approx_eq::assert_approx_eq;

    fn single_road(lane_count: usize) -> World {
        let road = RoadSectionData {
            id: 1,
            polyline: vec![Segment::new(Point2d::new(0.0, 0.0), Point2d::new(200.0, 0.0))],
            lane_count,
            max_speed: 1.5,
        };
        build_world(&[road], &[]).unwrap().0
    }

    #[test]
    fn prediction_matches_the_leaders_move() {
        let mut world = single_road(1);
        let lane = world.iter_lanes().next().unwrap().id();
        let front = world.place_car(lane, 30.0, 1.0);
        let back = world.place_car(lane, 20.0, 1.4);

        let predicted = world.leader(back, 0, MAX_PREDICTION_DEPTH).unwrap();
        assert_eq!(predicted.0, front);
        let planned = world.plan(front, 0, MAX_PREDICTION_DEPTH);

        world.drive(front, 0);
        assert_approx_eq!(world.position(front), planned.motion.pos);
        assert_approx_eq!(predicted.1, planned.motion.pos);
        assert_eq!(world.leader(back, 0, MAX_PREDICTION_DEPTH), Some(predicted));
    }

    #[test]
    fn cars_keep_their_distance() {
        let mut world = single_road(1);
        let lane = world.iter_lanes().next().unwrap().id();
        let front = world.place_car(lane, 100.0, 0.0);
        let back = world.place_car(lane, 90.0, 1.5);
        for tick in 0..200 {
            world.cars[front].set_speed(0.0);
            world.drive(back, tick);
            world.drive(front, tick);
            assert!(world.lanes[lane].is_ordered(&world.cars));
        }
        assert!(world.position(front) - world.position(back) >= JAM_GAP - 1e-9);
    }

    #[test]
    fn cars_leave_at_the_end_of_their_path() {
        let mut world = single_road(1);
        let lane = world.iter_lanes().next().unwrap().id();
        let car = world.place_car(lane, 199.0, 1.5);
        assert!(world.drive(car, 0));
        assert!(world.car(car).is_none());
        assert_eq!(world.lane(lane).car_count(), 0);
    }

    #[test]
    fn coordinates_follow_the_lane() {
        let mut world = single_road(2);
        let lanes: Vec<LaneId> = world.iter_roads().next().unwrap().lanes().to_vec();
        let car = world.place_car(lanes[1], 50.0, 0.0);
        let (point, heading) = world.car_coords(car);
        assert_approx_eq!(point.x, 50.0);
        assert_approx_eq!(point.y, -0.5 * LANE_WIDTH);
        assert_approx_eq!(heading.x, 1.0);
    }
}
