//! Random car generation.

use crate::car::kinematics::JAM_GAP;
use crate::error::{Error, Result};
use crate::util::Interval;
use crate::{CarAttributes, CarId, LaneId, RoadId, Simulation};
use log::{trace, warn};
use pathfinding::prelude::{build_path, dijkstra_all};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

impl Simulation {
    /// Adds `amount` cars, each starting at the beginning of a random road and
    /// following a shortest path at least `min_len` roads long.
    ///
    /// Each car gets [crate::SimulationConfig::generation_attempts] attempts. If
    /// one runs out, generation stops with an error; cars added before it are kept.
    pub fn generate_cars(&mut self, amount: usize, min_len: usize) -> Result<Vec<CarId>> {
        let attempts = self.config.generation_attempts;
        let failed = Error::PathGeneration { min_len, attempts };
        let roads: Vec<RoadId> = self.world.roads.keys().collect();
        if roads.is_empty() {
            return Err(failed);
        }

        let mut cars = Vec::with_capacity(amount);
        for _ in 0..amount {
            match (0..attempts).find_map(|_| self.try_generate_car(&roads, min_len)) {
                Some(car) => cars.push(car),
                None => {
                    warn!("{}", failed);
                    return Err(failed);
                }
            }
        }
        Ok(cars)
    }

    /// Makes one attempt at adding a car.
    fn try_generate_car(&mut self, roads: &[RoadId], min_len: usize) -> Option<CarId> {
        let start = *roads.choose(&mut self.rng)?;
        let path = self.random_path(start, min_len)?;

        let lanes: Vec<LaneId> = self.world.roads[start]
            .lanes()
            .iter()
            .copied()
            .filter(|lane| match path.get(1) {
                Some(next) => self.world.lanes[*lane]
                    .goes_to()
                    .iter()
                    .any(|to| self.world.lanes[*to].road() == *next),
                None => true,
            })
            .collect();
        let lane = *lanes.choose(&mut self.rng)?;

        let entry = &self.world.lanes[lane];
        if let Some(last) = entry.last_car() {
            if self.world.position(last) < JAM_GAP {
                return None;
            }
        }

        let attributes = self.random_attributes();
        let car = self.add_car(&attributes, &path, lane, 0.0);
        trace!("generated car {:?} with a path of {} roads", car, path.len());
        Some(car)
    }

    /// A random shortest path from `start` which is at least `min_len` roads long.
    fn random_path(&mut self, start: RoadId, min_len: usize) -> Option<Vec<RoadId>> {
        let world = &self.world;
        let parents = dijkstra_all(&start, |road| {
            world
                .successors(*road)
                .map(|next| (next, (world.road_length(next) * 10.0) as usize))
                .collect::<Vec<_>>()
        });

        let mut paths: Vec<Vec<RoadId>> = parents
            .keys()
            .map(|dst| build_path(dst, &parents))
            .filter(|path| path.len() >= min_len)
            .collect();
        if min_len <= 1 {
            paths.push(vec![start]);
        }
        // Independent of hash map order, for reproducible runs
        paths.sort_unstable_by_key(|path| path.last().copied());
        paths.choose(&mut self.rng).cloned()
    }

    fn random_attributes(&mut self) -> CarAttributes {
        let config = self.config.car;
        let max_speed = Normal::new(config.mean_max_speed, config.max_speed_stddev)
            .map(|distr| distr.sample(&mut self.rng))
            .unwrap_or(config.mean_max_speed);
        let range = Interval::new(0.5 * config.mean_max_speed, 1.5 * config.mean_max_speed);
        CarAttributes {
            max_speed: range.clamp(max_speed),
            max_speed_change: config.max_speed_change,
        }
    }
}
