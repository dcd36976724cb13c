use super::{approach_lanes, first_max_by_key, Context, Strategy, StrategyKind};
use crate::{CarId, Junction, StrategyConfig, TrafficLightId, World};
use slotmap::SecondaryMap;

/// Cars slower than this, in m/tick, are counted as waiting.
const WAITING_SPEED: f64 = 0.1;

/// Scores each approach by the cars that could pass it against the cars left
/// waiting at the others, and gives green to the best.
pub struct CostBased {
    revenue: f64,
    penalty: f64,
    stale_interval: u64,
    pass_distance: f64,
    time_limit: Option<u64>,
    /// Ticks each visible car has spent waiting.
    waits: SecondaryMap<CarId, u64>,
}

impl CostBased {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            revenue: config.revenue,
            penalty: config.penalty,
            stale_interval: config.stale_interval.max(1),
            pass_distance: config.pass_distance,
            time_limit: Some(config.time_limit),
            waits: SecondaryMap::new(),
        }
    }

    /// The number of ticks `car` has been seen waiting.
    pub fn wait_of(&self, car: CarId) -> u64 {
        self.waits.get(car).copied().unwrap_or(0)
    }

    /// Counts another tick of waiting for every car on an approach, forgetting cars
    /// which are no longer on one.
    fn update_waits(&mut self, world: &World, junction: &Junction) {
        let mut waits = SecondaryMap::new();
        for light in junction.lights() {
            for lane in approach_lanes(world, *light) {
                for id in lane.cars() {
                    if let Some(car) = world.car(id) {
                        let waited = self.wait_of(id) + (car.speed() < WAITING_SPEED) as u64;
                        waits.insert(id, waited);
                    }
                }
            }
        }
        self.waits = waits;
    }

    fn passing(&self, world: &World, light: TrafficLightId) -> usize {
        approach_lanes(world, light)
            .map(|lane| lane.cars_within(self.pass_distance, &world.cars).count())
            .sum()
    }

    fn stale(&self, world: &World, light: TrafficLightId) -> u64 {
        approach_lanes(world, light)
            .flat_map(|lane| lane.cars())
            .map(|id| self.wait_of(id) / self.stale_interval)
            .sum()
    }

    /// The score of making `light` green.
    pub fn score(&self, world: &World, junction: &Junction, light: TrafficLightId) -> f64 {
        let stale: u64 = junction
            .lights()
            .iter()
            .filter(|other| **other != light)
            .map(|other| self.stale(world, *other))
            .sum();
        self.revenue * self.passing(world, light) as f64 - self.penalty * stale as f64
    }
}

impl Strategy for CostBased {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CostBased
    }

    fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    fn observe(&mut self, ctx: &Context<'_>, junction: &Junction) {
        self.update_waits(ctx.world, junction);
    }

    fn select(
        &mut self,
        ctx: &Context<'_>,
        junction: &Junction,
        current: TrafficLightId,
    ) -> TrafficLightId {
        first_max_by_key(junction.lights().iter().copied(), |id| {
            self.score(ctx.world, junction, *id)
        })
        .unwrap_or(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scheduler::test::grid_centre;
    use crate::{JunctionId, TrafficLightId};

    fn select(
        strategy: &mut CostBased,
        world: &World,
        junction: JunctionId,
        current: TrafficLightId,
    ) -> TrafficLightId {
        let strategies = SecondaryMap::new();
        let ctx = Context {
            world,
            tick: 0,
            strategies: &strategies,
        };
        strategy.observe(&ctx, world.junction(junction));
        strategy.select(&ctx, world.junction(junction), current)
    }

    #[test]
    fn stale_waits_outweigh_passing_cars() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        let moving = world.light(lights[0]).lanes()[0];
        let length = world.lane(moving).length();
        world.place_car(moving, length - 6.0, 1.0);
        let waiting = world.light(lights[1]).lanes()[0];
        let waiting_cars: Vec<CarId> = [25.0, 15.0, 5.0]
            .into_iter()
            .map(|pos| world.place_car(waiting, pos, 0.0))
            .collect();

        let mut strategy = CostBased::new(&StrategyConfig::default());
        for _ in 0..19 {
            assert_eq!(select(&mut strategy, &world, junction, lights[0]), lights[0]);
        }
        assert_eq!(strategy.wait_of(waiting_cars[0]), 19);
        assert_eq!(select(&mut strategy, &world, junction, lights[0]), lights[1]);
    }

    #[test]
    fn waits_are_counted_without_selecting() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        let lane = world.light(lights[2]).lanes()[0];
        let car = world.place_car(lane, 10.0, 0.0);

        let mut strategy = CostBased::new(&StrategyConfig::default());
        let strategies = SecondaryMap::new();
        for tick in 0..4 {
            let ctx = Context {
                world: &world,
                tick,
                strategies: &strategies,
            };
            strategy.observe(&ctx, world.junction(junction));
        }
        assert_eq!(strategy.wait_of(car), 4);
    }

    #[test]
    fn waits_are_forgotten_when_cars_leave() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        let lane = world.light(lights[1]).lanes()[0];
        let car = world.place_car(lane, 10.0, 0.0);

        let mut strategy = CostBased::new(&StrategyConfig::default());
        select(&mut strategy, &world, junction, lights[0]);
        select(&mut strategy, &world, junction, lights[0]);
        assert_eq!(strategy.wait_of(car), 2);

        world.lanes[lane].remove_car(car);
        world.cars.remove(car);
        select(&mut strategy, &world, junction, lights[0]);
        assert_eq!(strategy.wait_of(car), 0);
        assert!(strategy.waits.is_empty());
    }
}
