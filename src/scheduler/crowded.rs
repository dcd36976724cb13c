use super::{approach_lanes, first_max_by_key, Context, Strategy, StrategyKind};
use crate::{Junction, TrafficLightId};
use log::debug;

/// Gives green to the approach currently holding the most cars.
///
/// Optionally holds a light green for a minimum time before switching away,
/// and optionally forces a switch to any light which has been red for too long.
pub struct MostCrowded {
    kind: StrategyKind,
    min_green: Option<u64>,
    max_red: Option<u64>,
    time_limit: Option<u64>,
}

impl MostCrowded {
    pub fn new(
        kind: StrategyKind,
        min_green: Option<u64>,
        max_red: Option<u64>,
        time_limit: Option<u64>,
    ) -> Self {
        Self {
            kind,
            min_green,
            max_red,
            time_limit,
        }
    }
}

impl Strategy for MostCrowded {
    fn kind(&self) -> StrategyKind {
        self.kind
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
        let world = ctx.world;

        if let Some(max_red) = self.max_red {
            let oldest = first_max_by_key(
                junction.lights().iter().copied().filter(|id| *id != current),
                |id| world.light(*id).light_time(),
            );
            if let Some(oldest) = oldest.filter(|id| world.light(*id).light_time() > max_red) {
                debug!("light {:?} red for over {} ticks", oldest, max_red);
                return oldest;
            }
        }

        if let Some(min_green) = self.min_green {
            if world.light(current).light_time() < min_green {
                return current;
            }
        }

        first_max_by_key(junction.lights().iter().copied(), |id| {
            approach_lanes(world, *id)
                .map(|lane| lane.car_count())
                .sum::<usize>()
        })
        .unwrap_or(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scheduler::test::{grid_centre, queue};
    use slotmap::SecondaryMap;

    #[test]
    fn ties_go_to_the_first_light() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        for (light, count) in lights.iter().zip([3, 5, 5, 2]) {
            queue(&mut world, *light, count);
        }

        let strategies = SecondaryMap::new();
        let ctx = Context {
            world: &world,
            tick: 0,
            strategies: &strategies,
        };
        let mut strategy = MostCrowded::new(StrategyKind::MostCrowded, None, None, None);
        let chosen = strategy.select(&ctx, world.junction(junction), lights[0]);
        assert_eq!(chosen, lights[1]);
    }

    #[test]
    fn minimum_green_holds_the_current_light() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        queue(&mut world, lights[2], 4);
        let mut strategy =
            MostCrowded::new(StrategyKind::MostCrowdedMinGreen, Some(10), None, None);
        let strategies = SecondaryMap::new();

        for _ in 0..9 {
            world.lights[lights[0]].tick();
        }
        let ctx = Context {
            world: &world,
            tick: 0,
            strategies: &strategies,
        };
        assert_eq!(strategy.select(&ctx, world.junction(junction), lights[0]), lights[0]);

        world.lights[lights[0]].tick();
        let ctx = Context {
            world: &world,
            tick: 1,
            strategies: &strategies,
        };
        assert_eq!(strategy.select(&ctx, world.junction(junction), lights[0]), lights[2]);
    }

    #[test]
    fn maximum_red_beats_the_minimum_green() {
        let (mut world, junction) = grid_centre();
        let lights = world.junction(junction).lights().to_vec();
        queue(&mut world, lights[0], 6);
        let mut strategy =
            MostCrowded::new(StrategyKind::MostCrowdedMaxRed, Some(10), Some(20), None);
        for _ in 0..21 {
            world.lights[lights[3]].tick();
        }
        let strategies = SecondaryMap::new();
        let ctx = Context {
            world: &world,
            tick: 0,
            strategies: &strategies,
        };
        assert_eq!(strategy.select(&ctx, world.junction(junction), lights[0]), lights[3]);
    }
}
