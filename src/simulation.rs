#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::error::{Error, Result};
use crate::map::{build_world, JunctionData, RoadSectionData};
use crate::scheduler::{Classifier, MetaStrategy, Strategy, StrategyKind, TrafficLightManager};
use crate::snapshot::{CarSnapshot, JunctionSnapshot, LightSnapshot};
use crate::{Car, CarAttributes, CarId, JunctionId, LaneId, RoadId, SimulationConfig, World};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use slotmap::SecondaryMap;
use std::collections::HashMap;
use std::rc::Rc;

/// A traffic simulation.
///
/// Each call to [Simulation::step] advances time by one tick, in four phases:
/// cars negotiate lane changes, cars move, lights age, and every junction's
/// manager decides which of its lights is green.
pub struct Simulation {
    /// The roads, lanes, junctions, lights and cars.
    pub(crate) world: World,
    /// The light manager of every junction with lights.
    pub(crate) managers: SecondaryMap<JunctionId, TrafficLightManager>,
    /// Maps the map's road identifiers to road IDs.
    road_ids: HashMap<u32, RoadId>,
    pub(crate) config: SimulationConfig,
    /// The model used by meta strategies.
    classifier: Option<Rc<dyn Classifier>>,
    /// The source of all randomness, seeded from the config.
    pub(crate) rng: StdRng,
    /// The number of ticks simulated.
    tick: u64,
    /// The number of cars which have reached the end of their path.
    arrived: usize,
    /// Debugging information from the previously simulated tick.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    /// Creates a new, empty simulation.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            world: World::default(),
            managers: SecondaryMap::new(),
            road_ids: HashMap::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            classifier: None,
            tick: 0,
            arrived: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Supplies the model used by [StrategyKind::Meta].
    /// Meta strategies installed earlier keep the model they were given.
    pub fn set_classifier(&mut self, classifier: impl Classifier + 'static) {
        self.classifier = Some(Rc::new(classifier));
    }

    /// Replaces the network with the given map, removing all cars.
    ///
    /// Every junction with traffic lights gets a manager running the configured
    /// default strategy, with its first light green. On error the current network
    /// is left untouched.
    pub fn load_map(
        &mut self,
        roads: &[RoadSectionData],
        junctions: &[JunctionData],
    ) -> Result<()> {
        let (mut world, road_ids) = build_world(roads, junctions)?;
        let mut managers = SecondaryMap::new();
        let junction_ids: Vec<JunctionId> = world.junctions.keys().collect();
        for id in junction_ids {
            if world.junctions[id].lights().is_empty() {
                continue;
            }
            let strategy = self.build_strategy(self.config.default_strategy)?;
            let manager =
                TrafficLightManager::new(&world.junctions[id], strategy, &mut world.lights)?;
            managers.insert(id, manager);
        }

        self.world = world;
        self.managers = managers;
        self.road_ids = road_ids;
        self.tick = 0;
        self.arrived = 0;
        Ok(())
    }

    /// Installs a fresh strategy at a junction. The green light is kept.
    pub fn set_strategy(&mut self, junction: JunctionId, kind: StrategyKind) -> Result<()> {
        if !self.managers.contains_key(junction) {
            return Err(Error::UnmanagedJunction(junction));
        }
        let strategy = self.build_strategy(kind)?;
        if let Some(manager) = self.managers.get_mut(junction) {
            debug!("junction {:?}: installing {}", junction, kind.name());
            manager.set_strategy(strategy);
        }
        Ok(())
    }

    /// Installs a fresh strategy at every managed junction.
    pub fn set_all_strategies(&mut self, kind: StrategyKind) -> Result<()> {
        let junctions: Vec<JunctionId> = self.managers.keys().collect();
        for junction in junctions {
            self.set_strategy(junction, kind)?;
        }
        Ok(())
    }

    /// The strategy installed at a junction, if it is managed.
    pub fn strategy_of(&self, junction: JunctionId) -> Option<StrategyKind> {
        self.managers.get(junction).map(|manager| manager.kind())
    }

    /// The manager of a junction, if it has lights.
    pub fn manager(&self, junction: JunctionId) -> Option<&TrafficLightManager> {
        self.managers.get(junction)
    }

    fn build_strategy(&mut self, kind: StrategyKind) -> Result<Box<dyn Strategy>> {
        if kind == StrategyKind::Meta {
            let classifier = self.classifier.clone().ok_or(Error::MissingClassifier)?;
            return Ok(Box::new(MetaStrategy::new(
                classifier,
                &self.config.scheduler,
                &mut self.rng,
            )));
        }
        kind.build(&self.config.scheduler).ok_or(Error::MissingClassifier)
    }

    /// Adds a car at `pos` along `lane`, which must belong to the first road of `path`.
    pub fn add_car(
        &mut self,
        attributes: &CarAttributes,
        path: &[RoadId],
        lane: LaneId,
        pos: f64,
    ) -> CarId {
        let (segment, offset) = self.world.lanes[lane].locate(pos);
        let tick = self.tick;
        let car_id = self.world.cars.insert_with_key(|id| {
            let mut car = Car::new(id, attributes, path.to_vec(), lane, tick);
            car.set_location(lane, 0, segment, offset);
            car
        });
        self.world.lanes[lane].insert_car(car_id, pos, &self.world.cars);
        car_id
    }

    /// Sets a car's current speed, in m/tick.
    pub fn set_car_speed(&mut self, car: CarId, speed: f64) {
        if let Some(car) = self.world.cars.get_mut(car) {
            car.set_speed(speed);
        }
    }

    /// Removes a car from the simulation. Returns `false` if it was already gone.
    pub fn remove_car(&mut self, id: CarId) -> bool {
        match self.world.cars.remove(id) {
            Some(car) => self.world.lanes[car.lane()].remove_car(id),
            None => false,
        }
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> Result<()> {
        let order: Vec<CarId> = self.world.cars.keys().collect();
        self.step_ordered(&order)
    }

    /// Advances the simulation by one tick, handling cars in the given order.
    ///
    /// Cars missing from `order` are handled after the others. The outcome does not
    /// depend on the order.
    pub fn step_ordered(&mut self, order: &[CarId]) -> Result<()> {
        let mut seen = SecondaryMap::new();
        let mut cars: Vec<CarId> = vec![];
        for id in order.iter().copied().chain(self.world.cars.keys()) {
            if self.world.cars.contains_key(id) && seen.insert(id, ()).is_none() {
                cars.push(id);
            }
        }

        self.world.negotiate(&cars)?;

        for id in &cars {
            let moved = self
                .world
                .cars
                .get(*id)
                .map_or(true, |car| car.has_moved(self.tick));
            if !moved && self.world.drive(*id, self.tick) {
                self.arrived += 1;
            }
        }

        for light in self.world.lights.values_mut() {
            light.tick();
        }

        let strategies: SecondaryMap<JunctionId, StrategyKind> = self
            .managers
            .iter()
            .map(|(id, manager)| (id, manager.running()))
            .collect();
        for manager in self.managers.values_mut() {
            manager.decide(&mut self.world, self.tick, &strategies)?;
        }

        self.tick += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
        Ok(())
    }

    /// Steps until no cars remain or `max_ticks` ticks have passed.
    /// Returns the number of ticks simulated.
    pub fn run_until_empty(&mut self, max_ticks: u64) -> Result<u64> {
        let mut ticks = 0;
        while ticks < max_ticks && !self.world.cars.is_empty() {
            self.step()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// The number of ticks simulated since the map was loaded.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The number of cars which have reached the end of their path.
    pub fn arrived_count(&self) -> usize {
        self.arrived
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The configuration the simulation was created with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Looks up a road by the map's identifier.
    pub fn road_by_external(&self, id: u32) -> Option<RoadId> {
        self.road_ids.get(&id).copied()
    }

    /// Looks up a junction by the map's identifier.
    pub fn junction_by_external(&self, id: u32) -> Option<JunctionId> {
        self.world
            .iter_junctions()
            .find(|junction| junction.external_id() == id)
            .map(|junction| junction.id())
    }

    /// The state of every car.
    pub fn car_snapshots(&self) -> Vec<CarSnapshot> {
        self.world
            .iter_cars()
            .map(|car| {
                let (position, heading) = self.world.car_coords(car.id());
                CarSnapshot {
                    id: car.id(),
                    position,
                    heading,
                    speed: car.speed(),
                    acc: car.acc(),
                }
            })
            .collect()
    }

    /// The state of every traffic light.
    pub fn light_snapshots(&self) -> Vec<LightSnapshot> {
        self.world
            .iter_lights()
            .map(|light| LightSnapshot {
                id: light.id(),
                junction: light.junction(),
                position: light.position(),
                can_pass: light.can_pass(),
                light_time: light.light_time(),
            })
            .collect()
    }

    /// The geometry of every junction and the strategy running there.
    pub fn junction_snapshots(&self) -> Vec<JunctionSnapshot> {
        self.world
            .iter_junctions()
            .map(|junction| JunctionSnapshot {
                id: junction.id(),
                external_id: junction.external_id(),
                polygon: junction.polygon().to_vec(),
                strategy: self.managers.get(junction.id()).map(|m| m.running()),
            })
            .collect()
    }

    /// Gets the debugging information for the previously simulated tick as a JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        self.debug.clone()
    }
}
