//! Tests of traffic light scheduling over whole networks.

use traffic_signals::{
    map::grid, Error, JunctionId, Simulation, SimulationConfig, StrategyKind, World,
};

fn grid_sim(rows: usize, cols: usize, config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::new(config);
    let (roads, junctions) = grid(rows, cols, 100.0, 2, 1.5);
    sim.load_map(&roads, &junctions).unwrap();
    sim
}

fn greens(world: &World, junction: JunctionId) -> usize {
    world
        .junction(junction)
        .lights()
        .iter()
        .filter(|id| world.light(**id).can_pass())
        .count()
}

fn check_invariants(sim: &Simulation) {
    let world = sim.world();
    for junction in world.iter_junctions() {
        assert_eq!(greens(world, junction.id()), 1);
    }
    for lane in world.iter_lanes() {
        let positions: Vec<f64> = lane.cars().map(|id| world.position(id)).collect();
        for pair in positions.windows(2) {
            assert!(pair[0] >= pair[1], "cars out of order: {:?}", positions);
        }
    }
}

#[test]
fn every_strategy_keeps_the_invariants() {
    for kind in StrategyKind::ALL {
        let mut sim = grid_sim(3, 3, SimulationConfig {
            seed: 11,
            ..Default::default()
        });
        sim.set_classifier(|features: &[f64]| {
            if features[0] > features[3] {
                StrategyKind::RlqAverage
            } else {
                StrategyKind::CostBased
            }
        });
        sim.set_all_strategies(kind).unwrap();
        sim.generate_cars(40, 3).unwrap();

        for _ in 0..600 {
            sim.step().unwrap();
            check_invariants(&sim);
        }
        assert!(sim.arrived_count() > 0, "{} moved no cars", kind.name());
    }
}

#[test]
fn naive_cycles_on_a_fixed_period() {
    let mut config = SimulationConfig::default();
    config.default_strategy = StrategyKind::Naive;
    config.scheduler.naive_interval = 5;
    let mut sim = grid_sim(2, 2, config);
    let junction = sim.junction_by_external(0).unwrap();
    let lights = sim.world().junction(junction).lights().to_vec();

    let mut chosen = vec![];
    for _ in 0..20 {
        sim.step().unwrap();
        let manager = sim.manager(junction).unwrap();
        let green = manager.current_green().unwrap();
        chosen.push(lights.iter().position(|id| *id == green).unwrap());
    }
    let expected: Vec<usize> = (1..=20).map(|tick| (tick / 5) % lights.len()).collect();
    assert_eq!(chosen, expected);
}

#[test]
fn no_light_waits_past_the_time_limit() {
    let mut config = SimulationConfig::default();
    config.default_strategy = StrategyKind::MostCrowded;
    config.scheduler.time_limit = 10;
    let mut sim = grid_sim(2, 2, config);
    let junction = sim.junction_by_external(3).unwrap();
    let lights = sim.world().junction(junction).lights().to_vec();

    let mut served = vec![false; lights.len()];
    for _ in 0..100 {
        sim.step().unwrap();
        let world = sim.world();
        let green = sim.manager(junction).unwrap().current_green().unwrap();
        for (idx, id) in lights.iter().enumerate() {
            if *id == green {
                served[idx] = true;
            } else {
                assert!(world.light(*id).light_time() <= 11);
            }
        }
    }
    assert!(served.iter().all(|s| *s));
}

#[test]
fn meta_strategy_needs_a_classifier() {
    let mut sim = grid_sim(2, 2, SimulationConfig::default());
    let junction = sim.junction_by_external(0).unwrap();
    assert!(matches!(
        sim.set_strategy(junction, StrategyKind::Meta),
        Err(Error::MissingClassifier)
    ));
    assert_eq!(sim.strategy_of(junction), Some(StrategyKind::MostCrowded));

    sim.set_classifier(|_: &[f64]| StrategyKind::Naive);
    sim.set_strategy(junction, StrategyKind::Meta).unwrap();
    assert_eq!(sim.strategy_of(junction), Some(StrategyKind::Meta));

    let meta_interval = sim.config().scheduler.meta_interval;
    for _ in 0..meta_interval {
        sim.step().unwrap();
    }
    assert_eq!(
        sim.manager(junction).unwrap().running(),
        StrategyKind::Naive
    );
    let snapshot = sim
        .junction_snapshots()
        .into_iter()
        .find(|j| j.id == junction)
        .unwrap();
    assert_eq!(snapshot.strategy, Some(StrategyKind::Naive));
}

#[test]
fn loading_without_a_classifier_fails_for_meta() {
    let mut sim = Simulation::new(SimulationConfig {
        default_strategy: StrategyKind::Meta,
        ..Default::default()
    });
    let (roads, junctions) = grid(2, 2, 100.0, 1, 1.5);
    assert!(matches!(
        sim.load_map(&roads, &junctions),
        Err(Error::MissingClassifier)
    ));
    assert_eq!(sim.world().iter_roads().count(), 0);
}

#[test]
fn car_generation_gives_up() {
    let mut sim = grid_sim(2, 2, SimulationConfig::default());
    assert!(matches!(
        sim.generate_cars(5, 30),
        Err(Error::PathGeneration { min_len: 30, .. })
    ));
}

#[test]
fn snapshots_cover_the_network() {
    let mut sim = grid_sim(2, 3, SimulationConfig::default());
    let cars = sim.generate_cars(8, 2).unwrap();
    sim.step().unwrap();
    let snapshots = sim.car_snapshots();
    assert_eq!(snapshots.len(), sim.world().iter_cars().count());
    assert!(snapshots.len() <= cars.len());
    assert_eq!(sim.junction_snapshots().len(), 6);
    let lights = sim.light_snapshots();
    assert_eq!(lights.len(), sim.world().iter_lights().count());
    assert_eq!(lights.iter().filter(|l| l.can_pass).count(), 6);
}
