use std::time::Instant;

use traffic_signals::{map::grid, Simulation, SimulationConfig, StrategyKind};

const CARS: usize = 60;
const MAX_TICKS: u64 = 20_000;

fn main() {
    let (roads, junctions) = grid(3, 3, 120.0, 2, 1.5);

    for kind in StrategyKind::ALL {
        let mut sim = Simulation::new(SimulationConfig {
            seed: 1,
            default_strategy: StrategyKind::MostCrowded,
            ..Default::default()
        });
        // Stand-in for a trained model: busy junctions get the cost based strategy
        sim.set_classifier(|features: &[f64]| {
            let cars: f64 = features.iter().step_by(3).sum();
            if cars > 8.0 {
                StrategyKind::CostBased
            } else {
                StrategyKind::MostCrowdedMinGreen
            }
        });

        let result = sim
            .load_map(&roads, &junctions)
            .and_then(|_| sim.set_all_strategies(kind))
            .and_then(|_| sim.generate_cars(CARS, 4))
            .and_then(|_| {
                let start = Instant::now();
                let ticks = sim.run_until_empty(MAX_TICKS)?;
                Ok((ticks, start.elapsed()))
            });

        match result {
            Ok((ticks, elapsed)) => println!(
                "{:<24} {} of {} cars arrived in {} ticks ({:?})",
                kind.name(),
                sim.arrived_count(),
                CARS,
                ticks,
                elapsed
            ),
            Err(err) => println!("{:<24} failed: {}", kind.name(), err),
        }
    }
}
