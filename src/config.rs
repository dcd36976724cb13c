//! Simulation parameters.

use crate::StrategyKind;

/// Top-level simulation configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Master RNG seed. The same seed always produces identical runs.
    pub seed: u64,
    /// Parameters used when generating cars.
    pub car: CarConfig,
    /// Parameters shared by the traffic light strategies.
    pub scheduler: StrategyConfig,
    /// The strategy installed at every junction when a map is loaded.
    pub default_strategy: StrategyKind,
    /// The number of attempts [crate::Simulation::generate_cars] makes per car
    /// before giving up.
    pub generation_attempts: usize,
}

/// The attributes given to generated cars.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarConfig {
    /// The mean of each car's own maximum speed, in m/tick.
    pub mean_max_speed: f64,
    /// The standard deviation of each car's own maximum speed, in m/tick.
    pub max_speed_stddev: f64,
    /// The largest change in speed per tick, in m/tick<sup>2</sup>.
    pub max_speed_change: f64,
}

/// Tunables for the traffic light strategies.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyConfig {
    /// Ticks between switches of the naive round robin.
    pub naive_interval: u64,
    /// Minimum ticks a light stays green under the min-green variants.
    pub min_green: u64,
    /// Maximum ticks a light may stay red under `MostCrowdedMaxRed`.
    pub max_red: u64,
    /// Starvation bound applied by the manager for strategies that opt in.
    pub time_limit: u64,
    /// Reward per car that could pass a green light (cost based).
    pub revenue: f64,
    /// Penalty per stale waiting unit of another approach (cost based).
    pub penalty: f64,
    /// Ticks of waiting that make up one stale unit (cost based).
    pub stale_interval: u64,
    /// Distance from the stop line within which a car counts as able to pass, in m.
    pub pass_distance: f64,
    /// Ticks between re-decisions of the meta strategy.
    pub meta_interval: u64,
    /// How many lanes upstream the meta strategy looks for traffic.
    pub lookahead_depth: usize,
    /// The strategy the meta strategy delegates to before its first decision.
    pub meta_initial: StrategyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            car: CarConfig::default(),
            scheduler: StrategyConfig::default(),
            default_strategy: StrategyKind::MostCrowded,
            generation_attempts: 100,
        }
    }
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            mean_max_speed: 1.4,
            max_speed_stddev: 0.15,
            max_speed_change: 0.2,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            naive_interval: 30,
            min_green: 15,
            max_red: 90,
            time_limit: 120,
            revenue: 1.0,
            penalty: 0.5,
            stale_interval: 20,
            pass_distance: 30.0,
            meta_interval: 100,
            lookahead_depth: 2,
            meta_initial: StrategyKind::MostCrowded,
        }
    }
}
