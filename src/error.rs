//! Error type shared by map loading, the tick orchestrator and the schedulers.

use crate::{CarId, JunctionId, TrafficLightId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("road {0} is defined more than once")]
    DuplicateRoad(u32),

    #[error("junction {0} is defined more than once")]
    DuplicateJunction(u32),

    #[error("road {id} is malformed: {reason}")]
    InvalidRoad { id: u32, reason: &'static str },

    #[error("road {0} does not exist")]
    UnknownRoad(u32),

    #[error("road {road} has no lane {lane}")]
    UnknownLane { road: u32, lane: usize },

    #[error("junction {junction}: light group {group} controls no lanes")]
    EmptyLightGroup { junction: u32, group: usize },

    #[error("lane {lane} of road {road} is controlled by more than one traffic light")]
    LaneAlreadyControlled { road: u32, lane: usize },

    #[error("traffic light {light:?} is already {}", if *.to_green { "green" } else { "red" })]
    IllegalTransition {
        light: TrafficLightId,
        to_green: bool,
    },

    #[error("car {car:?} has no lane leading to the next road on its path")]
    NoLaneChangeTarget { car: CarId },

    #[error("junction {0:?} does not exist or has no traffic lights")]
    UnmanagedJunction(JunctionId),

    #[error("junction {0:?} has no green light")]
    NoGreenLight(JunctionId),

    #[error("the meta strategy needs a classifier, but none was provided")]
    MissingClassifier,

    #[error("no path of at least {min_len} roads found after {attempts} attempts")]
    PathGeneration { min_len: usize, attempts: usize },
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;
