//! Read-only per-tick views of the simulation, for rendering and statistics.

use crate::math::{Point2d, Vector2d};
use crate::{CarId, JunctionId, StrategyKind, TrafficLightId};

/// The state of a car at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarSnapshot {
    pub id: CarId,
    /// World coordinates, including any lane change offset.
    pub position: Point2d,
    /// Unit vector in the direction of travel.
    pub heading: Vector2d,
    /// m/tick.
    pub speed: f64,
    /// m/tick<sup>2</sup>.
    pub acc: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightSnapshot {
    pub id: TrafficLightId,
    pub junction: JunctionId,
    pub position: Point2d,
    pub can_pass: bool,
    /// Ticks since the light last changed.
    pub light_time: u64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionSnapshot {
    pub id: JunctionId,
    /// The map's identifier for the junction.
    pub external_id: u32,
    pub polygon: Vec<Point2d>,
    /// The strategy making decisions at the junction, if it is managed.
    pub strategy: Option<StrategyKind>,
}
