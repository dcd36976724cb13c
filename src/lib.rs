pub use car::{Car, CarAttributes, CarState};
pub use cgmath;
pub use config::{CarConfig, SimulationConfig, StrategyConfig};
pub use error::{Error, Result};
pub use junction::Junction;
pub use lane::Lane;
pub use light::TrafficLight;
pub use map::{JunctionData, LightGroup, RoadLane, RoadSectionData};
pub use road::RoadSection;
pub use scheduler::{Classifier, Strategy, StrategyKind, TrafficLightManager};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use snapshot::{CarSnapshot, JunctionSnapshot, LightSnapshot};
pub use util::Interval;
pub use world::World;

mod car;
mod config;
#[cfg(feature = "debug")]
mod debug;
mod error;
mod generate;
mod junction;
mod lane;
mod light;
pub mod map;
pub mod math;
pub mod scheduler;
mod road;
mod simulation;
mod snapshot;
mod util;
mod world;

new_key_type! {
    /// Unique ID of a [RoadSection].
    pub struct RoadId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a [Junction].
    pub struct JunctionId;
    /// Unique ID of a [TrafficLight].
    pub struct TrafficLightId;
    /// Unique ID of a [Car].
    pub struct CarId;
}

type RoadSet = SlotMap<RoadId, RoadSection>;
type LaneSet = SlotMap<LaneId, Lane>;
type JunctionSet = SlotMap<JunctionId, Junction>;
type LightSet = SlotMap<TrafficLightId, TrafficLight>;
type CarSet = SlotMap<CarId, Car>;
