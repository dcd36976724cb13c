use super::{Context, Strategy, StrategyKind};
use crate::{Junction, TrafficLightId};

/// Fixed-length round robin over a junction's lights, ignoring traffic.
pub struct Naive {
    interval: u64,
    elapsed: u64,
}

impl Naive {
    /// Creates a round robin which moves to the next light every `interval` decisions.
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            elapsed: 0,
        }
    }
}

impl Strategy for Naive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Naive
    }

    fn select(
        &mut self,
        _ctx: &Context<'_>,
        junction: &Junction,
        current: TrafficLightId,
    ) -> TrafficLightId {
        self.elapsed += 1;
        if self.elapsed < self.interval {
            return current;
        }
        self.elapsed = 0;
        let lights = junction.lights();
        let index = lights.iter().position(|id| *id == current).unwrap_or(0);
        lights[(index + 1) % lights.len()]
    }
}
