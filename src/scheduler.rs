//! Traffic light scheduling.
//!
//! Every junction has a [TrafficLightManager], which owns the decision of which
//! approach is green. The manager wraps a pluggable [Strategy] with a starvation
//! guard: a light left red for longer than the strategy's time limit is turned
//! green regardless of what the strategy recommends.

use crate::error::{Error, Result};
use crate::{Junction, JunctionId, LightSet, StrategyConfig, TrafficLightId, World};
use log::debug;
use slotmap::SecondaryMap;

pub use cost::CostBased;
pub use crowded::MostCrowded;
pub use meta::{features, mixed_radix, MetaStrategy, FEATURE_WIDTH, MAX_APPROACHES};
pub use naive::Naive;
pub use rlq::{LoadAggregate, RelativeLongestQueue};

mod cost;
mod crowded;
mod meta;
mod naive;
mod rlq;

/// Identifies a built-in strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyKind {
    /// Fixed-length round robin.
    Naive,
    /// Green for the approach holding the most cars.
    MostCrowded,
    /// [StrategyKind::MostCrowded], but a light stays green for a minimum time.
    MostCrowdedMinGreen,
    /// [StrategyKind::MostCrowdedMinGreen] with its own maximum red time.
    MostCrowdedMaxRed,
    /// Green for the approach with the most cars per metre of lane.
    RlqTotal,
    /// Green for the approach with the highest mean of cars per metre over its lanes.
    RlqAverage,
    /// Green for the approach scoring best on passing cars against stale waits.
    CostBased,
    /// Delegates to whichever strategy a classifier picks.
    Meta,
}

impl StrategyKind {
    /// Every strategy, in identifier order.
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Naive,
        StrategyKind::MostCrowded,
        StrategyKind::MostCrowdedMinGreen,
        StrategyKind::MostCrowdedMaxRed,
        StrategyKind::RlqTotal,
        StrategyKind::RlqAverage,
        StrategyKind::CostBased,
        StrategyKind::Meta,
    ];

    /// The number of strategy identifiers.
    pub const COUNT: usize = Self::ALL.len();

    /// The strategy's numeric identifier.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The strategy with the given numeric identifier.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// A short human readable name.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Naive => "naive",
            StrategyKind::MostCrowded => "most-crowded",
            StrategyKind::MostCrowdedMinGreen => "most-crowded-min-green",
            StrategyKind::MostCrowdedMaxRed => "most-crowded-max-red",
            StrategyKind::RlqTotal => "rlq-total",
            StrategyKind::RlqAverage => "rlq-average",
            StrategyKind::CostBased => "cost-based",
            StrategyKind::Meta => "meta",
        }
    }

    /// Creates a fresh instance of the strategy.
    ///
    /// Returns `None` for [StrategyKind::Meta], which needs a classifier;
    /// see [MetaStrategy::new].
    pub fn build(self, config: &StrategyConfig) -> Option<Box<dyn Strategy>> {
        let limit = Some(config.time_limit);
        let strategy: Box<dyn Strategy> = match self {
            StrategyKind::Naive => Box::new(Naive::new(config.naive_interval)),
            StrategyKind::MostCrowded => Box::new(MostCrowded::new(self, None, None, limit)),
            StrategyKind::MostCrowdedMinGreen => Box::new(MostCrowded::new(
                self,
                Some(config.min_green),
                None,
                limit,
            )),
            StrategyKind::MostCrowdedMaxRed => Box::new(MostCrowded::new(
                self,
                Some(config.min_green),
                Some(config.max_red),
                None,
            )),
            StrategyKind::RlqTotal => {
                Box::new(RelativeLongestQueue::new(LoadAggregate::Total, limit))
            }
            StrategyKind::RlqAverage => {
                Box::new(RelativeLongestQueue::new(LoadAggregate::Average, limit))
            }
            StrategyKind::CostBased => Box::new(CostBased::new(config)),
            StrategyKind::Meta => return None,
        };
        Some(strategy)
    }
}

/// A policy recommending which light at a junction should be green.
///
/// Strategies never change lights themselves; the [TrafficLightManager] applies
/// their recommendation.
pub trait Strategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// The strategy actually making decisions.
    /// Differs from [Strategy::kind] for delegating strategies.
    fn running(&self) -> StrategyKind {
        self.kind()
    }

    /// The most ticks a light may stay red before the manager overrides the strategy.
    fn time_limit(&self) -> Option<u64> {
        None
    }

    /// Updates any state the strategy keeps between decisions. Called every decision
    /// round, before the starvation check, so it runs even when the strategy is overridden.
    fn observe(&mut self, _ctx: &Context<'_>, _junction: &Junction) {}

    /// Recommends the light to make green. `junction` has at least one light,
    /// and `current` is the light that is green now.
    fn select(
        &mut self,
        ctx: &Context<'_>,
        junction: &Junction,
        current: TrafficLightId,
    ) -> TrafficLightId;
}

/// A trained model mapping a junction's feature vector to the strategy it should run.
pub trait Classifier {
    fn predict(&self, features: &[f64]) -> StrategyKind;
}

impl<F: Fn(&[f64]) -> StrategyKind> Classifier for F {
    fn predict(&self, features: &[f64]) -> StrategyKind {
        self(features)
    }
}

/// Read-only state available to strategies when deciding.
pub struct Context<'a> {
    /// The simulated world.
    pub world: &'a World,
    /// The current simulation tick.
    pub tick: u64,
    /// The strategy running at every junction at the start of the decision round.
    pub strategies: &'a SecondaryMap<JunctionId, StrategyKind>,
}

/// Decides which light at a junction is green.
pub struct TrafficLightManager {
    junction: JunctionId,
    current: Option<TrafficLightId>,
    strategy: Box<dyn Strategy>,
}

impl TrafficLightManager {
    /// Creates a manager for `junction`, turning its first light green.
    pub(crate) fn new(
        junction: &Junction,
        strategy: Box<dyn Strategy>,
        lights: &mut LightSet,
    ) -> Result<Self> {
        let current = junction
            .lights()
            .iter()
            .copied()
            .find(|id| lights[*id].can_pass())
            .or_else(|| junction.lights().first().copied());
        if let Some(id) = current {
            if !lights[id].can_pass() {
                lights[id].transition(true)?;
            }
        }
        Ok(Self {
            junction: junction.id(),
            current,
            strategy,
        })
    }

    /// The junction being managed.
    pub fn junction(&self) -> JunctionId {
        self.junction
    }

    /// The light that is green.
    pub fn current_green(&self) -> Result<TrafficLightId> {
        self.current.ok_or(Error::NoGreenLight(self.junction))
    }

    /// The installed strategy.
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// The strategy actually making decisions.
    pub fn running(&self) -> StrategyKind {
        self.strategy.running()
    }

    /// The starvation bound currently in force.
    pub fn time_limit(&self) -> Option<u64> {
        self.strategy.time_limit()
    }

    /// Replaces the strategy. The green light is kept.
    pub fn set_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategy = strategy;
    }

    /// Chooses the light which should be green next, or `None` if the junction has no lights.
    pub fn choose(&mut self, ctx: &Context<'_>) -> Option<TrafficLightId> {
        let junction = ctx.world.junction(self.junction);
        let current = self.current?;
        self.strategy.observe(ctx, junction);

        let starved = first_max_by_key(
            junction.lights().iter().copied().filter(|id| *id != current),
            |id| ctx.world.light(*id).light_time(),
        );
        if let (Some(starved), Some(limit)) = (starved, self.strategy.time_limit()) {
            if ctx.world.light(starved).light_time() > limit {
                debug!(
                    "junction {:?}: light {:?} starved, overriding {}",
                    self.junction,
                    starved,
                    self.strategy.kind().name()
                );
                return Some(starved);
            }
        }

        Some(self.strategy.select(ctx, junction, current))
    }

    /// Makes `next` the green light, turning the current one red.
    /// Returns whether anything changed.
    pub(crate) fn apply(&mut self, next: TrafficLightId, lights: &mut LightSet) -> Result<bool> {
        let current = self.current_green()?;
        if next == current {
            return Ok(false);
        }
        lights[current].transition(false)?;
        lights[next].transition(true)?;
        self.current = Some(next);
        debug!(
            "junction {:?}: green moves {:?} -> {:?}",
            self.junction, current, next
        );
        Ok(true)
    }

    /// Runs one decision round: choose the next green light and apply it.
    pub fn decide(
        &mut self,
        world: &mut World,
        tick: u64,
        strategies: &SecondaryMap<JunctionId, StrategyKind>,
    ) -> Result<bool> {
        let ctx = Context {
            world,
            tick,
            strategies,
        };
        match self.choose(&ctx) {
            Some(next) => self.apply(next, &mut world.lights),
            None => Ok(false),
        }
    }
}

/// The first item attaining the maximum key.
pub(crate) fn first_max_by_key<T, K: PartialOrd>(
    items: impl Iterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for item in items {
        let k = key(&item);
        if best.as_ref().map_or(true, |(_, best_k)| k > *best_k) {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

/// The lanes feeding a light.
pub(crate) fn approach_lanes<'a>(
    world: &'a World,
    light: TrafficLightId,
) -> impl Iterator<Item = &'a crate::Lane> + 'a {
    world
        .light(light)
        .lanes()
        .iter()
        .map(move |id| world.lane(*id))
}
