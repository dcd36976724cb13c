use super::{Classifier, Context, MostCrowded, Strategy, StrategyKind};
use crate::{Junction, JunctionId, LaneId, StrategyConfig, TrafficLightId, World};
use arrayvec::ArrayVec;
use log::{info, warn};
use rand::Rng;
use slotmap::SecondaryMap;
use std::rc::Rc;

/// The number of approaches described in a feature vector. Further approaches are ignored.
pub const MAX_APPROACHES: usize = 4;

/// The number of features per approach.
const APPROACH_FEATURES: usize = 3;

/// The length of a feature vector.
pub const FEATURE_WIDTH: usize = MAX_APPROACHES * APPROACH_FEATURES;

/// The most upstream junctions encoded per approach.
const MAX_UPSTREAM: usize = 4;

/// Periodically asks a classifier which strategy suits the junction's traffic,
/// and delegates to a fresh instance of it.
pub struct MetaStrategy {
    classifier: Rc<dyn Classifier>,
    config: StrategyConfig,
    interval: u64,
    phase: u64,
    delegate: Box<dyn Strategy>,
}

impl MetaStrategy {
    /// Creates a meta strategy with a random phase, so that junctions re-decide at different ticks.
    pub fn new(
        classifier: Rc<dyn Classifier>,
        config: &StrategyConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let interval = config.meta_interval.max(1);
        let delegate = config.meta_initial.build(config).unwrap_or_else(|| {
            Box::new(MostCrowded::new(
                StrategyKind::MostCrowded,
                None,
                None,
                Some(config.time_limit),
            ))
        });
        Self {
            classifier,
            config: *config,
            interval,
            phase: rng.gen_range(0..interval),
            delegate,
        }
    }

    /// The offset applied to the tick when deciding whether to re-decide.
    pub fn phase(&self) -> u64 {
        self.phase
    }

    fn redecide(&mut self, ctx: &Context<'_>, junction: &Junction) {
        let features = features(
            ctx.world,
            junction,
            ctx.strategies,
            self.config.lookahead_depth,
        );
        let predicted = self.classifier.predict(&features);
        if predicted == self.delegate.kind() {
            return;
        }
        match predicted.build(&self.config) {
            Some(delegate) => {
                info!(
                    "junction {:?}: switching from {} to {}",
                    junction.id(),
                    self.delegate.kind().name(),
                    predicted.name()
                );
                self.delegate = delegate;
            }
            None => warn!(
                "junction {:?}: classifier chose {}, keeping {}",
                junction.id(),
                predicted.name(),
                self.delegate.kind().name()
            ),
        }
    }
}

impl Strategy for MetaStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Meta
    }

    fn running(&self) -> StrategyKind {
        self.delegate.running()
    }

    fn time_limit(&self) -> Option<u64> {
        self.delegate.time_limit()
    }

    fn observe(&mut self, ctx: &Context<'_>, junction: &Junction) {
        if (ctx.tick + self.phase) % self.interval == 0 {
            self.redecide(ctx, junction);
        }
        self.delegate.observe(ctx, junction);
    }

    fn select(
        &mut self,
        ctx: &Context<'_>,
        junction: &Junction,
        current: TrafficLightId,
    ) -> TrafficLightId {
        self.delegate.select(ctx, junction, current)
    }
}

/// Builds the feature vector describing a junction's traffic.
///
/// Each of the first [MAX_APPROACHES] lights contributes the number of cars on its
/// lanes, the number of cars on the lanes feeding them up to `depth` lanes back, and
/// the strategies running at the junctions those lanes come from, packed with [mixed_radix].
/// Missing approaches are zero.
pub fn features(
    world: &World,
    junction: &Junction,
    strategies: &SecondaryMap<JunctionId, StrategyKind>,
    depth: usize,
) -> ArrayVec<f64, FEATURE_WIDTH> {
    let mut out = ArrayVec::new();
    for slot in 0..MAX_APPROACHES {
        let (count, lookahead, code) = match junction.lights().get(slot) {
            Some(light) => {
                let lanes = world.light(*light).lanes();
                let count = world.approach_car_count(*light);
                let lookahead: usize = lanes
                    .iter()
                    .map(|id| upstream_cars(world, *id, depth))
                    .sum();

                let mut upstream: ArrayVec<JunctionId, MAX_UPSTREAM> = ArrayVec::new();
                for id in lanes {
                    if let Some(j) = world.lane(*id).upstream() {
                        if !upstream.contains(&j) && !upstream.is_full() {
                            upstream.push(j);
                        }
                    }
                }
                let digits: ArrayVec<usize, MAX_UPSTREAM> = upstream
                    .iter()
                    .map(|j| strategies.get(*j).map_or(0, |kind| kind.index() + 1))
                    .collect();
                let code = mixed_radix(&digits, StrategyKind::COUNT + 1);
                (count as f64, lookahead as f64, code as f64)
            }
            None => (0.0, 0.0, 0.0),
        };
        out.push(count);
        out.push(lookahead);
        out.push(code);
    }
    out
}

/// Packs `digits` into one integer, most significant digit first.
pub fn mixed_radix(digits: &[usize], base: usize) -> u64 {
    digits
        .iter()
        .fold(0, |acc, digit| acc * base as u64 + *digit as u64)
}

/// The cars on the lanes feeding `lane`, up to `depth` lanes back.
fn upstream_cars(world: &World, lane: LaneId, depth: usize) -> usize {
    if depth == 0 {
        return 0;
    }
    world
        .lane(lane)
        .comes_from()
        .iter()
        .map(|id| world.lane(*id).car_count() + upstream_cars(world, *id, depth - 1))
        .sum()
}
