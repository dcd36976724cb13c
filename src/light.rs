use crate::error::{Error, Result};
use crate::math::Point2d;
use crate::{JunctionId, LaneId, TrafficLightId};
use smallvec::SmallVec;

/// A two-state traffic light gating one approach to a junction.
///
/// Lights only change colour when told to by their junction's
/// [TrafficLightManager](crate::TrafficLightManager).
#[derive(Clone, Debug)]
pub struct TrafficLight {
    /// The light ID.
    id: TrafficLightId,
    /// The junction the light belongs to.
    junction: JunctionId,
    /// The lanes whose exits are controlled by this light.
    lanes: SmallVec<[LaneId; 4]>,
    /// Where the light is drawn.
    position: Point2d,
    /// Whether the light is green.
    can_pass: bool,
    /// The number of ticks since the light last changed colour.
    light_time: u64,
}

impl TrafficLight {
    /// Creates a new light, which starts red.
    pub(crate) fn new(
        id: TrafficLightId,
        junction: JunctionId,
        lanes: &[LaneId],
        position: Point2d,
    ) -> Self {
        Self {
            id,
            junction,
            lanes: lanes.into(),
            position,
            can_pass: false,
            light_time: 0,
        }
    }

    /// Gets the light's ID.
    pub fn id(&self) -> TrafficLightId {
        self.id
    }

    /// The junction the light belongs to.
    pub fn junction(&self) -> JunctionId {
        self.junction
    }

    /// The lanes controlled by the light.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    /// Where the light is drawn.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// Whether the light is green.
    pub fn can_pass(&self) -> bool {
        self.can_pass
    }

    /// The number of ticks since the light last changed colour.
    pub fn light_time(&self) -> u64 {
        self.light_time
    }

    /// Advances the light's clock by one tick.
    pub(crate) fn tick(&mut self) {
        self.light_time += 1;
    }

    /// Changes the light to green (`to_green == true`) or red.
    /// Asking for the colour the light already shows is an error.
    pub(crate) fn transition(&mut self, to_green: bool) -> Result<()> {
        if self.can_pass == to_green {
            return Err(Error::IllegalTransition {
                light: self.id,
                to_green,
            });
        }
        self.can_pass = to_green;
        self.light_time = 0;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn light() -> TrafficLight {
        TrafficLight::new(
            TrafficLightId::default(),
            JunctionId::default(),
            &[],
            Point2d::new(0.0, 0.0),
        )
    }

    #[test]
    fn transitions_reset_the_clock() {
        let mut light = light();
        light.tick();
        light.tick();
        assert_eq!(light.light_time(), 2);

        light.transition(true).unwrap();
        assert!(light.can_pass());
        assert_eq!(light.light_time(), 0);

        light.tick();
        light.transition(false).unwrap();
        assert!(!light.can_pass());
        assert_eq!(light.light_time(), 0);
    }

    #[test]
    fn self_transition_is_illegal() {
        let mut light = light();
        assert!(matches!(
            light.transition(false),
            Err(Error::IllegalTransition {
                to_green: false,
                ..
            })
        ));

        light.transition(true).unwrap();
        assert!(matches!(
            light.transition(true),
            Err(Error::IllegalTransition { to_green: true, .. })
        ));
        assert!(light.can_pass());
    }
}
