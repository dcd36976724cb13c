/// The negotiation flags of a car.
///
/// These are independent of one another; a car is driving normally only
/// while none of them are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarState {
    /// The car is part way through a lane change.
    pub changing_lane: bool,
    /// The car is braking for a red light or the car ahead.
    pub stopping: bool,
    /// The car is letting another car merge in front of it.
    pub yielding: bool,
}

impl CarState {
    /// Whether the car is simply driving, with no negotiation in progress.
    pub fn is_driving_normally(&self) -> bool {
        !(self.changing_lane || self.stopping || self.yielding)
    }
}

#[cfg(test)]
mod test {
    use super::CarState;

    #[test]
    fn driving_normally_only_without_flags() {
        let mut state = CarState::default();
        assert!(state.is_driving_normally());

        state.yielding = true;
        assert!(!state.is_driving_normally());

        state.yielding = false;
        state.stopping = true;
        state.changing_lane = true;
        assert!(!state.is_driving_normally());

        state.stopping = false;
        state.changing_lane = false;
        assert!(state.is_driving_normally());
    }
}
