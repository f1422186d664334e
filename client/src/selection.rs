use shared::GeoPoint;

/// Which endpoints of the comparison have been picked.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Empty,
    OriginSet {
        origin: GeoPoint,
    },
    Complete {
        origin: GeoPoint,
        destination: GeoPoint,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Empty,
    OriginSet,
    Complete,
}

/// What the caller has to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEffect {
    Unchanged,
    /// A complete pair no longer exists; any result derived from it is stale.
    PairBroken,
    /// Both endpoints are now set; a calculation should start.
    PairCompleted {
        origin: GeoPoint,
        destination: GeoPoint,
    },
    /// Same pair, reversed. Results can be mirrored instead of recomputed.
    PairSwapped,
}

#[derive(Debug, Default)]
pub struct PointSelectionStateMachine {
    state: SelectionState,
}

impl PointSelectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn phase(&self) -> SelectionPhase {
        match self.state {
            SelectionState::Empty => SelectionPhase::Empty,
            SelectionState::OriginSet { .. } => SelectionPhase::OriginSet,
            SelectionState::Complete { .. } => SelectionPhase::Complete,
        }
    }

    pub fn origin(&self) -> Option<&GeoPoint> {
        match &self.state {
            SelectionState::Empty => None,
            SelectionState::OriginSet { origin } | SelectionState::Complete { origin, .. } => {
                Some(origin)
            }
        }
    }

    pub fn destination(&self) -> Option<&GeoPoint> {
        match &self.state {
            SelectionState::Complete { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// Picking a point while a pair is complete starts a new pair from that point.
    pub fn select_point(&mut self, point: GeoPoint) -> SelectionEffect {
        match std::mem::take(&mut self.state) {
            SelectionState::Empty => {
                self.state = SelectionState::OriginSet { origin: point };
                SelectionEffect::Unchanged
            }
            SelectionState::OriginSet { origin } => {
                self.state = SelectionState::Complete {
                    origin: origin.clone(),
                    destination: point.clone(),
                };
                SelectionEffect::PairCompleted {
                    origin,
                    destination: point,
                }
            }
            SelectionState::Complete { .. } => {
                self.state = SelectionState::OriginSet { origin: point };
                SelectionEffect::PairBroken
            }
        }
    }

    pub fn clear_origin(&mut self) -> SelectionEffect {
        match std::mem::take(&mut self.state) {
            SelectionState::Empty => SelectionEffect::Unchanged,
            _ => SelectionEffect::PairBroken,
        }
    }

    pub fn clear_destination(&mut self) -> SelectionEffect {
        match std::mem::take(&mut self.state) {
            SelectionState::Complete { origin, .. } => {
                self.state = SelectionState::OriginSet { origin };
                SelectionEffect::PairBroken
            }
            other => {
                self.state = other;
                SelectionEffect::Unchanged
            }
        }
    }

    pub fn swap(&mut self) -> SelectionEffect {
        match std::mem::take(&mut self.state) {
            SelectionState::Complete {
                origin,
                destination,
            } => {
                self.state = SelectionState::Complete {
                    origin: destination,
                    destination: origin,
                };
                SelectionEffect::PairSwapped
            }
            other => {
                self.state = other;
                SelectionEffect::Unchanged
            }
        }
    }

    pub fn clear_all(&mut self) -> SelectionEffect {
        self.clear_origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, label: &str) -> GeoPoint {
        GeoPoint::new(lat, lng, label).unwrap()
    }

    fn la() -> GeoPoint {
        point(34.0522, -118.2437, "Los Angeles")
    }

    fn sf() -> GeoPoint {
        point(37.7749, -122.4194, "San Francisco")
    }

    fn fresno() -> GeoPoint {
        point(36.7378, -119.7871, "Fresno")
    }

    #[test]
    fn second_point_completes_the_pair() {
        let mut machine = PointSelectionStateMachine::new();

        assert_eq!(machine.select_point(la()), SelectionEffect::Unchanged);
        assert_eq!(machine.phase(), SelectionPhase::OriginSet);

        let effect = machine.select_point(sf());
        assert_eq!(
            effect,
            SelectionEffect::PairCompleted {
                origin: la(),
                destination: sf()
            }
        );
        assert_eq!(machine.origin(), Some(&la()));
        assert_eq!(machine.destination(), Some(&sf()));
    }

    #[test]
    fn third_point_breaks_the_pair_and_becomes_origin() {
        let mut machine = PointSelectionStateMachine::new();
        machine.select_point(la());
        machine.select_point(sf());

        assert_eq!(machine.select_point(fresno()), SelectionEffect::PairBroken);
        assert_eq!(machine.phase(), SelectionPhase::OriginSet);
        assert_eq!(machine.origin(), Some(&fresno()));
        assert_eq!(machine.destination(), None);
    }

    #[test]
    fn clearing_destination_keeps_origin() {
        let mut machine = PointSelectionStateMachine::new();
        assert_eq!(machine.clear_destination(), SelectionEffect::Unchanged);

        machine.select_point(la());
        assert_eq!(machine.clear_destination(), SelectionEffect::Unchanged);
        assert_eq!(machine.origin(), Some(&la()));

        machine.select_point(sf());
        assert_eq!(machine.clear_destination(), SelectionEffect::PairBroken);
        assert_eq!(machine.state(), &SelectionState::OriginSet { origin: la() });
    }

    #[test]
    fn clearing_origin_empties_everything() {
        let mut machine = PointSelectionStateMachine::new();
        assert_eq!(machine.clear_origin(), SelectionEffect::Unchanged);

        machine.select_point(la());
        machine.select_point(sf());
        assert_eq!(machine.clear_origin(), SelectionEffect::PairBroken);
        assert_eq!(machine.state(), &SelectionState::Empty);

        machine.select_point(la());
        assert_eq!(machine.clear_all(), SelectionEffect::PairBroken);
        assert_eq!(machine.phase(), SelectionPhase::Empty);
    }

    #[test]
    fn swap_only_applies_to_a_complete_pair() {
        let mut machine = PointSelectionStateMachine::new();
        assert_eq!(machine.swap(), SelectionEffect::Unchanged);

        machine.select_point(la());
        assert_eq!(machine.swap(), SelectionEffect::Unchanged);
        assert_eq!(machine.origin(), Some(&la()));

        machine.select_point(sf());
        assert_eq!(machine.swap(), SelectionEffect::PairSwapped);
        assert_eq!(machine.origin(), Some(&sf()));
        assert_eq!(machine.destination(), Some(&la()));

        assert_eq!(machine.swap(), SelectionEffect::PairSwapped);
        assert_eq!(machine.origin(), Some(&la()));
    }

    #[test]
    fn pair_completed_only_comes_from_select_point() {
        let mut machine = PointSelectionStateMachine::new();
        let mut completions = 0;
        let mut record = |effect: SelectionEffect| {
            if matches!(effect, SelectionEffect::PairCompleted { .. }) {
                completions += 1;
            }
        };

        record(machine.select_point(la()));
        record(machine.swap());
        record(machine.select_point(sf()));
        record(machine.swap());
        record(machine.clear_destination());
        record(machine.select_point(fresno()));
        record(machine.clear_all());

        assert_eq!(completions, 2);
    }
}
