use std::sync::Arc;

use shared::{BoundingRegion, GeoPoint, GeocodeCandidate};

use crate::error::CoreError;
use crate::orchestrator::{CalculationState, PendingCalculation, RouteCalculationOrchestrator};
use crate::selection::{PointSelectionStateMachine, SelectionEffect};

/// Map screen: turns clicks and chosen candidates into selection transitions and keeps the
/// orchestrator in step with the selected pair.
pub struct MapSession {
    region: BoundingRegion,
    selection: PointSelectionStateMachine,
    orchestrator: Arc<RouteCalculationOrchestrator>,
}

impl MapSession {
    pub fn new(orchestrator: Arc<RouteCalculationOrchestrator>, region: BoundingRegion) -> Self {
        Self {
            region,
            selection: PointSelectionStateMachine::new(),
            orchestrator,
        }
    }

    /// A click on the map. Points outside the region are rejected before anything changes.
    #[must_use = "a completed pair only calculates once the pending calculation is run"]
    pub fn click(&mut self, lat: f64, lng: f64) -> Result<Option<PendingCalculation>, CoreError> {
        let point = self.region.admit(lat, lng, self.region.describe(lat, lng))?;
        self.select(point)
    }

    #[must_use = "a completed pair only calculates once the pending calculation is run"]
    pub fn choose_candidate(
        &mut self,
        candidate: &GeocodeCandidate,
    ) -> Result<Option<PendingCalculation>, CoreError> {
        let point = candidate.to_point(&self.region)?;
        self.select(point)
    }

    /// Returns the calculation to run when this point completes a pair. A point outside the
    /// region is rejected and leaves the selection untouched.
    #[must_use = "a completed pair only calculates once the pending calculation is run"]
    pub fn select(&mut self, point: GeoPoint) -> Result<Option<PendingCalculation>, CoreError> {
        self.region.check(&point)?;
        match self.selection.select_point(point) {
            SelectionEffect::PairCompleted {
                origin,
                destination,
            } => self.orchestrator.begin(origin, destination).map(Some),
            effect => {
                self.dispatch(effect);
                Ok(None)
            }
        }
    }

    pub fn clear_origin(&mut self) {
        let effect = self.selection.clear_origin();
        self.dispatch(effect);
    }

    pub fn clear_destination(&mut self) {
        let effect = self.selection.clear_destination();
        self.dispatch(effect);
    }

    pub fn clear_all(&mut self) {
        let effect = self.selection.clear_all();
        self.dispatch(effect);
    }

    pub fn swap(&mut self) {
        let effect = self.selection.swap();
        self.dispatch(effect);
    }

    pub fn selection(&self) -> &PointSelectionStateMachine {
        &self.selection
    }

    pub fn calculation(&self) -> CalculationState {
        self.orchestrator.state()
    }

    pub fn region(&self) -> &BoundingRegion {
        &self.region
    }

    /// Keeps the orchestrator in step with transitions that never start a calculation.
    fn dispatch(&self, effect: SelectionEffect) {
        match effect {
            SelectionEffect::PairBroken => self.orchestrator.invalidate(),
            SelectionEffect::PairSwapped => self.orchestrator.swap_pair(),
            SelectionEffect::PairCompleted { .. } | SelectionEffect::Unchanged => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use shared::{CalculateRequest, CalculateResponse, LatLng, ValidationError};

    use super::*;
    use crate::config::ClientConfig;
    use crate::selection::SelectionPhase;
    use crate::services::{CalculationService, RoutingService};

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    impl Echo {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CalculationService for Echo {
        async fn calculate(
            &self,
            request: &CalculateRequest,
        ) -> Result<CalculateResponse, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CalculateResponse {
                origin: request.origin.clone(),
                destination: request.destination.clone(),
                road_distance: 130.0,
                straight_distance: 100.0,
                circuity_factor: None,
                efficiency_percent: None,
                units: request.units.to_string(),
                calculation_time_ms: 3,
                cached: false,
                route_geometry: Some(vec![
                    [request.origin.lat, request.origin.lng],
                    [request.destination.lat, request.destination.lng],
                ]),
            })
        }
    }

    #[async_trait]
    impl RoutingService for Echo {
        async fn route_geometry(
            &self,
            _origin: &GeoPoint,
            _destination: &GeoPoint,
        ) -> Result<Vec<LatLng>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::NoRoute)
        }
    }

    fn session() -> MapSession {
        session_with(Arc::new(Echo::default()))
    }

    fn session_with(echo: Arc<Echo>) -> MapSession {
        let orchestrator = Arc::new(RouteCalculationOrchestrator::new(
            echo.clone(),
            echo,
            &ClientConfig::default(),
        ));
        MapSession::new(orchestrator, BoundingRegion::california())
    }

    #[test]
    fn click_outside_region_changes_nothing() {
        let mut session = session();

        let err = session.click(40.71, -74.0).err();

        assert!(matches!(
            err,
            Some(CoreError::Validation(ValidationError::OutsideRegion { .. }))
        ));
        assert_eq!(session.selection().phase(), SelectionPhase::Empty);
    }

    #[test]
    fn clicks_are_labelled_with_the_region_band() {
        let mut session = session();

        assert!(session.click(37.7749, -122.4194).unwrap().is_none());

        assert_eq!(
            session.selection().origin().map(GeoPoint::label),
            Some("37.7749, -122.4194 (Bay Area)")
        );
    }

    #[tokio::test]
    async fn completed_pair_is_calculated_and_a_third_click_clears_it() {
        let mut session = session();
        assert!(session.click(34.0522, -118.2437).unwrap().is_none());

        let pending = session.click(37.7749, -122.4194).unwrap().expect("pair completed");
        assert!(session.calculation().loading);
        let outcome = pending.run().await.unwrap();
        assert_eq!(outcome.result().and_then(|r| r.circuity_factor()), Some(1.3));
        assert_eq!(session.calculation().outcome, Some(outcome));

        assert!(session.click(36.7378, -119.7871).unwrap().is_none());
        assert_eq!(session.calculation(), CalculationState::default());
        assert_eq!(session.selection().phase(), SelectionPhase::OriginSet);
    }

    #[tokio::test]
    async fn swap_mirrors_without_recalculating() {
        let mut session = session();
        assert!(session.click(34.0522, -118.2437).unwrap().is_none());
        let pending = session.click(37.7749, -122.4194).unwrap().expect("pair completed");
        let before = pending.run().await.unwrap();

        session.swap();

        let after = session.calculation().outcome.expect("mirrored outcome");
        assert_eq!(after, before.swapped());
        assert_eq!(
            session.selection().origin().map(GeoPoint::lat),
            Some(37.7749)
        );
    }

    #[test]
    fn chosen_candidate_becomes_a_labelled_point() {
        let mut session = session();
        let candidate = GeocodeCandidate {
            id: "7".to_string(),
            display_name: "Fresno, Fresno County, California, USA".to_string(),
            lat: 36.7378,
            lng: -119.7871,
        };

        assert!(session.choose_candidate(&candidate).unwrap().is_none());

        assert_eq!(
            session.selection().origin().map(GeoPoint::label),
            Some("Fresno, Fresno County")
        );
    }

    #[tokio::test]
    async fn selected_point_outside_region_is_never_stored_or_sent() {
        let echo = Arc::new(Echo::default());
        let mut session = session_with(echo.clone());
        let paris = GeoPoint::new(48.8566, 2.3522, "Paris").unwrap();
        let la = GeoPoint::new(34.0522, -118.2437, "Los Angeles").unwrap();

        let err = session.select(paris).err();
        assert!(matches!(
            err,
            Some(CoreError::Validation(ValidationError::OutsideRegion { .. }))
        ));
        assert_eq!(session.selection().phase(), SelectionPhase::Empty);

        assert!(session.select(la).unwrap().is_none());
        assert_eq!(session.selection().phase(), SelectionPhase::OriginSet);
        assert_eq!(
            session.selection().origin().map(GeoPoint::label),
            Some("Los Angeles")
        );
        assert!(!session.calculation().loading);
        assert_eq!(echo.calls(), 0);
    }
}
