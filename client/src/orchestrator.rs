//! Primary calculation with fallback routing for the selected pair.

use std::sync::Arc;
use std::time::Duration;

use shared::{
    BoundingRegion, CalculateRequest, CalculationResult, GeoPoint, LatLng, RouteSketch, Units,
};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::cancel::{Supersession, Ticket};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::services::{CalculationService, RoutingService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Full,
    GeometryOnly,
    Unavailable,
}

/// Merged answer of both collaborators for one pair.
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationOutcome {
    /// Distances from the primary service, with geometry from whichever service had it.
    Full(CalculationResult),
    /// The primary service failed but the fallback router drew the road.
    GeometryOnly(RouteSketch),
    Unavailable {
        primary: CoreError,
        fallback: CoreError,
    },
}

impl CalculationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CalculationOutcome::Full(_) => OutcomeKind::Full,
            CalculationOutcome::GeometryOnly(_) => OutcomeKind::GeometryOnly,
            CalculationOutcome::Unavailable { .. } => OutcomeKind::Unavailable,
        }
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        match self {
            CalculationOutcome::Full(result) => Some(result),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Option<&[LatLng]> {
        match self {
            CalculationOutcome::Full(result) => result.route_geometry(),
            CalculationOutcome::GeometryOnly(sketch) => Some(&sketch.geometry),
            CalculationOutcome::Unavailable { .. } => None,
        }
    }

    pub fn swapped(&self) -> Self {
        match self {
            CalculationOutcome::Full(result) => CalculationOutcome::Full(result.swapped()),
            CalculationOutcome::GeometryOnly(sketch) => {
                CalculationOutcome::GeometryOnly(sketch.swapped())
            }
            unavailable => unavailable.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationState {
    pub active_pair: Option<(GeoPoint, GeoPoint)>,
    pub loading: bool,
    pub outcome: Option<CalculationOutcome>,
}

pub struct RouteCalculationOrchestrator {
    primary: Arc<dyn CalculationService>,
    fallback: Arc<dyn RoutingService>,
    units: Units,
    deadline: Duration,
    region: BoundingRegion,
    supersession: Supersession,
    state: watch::Sender<CalculationState>,
}

/// A registered computation; nothing is sent until [`PendingCalculation::run`] is awaited.
#[must_use = "the pair stays loading until the calculation is run"]
pub struct PendingCalculation {
    orchestrator: Arc<RouteCalculationOrchestrator>,
    ticket: Ticket,
    origin: GeoPoint,
    destination: GeoPoint,
}

impl PendingCalculation {
    pub fn origin(&self) -> &GeoPoint {
        &self.origin
    }

    pub fn destination(&self) -> &GeoPoint {
        &self.destination
    }

    /// Performs the work and publishes the outcome.
    ///
    /// Returns the outcome as stored (mirrored if the pair was swapped meanwhile), or
    /// [`CoreError::Superseded`] when the pair changed before the work finished.
    pub async fn run(mut self) -> Result<CalculationOutcome, CoreError> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let outcome = self
            .ticket
            .run(orchestrator.calculate(&self.origin, &self.destination))
            .await
            .inspect_err(|_| {
                let generation = self.ticket.generation();
                tracing::debug!("calculation #{generation} superseded in flight")
            })?;
        orchestrator.apply(&self.ticket, &self.origin, &self.destination, outcome)
    }
}

impl RouteCalculationOrchestrator {
    pub fn new(
        primary: Arc<dyn CalculationService>,
        fallback: Arc<dyn RoutingService>,
        config: &ClientConfig,
    ) -> Self {
        let (state, _) = watch::channel(CalculationState::default());
        Self {
            primary,
            fallback,
            units: config.units,
            deadline: config.request_timeout,
            region: config.region.clone(),
            supersession: Supersession::new(),
            state,
        }
    }

    /// Makes `(origin, destination)` the active pair, superseding any earlier computation.
    ///
    /// A point outside the configured region is rejected before any state changes.
    pub fn begin(
        self: &Arc<Self>,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<PendingCalculation, CoreError> {
        self.region.check(&origin)?;
        self.region.check(&destination)?;
        let ticket = self.supersession.begin();
        let generation = ticket.generation();
        let (from, to) = (origin.label(), destination.label());
        tracing::debug!("calculation #{generation}: {from} -> {to}");
        self.state.send_replace(CalculationState {
            active_pair: Some((origin.clone(), destination.clone())),
            loading: true,
            outcome: None,
        });
        Ok(PendingCalculation {
            orchestrator: Arc::clone(self),
            ticket,
            origin,
            destination,
        })
    }

    pub async fn compute(
        self: &Arc<Self>,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<CalculationOutcome, CoreError> {
        self.begin(origin, destination)?.run().await
    }

    /// Drops the active pair and whatever was computed or in flight for it.
    pub fn invalidate(&self) {
        self.supersession.cancel_all();
        self.state.send_replace(CalculationState::default());
    }

    /// Reverses the active pair, mirroring the stored outcome instead of recomputing.
    pub fn swap_pair(&self) {
        self.state.send_if_modified(|state| match state.active_pair.take() {
            Some((origin, destination)) => {
                state.active_pair = Some((destination, origin));
                state.outcome = state.outcome.as_ref().map(CalculationOutcome::swapped);
                true
            }
            None => false,
        });
    }

    pub fn state(&self) -> CalculationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CalculationState> {
        self.state.subscribe()
    }

    pub fn units(&self) -> Units {
        self.units
    }

    async fn calculate(&self, origin: &GeoPoint, destination: &GeoPoint) -> CalculationOutcome {
        let request = CalculateRequest::new(origin, destination, self.units);
        let primary = match timeout(self.deadline, self.primary.calculate(&request)).await {
            Ok(response) => response.and_then(|response| {
                let distances = [response.straight_distance, response.road_distance];
                if distances.iter().all(|d| d.is_finite() && *d >= 0.0) {
                    Ok(response)
                } else {
                    Err(CoreError::MalformedResponse(format!(
                        "invalid distances {distances:?}"
                    )))
                }
            }),
            Err(_) => Err(CoreError::Timeout(self.deadline)),
        };

        match primary {
            Ok(response) => {
                let result = CalculationResult::new(
                    origin.clone(),
                    destination.clone(),
                    response.straight_distance,
                    response.road_distance,
                    self.units,
                )
                .with_timing(response.calculation_time_ms, response.cached);

                if let Some(geometry) = response.geometry() {
                    let (from, to, factor) =
                        (origin.label(), destination.label(), result.circuity_factor());
                    tracing::info!("calculated {from} -> {to}: factor {factor:?}");
                    return CalculationOutcome::Full(result.with_geometry(geometry));
                }

                tracing::debug!("primary answer has no geometry, asking the fallback router");
                match self.fallback_geometry(origin, destination).await {
                    Ok(geometry) => CalculationOutcome::Full(result.with_geometry(geometry)),
                    Err(err) => {
                        tracing::warn!("fallback router failed, keeping distances only: {err}");
                        CalculationOutcome::Full(result)
                    }
                }
            }
            Err(primary) => {
                tracing::warn!("primary calculation failed: {primary}");
                match self.fallback_geometry(origin, destination).await {
                    Ok(geometry) => {
                        tracing::info!("fallback router supplied geometry only");
                        CalculationOutcome::GeometryOnly(RouteSketch {
                            origin: origin.clone(),
                            destination: destination.clone(),
                            geometry,
                        })
                    }
                    Err(fallback) => {
                        tracing::warn!("fallback router failed too: {fallback}");
                        CalculationOutcome::Unavailable { primary, fallback }
                    }
                }
            }
        }
    }

    async fn fallback_geometry(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Vec<LatLng>, CoreError> {
        match timeout(self.deadline, self.fallback.route_geometry(origin, destination)).await {
            Ok(Ok(geometry)) if geometry.is_empty() => Err(CoreError::NoRoute),
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout(self.deadline)),
        }
    }

    fn apply(
        &self,
        ticket: &Ticket,
        origin: &GeoPoint,
        destination: &GeoPoint,
        outcome: CalculationOutcome,
    ) -> Result<CalculationOutcome, CoreError> {
        if !ticket.is_current() {
            return Err(CoreError::Superseded);
        }

        let mut stored = None;
        self.state.send_if_modified(|state| {
            let mirrored = match &state.active_pair {
                Some((o, d)) if o.same_location(origin) && d.same_location(destination) => false,
                Some((o, d)) if o.same_location(destination) && d.same_location(origin) => true,
                _ => return false,
            };
            let outcome = if mirrored {
                outcome.swapped()
            } else {
                outcome.clone()
            };
            state.loading = false;
            state.outcome = Some(outcome.clone());
            stored = Some(outcome);
            true
        });

        stored.ok_or_else(|| {
            let generation = ticket.generation();
            tracing::debug!("calculation #{generation} no longer matches the pair");
            CoreError::Superseded
        })
    }
}
