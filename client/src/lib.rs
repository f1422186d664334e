//! Orchestration core of the circuity client: point selection, debounced geocoding search,
//! primary/fallback route calculation and client-side history browsing.

pub mod cancel;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod search;
pub mod selection;
pub mod services;
pub mod session;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::{ClientConfig, ConfigError};
pub use error::CoreError;
pub use history::{HistoryBrowser, QueryView, SortKey, page_window, view};
pub use orchestrator::{
    CalculationOutcome, CalculationState, OutcomeKind, PendingCalculation,
    RouteCalculationOrchestrator,
};
pub use search::{GeocodeSearchController, SearchOutcome, SearchState};
pub use selection::{PointSelectionStateMachine, SelectionEffect, SelectionPhase, SelectionState};
pub use services::HttpServices;
pub use session::MapSession;

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `client=debug`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
