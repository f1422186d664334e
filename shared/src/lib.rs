pub mod calculation;
pub mod geo;
pub mod history;
pub mod search;
pub mod wire;

pub use calculation::{
    CalculationResult, EfficiencyRating, RouteSketch, Units, circuity_factor, efficiency_percent,
};
pub use geo::{BoundingRegion, GeoPoint, LatLng, ValidationError};
pub use history::{HistoryPage, HistoryQuery, HistoryRecord, HistoryRow, parse_timestamp};
pub use search::{GeocodeCandidate, PlaceAddress, PlaceResult};
pub use wire::{CalculateRequest, CalculateResponse, OsrmRouteResponse, WirePoint};
