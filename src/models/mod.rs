pub mod coordinates;
pub mod distance;
pub mod poi;
pub mod route;

pub use coordinates::Coordinates;
pub use poi::Poi;
pub use route::{
    FallbackReason, Itinerary, ItineraryRequest, RouteMeta, RouteSource, RouteSummary, Stop,
    TransportMode,
};
