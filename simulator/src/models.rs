pub use shared::{
    ApiError, Coordinate, Driver, FareQuote, FareRequest, FareResponse, Location, RideOption,
    RouteBounds, RouteRequest, RouteResponse, TripEstimate, TripEvent, TripPhase, TripRequest,
    TripUpdate,
};

pub fn is_valid_coordinate(coord: &Coordinate) -> bool {
    coord.is_finite()
        && coord.lat >= -90.0
        && coord.lat <= 90.0
        && coord.lon >= -180.0
        && coord.lon <= 180.0
}

pub fn route_bounds(path: &[Coordinate]) -> Option<RouteBounds> {
    let first = path.first()?;
    let init = RouteBounds {
        min_lat: first.lat,
        max_lat: first.lat,
        min_lon: first.lon,
        max_lon: first.lon,
    };
    Some(path.iter().fold(init, |b, c| RouteBounds {
        min_lat: b.min_lat.min(c.lat),
        max_lat: b.max_lat.max(c.lat),
        min_lon: b.min_lon.min(c.lon),
        max_lon: b.max_lon.max(c.lon),
    }))
}
