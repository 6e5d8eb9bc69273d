pub mod cancellation;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod fare;
pub mod geometry;
pub mod gpx_export;
pub mod models;
pub mod route;
pub mod sampler;
pub mod session;
pub mod storage;

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::stream::{self, Stream};
use rand::rngs::StdRng;

use crate::catalog::{find_ride, pick_driver, ride_options};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::fare::{estimate_trip, quote_rides, resolve_trip_minutes};
use crate::gpx_export::encode_route_as_gpx;
use crate::models::{
    ApiError, Coordinate, FareRequest, FareResponse, RideOption, RouteRequest, RouteResponse,
    TripRequest, is_valid_coordinate, route_bounds,
};
use crate::route::synthesize_route;
use crate::session::{TripHandle, TripSession};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SimulationConfig>,
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = config.rng();
        Self {
            config: Arc::new(config),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/rides", get(rides_handler))
        .route("/api/route", post(route_handler))
        .route("/api/fares", post(fares_handler))
        .route("/api/trips", post(trips_handler))
        .with_state(state)
}

async fn rides_handler() -> Json<Vec<RideOption>> {
    Json(ride_options())
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    ensure_valid(&[req.start, req.end]).map_err(api_error)?;

    let route = state.with_rng(|rng| synthesize_route(req.start, req.end, rng));
    let distance_km = route.length_km();
    let gpx_base64 = encode_route_as_gpx(route.points()).map_err(api_error)?;
    let bounds = route_bounds(route.points());

    let response = RouteResponse {
        path: route.into_points(),
        distance_km,
        gpx_base64,
        bounds,
    };

    Ok(Json(response))
}

async fn fares_handler(
    State(state): State<AppState>,
    Json(req): Json<FareRequest>,
) -> Result<Json<FareResponse>, (StatusCode, Json<ApiError>)> {
    ensure_valid(&[req.pickup, req.dropoff]).map_err(api_error)?;

    let estimate = estimate_trip(req.pickup, req.dropoff, &state.config.fare);
    let quotes = quote_rides(&estimate, &ride_options(), &state.config.fare);
    Ok(Json(FareResponse { estimate, quotes }))
}

/// Streams one simulated trip as server-sent events. The stream owns the
/// trip, so a client that disconnects stops it.
async fn trips_handler(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, Json<ApiError>)> {
    let handle = start_trip(&state, &req).map_err(api_error)?;
    Ok(Sse::new(trip_events(handle)).keep_alive(KeepAlive::default()))
}

fn start_trip(state: &AppState, req: &TripRequest) -> Result<TripHandle, SimError> {
    let mut points = vec![req.pickup.coord, req.dropoff.coord];
    points.extend(req.driver_origin);
    ensure_valid(&points)?;
    if find_ride(&req.ride_id).is_none() {
        return Err(SimError::UnknownRide(req.ride_id.clone()));
    }
    let trip_minutes = resolve_trip_minutes(req, &state.config.fare)?;

    let session = state.with_rng(|rng| {
        let driver = pick_driver(rng);
        TripSession::plan(req, trip_minutes, driver, &state.config, rng)
    });
    Ok(session.start())
}

fn trip_events(handle: TripHandle) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(Some(handle), |handle| async move {
        let mut handle = handle?;
        let event = handle.next_event().await?;
        let next = (!event.is_terminal()).then_some(handle);
        Some((Event::default().json_data(&event), next))
    })
}

fn ensure_valid(points: &[Coordinate]) -> Result<(), SimError> {
    match points.iter().find(|c| !is_valid_coordinate(c)) {
        Some(bad) => Err(SimError::InvalidCoordinate(*bad)),
        None => Ok(()),
    }
}

fn api_error(err: SimError) -> (StatusCode, Json<ApiError>) {
    let status = if err.is_client_error() {
        tracing::warn!("rejected request: {err}");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("request failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
