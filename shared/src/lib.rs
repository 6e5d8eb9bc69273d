use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar blend `self + (other - self) * t`. `t` is not clamped.
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// A named place picked on the location-entry screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coord: Coordinate,
}

impl Location {
    /// First comma-separated part of the address, e.g. "Ferry Building"
    /// for "Ferry Building, San Francisco".
    pub fn short_name(&self) -> &str {
        let head = self.address.split(',').next().unwrap_or_default().trim();
        if head.is_empty() {
            self.address.trim()
        } else {
            head
        }
    }
}

/// Declaration order is the order a trip goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripPhase {
    Arriving,
    EnRoute,
    Arrived,
}

impl TripPhase {
    pub fn next(self) -> Option<Self> {
        match self {
            TripPhase::Arriving => Some(TripPhase::EnRoute),
            TripPhase::EnRoute => Some(TripPhase::Arrived),
            TripPhase::Arrived => None,
        }
    }
}

/// Snapshot emitted on every simulation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripUpdate {
    pub phase: TripPhase,
    pub position: Coordinate,
    pub status: String,
    /// Eased progress through the current phase, in [0, 1].
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEvent {
    /// First event of every trip, carrying what the map needs to draw.
    Started {
        driver: Driver,
        main_route: Vec<Coordinate>,
    },
    Update(TripUpdate),
    Completed,
    Cancelled { driver_name: String },
}

impl TripEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripEvent::Completed | TripEvent::Cancelled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    pub rating: f64,
    pub vehicle_model: String,
    pub license_plate: String,
    pub avatar_url: String,
    pub eta_minutes: u32,
    #[serde(default)]
    pub total_trips: u32,
    /// Year the driver joined, as shown on the driver card.
    #[serde(default)]
    pub member_since: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub multiplier: f64,
    pub capacity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub gpx_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<RouteBounds>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareRequest {
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripEstimate {
    pub distance_km: f64,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareQuote {
    pub ride_id: String,
    pub name: String,
    pub capacity: u8,
    pub fare: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareResponse {
    pub estimate: TripEstimate,
    pub quotes: Vec<FareQuote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub pickup: Location,
    pub dropoff: Location,
    /// Duration estimate from the fare collaborator; estimated from the
    /// straight-line distance when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_origin: Option<Coordinate>,
    #[serde(default = "default_ride_id")]
    pub ride_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_ride_id() -> String {
    "swiftgo".to_string()
}
