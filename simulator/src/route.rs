use rand::Rng;
use serde::Serialize;

use crate::{geometry::path_length_km, models::Coordinate, sampler::point_at_fraction};

/// Axis deltas below this many degrees do not get their own grid leg.
pub const AXIS_EPSILON_DEG: f64 = 0.0001;
/// Legs shorter than this stay straight.
const MIN_SWAY_SEGMENT_DEG: f64 = 0.0002;
const INTERIOR_POINTS: usize = 4;
const MAX_SWAY_RATIO: f64 = 0.05;

/// Immutable, non-empty polyline for one trip leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Route {
    points: Vec<Coordinate>,
}

impl Route {
    /// `None` for an empty point list.
    pub fn new(points: Vec<Coordinate>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn origin(&self) -> Coordinate {
        self.points[0]
    }

    pub fn destination(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    pub fn length_km(&self) -> f64 {
        path_length_km(&self.points)
    }

    pub fn point_at(&self, fraction: f64) -> Coordinate {
        point_at_fraction(&self.points, fraction).unwrap_or_else(|| self.origin())
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

/// Builds a city-block looking path from `start` to `end`.
///
/// The path runs along one axis then the other (the order is a coin flip),
/// and every long enough leg gets a few slightly swayed interior points so
/// the line does not look ruler-straight. Identical endpoints give a
/// two-point route.
pub fn synthesize_route<R: Rng + ?Sized>(start: Coordinate, end: Coordinate, rng: &mut R) -> Route {
    let lon_first = rng.gen_bool(0.5);
    let dlat = end.lat - start.lat;
    let dlon = end.lon - start.lon;

    let mut corners = Vec::with_capacity(3);
    corners.push(start);
    if dlat.abs() > AXIS_EPSILON_DEG && dlon.abs() > AXIS_EPSILON_DEG {
        let corner = if lon_first {
            Coordinate::new(start.lat, end.lon)
        } else {
            Coordinate::new(end.lat, start.lon)
        };
        corners.push(corner);
    }
    corners.push(end);

    let mut points = Vec::with_capacity(corners.len() + (corners.len() - 1) * INTERIOR_POINTS);
    points.push(start);
    for leg in corners.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        points.extend(swayed_interior(from, to, rng));
        points.push(to);
    }

    tracing::trace!(
        "synthesized route with {} points ({} legs, lon_first={lon_first})",
        points.len(),
        corners.len() - 1
    );

    Route { points }
}

fn swayed_interior<R: Rng + ?Sized>(from: Coordinate, to: Coordinate, rng: &mut R) -> Vec<Coordinate> {
    let dlat = to.lat - from.lat;
    let dlon = to.lon - from.lon;
    let length_deg = dlat.hypot(dlon);
    if length_deg <= MIN_SWAY_SEGMENT_DEG {
        return Vec::new();
    }

    let along_lon = dlon.abs() >= dlat.abs();
    let max_sway = length_deg * MAX_SWAY_RATIO;
    (1..=INTERIOR_POINTS)
        .map(|i| {
            let t = i as f64 / (INTERIOR_POINTS + 1) as f64;
            let mut point = from.interpolate(to, t);
            let sway = rng.gen_range(-max_sway..=max_sway);
            if along_lon {
                point.lat += sway;
            } else {
                point.lon += sway;
            }
            point
        })
        .collect()
}

/// Random driver start within `radius_deg` of the pickup on both axes.
pub fn jitter_origin<R: Rng + ?Sized>(pickup: Coordinate, radius_deg: f64, rng: &mut R) -> Coordinate {
    if radius_deg <= 0.0 {
        return pickup;
    }
    Coordinate::new(
        pickup.lat + rng.gen_range(-radius_deg..=radius_deg),
        pickup.lon + rng.gen_range(-radius_deg..=radius_deg),
    )
}
