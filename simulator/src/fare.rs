use crate::{
    config::FareConfig,
    error::SimError,
    geometry::haversine_km,
    models::{Coordinate, FareQuote, RideOption, TripEstimate, TripRequest},
};

/// Straight-line distance and a driving time at the configured average speed,
/// never below one minute.
pub fn estimate_trip(pickup: Coordinate, dropoff: Coordinate, config: &FareConfig) -> TripEstimate {
    let distance_km = haversine_km(pickup, dropoff);
    let minutes = (distance_km / config.average_speed_kmh * 60.0).ceil().max(1.0);
    TripEstimate {
        distance_km,
        duration_minutes: minutes,
    }
}

/// Longest trip the simulator plays: one week.
pub const MAX_TRIP_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Trip length in simulated minutes: the caller's estimate when given,
/// otherwise the straight-line estimate. Anything outside
/// `[0, MAX_TRIP_MINUTES]` is rejected.
pub fn resolve_trip_minutes(request: &TripRequest, config: &FareConfig) -> Result<f64, SimError> {
    let minutes = match request.trip_minutes {
        Some(minutes) => minutes,
        None => estimate_trip(request.pickup.coord, request.dropoff.coord, config).duration_minutes,
    };
    if (0.0..=MAX_TRIP_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(SimError::InvalidDuration(minutes))
    }
}

pub fn quote_rides(estimate: &TripEstimate, options: &[RideOption], config: &FareConfig) -> Vec<FareQuote> {
    let base = config.base_fare + config.per_km_rate * estimate.distance_km;
    options
        .iter()
        .map(|option| {
            let fare = round_cents(base * option.multiplier);
            FareQuote {
                ride_id: option.id.clone(),
                name: option.name.clone(),
                capacity: option.capacity,
                fare,
                formatted: format_inr(fare),
            }
        })
        .collect()
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Rupee amount with Indian digit grouping: `₹1,23,456.78`.
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (left, right) = rest.split_at(rest.len() - 2);
            groups.push(right);
            rest = left;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    format!("{sign}₹{grouped}.{fraction:02}")
}
