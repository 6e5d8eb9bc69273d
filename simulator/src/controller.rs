use std::time::Duration;

use rand::Rng;

use crate::{
    config::SimulationConfig,
    geometry::ease_in_out_cubic,
    models::{Coordinate, Location, TripPhase, TripUpdate},
    route::{Route, synthesize_route},
};

pub const ARRIVED_STATUS: &str = "You have arrived!";

/// Wall-clock lengths of the two animated phases, fixed for a trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripTiming {
    pub arrival: Duration,
    pub en_route: Duration,
    pub wall_minute: Duration,
}

impl TripTiming {
    /// Arrival lasts `min(max_arrival_minutes, trip_minutes)` simulated
    /// minutes and the ride itself `trip_minutes`. Negative or non-finite
    /// estimates collapse both windows to zero.
    pub fn from_estimate(trip_minutes: f64, config: &SimulationConfig) -> Self {
        let trip_minutes = if trip_minutes.is_finite() {
            trip_minutes.max(0.0)
        } else {
            0.0
        };
        let arrival_minutes = trip_minutes.min(config.max_arrival_minutes).max(0.0);
        let wall_minute = config.wall_minute();
        Self {
            arrival: scale_saturating(wall_minute, arrival_minutes),
            en_route: scale_saturating(wall_minute, trip_minutes),
            wall_minute,
        }
    }

    pub fn total(&self) -> Duration {
        self.arrival.saturating_add(self.en_route)
    }

    fn phase_at(&self, elapsed: Duration) -> TripPhase {
        if elapsed < self.arrival {
            TripPhase::Arriving
        } else if elapsed < self.total() {
            TripPhase::EnRoute
        } else {
            TripPhase::Arrived
        }
    }

    /// Whole simulated minutes left in `remaining`, rounded up.
    fn minutes_left(&self, remaining: Duration) -> u32 {
        let minute = self.wall_minute.as_secs_f64();
        if minute <= 0.0 {
            return 0;
        }
        (remaining.as_secs_f64() / minute - 1e-9).ceil().max(0.0) as u32
    }
}

/// The two legs of a trip. The arrival leg ends on the pickup and the main
/// leg starts there, each synthesized on its own.
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub pickup: Location,
    pub dropoff: Location,
    pub arrival_route: Route,
    pub main_route: Route,
}

impl TripPlan {
    pub fn synthesize<R: Rng + ?Sized>(
        driver_origin: Coordinate,
        pickup: Location,
        dropoff: Location,
        rng: &mut R,
    ) -> Self {
        let arrival_route = synthesize_route(driver_origin, pickup.coord, rng);
        let main_route = synthesize_route(pickup.coord, dropoff.coord, rng);
        Self {
            pickup,
            dropoff,
            arrival_route,
            main_route,
        }
    }
}

/// Timed state machine for one trip: `ARRIVING -> EN_ROUTE -> ARRIVED`.
///
/// The controller does not own a clock. Whoever drives it passes the time
/// elapsed since the trip started, which keeps it testable without timers.
#[derive(Debug, Clone)]
pub struct TripController {
    plan: TripPlan,
    timing: TripTiming,
    phase: TripPhase,
    /// Whether the current phase went out in at least one update.
    reported: bool,
    finished: bool,
}

impl TripController {
    pub fn new(plan: TripPlan, timing: TripTiming) -> Self {
        Self {
            plan,
            timing,
            phase: TripPhase::Arriving,
            reported: false,
            finished: false,
        }
    }

    pub fn phase(&self) -> TripPhase {
        self.phase
    }

    pub fn timing(&self) -> TripTiming {
        self.timing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn plan(&self) -> &TripPlan {
        &self.plan
    }

    pub fn main_route(&self) -> &Route {
        &self.plan.main_route
    }

    pub fn arrival_route(&self) -> &Route {
        &self.plan.arrival_route
    }

    /// Advances the simulation to `elapsed` and reports where the vehicle is.
    ///
    /// Every phase is reported at least once and a tick moves at most one
    /// phase forward, so sparse ticks still show every phase. After the
    /// ARRIVED tick the controller is finished and returns `None` forever.
    pub fn tick(&mut self, elapsed: Duration) -> Option<TripUpdate> {
        if self.finished {
            return None;
        }

        if self.reported && self.timing.phase_at(elapsed) > self.phase {
            if let Some(next) = self.phase.next() {
                tracing::debug!(
                    "trip phase {:?} -> {:?} at {:?}",
                    self.phase,
                    next,
                    elapsed
                );
                self.phase = next;
            }
        }
        self.reported = true;

        let update = match self.phase {
            TripPhase::Arriving => {
                let progress = ease_in_out_cubic(window_fraction(elapsed, self.timing.arrival));
                let remaining = self.timing.arrival.saturating_sub(elapsed);
                TripUpdate {
                    phase: TripPhase::Arriving,
                    position: self.plan.arrival_route.point_at(progress),
                    status: format!(
                        "Driver arriving in ~{} min",
                        self.timing.minutes_left(remaining)
                    ),
                    progress,
                }
            }
            TripPhase::EnRoute => {
                let into_ride = elapsed.saturating_sub(self.timing.arrival);
                let progress = ease_in_out_cubic(window_fraction(into_ride, self.timing.en_route));
                let remaining = self.timing.en_route.saturating_sub(into_ride);
                TripUpdate {
                    phase: TripPhase::EnRoute,
                    position: self.plan.main_route.point_at(progress),
                    status: format!(
                        "On trip to {} (~{} min)",
                        self.plan.dropoff.short_name(),
                        self.timing.minutes_left(remaining)
                    ),
                    progress,
                }
            }
            TripPhase::Arrived => {
                self.finished = true;
                TripUpdate {
                    phase: TripPhase::Arrived,
                    position: self.plan.dropoff.coord,
                    status: ARRIVED_STATUS.to_string(),
                    progress: 1.0,
                }
            }
        };

        Some(update)
    }
}

/// `unit * factor`, pinned to `Duration::MAX` when it does not fit.
fn scale_saturating(unit: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(unit.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Linear progress through a window; an empty window counts as done.
fn window_fraction(elapsed: Duration, window: Duration) -> f64 {
    if window.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0)
}
