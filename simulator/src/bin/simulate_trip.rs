use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use simulator::{
    cancellation::CancellationPlan,
    catalog::{find_ride, pick_driver},
    config::SimulationConfig,
    fare::{estimate_trip, format_inr, quote_rides, resolve_trip_minutes},
    models::{Coordinate, Location, TripEvent, TripRequest},
    session::TripSession,
    storage::{LocalStore, PlaceKind, SavedPlace, TripOutcome, TripRecord, UserProfile},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Play one simulated ride in the terminal")]
struct Args {
    #[arg(long, default_value_t = 12.9784)]
    pickup_lat: f64,
    #[arg(long, default_value_t = 77.6408)]
    pickup_lon: f64,
    #[arg(long, default_value = "Indiranagar, Bengaluru")]
    pickup_address: String,

    #[arg(long, default_value_t = 12.9756)]
    dropoff_lat: f64,
    #[arg(long, default_value_t = 77.6066)]
    dropoff_lon: f64,
    #[arg(long, default_value = "MG Road, Bengaluru")]
    dropoff_address: String,

    /// Trip length in simulated minutes; estimated from the distance when omitted
    #[arg(long)]
    minutes: Option<f64>,

    #[arg(long, default_value = "swiftgo")]
    ride: String,

    /// JSON simulation config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the config speed-up factor
    #[arg(long)]
    speed_factor: Option<f64>,

    /// Keep the driver from ever cancelling
    #[arg(long)]
    no_cancel: bool,

    /// History file the finished trip is appended to
    #[arg(long)]
    history: Option<PathBuf>,

    /// Wipe the history file (profile, places, trips) before this ride
    #[arg(long, requires = "history")]
    clear_history: bool,

    /// Rider profile to store, as `name,email`
    #[arg(long, requires = "history")]
    rider: Option<String>,

    /// Stars for the driver after a completed ride; 0 skips
    #[arg(long, requires = "history")]
    rating: Option<u8>,

    #[arg(long, requires = "rating")]
    feedback: Option<String>,

    /// Save the dropoff as a place under this label
    #[arg(long, requires = "history")]
    save_dropoff_as: Option<String>,
}

fn parse_rider(value: &str) -> Result<UserProfile, String> {
    let (name, email) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `name,email`, got {value}"))?;
    Ok(UserProfile {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        avatar_url: "https://picsum.photos/id/1027/200/200".into(),
        total_rides: 0,
        rating: 5.0,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simulate_trip=info,simulator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(speed_factor) = args.speed_factor {
        config.speed_factor = speed_factor;
    }
    config.validate()?;

    let ride = find_ride(&args.ride).ok_or_else(|| format!("unknown ride option {}", args.ride))?;
    let request = TripRequest {
        pickup: Location {
            address: args.pickup_address,
            coord: Coordinate::new(args.pickup_lat, args.pickup_lon),
        },
        dropoff: Location {
            address: args.dropoff_address,
            coord: Coordinate::new(args.dropoff_lat, args.dropoff_lon),
        },
        trip_minutes: args.minutes,
        driver_origin: None,
        ride_id: ride.id.clone(),
    };

    let estimate = estimate_trip(request.pickup.coord, request.dropoff.coord, &config.fare);
    let fare = quote_rides(&estimate, std::slice::from_ref(&ride), &config.fare)
        .first()
        .map(|quote| quote.fare)
        .unwrap_or(config.fare.base_fare);
    let trip_minutes = resolve_trip_minutes(&request, &config.fare)?;
    tracing::info!(
        "{} from {} to {}: {:.2} km, ~{} min, {}",
        ride.name,
        request.pickup.short_name(),
        request.dropoff.short_name(),
        estimate.distance_km,
        trip_minutes,
        format_inr(fare)
    );

    let mut rng = config.rng();
    let driver = pick_driver(&mut rng);
    let driver_name = driver.name.clone();
    let mut session = TripSession::plan(&request, trip_minutes, driver, &config, &mut rng);
    if args.no_cancel {
        session = session.with_cancellation(CancellationPlan::never());
    }
    let mut handle = session.start();

    let mut outcome = None;
    let mut last_status = String::new();
    while let Some(event) = handle.next_event().await {
        match &event {
            TripEvent::Started { driver, main_route } => tracing::info!(
                "{} ({}, {}; {} trips since {}) accepted, route has {} points",
                driver.name,
                driver.vehicle_model,
                driver.license_plate,
                driver.total_trips,
                driver.member_since,
                main_route.len()
            ),
            TripEvent::Update(update) => {
                if update.status != last_status {
                    tracing::info!(
                        "[{:?}] {} at ({:.5}, {:.5})",
                        update.phase,
                        update.status,
                        update.position.lat,
                        update.position.lon
                    );
                    last_status.clone_from(&update.status);
                }
            }
            TripEvent::Completed => {
                tracing::info!("trip completed");
                outcome = Some(TripOutcome::Completed);
            }
            TripEvent::Cancelled { driver_name } => {
                tracing::warn!("{driver_name} cancelled the ride");
                outcome = Some(TripOutcome::Cancelled);
            }
        }
        if event.is_terminal() {
            break;
        }
    }
    handle.stop();

    let Some(path) = args.history else {
        return Ok(());
    };
    let mut store = LocalStore::open(&path)?;
    if args.clear_history {
        store.clear_all()?;
        tracing::info!("cleared {}", path.display());
    }
    if let Some(rider) = args.rider.as_deref() {
        let mut profile = parse_rider(rider)?;
        if let Some(existing) = store.user() {
            profile.total_rides = existing.total_rides;
            profile.rating = existing.rating;
        }
        store.save_user(profile)?;
    }
    if let Some(label) = args.save_dropoff_as {
        store.save_place(SavedPlace::new(label, PlaceKind::Pin, request.dropoff.clone()))?;
    }

    if let Some(outcome) = outcome {
        let index = store.record_trip(TripRecord {
            pickup: request.pickup.address,
            dropoff: request.dropoff.address,
            ride_id: ride.id,
            fare,
            driver_name,
            outcome,
            finished_at: Utc::now(),
            rating: None,
            feedback: None,
        })?;
        match (args.rating, outcome) {
            (Some(rating), TripOutcome::Completed) => {
                store.rate_trip(index, rating, args.feedback.as_deref().unwrap_or_default())?;
            }
            (Some(_), TripOutcome::Cancelled) => {
                tracing::info!("ride was cancelled, rating not recorded");
            }
            (None, _) => {}
        }
    }

    tracing::info!(
        "{} trips and {} saved places in {}",
        store.trips().len(),
        store.saved_places().len(),
        path.display()
    );
    if let Some(user) = store.user() {
        tracing::info!("{} has {} completed rides", user.name, user.total_rides);
    }

    Ok(())
}
