use std::time::Duration;

use rand::Rng;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    cancellation::CancellationPlan,
    config::SimulationConfig,
    controller::{TripController, TripPlan, TripTiming},
    models::{Driver, TripEvent, TripPhase, TripRequest},
    route::{Route, jitter_origin},
};

const EVENT_BUFFER: usize = 64;

/// Everything needed to play one trip: the controller, the cancellation
/// draw and the pacing of the host loop.
#[derive(Debug, Clone)]
pub struct TripSession {
    controller: TripController,
    cancellation: CancellationPlan,
    driver: Driver,
    tick_interval: Duration,
    completion_delay: Duration,
}

impl TripSession {
    pub fn new(
        controller: TripController,
        cancellation: CancellationPlan,
        driver: Driver,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            controller,
            cancellation,
            driver,
            tick_interval: config.tick_interval(),
            completion_delay: config.completion_delay(),
        }
    }

    /// Draws the driver origin (unless the request pins one), both routes
    /// and the cancellation timer from `rng`.
    pub fn plan<R: Rng + ?Sized>(
        request: &TripRequest,
        trip_minutes: f64,
        driver: Driver,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Self {
        let origin = request.driver_origin.unwrap_or_else(|| {
            jitter_origin(request.pickup.coord, config.driver_spawn_radius_deg, rng)
        });
        let plan = TripPlan::synthesize(origin, request.pickup.clone(), request.dropoff.clone(), rng);
        let timing = TripTiming::from_estimate(trip_minutes, config);
        let cancellation = CancellationPlan::draw(config, rng);
        Self::new(TripController::new(plan, timing), cancellation, driver, config)
    }

    pub fn with_cancellation(mut self, cancellation: CancellationPlan) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn controller(&self) -> &TripController {
        &self.controller
    }

    /// Spawns the trip on the tokio runtime. Events arrive on the returned
    /// handle; dropping the handle tears every timer down.
    pub fn start(self) -> TripHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let main_route = self.controller.main_route().clone();
        tracing::info!(
            "starting trip to {} for driver {} ({:?} arriving, {:?} riding, cancel at {:?} fires={})",
            self.controller.plan().dropoff.address,
            self.driver.name,
            self.controller.timing().arrival,
            self.controller.timing().en_route,
            self.cancellation.delay,
            self.cancellation.fires
        );
        let task = tokio::spawn(self.run(tx));
        TripHandle {
            events: rx,
            main_route,
            task,
        }
    }

    async fn run(mut self, events: mpsc::Sender<TripEvent>) {
        let started = Instant::now();
        let started_event = TripEvent::Started {
            driver: self.driver.clone(),
            main_route: self.controller.main_route().points().to_vec(),
        };
        if events.send(started_event).await.is_err() {
            return;
        }

        let mut ticker = time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let cancel_timer = time::sleep(self.cancellation.delay);
        tokio::pin!(cancel_timer);
        let mut cancel_armed = true;

        loop {
            tokio::select! {
                () = &mut cancel_timer, if cancel_armed => {
                    cancel_armed = false;
                    if self.cancellation.fires {
                        tracing::info!(
                            "driver {} cancelled the trip after {:?}",
                            self.driver.name,
                            started.elapsed()
                        );
                        let _ = events
                            .send(TripEvent::Cancelled {
                                driver_name: self.driver.name.clone(),
                            })
                            .await;
                        return;
                    }
                    tracing::debug!("cancellation timer elapsed without cancelling");
                }
                _ = ticker.tick() => {
                    let Some(update) = self.controller.tick(started.elapsed()) else {
                        break;
                    };
                    let arrived = update.phase == TripPhase::Arrived;
                    if events.send(TripEvent::Update(update)).await.is_err() {
                        tracing::debug!("trip listener went away, stopping");
                        return;
                    }
                    if arrived {
                        break;
                    }
                }
            }
        }

        // The cancellation timer is gone with the loop; only completion is left.
        time::sleep(self.completion_delay).await;
        tracing::info!("trip completed after {:?}", started.elapsed());
        let _ = events.send(TripEvent::Completed).await;
    }
}

/// Owner of a running trip, the way a trip screen owns its timers.
#[derive(Debug)]
pub struct TripHandle {
    events: mpsc::Receiver<TripEvent>,
    main_route: Route,
    task: JoinHandle<()>,
}

impl TripHandle {
    /// Next event, or `None` once the trip has ended and every event was read.
    pub async fn next_event(&mut self) -> Option<TripEvent> {
        self.events.recv().await
    }

    pub fn main_route(&self) -> &Route {
        &self.main_route
    }

    /// Tears the trip down; nothing is delivered afterwards.
    pub fn stop(self) {
        tracing::debug!("stopping trip");
    }
}

impl Drop for TripHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{catalog::default_driver, models::Location};

    fn request() -> TripRequest {
        TripRequest {
            pickup: Location {
                address: "Indiranagar, Bengaluru".into(),
                coord: crate::models::Coordinate::new(12.9784, 77.6408),
            },
            dropoff: Location {
                address: "Koramangala, Bengaluru".into(),
                coord: crate::models::Coordinate::new(12.9352, 77.6245),
            },
            trip_minutes: None,
            driver_origin: None,
            ride_id: "swiftgo".into(),
        }
    }

    #[test]
    fn plan_honours_pinned_origin() {
        let mut req = request();
        let origin = crate::models::Coordinate::new(12.99, 77.65);
        req.driver_origin = Some(origin);
        let config = SimulationConfig::default();
        let session = TripSession::plan(
            &req,
            10.0,
            default_driver(),
            &config,
            &mut StdRng::seed_from_u64(3),
        );
        assert_eq!(session.controller().arrival_route().origin(), origin);
        assert_eq!(session.controller().arrival_route().destination(), req.pickup.coord);
        assert_eq!(session.controller().main_route().origin(), req.pickup.coord);
        assert_eq!(session.controller().main_route().destination(), req.dropoff.coord);
    }

    #[test]
    fn plan_jitters_origin_near_pickup() {
        let req = request();
        let config = SimulationConfig::default();
        let session = TripSession::plan(
            &req,
            10.0,
            default_driver(),
            &config,
            &mut StdRng::seed_from_u64(4),
        );
        let origin = session.controller().arrival_route().origin();
        assert!((origin.lat - req.pickup.coord.lat).abs() <= config.driver_spawn_radius_deg + 1e-12);
        assert!((origin.lon - req.pickup.coord.lon).abs() <= config.driver_spawn_radius_deg + 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn starts_with_route_then_updates() {
        let config = SimulationConfig::default();
        let session = TripSession::plan(
            &request(),
            1.0,
            default_driver(),
            &config,
            &mut StdRng::seed_from_u64(5),
        )
        .with_cancellation(CancellationPlan::never());
        let mut handle = session.start();

        match handle.next_event().await {
            Some(TripEvent::Started { driver, main_route }) => {
                assert_eq!(driver.name, default_driver().name);
                assert_eq!(main_route, handle.main_route().points());
            }
            other => panic!("expected start event, got {other:?}"),
        }
        match handle.next_event().await {
            Some(TripEvent::Update(update)) => assert_eq!(update.phase, TripPhase::Arriving),
            other => panic!("expected first update, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_task() {
        let config = SimulationConfig::default();
        let session = TripSession::plan(
            &request(),
            30.0,
            default_driver(),
            &config,
            &mut StdRng::seed_from_u64(6),
        );
        let handle = session.start();
        let task_abort = handle.task.abort_handle();
        handle.stop();
        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(50)).await;
        assert!(task_abort.is_finished());
    }
}
