use axum::{
    body::{Body, to_bytes},
    http::Request,
};
use hyper::StatusCode;
use serde_json::{Value, json};
use simulator::{
    AppState,
    config::SimulationConfig,
    create_router,
    models::{FareResponse, RideOption, RouteResponse, TripEvent, TripPhase},
};
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let config = SimulationConfig {
        speed_factor: 600.0,
        tick_interval_ms: 1,
        completion_delay_ms: 10,
        cancel_probability: 0.0,
        seed: Some(17),
        ..Default::default()
    };
    create_router(AppState::new(config))
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn trip_payload() -> Value {
    json!({
        "pickup": {"address": "Indiranagar, Bengaluru", "coord": {"lat": 12.9784, "lon": 77.6408}},
        "dropoff": {"address": "MG Road, Bengaluru", "coord": {"lat": 12.9756, "lon": 77.6066}},
        "trip_minutes": 1.0
    })
}

#[tokio::test]
async fn route_endpoint_returns_synthesized_path() {
    let payload = json!({
        "start": {"lat": 12.9716, "lon": 77.5946},
        "end": {"lat": 12.9352, "lon": 77.6245}
    });

    let response = test_app().oneshot(post_json("/api/route", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: RouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.path.first().map(|c| (c.lat, c.lon)), Some((12.9716, 77.5946)));
    assert_eq!(body.path.last().map(|c| (c.lat, c.lon)), Some((12.9352, 77.6245)));
    assert!(body.path.len() >= 3);
    assert!(body.distance_km > 4.0);
    assert!(!body.gpx_base64.is_empty());
    let bounds = body.bounds.expect("bounds");
    assert!(bounds.min_lat <= 12.9352 && bounds.max_lat >= 12.9716);
}

#[tokio::test]
async fn route_endpoint_rejects_out_of_range_coordinates() {
    let payload = json!({
        "start": {"lat": 95.0, "lon": 77.5946},
        "end": {"lat": 12.9352, "lon": 77.6245}
    });

    let response = test_app().oneshot(post_json("/api/route", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().unwrap().contains("invalid coordinate"));
}

#[tokio::test]
async fn fares_endpoint_quotes_every_ride() {
    let payload = json!({
        "pickup": {"lat": 12.9784, "lon": 77.6408},
        "dropoff": {"lat": 12.9756, "lon": 77.6066}
    });

    let response = test_app().oneshot(post_json("/api/fares", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: FareResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.estimate.duration_minutes >= 1.0);
    let fares: Vec<(&str, f64)> = body
        .quotes
        .iter()
        .map(|q| (q.ride_id.as_str(), q.fare))
        .collect();
    assert_eq!(
        fares,
        vec![("swiftgo", 12.5), ("swiftcomfort", 16.25), ("swiftxl", 22.5)]
    );
}

#[tokio::test]
async fn rides_endpoint_lists_catalog() {
    let request = Request::builder()
        .uri("/api/rides")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let rides: Vec<RideOption> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(rides.len(), 3);
}

#[tokio::test]
async fn trip_stream_ends_with_completion() {
    let response = test_app()
        .oneshot(post_json("/api/trips", &trip_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let bytes = to_bytes(response.into_body(), 16 * 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let events: Vec<TripEvent> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();

    assert!(matches!(events.first(), Some(TripEvent::Started { .. })));
    assert!(matches!(events.last(), Some(TripEvent::Completed)));
    let arrived = events
        .iter()
        .filter(|e| matches!(e, TripEvent::Update(u) if u.phase == TripPhase::Arrived))
        .count();
    assert_eq!(arrived, 1);
}

#[tokio::test]
async fn trip_rejects_negative_duration() {
    let mut payload = trip_payload();
    payload["trip_minutes"] = json!(-4.0);

    let response = test_app().oneshot(post_json("/api/trips", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trip_rejects_duration_beyond_a_week() {
    let mut payload = trip_payload();
    payload["trip_minutes"] = json!(1e20);

    let response = test_app().oneshot(post_json("/api/trips", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().unwrap().contains("invalid trip duration"));
}

#[tokio::test]
async fn trip_rejects_unknown_ride() {
    let mut payload = trip_payload();
    payload["ride_id"] = json!("rickshaw");

    let response = test_app().oneshot(post_json("/api/trips", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
