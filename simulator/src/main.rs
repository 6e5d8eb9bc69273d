use std::net::SocketAddr;

use simulator::{AppState, config::SimulationConfig, create_router};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simulator=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("SIM_CONFIG") {
        Ok(path) => {
            let config = SimulationConfig::from_file(&path)?;
            tracing::info!("loaded simulation config from {path}");
            config
        }
        Err(_) => SimulationConfig::default(),
    };
    tracing::info!(
        "one simulated minute lasts {:?}, cancel probability {}",
        config.wall_minute(),
        config.cancel_probability
    );

    let app = create_router(AppState::new(config)).layer(CorsLayer::permissive());

    let addr: SocketAddr = std::env::var("SIM_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    tracing::info!("starting simulator on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
