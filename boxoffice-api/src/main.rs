use boxoffice_api::{app, AppState};
use boxoffice_booking::BookingService;
use boxoffice_shared::SystemClock;
use boxoffice_store::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxoffice_api=debug,boxoffice_booking=debug,boxoffice_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting box office on port {}", config.server.port);

    let service = BookingService::from_config(&config, Arc::new(SystemClock));
    let app = app(AppState::new(Arc::new(service)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
