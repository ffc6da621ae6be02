//! Roomcast server binary.
//!
//! Wires the registry, relay, lifecycle manager and fan-out adapter
//! together and serves the WebSocket and producer ingress endpoints.

use std::error::Error;
use std::sync::Arc;

use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomcast::adapters::fanout::{InMemoryFanoutBus, RedisFanout};
use roomcast::adapters::http::ingress::{ingress_routes, IngressState};
use roomcast::adapters::websocket::{
    websocket_router, ConnectionLifecycle, RoomRegistry, RoomRelay, WebSocketState,
};
use roomcast::config::AppConfig;
use roomcast::ports::FanoutPublisher;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    // Only startup configuration problems are allowed to be fatal.
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let registry = Arc::new(RoomRegistry::new());
    let relay = Arc::new(
        RoomRelay::new(registry.clone()).with_deliver_to_empty(config.rooms.deliver_to_empty),
    );

    let fanout: Arc<dyn FanoutPublisher> = if config.redis.enabled() {
        let fanout = RedisFanout::new(&config.redis, relay.clone())?;
        fanout.spawn();
        fanout
    } else {
        tracing::warn!("no fan-out channel configured, running single-instance");
        let bus = Arc::new(InMemoryFanoutBus::new());
        bus.attach(relay.clone()).await;
        bus
    };

    let policy = config.rooms.policy()?;
    tracing::info!(?policy, "room policy resolved");

    let lifecycle = Arc::new(ConnectionLifecycle::new(
        registry.clone(),
        relay,
        fanout.clone(),
        policy,
    ));

    let cors = if config.server.cors_origins_list().is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|o| o.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    let app = axum::Router::new()
        .merge(ingress_routes(IngressState::new(fanout, registry)))
        .merge(websocket_router().with_state(WebSocketState::new(lifecycle)))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "roomcast listening");

    axum::serve(listener, app).await?;
    Ok(())
}
