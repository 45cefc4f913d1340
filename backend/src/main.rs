use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use backend::{
    cache::{LaneCache, LaneCacheError},
    create_router,
    directions::{DirectionsClient, DEFAULT_DIRECTIONS_URL},
    AppState,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bus lane visualizer backend")]
struct Args {
    /// Socket address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Base URL of the OSRM-compatible directions service
    #[arg(long, default_value = DEFAULT_DIRECTIONS_URL)]
    directions_url: String,

    /// Directory of per-service seed JSON files served under /route-data
    #[arg(long, default_value = "backend/route-data")]
    route_data_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let directions =
        DirectionsClient::new(args.directions_url.as_str()).expect("build directions client");
    tracing::info!("directions service: {}", args.directions_url);

    let cache = match LaneCache::from_env().await {
        Ok(cache) => {
            cache.migrate().await.expect("run lane cache migrations");
            Some(Arc::new(cache))
        }
        Err(LaneCacheError::Config(reason)) => {
            tracing::warn!("lane cache disabled: {reason}");
            None
        }
        Err(err) => {
            tracing::error!("failed to connect lane cache: {err}");
            std::process::exit(1);
        }
    };

    let state = AppState {
        directions: Arc::new(directions),
        cache,
    };
    let app = create_router(state, args.route_data_dir);

    tracing::info!("starting backend on http://{}", args.listen);
    axum::serve(
        tokio::net::TcpListener::bind(args.listen).await.unwrap(),
        app,
    )
    .await
    .unwrap();
}
