use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::Result;
use axum::{extract::DefaultBodyLimit, Router};
use flicks_app::{
    rest_api::api_router,
    state::{AppConfig, AppState},
};
use flicks_dal::movie::MovieRepository;
use futures::FutureExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

const BODY_LIMIT: usize = 1024 * 1024;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if args.cors {
        app = app.layer(CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Starting {} server on {}",
        args.env,
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}

pub fn main_router(state: AppState) -> Router<()> {
    api_router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.db.data_dir();
    if !data_dir.is_dir() {
        tokio::fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {}", data_dir.display());
    }

    let pool = flicks_dal::new_pool(&config.db).await?;
    flicks_dal::migrate(&pool).await?;
    info!("Database connection pool established");
    debug!(
        "Pool allows {} open connections, keeps up to {} idle for {:?}",
        config.db.max_open_conns,
        config.db.max_idle_conns(),
        config.db.max_idle_time
    );

    let app_config = AppConfig::from(config);
    let movies = Arc::new(MovieRepository::new(pool));
    Ok(AppState::new(app_config, movies))
}
