//! Webhook Relay — reliable webhook delivery service
//!
//! Axum HTTP front end for the ingest API, plus three background workers:
//! the delivery worker (consumes the `deliver` lane), the scheduler
//! (emits hourly `cleanup` tasks), and the retention sweeper (consumes
//! `cleanup`).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webhook_relay_api::{
    cache::SubscriptionCache,
    config::AppConfig,
    queue::QueueClient,
    routes,
    services::DeliveryService,
    workers::{DeliveryWorker, RetentionSweeper, Scheduler},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting webhook relay");

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    tracing::info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(900))
        .test_before_acquire(true)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection pool established");

    match sqlx::migrate!("./migrations").run(&db_pool).await {
        Ok(_) => tracing::info!("Database migrations completed"),
        Err(e) => {
            tracing::warn!("Migration check failed: {}. Continuing with existing schema.", e);
        }
    }

    let redis_client = if let Some(ref redis_url) = config.redis.url {
        match redis::Client::open(redis_url.as_str()) {
            Ok(client) => {
                tracing::info!("Redis connection established");
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Redis connection failed: {}, continuing without cache", e);
                None
            }
        }
    } else {
        tracing::info!("Redis not configured, continuing without cache");
        None
    };

    let cache = SubscriptionCache::new(redis_client.clone(), config.cache.subscription_ttl_seconds);
    let queue = QueueClient::new(db_pool.clone());

    let state = AppState {
        db: db_pool.clone(),
        redis: redis_client,
        config: Arc::new(config.clone()),
        cache: cache.clone(),
        queue: queue.clone(),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let delivery_service = Arc::new(DeliveryService::new(
        db_pool.clone(),
        cache.clone(),
        queue.clone(),
        config.delivery.clone(),
    )?);

    let delivery_worker = DeliveryWorker::new(
        queue.clone(),
        delivery_service,
        config.delivery.outbound_concurrency,
    );
    let scheduler = Scheduler::new(queue.clone(), config.retention.cleanup_interval_minutes);
    let retention_sweeper = RetentionSweeper::new(
        db_pool.clone(),
        queue.clone(),
        config.retention.retention_hours,
        config.retention.batch_size,
    );

    let worker_handles = vec![
        tokio::spawn(delivery_worker.run(shutdown_rx.clone())),
        tokio::spawn(scheduler.run(shutdown_rx.clone())),
        tokio::spawn(retention_sweeper.run(shutdown_rx.clone())),
    ];

    let app = Router::new()
        .merge(routes::api_routes(state.clone()))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, signaling background workers");
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    use axum::http::{header, HeaderName, Method};

    let origins: Vec<_> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    tracing::info!("CORS allowed origins: {:?}", config.cors.allowed_origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(config.cors.max_age))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
