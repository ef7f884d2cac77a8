//! Application Configuration
//!
//! Environment-based configuration, no config file layer — every knob is
//! an env var with a sane default, read once at boot.

use std::env;

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub cors: CorsSettings,
    pub cache: CacheSettings,
    pub delivery: DeliverySettings,
    pub retention: RetentionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub env: String,
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub max_age: u64,
}

/// Subscription Cache (spec §4.2) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub subscription_ttl_seconds: u64,
}

/// Delivery Worker (spec §4.3) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliverySettings {
    pub max_attempts: i32,
    pub backoff_schedule_seconds: Vec<i64>,
    pub request_timeout_seconds: u64,
    pub response_body_capture_bytes: usize,
    pub outbound_concurrency: usize,
    pub jitter: bool,
}

/// Scheduler & Retention Sweeper (spec §4.4) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionSettings {
    pub retention_hours: i64,
    pub cleanup_interval_minutes: i64,
    pub batch_size: i64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| "webhook-relay".to_string()),
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                debug: env::var("APP_DEBUG").map(|v| v == "true").unwrap_or(false),
            },
            server: ServerSettings {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseSettings {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2),
            },
            redis: RedisSettings {
                url: env::var("REDIS_URL").ok(),
            },
            cors: CorsSettings {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                max_age: env::var("CORS_MAX_AGE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            },
            cache: CacheSettings {
                subscription_ttl_seconds: env::var("SUBSCRIPTION_CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            },
            delivery: DeliverySettings {
                max_attempts: env::var("MAX_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                backoff_schedule_seconds: env::var("BACKOFF_SCHEDULE_SECONDS")
                    .ok()
                    .map(|v| {
                        v.split(',')
                            .filter_map(|s| s.trim().parse().ok())
                            .collect()
                    })
                    .filter(|v: &Vec<i64>| !v.is_empty())
                    .unwrap_or_else(|| vec![10, 30, 60, 300, 900]),
                request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                response_body_capture_bytes: env::var("RESPONSE_BODY_CAPTURE_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(4096),
                outbound_concurrency: env::var("OUTBOUND_CONCURRENCY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(200),
                jitter: env::var("DELIVERY_JITTER")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
            retention: RetentionSettings {
                retention_hours: env::var("RETENTION_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(72),
                cleanup_interval_minutes: env::var("CLEANUP_INTERVAL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
                batch_size: env::var("RETENTION_BATCH_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
