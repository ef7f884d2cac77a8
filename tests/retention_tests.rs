//! Retention sweep integration test (spec §8 S6).
//!
//! Requires a scratch Postgres database: set `TEST_DATABASE_URL` and run
//! with `cargo test -- --ignored`.

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use webhook_relay_api::services::RetentionService;

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

/// S6: attempts older than the retention horizon are purged; the webhook
/// and subscription rows they reference survive untouched (spec §9 Open
/// Question — only `DeliveryAttempt` is in scope for purging).
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sweep_purges_only_stale_attempts_in_batches() {
    let pool = test_pool().await;

    let (subscription_id,): (i64,) = sqlx::query_as(
        "INSERT INTO subscriptions (target_url, secret, event_types) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("http://127.0.0.1:9/hook")
    .bind("super-secret-value")
    .bind(&["order.paid".to_string()][..])
    .fetch_one(&pool)
    .await
    .unwrap();

    let (webhook_id,): (i64,) = sqlx::query_as(
        "INSERT INTO webhooks (subscription_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(subscription_id)
    .bind("order.paid")
    .bind(serde_json::json!({}))
    .fetch_one(&pool)
    .await
    .unwrap();

    let stale_cutoff = Utc::now() - ChronoDuration::hours(200);
    for attempt_number in 1..=3 {
        sqlx::query(
            "INSERT INTO delivery_attempts
                (subscription_id, webhook_id, attempt_number, status_code, is_success, created_at)
             VALUES ($1, $2, $3, 500, false, $4)",
        )
        .bind(subscription_id)
        .bind(webhook_id)
        .bind(attempt_number)
        .bind(stale_cutoff)
        .execute(&pool)
        .await
        .unwrap();
    }

    sqlx::query(
        "INSERT INTO delivery_attempts
            (subscription_id, webhook_id, attempt_number, status_code, is_success)
         VALUES ($1, $2, 4, 200, true)",
    )
    .bind(subscription_id)
    .bind(webhook_id)
    .execute(&pool)
    .await
    .unwrap();

    let service = RetentionService::new(&pool, 72, 2);
    let deleted = service.sweep().await.unwrap();
    assert_eq!(deleted, 3);

    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delivery_attempts WHERE webhook_id = $1")
        .bind(webhook_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    let (webhook_survives,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhooks WHERE id = $1")
        .bind(webhook_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(webhook_survives, 1);
}
