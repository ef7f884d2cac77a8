//! Ingest integration tests (spec §4.1, §8 S1/S4 preconditions).
//!
//! Require a scratch Postgres database: set `TEST_DATABASE_URL` and run
//! with `cargo test -- --ignored`. Not run by default since this repo's
//! test suite otherwise has no external dependencies.

use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use serde_json::json;
use sqlx::PgPool;
use webhook_relay_api::{queue::QueueClient, services::IngestService};

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn ingest_rejects_unknown_subscription() {
    let pool = test_pool().await;
    let queue = QueueClient::new(pool.clone());
    let service = IngestService::new(&pool, &queue);

    let result = service.ingest(i64::MAX, "user.created", json!({})).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn ingest_rejects_unsubscribed_event_type() {
    let pool = test_pool().await;
    let queue = QueueClient::new(pool.clone());

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO subscriptions (target_url, secret, event_types) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("http://127.0.0.1:9/ok")
    .bind("secret-123")
    .bind(&["user.created".to_string()][..])
    .fetch_one(&pool)
    .await
    .unwrap();

    let service = IngestService::new(&pool, &queue);
    let result = service.ingest(id, "user.deleted", json!({})).await;
    assert!(matches!(result, Err(webhook_relay_api::AppError::UnknownEventType)));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn ingest_persists_webhook_before_enqueue_succeeds() {
    let pool = test_pool().await;
    let queue = QueueClient::new(pool.clone());

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO subscriptions (target_url, secret, event_types) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("http://127.0.0.1:9/ok")
    .bind("secret-123")
    .bind(&["user.created".to_string()][..])
    .fetch_one(&pool)
    .await
    .unwrap();

    let contact_email: String = SafeEmail().fake();
    let service = IngestService::new(&pool, &queue);
    let outcome = service
        .ingest(id, "user.created", json!({"contact_email": contact_email}))
        .await
        .expect("ingest succeeds");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhooks WHERE id = $1")
        .bind(outcome.webhook_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let claimed = queue
        .consume_deliver("test-worker", chrono::Duration::seconds(30))
        .await
        .unwrap()
        .expect("a deliver task was enqueued");
    assert_eq!(claimed.task.webhook_id, outcome.webhook_id);
    assert_eq!(claimed.task.attempt_number, 1);
}
