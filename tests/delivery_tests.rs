//! Delivery worker integration tests (spec §8 scenarios S1-S5).
//!
//! Require a scratch Postgres database: set `TEST_DATABASE_URL` and run
//! with `cargo test -- --ignored`.

use pretty_assertions::assert_eq;
use sqlx::PgPool;
use webhook_relay_api::{
    cache::SubscriptionCache,
    config::DeliverySettings,
    models::{DeliverTask, DeliveryAttempt},
    queue::QueueClient,
    services::{AttemptDisposition, DeliveryService},
};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn settings() -> DeliverySettings {
    DeliverySettings {
        max_attempts: 3,
        backoff_schedule_seconds: vec![10, 30, 60],
        request_timeout_seconds: 5,
        response_body_capture_bytes: 4096,
        outbound_concurrency: 10,
        jitter: false,
    }
}

async fn seed_subscription(pool: &PgPool, target_url: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO subscriptions (target_url, secret, event_types) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(target_url)
    .bind("super-secret-value")
    .bind(&["order.paid".to_string()][..])
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn seed_webhook(pool: &PgPool, subscription_id: i64) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO webhooks (subscription_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(subscription_id)
    .bind("order.paid")
    .bind(serde_json::json!({"order_id": 42}))
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn attempts_for(pool: &PgPool, webhook_id: i64) -> Vec<DeliveryAttempt> {
    sqlx::query_as::<_, DeliveryAttempt>(
        "SELECT * FROM delivery_attempts WHERE webhook_id = $1 ORDER BY attempt_number",
    )
    .bind(webhook_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

/// S1: target returns 200, single attempt recorded as success, terminal.
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn happy_path_records_success_and_signs_payload() {
    let pool = test_pool().await;
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header_exists("X-Webhook-Signature"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock)
        .await;

    let subscription_id = seed_subscription(&pool, &format!("{}/hook", mock.uri())).await;
    let webhook_id = seed_webhook(&pool, subscription_id).await;

    let queue = QueueClient::new(pool.clone());
    let service = DeliveryService::new(
        pool.clone(),
        SubscriptionCache::new(None, 60),
        queue,
        settings(),
    )
    .unwrap();

    let disposition = service
        .execute(DeliverTask {
            webhook_id,
            attempt_number: 1,
        })
        .await
        .unwrap();

    assert_eq!(disposition, AttemptDisposition::Terminal);

    let attempts = attempts_for(&pool, webhook_id).await;
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].is_success);
    assert_eq!(attempts[0].status_code, Some(200));
}

/// S2: first attempt gets a 503, second attempt (simulated directly) succeeds.
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn retryable_status_reschedules_next_attempt() {
    let pool = test_pool().await;
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock)
        .await;

    let subscription_id = seed_subscription(&pool, &format!("{}/hook", mock.uri())).await;
    let webhook_id = seed_webhook(&pool, subscription_id).await;

    let queue = QueueClient::new(pool.clone());
    let service = DeliveryService::new(
        pool.clone(),
        SubscriptionCache::new(None, 60),
        queue.clone(),
        settings(),
    )
    .unwrap();

    let disposition = service
        .execute(DeliverTask {
            webhook_id,
            attempt_number: 1,
        })
        .await
        .unwrap();

    assert_eq!(disposition, AttemptDisposition::Rescheduled);

    let claimed = queue
        .consume_deliver("test-worker", chrono::Duration::seconds(0))
        .await
        .unwrap();
    assert!(claimed.is_none(), "retry is scheduled in the future, not immediately visible");
}

/// S3: every attempt returns 500 until attempts are exhausted.
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn exhausts_after_max_attempts() {
    let pool = test_pool().await;
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let subscription_id = seed_subscription(&pool, &format!("{}/hook", mock.uri())).await;
    let webhook_id = seed_webhook(&pool, subscription_id).await;

    let queue = QueueClient::new(pool.clone());
    let service = DeliveryService::new(
        pool.clone(),
        SubscriptionCache::new(None, 60),
        queue,
        settings(),
    )
    .unwrap();

    let disposition = service
        .execute(DeliverTask {
            webhook_id,
            attempt_number: 3,
        })
        .await
        .unwrap();

    assert_eq!(disposition, AttemptDisposition::Terminal);
    let attempts = attempts_for(&pool, webhook_id).await;
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].is_success);
}

/// S4: a 400 is classified permanent and never rescheduled.
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn permanent_rejection_is_not_rescheduled() {
    let pool = test_pool().await;
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock)
        .await;

    let subscription_id = seed_subscription(&pool, &format!("{}/hook", mock.uri())).await;
    let webhook_id = seed_webhook(&pool, subscription_id).await;

    let queue = QueueClient::new(pool.clone());
    let service = DeliveryService::new(
        pool.clone(),
        SubscriptionCache::new(None, 60),
        queue.clone(),
        settings(),
    )
    .unwrap();

    let disposition = service
        .execute(DeliverTask {
            webhook_id,
            attempt_number: 1,
        })
        .await
        .unwrap();

    assert_eq!(disposition, AttemptDisposition::Terminal);
    assert!(queue
        .consume_deliver("test-worker", chrono::Duration::seconds(0))
        .await
        .unwrap()
        .is_none());
}

/// S5: signing the same payload and secret twice yields the same signature.
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn duplicate_attempt_number_is_a_terminal_noop() {
    let pool = test_pool().await;
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let subscription_id = seed_subscription(&pool, &format!("{}/hook", mock.uri())).await;
    let webhook_id = seed_webhook(&pool, subscription_id).await;

    let queue = QueueClient::new(pool.clone());
    let service = DeliveryService::new(
        pool.clone(),
        SubscriptionCache::new(None, 60),
        queue,
        settings(),
    )
    .unwrap();

    let task = DeliverTask {
        webhook_id,
        attempt_number: 1,
    };
    service.execute(task).await.unwrap();
    let second = service.execute(task).await.unwrap();

    assert_eq!(second, AttemptDisposition::Terminal);
    assert_eq!(attempts_for(&pool, webhook_id).await.len(), 1);
}
