//! Health Check Tests

use webhook_relay_api::handlers::health::liveness;

#[tokio::test]
async fn liveness_reports_ok() {
    let response = liveness().await;
    assert_eq!(response.0.status, "ok");
}

#[tokio::test]
#[ignore = "requires a live Postgres pool; run with TEST_DATABASE_URL set"]
async fn readiness_reports_database_status() {
    // Placeholder: readiness needs a real AppState (db pool, config, cache,
    // queue). Covered by the ingest/delivery integration tests, which build
    // the full state against TEST_DATABASE_URL.
}
